//! `waylink-scanner`: reads a Wayland protocol XML file and writes the generated
//! `waylink-client` bindings for it as plain Rust source.
//!
//! ```text
//! waylink-scanner <in.xml> <out_file> <types_namespace> [-I name:path]... [-R prefix:name]...
//! ```

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use waylink_codegen::normalizer::Resolver;

/// Generates waylink-client protocol bindings from a Wayland protocol XML file.
#[derive(Parser, Debug)]
#[command(name = "waylink-scanner", version, about)]
struct Args {
    /// Path to the protocol XML file to scan
    in_xml: PathBuf,

    /// Path the generated Rust source is written to
    out_file: PathBuf,

    /// Rust module path new interface types are rooted at (informational; embedded in
    /// the generated file's header comment)
    types_namespace: String,

    /// `name:path` import: `@This()` denotes the protocol currently being generated.
    /// May be repeated with the same `name` to alias multiple paths under it.
    #[arg(short = 'I', value_name = "name:path")]
    import: Vec<String>,

    /// `prefix:name` rule: interfaces whose wire name starts with `prefix` resolve to
    /// module `name` instead of the current protocol's own modules.
    #[arg(short = 'R', value_name = "prefix:name")]
    rename: Vec<String>,
}

fn split_directive(raw: &str) -> Result<(&str, &str)> {
    raw.split_once(':')
        .with_context(|| format!("directive `{raw}` is missing the `:` separator"))
}

fn build_resolver(args: &Args) -> Result<Resolver> {
    let mut resolver = Resolver::new();
    for raw in &args.import {
        let (name, path) = split_directive(raw)?;
        resolver.add_import(name, path);
    }
    for raw in &args.rename {
        let (prefix, name) = split_directive(raw)?;
        resolver.add_rename(prefix, name);
    }
    Ok(resolver)
}

fn run(args: Args) -> Result<()> {
    let src = fs::read_to_string(&args.in_xml)
        .with_context(|| format!("reading {}", args.in_xml.display()))?;

    let protocol = match waylink_proto_ast::parse_protocol(&src) {
        Ok(protocol) => protocol,
        Err(err) => {
            let pos = err.pos();
            eprintln!("{}:{}:{}: {}", args.in_xml.display(), pos.line, pos.column, err);
            eprintln!("{}", waylink_proto_ast::render_diagnostic(&src, &err));
            bail!("failed to parse {}", args.in_xml.display());
        }
    };

    let resolver = build_resolver(&args)?;
    info!(
        "generating {} interface(s) from {} into {}",
        protocol.interfaces.len(),
        args.in_xml.display(),
        args.out_file.display()
    );

    let mut out = format!(
        "// Generated by waylink-scanner from {}. Do not edit by hand.\n// types_namespace: {}\n\n",
        protocol.name, args.types_namespace
    );
    out.push_str(&waylink_codegen::generate(&protocol, &resolver));

    if let Some(parent) = args.out_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    fs::write(&args.out_file, out).with_context(|| format!("writing {}", args.out_file.display()))?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
