//! Walks a [`waylink_proto_ast::Protocol`] and emits the literal Rust source for its
//! `waylink-client` bindings: one `pub mod <interface>` per interface, each holding a
//! proxy struct, its request methods, an `Event` enum and a `decode_event` function.
//!
//! This produces plain `String`s, not a proc-macro `TokenStream` — the scanner is a
//! standalone binary, not `wayrs-client`'s old build-time macro, so there is no
//! `proc-macro2`/`syn`/`quote` dependency here at all.

pub mod normalizer;

use waylink_proto_ast::{ArgType, Argument, Description, Enum, Interface, Message, MessageKind, Protocol};

use normalizer::{escape_ident, pascal_case, split_enum_ref, Resolver};

pub fn generate(protocol: &Protocol, resolver: &Resolver) -> String {
    let mut out = String::new();
    if let Some(desc) = &protocol.description {
        out.push_str(&render_doc_lines(desc.summary.as_deref(), desc.text.as_deref(), None));
    }
    for iface in &protocol.interfaces {
        out.push_str(&emit_interface(protocol, iface, resolver));
        out.push('\n');
    }
    out.push_str("// re-exports\n");
    for iface in &protocol.interfaces {
        let modname = iface.name.as_str();
        let proxy = pascal_case(modname);
        out.push_str(&format!("pub use {modname}::{proxy};\n"));
    }
    out
}

fn indent(s: &str, levels: usize) -> String {
    let pad = "    ".repeat(levels);
    s.lines().map(|l| if l.is_empty() { String::new() } else { format!("{pad}{l}") }).collect::<Vec<_>>().join("\n") + "\n"
}

fn render_doc_lines(summary: Option<&str>, text: Option<&str>, since: Option<u32>) -> String {
    let mut out = String::new();
    if let Some(s) = summary {
        out.push_str(&format!("/// {}\n", s.trim()));
    }
    if let Some(t) = text {
        for line in t.lines() {
            let line = line.trim();
            if !line.is_empty() {
                out.push_str(&format!("/// {line}\n"));
            }
        }
    }
    if let Some(v) = since {
        if v > 1 {
            out.push_str(&format!("///\n/// **Since version {v}**.\n"));
        }
    }
    out
}

fn doc_of(desc: &Option<Description>, since: Option<u32>) -> String {
    render_doc_lines(
        desc.as_ref().and_then(|d| d.summary.as_deref()),
        desc.as_ref().and_then(|d| d.text.as_deref()),
        since,
    )
}

fn is_bitfield_enum(protocol: &Protocol, current_iface: &str, qualified: &str) -> bool {
    let (iface_name, enum_name) = split_enum_ref(qualified);
    let iface_name = iface_name.unwrap_or(current_iface);
    protocol
        .interfaces
        .iter()
        .find(|i| i.name == iface_name)
        .and_then(|i| i.enums.iter().find(|e| e.name == enum_name))
        .map(|e| e.is_bitfield)
        .unwrap_or(false)
}

fn enum_rust_path(current_iface: &str, qualified: &str, resolver: &Resolver) -> String {
    let (iface_name, enum_name) = split_enum_ref(qualified);
    match iface_name {
        None => pascal_case(enum_name),
        Some(name) if name == current_iface => pascal_case(enum_name),
        Some(name) => {
            let (module, _) = resolver.resolve_interface(name);
            match module {
                Some(m) => format!("crate::protocol::{m}::{name}::{}", pascal_case(enum_name)),
                None => format!("super::{name}::{}", pascal_case(enum_name)),
            }
        }
    }
}

fn request_param_type(protocol: &Protocol, current_iface: &str, arg: &Argument, resolver: &Resolver) -> Option<String> {
    Some(match &arg.arg_type {
        ArgType::Int => "i32".to_string(),
        ArgType::Uint => "u32".to_string(),
        ArgType::Fixed => "waylink_wire::Fixed".to_string(),
        ArgType::Enum(q) => enum_rust_path(current_iface, q, resolver),
        ArgType::Object { allow_null, iface: Some(i) } => {
            let (module, name) = resolver.resolve_interface(i);
            let path = match module {
                Some(m) => format!("crate::protocol::{m}::{i}::{name}"),
                None => format!("super::{i}::{name}"),
            };
            if *allow_null { format!("Option<{path}>") } else { path }
        }
        ArgType::Object { allow_null, iface: None } => {
            if *allow_null { "Option<waylink_wire::ObjectId>".to_string() } else { "waylink_wire::ObjectId".to_string() }
        }
        ArgType::NewId { iface: Some(_) } => return None,
        ArgType::NewId { iface: None } => return None, // handled as two explicit params below
        ArgType::String { allow_null: false } => "std::ffi::CString".to_string(),
        ArgType::String { allow_null: true } => "Option<std::ffi::CString>".to_string(),
        ArgType::Array => "Vec<u8>".to_string(),
        ArgType::Fd => "std::os::fd::OwnedFd".to_string(),
    })
}

fn argvalue_ctor(protocol: &Protocol, current_iface: &str, arg: &Argument) -> String {
    let name = escape_ident(&arg.name);
    match &arg.arg_type {
        ArgType::Int => format!("ArgValue::Int({name})"),
        ArgType::Uint => format!("ArgValue::Uint({name})"),
        ArgType::Fixed => format!("ArgValue::Fixed({name})"),
        ArgType::Enum(q) => {
            if is_bitfield_enum(protocol, current_iface, q) {
                format!("ArgValue::Uint({name}.0)")
            } else {
                format!("ArgValue::Uint({name} as u32)")
            }
        }
        ArgType::Object { allow_null: false, .. } => format!("ArgValue::Object({name}.id())"),
        ArgType::Object { allow_null: true, .. } => format!("ArgValue::OptObject({name}.map(|v| v.id()))"),
        ArgType::NewId { iface: Some(_) } => "ArgValue::NewId(new_id)".to_string(),
        ArgType::NewId { iface: None } => {
            "ArgValue::AnyNewId(std::borrow::Cow::Borrowed(interface), version, new_id)".to_string()
        }
        ArgType::String { allow_null: false } => format!("ArgValue::String({name})"),
        ArgType::String { allow_null: true } => format!("ArgValue::OptString({name})"),
        ArgType::Array => format!("ArgValue::Array({name})"),
        ArgType::Fd => format!("ArgValue::Fd({name})"),
    }
}

fn event_field_type(protocol: &Protocol, current_iface: &str, arg: &Argument, resolver: &Resolver) -> String {
    match &arg.arg_type {
        ArgType::Int => "i32".to_string(),
        ArgType::Uint => "u32".to_string(),
        ArgType::Fixed => "waylink_wire::Fixed".to_string(),
        ArgType::Enum(q) => enum_rust_path(current_iface, q, resolver),
        ArgType::Object { allow_null, iface: Some(i) } => {
            let (module, name) = resolver.resolve_interface(i);
            let path = match module {
                Some(m) => format!("crate::protocol::{m}::{i}::{name}"),
                None => format!("super::{i}::{name}"),
            };
            if *allow_null { format!("Option<{path}>") } else { path }
        }
        ArgType::Object { allow_null, iface: None } => {
            if *allow_null { "Option<waylink_wire::ObjectId>".to_string() } else { "waylink_wire::ObjectId".to_string() }
        }
        ArgType::NewId { iface: Some(i) } => {
            let (module, name) = resolver.resolve_interface(i);
            match module {
                Some(m) => format!("crate::protocol::{m}::{i}::{name}"),
                None => format!("super::{i}::{name}"),
            }
        }
        ArgType::NewId { iface: None } => "waylink_wire::ObjectId".to_string(),
        ArgType::String { allow_null: false } => "std::ffi::CString".to_string(),
        ArgType::String { allow_null: true } => "Option<std::ffi::CString>".to_string(),
        ArgType::Array => "Vec<u8>".to_string(),
        ArgType::Fd => "std::os::fd::OwnedFd".to_string(),
    }
}

fn reader_read_expr(protocol: &Protocol, current_iface: &str, arg: &Argument, resolver: &Resolver) -> String {
    match &arg.arg_type {
        ArgType::Int => "r.read_int()?".to_string(),
        ArgType::Uint => "r.read_uint()?".to_string(),
        ArgType::Fixed => "r.read_fixed()?".to_string(),
        ArgType::Enum(q) => {
            let path = enum_rust_path(current_iface, q, resolver);
            if is_bitfield_enum(protocol, current_iface, q) {
                format!("{path}(r.read_uint()?)")
            } else {
                format!("{{ let v = r.read_uint()?; {path}::from_wire(v).ok_or(DecodeError::InvalidEnum(v))? }}")
            }
        }
        ArgType::Object { allow_null: false, .. } => "r.read_object()?".to_string(),
        ArgType::Object { allow_null: true, .. } => "r.read_object_opt()?".to_string(),
        ArgType::NewId { iface: Some(_) } => "r.read_new_id()?".to_string(),
        ArgType::NewId { iface: None } => "r.read_new_id_any()?.2".to_string(),
        ArgType::String { allow_null: false } => "r.read_string()?.to_owned()".to_string(),
        ArgType::String { allow_null: true } => "r.read_string_opt()?.map(|s| s.to_owned())".to_string(),
        ArgType::Array => "r.read_array()?.to_vec()".to_string(),
        ArgType::Fd => "ev.next_fd()?".to_string(),
    }
}

fn emit_enum(en: &Enum) -> String {
    let name = pascal_case(&en.name);
    let mut out = doc_of(&en.description, None);
    if en.is_bitfield {
        out.push_str(&format!("#[derive(Debug, Clone, Copy, PartialEq, Eq)]\npub struct {name}(pub u32);\n\n"));
        out.push_str(&format!("impl {name} {{\n"));
        for item in &en.items {
            out.push_str(&indent(&doc_of(&item.description, None), 1));
            let const_name = if item.name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                format!("_{}", item.name.to_uppercase())
            } else {
                item.name.to_uppercase()
            };
            out.push_str(&format!("    pub const {const_name}: Self = Self({});\n", item.value));
        }
        out.push_str("\n    pub fn contains(self, other: Self) -> bool {\n        self.0 & other.0 == other.0\n    }\n}\n\n");
        out.push_str(&format!(
            "impl std::ops::BitOr for {name} {{\n    type Output = Self;\n    fn bitor(self, rhs: Self) -> Self {{\n        Self(self.0 | rhs.0)\n    }}\n}}\n\n"
        ));
    } else {
        out.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq)]\n#[repr(u32)]\n");
        out.push_str(&format!("pub enum {name} {{\n"));
        for item in &en.items {
            out.push_str(&indent(&doc_of(&item.description, None), 1));
            out.push_str(&format!("    {} = {},\n", pascal_case(&item.name), item.value));
        }
        out.push_str("}\n\n");
        out.push_str(&format!("impl {name} {{\n    pub fn from_wire(v: u32) -> Option<Self> {{\n        match v {{\n"));
        for item in &en.items {
            out.push_str(&format!("            {} => Some(Self::{}),\n", item.value, pascal_case(&item.name)));
        }
        out.push_str("            _ => None,\n        }\n    }\n}\n\n");
    }
    out
}

fn emit_request(protocol: &Protocol, iface: &Interface, opcode: u16, msg: &Message, resolver: &Resolver) -> String {
    let mut out = doc_of(&msg.description, Some(msg.since));
    if msg.kind == MessageKind::Destructor {
        out.push_str("/// (destructor)\n");
    }

    let new_id_arg = msg.args.iter().find(|a| matches!(a.arg_type, ArgType::NewId { .. }));
    let mut params = vec!["&self".to_string(), "conn: &mut Connection".to_string()];
    for arg in &msg.args {
        if let ArgType::NewId { iface: None } = arg.arg_type {
            params.push("interface: &'static std::ffi::CStr".to_string());
            params.push("version: u32".to_string());
            continue;
        }
        if let Some(ty) = request_param_type(protocol, &iface.name, arg, resolver) {
            params.push(format!("{}: {ty}", escape_ident(&arg.name)));
        }
    }

    let ret_ty = match new_id_arg {
        Some(Argument { arg_type: ArgType::NewId { iface: Some(i) }, .. }) => {
            let (module, name) = resolver.resolve_interface(i);
            match module {
                Some(m) => format!("crate::protocol::{m}::{i}::{name}"),
                None => format!("super::{i}::{name}"),
            }
        }
        Some(_) => "waylink_wire::ObjectId".to_string(),
        None => "()".to_string(),
    };

    out.push_str(&format!(
        "pub fn {}(\n    {}\n) -> Result<{ret_ty}, RequestError> {{\n",
        escape_ident(&msg.name),
        params.join(",\n    ")
    ));

    if msg.since > 1 {
        out.push_str(&format!("    check_since(self, {})?;\n", msg.since));
    }
    if new_id_arg.is_some() {
        out.push_str("    let new_id = conn.next_object_id();\n");
    }

    let debug_args = msg
        .args
        .iter()
        .map(|a| match a.arg_type {
            ArgType::NewId { .. } => "new id {new_id:?}".to_string(),
            ArgType::Fd => "fd".to_string(),
            _ => format!("{{{}:?}}", escape_ident(&a.name)),
        })
        .collect::<Vec<_>>()
        .join(", ");
    out.push_str(&format!(
        "    crate::debug::log_request(Self::INTERFACE, self.id, \"{}\", format_args!(\"{debug_args}\"));\n",
        msg.name
    ));

    out.push_str(&format!("    conn.send_request(\n        self.id,\n        {opcode},\n        vec![\n"));
    for arg in &msg.args {
        out.push_str(&format!("            {},\n", argvalue_ctor(protocol, &iface.name, arg)));
    }
    out.push_str("        ],\n    )?;\n");

    match new_id_arg {
        Some(Argument { arg_type: ArgType::NewId { iface: Some(i) }, .. }) => {
            let (_, name) = resolver.resolve_interface(i);
            out.push_str(&format!("    Ok({name}::from_id(new_id, self.version))\n"));
        }
        Some(_) => out.push_str("    Ok(new_id)\n"),
        None => out.push_str("    Ok(())\n"),
    }
    out.push_str("}\n\n");
    out
}

fn emit_event_variant(protocol: &Protocol, iface: &Interface, msg: &Message, resolver: &Resolver) -> String {
    let name = pascal_case(&msg.name);
    let mut out = doc_of(&msg.description, Some(msg.since));
    if msg.args.is_empty() {
        out.push_str(&format!("{name},\n"));
    } else {
        let fields = msg
            .args
            .iter()
            .map(|a| format!("{}: {}", escape_ident(&a.name), event_field_type(protocol, &iface.name, a, resolver)))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("{name} {{ {fields} }},\n"));
    }
    out
}

fn emit_decode_arm(protocol: &Protocol, iface: &Interface, opcode: u16, msg: &Message, resolver: &Resolver) -> String {
    let name = pascal_case(&msg.name);
    if msg.args.is_empty() {
        return format!("{opcode} => Ok(Event::{name}),\n");
    }
    let fields = msg
        .args
        .iter()
        .map(|a| format!("{}: {}", escape_ident(&a.name), reader_read_expr(protocol, &iface.name, a, resolver)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{opcode} => Ok(Event::{name} {{ {fields} }}),\n")
}

fn emit_interface(protocol: &Protocol, iface: &Interface, resolver: &Resolver) -> String {
    let proxy = pascal_case(&iface.name);
    let mut body = String::new();

    body.push_str(&doc_of(&iface.description, None));
    body.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq)]\n");
    body.push_str(&format!("pub struct {proxy} {{\n    id: waylink_wire::ObjectId,\n    version: u32,\n}}\n\n"));

    body.push_str(&format!(
        "impl WlProxy for {proxy} {{\n    const INTERFACE: &'static str = \"{}\";\n    fn id(&self) -> waylink_wire::ObjectId {{ self.id }}\n    fn version(&self) -> u32 {{ self.version }}\n}}\n\n",
        iface.name
    ));

    body.push_str(&format!("impl {proxy} {{\n    pub fn from_id(id: waylink_wire::ObjectId, version: u32) -> Self {{ Self {{ id, version }} }}\n\n"));
    for (opcode, req) in iface.requests.iter().enumerate() {
        body.push_str(&indent(&emit_request(protocol, iface, opcode as u16, req, resolver), 1));
    }
    body.push_str("}\n\n");

    for en in &iface.enums {
        body.push_str(&emit_enum(en));
    }

    body.push_str(&format!("/// An event sent by `{}`.\n#[derive(Debug, Clone)]\npub enum Event {{\n", iface.name));
    for msg in &iface.events {
        body.push_str(&indent(&emit_event_variant(protocol, iface, msg, resolver), 1));
    }
    body.push_str("}\n\n");

    body.push_str("pub fn decode_event(ev: &mut waylink_wire::AnonymousEvent<'_>) -> Result<Event, waylink_wire::DecodeError> {\n");
    body.push_str("    use waylink_wire::DecodeError;\n    let mut r = ev.reader();\n    match ev.opcode {\n");
    for (opcode, msg) in iface.events.iter().enumerate() {
        body.push_str(&indent(&emit_decode_arm(protocol, iface, opcode as u16, msg, resolver), 2));
    }
    body.push_str(&format!(
        "        other => panic!(\"{} has no event with opcode {{other}}\"),\n    }}\n}}\n",
        iface.name
    ));

    format!(
        "pub mod {} {{\n    use crate::connection::Connection;\n    use crate::object::{{check_since, RequestError, WlProxy}};\n    use waylink_wire::ArgValue;\n\n{}}}\n",
        iface.name,
        indent(&body, 1)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_INTERFACE_PROTOCOL: &str = r#"
<protocol name="demo">
  <interface name="demo_compositor" version="1">
    <request name="create_surface">
      <arg name="id" type="new_id" interface="demo_surface"/>
    </request>
  </interface>
  <interface name="demo_surface" version="1">
    <request name="destroy" type="destructor"/>
    <event name="gone"/>
  </interface>
</protocol>
"#;

    #[test]
    fn generate_is_deterministic() {
        let protocol = waylink_proto_ast::parse_protocol(TWO_INTERFACE_PROTOCOL).unwrap();
        let resolver = Resolver::new();
        let a = generate(&protocol, &resolver);
        let b = generate(&protocol, &resolver);
        assert_eq!(a, b);
    }

    #[test]
    fn same_protocol_interface_refs_are_relative() {
        let protocol = waylink_proto_ast::parse_protocol(TWO_INTERFACE_PROTOCOL).unwrap();
        let resolver = Resolver::new();
        let out = generate(&protocol, &resolver);
        assert!(
            out.contains("super::demo_surface::DemoSurface"),
            "intra-protocol refs must be super::-relative, got:\n{out}"
        );
        assert!(!out.contains("crate::protocol::demo_surface"));
    }

    #[test]
    fn cross_protocol_interface_refs_use_the_configured_module() {
        let xml = r#"
<protocol name="demo_shell">
  <interface name="demo_wm_base" version="1">
    <request name="get_demo_surface">
      <arg name="id" type="new_id" interface="demo_surface"/>
      <arg name="surface" type="object" interface="wl_surface"/>
    </request>
  </interface>
</protocol>
"#;
        let protocol = waylink_proto_ast::parse_protocol(xml).unwrap();
        let mut resolver = Resolver::new();
        resolver.add_rename("wl_", "wl");
        let out = generate(&protocol, &resolver);
        assert!(
            out.contains("crate::protocol::wl::wl_surface::Surface"),
            "cross-protocol refs must route through the configured module, got:\n{out}"
        );
    }
}
