//! Wire names -> idiomatic Rust identifiers, plus prefix-based module resolution for
//! cross-protocol references (the `-I`/`-R` generator directives).

/// `-I name:path` and `-R prefix:name` directives collected from the command line.
#[derive(Debug, Default)]
pub struct Resolver {
    imports: Vec<(String, Vec<String>)>,
    renames: Vec<(String, String)>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// `@This()` (the protocol currently being generated) is recorded as path `"self"`.
    pub fn add_import(&mut self, name: &str, path: &str) {
        match self.imports.iter_mut().find(|(n, _)| n == name) {
            Some((_, paths)) => paths.push(path.to_string()),
            None => self.imports.push((name.to_string(), vec![path.to_string()])),
        }
    }

    pub fn add_rename(&mut self, prefix: &str, module: &str) {
        self.renames.push((prefix.to_string(), module.to_string()));
    }

    pub fn imports(&self) -> &[(String, Vec<String>)] {
        &self.imports
    }

    /// Resolves an interface's wire name to an optional external module path and its
    /// PascalCase proxy type name, e.g. `xdg_surface` -> `(Some("xdg"), "Surface")`.
    pub fn resolve_interface(&self, iface: &str) -> (Option<&str>, String) {
        for (prefix, module) in &self.renames {
            if let Some(rest) = iface.strip_prefix(prefix.as_str()) {
                return (Some(module.as_str()), pascal_case(rest.trim_start_matches('_')));
            }
        }
        (None, pascal_case(iface))
    }
}

pub fn pascal_case(s: &str) -> String {
    if s.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return format!("_{s}");
    }
    let mut out = String::new();
    for part in s.split('_') {
        let mut chars = part.chars();
        if let Some(c) = chars.next() {
            out.push(c.to_ascii_uppercase());
            out.extend(chars);
        }
    }
    out
}

const RESERVED: &[&str] = &[
    "as", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern", "false", "fn",
    "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
    "return", "self", "Self", "static", "struct", "super", "trait", "true", "type", "unsafe",
    "use", "where", "while", "async", "await", "abstract", "become", "box", "do", "final",
    "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// `self`, `Self`, `crate` and `super` aren't legal raw identifiers (`r#self` doesn't
/// parse), so they get a trailing underscore instead of the `r#` escape.
const NOT_RAW_IDENT: &[&str] = &["self", "Self", "crate", "super"];

/// Escapes an identifier that collides with a Rust keyword.
pub fn escape_ident(s: &str) -> String {
    if NOT_RAW_IDENT.contains(&s) {
        format!("{s}_")
    } else if RESERVED.contains(&s) {
        format!("r#{s}")
    } else {
        s.to_string()
    }
}

/// Splits a (possibly cross-interface-qualified) enum reference `"iface.enum_name"` into
/// its parts; a bare `"enum_name"` has no interface part.
pub fn split_enum_ref(qualified: &str) -> (Option<&str>, &str) {
    match qualified.split_once('.') {
        Some((iface, name)) => (Some(iface), name),
        None => (None, qualified),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_cases_snake_names() {
        assert_eq!(pascal_case("wl_display"), "WlDisplay");
        assert_eq!(pascal_case("single"), "Single");
        assert_eq!(pascal_case(""), "");
    }

    #[test]
    fn escapes_digit_leading_names() {
        assert_eq!(pascal_case("180"), "_180");
    }

    #[test]
    fn resolver_applies_longest_configured_prefix_rule() {
        let mut r = Resolver::new();
        r.add_rename("xdg_", "xdg");
        let (module, name) = r.resolve_interface("xdg_toplevel");
        assert_eq!(module, Some("xdg"));
        assert_eq!(name, "Toplevel");

        let (module, name) = r.resolve_interface("wl_surface");
        assert_eq!(module, None);
        assert_eq!(name, "WlSurface");
    }

    #[test]
    fn escapes_reserved_identifiers() {
        assert_eq!(escape_ident("move"), "r#move");
        assert_eq!(escape_ident("attach"), "attach");
    }

    #[test]
    fn words_illegal_as_raw_identifiers_get_a_trailing_underscore() {
        assert_eq!(escape_ident("self"), "self_");
        assert_eq!(escape_ident("Self"), "Self_");
        assert_eq!(escape_ident("crate"), "crate_");
        assert_eq!(escape_ident("super"), "super_");
    }
}
