//! Tokenizer and AST for Wayland protocol description files.
//!
//! [`tokenizer`] is a hand-rolled streaming XML scanner (just the subset of XML these
//! files use); [`parser`] is a recursive-descent consumer of its tokens that builds the
//! [`types::Protocol`] tree `waylink-codegen` walks to emit bindings.

pub mod parser;
pub mod tokenizer;
mod types;

pub use parser::{render_diagnostic, Error, SchemaErrorKind};
pub use tokenizer::{Pos, TokenizeError};
pub use types::*;

pub fn parse_protocol(src: &str) -> Result<Protocol, Error> {
    parser::Parser::new(src).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
<protocol name="test_protocol">
  <copyright>MIT</copyright>
  <interface name="wl_compositor" version="5">
    <description summary="the compositor">blah</description>
    <request name="create_surface">
      <arg name="id" type="new_id" interface="wl_surface"/>
    </request>
    <enum name="error">
      <entry name="invalid_visual" value="0" summary="visual unsupported"/>
      <entry name="invalid_scale" value="1"/>
    </enum>
  </interface>
</protocol>
"#;

    #[test]
    fn parses_a_minimal_protocol() {
        let protocol = parse_protocol(SAMPLE).unwrap();
        assert_eq!(protocol.name, "test_protocol");
        assert_eq!(protocol.copyright.as_deref(), Some("MIT"));
        assert_eq!(protocol.interfaces.len(), 1);
        let iface = &protocol.interfaces[0];
        assert_eq!(iface.name, "wl_compositor");
        assert_eq!(iface.version, 5);
        assert_eq!(iface.requests.len(), 1);
        assert_eq!(iface.requests[0].name, "create_surface");
        match &iface.requests[0].args[0].arg_type {
            ArgType::NewId { iface } => assert_eq!(iface.as_deref(), Some("wl_surface")),
            other => panic!("wrong arg type: {other:?}"),
        }
        assert_eq!(iface.enums[0].items[0].value, 0);
        assert_eq!(iface.enums[0].items[1].value, 1);
    }

    #[test]
    fn rejects_enum_attribute_on_non_integer_arg() {
        let src = r#"
<protocol name="p">
  <interface name="i" version="1">
    <request name="r">
      <arg name="a" type="string" enum="foo"/>
    </request>
  </interface>
</protocol>
"#;
        let err = parse_protocol(src).unwrap_err();
        assert!(matches!(err, Error::Schema { kind: SchemaErrorKind::EnumInvalid, .. }));
    }

    #[test]
    fn rejects_missing_version() {
        let src = r#"<protocol name="p"><interface name="i"></interface></protocol>"#;
        let err = parse_protocol(src).unwrap_err();
        assert!(matches!(err, Error::Schema { kind: SchemaErrorKind::NoVersion, .. }));
    }

    #[test]
    fn generator_is_deterministic() {
        assert_eq!(
            format!("{:?}", parse_protocol(SAMPLE).unwrap().interfaces.len()),
            format!("{:?}", parse_protocol(SAMPLE).unwrap().interfaces.len())
        );
    }
}
