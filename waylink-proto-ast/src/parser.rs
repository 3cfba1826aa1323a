//! Recursive-descent consumer of [`crate::tokenizer::Tokenizer`] tokens, building the
//! [`crate::types::Protocol`] AST.

use crate::tokenizer::{Pos, Token, TokenizeError, Tokenizer};
use crate::types::*;

#[derive(Debug, thiserror::Error)]
pub enum SchemaErrorKind {
    #[error("missing required attribute `name`")]
    NoName,
    #[error("missing required attribute `version`")]
    NoVersion,
    #[error("missing required attribute `type`")]
    NoType,
    #[error("missing required attribute `value`")]
    NoValue,
    #[error("duplicate attribute `{0}`")]
    TooManyAttr(String),
    #[error("unknown arg type `{0}`")]
    InvalidAttribute(String),
    #[error("`interface` attribute is only valid on `object`/`new_id` args")]
    InterfaceInvalid,
    #[error("`allow-null` is only valid on `string`/`object` args")]
    AllowNullInvalid,
    #[error("`enum` attribute requires base type `int` or `uint`")]
    EnumInvalid,
    #[error("unexpected tag `{0}`")]
    UnexpectedTag(String),
    #[error("invalid integer literal {0:?}")]
    InvalidInt(String),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Xml(#[from] TokenizeError),
    #[error("{pos}: {kind}")]
    Schema { pos: Pos, kind: SchemaErrorKind },
}

impl Error {
    pub fn pos(&self) -> Pos {
        match self {
            Self::Xml(e) => e.pos(),
            Self::Schema { pos, .. } => *pos,
        }
    }
}

/// Renders a one-line diagnostic with the offending source line, as required of
/// generator errors.
pub fn render_diagnostic(src: &str, err: &Error) -> String {
    let pos = err.pos();
    let line = src.lines().nth(pos.line as usize - 1).unwrap_or("");
    format!(
        "{pos}: {err}\n  {line}\n  {caret:>col$}",
        pos = pos,
        err = err,
        line = line,
        caret = "^",
        col = pos.column as usize
    )
}

struct Attrs(Vec<(String, String)>);

impl Attrs {
    fn take(&mut self, name: &str) -> Option<String> {
        let idx = self.0.iter().position(|(k, _)| k == name)?;
        Some(self.0.remove(idx).1)
    }

    fn ensure_no_dupes(pairs: &[(String, String)], pos: Pos) -> Result<(), Error> {
        for i in 0..pairs.len() {
            for j in (i + 1)..pairs.len() {
                if pairs[i].0 == pairs[j].0 {
                    return Err(Error::Schema { pos, kind: SchemaErrorKind::TooManyAttr(pairs[i].0.clone()) });
                }
            }
        }
        Ok(())
    }
}

pub struct Parser<'a> {
    tok: Tokenizer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { tok: Tokenizer::new(src) }
    }

    fn err(&self, kind: SchemaErrorKind) -> Error {
        Error::Schema { pos: self.tok.current_pos(), kind }
    }

    /// Reads attribute tokens until the tag's `>` or `/>`. Returns (attrs, self_closed).
    fn read_attrs(&mut self) -> Result<(Attrs, bool), Error> {
        let mut pairs = Vec::new();
        loop {
            match self.tok.next_token()? {
                Token::Attribute(name, value) => pairs.push((name.to_string(), value)),
                Token::EmptyTag(_) => {
                    Attrs::ensure_no_dupes(&pairs, self.tok.current_pos())?;
                    return Ok((Attrs(pairs), true));
                }
                Token::Text(t) if t.is_empty() => {
                    Attrs::ensure_no_dupes(&pairs, self.tok.current_pos())?;
                    return Ok((Attrs(pairs), false));
                }
                other => return Err(self.err(SchemaErrorKind::UnexpectedTag(format!("{other:?}")))),
            }
        }
    }

    /// Consumes child tokens until the matching `EndTag(name)`; used for leaf elements
    /// (`arg`, `entry`) whose inner text (if any) the AST does not retain.
    fn skip_to_end(&mut self, name: &str) -> Result<(), Error> {
        let mut depth = 1u32;
        loop {
            match self.tok.next_token()? {
                Token::StartTag(n) if n == name => depth += 1,
                Token::EndTag(n) if n == name => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Token::Eof => return Err(self.err(SchemaErrorKind::UnexpectedTag("<eof>".into()))),
                _ => {}
            }
        }
    }

    pub fn parse(mut self) -> Result<Protocol, Error> {
        loop {
            match self.tok.next_token()? {
                Token::StartTag("protocol") => return self.parse_protocol(),
                Token::Eof => return Err(self.err(SchemaErrorKind::UnexpectedTag("<eof>".into()))),
                Token::StartTag(other) => return Err(self.err(SchemaErrorKind::UnexpectedTag(other.into()))),
                _ => continue,
            }
        }
    }

    fn parse_protocol(&mut self) -> Result<Protocol, Error> {
        let (mut attrs, self_closed) = self.read_attrs()?;
        let name = attrs.take("name").ok_or_else(|| self.err(SchemaErrorKind::NoName))?;
        let mut protocol = Protocol { name, copyright: None, description: None, interfaces: Vec::new() };
        if self_closed {
            return Ok(protocol);
        }
        loop {
            match self.tok.next_token()? {
                Token::EndTag("protocol") => break,
                Token::StartTag("description") => protocol.description = Some(self.parse_description()?),
                Token::StartTag("copyright") => protocol.copyright = Some(self.collect_text_until("copyright")?),
                Token::StartTag("interface") => protocol.interfaces.push(self.parse_interface()?),
                Token::Text(_) => {}
                Token::Eof => return Err(self.err(SchemaErrorKind::UnexpectedTag("<eof>".into()))),
                Token::StartTag(other) => return Err(self.err(SchemaErrorKind::UnexpectedTag(other.into()))),
                other => return Err(self.err(SchemaErrorKind::UnexpectedTag(format!("{other:?}")))),
            }
        }
        Ok(protocol)
    }

    fn collect_text_until(&mut self, name: &str) -> Result<String, Error> {
        let mut text = String::new();
        loop {
            match self.tok.next_token()? {
                Token::Text(t) => {
                    if !text.is_empty() {
                        text.push('\n');
                    }
                    text.push_str(t);
                }
                Token::EndTag(n) if n == name => return Ok(text),
                Token::Eof => return Err(self.err(SchemaErrorKind::UnexpectedTag("<eof>".into()))),
                _ => {}
            }
        }
    }

    fn parse_description(&mut self) -> Result<Description, Error> {
        let (mut attrs, self_closed) = self.read_attrs()?;
        let summary = attrs.take("summary");
        if self_closed {
            return Ok(Description { summary, text: None });
        }
        let text = self.collect_text_until("description")?;
        Ok(Description { summary, text: if text.is_empty() { None } else { Some(text) } })
    }

    fn parse_interface(&mut self) -> Result<Interface, Error> {
        let (mut attrs, self_closed) = self.read_attrs()?;
        let name = attrs.take("name").ok_or_else(|| self.err(SchemaErrorKind::NoName))?;
        let version = match attrs.take("version") {
            Some(v) => parse_u32(&v, self.tok.current_pos())?,
            None => return Err(self.err(SchemaErrorKind::NoVersion)),
        };
        let mut iface =
            Interface { name, version, description: None, requests: Vec::new(), events: Vec::new(), enums: Vec::new() };
        if self_closed {
            return Ok(iface);
        }
        loop {
            match self.tok.next_token()? {
                Token::EndTag("interface") => break,
                Token::StartTag("description") => iface.description = Some(self.parse_description()?),
                Token::StartTag("request") => iface.requests.push(self.parse_message()?),
                Token::StartTag("event") => iface.events.push(self.parse_message()?),
                Token::StartTag("enum") => iface.enums.push(self.parse_enum()?),
                Token::Text(_) => {}
                Token::Eof => return Err(self.err(SchemaErrorKind::UnexpectedTag("<eof>".into()))),
                Token::StartTag(other) => return Err(self.err(SchemaErrorKind::UnexpectedTag(other.into()))),
                other => return Err(self.err(SchemaErrorKind::UnexpectedTag(format!("{other:?}")))),
            }
        }
        Ok(iface)
    }

    fn parse_message(&mut self) -> Result<Message, Error> {
        let (mut attrs, self_closed) = self.read_attrs()?;
        let name = attrs.take("name").ok_or_else(|| self.err(SchemaErrorKind::NoName))?;
        let kind = match attrs.take("type").as_deref() {
            Some("destructor") => MessageKind::Destructor,
            Some(other) => return Err(self.err(SchemaErrorKind::InvalidAttribute(other.into()))),
            None => MessageKind::Normal,
        };
        let since = match attrs.take("since") {
            Some(v) => parse_u32(&v, self.tok.current_pos())?,
            None => 1,
        };
        let deprecated_since =
            attrs.take("deprecated-since").map(|v| parse_u32(&v, self.tok.current_pos())).transpose()?;
        let mut message = Message { name, kind, since, deprecated_since, description: None, args: Vec::new() };
        if self_closed {
            return Ok(message);
        }
        loop {
            match self.tok.next_token()? {
                Token::EndTag("request") | Token::EndTag("event") => break,
                Token::StartTag("description") => message.description = Some(self.parse_description()?),
                Token::StartTag("arg") => message.args.push(self.parse_arg()?),
                Token::Text(_) => {}
                Token::Eof => return Err(self.err(SchemaErrorKind::UnexpectedTag("<eof>".into()))),
                Token::StartTag(other) => return Err(self.err(SchemaErrorKind::UnexpectedTag(other.into()))),
                other => return Err(self.err(SchemaErrorKind::UnexpectedTag(format!("{other:?}")))),
            }
        }
        Ok(message)
    }

    fn parse_arg(&mut self) -> Result<Argument, Error> {
        let pos = self.tok.current_pos();
        let (mut attrs, self_closed) = self.read_attrs()?;
        let name = attrs.take("name").ok_or_else(|| self.err(SchemaErrorKind::NoName))?;
        let type_str = attrs.take("type").ok_or_else(|| self.err(SchemaErrorKind::NoType))?;
        let enum_name = attrs.take("enum");
        let iface_name = attrs.take("interface");
        let allow_null = attrs.take("allow-null").as_deref() == Some("true");
        let summary = attrs.take("summary");

        if iface_name.is_some() && !matches!(type_str.as_str(), "object" | "new_id") {
            return Err(Error::Schema { pos, kind: SchemaErrorKind::InterfaceInvalid });
        }
        if allow_null && !matches!(type_str.as_str(), "object" | "string") {
            return Err(Error::Schema { pos, kind: SchemaErrorKind::AllowNullInvalid });
        }
        if enum_name.is_some() && !matches!(type_str.as_str(), "int" | "uint") {
            return Err(Error::Schema { pos, kind: SchemaErrorKind::EnumInvalid });
        }

        let arg_type = if let Some(e) = enum_name {
            ArgType::Enum(e)
        } else {
            match type_str.as_str() {
                "int" => ArgType::Int,
                "uint" => ArgType::Uint,
                "fixed" => ArgType::Fixed,
                "array" => ArgType::Array,
                "fd" => ArgType::Fd,
                "string" => ArgType::String { allow_null },
                "object" => ArgType::Object { allow_null, iface: iface_name },
                "new_id" => ArgType::NewId { iface: iface_name },
                other => return Err(Error::Schema { pos, kind: SchemaErrorKind::InvalidAttribute(other.into()) }),
            }
        };

        if !self_closed {
            self.skip_to_end("arg")?;
        }
        Ok(Argument { name, arg_type, summary })
    }

    fn parse_enum(&mut self) -> Result<Enum, Error> {
        let (mut attrs, self_closed) = self.read_attrs()?;
        let name = attrs.take("name").ok_or_else(|| self.err(SchemaErrorKind::NoName))?;
        let since = match attrs.take("since") {
            Some(v) => parse_u32(&v, self.tok.current_pos())?,
            None => 1,
        };
        let is_bitfield = attrs.take("bitfield").as_deref() == Some("true");
        let mut en = Enum { name, since, is_bitfield, description: None, items: Vec::new() };
        if self_closed {
            return Ok(en);
        }
        loop {
            match self.tok.next_token()? {
                Token::EndTag("enum") => break,
                Token::StartTag("description") => en.description = Some(self.parse_description()?),
                Token::StartTag("entry") => en.items.push(self.parse_entry()?),
                Token::Text(_) => {}
                Token::Eof => return Err(self.err(SchemaErrorKind::UnexpectedTag("<eof>".into()))),
                Token::StartTag(other) => return Err(self.err(SchemaErrorKind::UnexpectedTag(other.into()))),
                other => return Err(self.err(SchemaErrorKind::UnexpectedTag(format!("{other:?}")))),
            }
        }
        Ok(en)
    }

    fn parse_entry(&mut self) -> Result<EnumItem, Error> {
        let pos = self.tok.current_pos();
        let (mut attrs, self_closed) = self.read_attrs()?;
        let name = attrs.take("name").ok_or_else(|| self.err(SchemaErrorKind::NoName))?;
        let value_str = attrs.take("value").ok_or_else(|| self.err(SchemaErrorKind::NoValue))?;
        let value = parse_value(&value_str, pos)?;
        let since = match attrs.take("since") {
            Some(v) => parse_u32(&v, pos)?,
            None => 1,
        };
        let deprecated_since = attrs.take("deprecated-since").map(|v| parse_u32(&v, pos)).transpose()?;
        let summary = attrs.take("summary");
        if !self_closed {
            self.skip_to_end("entry")?;
        }
        Ok(EnumItem {
            name,
            value,
            since,
            deprecated_since,
            description: summary.map(|s| Description { summary: Some(s), text: None }),
        })
    }
}

fn parse_u32(s: &str, pos: Pos) -> Result<u32, Error> {
    s.parse().map_err(|_| Error::Schema { pos, kind: SchemaErrorKind::InvalidInt(s.to_string()) })
}

fn parse_value(s: &str, pos: Pos) -> Result<u32, Error> {
    if let Some(hex) = s.strip_prefix("0x") {
        u32::from_str_radix(hex, 16).map_err(|_| Error::Schema { pos, kind: SchemaErrorKind::InvalidInt(s.to_string()) })
    } else {
        parse_u32(s, pos)
    }
}
