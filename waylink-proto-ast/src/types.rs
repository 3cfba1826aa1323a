#[derive(Debug, Clone)]
pub struct Protocol {
    pub name: String,
    pub copyright: Option<String>,
    pub description: Option<Description>,
    pub interfaces: Vec<Interface>,
}

#[derive(Debug, Clone)]
pub struct Interface {
    pub name: String,
    pub version: u32,
    pub description: Option<Description>,
    pub requests: Vec<Message>,
    pub events: Vec<Message>,
    pub enums: Vec<Enum>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Normal,
    Destructor,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub name: String,
    pub kind: MessageKind,
    pub since: u32,
    pub deprecated_since: Option<u32>,
    pub description: Option<Description>,
    pub args: Vec<Argument>,
}

#[derive(Debug, Clone)]
pub struct Enum {
    pub name: String,
    pub since: u32,
    pub is_bitfield: bool,
    pub description: Option<Description>,
    pub items: Vec<EnumItem>,
}

#[derive(Debug, Clone)]
pub struct Description {
    pub summary: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Argument {
    pub name: String,
    pub arg_type: ArgType,
    pub summary: Option<String>,
}

/// The types of Wayland message arguments.
///
/// Spec: <https://wayland.freedesktop.org/docs/html/ch04.html>
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgType {
    /// 32-bit signed integer.
    Int,
    /// 32-bit unsigned integer.
    Uint,
    /// 32-bit integer referencing a value of a given (possibly qualified) enum.
    Enum(String),
    /// Signed 24.8 decimal number.
    Fixed,
    /// Length-prefixed null-terminated string.
    String { allow_null: bool },
    /// 32-bit unsigned integer referring to an object.
    Object { allow_null: bool, iface: Option<String> },
    /// 32-bit unsigned integer informing about object creation.
    NewId { iface: Option<String> },
    /// Length-prefixed array.
    Array,
    /// A file descriptor in the ancillary data.
    Fd,
}

#[derive(Debug, Clone)]
pub struct EnumItem {
    pub name: String,
    pub value: u32,
    pub since: u32,
    pub deprecated_since: Option<u32>,
    pub description: Option<Description>,
}
