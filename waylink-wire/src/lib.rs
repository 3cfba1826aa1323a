//! Core Wayland wire types
//!
//! This crate implements the low level pieces shared by every generated protocol binding:
//! object ids, the 24.8 fixed point number, message headers, the request encoder and the
//! event decoder. It knows nothing about any particular interface; all of that comes from
//! generated code built on top of [`Reader`] and [`ArgValue`].

use std::borrow::Cow;
use std::collections::VecDeque;
use std::ffi::{CStr, CString};
use std::fmt;
use std::num::NonZeroU32;
use std::os::fd::OwnedFd;

mod ring_buffer;
pub mod socket;
pub mod transport;

pub use socket::{BufferedSocket, PeekHeaderError, RecvEventError, SendMessageError};

/// The "mode" of an IO operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoMode {
    /// Blocking.
    ///
    /// The function call may block, but it will never return [WouldBlock](std::io::ErrorKind::WouldBlock)
    /// error.
    Blocking,
    /// Non-blocking.
    ///
    /// The function call will not block on IO operations. [WouldBlock](std::io::ErrorKind::WouldBlock)
    /// error is returned if the operation cannot be completed immediately.
    NonBlocking,
}

/// A Wayland object ID.
///
/// Uniquely identifies an object at each point of time. An ID may have a limited lifetime:
/// once an object is destroyed the server sends `wl_display.delete_id` and the id may be
/// reused by the client for a later object.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub NonZeroU32);

impl ObjectId {
    pub const DISPLAY: Self = Self(unsafe { NonZeroU32::new_unchecked(1) });
    pub const MAX_CLIENT: Self = Self(unsafe { NonZeroU32::new_unchecked(0xFEFFFFFF) });
    pub const MIN_SERVER: Self = Self(unsafe { NonZeroU32::new_unchecked(0xFF000000) });

    /// Returns the numeric representation of the ID
    pub fn as_u32(self) -> u32 {
        self.0.get()
    }

    /// Whether the object with this ID was created by the server
    pub fn created_by_server(self) -> bool {
        self >= Self::MIN_SERVER
    }

    /// Whether the object with this ID was created by the client
    pub fn created_by_client(self) -> bool {
        self <= Self::MAX_CLIENT
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A header of a Wayland message
#[derive(Debug, Clone, Copy)]
pub struct MessageHeader {
    /// The ID of the associated object
    pub object_id: ObjectId,
    /// Size of the message in bytes, including the header
    pub size: u16,
    /// The opcode of the message
    pub opcode: u16,
}

impl MessageHeader {
    /// The size of the header in bytes
    pub const SIZE: usize = 8;
}

/// An argument value passed to a request.
///
/// Generated request methods build a `Vec<ArgValue>` and hand it to
/// [`BufferedSocket::send_request`]; nothing downstream needs to know the interface's
/// signature, the tag on each value is enough to encode it.
#[derive(Debug)]
pub enum ArgValue {
    Int(i32),
    Uint(u32),
    Fixed(Fixed),
    Object(ObjectId),
    OptObject(Option<ObjectId>),
    NewId(ObjectId),
    /// A generic `new_id`: the interface name, version and id are all sent on the wire
    /// (used by requests such as `wl_registry.bind` whose target interface isn't fixed).
    AnyNewId(Cow<'static, CStr>, u32, ObjectId),
    String(CString),
    OptString(Option<CString>),
    Array(Vec<u8>),
    Fd(OwnedFd),
}

impl ArgValue {
    /// The size of the argument on the wire, in bytes (padding included, fds excluded).
    pub fn size(&self) -> usize {
        match self {
            Self::Int(_)
            | Self::Uint(_)
            | Self::Fixed(_)
            | Self::Object(_)
            | Self::OptObject(_)
            | Self::NewId(_)
            | Self::OptString(None) => 4,
            Self::AnyNewId(iface, _version, _id) => {
                iface.to_bytes_with_nul().len().next_multiple_of(4) + 12
            }
            Self::String(string) | Self::OptString(Some(string)) => {
                string.to_bytes_with_nul().len().next_multiple_of(4) + 4
            }
            Self::Array(array) => array.len().next_multiple_of(4) + 4,
            Self::Fd(_) => 0,
        }
    }
}

/// Signed 24.8 decimal number
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Fixed(pub i32);

impl From<i32> for Fixed {
    fn from(value: i32) -> Self {
        Self(value * 256)
    }
}

impl From<u32> for Fixed {
    fn from(value: u32) -> Self {
        Self(value as i32 * 256)
    }
}

impl From<f32> for Fixed {
    fn from(value: f32) -> Self {
        Self((value * 256.0) as i32)
    }
}

impl From<f64> for Fixed {
    fn from(value: f64) -> Self {
        Self((value * 256.0) as i32)
    }
}

impl Fixed {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(256);
    pub const MINUS_ONE: Self = Self(-256);

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 256.0
    }

    pub fn as_f32(self) -> f32 {
        self.0 as f32 / 256.0
    }

    pub fn as_int(self) -> i32 {
        self.0 / 256
    }

    pub fn is_int(self) -> bool {
        self.0 & 255 == 0
    }
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_f64().fmt(f)
    }
}

/// An event that has been received but not yet decoded into its typed form.
///
/// `self_id`/`opcode` identify which generated `decode_*` function applies; `arg_bytes`
/// borrows directly from the connection's read buffer (valid until the next event is
/// read), and `fds` is a shared queue that decoders drain in argument order.
pub struct AnonymousEvent<'a> {
    pub self_id: ObjectId,
    pub opcode: u16,
    pub arg_bytes: &'a [u8],
    pub fds: &'a mut VecDeque<OwnedFd>,
}

impl<'a> AnonymousEvent<'a> {
    /// A [`Reader`] positioned at the start of this event's argument bytes.
    pub fn reader(&self) -> Reader<'a> {
        Reader::new(self.arg_bytes)
    }

    /// Pop the next file descriptor associated with this event.
    ///
    /// Fds arrive out of band and are queued in the order messages were sent, so a
    /// decoder must call this exactly once per `fd` argument, in declared order.
    pub fn next_fd(&mut self) -> Result<OwnedFd, DecodeError> {
        self.fds.pop_front().ok_or(DecodeError::MissingFd)
    }
}

/// An error encountered while decoding an event's argument bytes.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected end of message")]
    UnexpectedEnd,
    #[error("a non-nullable object argument was null")]
    UnexpectedNullObject,
    #[error("a non-nullable string argument was null")]
    UnexpectedNullString,
    #[error("a string argument is not valid UTF-8 / contains no terminating nul")]
    MalformedString,
    #[error("expected a file descriptor but none is queued")]
    MissingFd,
    #[error("{0} is not a valid value for this enum")]
    InvalidEnum(u32),
}

/// A cursor over an event's argument bytes.
///
/// Every method advances the cursor past the value it reads (including padding), mirroring
/// the layout rules in [the wire format]. Strings and arrays are returned as borrows of the
/// original buffer: no allocation happens on the decode path.
///
/// [the wire format]: https://wayland.freedesktop.org/docs/html/ch04.html
#[derive(Clone, Copy)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.pos.checked_add(n).ok_or(DecodeError::UnexpectedEnd)?;
        let slice = self.bytes.get(self.pos..end).ok_or(DecodeError::UnexpectedEnd)?;
        self.pos = end;
        Ok(slice)
    }

    fn take_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_ne_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_int(&mut self) -> Result<i32, DecodeError> {
        Ok(self.take_u32()? as i32)
    }

    pub fn read_uint(&mut self) -> Result<u32, DecodeError> {
        self.take_u32()
    }

    pub fn read_fixed(&mut self) -> Result<Fixed, DecodeError> {
        Ok(Fixed(self.take_u32()? as i32))
    }

    pub fn read_object(&mut self) -> Result<ObjectId, DecodeError> {
        NonZeroU32::new(self.take_u32()?)
            .map(ObjectId)
            .ok_or(DecodeError::UnexpectedNullObject)
    }

    pub fn read_object_opt(&mut self) -> Result<Option<ObjectId>, DecodeError> {
        Ok(NonZeroU32::new(self.take_u32()?).map(ObjectId))
    }

    pub fn read_new_id(&mut self) -> Result<ObjectId, DecodeError> {
        self.read_object()
    }

    /// Reads the three-part generic `new_id` used e.g. by `wl_registry.bind`: the target
    /// interface name, the bound version, and the freshly allocated object id.
    pub fn read_new_id_any(&mut self) -> Result<(&'a CStr, u32, ObjectId), DecodeError> {
        let iface = self.read_string()?;
        let version = self.read_uint()?;
        let id = self.read_new_id()?;
        Ok((iface, version, id))
    }

    fn read_len_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.take_u32()? as usize;
        let data = self.take(len)?;
        let padding = (4 - (len % 4)) % 4;
        self.take(padding)?;
        Ok(data)
    }

    pub fn read_string(&mut self) -> Result<&'a CStr, DecodeError> {
        self.read_string_opt()?.ok_or(DecodeError::UnexpectedNullString)
    }

    pub fn read_string_opt(&mut self) -> Result<Option<&'a CStr>, DecodeError> {
        let len = self.take(4).map(|b| u32::from_ne_bytes(b.try_into().unwrap()))?;
        self.pos -= 4; // un-take, read_len_bytes re-reads the length
        if len == 0 {
            self.take(4)?;
            return Ok(None);
        }
        let data = self.read_len_bytes()?;
        CStr::from_bytes_with_nul(data)
            .map(Some)
            .map_err(|_| DecodeError::MalformedString)
    }

    pub fn read_array(&mut self) -> Result<&'a [u8], DecodeError> {
        self.read_len_bytes()
    }
}
