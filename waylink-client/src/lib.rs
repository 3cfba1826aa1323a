//! A simple Rust implementation of a Wayland client library.
//!
//! This crate wires the low level codec in `waylink-wire` to a small set of pregenerated
//! protocol bindings under [`protocol`]. There is no central object table or dispatch
//! queue: [`Connection::read_event`] hands back an undecoded [`waylink_wire::AnonymousEvent`]
//! and the caller picks the right `decode_event` function for whatever object it expects
//! to hear from.

pub mod connection;
pub mod debug;
pub mod object;
pub mod protocol;

pub use connection::{ConnectError, Connection, ProtocolError, RecvError};
pub use object::{check_since, RequestError, VersionError, WlProxy};
pub use waylink_wire::{AnonymousEvent, ArgValue, DecodeError, Fixed, IoMode, ObjectId};
