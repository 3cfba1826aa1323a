//! `WAYLAND_DEBUG`-style request/event logging.
//!
//! Generated code calls [`log_request`] and [`log_event`] directly with already-formatted
//! argument text; there is no runtime introspection of a signature table involved.

use std::fmt;
use std::sync::OnceLock;

use crate::object::ObjectId;

fn enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var_os("WAYLAND_DEBUG").is_some())
}

pub fn log_request(interface: &str, id: ObjectId, name: &str, args: fmt::Arguments) {
    if enabled() {
        eprintln!("[waylink]  -> {interface}@{}.{name}({args})", id.as_u32());
    }
}

pub fn log_event(interface: &str, id: ObjectId, name: &str, args: fmt::Arguments) {
    if enabled() {
        eprintln!("[waylink] {interface}@{}.{name}({args})", id.as_u32());
    }
}
