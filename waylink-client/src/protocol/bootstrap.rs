//! `wl_display`, `wl_registry` and `wl_callback`.
//!
//! These three interfaces bootstrap every connection, so unlike the rest of `protocol/`
//! they're hand-maintained here rather than produced by a `.xml` run through the scanner.

pub mod wl_display {
    use std::ffi::CString;

    use waylink_wire::{AnonymousEvent, ArgValue, DecodeError, ObjectId};

    use crate::connection::Connection;
    use crate::object::{RequestError, WlProxy};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WlDisplay {
        id: ObjectId,
        version: u32,
    }

    impl WlProxy for WlDisplay {
        const INTERFACE: &'static str = "wl_display";
        fn id(&self) -> ObjectId {
            self.id
        }
        fn version(&self) -> u32 {
            self.version
        }
    }

    impl WlDisplay {
        pub(crate) fn from_id(id: ObjectId, version: u32) -> Self {
            Self { id, version }
        }

        /// Request 0: ask the server to emit `wl_callback.done` once every request sent
        /// before this one has been processed.
        pub fn sync(
            &self,
            conn: &mut Connection,
        ) -> Result<super::wl_callback::WlCallback, RequestError> {
            let new_id = conn.next_object_id();
            crate::debug::log_request(
                Self::INTERFACE,
                self.id,
                "sync",
                format_args!("new id {}", new_id.as_u32()),
            );
            conn.send_request(self.id, 0, vec![ArgValue::NewId(new_id)])?;
            Ok(super::wl_callback::WlCallback::from_id(new_id, 1))
        }

        /// Request 1: create a `wl_registry` that will receive `global`/`global_remove` events.
        pub fn get_registry(
            &self,
            conn: &mut Connection,
        ) -> Result<super::wl_registry::WlRegistry, RequestError> {
            let new_id = conn.next_object_id();
            crate::debug::log_request(
                Self::INTERFACE,
                self.id,
                "get_registry",
                format_args!("new id {}", new_id.as_u32()),
            );
            conn.send_request(self.id, 1, vec![ArgValue::NewId(new_id)])?;
            Ok(super::wl_registry::WlRegistry::from_id(new_id, 1))
        }
    }

    /// An event sent by `wl_display`.
    #[derive(Debug, Clone)]
    pub enum Event {
        /// Event 0: a fatal protocol error on some object.
        Error { object_id: ObjectId, code: u32, message: CString },
        /// Event 1: the given client-owned id may be reused.
        DeleteId(u32),
    }

    /// Decode the body of a `wl_display` event.
    ///
    /// Returns `Err` only on a malformed message. An opcode outside 0..=1 means the
    /// caller dispatched the wrong object to this function, which is a bug in the
    /// caller, not a recoverable decode failure.
    pub fn decode_event(ev: &mut AnonymousEvent<'_>) -> Result<Event, DecodeError> {
        let mut r = ev.reader();
        match ev.opcode {
            0 => {
                let object_id = r.read_object_opt()?.unwrap_or(ObjectId::DISPLAY);
                let code = r.read_uint()?;
                let message = r.read_string()?.to_owned();
                Ok(Event::Error { object_id, code, message })
            }
            1 => Ok(Event::DeleteId(r.read_uint()?)),
            other => panic!("wl_display has no event with opcode {other}"),
        }
    }
}

pub mod wl_registry {
    use std::ffi::CString;

    use waylink_wire::{AnonymousEvent, ArgValue, DecodeError, ObjectId};

    use crate::connection::Connection;
    use crate::object::{RequestError, WlProxy};

    /// `wl_registry` - advertises compositor globals and binds them to client objects.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WlRegistry {
        id: ObjectId,
        version: u32,
    }

    impl WlProxy for WlRegistry {
        const INTERFACE: &'static str = "wl_registry";
        fn id(&self) -> ObjectId {
            self.id
        }
        fn version(&self) -> u32 {
            self.version
        }
    }

    impl WlRegistry {
        pub(crate) fn from_id(id: ObjectId, version: u32) -> Self {
            Self { id, version }
        }

        /// Request 0: bind the global named `name` to a new object of `interface` at
        /// `version`. This is the one place a generic `new_id` is used: the interface
        /// name is sent on the wire rather than fixed at compile time, so the caller
        /// gets back a bare [`ObjectId`] and constructs the matching proxy type itself.
        pub fn bind(
            &self,
            conn: &mut Connection,
            name: u32,
            interface: &'static std::ffi::CStr,
            version: u32,
        ) -> Result<ObjectId, RequestError> {
            let new_id = conn.next_object_id();
            crate::debug::log_request(
                Self::INTERFACE,
                self.id,
                "bind",
                format_args!("{name}, {interface:?} v{version}, new id {}", new_id.as_u32()),
            );
            conn.send_request(
                self.id,
                0,
                vec![
                    ArgValue::Uint(name),
                    ArgValue::AnyNewId(std::borrow::Cow::Borrowed(interface), version, new_id),
                ],
            )?;
            Ok(new_id)
        }
    }

    /// An event sent by `wl_registry`.
    #[derive(Debug, Clone)]
    pub enum Event {
        /// Event 0: a global is available for binding.
        Global { name: u32, interface: CString, version: u32 },
        /// Event 1: a previously advertised global is gone.
        GlobalRemove { name: u32 },
    }

    pub fn decode_event(ev: &mut AnonymousEvent<'_>) -> Result<Event, DecodeError> {
        let mut r = ev.reader();
        match ev.opcode {
            0 => {
                let name = r.read_uint()?;
                let interface = r.read_string()?.to_owned();
                let version = r.read_uint()?;
                Ok(Event::Global { name, interface, version })
            }
            1 => Ok(Event::GlobalRemove { name: r.read_uint()? }),
            other => panic!("wl_registry has no event with opcode {other}"),
        }
    }
}

pub mod wl_callback {
    use waylink_wire::{AnonymousEvent, DecodeError, ObjectId};

    use crate::object::WlProxy;

    /// `wl_callback` - a one-shot object fired by `wl_display.sync`, `wl_surface.frame`
    /// and similar "tell me when" requests. It has no requests of its own.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WlCallback {
        id: ObjectId,
        version: u32,
    }

    impl WlProxy for WlCallback {
        const INTERFACE: &'static str = "wl_callback";
        fn id(&self) -> ObjectId {
            self.id
        }
        fn version(&self) -> u32 {
            self.version
        }
    }

    impl WlCallback {
        pub(crate) fn from_id(id: ObjectId, version: u32) -> Self {
            Self { id, version }
        }
    }

    /// An event sent by `wl_callback`. It also acts as a destructor: the server will
    /// not reuse this object id until the client sees the matching
    /// `wl_display.delete_id`.
    #[derive(Debug, Clone, Copy)]
    pub enum Event {
        /// Event 0: the callback fired; the meaning of `data` depends on what
        /// requested it (e.g. the current time for `wl_surface.frame`, unused for
        /// `wl_display.sync`).
        Done { data: u32 },
    }

    pub fn decode_event(ev: &mut AnonymousEvent<'_>) -> Result<Event, DecodeError> {
        let mut r = ev.reader();
        match ev.opcode {
            0 => Ok(Event::Done { data: r.read_uint()? }),
            other => panic!("wl_callback has no event with opcode {other}"),
        }
    }
}

pub use wl_callback::WlCallback;
pub use wl_display::WlDisplay;
pub use wl_registry::WlRegistry;
