//! `wl_data_offer`.

pub mod wl_data_offer {
    use std::ffi::{CStr, CString};
    use std::ops::BitOr;
    use std::os::fd::OwnedFd;

    use waylink_wire::socket::opt_cstring;
    use waylink_wire::{AnonymousEvent, ArgValue, DecodeError, ObjectId};

    use crate::connection::Connection;
    use crate::object::{check_since, RequestError, WlProxy};

    /// `wl_data_offer.dnd_action` - a bitfield, so it's a newtype over the raw bits with
    /// named constants rather than a plain enum.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DndAction(pub u32);

    impl DndAction {
        pub const NONE: Self = Self(0);
        pub const COPY: Self = Self(1);
        pub const MOVE: Self = Self(2);
        pub const ASK: Self = Self(4);

        pub fn contains(self, other: Self) -> bool {
            self.0 & other.0 == other.0
        }
    }

    impl BitOr for DndAction {
        type Output = Self;
        fn bitor(self, rhs: Self) -> Self {
            Self(self.0 | rhs.0)
        }
    }

    /// `wl_data_offer.error`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(u32)]
    pub enum Error {
        InvalidFinish = 0,
        InvalidActionMask = 1,
        InvalidAction = 2,
        InvalidOffer = 3,
    }

    /// `wl_data_offer` - one drag-and-drop/selection offer, enumerating the mime types
    /// the source can provide.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WlDataOffer {
        id: ObjectId,
        version: u32,
    }

    impl WlProxy for WlDataOffer {
        const INTERFACE: &'static str = "wl_data_offer";
        fn id(&self) -> ObjectId {
            self.id
        }
        fn version(&self) -> u32 {
            self.version
        }
    }

    impl WlDataOffer {
        pub fn from_id(id: ObjectId, version: u32) -> Self {
            Self { id, version }
        }

        /// Request 0: indicate that `mime_type` (or no type, if `None`) is acceptable,
        /// in response to `enter`/`motion`.
        pub fn accept(
            &self,
            conn: &mut Connection,
            serial: u32,
            mime_type: Option<&CStr>,
        ) -> Result<(), RequestError> {
            crate::debug::log_request(
                Self::INTERFACE,
                self.id,
                "accept",
                format_args!("{serial}, {mime_type:?}"),
            );
            conn.send_request(
                self.id,
                0,
                vec![
                    ArgValue::Uint(serial),
                    ArgValue::OptString(opt_cstring(mime_type.map(CStr::to_bytes))),
                ],
            )?;
            Ok(())
        }

        /// Request 1: ask the source to send its `mime_type` data through `fd`.
        pub fn receive(
            &self,
            conn: &mut Connection,
            mime_type: &CStr,
            fd: OwnedFd,
        ) -> Result<(), RequestError> {
            crate::debug::log_request(Self::INTERFACE, self.id, "receive", format_args!("{mime_type:?}, fd"));
            conn.send_request(
                self.id,
                1,
                vec![ArgValue::String(CString::from(mime_type)), ArgValue::Fd(fd)],
            )?;
            Ok(())
        }

        /// Request 2 (destructor).
        pub fn destroy(&self, conn: &mut Connection) -> Result<(), RequestError> {
            crate::debug::log_request(Self::INTERFACE, self.id, "destroy", format_args!(""));
            conn.send_request(self.id, 2, vec![])?;
            Ok(())
        }

        /// Request 3 (since version 3): tell the source no further `accept` calls are
        /// coming.
        pub fn finish(&self, conn: &mut Connection) -> Result<(), RequestError> {
            check_since(self, 3)?;
            crate::debug::log_request(Self::INTERFACE, self.id, "finish", format_args!(""));
            conn.send_request(self.id, 3, vec![])?;
            Ok(())
        }

        /// Request 4 (since version 3): narrow down the set of actions the destination
        /// supports, and which one it prefers.
        pub fn set_actions(
            &self,
            conn: &mut Connection,
            dnd_actions: DndAction,
            preferred_action: DndAction,
        ) -> Result<(), RequestError> {
            check_since(self, 3)?;
            crate::debug::log_request(
                Self::INTERFACE,
                self.id,
                "set_actions",
                format_args!("{dnd_actions:?}, {preferred_action:?}"),
            );
            conn.send_request(
                self.id,
                4,
                vec![ArgValue::Uint(dnd_actions.0), ArgValue::Uint(preferred_action.0)],
            )?;
            Ok(())
        }
    }

    /// An event sent by `wl_data_offer`.
    #[derive(Debug, Clone)]
    pub enum Event {
        /// Event 0: one mime type the source can provide.
        Offer { mime_type: CString },
        /// Event 1 (since version 3): the actions the source supports.
        SourceActions { source_actions: DndAction },
        /// Event 2 (since version 3): the compositor picked this action.
        Action { dnd_action: DndAction },
    }

    pub fn decode_event(ev: &mut AnonymousEvent<'_>) -> Result<Event, DecodeError> {
        let mut r = ev.reader();
        match ev.opcode {
            0 => Ok(Event::Offer { mime_type: r.read_string()?.to_owned() }),
            1 => Ok(Event::SourceActions { source_actions: DndAction(r.read_uint()?) }),
            2 => Ok(Event::Action { dnd_action: DndAction(r.read_uint()?) }),
            other => panic!("wl_data_offer has no event with opcode {other}"),
        }
    }

    #[cfg(test)]
    mod tests {
        use std::os::unix::net::UnixStream;

        use super::*;
        use crate::object::RequestError;

        #[test]
        fn finish_below_version_3_is_rejected_locally() {
            let (a, _b) = UnixStream::pair().unwrap();
            let mut conn = Connection::from_stream(a);
            let offer = WlDataOffer::from_id(ObjectId::DISPLAY, 1);

            match offer.finish(&mut conn) {
                Err(RequestError::Version(err)) => {
                    assert_eq!(err.bound, 1);
                    assert_eq!(err.required, 3);
                    assert_eq!(err.interface, "wl_data_offer");
                }
                other => panic!("expected a version error, got {other:?}"),
            }
        }

        #[test]
        fn finish_at_version_3_is_allowed() {
            let (a, _b) = UnixStream::pair().unwrap();
            let mut conn = Connection::from_stream(a);
            let offer = WlDataOffer::from_id(ObjectId::DISPLAY, 3);
            assert!(offer.finish(&mut conn).is_ok());
        }
    }
}

pub use wl_data_offer::WlDataOffer;
