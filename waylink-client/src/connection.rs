//! Wayland connection

use std::env;
use std::fmt;
use std::io;
use std::num::NonZeroU32;
use std::os::fd::AsRawFd;
use std::os::fd::RawFd;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

use waylink_wire::{AnonymousEvent, ArgValue, BufferedSocket, IoMode, ObjectId};

use crate::protocol::wl_callback;
use crate::protocol::wl_display::{self, WlDisplay};

/// An error that can occur while connecting to a Wayland socket.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// Either `$XDG_RUNTIME_DIR` or `$WAYLAND_DISPLAY` was not available.
    #[error("both $XDG_RUNTIME_DIR and $WAYLAND_DISPLAY must be set")]
    NotEnoughEnvVars,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A protocol-level error reported by the compositor via `wl_display.error`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("protocol error on object #{object_id} (code {code}): {message}")]
pub struct ProtocolError {
    pub object_id: u32,
    pub code: u32,
    pub message: String,
}

/// Anything that can go wrong while waiting for an event.
#[derive(Debug, thiserror::Error)]
pub enum RecvError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Wayland connection state: a buffered socket plus the client-side id allocator.
///
/// There is no central object table or dispatch machinery: the caller owns whichever
/// typed proxies it created and is responsible for matching an incoming event's
/// `self_id` back to the right one before calling that interface's `decode_event`.
///
/// Set `WAYLAND_DEBUG=1` to print requests and events as they cross the wire.
pub struct Connection {
    socket: BufferedSocket<UnixStream>,
    next_id: u32,
    vacant_ids: Vec<ObjectId>,
}

impl AsRawFd for Connection {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}

impl Connection {
    /// Connect to the Wayland socket named by `$WAYLAND_DISPLAY` under `$XDG_RUNTIME_DIR`.
    pub fn connect() -> Result<Self, ConnectError> {
        let runtime_dir = env::var_os("XDG_RUNTIME_DIR").ok_or(ConnectError::NotEnoughEnvVars)?;
        let wayland_display =
            env::var_os("WAYLAND_DISPLAY").ok_or(ConnectError::NotEnoughEnvVars)?;

        let mut path = PathBuf::new();
        path.push(runtime_dir);
        path.push(wayland_display);

        Ok(Self::from_stream(UnixStream::connect(path)?))
    }

    /// Wrap an already-connected socket (primarily for tests, which use `UnixStream::pair`).
    pub fn from_stream(stream: UnixStream) -> Self {
        Self {
            socket: BufferedSocket::from(stream),
            // id 1 is wl_display, client allocation starts at 2.
            next_id: 2,
            vacant_ids: Vec::new(),
        }
    }

    /// The `wl_display` singleton, always id 1.
    pub fn display(&self) -> WlDisplay {
        WlDisplay::from_id(ObjectId::DISPLAY, 1)
    }

    /// Allocate the next client-owned object id.
    ///
    /// Ids are handed out monotonically starting at 2 (1 is reserved for `wl_display`);
    /// an id freed by [`Self::reclaim_id`] is reused before any id is allocated for the
    /// first time.
    pub fn next_object_id(&mut self) -> ObjectId {
        if let Some(id) = self.vacant_ids.pop() {
            return id;
        }
        let id = ObjectId(NonZeroU32::new(self.next_id).unwrap());
        self.next_id += 1;
        id
    }

    /// Mark a client-owned id as free for reuse.
    ///
    /// Call this only after receiving `wl_display.delete_id` for that id: reusing an id
    /// the server hasn't acknowledged yet would let a reply meant for the old object be
    /// misattributed to the new one.
    pub fn reclaim_id(&mut self, id: ObjectId) {
        debug_assert!(id.created_by_client());
        self.vacant_ids.push(id);
    }

    #[doc(hidden)]
    pub fn send_request(
        &mut self,
        object_id: ObjectId,
        opcode: u16,
        args: Vec<ArgValue>,
    ) -> io::Result<()> {
        self.socket
            .send_request(object_id, opcode, args, IoMode::Blocking)
            .map_err(|e| e.err)
    }

    /// Flush all pending requests to the socket.
    pub fn flush(&mut self) -> io::Result<()> {
        self.socket.flush(IoMode::Blocking)
    }

    /// Block until the next event arrives and hand it to the caller undecoded.
    ///
    /// `wl_display.delete_id` is special-cased: the freed id is reclaimed and the loop
    /// keeps waiting rather than returning the event, since no caller owns a proxy for
    /// `wl_display` itself to decode it with. `wl_display.error` is turned into
    /// [`RecvError::Protocol`] as soon as it's seen.
    pub fn read_event(&mut self) -> Result<AnonymousEvent<'_>, RecvError> {
        loop {
            let header = self.socket.peek_message_header(IoMode::Blocking)?;

            if header.object_id == ObjectId::DISPLAY {
                let mut event = self.socket.recv_event(header, IoMode::Blocking)?;
                match wl_display::decode_event(&mut event)? {
                    wl_display::Event::Error { object_id, code, message } => {
                        return Err(RecvError::Protocol(ProtocolError {
                            object_id: object_id.as_u32(),
                            code,
                            message: message.to_string_lossy().into_owned(),
                        }))
                    }
                    wl_display::Event::DeleteId(id) => {
                        if let Some(id) = NonZeroU32::new(id) {
                            self.reclaim_id(ObjectId(id));
                        }
                        continue;
                    }
                }
            }

            // Safety of the borrow: we return immediately, nothing else touches `self.socket`
            // until the caller is done with this event.
            return Ok(self.socket.recv_event(header, IoMode::Blocking)?);
        }
    }

    /// Send `wl_display.sync` and read events until the matching `wl_callback.done` comes
    /// back, handing every other event to `on_event` along the way.
    pub fn roundtrip(
        &mut self,
        mut on_event: impl FnMut(AnonymousEvent<'_>),
    ) -> Result<(), RecvError> {
        let sync_cb = self
            .display()
            .sync(self)
            .map_err(|e| RecvError::Io(io::Error::new(io::ErrorKind::Other, e.to_string())))?;
        self.flush()?;

        loop {
            let header = self.socket.peek_message_header(IoMode::Blocking)?;
            if header.object_id == sync_cb.id() {
                let mut event = self.socket.recv_event(header, IoMode::Blocking)?;
                let _ = wl_callback::decode_event(&mut event);
                return Ok(());
            }
            if header.object_id == ObjectId::DISPLAY {
                let mut event = self.socket.recv_event(header, IoMode::Blocking)?;
                match wl_display::decode_event(&mut event)? {
                    wl_display::Event::Error { object_id, code, message } => {
                        return Err(RecvError::Protocol(ProtocolError {
                            object_id: object_id.as_u32(),
                            code,
                            message: message.to_string_lossy().into_owned(),
                        }))
                    }
                    wl_display::Event::DeleteId(id) => {
                        if let Some(id) = NonZeroU32::new(id) {
                            self.reclaim_id(ObjectId(id));
                        }
                        continue;
                    }
                }
            }
            let event = self.socket.recv_event(header, IoMode::Blocking)?;
            on_event(event);
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").field("next_id", &self.next_id).finish()
    }
}

impl From<waylink_wire::DecodeError> for RecvError {
    fn from(e: waylink_wire::DecodeError) -> Self {
        RecvError::Io(io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
    }
}

impl From<waylink_wire::PeekHeaderError> for RecvError {
    fn from(e: waylink_wire::PeekHeaderError) -> Self {
        let msg = e.to_string();
        match e {
            waylink_wire::PeekHeaderError::Io(err) => RecvError::Io(err),
            waylink_wire::PeekHeaderError::NullObject => {
                RecvError::Io(io::Error::new(io::ErrorKind::InvalidData, msg))
            }
        }
    }
}

impl From<waylink_wire::RecvEventError> for RecvError {
    fn from(e: waylink_wire::RecvEventError) -> Self {
        let msg = e.to_string();
        match e {
            waylink_wire::RecvEventError::Io(err) => RecvError::Io(err),
            waylink_wire::RecvEventError::TooManyBytes(_) => {
                RecvError::Io(io::Error::new(io::ErrorKind::InvalidData, msg))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send>() {}

    #[test]
    fn connection_is_send() {
        assert_send::<Connection>();
    }

    #[test]
    fn next_object_id_is_monotonic_until_reused() {
        let (a, _b) = UnixStream::pair().unwrap();
        let mut conn = Connection::from_stream(a);
        let first = conn.next_object_id();
        let second = conn.next_object_id();
        assert_eq!(first.as_u32(), 2);
        assert_eq!(second.as_u32(), 3);
        conn.reclaim_id(first);
        let third = conn.next_object_id();
        assert_eq!(third, first);
        let fourth = conn.next_object_id();
        assert_eq!(fourth.as_u32(), 4);
    }

    // S6: a wl_display.error event surfaces as RecvError::Protocol, not a plain decoded
    // event, since no caller holds a WlDisplay proxy to hand it to.
    #[test]
    fn display_error_event_becomes_protocol_error() {
        use std::ffi::CString;

        use waylink_wire::{BufferedSocket, IoMode};

        let (client_sock, server_sock) = UnixStream::pair().unwrap();
        let mut conn = Connection::from_stream(client_sock);
        let mut server = BufferedSocket::from(server_sock);

        server
            .send_request(
                ObjectId::DISPLAY,
                0,
                vec![
                    ArgValue::Object(ObjectId::DISPLAY),
                    ArgValue::Uint(7),
                    ArgValue::String(CString::new("boom").unwrap()),
                ],
                IoMode::Blocking,
            )
            .unwrap();
        server.flush(IoMode::Blocking).unwrap();

        match conn.read_event() {
            Err(RecvError::Protocol(err)) => {
                assert_eq!(err.object_id, 1);
                assert_eq!(err.code, 7);
                assert_eq!(err.message, "boom");
            }
            other => panic!("expected a protocol error, got {other:?}"),
        }
    }

    // wl_display.delete_id is swallowed by read_event, not handed back to the caller:
    // it reclaims the id and keeps waiting for the next "real" event.
    #[test]
    fn delete_id_is_reclaimed_and_not_surfaced() {
        use waylink_wire::{BufferedSocket, IoMode};

        let (client_sock, server_sock) = UnixStream::pair().unwrap();
        let mut conn = Connection::from_stream(client_sock);
        let freed = conn.next_object_id();
        let mut server = BufferedSocket::from(server_sock);

        server
            .send_request(ObjectId::DISPLAY, 1, vec![ArgValue::Uint(freed.as_u32())], IoMode::Blocking)
            .unwrap();
        server
            .send_request(freed, 0, vec![ArgValue::Uint(99)], IoMode::Blocking)
            .unwrap();
        server.flush(IoMode::Blocking).unwrap();

        let event = conn.read_event().unwrap();
        assert_eq!(event.self_id, freed);
        let reused = conn.next_object_id();
        assert_eq!(reused, freed, "the delete_id'd object should be reclaimed for reuse");
    }

    // A header with a null object id is a framing error, not a protocol error: it must
    // surface through RecvError::Io, exercising the PeekHeaderError -> RecvError `?` path.
    #[test]
    fn null_object_header_is_a_recv_io_error() {
        use std::io::Write;

        let (client_sock, mut server_sock) = UnixStream::pair().unwrap();
        let mut conn = Connection::from_stream(client_sock);

        let mut header = [0u8; 8];
        header[4..8].copy_from_slice(&((8u32) << 16).to_ne_bytes());
        server_sock.write_all(&header).unwrap();

        match conn.read_event() {
            Err(RecvError::Io(_)) => {}
            other => panic!("expected RecvError::Io, got {other:?}"),
        }
    }
}
