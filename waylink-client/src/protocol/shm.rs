//! `wl_shm`, `wl_shm_pool` and `wl_buffer`.

pub mod wl_shm {
    use std::os::fd::OwnedFd;

    use waylink_wire::{AnonymousEvent, ArgValue, DecodeError, ObjectId};

    use crate::connection::Connection;
    use crate::object::{RequestError, WlProxy};
    use crate::protocol::wl_shm_pool::WlShmPool;

    /// `wl_shm.format` - pixel formats a pool's buffers may use.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(u32)]
    pub enum Format {
        Argb8888 = 0,
        Xrgb8888 = 1,
        Rgb565 = 0x36314752,
    }

    impl Format {
        pub fn from_wire(v: u32) -> Option<Self> {
            match v {
                0 => Some(Self::Argb8888),
                1 => Some(Self::Xrgb8888),
                0x36314752 => Some(Self::Rgb565),
                _ => None,
            }
        }
    }

    /// `wl_shm.error`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(u32)]
    pub enum Error {
        InvalidFormat = 0,
        InvalidStride = 1,
        InvalidFd = 2,
    }

    /// `wl_shm` - the shared memory pool factory.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WlShm {
        id: ObjectId,
        version: u32,
    }

    impl WlProxy for WlShm {
        const INTERFACE: &'static str = "wl_shm";
        fn id(&self) -> ObjectId {
            self.id
        }
        fn version(&self) -> u32 {
            self.version
        }
    }

    impl WlShm {
        pub fn from_id(id: ObjectId, version: u32) -> Self {
            Self { id, version }
        }

        /// Request 0: wrap `fd`, a POSIX shared memory file of `size` bytes, in a pool.
        pub fn create_pool(
            &self,
            conn: &mut Connection,
            fd: OwnedFd,
            size: i32,
        ) -> Result<WlShmPool, RequestError> {
            let new_id = conn.next_object_id();
            crate::debug::log_request(
                Self::INTERFACE,
                self.id,
                "create_pool",
                format_args!("new id {}, fd, {size}", new_id.as_u32()),
            );
            conn.send_request(
                self.id,
                0,
                vec![ArgValue::NewId(new_id), ArgValue::Fd(fd), ArgValue::Int(size)],
            )?;
            Ok(WlShmPool::from_id(new_id, self.version))
        }
    }

    /// An event sent by `wl_shm`.
    #[derive(Debug, Clone, Copy)]
    pub enum Event {
        /// Event 0: `format` is supported by this compositor's shm implementation.
        Format { format: u32 },
    }

    pub fn decode_event(ev: &mut AnonymousEvent<'_>) -> Result<Event, DecodeError> {
        let mut r = ev.reader();
        match ev.opcode {
            0 => Ok(Event::Format { format: r.read_uint()? }),
            other => panic!("wl_shm has no event with opcode {other}"),
        }
    }
}

pub mod wl_shm_pool {
    use waylink_wire::{ArgValue, ObjectId};

    use crate::connection::Connection;
    use crate::object::{RequestError, WlProxy};
    use crate::protocol::wl_buffer::WlBuffer;
    use crate::protocol::wl_shm::Format;

    /// `wl_shm_pool` - a pool of shared memory backing zero or more buffers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WlShmPool {
        id: ObjectId,
        version: u32,
    }

    impl WlProxy for WlShmPool {
        const INTERFACE: &'static str = "wl_shm_pool";
        fn id(&self) -> ObjectId {
            self.id
        }
        fn version(&self) -> u32 {
            self.version
        }
    }

    impl WlShmPool {
        pub fn from_id(id: ObjectId, version: u32) -> Self {
            Self { id, version }
        }

        /// Request 0.
        #[allow(clippy::too_many_arguments)]
        pub fn create_buffer(
            &self,
            conn: &mut Connection,
            offset: i32,
            width: i32,
            height: i32,
            stride: i32,
            format: Format,
        ) -> Result<WlBuffer, RequestError> {
            let new_id = conn.next_object_id();
            crate::debug::log_request(
                Self::INTERFACE,
                self.id,
                "create_buffer",
                format_args!("new id {}, {offset}, {width}, {height}, {stride}, {format:?}", new_id.as_u32()),
            );
            conn.send_request(
                self.id,
                0,
                vec![
                    ArgValue::NewId(new_id),
                    ArgValue::Int(offset),
                    ArgValue::Int(width),
                    ArgValue::Int(height),
                    ArgValue::Int(stride),
                    ArgValue::Uint(format as u32),
                ],
            )?;
            Ok(WlBuffer::from_id(new_id, self.version))
        }

        /// Request 1 (destructor).
        pub fn destroy(&self, conn: &mut Connection) -> Result<(), RequestError> {
            crate::debug::log_request(Self::INTERFACE, self.id, "destroy", format_args!(""));
            conn.send_request(self.id, 1, vec![])?;
            Ok(())
        }

        /// Request 2: grow the pool to `size` bytes. Shrinking is not allowed by the
        /// protocol and is not checked here; the compositor will raise a protocol error.
        pub fn resize(&self, conn: &mut Connection, size: i32) -> Result<(), RequestError> {
            crate::debug::log_request(Self::INTERFACE, self.id, "resize", format_args!("{size}"));
            conn.send_request(self.id, 2, vec![ArgValue::Int(size)])?;
            Ok(())
        }
    }

    #[derive(Debug, Clone, Copy)]
    pub enum Event {}
}

pub mod wl_buffer {
    use waylink_wire::{AnonymousEvent, DecodeError, ObjectId};

    use crate::connection::Connection;
    use crate::object::{RequestError, WlProxy};

    /// `wl_buffer` - a handle to pixel data backed by a `wl_shm_pool` region (or any
    /// other buffer-producing protocol, though only the `wl_shm` path is bound here).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WlBuffer {
        id: ObjectId,
        version: u32,
    }

    impl WlProxy for WlBuffer {
        const INTERFACE: &'static str = "wl_buffer";
        fn id(&self) -> ObjectId {
            self.id
        }
        fn version(&self) -> u32 {
            self.version
        }
    }

    impl WlBuffer {
        pub fn from_id(id: ObjectId, version: u32) -> Self {
            Self { id, version }
        }

        /// Request 0 (destructor).
        pub fn destroy(&self, conn: &mut Connection) -> Result<(), RequestError> {
            crate::debug::log_request(Self::INTERFACE, self.id, "destroy", format_args!(""));
            conn.send_request(self.id, 0, vec![])?;
            Ok(())
        }
    }

    /// An event sent by `wl_buffer`.
    #[derive(Debug, Clone, Copy)]
    pub enum Event {
        /// Event 0: the compositor is done reading from this buffer's memory.
        Release,
    }

    pub fn decode_event(ev: &mut AnonymousEvent<'_>) -> Result<Event, DecodeError> {
        match ev.opcode {
            0 => Ok(Event::Release),
            other => panic!("wl_buffer has no event with opcode {other}"),
        }
    }
}

pub use wl_buffer::WlBuffer;
pub use wl_shm::WlShm;
pub use wl_shm_pool::WlShmPool;
