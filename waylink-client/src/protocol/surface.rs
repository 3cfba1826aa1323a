//! `wl_surface`.

pub mod wl_surface {
    use waylink_wire::{ArgValue, ObjectId};

    use crate::connection::Connection;
    use crate::object::{RequestError, WlProxy};
    use crate::protocol::wl_buffer::WlBuffer;
    use crate::protocol::wl_callback::WlCallback;
    use crate::protocol::wl_region::WlRegion;

    /// `wl_surface` - a rectangle of pixels that can be attached a buffer and composited.
    ///
    /// Opcodes 0-6 are implemented here, matching their order in the upstream core
    /// protocol; `enter`/`leave` events (which need `wl_output`) are not bound.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WlSurface {
        id: ObjectId,
        version: u32,
    }

    impl WlProxy for WlSurface {
        const INTERFACE: &'static str = "wl_surface";
        fn id(&self) -> ObjectId {
            self.id
        }
        fn version(&self) -> u32 {
            self.version
        }
    }

    impl WlSurface {
        pub fn from_id(id: ObjectId, version: u32) -> Self {
            Self { id, version }
        }

        /// Request 0 (destructor).
        pub fn destroy(&self, conn: &mut Connection) -> Result<(), RequestError> {
            crate::debug::log_request(Self::INTERFACE, self.id, "destroy", format_args!(""));
            conn.send_request(self.id, 0, vec![])?;
            Ok(())
        }

        /// Request 1: attach `buffer` (or detach, if `None`) at surface-local offset
        /// `(x, y)`. Takes effect on the next `commit`.
        pub fn attach(
            &self,
            conn: &mut Connection,
            buffer: Option<WlBuffer>,
            x: i32,
            y: i32,
        ) -> Result<(), RequestError> {
            crate::debug::log_request(
                Self::INTERFACE,
                self.id,
                "attach",
                format_args!("{buffer:?}, {x}, {y}"),
            );
            conn.send_request(
                self.id,
                1,
                vec![ArgValue::OptObject(buffer.map(|b| b.id())), ArgValue::Int(x), ArgValue::Int(y)],
            )?;
            Ok(())
        }

        /// Request 2: mark a region of the pending buffer as damaged.
        pub fn damage(
            &self,
            conn: &mut Connection,
            x: i32,
            y: i32,
            width: i32,
            height: i32,
        ) -> Result<(), RequestError> {
            crate::debug::log_request(
                Self::INTERFACE,
                self.id,
                "damage",
                format_args!("{x}, {y}, {width}, {height}"),
            );
            conn.send_request(
                self.id,
                2,
                vec![ArgValue::Int(x), ArgValue::Int(y), ArgValue::Int(width), ArgValue::Int(height)],
            )?;
            Ok(())
        }

        /// Request 3: request a `wl_callback.done` the next time this surface would
        /// benefit from a new frame (roughly: after the next vblank it is shown in).
        pub fn frame(&self, conn: &mut Connection) -> Result<WlCallback, RequestError> {
            let new_id = conn.next_object_id();
            crate::debug::log_request(
                Self::INTERFACE,
                self.id,
                "frame",
                format_args!("new id {}", new_id.as_u32()),
            );
            conn.send_request(self.id, 3, vec![ArgValue::NewId(new_id)])?;
            Ok(WlCallback::from_id(new_id, 1))
        }

        /// Request 4: set the region that is considered opaque, for compositor
        /// optimization purposes. `None` means the whole surface is opaque.
        pub fn set_opaque_region(
            &self,
            conn: &mut Connection,
            region: Option<WlRegion>,
        ) -> Result<(), RequestError> {
            crate::debug::log_request(
                Self::INTERFACE,
                self.id,
                "set_opaque_region",
                format_args!("{region:?}"),
            );
            conn.send_request(self.id, 4, vec![ArgValue::OptObject(region.map(|r| r.id()))])?;
            Ok(())
        }

        /// Request 5: set the region that accepts pointer/touch input. `None` means the
        /// whole surface accepts input.
        pub fn set_input_region(
            &self,
            conn: &mut Connection,
            region: Option<WlRegion>,
        ) -> Result<(), RequestError> {
            crate::debug::log_request(
                Self::INTERFACE,
                self.id,
                "set_input_region",
                format_args!("{region:?}"),
            );
            conn.send_request(self.id, 5, vec![ArgValue::OptObject(region.map(|r| r.id()))])?;
            Ok(())
        }

        /// Request 6: atomically apply all pending state (attach, damage, opaque/input
        /// region, ...) set since the last commit.
        pub fn commit(&self, conn: &mut Connection) -> Result<(), RequestError> {
            crate::debug::log_request(Self::INTERFACE, self.id, "commit", format_args!(""));
            conn.send_request(self.id, 6, vec![])?;
            Ok(())
        }
    }

    /// Not bound: `enter`/`leave` need `wl_output`, which this crate doesn't expose.
    #[derive(Debug, Clone, Copy)]
    pub enum Event {}
}

pub use wl_surface::WlSurface;
