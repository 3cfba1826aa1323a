//! `wl_compositor` and `wl_region`.

pub mod wl_compositor {
    use waylink_wire::{ArgValue, ObjectId};

    use crate::connection::Connection;
    use crate::object::{RequestError, WlProxy};
    use crate::protocol::wl_region::WlRegion;
    use crate::protocol::wl_surface::WlSurface;

    /// `wl_compositor` - the factory for surfaces and regions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WlCompositor {
        id: ObjectId,
        version: u32,
    }

    impl WlProxy for WlCompositor {
        const INTERFACE: &'static str = "wl_compositor";
        fn id(&self) -> ObjectId {
            self.id
        }
        fn version(&self) -> u32 {
            self.version
        }
    }

    impl WlCompositor {
        pub fn from_id(id: ObjectId, version: u32) -> Self {
            Self { id, version }
        }

        /// Request 0.
        pub fn create_surface(&self, conn: &mut Connection) -> Result<WlSurface, RequestError> {
            let new_id = conn.next_object_id();
            crate::debug::log_request(
                Self::INTERFACE,
                self.id,
                "create_surface",
                format_args!("new id {}", new_id.as_u32()),
            );
            conn.send_request(self.id, 0, vec![ArgValue::NewId(new_id)])?;
            Ok(WlSurface::from_id(new_id, self.version))
        }

        /// Request 1.
        pub fn create_region(&self, conn: &mut Connection) -> Result<WlRegion, RequestError> {
            let new_id = conn.next_object_id();
            crate::debug::log_request(
                Self::INTERFACE,
                self.id,
                "create_region",
                format_args!("new id {}", new_id.as_u32()),
            );
            conn.send_request(self.id, 1, vec![ArgValue::NewId(new_id)])?;
            Ok(WlRegion::from_id(new_id, self.version))
        }
    }

    /// `wl_compositor` has no events.
    #[derive(Debug, Clone, Copy)]
    pub enum Event {}
}

pub mod wl_region {
    use waylink_wire::ObjectId;

    use crate::connection::Connection;
    use crate::object::{RequestError, WlProxy};

    /// `wl_region` - an opaque/input region built up from rectangles.
    ///
    /// Only `destroy` is implemented here; `add`/`subtract` would be the next two
    /// opcodes but no shipped scenario needs them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WlRegion {
        id: ObjectId,
        version: u32,
    }

    impl WlProxy for WlRegion {
        const INTERFACE: &'static str = "wl_region";
        fn id(&self) -> ObjectId {
            self.id
        }
        fn version(&self) -> u32 {
            self.version
        }
    }

    impl WlRegion {
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

    #[derive(Debug, Clone, Copy)]
    pub enum Event {}
}

pub use wl_compositor::WlCompositor;
pub use wl_region::WlRegion;
