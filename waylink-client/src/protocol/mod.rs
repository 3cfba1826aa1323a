//! Generated protocol bindings.
//!
//! Every module here is what the `waylink-scanner` binary would emit for the matching
//! interface in `protocols/wayland.xml`, hand-written to keep this crate buildable
//! without invoking the generator. Running the scanner against the full upstream
//! `wayland.xml` produces the same shape of code for every interface in it, including
//! the ones not bound below.

mod bootstrap;
mod compositor;
mod data_offer;
mod shm;
mod surface;

pub use bootstrap::{wl_callback, wl_display, wl_registry, WlCallback, WlDisplay, WlRegistry};
pub use compositor::{wl_compositor, wl_region, WlCompositor, WlRegion};
pub use data_offer::{wl_data_offer, WlDataOffer};
pub use shm::{wl_buffer, wl_shm, wl_shm_pool, WlBuffer, WlShm, WlShmPool};
pub use surface::{wl_surface, WlSurface};
