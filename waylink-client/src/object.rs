//! Client side object representation

pub use waylink_wire::ObjectId;

/// A typed handle to a Wayland object bound on the client side.
///
/// Every generated interface type (`WlSurface`, `WlCompositor`, ...) implements this
/// trait. Unlike a central object table, the bound version lives directly on the value:
/// request methods compare against `self.version()` to enforce `since` gating, so no
/// connection-wide bookkeeping of per-id versions is needed.
pub trait WlProxy: Copy {
    /// The wire name of the interface, e.g. `"wl_surface"`.
    const INTERFACE: &'static str;

    fn id(&self) -> ObjectId;
    fn version(&self) -> u32;
}

/// A request was attempted on an object whose bound version doesn't support it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{interface}@{} is bound at version {bound}, but this request requires version {required}", id.as_u32())]
pub struct VersionError {
    pub interface: &'static str,
    pub id: ObjectId,
    pub bound: u32,
    pub required: u32,
}

/// Everything a generated request method can fail with: a version that's too low, or an
/// IO error flushing the outgoing buffer.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error(transparent)]
    Version(#[from] VersionError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Check `bound >= required`, returning [`VersionError`] otherwise.
///
/// Generated request methods call this before encoding any bytes, so a version mismatch
/// never produces a partially sent message.
pub fn check_since<P: WlProxy>(proxy: &P, required: u32) -> Result<(), VersionError> {
    if proxy.version() >= required {
        Ok(())
    } else {
        Err(VersionError {
            interface: P::INTERFACE,
            id: proxy.id(),
            bound: proxy.version(),
            required,
        })
    }
}
