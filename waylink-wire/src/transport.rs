//! Wayland transport methods

use std::collections::VecDeque;
use std::io::{self, IoSlice, IoSliceMut};
use std::os::fd::{OwnedFd, RawFd};

use crate::IoMode;

pub mod unix;

/// An abstraction over Wayland transport methods.
///
/// [`std::os::unix::net::UnixStream`] is the only implementation shipped here, matching
/// the one transport the core protocol actually requires, but anything that can carry
/// bytes plus out-of-band file descriptors (e.g. a `tokio` socket wrapper) can implement
/// this trait and plug into [`BufferedSocket`](crate::BufferedSocket).
pub trait Transport {
    fn pollable_fd(&self) -> RawFd;

    fn send(&mut self, bytes: &[IoSlice], fds: &[OwnedFd], mode: IoMode) -> io::Result<usize>;

    fn recv(
        &mut self,
        bytes: &mut [IoSliceMut],
        fds: &mut VecDeque<OwnedFd>,
        mode: IoMode,
    ) -> io::Result<usize>;
}
