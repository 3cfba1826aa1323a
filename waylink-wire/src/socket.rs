//! Request encoding and event framing on top of a buffered [`Transport`].

use std::collections::VecDeque;
use std::ffi::CString;
use std::io::{self, IoSlice, IoSliceMut};
use std::num::NonZeroU32;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use crate::ring_buffer::RingBuffer;
use crate::transport::Transport;
use crate::{AnonymousEvent, ArgValue, Fixed, IoMode, MessageHeader, ObjectId};

pub const BYTES_OUT_LEN: usize = 4096;
pub const BYTES_IN_LEN: usize = BYTES_OUT_LEN * 2;
pub const FDS_OUT_LEN: usize = 28;
pub const FDS_IN_LEN: usize = FDS_OUT_LEN * 2;

/// A buffered Wayland socket.
///
/// Handles message framing, argument encoding and SCM_RIGHTS fd passing. Generic over
/// [`Transport`], which is usually [`UnixStream`](std::os::unix::net::UnixStream).
pub struct BufferedSocket<T> {
    socket: T,
    bytes_in: RingBuffer,
    bytes_out: RingBuffer,
    fds_in: VecDeque<OwnedFd>,
    fds_out: VecDeque<OwnedFd>,
    /// Scratch space the current event's argument bytes are copied into, so that
    /// `AnonymousEvent::arg_bytes` can be a plain contiguous slice regardless of where the
    /// message landed in the (possibly wrapped) ring buffer.
    current_event: Box<[u8]>,
}

/// An error that occurred while encoding and sending a request.
///
/// The arguments are handed back so the caller can decide whether to retry.
pub struct SendMessageError {
    pub object_id: ObjectId,
    pub opcode: u16,
    pub args: Vec<ArgValue>,
    pub err: io::Error,
}

/// An error that occurred while peeking the next message header.
#[derive(Debug, thiserror::Error)]
pub enum PeekHeaderError {
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("header has a null object id")]
    NullObject,
}

/// An error that occurred while receiving the body of an event.
#[derive(Debug, thiserror::Error)]
pub enum RecvEventError {
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("message is too large ({0} bytes)")]
    TooManyBytes(u16),
}

impl<T: Transport> AsRawFd for BufferedSocket<T> {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.pollable_fd()
    }
}

impl<T: Transport> From<T> for BufferedSocket<T> {
    fn from(socket: T) -> Self {
        Self {
            socket,
            bytes_in: RingBuffer::new(BYTES_IN_LEN),
            bytes_out: RingBuffer::new(BYTES_OUT_LEN),
            fds_in: VecDeque::new(),
            fds_out: VecDeque::new(),
            current_event: vec![0; BYTES_IN_LEN].into_boxed_slice(),
        }
    }
}

impl<T: Transport> BufferedSocket<T> {
    /// Encode and enqueue a single request. Flushes the outgoing buffer first if there
    /// isn't room.
    ///
    /// # Panics
    ///
    /// Panics if the encoded message would be larger than `BYTES_OUT_LEN` or carries more
    /// than `FDS_OUT_LEN` file descriptors: both are generous enough that hitting this is a
    /// sign something is wrong with the caller, not a size that should be handled gracefully.
    pub fn send_request(
        &mut self,
        object_id: ObjectId,
        opcode: u16,
        args: Vec<ArgValue>,
        mode: IoMode,
    ) -> Result<(), SendMessageError> {
        let size = MessageHeader::SIZE + args.iter().map(ArgValue::size).sum::<usize>();
        let fds_cnt = args.iter().filter(|a| matches!(a, ArgValue::Fd(_))).count();

        assert!(size <= BYTES_OUT_LEN, "message too large to encode");
        assert!(fds_cnt <= FDS_OUT_LEN, "too many fds in a single message");

        if size > self.bytes_out.writable_len() || fds_cnt + self.fds_out.len() > FDS_OUT_LEN {
            if let Err(err) = self.flush(mode) {
                return Err(SendMessageError { object_id, opcode, args, err });
            }
        }

        self.bytes_out.write_uint(object_id.0.get());
        self.bytes_out.write_uint((size as u32) << 16 | opcode as u32);

        for arg in args {
            match arg {
                ArgValue::Uint(x) => self.bytes_out.write_uint(x),
                ArgValue::Int(x) | ArgValue::Fixed(Fixed(x)) => self.bytes_out.write_int(x),
                ArgValue::Object(ObjectId(x))
                | ArgValue::OptObject(Some(ObjectId(x)))
                | ArgValue::NewId(ObjectId(x)) => self.bytes_out.write_uint(x.get()),
                ArgValue::OptObject(None) | ArgValue::OptString(None) => {
                    self.bytes_out.write_uint(0)
                }
                ArgValue::AnyNewId(iface, version, id) => {
                    self.send_array(iface.to_bytes_with_nul());
                    self.bytes_out.write_uint(version);
                    self.bytes_out.write_uint(id.0.get());
                }
                ArgValue::String(string) | ArgValue::OptString(Some(string)) => {
                    self.send_array(string.to_bytes_with_nul())
                }
                ArgValue::Array(array) => self.send_array(&array),
                ArgValue::Fd(fd) => self.fds_out.push_back(fd),
            }
        }

        Ok(())
    }

    /// Peek the next message header without consuming it.
    ///
    /// Fills the internal buffer if needed.
    pub fn peek_message_header(&mut self, mode: IoMode) -> Result<MessageHeader, PeekHeaderError> {
        while self.bytes_in.readable_len() < MessageHeader::SIZE {
            self.fill_incoming_buf(mode)?;
        }

        let mut raw = [0; MessageHeader::SIZE];
        self.bytes_in.peek_bytes(&mut raw);
        let object_id = u32::from_ne_bytes(raw[0..4].try_into().unwrap());
        let size_and_opcode = u32::from_ne_bytes(raw[4..8].try_into().unwrap());

        Ok(MessageHeader {
            object_id: ObjectId(NonZeroU32::new(object_id).ok_or(PeekHeaderError::NullObject)?),
            size: ((size_and_opcode & 0xFFFF_0000) >> 16) as u16,
            opcode: (size_and_opcode & 0x0000_FFFF) as u16,
        })
    }

    /// Consume the message described by `header` (which must come from the most recent
    /// call to [`Self::peek_message_header`]) and return it as an [`AnonymousEvent`].
    ///
    /// The returned event borrows from an internal scratch buffer that is overwritten by
    /// the next call to this function.
    pub fn recv_event(
        &mut self,
        header: MessageHeader,
        mode: IoMode,
    ) -> Result<AnonymousEvent<'_>, RecvEventError> {
        if header.size as usize > BYTES_IN_LEN {
            return Err(RecvEventError::TooManyBytes(header.size));
        }
        while header.size as usize > self.bytes_in.readable_len() {
            self.fill_incoming_buf(mode)?;
        }

        self.bytes_in.move_tail(MessageHeader::SIZE);
        let body_len = header.size as usize - MessageHeader::SIZE;
        self.bytes_in.read_bytes(&mut self.current_event[..body_len]);

        Ok(AnonymousEvent {
            self_id: header.object_id,
            opcode: header.opcode,
            arg_bytes: &self.current_event[..body_len],
            fds: &mut self.fds_in,
        })
    }

    /// Flush all pending requests.
    pub fn flush(&mut self, mode: IoMode) -> io::Result<()> {
        while !self.bytes_out.is_empty() {
            let mut iov_buf = [IoSlice::new(&[]), IoSlice::new(&[])];
            let iov = self.bytes_out.get_readable_iov(&mut iov_buf);

            let sent = self.socket.send(iov, self.fds_out.make_contiguous(), mode)?;

            self.bytes_out.move_tail(sent);
            self.fds_out.clear();
        }

        Ok(())
    }

    /// Get a reference to the underlying transport.
    pub fn transport(&self) -> &T {
        &self.socket
    }

    /// Get a mutable reference to the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.socket
    }

    fn fill_incoming_buf(&mut self, mode: IoMode) -> io::Result<()> {
        if self.bytes_in.is_full() {
            return Ok(());
        }

        let mut iov_buf = [IoSliceMut::new(&mut []), IoSliceMut::new(&mut [])];
        let iov = self.bytes_in.get_writeable_iov(&mut iov_buf);

        let read = self.socket.recv(iov, &mut self.fds_in, mode)?;
        self.bytes_in.move_head(read);

        Ok(())
    }

    fn send_array(&mut self, array: &[u8]) {
        let len = array.len() as u32;

        self.bytes_out.write_uint(len);
        self.bytes_out.write_bytes(array);

        let padding = ((4 - (len % 4)) % 4) as usize;
        self.bytes_out.write_bytes(&[0, 0, 0][..padding]);
    }
}

/// Build the `Vec<ArgValue>` for a nullable string argument, used by generated code.
pub fn opt_cstring(s: Option<impl Into<Vec<u8>>>) -> Option<CString> {
    s.map(|s| CString::new(s).expect("string argument contains an interior nul byte"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::os::unix::net::UnixStream;

    fn pair() -> (BufferedSocket<UnixStream>, UnixStream) {
        let (a, b) = UnixStream::pair().unwrap();
        (BufferedSocket::from(a), b)
    }

    // S4: a two-letter string argument pads to a 4-byte boundary and the header's
    // declared length matches exactly what went over the wire.
    #[test]
    fn string_arg_padding_is_byte_exact() {
        let (mut sock, mut raw) = pair();
        let id = ObjectId(NonZeroU32::new(5).unwrap());
        sock.send_request(
            id,
            3,
            vec![ArgValue::String(CString::new("Hi").unwrap())],
            IoMode::Blocking,
        )
        .unwrap();
        sock.flush(IoMode::Blocking).unwrap();

        use std::io::Read;
        let mut buf = [0u8; 16];
        let n = raw.read(&mut buf).unwrap();
        // header(8) + len(4) + "Hi\0" padded to 4 = 4 -> total 16
        assert_eq!(n, 16);
        assert_eq!(&buf[0..4], &5u32.to_ne_bytes());
        let size_and_opcode = u32::from_ne_bytes(buf[4..8].try_into().unwrap());
        assert_eq!(size_and_opcode >> 16, 16);
        assert_eq!(size_and_opcode & 0xFFFF, 3);
        assert_eq!(&buf[8..12], &3u32.to_ne_bytes()); // string length incl. nul
        assert_eq!(&buf[12..16], b"Hi\0\0");
    }

    // S5: a null string argument is encoded as a single zero word (length 0, no payload).
    #[test]
    fn null_string_is_one_word() {
        let (mut sock, mut raw) = pair();
        let id = ObjectId(NonZeroU32::new(7).unwrap());
        sock.send_request(id, 0, vec![ArgValue::OptString(None)], IoMode::Blocking)
            .unwrap();
        sock.flush(IoMode::Blocking).unwrap();

        use std::io::Read;
        let mut buf = [0u8; 12];
        let n = raw.read(&mut buf).unwrap();
        assert_eq!(n, 12);
        assert_eq!(&buf[8..12], &0u32.to_ne_bytes());
    }

    #[test]
    fn round_trip_header_and_args() {
        let (mut client, mut server_raw) = pair();
        let server_id = ObjectId(NonZeroU32::new(1).unwrap());
        client
            .send_request(
                server_id,
                1,
                vec![ArgValue::Uint(42), ArgValue::Int(-7)],
                IoMode::Blocking,
            )
            .unwrap();
        client.flush(IoMode::Blocking).unwrap();

        // Echo the bytes back so the same BufferedSocket can decode what it sent.
        use std::io::{Read, Write};
        let mut buf = [0u8; 32];
        let n = server_raw.read(&mut buf).unwrap();
        server_raw.write_all(&buf[..n]).unwrap();

        let header = client.peek_message_header(IoMode::Blocking).unwrap();
        assert_eq!(header.object_id, server_id);
        assert_eq!(header.opcode, 1);
        let event = client.recv_event(header, IoMode::Blocking).unwrap();
        let mut reader = event.reader();
        assert_eq!(reader.read_uint().unwrap(), 42);
        assert_eq!(reader.read_int().unwrap(), -7);
    }

    // S3: an fd argument crosses as SCM_RIGHTS ancillary data, not as payload bytes,
    // and the receiver gets a distinct (dup'd) but equally valid descriptor.
    #[test]
    fn fd_arg_travels_as_ancillary_data() {
        use std::fs::File;
        use std::os::fd::{AsRawFd, OwnedFd};

        let (mut client, mut server_raw) = pair();
        let id = ObjectId(NonZeroU32::new(1).unwrap());
        let sent_fd: OwnedFd = File::open("/dev/null").unwrap().into();
        let sent_raw = sent_fd.as_raw_fd();

        client.send_request(id, 0, vec![ArgValue::Fd(sent_fd)], IoMode::Blocking).unwrap();
        client.flush(IoMode::Blocking).unwrap();

        use std::io::{Read, Write};
        let mut buf = [0u8; 16];
        let n = server_raw.read(&mut buf).unwrap();
        server_raw.write_all(&buf[..n]).unwrap();
        // the fd carried no payload bytes: header only, no argument words.
        assert_eq!(n, MessageHeader::SIZE);

        let header = client.peek_message_header(IoMode::Blocking).unwrap();
        let event = client.recv_event(header, IoMode::Blocking).unwrap();
        assert_eq!(event.arg_bytes.len(), 0);
        let received = event.fds.pop_front().expect("fd should have arrived via ancillary data");
        assert_ne!(received.as_raw_fd(), sent_raw, "receiver must get a dup'd descriptor");
    }

    // fds are delivered in the order their ArgValue::Fd appeared in the request.
    #[test]
    fn fds_arrive_in_argument_order() {
        use std::fs::File;
        use std::os::fd::{AsRawFd, OwnedFd};

        let (mut client, mut server_raw) = pair();
        let id = ObjectId(NonZeroU32::new(1).unwrap());
        let first: OwnedFd = File::open("/dev/null").unwrap().into();
        let second: OwnedFd = File::open("/dev/zero").unwrap().into();

        client
            .send_request(id, 0, vec![ArgValue::Fd(first), ArgValue::Fd(second)], IoMode::Blocking)
            .unwrap();
        client.flush(IoMode::Blocking).unwrap();

        use std::io::{Read, Write};
        let mut buf = [0u8; 16];
        let n = server_raw.read(&mut buf).unwrap();
        server_raw.write_all(&buf[..n]).unwrap();

        let header = client.peek_message_header(IoMode::Blocking).unwrap();
        let event = client.recv_event(header, IoMode::Blocking).unwrap();
        let fd_a = event.fds.pop_front().unwrap();
        let fd_b = event.fds.pop_front().unwrap();
        assert_ne!(fd_a.as_raw_fd(), fd_b.as_raw_fd());
        assert!(event.fds.is_empty());
    }
}
