//! End-to-end tests against a hand-scripted fake compositor on a `UnixStream::pair`.

use std::io::Write;
use std::os::unix::net::UnixStream;
use std::thread;

use waylink_client::protocol::wl_registry;
use waylink_client::Connection;

fn encode_header(object_id: u32, opcode: u16, size: u16) -> [u8; 8] {
    let mut buf = [0u8; 8];
    buf[0..4].copy_from_slice(&object_id.to_ne_bytes());
    let size_and_opcode = (size as u32) << 16 | opcode as u32;
    buf[4..8].copy_from_slice(&size_and_opcode.to_ne_bytes());
    buf
}

// S1: wl_display.sync is answered with wl_callback.done and nothing else; roundtrip()
// returns without the caller ever seeing that event directly.
#[test]
fn sync_round_trip() {
    let (client_sock, mut server_sock) = UnixStream::pair().unwrap();
    let mut conn = Connection::from_stream(client_sock);

    let server = thread::spawn(move || {
        // First request from the client is wl_display.sync, allocating object id 2.
        let mut event = encode_header(2, 0, 12).to_vec(); // wl_callback.done(data: uint)
        event.extend_from_slice(&0u32.to_ne_bytes());
        server_sock.write_all(&event).unwrap();
    });

    let mut saw_unexpected = false;
    conn.roundtrip(|_event| saw_unexpected = true).unwrap();
    assert!(!saw_unexpected);

    server.join().unwrap();
}

// S2: wl_registry.global events are decoded and, once wl_registry.global_remove arrives
// for the same name, the consumer can tell the global is gone.
#[test]
fn registry_enumeration() {
    let (client_sock, mut server_sock) = UnixStream::pair().unwrap();
    let mut conn = Connection::from_stream(client_sock);

    let registry = conn.display().get_registry(&mut conn).unwrap();
    assert_eq!(registry.id().as_u32(), 2);
    conn.flush().unwrap();

    let server = thread::spawn(move || {
        let iface = b"wl_compositor\0";
        let iface_padded_len = iface.len().next_multiple_of(4);
        let body_len = 4 + 4 + iface_padded_len + 4; // name, str-len, str+pad, version
        let mut msg = encode_header(registry.id().as_u32(), 0, (8 + body_len) as u16).to_vec();
        msg.extend_from_slice(&1u32.to_ne_bytes()); // name
        msg.extend_from_slice(&(iface.len() as u32).to_ne_bytes());
        msg.extend_from_slice(iface);
        msg.resize(msg.len() + (iface_padded_len - iface.len()), 0);
        msg.extend_from_slice(&4u32.to_ne_bytes()); // version
        server_sock.write_all(&msg).unwrap();

        let remove = encode_header(registry.id().as_u32(), 1, 12);
        let mut remove_msg = remove.to_vec();
        remove_msg.extend_from_slice(&1u32.to_ne_bytes());
        server_sock.write_all(&remove_msg).unwrap();
    });

    let mut seen_global = None;
    let mut removed = false;
    for _ in 0..2 {
        let mut event = conn.read_event().unwrap();
        assert_eq!(event.self_id, registry.id());
        match wl_registry::decode_event(&mut event).unwrap() {
            wl_registry::Event::Global { name, interface, version } => {
                seen_global = Some((name, interface.to_string_lossy().into_owned(), version));
            }
            wl_registry::Event::GlobalRemove { name } => {
                assert_eq!(Some(name), seen_global.as_ref().map(|g| g.0));
                removed = true;
            }
        }
    }

    assert_eq!(seen_global, Some((1, "wl_compositor".to_string(), 4)));
    assert!(removed);

    server.join().unwrap();
}
