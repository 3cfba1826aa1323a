//! Connects to the compositor and prints every advertised global.

use waylink_client::protocol::wl_registry;
use waylink_client::Connection;

fn main() {
    let mut conn = Connection::connect().expect("failed to connect to a Wayland compositor");
    let registry = conn.display().get_registry(&mut conn).unwrap();

    let mut globals = Vec::new();
    conn.roundtrip(|mut event| {
        if event.self_id == registry.id() {
            if let Ok(wl_registry::Event::Global { name, interface, version }) =
                wl_registry::decode_event(&mut event)
            {
                globals.push((name, interface.to_string_lossy().into_owned(), version));
            }
        }
    })
    .expect("roundtrip failed");

    for (name, interface, version) in globals {
        println!("{name}: {interface} v{version}");
    }
}
