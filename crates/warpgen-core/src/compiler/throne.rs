//! Throne `wg://` URL dialect
//!
//! Throne reads the query string positionally and expects base64 values
//! unescaped, except for the trailing padding which must arrive as `%3D`.

use super::MTU;
use crate::descriptor::SessionDescriptor;

/// Peer key Throne pins regardless of the upstream registration
pub const THRONE_PEER_PUBLIC_KEY: &str = "bmXOC+F1FxEMF9dyiK2H5/1SUtzH0JuVo51h2wPfgyo=";

pub(super) fn render(d: &SessionDescriptor) -> String {
    let ob = d.device_profile.obfuscation();
    let [h1, h2, h3, h4] = ob.headers;
    let [v4, v6] = d.local_addresses();

    let params: [(&str, String); 19] = [
        ("private_key", padded_key(&d.private_key())),
        ("peer_public_key", padded_key(THRONE_PEER_PUBLIC_KEY)),
        ("pre_shared_key", String::new()),
        ("reserved", d.reserved.join("-")),
        ("persistent_keepalive", "0".into()),
        ("mtu", MTU.to_string()),
        ("use_system_interface", "false".into()),
        ("local_address", format!("{}-{}", v4, v6)),
        ("workers", "0".into()),
        ("enable_amnezia", "true".into()),
        ("junk_packet_count", ob.jc.to_string()),
        ("junk_packet_min_size", ob.jmin.to_string()),
        ("junk_packet_max_size", ob.jmax.to_string()),
        ("init_packet_junk_size", ob.s1.to_string()),
        ("response_packet_junk_size", ob.s2.to_string()),
        ("init_packet_magic_header", h1.to_string()),
        ("response_packet_magic_header", h2.to_string()),
        ("underload_packet_magic_header", h3.to_string()),
        ("transport_packet_magic_header", h4.to_string()),
    ];

    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    format!("wg://{}?{}#WARP", d.endpoint, query)
}

/// Drop one trailing `=` and re-append it percent-encoded
fn padded_key(key: &str) -> String {
    format!("{}%3D", key.strip_suffix('=').unwrap_or(key))
}
