//! JSON outbound dialects (NekoRay, Husi, Karing)
//!
//! Field order in the structs is the order the clients' own exporters
//! write, so diffs against hand-made profiles stay readable.

use super::{CompileError, MTU};
use crate::descriptor::SessionDescriptor;
use crate::format::FormatId;
use serde::Serialize;

const FALLBACK_SERVER: &str = "engage.cloudflareclient.com";

/// NekoRay / Exclave flat outbound
#[derive(Debug, Serialize)]
struct NekorayOutbound<'a> {
    mtu: u16,
    reserved: Vec<u8>,
    private_key: String,
    #[serde(rename = "type")]
    kind: &'static str,
    local_address: [String; 2],
    peer_public_key: &'a str,
    server: &'a str,
    server_port: u16,
}

/// Husi outbound with a nested peer list
#[derive(Debug, Serialize)]
struct HusiOutbound<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    tag: &'static str,
    mtu: u16,
    address: [String; 2],
    private_key: String,
    listen_port: u16,
    peers: Vec<HusiPeer<'a>>,
    detour: &'static str,
}

#[derive(Debug, Serialize)]
struct HusiPeer<'a> {
    address: &'a str,
    port: u16,
    public_key: &'a str,
    pre_shared_key: &'static str,
    allowed_ips: &'a [String],
    persistent_keepalive_interval: u32,
    reserved: Vec<u8>,
}

/// Karing / Hiddify document
#[derive(Debug, Serialize)]
struct KaringConfig<'a> {
    outbounds: Vec<KaringOutbound<'a>>,
}

#[derive(Debug, Serialize)]
struct KaringOutbound<'a> {
    tag: &'static str,
    reserved: Vec<u8>,
    mtu: u16,
    fake_packets: &'static str,
    fake_packets_size: &'static str,
    fake_packets_delay: &'static str,
    fake_packets_mode: &'static str,
    private_key: String,
    #[serde(rename = "type")]
    kind: &'static str,
    local_address: [String; 2],
    peer_public_key: &'a str,
    server: &'a str,
    server_port: u16,
}

pub(super) fn render_nekoray(d: &SessionDescriptor) -> Result<String, CompileError> {
    let outbound = NekorayOutbound {
        mtu: MTU,
        reserved: d.reserved.values_or_zero(),
        private_key: d.private_key(),
        kind: "wireguard",
        local_address: d.local_addresses(),
        peer_public_key: &d.peer_public_key,
        server: &d.endpoint.host,
        server_port: d.endpoint.port,
    };
    encode(FormatId::Nekoray, &outbound)
}

pub(super) fn render_husi(d: &SessionDescriptor) -> Result<String, CompileError> {
    let outbound = HusiOutbound {
        kind: "wireguard",
        tag: "proxy",
        mtu: MTU,
        address: d.local_addresses(),
        private_key: d.private_key(),
        listen_port: 0,
        peers: vec![HusiPeer {
            address: &d.endpoint.host,
            port: d.endpoint.port,
            public_key: &d.peer_public_key,
            pre_shared_key: "",
            allowed_ips: d.allowed_routes.as_slice(),
            persistent_keepalive_interval: 600,
            reserved: d.reserved.values_or_zero(),
        }],
        detour: "direct",
    };
    encode(FormatId::Husi, &outbound)
}

pub(super) fn render_karing(d: &SessionDescriptor) -> Result<String, CompileError> {
    let server = if d.endpoint.host.is_empty() {
        FALLBACK_SERVER
    } else {
        d.endpoint.host.as_str()
    };

    let config = KaringConfig {
        outbounds: vec![KaringOutbound {
            tag: "WARP",
            reserved: d.reserved.values_or_zero(),
            mtu: MTU,
            fake_packets: "5-10",
            fake_packets_size: "40-100",
            fake_packets_delay: "20-250",
            fake_packets_mode: "m4",
            private_key: d.private_key(),
            kind: "wireguard",
            local_address: d.local_addresses(),
            peer_public_key: &d.peer_public_key,
            server,
            server_port: d.endpoint.port,
        }],
    };
    encode(FormatId::Karing, &config)
}

fn encode<T: Serialize>(format: FormatId, value: &T) -> Result<String, CompileError> {
    serde_json::to_string_pretty(value).map_err(|source| CompileError::Encode { format, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::fixtures::{PEER_KEY, descriptor};
    use crate::descriptor::ReservedBytes;
    use crate::profile::DeviceProfile;
    use crate::routes::{RouteCatalog, SiteMode};
    use serde_json::{Value, json};

    fn parse(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_nekoray_layout() {
        let mut d = descriptor(FormatId::Nekoray, DeviceProfile::Standard);
        d.reserved = ReservedBytes::from(vec![4, 5, 6]);
        let text = render_nekoray(&d).unwrap();

        assert!(text.starts_with("{\n  \"mtu\": 1280,\n  \"reserved\": [\n    4,"));
        assert_eq!(
            parse(&text),
            json!({
                "mtu": 1280,
                "reserved": [4, 5, 6],
                "private_key": d.private_key(),
                "type": "wireguard",
                "local_address": [
                    "172.16.0.2/32",
                    "2606:4700:110:8a36:df92:102a:9602:fa18/128"
                ],
                "peer_public_key": PEER_KEY,
                "server": "example.com",
                "server_port": 500
            })
        );
    }

    #[test]
    fn test_husi_peers() {
        let mut d = descriptor(FormatId::Husi, DeviceProfile::Standard);
        d.allowed_routes = RouteCatalog::builtin().resolve(&["animego"], SiteMode::Specific);
        let value = parse(&render_husi(&d).unwrap());

        assert_eq!(value["type"], "wireguard");
        assert_eq!(value["tag"], "proxy");
        assert_eq!(value["mtu"], 1280);
        assert_eq!(value["listen_port"], 0);
        assert_eq!(value["detour"], "direct");

        let peer = &value["peers"][0];
        assert_eq!(peer["address"], "example.com");
        assert_eq!(peer["port"], 500);
        assert_eq!(peer["public_key"], PEER_KEY);
        assert_eq!(peer["pre_shared_key"], "");
        assert_eq!(peer["allowed_ips"], json!(["185.178.208.0/22", "49.13.80.0/20"]));
        assert_eq!(peer["persistent_keepalive_interval"], 600);
        assert_eq!(peer["reserved"], json!([0, 0, 0]));
    }

    #[test]
    fn test_karing_outbound() {
        let d = descriptor(FormatId::Karing, DeviceProfile::Alternate);
        let value = parse(&render_karing(&d).unwrap());
        let outbound = &value["outbounds"][0];

        assert_eq!(value["outbounds"].as_array().map(Vec::len), Some(1));
        assert_eq!(outbound["tag"], "WARP");
        assert_eq!(outbound["fake_packets"], "5-10");
        assert_eq!(outbound["fake_packets_size"], "40-100");
        assert_eq!(outbound["fake_packets_delay"], "20-250");
        assert_eq!(outbound["fake_packets_mode"], "m4");
        assert_eq!(outbound["mtu"], 1280);
        assert_eq!(outbound["server"], "example.com");
        assert_eq!(outbound["server_port"], 500);
        assert_eq!(outbound["reserved"], json!([0, 0, 0]));
    }

    #[test]
    fn test_karing_fallback_server() {
        let mut d = descriptor(FormatId::Karing, DeviceProfile::Standard);
        d.endpoint.host = String::new();
        let value = parse(&render_karing(&d).unwrap());

        assert_eq!(value["outbounds"][0]["server"], FALLBACK_SERVER);
    }
}
