//! AmneziaWG / WireGuard `.conf` dialect

use super::{DNS_SERVERS, MTU};
use crate::descriptor::SessionDescriptor;

pub(super) fn render(d: &SessionDescriptor) -> String {
    format!("{}\n\n{}", interface_section(d), peer_section(d))
}

fn interface_section(d: &SessionDescriptor) -> String {
    let ob = d.device_profile.obfuscation();
    let [h1, h2, h3, h4] = ob.headers;

    let mut lines = vec![
        "[Interface]".to_string(),
        format!("PrivateKey = {}", d.private_key()),
        format!("Address = {}, {}", d.client_ipv4, d.client_ipv6),
        format!("DNS = {}", DNS_SERVERS.join(", ")),
        format!("MTU = {}", MTU),
        format!("S1 = {}", ob.s1),
        format!("S2 = {}", ob.s2),
        format!("Jc = {}", ob.jc),
        format!("Jmin = {}", ob.jmin),
        format!("Jmax = {}", ob.jmax),
        format!("H1 = {}", h1),
        format!("H2 = {}", h2),
        format!("H3 = {}", h3),
        format!("H4 = {}", h4),
    ];

    if let Some(signature) = d.device_profile.signature_packet() {
        lines.push(format!("I1 = {}", signature));
    }

    lines.join("\n")
}

fn peer_section(d: &SessionDescriptor) -> String {
    [
        "[Peer]".to_string(),
        format!("PublicKey = {}", d.peer_public_key),
        format!("AllowedIPs = {}", d.allowed_routes.joined()),
        format!("Endpoint = {}", d.endpoint),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::fixtures::{PEER_KEY, descriptor};
    use crate::endpoint::Endpoint;
    use crate::format::FormatId;
    use crate::profile::DeviceProfile;
    use crate::routes::{RouteCatalog, SiteMode};

    /// Minimal INI reader: section name → ordered key/value pairs
    fn parse_ini(text: &str) -> Vec<(String, Vec<(String, String)>)> {
        let mut sections: Vec<(String, Vec<(String, String)>)> = Vec::new();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                sections.push((name.to_string(), Vec::new()));
            } else {
                let (key, value) = line.split_once(" = ").expect("key = value");
                sections
                    .last_mut()
                    .expect("entry before section")
                    .1
                    .push((key.to_string(), value.to_string()));
            }
        }
        sections
    }

    #[test]
    fn test_exact_layout() {
        let d = descriptor(FormatId::Wireguard, DeviceProfile::Standard);
        let expected = format!(
            "[Interface]\n\
             PrivateKey = {}\n\
             Address = 172.16.0.2, 2606:4700:110:8a36:df92:102a:9602:fa18\n\
             DNS = 1.1.1.1, 2606:4700:4700::1111, 1.0.0.1, 2606:4700:4700::1001\n\
             MTU = 1280\n\
             S1 = 0\n\
             S2 = 0\n\
             Jc = 4\n\
             Jmin = 40\n\
             Jmax = 70\n\
             H1 = 1\n\
             H2 = 2\n\
             H3 = 3\n\
             H4 = 4\n\
             \n\
             [Peer]\n\
             PublicKey = {}\n\
             AllowedIPs = 0.0.0.0/0, ::/0\n\
             Endpoint = example.com:500",
            d.private_key(),
            PEER_KEY
        );

        assert_eq!(render(&d), expected);
    }

    #[test]
    fn test_ini_roundtrip() {
        let mut d = descriptor(FormatId::Wireguard, DeviceProfile::Alternate);
        d.allowed_routes = RouteCatalog::builtin().resolve(&["rutracker"], SiteMode::Specific);

        let sections = parse_ini(&render(&d));
        assert_eq!(sections.len(), 2);

        let (name, iface) = &sections[0];
        assert_eq!(name, "Interface");
        assert_eq!(iface[0], ("PrivateKey".to_string(), d.private_key()));
        assert!(iface.contains(&("Jc".to_string(), "120".to_string())));
        assert!(iface.contains(&("Jmax".to_string(), "911".to_string())));

        let (name, peer) = &sections[1];
        assert_eq!(name, "Peer");
        assert_eq!(
            peer,
            &vec![
                ("PublicKey".to_string(), PEER_KEY.to_string()),
                ("AllowedIPs".to_string(), d.allowed_routes.joined()),
                ("Endpoint".to_string(), "example.com:500".to_string()),
            ]
        );
    }

    #[test]
    fn test_ipv6_endpoint_bracketed() {
        let mut d = descriptor(FormatId::Wireguard, DeviceProfile::Standard);
        d.endpoint = "2606:4700:d0::a29f:c001".parse().unwrap();
        let conf = render(&d);

        assert!(conf.ends_with("\nEndpoint = [2606:4700:d0::a29f:c001]:500"));

        let (_, peer) = &parse_ini(&conf)[1];
        let (_, endpoint) = peer.iter().find(|(k, _)| k == "Endpoint").unwrap();
        assert_eq!(endpoint.parse::<Endpoint>().unwrap(), d.endpoint);
    }

    #[test]
    fn test_awg15_adds_one_line() {
        let standard = render(&descriptor(FormatId::Wireguard, DeviceProfile::Standard));
        let awg15 = render(&descriptor(FormatId::Wireguard, DeviceProfile::Obfuscated15));

        let standard: Vec<&str> = standard.lines().collect();
        let awg15: Vec<&str> = awg15.lines().collect();
        assert_eq!(awg15.len(), standard.len() + 1);

        // The extra line sits right after the magic headers
        assert_eq!(awg15[14].split(" = ").next(), Some("I1"));

        let without_signature: Vec<&str> = awg15
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != 14)
            .map(|(_, line)| *line)
            .collect();
        let differing: Vec<&str> = standard
            .iter()
            .zip(&without_signature)
            .filter(|(a, b)| a != b)
            .map(|(a, _)| a.split(" = ").next().unwrap_or_default())
            .collect();
        assert_eq!(differing, vec!["Jc", "Jmin", "Jmax"]);
    }
}
