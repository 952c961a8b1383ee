//! Clash Meta YAML dialect
//!
//! Clash only ships with the mobile AmneziaWG tuning, so the obfuscation
//! block always carries the alternate profile's constants whatever device
//! the user picked. The `h4`/`h3` keys are also emitted swapped; Clash
//! builds in the wild were tested against exactly this layout.

use super::MTU;
use crate::descriptor::SessionDescriptor;
use crate::profile::DeviceProfile;

const DNS: &str = "1.1.1.1, 1.0.0.1, 2606:4700:4700::1111, 2606:4700:4700::1001";

const PROXY_GROUP: &str = "proxy-groups:
- name: Cloudflare
  type: select
  icon: https://www.vectorlogo.zone/logos/cloudflare/cloudflare-icon.svg
  proxies:
    - WARP
  url: 'http://speed.cloudflare.com/'
  interval: 300";

pub(super) fn render(d: &SessionDescriptor) -> String {
    let ob = DeviceProfile::Alternate.obfuscation();
    let [h1, h2, h3, h4] = ob.headers;
    // Emitted under swapped keys: `h4` carries the third header, `h3` the fourth
    let (h4_key, h3_key) = (h3, h4);

    format!(
        "proxies:
- name: \"WARP\"
  type: wireguard
  private-key: {private_key}
  server: {server}
  port: {port}
  ip: {ipv4}
  public-key: {public_key}
  allowed-ips: ['0.0.0.0/0']
  reserved: [{reserved}]
  udp: true
  mtu: {mtu}
  remote-dns-resolve: true
  dns: [{dns}]
  amnezia-wg-option:
   jc: {jc}
   jmin: {jmin}
   jmax: {jmax}
   s1: {s1}
   s2: {s2}
   h1: {h1}
   h2: {h2}
   h4: {h4_key}
   h3: {h3_key}

{group}",
        private_key = d.private_key(),
        server = d.endpoint.host,
        port = d.endpoint.port,
        ipv4 = d.client_ipv4,
        public_key = d.peer_public_key,
        reserved = d.reserved.join(", "),
        mtu = MTU,
        dns = DNS,
        jc = ob.jc,
        jmin = ob.jmin,
        jmax = ob.jmax,
        s1 = ob.s1,
        s2 = ob.s2,
        h1 = h1,
        h2 = h2,
        h4_key = h4_key,
        h3_key = h3_key,
        group = PROXY_GROUP,
    )
}
