//! Session descriptor
//!
//! The canonical record every dialect is rendered from. It is assembled once
//! per request from the fresh key pair, the upstream registration and the
//! user's options, then handed to the compiler.

use crate::endpoint::Endpoint;
use crate::format::FormatId;
use crate::keys::KeyPair;
use crate::profile::DeviceProfile;
use crate::routes::AllowedRoutes;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Per-session bytes issued by the upstream network.
///
/// May be empty; each dialect decides how an empty value renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservedBytes(Vec<u8>);

impl ReservedBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decimal values, or `[0, 0, 0]` when empty
    pub fn values_or_zero(&self) -> Vec<u8> {
        if self.0.is_empty() {
            vec![0, 0, 0]
        } else {
            self.0.clone()
        }
    }

    /// Decimal values joined with `sep`, zero triple when empty
    pub fn join(&self, sep: &str) -> String {
        self.values_or_zero()
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(sep)
    }
}

impl From<Vec<u8>> for ReservedBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Everything a renderer needs to know about one session
#[derive(Debug, Clone)]
pub struct SessionDescriptor {
    /// Our freshly generated key pair
    pub key_pair: KeyPair,
    /// Public key of the relay peer (base64, as delivered upstream)
    pub peer_public_key: String,
    /// Assigned tunnel IPv4 address (no prefix)
    pub client_ipv4: Ipv4Addr,
    /// Assigned tunnel IPv6 address (no prefix)
    pub client_ipv6: Ipv6Addr,
    /// Routes carried by the tunnel
    pub allowed_routes: AllowedRoutes,
    /// Relay endpoint the client dials
    pub endpoint: Endpoint,
    /// Obfuscation profile
    pub device_profile: DeviceProfile,
    /// Upstream session bytes
    pub reserved: ReservedBytes,
    /// Dialect to render
    pub target_format: FormatId,
}

impl SessionDescriptor {
    /// Base64 private key
    pub fn private_key(&self) -> String {
        self.key_pair.private.to_base64()
    }

    /// `<v4>/32` and `<v6>/128`
    pub fn local_addresses(&self) -> [String; 2] {
        [
            format!("{}/32", self.client_ipv4),
            format!("{}/128", self.client_ipv6),
        ]
    }
}
