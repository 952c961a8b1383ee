//! Upstream registration client
//!
//! Two sequential calls against the relay network's client API:
//!
//! 1. `POST reg` with our public key → device id + bearer token
//! 2. `PATCH reg/{id}` enabling the tunnel → peer key, addresses and the
//!    per-session reserved bytes
//!
//! Every call registers a brand new device, so nothing here retries.

use crate::descriptor::ReservedBytes;
use crate::keys::PublicKey;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use reqwest::header::USER_AGENT;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use tracing::{debug, warn};

/// Public client API endpoint
pub const DEFAULT_API_BASE: &str = "https://api.cloudflareclient.com/v0i1909051800";

/// Longest upstream body quoted back in an error
const MAX_ERROR_BODY: usize = 200;

/// Result of the registration step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub client_id: String,
    pub token: String,
}

/// Tunnel parameters assigned by the upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelAssignment {
    pub peer_public_key: String,
    pub ipv4: Ipv4Addr,
    pub ipv6: Ipv6Addr,
    pub reserved: ReservedBytes,
}

/// Registration round-trip against the relay network
pub trait RegistrationClient: Send + Sync {
    /// Register a new device for `public_key`
    fn register(
        &self,
        public_key: &PublicKey,
    ) -> impl Future<Output = Result<Registration, UpstreamError>> + Send;

    /// Enable the tunnel for a registered device
    fn enable_tunnel(
        &self,
        registration: &Registration,
    ) -> impl Future<Output = Result<TunnelAssignment, UpstreamError>> + Send;
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    install_id: &'static str,
    tos: String,
    key: &'a str,
    fcm_token: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    locale: &'static str,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct RegisterResult {
    id: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct EnableResult {
    config: WireConfig,
}

#[derive(Debug, Deserialize)]
struct WireConfig {
    peers: Vec<WirePeer>,
    interface: WireInterface,
    #[serde(default)]
    client_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WirePeer {
    public_key: String,
}

#[derive(Debug, Deserialize)]
struct WireInterface {
    addresses: WireAddresses,
}

#[derive(Debug, Deserialize)]
struct WireAddresses {
    v4: String,
    v6: String,
}

impl TryFrom<WireConfig> for TunnelAssignment {
    type Error = UpstreamError;

    fn try_from(config: WireConfig) -> Result<Self, Self::Error> {
        let peer = config
            .peers
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::Malformed("no peers in tunnel config".into()))?;

        let addresses = config.interface.addresses;
        let ipv4 = addresses
            .v4
            .parse()
            .map_err(|_| UpstreamError::Malformed(format!("bad IPv4 address {:?}", addresses.v4)))?;
        let ipv6 = addresses
            .v6
            .parse()
            .map_err(|_| UpstreamError::Malformed(format!("bad IPv6 address {:?}", addresses.v6)))?;

        Ok(Self {
            peer_public_key: peer.public_key,
            ipv4,
            ipv6,
            reserved: decode_reserved(config.client_id.as_deref()),
        })
    }
}

/// The upstream hands the reserved bytes out as base64 `client_id`.
/// Anything undecodable is treated as absent.
fn decode_reserved(client_id: Option<&str>) -> ReservedBytes {
    match client_id.filter(|id| !id.is_empty()) {
        None => ReservedBytes::default(),
        Some(id) => match BASE64.decode(id) {
            Ok(bytes) => ReservedBytes::new(bytes),
            Err(e) => {
                warn!("Ignoring undecodable client_id: {}", e);
                ReservedBytes::default()
            }
        },
    }
}

/// HTTP client for the relay network's registration API
#[derive(Debug, Clone)]
pub struct CloudflareClient {
    http: reqwest::Client,
    base_url: String,
}

impl CloudflareClient {
    /// Create a client rooted at `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, UpstreamError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        Ok(envelope.result)
    }
}

impl RegistrationClient for CloudflareClient {
    async fn register(&self, public_key: &PublicKey) -> Result<Registration, UpstreamError> {
        let key = public_key.to_base64();
        let body = RegisterRequest {
            install_id: "",
            tos: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            key: &key,
            fcm_token: "",
            kind: "ios",
            locale: "en_US",
        };

        debug!("Registering device with upstream");
        let response = self
            .http
            .post(self.url("reg"))
            .header(USER_AGENT, "")
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Http(e.to_string()))?;

        let result: RegisterResult = Self::read(response).await?;
        debug!("Registered device {}", result.id);

        Ok(Registration {
            client_id: result.id,
            token: result.token,
        })
    }

    async fn enable_tunnel(
        &self,
        registration: &Registration,
    ) -> Result<TunnelAssignment, UpstreamError> {
        debug!("Enabling tunnel for device {}", registration.client_id);
        let response = self
            .http
            .patch(self.url(&format!("reg/{}", registration.client_id)))
            .header(USER_AGENT, "")
            .bearer_auth(&registration.token)
            .json(&serde_json::json!({ "warp_enabled": true }))
            .send()
            .await
            .map_err(|e| UpstreamError::Http(e.to_string()))?;

        let result: EnableResult = Self::read(response).await?;
        result.config.try_into()
    }
}

/// Upstream errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    #[error("Upstream request failed: {0}")]
    Http(String),

    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed upstream response: {0}")]
    Malformed(String),
}
