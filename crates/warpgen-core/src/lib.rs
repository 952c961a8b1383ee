//! warpgen - Relay tunnel profile generator
//!
//! Registers a fresh device with the relay network and renders the
//! resulting tunnel as a ready-to-import profile for one of several
//! client apps.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      GenerationService                        │
//! │                                                               │
//! │  options ──▶ validate ──▶ KeyPair ──▶ RegistrationClient ──┐  │
//! │                                                            │  │
//! │  ┌──────────────┐    ┌───────────────────┐                 │  │
//! │  │ RouteCatalog │───▶│ SessionDescriptor │◀────────────────┘  │
//! │  └──────────────┘    └─────────┬─────────┘                    │
//! │                                ▼                              │
//! │                        compiler::render                       │
//! │                                │                              │
//! │                   ┌────────────┴────────────┐                 │
//! │                   ▼                         ▼                 │
//! │             config base64          qr::project ──▶ PNG / SVG  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Formats
//!
//! - **wireguard**: AmneziaWG `.conf`, with the 1.5 signature packet for `awg15`
//! - **throne**: single `wg://` URL
//! - **clash**: Clash Meta proxy + proxy group YAML
//! - **nekoray**, **husi**, **karing**: JSON outbounds
//!
//! Nothing is persisted. Every request produces a new key pair and a new
//! upstream registration.

pub mod compiler;
mod descriptor;
mod endpoint;
mod format;
mod keys;
mod profile;
pub mod qr;
mod routes;
mod service;
mod settings;
mod upstream;

pub use compiler::{CompileError, RenderedConfig};
pub use descriptor::{ReservedBytes, SessionDescriptor};
pub use endpoint::{DEFAULT_PORT, Endpoint, EndpointError};
pub use format::{FormatId, FormatInfo, UnsupportedFormat};
pub use keys::{KeyError, KeyPair, PrivateKey, PublicKey};
pub use profile::{DeviceProfile, Obfuscation, UnknownDeviceType};
pub use qr::{PngQrRenderer, QrError, QrPayload, QrRenderer};
pub use routes::{AllowedRoutes, CatalogStats, RouteCatalog, SiteMode, UnknownSiteMode};
pub use service::{
    GenerationError, GenerationOptions, GenerationResult, GenerationService, ValidatedOptions,
    ValidationError,
};
pub use settings::{CaptchaSettings, Settings, SettingsError, UpstreamSettings};
pub use upstream::{
    CloudflareClient, DEFAULT_API_BASE, Registration, RegistrationClient, TunnelAssignment,
    UpstreamError,
};
