//! Config generation service
//!
//! One call to [`GenerationService::generate`] takes a request from raw
//! options to a downloadable profile:
//!
//! 1. validate the options
//! 2. generate a key pair
//! 3. register with the upstream and enable the tunnel (single attempt)
//! 4. resolve allowed routes
//! 5. assemble the [`SessionDescriptor`]
//! 6. render the target dialect
//! 7. project and render the QR image, or a placeholder
//! 8. base64 the profile and pick a file name
//!
//! Validation runs before anything touches the network, so a bad request
//! never burns an upstream registration.

use crate::compiler::{self, CompileError};
use crate::descriptor::SessionDescriptor;
use crate::endpoint::{Endpoint, EndpointError};
use crate::format::{FormatId, FormatInfo, UnsupportedFormat};
use crate::keys::{KeyError, KeyPair};
use crate::profile::{DeviceProfile, UnknownDeviceType};
use crate::qr::{self, PngQrRenderer, QrError, QrPayload, QrRenderer};
use crate::routes::{RouteCatalog, SiteMode, UnknownSiteMode};
use crate::upstream::{RegistrationClient, UpstreamError};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Raw generation request, as received from a client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    #[serde(default)]
    pub selected_services: Vec<String>,
    #[serde(default)]
    pub site_mode: String,
    #[serde(default)]
    pub device_type: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub config_format: Option<String>,
}

/// Options after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOptions {
    pub selected_services: Vec<String>,
    pub site_mode: SiteMode,
    pub device_profile: DeviceProfile,
    pub endpoint: Endpoint,
    pub format: FormatId,
}

impl GenerationOptions {
    /// Check every field, returning the first problem found
    pub fn validate(&self) -> Result<ValidatedOptions, ValidationError> {
        let site_mode: SiteMode = self.site_mode.parse()?;
        let device_profile: DeviceProfile = self.device_type.parse()?;
        let endpoint: Endpoint = self.endpoint.parse()?;
        let format = match self.config_format.as_deref() {
            None | Some("") => FormatId::default(),
            Some(id) => id.parse()?,
        };

        if site_mode == SiteMode::Specific && self.selected_services.is_empty() {
            return Err(ValidationError::NoServices);
        }

        Ok(ValidatedOptions {
            selected_services: self.selected_services.clone(),
            site_mode,
            device_profile,
            endpoint,
            format,
        })
    }
}

/// Packaged profile returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub config_base64: String,
    /// `data:` URI, PNG for scannable formats, SVG placeholder otherwise
    pub qr_code_base64: String,
    pub config_format: FormatId,
    pub file_name: String,
}

/// Orchestrates a single profile generation
pub struct GenerationService<R> {
    catalog: Arc<RouteCatalog>,
    registration: R,
    qr: Box<dyn QrRenderer>,
}

impl<R: RegistrationClient> GenerationService<R> {
    /// Service with the PNG QR renderer
    pub fn new(catalog: Arc<RouteCatalog>, registration: R) -> Self {
        Self::with_renderer(catalog, registration, Box::new(PngQrRenderer))
    }

    pub fn with_renderer(
        catalog: Arc<RouteCatalog>,
        registration: R,
        qr: Box<dyn QrRenderer>,
    ) -> Self {
        Self {
            catalog,
            registration,
            qr,
        }
    }

    pub fn catalog(&self) -> &RouteCatalog {
        &self.catalog
    }

    /// Identifiers of every renderable format
    pub fn supported_formats(&self) -> Vec<FormatId> {
        FormatId::all().to_vec()
    }

    /// Descriptive rows for every format
    pub fn format_table(&self) -> &'static [FormatInfo] {
        FormatId::table()
    }

    /// Generate a fresh profile
    pub async fn generate(
        &self,
        options: &GenerationOptions,
    ) -> Result<GenerationResult, GenerationError> {
        let opts = options.validate()?;
        info!(
            "Generating {} profile ({} mode, {} device)",
            opts.format, opts.site_mode, opts.device_profile
        );

        let key_pair = KeyPair::generate()?;
        debug!("Generated key pair, public key {}", key_pair.public);

        let registration = self.registration.register(&key_pair.public).await?;
        let assignment = self.registration.enable_tunnel(&registration).await?;
        info!("Upstream registration complete");

        let allowed_routes = self.catalog.resolve(&opts.selected_services, opts.site_mode);
        debug!("Routing {} ranges", allowed_routes.len());

        let descriptor = SessionDescriptor {
            key_pair,
            peer_public_key: assignment.peer_public_key,
            client_ipv4: assignment.ipv4,
            client_ipv6: assignment.ipv6,
            allowed_routes,
            endpoint: opts.endpoint,
            device_profile: opts.device_profile,
            reserved: assignment.reserved,
            target_format: opts.format,
        };

        let rendered = compiler::render(&descriptor)?;
        debug!("Rendered {} bytes of {}", rendered.body.len(), rendered.format);

        let qr_code_base64 = self.qr_image(&qr::project(&rendered), rendered.format)?;

        Ok(GenerationResult {
            config_base64: BASE64.encode(rendered.as_str()),
            qr_code_base64,
            config_format: rendered.format,
            file_name: rendered.format.file_name(),
        })
    }

    fn qr_image(&self, payload: &QrPayload, format: FormatId) -> Result<String, QrError> {
        match payload {
            QrPayload::NotApplicable => Ok(qr::placeholder_data_uri(format)),
            QrPayload::Payload(text) => match self.qr.render_png(text) {
                Ok(png) => Ok(qr::png_data_uri(&png)),
                Err(QrError::Encode(e)) => {
                    warn!("{} payload does not fit a QR code: {}", format, e);
                    Ok(qr::placeholder_data_uri(format))
                }
                Err(e) => Err(e),
            },
        }
    }
}

/// Request validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    SiteMode(#[from] UnknownSiteMode),

    #[error(transparent)]
    DeviceType(#[from] UnknownDeviceType),

    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error(transparent)]
    Format(#[from] UnsupportedFormat),

    #[error("No services selected")]
    NoServices,
}

/// Generation errors
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Upstream(#[from] UpstreamError),

    #[error("{0}")]
    Compile(#[from] CompileError),

    #[error("{0}")]
    Keys(#[from] KeyError),

    #[error("{0}")]
    Qr(#[from] QrError),
}

impl GenerationError {
    /// Caused by the request or the upstream rather than by us
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GenerationError::Validation(_) | GenerationError::Upstream(_)
        )
    }
}
