//! QR projection
//!
//! Decides what, if anything, goes into a profile's QR code, and renders
//! it. Image rendering sits behind [`QrRenderer`] so the service can be
//! exercised without touching the image stack.

use crate::compiler::RenderedConfig;
use crate::format::FormatId;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;

/// Side length of rendered codes, in pixels
const QR_MIN_SIZE: u32 = 200;

/// What a QR code should carry for one rendered profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrPayload {
    Payload(String),
    /// The format cannot be scanned by its client app
    NotApplicable,
}

/// Derive the QR payload for a rendered profile.
///
/// URLs go in verbatim. Other scannable dialects drop their MTU line, which
/// clients default anyway, to keep the code small.
pub fn project(rendered: &RenderedConfig) -> QrPayload {
    if !rendered.format.supports_qr() {
        return QrPayload::NotApplicable;
    }

    match rendered.format {
        FormatId::Throne => QrPayload::Payload(rendered.body.clone()),
        _ => QrPayload::Payload(strip_mtu_lines(&rendered.body)),
    }
}

/// Remove `MTU = n` (tunnel) and `mtu: n` (YAML) lines
fn strip_mtu_lines(text: &str) -> String {
    text.split('\n')
        .filter(|line| {
            let trimmed = line.trim_start();
            !(trimmed.starts_with("MTU = ") || trimmed.starts_with("mtu: "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders a QR payload to PNG bytes
pub trait QrRenderer: Send + Sync {
    fn render_png(&self, payload: &str) -> Result<Vec<u8>, QrError>;
}

/// `qrcode` + `image` backed renderer
#[derive(Debug, Clone, Default)]
pub struct PngQrRenderer;

impl QrRenderer for PngQrRenderer {
    fn render_png(&self, payload: &str) -> Result<Vec<u8>, QrError> {
        // Level L: the AmneziaWG 1.5 profile needs almost all of the capacity
        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::L)
            .map_err(|e| QrError::Encode(e.to_string()))?;

        let image = code
            .render::<Luma<u8>>()
            .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
            .build();

        let mut png = Vec::new();
        DynamicImage::ImageLuma8(image)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| QrError::Image(e.to_string()))?;
        Ok(png)
    }
}

/// `data:` URI for PNG bytes
pub fn png_data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(png))
}

/// Stand-in image for formats without QR support
pub fn placeholder_svg(format: FormatId) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="200" viewBox="0 0 200 200">
  <rect width="200" height="200" fill="white"/>
  <polygon points="100,30 170,150 30,150" fill="none" stroke="#f59e0b" stroke-width="3"/>
  <text x="100" y="140" text-anchor="middle" font-family="Arial" font-size="24" fill="#f59e0b">!</text>
  <text x="100" y="175" text-anchor="middle" font-family="Arial" font-size="12" fill="#6b7280">{}</text>
  <text x="100" y="190" text-anchor="middle" font-family="Arial" font-size="10" fill="#9ca3af">QR unsupported</text>
</svg>"##,
        format.display_name()
    )
}

/// `data:` URI wrapping [`placeholder_svg`]
pub fn placeholder_data_uri(format: FormatId) -> String {
    format!(
        "data:image/svg+xml;base64,{}",
        BASE64.encode(placeholder_svg(format))
    )
}

/// QR rendering errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum QrError {
    #[error("QR encoding failed: {0}")]
    Encode(String),

    #[error("QR image encoding failed: {0}")]
    Image(String),
}
