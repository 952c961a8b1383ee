//! Configuration compiler
//!
//! Projects a [`SessionDescriptor`] into one of the client dialects.
//!
//! | Dialect family | Formats                 | Encoding                   |
//! |----------------|-------------------------|----------------------------|
//! | tunnel         | wireguard               | hand-built INI text        |
//! | url            | throne                  | hand-built `wg://` URL     |
//! | yaml           | clash                   | fixed YAML template        |
//! | outbound       | nekoray, husi, karing   | serde structs → JSON       |
//!
//! Text dialects are assembled by hand because their byte layout, not only
//! their meaning, is what the client apps parse. Every renderer is a pure
//! function of the descriptor.

mod clash;
mod outbound;
mod throne;
mod tunnel;

use crate::descriptor::SessionDescriptor;
use crate::format::FormatId;

/// Fixed tunnel MTU for every dialect
pub const MTU: u16 = 1280;

/// Resolvers written into the tunnel dialect, primary pair first
pub const DNS_SERVERS: [&str; 4] = [
    "1.1.1.1",
    "2606:4700:4700::1111",
    "1.0.0.1",
    "2606:4700:4700::1001",
];

/// A rendered profile, tagged with its format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedConfig {
    pub format: FormatId,
    pub body: String,
}

impl RenderedConfig {
    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    pub fn as_str(&self) -> &str {
        &self.body
    }
}

/// Render the descriptor in its target format
pub fn render(descriptor: &SessionDescriptor) -> Result<RenderedConfig, CompileError> {
    let body = match descriptor.target_format {
        FormatId::Wireguard => tunnel::render(descriptor),
        FormatId::Throne => throne::render(descriptor),
        FormatId::Clash => clash::render(descriptor),
        FormatId::Nekoray => outbound::render_nekoray(descriptor)?,
        FormatId::Husi => outbound::render_husi(descriptor)?,
        FormatId::Karing => outbound::render_karing(descriptor)?,
    };

    Ok(RenderedConfig {
        format: descriptor.target_format,
        body,
    })
}

/// Compiler errors
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Failed to encode {format} config: {source}")]
    Encode {
        format: FormatId,
        #[source]
        source: serde_json::Error,
    },
}


#[cfg(test)]
mod tests {
    use super::fixtures::descriptor;
    use super::*;
    use crate::profile::DeviceProfile;

    #[test]
    fn test_render_is_deterministic() {
        for format in FormatId::all() {
            let d = descriptor(format, DeviceProfile::Obfuscated15);
            let first = render(&d).unwrap();
            let second = render(&d).unwrap();

            assert_eq!(first, second, "{format}");
            assert_eq!(first.format, format);
            assert!(!first.body.is_empty());
        }
    }

    #[test]
    fn test_json_dialects_parse() {
        for format in [FormatId::Nekoray, FormatId::Husi, FormatId::Karing] {
            let rendered = render(&descriptor(format, DeviceProfile::Standard)).unwrap();
            let value: serde_json::Value = serde_json::from_str(&rendered.body).unwrap();

            assert!(value.is_object(), "{format}");
            assert_eq!(rendered.extension(), "json");
        }
    }

    #[test]
    fn test_private_key_present_everywhere() {
        for format in FormatId::all() {
            let d = descriptor(format, DeviceProfile::Standard);
            let key = d.private_key();
            let body = render(&d).unwrap().body;
            let stem = key.trim_end_matches('=');

            assert!(body.contains(stem), "{format}");
        }
    }
}
