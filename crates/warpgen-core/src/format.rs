//! Output formats
//!
//! The format table is part of the public contract: the info endpoint
//! publishes it and the compiler and QR projection must agree with it.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target client dialect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatId {
    /// AmneziaWG / WireGuard `.conf`
    #[default]
    Wireguard,
    /// Throne `wg://` URL
    Throne,
    /// Clash Meta YAML
    Clash,
    /// NekoRay / Exclave outbound
    Nekoray,
    /// Husi outbound with peers
    Husi,
    /// Karing / Hiddify outbounds
    Karing,
}

/// Static metadata for one format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatInfo {
    pub id: FormatId,
    pub name: &'static str,
    pub description: &'static str,
    pub extension: &'static str,
    #[serde(rename = "supportsQR")]
    pub supports_qr: bool,
    pub requires_reserved: bool,
    /// File name prefix for downloads
    #[serde(skip)]
    pub file_prefix: &'static str,
}

const FORMATS: [FormatInfo; 6] = [
    FormatInfo {
        id: FormatId::Wireguard,
        name: "AmneziaWG",
        description: "Standard WireGuard configuration (.conf)",
        extension: "conf",
        supports_qr: true,
        requires_reserved: false,
        file_prefix: "WARP",
    },
    FormatInfo {
        id: FormatId::Throne,
        name: "Throne",
        description: "URL format for the Throne client",
        extension: "txt",
        supports_qr: true,
        requires_reserved: true,
        file_prefix: "THRONE",
    },
    FormatInfo {
        id: FormatId::Clash,
        name: "Clash",
        description: "Clash Meta proxy configuration (.yaml)",
        extension: "yaml",
        supports_qr: true,
        requires_reserved: true,
        file_prefix: "CLASH",
    },
    FormatInfo {
        id: FormatId::Nekoray,
        name: "NekoRay/Exclave",
        description: "JSON outbound for NekoRay/Exclave",
        extension: "json",
        supports_qr: false,
        requires_reserved: true,
        file_prefix: "NEKORAY",
    },
    FormatInfo {
        id: FormatId::Husi,
        name: "Husi",
        description: "JSON outbound for Husi",
        extension: "json",
        supports_qr: false,
        requires_reserved: true,
        file_prefix: "HUSI",
    },
    FormatInfo {
        id: FormatId::Karing,
        name: "Karing/Hiddify",
        description: "Outbound configuration for Karing and Hiddify",
        extension: "json",
        supports_qr: false,
        requires_reserved: true,
        file_prefix: "KARING",
    },
];

impl FormatId {
    /// All formats, in display order
    pub fn all() -> [FormatId; 6] {
        FORMATS.map(|f| f.id)
    }

    /// The full metadata table
    pub fn table() -> &'static [FormatInfo] {
        &FORMATS
    }

    pub fn info(&self) -> &'static FormatInfo {
        // FORMATS is declared in variant order
        &FORMATS[*self as usize]
    }

    /// Wire identifier
    pub fn id(&self) -> &'static str {
        match self {
            FormatId::Wireguard => "wireguard",
            FormatId::Throne => "throne",
            FormatId::Clash => "clash",
            FormatId::Nekoray => "nekoray",
            FormatId::Husi => "husi",
            FormatId::Karing => "karing",
        }
    }

    pub fn display_name(&self) -> &'static str {
        self.info().name
    }

    pub fn extension(&self) -> &'static str {
        self.info().extension
    }

    pub fn supports_qr(&self) -> bool {
        self.info().supports_qr
    }

    /// Download name: prefix, a 7-digit random suffix, extension
    pub fn file_name(&self) -> String {
        let suffix = rand::thread_rng().gen_range(1_000_000..=9_999_999u32);
        self.file_name_with(suffix)
    }

    pub fn file_name_with(&self, suffix: u32) -> String {
        let info = self.info();
        format!("{}{}.{}", info.file_prefix, suffix, info.extension)
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FormatId {
    type Err = UnsupportedFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatId::all()
            .into_iter()
            .find(|f| f.id() == s)
            .ok_or_else(|| UnsupportedFormat(s.to_string()))
    }
}

/// A format identifier with no renderer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported config format: {0}")]
pub struct UnsupportedFormat(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    fn matches_name(name: &str, prefix: &str, ext: &str) -> bool {
        let Some(rest) = name.strip_prefix(prefix) else {
            return false;
        };
        let Some(digits) = rest.strip_suffix(&format!(".{ext}")) else {
            return false;
        };
        (6..=7).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
    }

    #[test]
    fn test_table_matches_variants() {
        for (idx, format) in FormatId::all().into_iter().enumerate() {
            assert_eq!(FormatId::table()[idx].id, format);
            assert_eq!(format.info().id, format);
            assert_eq!(format.id().parse::<FormatId>().unwrap(), format);
        }
    }

    #[test]
    fn test_qr_flags() {
        let qr: Vec<_> = FormatId::all().into_iter().filter(FormatId::supports_qr).collect();
        assert_eq!(qr, vec![FormatId::Wireguard, FormatId::Throne, FormatId::Clash]);
    }

    #[test]
    fn test_unknown_format() {
        let err = "warpinwarp".parse::<FormatId>().unwrap_err();
        assert_eq!(err, UnsupportedFormat("warpinwarp".into()));
        assert_eq!(err.to_string(), "Unsupported config format: warpinwarp");
    }

    #[test]
    fn test_file_names() {
        for _ in 0..32 {
            assert!(matches_name(&FormatId::Throne.file_name(), "THRONE", "txt"));
            assert!(matches_name(&FormatId::Wireguard.file_name(), "WARP", "conf"));
        }
        assert_eq!(FormatId::Clash.file_name_with(1234567), "CLASH1234567.yaml");
        assert_eq!(FormatId::Husi.file_name_with(1000000), "HUSI1000000.json");
    }

    #[test]
    fn test_info_serializes_camel_case() {
        let json = serde_json::to_value(FormatId::Throne.info()).unwrap();

        assert_eq!(json["id"], "throne");
        assert_eq!(json["supportsQR"], true);
        assert_eq!(json["requiresReserved"], true);
        assert!(json.get("filePrefix").is_none());
    }
}
