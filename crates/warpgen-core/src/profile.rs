//! Device profiles
//!
//! Each profile is a fixed bundle of AmneziaWG obfuscation constants. Only
//! the junk-packet triple differs between profiles; the packet-size
//! scalars and magic headers are shared.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque AmneziaWG 1.5 signature packet, emitted verbatim as `I1`.
pub const AWG15_SIGNATURE_PACKET: &str = concat!(
    "<b 0x",
    "c10000000114367096bb0fb3f58f3a3fb8aaacd61d63a1c8a40e14f7374b8a62dccba6431716c3abf6f5afbcfb39bd00",
    "8000047c32e268567c652e6f4db58bff759bc8c5aaca183b87cb4d22938fe7d8dca22a679a79e4d9ee62e4bbb3a380dd",
    "78d4e8e48f26b38a1d42d76b371a5a9a0444827a69d1ab5872a85749f65a4104e931740b4dc1e2dd77733fc7fac4f930",
    "11cd622f2bb47e85f71992e2d585f8dc765a7a12ddeb879746a267393ad023d267c4bd79f258703e27345155268bd3cc",
    "0506ebd72e2e3c6b5b0f005299cd94b67ddabe30389c4f9b5c2d512dcc298c14f14e9b7f931e1dc397926c31fbb7cebf",
    "c668349c218672501031ecce151d4cb03c4c660b6c6fe7754e75446cd7de09a8c81030c5f6fb377203f551864f3d83e2",
    "7de7b86499736cbbb549b2f37f436db1cae0a4ea39930f0534aacdd1e3534bc87877e2afabe959ced261f228d6362e6f",
    "d277c88c312d966c8b9f67e4a92e757773db0b0862fb8108d1d8fa262a40a1b4171961f0704c8ba314da2482ac8ed9bd",
    "28d4b50f7432d89fd800c25a50c5e2f5c0710544fef5273401116aa0572366d8e49ad758fcb29e6a92912e644dbe227c",
    "247cb3417eabfab2db16796b2fba420de3b1dc94e8361f1f324a331ddaf1e626553138860757fd0bf687566108b77b70",
    "fb9f8f8962eca599c4a70ed373666961a8cb506b96756d9e28b94122b20f16b54f118c0e603ce0b831efea614ad836df",
    "6cf9affbdd09596412547496967da758cec9080295d853b0861670b71d9abde0d562b1a6de82782a5b0c14d297f27283",
    "a895abc889a5f6703f0e6eb95f67b2da45f150d0d8ab805612d570c2d5cb6997ac3a7756226c2f5c8982ffbd480c5004",
    "b0660a3c9468945efde90864019a2b519458724b55d766e16b0da25c0557c01f3c11ddeb024b62e303640e17fdd57ded",
    "b3aeb4a2c1b7c93059f9c1d7118d77caac1cd0f6556e46cbc991c1bb16970273dea833d01e5090d061a0c6d25af2415c",
    "d2878af97f6d0e7f1f936247b394ecb9bd484da6be936dee9b0b92dc90101a1b4295e97a9772f2263eb09431995aa173",
    "df4ca2abd687d87706f0f93eaa5e13cbe3b574fa3cfe94502ace25265778da6960d561381769c24e0cbd7aac73c16f95",
    "ae74ff7ec38124f7c722b9cb151d4b6841343f29be8f35145e1b27021056820fed77003df8554b4155716c8cf6049ef5",
    "e318481460a8ce3be7c7bfac695255be84dc491c19e9dedc449dd3471728cd2a3ee51324ccb3eef121e3e08f8e18f000",
    "6ea8957371d9f2f739f0b89e4db11e5c6430ada61572e589519fbad4498b460ce6e4407fc2d8f2dd4293a50a0cb8fcaa",
    "f35cd9a8cc097e3603fbfa08d9036f52b3e7fcce11b83ad28a4ac12dba0395a0cc871cefd1a2856fffb3f28d82ce35cf",
    "80579974778bab13d9b3578d8c75a2d196087a2cd439aff2bb33f2db24ac175fff4ed91d36a4cdbfaf3f83074f03894e",
    "a40f17034629890da3efdbb41141b38368ab532209b69f057ddc559c19bc8ae62bf3fd564c9a35d9a83d14a95834a92b",
    "ae6d9a29ae5e8ece07910d16433e4c6230c9bd7d68b47de0de9843988af6dc88b5301820443bd4d0537778bf6b4c1dd0",
    "67fcf14b81015f2a67c7f2a28f9cb7e0684d3cb4b1c24d9b343122a086611b489532f1c3a26779da1706c6759d96d8ab",
    ">",
);

/// Obfuscation constants rendered into a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Obfuscation {
    /// Junk packet count
    pub jc: u16,
    /// Minimum junk packet size
    pub jmin: u16,
    /// Maximum junk packet size
    pub jmax: u16,
    /// Init packet junk size
    pub s1: u16,
    /// Response packet junk size
    pub s2: u16,
    /// Magic headers for init, response, underload and transport packets
    pub headers: [u32; 4],
}

const MAGIC_HEADERS: [u32; 4] = [1, 2, 3, 4];

/// Target platform profile selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceProfile {
    /// Desktop clients ("computer")
    #[serde(rename = "computer")]
    Standard,
    /// Mobile clients ("phone")
    #[serde(rename = "phone")]
    Alternate,
    /// AmneziaWG 1.5 with a signature packet ("awg15")
    #[serde(rename = "awg15")]
    Obfuscated15,
}

impl DeviceProfile {
    /// All profiles, in the order the UI offers them
    pub fn all() -> &'static [DeviceProfile] {
        &[
            DeviceProfile::Standard,
            DeviceProfile::Alternate,
            DeviceProfile::Obfuscated15,
        ]
    }

    /// Wire identifier used in requests
    pub fn id(&self) -> &'static str {
        match self {
            DeviceProfile::Standard => "computer",
            DeviceProfile::Alternate => "phone",
            DeviceProfile::Obfuscated15 => "awg15",
        }
    }

    /// Obfuscation constants for this profile
    pub fn obfuscation(&self) -> Obfuscation {
        let (jc, jmin, jmax) = match self {
            DeviceProfile::Standard => (4, 40, 70),
            DeviceProfile::Alternate | DeviceProfile::Obfuscated15 => (120, 23, 911),
        };
        Obfuscation {
            jc,
            jmin,
            jmax,
            s1: 0,
            s2: 0,
            headers: MAGIC_HEADERS,
        }
    }

    /// Extra `I1` signature block, only carried by the 1.5 profile
    pub fn signature_packet(&self) -> Option<&'static str> {
        match self {
            DeviceProfile::Obfuscated15 => Some(AWG15_SIGNATURE_PACKET),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for DeviceProfile {
    type Err = UnknownDeviceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|p| p.id() == s)
            .ok_or_else(|| UnknownDeviceType(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid device type: {0}")]
pub struct UnknownDeviceType(pub String);
