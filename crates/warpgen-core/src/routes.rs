//! Allowed-route catalog
//!
//! Maps service identifiers to the CIDR ranges that must be routed through
//! the tunnel for that service to work. The catalog is built once at start
//! up and shared read-only between requests.
//!
//! # Resolution
//!
//! | Site mode  | Result                                             |
//! |------------|----------------------------------------------------|
//! | `all`      | `0.0.0.0/0, ::/0`                                  |
//! | `specific` | union of the selected services, first-seen order   |
//!
//! A `specific` request that matches nothing falls back to the universal
//! pair rather than producing a tunnel that routes no traffic.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use tracing::{debug, warn};

/// The "route everything" pair
pub const UNIVERSAL_ROUTES: [&str; 2] = ["0.0.0.0/0", "::/0"];

/// Which traffic the tunnel should carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteMode {
    /// All traffic
    All,
    /// Only the selected services
    Specific,
}

impl SiteMode {
    pub fn id(&self) -> &'static str {
        match self {
            SiteMode::All => "all",
            SiteMode::Specific => "specific",
        }
    }
}

impl fmt::Display for SiteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SiteMode {
    type Err = UnknownSiteMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(SiteMode::All),
            "specific" => Ok(SiteMode::Specific),
            _ => Err(UnknownSiteMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid site mode: {0}")]
pub struct UnknownSiteMode(pub String);

/// Deduplicated set of CIDR ranges, kept in first-seen order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedRoutes(Vec<String>);

impl AllowedRoutes {
    /// `0.0.0.0/0` and `::/0`
    pub fn universal() -> Self {
        Self(UNIVERSAL_ROUTES.iter().map(|r| r.to_string()).collect())
    }

    pub fn is_universal(&self) -> bool {
        self.0 == UNIVERSAL_ROUTES
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Join with the `, ` separator used by the tunnel dialect
    pub fn joined(&self) -> String {
        self.0.join(", ")
    }
}

/// Catalog size summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub total_services: usize,
    pub total_ranges: usize,
    pub unique_ranges: usize,
}

/// Static service → CIDR table
#[derive(Debug, Clone)]
pub struct RouteCatalog {
    services: HashMap<String, Vec<String>>,
    /// Listing order for `service_ids`
    order: Vec<String>,
}

impl RouteCatalog {
    /// Catalog with the built-in service table
    pub fn builtin() -> Self {
        let mut catalog = Self {
            services: HashMap::with_capacity(BUILTIN_SERVICES.len()),
            order: Vec::with_capacity(BUILTIN_SERVICES.len()),
        };
        for (id, ranges) in BUILTIN_SERVICES {
            catalog.insert(id, ranges.iter().map(|r| r.to_string()).collect());
        }
        catalog
    }

    /// Add or replace services. Malformed CIDRs are dropped with a warning;
    /// a service left with no valid range is not registered.
    pub fn with_overrides<I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        for (id, ranges) in overrides {
            let valid: Vec<String> = ranges
                .into_iter()
                .filter(|cidr| {
                    let ok = parse_cidr(cidr).is_some();
                    if !ok {
                        warn!("Ignoring malformed CIDR {:?} for service {}", cidr, id);
                    }
                    ok
                })
                .collect();

            if valid.is_empty() {
                warn!("Service {} has no usable ranges, skipping", id);
                continue;
            }
            debug!("Catalog override: {} ({} ranges)", id, valid.len());
            self.insert(&id, valid);
        }
        self
    }

    fn insert(&mut self, id: &str, ranges: Vec<String>) {
        if self.services.insert(id.to_string(), ranges).is_none() {
            self.order.push(id.to_string());
        }
    }

    /// Is this service known?
    pub fn contains(&self, id: &str) -> bool {
        self.ranges(id).is_some()
    }

    /// Ranges for one service
    pub fn ranges(&self, id: &str) -> Option<&[String]> {
        self.services
            .get(canonical_id(id))
            .map(Vec::as_slice)
    }

    /// Known service identifiers
    pub fn service_ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Resolve a selection into the routes the tunnel should carry
    pub fn resolve<S: AsRef<str>>(&self, service_ids: &[S], mode: SiteMode) -> AllowedRoutes {
        if mode == SiteMode::All {
            return AllowedRoutes::universal();
        }

        let mut seen = HashSet::new();
        let mut routes = Vec::new();

        for id in service_ids {
            let id = id.as_ref();
            let Some(ranges) = self.ranges(id) else {
                warn!("Unknown service {:?} ignored", id);
                continue;
            };
            for cidr in ranges {
                if seen.insert(cidr.as_str()) {
                    routes.push(cidr.clone());
                }
            }
        }

        if routes.is_empty() {
            warn!("No supported services selected, routing all traffic");
            return AllowedRoutes::universal();
        }

        debug!("Resolved {} services to {} ranges", service_ids.len(), routes.len());
        AllowedRoutes(routes)
    }

    pub fn stats(&self) -> CatalogStats {
        let total_ranges = self.services.values().map(Vec::len).sum();
        let unique_ranges = self
            .services
            .values()
            .flatten()
            .collect::<HashSet<_>>()
            .len();

        CatalogStats {
            total_services: self.services.len(),
            total_ranges,
            unique_ranges,
        }
    }
}

impl Default for RouteCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Older clients spell it "yummianime"
fn canonical_id(id: &str) -> &str {
    match id {
        "yummianime" => "yummyanime",
        other => other,
    }
}

/// Parse CIDR notation (e.g., "104.16.0.0/12")
fn parse_cidr(cidr: &str) -> Option<(IpAddr, u8)> {
    let (ip, prefix) = cidr.split_once('/')?;
    let ip: IpAddr = ip.parse().ok()?;
    let prefix: u8 = prefix.parse().ok()?;

    let max = if ip.is_ipv4() { 32 } else { 128 };
    (prefix <= max).then_some((ip, prefix))
}

const DISCORD: &[&str] = &[
    "103.224.0.0/16",
    "104.16.0.0/12",
    "108.136.0.0/14",
    "108.156.0.0/14",
    "13.224.0.0/12",
    "13.32.0.0/12",
    "138.128.136.0/21",
    "143.204.0.0/16",
    "15.204.0.0/16",
    "162.158.0.0/15",
    "162.210.192.0/21",
    "170.178.160.0/19",
    "172.64.0.0/13",
    "18.128.0.0/9",
    "185.107.56.0/24",
    "188.114.96.0/22",
];

const YOUTUBE: &[&str] = &[
    "1.0.0.0/9",
    "1.192.0.0/10",
    "101.64.0.0/10",
    "103.0.0.0/14",
    "103.100.128.0/19",
    "103.101.0.0/18",
    "103.103.128.0/17",
    "103.105.0.0/16",
    "103.106.192.0/18",
    "103.107.128.0/17",
    "103.108.0.0/17",
    "103.111.128.0/17",
    "103.111.64.0/19",
];

const TWITTER: &[&str] = &[
    "104.16.0.0/12",
    "104.244.40.0/21",
    "146.75.0.0/16",
    "151.101.0.0/16",
    "152.192.0.0/13",
    "162.158.0.0/15",
    "172.64.0.0/13",
    "192.229.128.0/17",
    "199.232.0.0/16",
];

const INSTAGRAM: &[&str] = &[
    "102.0.0.0/8",
    "103.200.28.0/22",
    "103.214.160.0/20",
    "103.226.224.0/19",
    "103.228.130.0/23",
    "103.230.0.0/17",
    "103.240.180.0/22",
    "103.246.240.0/21",
    "103.252.96.0/19",
];

const FACEBOOK: &[&str] = &[
    "102.0.0.0/8",
    "103.200.28.0/22",
    "103.226.224.0/19",
    "103.228.130.0/23",
    "103.230.0.0/17",
    "103.240.180.0/22",
    "103.246.240.0/21",
    "103.252.96.0/19",
];

const VIBER: &[&str] = &[
    "100.24.0.0/13",
    "104.16.0.0/12",
    "104.64.0.0/10",
    "107.20.0.0/14",
    "108.136.0.0/14",
    "108.156.0.0/14",
];

const TIKTOK: &[&str] = &[
    "1.192.0.0/10",
    "101.0.0.0/11",
    "101.32.0.0/12",
    "101.64.0.0/10",
    "103.105.128.0/17",
    "103.136.0.0/16",
];

const SPOTIFY: &[&str] = &[
    "104.154.0.0/15",
    "104.64.0.0/10",
    "146.75.0.0/16",
    "151.101.0.0/16",
    "173.222.0.0/15",
    "18.128.0.0/9",
    "184.24.0.0/13",
    "184.50.0.0/15",
];

const ZETFLIX: &[&str] = &[
    "104.16.0.0/12",
    "172.64.0.0/13",
    "188.114.96.0/22",
];

const NNMCLUB: &[&str] = &[
    "104.16.0.0/12",
    "172.64.0.0/13",
    "188.114.96.0/22",
];

const RUTRACKER: &[&str] = &[
    "104.16.0.0/12",
    "162.158.0.0/15",
    "172.64.0.0/13",
    "185.81.128.0/23",
    "188.114.96.0/22",
];

const KINOZAL: &[&str] = &[
    "104.16.0.0/12",
    "172.64.0.0/13",
    "188.114.96.0/22",
];

const COPILOT: &[&str] = &[
    "104.208.0.0/13",
    "104.40.0.0/13",
    "104.64.0.0/10",
    "13.104.0.0/14",
    "13.64.0.0/11",
    "131.253.32.0/20",
    "138.91.0.0/16",
];

const CANVA: &[&str] = &[
    "104.16.0.0/12",
    "172.64.0.0/13",
    "188.114.96.0/22",
    "216.239.32.0/19",
];

const PATREON: &[&str] = &[
    "103.200.28.0/22",
    "103.214.160.0/20",
    "103.226.224.0/19",
    "103.228.130.0/23",
    "103.230.0.0/17",
    "103.240.180.0/22",
    "103.246.240.0/21",
];

const ANIMEGO: &[&str] = &[
    "185.178.208.0/22",
    "49.13.80.0/20",
];

const JUTSU: &[&str] = &[
    "104.16.0.0/12",
    "144.76.0.0/16",
    "172.64.0.0/13",
    "188.114.96.0/22",
];

const YUMMIANIME: &[&str] = &[
    "104.16.0.0/12",
    "172.64.0.0/13",
    "188.114.96.0/22",
    "45.95.201.0/24",
    "50.7.0.0/16",
    "67.159.0.0/18",
];

const PORNHUB: &[&str] = &[
    "152.192.0.0/13",
    "208.99.64.0/19",
    "216.18.160.0/19",
    "64.210.128.0/19",
    "64.88.240.0/20",
    "66.254.96.0/19",
];

const XVIDEOS: &[&str] = &[
    "104.16.0.0/12",
    "138.199.0.0/18",
    "143.244.32.0/19",
    "156.146.32.0/19",
    "169.150.192.0/18",
    "172.64.0.0/13",
];

const PORNOLAB: &[&str] = &[
    "13.224.0.0/12",
    "18.128.0.0/9",
    "185.110.92.0/24",
    "185.61.148.0/23",
    "54.160.0.0/11",
];

const FICBOOK: &[&str] = &[
    "104.16.0.0/12",
    "172.64.0.0/13",
    "185.206.164.0/22",
];

const BESTCHANGE: &[&str] = &[
    "162.19.0.0/16",
    "188.124.37.0/24",
    "54.36.0.0/15",
];

/// Built-in service table, in the order the UI lists services
const BUILTIN_SERVICES: &[(&str, &[&str])] = &[
    ("discord", DISCORD),
    ("youtube", YOUTUBE),
    ("twitter", TWITTER),
    ("instagram", INSTAGRAM),
    ("facebook", FACEBOOK),
    ("viber", VIBER),
    ("tiktok", TIKTOK),
    ("spotify", SPOTIFY),
    ("zetflix", ZETFLIX),
    ("nnmclub", NNMCLUB),
    ("rutracker", RUTRACKER),
    ("kinozal", KINOZAL),
    ("copilot", COPILOT),
    ("canva", CANVA),
    ("patreon", PATREON),
    ("animego", ANIMEGO),
    ("jutsu", JUTSU),
    ("yummyanime", YUMMIANIME),
    ("pornhub", PORNHUB),
    ("xvideos", XVIDEOS),
    ("pornolab", PORNOLAB),
    ("ficbook", FICBOOK),
    ("bestchange", BESTCHANGE),
];
