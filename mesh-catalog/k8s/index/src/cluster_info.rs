use mesh_catalog_core::DEFAULT_DNS_DOMAIN;
use std::{fmt, str::FromStr};

/// Holds cluster metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterInfo {
    /// E.g. "cluster.local"
    pub dns_domain: String,

    /// How access rules that name a missing route are handled.
    pub route_references: RouteReferences,
}

/// Determines how a reference to a route document or match that does not
/// exist is handled.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RouteReferences {
    /// The reference contributes no routes.
    #[default]
    Lenient,

    /// The computation fails.
    Strict,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid route reference mode {0:?}: expected 'lenient' or 'strict'")]
pub struct InvalidRouteReferences(String);

// === impl ClusterInfo ===

impl Default for ClusterInfo {
    fn default() -> Self {
        Self {
            dns_domain: DEFAULT_DNS_DOMAIN.to_string(),
            route_references: RouteReferences::default(),
        }
    }
}

// === impl RouteReferences ===

impl FromStr for RouteReferences {
    type Err = InvalidRouteReferences;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            s => Err(InvalidRouteReferences(s.to_string())),
        }
    }
}

impl fmt::Display for RouteReferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lenient => f.write_str("lenient"),
            Self::Strict => f.write_str("strict"),
        }
    }
}
