//! Mesh Catalog
//!
//! The catalog compiles a mesh's declarative access and traffic-shaping
//! resources into the inbound configuration of a single workload's proxy. It
//! joins the following resources, all read from a [`MeshProvider`] snapshot:
//!
//! - A `TrafficTarget` grants source identities access to a destination
//!   identity, through the named matches of `HTTPRouteGroup`s or the ports of
//!   `TCPRoute`s.
//! - A `TrafficSplit` gives an apex service name to a set of backends. Inbound
//!   proxies must accept requests addressed to the apex as well as to the
//!   backend itself.
//! - An `UpstreamTrafficSetting` attaches rate limits to a service's virtual
//!   host and to individual routes.
//! - The active trust domains determine the principals under which source
//!   identities are authorized. While a root certificate rotates, each source
//!   is authorized in every active domain.
//!
//! ```text
//! [ TrafficTarget ] -> [ HTTPRouteGroup | TCPRoute ]
//!        |
//!        v
//! [ MeshService ] <- [ TrafficSplit ]    [ UpstreamTrafficSetting ]
//! ```
//!
//! Every computation reads a fresh snapshot from the provider and holds no
//! state between calls, so a single catalog may be shared by concurrent
//! callers.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod cluster_info;
pub mod identity;
mod inbound;
pub mod ratelimit;
pub mod routes;
pub mod rules;
pub mod split;

#[cfg(test)]
mod tests;

pub use self::{
    cluster_info::{ClusterInfo, InvalidRouteReferences, RouteReferences},
    inbound::PERMISSIVE_TCP_AUTHORIZATION,
    routes::InvalidMatch,
};
use mesh_catalog_core::MeshProvider;

/// Computes inbound proxy configuration from a provider's resources.
#[derive(Debug)]
pub struct MeshCatalog<P> {
    provider: P,
    cluster: ClusterInfo,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTPRouteGroup {namespace}/{name} match {match_name:?} is invalid: {reason}")]
    InvalidRouteGroup {
        namespace: String,
        name: String,
        match_name: String,
        #[source]
        reason: InvalidMatch,
    },

    #[error("{kind} {namespace}/{name}{} does not exist", match_suffix(.match_name))]
    UnresolvedRoute {
        kind: &'static str,
        namespace: String,
        name: String,
        match_name: Option<String>,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

fn match_suffix(match_name: &Option<String>) -> String {
    match match_name {
        Some(m) => format!(" match {m:?}"),
        None => String::new(),
    }
}

// === impl MeshCatalog ===

impl<P: MeshProvider> MeshCatalog<P> {
    pub fn new(provider: P, cluster: ClusterInfo) -> Self {
        Self { provider, cluster }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn cluster_info(&self) -> &ClusterInfo {
        &self.cluster
    }
}
