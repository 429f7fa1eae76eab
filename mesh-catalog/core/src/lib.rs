#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Types shared between the mesh catalog and its consumers.
//!
//! Everything here is a plain value: services and identities read from the
//! cluster, and the inbound policy computed for a proxy.

mod identity;
pub mod inbound;
mod provider;
pub mod routes;
mod service;

pub use self::{
    identity::{Principal, PrincipalFormat, ServiceAccount, TrustDomains},
    provider::MeshProvider,
    service::{AppProtocol, MeshService, WeightedCluster},
};

/// The default cluster DNS domain.
pub const DEFAULT_DNS_DOMAIN: &str = "cluster.local";

/// The address at which a proxy reaches the workload it fronts.
pub const LOCALHOST: &str = "127.0.0.1";
