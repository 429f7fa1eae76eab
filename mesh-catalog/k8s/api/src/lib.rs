#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Resource types consumed by the mesh catalog.
//!
//! The access, specs and split groups follow the Service Mesh Interface
//! resources; `policy` and `config` hold the mesh's own extensions for
//! upstream traffic settings and root certificates.

pub mod access;
pub mod config;
pub mod policy;
pub mod specs;
pub mod split;

pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
pub use kube::{Resource, ResourceExt};

/// The only subject kind that may be bound to traffic.
pub const SERVICE_ACCOUNT_KIND: &str = "ServiceAccount";
