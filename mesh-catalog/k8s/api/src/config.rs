use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A root certificate published by the certificate manager.
///
/// While a root is being rotated, the outgoing and incoming roots are both
/// present and both of their trust domains are in effect.
#[derive(Clone, Debug, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "config.openservicemesh.io",
    version = "v1alpha2",
    kind = "MeshRootCertificate",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct MeshRootCertificateSpec {
    pub trust_domain: String,

    pub intent: MeshRootCertificateIntent,

    #[serde(default)]
    pub spiffe_enabled: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MeshRootCertificateIntent {
    /// Used to issue and validate certificates.
    Active,

    /// Used to validate certificates only.
    Passive,

    Inactive,
}

impl MeshRootCertificateIntent {
    /// Indicates whether identities under this root must be accepted.
    #[inline]
    pub fn is_trusted(&self) -> bool {
        matches!(self, Self::Active | Self::Passive)
    }

    /// Indicates whether new certificates are issued under this root.
    #[inline]
    pub fn is_issuing(&self) -> bool {
        matches!(self, Self::Active)
    }
}
