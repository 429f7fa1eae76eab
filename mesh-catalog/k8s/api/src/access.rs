use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Grants a set of source identities access to a destination identity over a
/// set of routes.
#[derive(Clone, Debug, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "access.smi-spec.io",
    version = "v1alpha3",
    kind = "TrafficTarget",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct TrafficTargetSpec {
    pub destination: IdentityBindingSubject,

    #[serde(default)]
    pub sources: Vec<IdentityBindingSubject>,

    #[serde(default)]
    pub rules: Vec<TrafficTargetRule>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityBindingSubject {
    pub kind: String,
    pub name: String,

    /// Defaults to the namespace of the `TrafficTarget`.
    pub namespace: Option<String>,
}

/// References the routes over which a `TrafficTarget` grants access.
///
/// The set of route kinds is closed, so unknown kinds are rejected when the
/// resource is decoded.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(tag = "kind")]
pub enum TrafficTargetRule {
    #[serde(rename = "HTTPRouteGroup")]
    HttpRouteGroup {
        name: String,
        #[serde(default)]
        matches: Vec<String>,
    },

    #[serde(rename = "TCPRoute")]
    TcpRoute { name: String },
}

// === impl IdentityBindingSubject ===

impl IdentityBindingSubject {
    pub fn service_account(namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            kind: crate::SERVICE_ACCOUNT_KIND.to_string(),
            name: name.to_string(),
            namespace: Some(namespace.to_string()),
        }
    }

    #[inline]
    pub fn is_service_account(&self) -> bool {
        self.kind == crate::SERVICE_ACCOUNT_KIND
    }

    /// Returns the subject's namespace, falling back to the namespace of the
    /// binding resource.
    pub fn namespace_or<'a>(&'a self, default_ns: &'a str) -> &'a str {
        self.namespace.as_deref().unwrap_or(default_ns)
    }
}

// === impl TrafficTargetRule ===

impl TrafficTargetRule {
    pub fn name(&self) -> &str {
        match self {
            Self::HttpRouteGroup { name, .. } | Self::TcpRoute { name } => name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::HttpRouteGroup { .. } => "HTTPRouteGroup",
            Self::TcpRoute { .. } => "TCPRoute",
        }
    }
}
