use super::{HttpPerRouteRateLimitSpec, RateLimitSpec};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Overrides traffic settings for requests addressed to a single upstream
/// host.
#[derive(Clone, Debug, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "policy.openservicemesh.io",
    version = "v1alpha1",
    kind = "UpstreamTrafficSetting",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamTrafficSettingSpec {
    /// The fully-qualified host the settings apply to, e.g.
    /// `s1.ns1.svc.cluster.local`.
    pub host: String,

    pub rate_limit: Option<RateLimitSpec>,

    #[serde(default, rename = "httpRoutes")]
    pub http_routes: Vec<HttpRouteSpec>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpRouteSpec {
    /// Compared verbatim with the path of an inbound route.
    pub path: String,

    pub rate_limit: Option<HttpPerRouteRateLimitSpec>,
}
