use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Rate limits applied to all traffic for an upstream host.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitSpec {
    pub local: Option<LocalRateLimitSpec>,
    pub global: Option<GlobalRateLimitSpec>,
}

/// Limits enforced by each proxy independently.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocalRateLimitSpec {
    pub tcp: Option<TcpLocalRateLimitSpec>,
    pub http: Option<HttpLocalRateLimitSpec>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TcpLocalRateLimitSpec {
    pub connections: u32,
    pub unit: RateLimitUnit,
    #[serde(default)]
    pub burst: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpLocalRateLimitSpec {
    pub requests: u32,
    pub unit: RateLimitUnit,
    #[serde(default)]
    pub burst: u32,

    /// The status returned to rate limited requests. Defaults to 429 in the
    /// data plane when unset.
    pub response_status_code: Option<u16>,

    #[serde(default)]
    pub response_headers_to_add: Vec<HttpHeaderValue>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitUnit {
    Second,
    Minute,
    Hour,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpHeaderValue {
    pub name: String,
    pub value: String,
}

/// Limits enforced by an external rate limit service shared by all proxies.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GlobalRateLimitSpec {
    pub tcp: Option<TcpGlobalRateLimitSpec>,
    pub http: Option<HttpGlobalRateLimitSpec>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TcpGlobalRateLimitSpec {
    pub rate_limit_service: RateLimitServiceSpec,
    #[serde(default)]
    pub domain: String,
    pub fail_open: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpGlobalRateLimitSpec {
    pub rate_limit_service: RateLimitServiceSpec,
    #[serde(default)]
    pub domain: String,
    pub fail_open: Option<bool>,
}

/// The address of an external rate limit service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitServiceSpec {
    pub host: String,
    pub port: u16,
}

/// Rate limits applied to requests matching a single route.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpPerRouteRateLimitSpec {
    pub local: Option<HttpLocalRateLimitSpec>,
    pub global: Option<HttpGlobalPerRouteRateLimitSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpGlobalPerRouteRateLimitSpec {
    #[serde(default)]
    pub descriptors: Vec<HttpGlobalRateLimitDescriptor>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpGlobalRateLimitDescriptor {
    pub entries: Vec<DescriptorEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorEntry {
    pub key: String,
    pub value: String,
}

// === impl RateLimitSpec ===

impl RateLimitSpec {
    /// Iterates over the external rate limit services referenced by this spec.
    pub fn global_services(&self) -> impl Iterator<Item = &RateLimitServiceSpec> {
        let global = self.global.as_ref();
        let tcp = global
            .and_then(|g| g.tcp.as_ref())
            .map(|tcp| &tcp.rate_limit_service);
        let http = global
            .and_then(|g| g.http.as_ref())
            .map(|http| &http.rate_limit_service);
        tcp.into_iter().chain(http)
    }
}
