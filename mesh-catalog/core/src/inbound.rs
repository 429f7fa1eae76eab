use crate::{routes::HttpRouteMatch, AppProtocol, MeshService, Principal, WeightedCluster};
use mesh_catalog_k8s_api::policy::{HttpPerRouteRateLimitSpec, RateLimitSpec};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Inbound policy for the services backed by one identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMeshTrafficPolicy {
    /// Virtual hosts keyed by the target port on which they are served.
    pub http_route_configs_per_port: BTreeMap<u16, Vec<InboundTrafficPolicy>>,
    pub cluster_configs: Vec<MeshClusterConfig>,
    pub traffic_matches: Vec<TrafficMatch>,
    pub tcp_authorizations: Vec<TcpAuthorization>,
}

/// An inbound virtual host: the routes and authorizations for requests
/// addressed to one service's hostnames.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundTrafficPolicy {
    pub name: String,
    pub hostnames: Vec<String>,
    pub rules: Vec<Rule>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitSpec>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub route: RouteWeightedClusters,
    pub allowed_principals: BTreeSet<Principal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteWeightedClusters {
    pub http_route_match: HttpRouteMatch,
    pub weighted_clusters: BTreeSet<WeightedCluster>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<HttpPerRouteRateLimitSpec>,
}

/// A cluster the proxy may forward inbound traffic to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshClusterConfig {
    pub name: String,

    /// The local service behind the cluster. Unset for external clusters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<MeshService>,

    pub address: String,
    pub port: u16,
    pub protocol: AppProtocol,
}

/// Matches inbound connections by destination port and server name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficMatch {
    pub name: String,
    pub destination_port: u16,
    pub destination_protocol: AppProtocol,
    pub server_names: Vec<String>,
    pub cluster: String,
}

/// Authorizes clients to open connections on a set of ports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpAuthorization {
    pub name: String,

    /// An empty list authorizes every port.
    pub ports: Vec<u16>,

    pub allowed_principals: BTreeSet<Principal>,
}

// === impl InboundTrafficPolicy ===

impl InboundTrafficPolicy {
    pub fn new(name: impl Into<String>, hostnames: Vec<String>) -> Self {
        Self {
            name: name.into(),
            hostnames,
            rules: Vec::new(),
            rate_limit: None,
        }
    }

    /// Adds a rule for `route`, or, if a rule with a structurally equal match
    /// already exists, extends that rule's principals.
    pub fn add_rule(
        &mut self,
        route: RouteWeightedClusters,
        principals: impl IntoIterator<Item = Principal>,
    ) {
        let key = route.http_route_match.key();
        if let Some(rule) = self
            .rules
            .iter_mut()
            .find(|r| r.route.http_route_match.key() == key)
        {
            rule.allowed_principals.extend(principals);
            rule.route
                .weighted_clusters
                .extend(route.weighted_clusters);
            return;
        }

        self.rules.push(Rule {
            route,
            allowed_principals: principals.into_iter().collect(),
        });
    }
}

// === impl RouteWeightedClusters ===

impl RouteWeightedClusters {
    pub fn new(http_route_match: HttpRouteMatch, cluster: WeightedCluster) -> Self {
        Self {
            http_route_match,
            weighted_clusters: Some(cluster).into_iter().collect(),
            rate_limit: None,
        }
    }
}
