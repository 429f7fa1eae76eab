use mesh_catalog_core::{inbound::{InboundTrafficPolicy, MeshClusterConfig}, AppProtocol};
use mesh_catalog_k8s_api::policy::UpstreamTrafficSetting;
use std::collections::BTreeSet;

/// Attaches the rate limits of the setting whose host is the policy's name.
///
/// Hosts and route paths are compared verbatim.
pub fn attach(policy: &mut InboundTrafficPolicy, settings: &[UpstreamTrafficSetting]) {
    let Some(setting) = settings.iter().find(|s| s.spec.host == policy.name) else {
        return;
    };

    if let Some(rl) = setting.spec.rate_limit.clone() {
        policy.rate_limit = Some(rl);
    }

    for rule in &mut policy.rules {
        let route = &mut rule.route;
        if let Some(limit) = setting
            .spec
            .http_routes
            .iter()
            .find(|r| r.path == route.http_route_match.path)
            .and_then(|r| r.rate_limit.clone())
        {
            route.rate_limit = Some(limit);
        }
    }
}

/// Returns a cluster for each distinct external rate limit service referenced
/// by any setting.
pub fn global_rate_limit_clusters(settings: &[UpstreamTrafficSetting]) -> Vec<MeshClusterConfig> {
    let mut seen = BTreeSet::new();
    settings
        .iter()
        .filter_map(|s| s.spec.rate_limit.as_ref())
        .flat_map(|rl| rl.global_services())
        .filter(|svc| seen.insert((svc.host.clone(), svc.port)))
        .map(|svc| MeshClusterConfig {
            name: format!("{}|{}", svc.host, svc.port),
            service: None,
            address: svc.host.clone(),
            port: svc.port,
            protocol: AppProtocol::H2c,
        })
        .collect()
}
