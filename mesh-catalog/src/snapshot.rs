use anyhow::{Context, Result};
use mesh_catalog_core::{MeshProvider, MeshService, ServiceAccount, TrustDomains};
use mesh_catalog_k8s_api::{
    access::TrafficTarget,
    config::MeshRootCertificate,
    policy::UpstreamTrafficSetting,
    specs::{HTTPRouteGroup, TCPRoute},
    split::TrafficSplit,
};
use mesh_catalog_k8s_index::identity;
use serde::Deserialize;
use std::path::Path;

/// A point-in-time export of a mesh's resources.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub permissive: bool,

    /// Overrides the trust domains derived from `meshRootCertificates`.
    #[serde(default)]
    pub trust_domains: Option<TrustDomains>,

    #[serde(default)]
    pub mesh_root_certificates: Vec<MeshRootCertificate>,

    #[serde(default)]
    pub workloads: Vec<Workload>,

    #[serde(default)]
    pub traffic_targets: Vec<TrafficTarget>,

    #[serde(default)]
    pub http_route_groups: Vec<HTTPRouteGroup>,

    #[serde(default)]
    pub tcp_routes: Vec<TCPRoute>,

    #[serde(default)]
    pub traffic_splits: Vec<TrafficSplit>,

    #[serde(default)]
    pub upstream_traffic_settings: Vec<UpstreamTrafficSetting>,
}

/// The services backed by a single identity's proxies.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workload {
    pub identity: ServiceAccount,

    #[serde(default)]
    pub services: Vec<MeshService>,
}

// === impl Snapshot ===

impl Snapshot {
    /// Reads a snapshot from a JSON file, or from YAML for any other
    /// extension.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let snapshot = if is_json {
            serde_json::from_str(&contents)?
        } else {
            serde_yaml::from_str(&contents)?
        };
        Ok(snapshot)
    }
}

impl MeshProvider for Snapshot {
    fn list_services(&self) -> Vec<MeshService> {
        self.workloads
            .iter()
            .flat_map(|w| w.services.iter().cloned())
            .collect()
    }

    fn list_traffic_targets(&self) -> Vec<TrafficTarget> {
        self.traffic_targets.clone()
    }

    fn list_http_route_groups(&self) -> Vec<HTTPRouteGroup> {
        self.http_route_groups.clone()
    }

    fn list_tcp_routes(&self) -> Vec<TCPRoute> {
        self.tcp_routes.clone()
    }

    fn list_traffic_splits(&self) -> Vec<TrafficSplit> {
        self.traffic_splits.clone()
    }

    fn list_upstream_traffic_settings(&self) -> Vec<UpstreamTrafficSetting> {
        self.upstream_traffic_settings.clone()
    }

    fn active_trust_domains(&self) -> TrustDomains {
        match &self.trust_domains {
            Some(domains) => domains.clone(),
            None => identity::trust_domains(&self.mesh_root_certificates),
        }
    }

    fn is_permissive_mode(&self) -> bool {
        self.permissive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_catalog_core::AppProtocol;

    const SNAPSHOT: &str = r#"
meshRootCertificates:
- metadata:
    name: root-1
    namespace: osm-system
  spec:
    trustDomain: cluster.local
    intent: passive
- metadata:
    name: root-2
    namespace: osm-system
  spec:
    trustDomain: cluster.new
    intent: active
workloads:
- identity:
    namespace: ns1
    name: sa1
  services:
  - namespace: ns1
    name: s1
    port: 80
    targetPort: 8080
    protocol: http
trafficTargets:
- metadata:
    name: tt-1
    namespace: ns1
  spec:
    destination:
      kind: ServiceAccount
      name: sa1
      namespace: ns1
    sources:
    - kind: ServiceAccount
      name: sa2
      namespace: ns2
    rules:
    - kind: HTTPRouteGroup
      name: rule-1
      matches: [route-1]
httpRouteGroups:
- metadata:
    name: rule-1
    namespace: ns1
  spec:
    matches:
    - name: route-1
      pathRegex: /get
      methods: [GET]
"#;

    #[test]
    fn decodes_snapshot() {
        let snapshot = serde_yaml::from_str::<Snapshot>(SNAPSHOT).expect("snapshot must decode");
        assert!(!snapshot.is_permissive_mode());
        assert_eq!(
            snapshot.active_trust_domains(),
            TrustDomains::new(["cluster.local", "cluster.new"], false)
        );

        let services = snapshot.list_services();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].target_port, 8080);
        assert_eq!(services[0].protocol, AppProtocol::Http);
        assert_eq!(snapshot.list_traffic_targets().len(), 1);
        assert_eq!(snapshot.list_http_route_groups().len(), 1);
        assert!(snapshot.list_tcp_routes().is_empty());
    }

    #[test]
    fn explicit_trust_domains_take_precedence() {
        let snapshot = Snapshot {
            trust_domains: Some(TrustDomains::new(["example.com"], true)),
            ..serde_yaml::from_str(SNAPSHOT).unwrap()
        };
        assert_eq!(
            snapshot.active_trust_domains(),
            TrustDomains::new(["example.com"], true)
        );
    }
}
