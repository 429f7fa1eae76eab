mod principals;

use crate::{ClusterInfo, MeshCatalog};
use mesh_catalog_core::{AppProtocol, MeshProvider, MeshService, ServiceAccount, TrustDomains};
use mesh_catalog_k8s_api::{
    self as k8s,
    access::{IdentityBindingSubject, TrafficTarget, TrafficTargetRule, TrafficTargetSpec},
    policy::{UpstreamTrafficSetting, UpstreamTrafficSettingSpec},
    specs::{HTTPRouteGroup, HttpMatch, HttpRouteGroupSpec, TCPRoute, TcpMatch, TcpRouteSpec},
    split::{TrafficSplit, TrafficSplitBackend, TrafficSplitSpec},
};

/// Serves a fixed set of resources.
#[derive(Clone, Debug, Default)]
struct FakeProvider {
    services: Vec<MeshService>,
    traffic_targets: Vec<TrafficTarget>,
    http_route_groups: Vec<HTTPRouteGroup>,
    tcp_routes: Vec<TCPRoute>,
    splits: Vec<TrafficSplit>,
    settings: Vec<UpstreamTrafficSetting>,
    trust_domains: TrustDomains,
    permissive: bool,
}

impl MeshProvider for FakeProvider {
    fn list_services(&self) -> Vec<MeshService> {
        self.services.clone()
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
        self.splits.clone()
    }

    fn list_upstream_traffic_settings(&self) -> Vec<UpstreamTrafficSetting> {
        self.settings.clone()
    }

    fn active_trust_domains(&self) -> TrustDomains {
        self.trust_domains.clone()
    }

    fn is_permissive_mode(&self) -> bool {
        self.permissive
    }
}

struct TestConfig {
    cluster: ClusterInfo,
    _tracing: tracing::subscriber::DefaultGuard,
}

impl TestConfig {
    fn catalog(&self, provider: FakeProvider) -> MeshCatalog<FakeProvider> {
        MeshCatalog::new(provider, self.cluster.clone())
    }

    fn init_tracing() -> tracing::subscriber::DefaultGuard {
        tracing::subscriber::set_default(
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_max_level(tracing::Level::TRACE)
                .finish(),
        )
    }
}

impl Default for TestConfig {
    fn default() -> TestConfig {
        Self {
            cluster: ClusterInfo::default(),
            _tracing: Self::init_tracing(),
        }
    }
}

fn mk_meta(ns: impl ToString, name: impl ToString) -> k8s::ObjectMeta {
    k8s::ObjectMeta {
        namespace: Some(ns.to_string()),
        name: Some(name.to_string()),
        ..Default::default()
    }
}

fn mk_service(ns: &str, name: &str, port: u16, protocol: AppProtocol) -> MeshService {
    MeshService {
        namespace: ns.to_string(),
        name: name.to_string(),
        port,
        target_port: port,
        protocol,
    }
}

fn sa(ns: &str, name: &str) -> ServiceAccount {
    ServiceAccount::new(ns, name)
}

fn cluster_local() -> TrustDomains {
    TrustDomains::new(["cluster.local"], false)
}

fn mk_traffic_target(
    ns: &str,
    name: &str,
    destination: &ServiceAccount,
    sources: impl IntoIterator<Item = ServiceAccount>,
    rules: impl IntoIterator<Item = TrafficTargetRule>,
) -> TrafficTarget {
    TrafficTarget {
        metadata: mk_meta(ns, name),
        spec: TrafficTargetSpec {
            destination: IdentityBindingSubject::service_account(
                &destination.namespace,
                &destination.name,
            ),
            sources: sources
                .into_iter()
                .map(|s| IdentityBindingSubject::service_account(s.namespace, s.name))
                .collect(),
            rules: rules.into_iter().collect(),
        },
    }
}

fn http_rule(name: &str, matches: impl IntoIterator<Item = &'static str>) -> TrafficTargetRule {
    TrafficTargetRule::HttpRouteGroup {
        name: name.to_string(),
        matches: matches.into_iter().map(String::from).collect(),
    }
}

fn tcp_rule(name: &str) -> TrafficTargetRule {
    TrafficTargetRule::TcpRoute {
        name: name.to_string(),
    }
}

fn mk_route_group(
    ns: &str,
    name: &str,
    matches: impl IntoIterator<Item = HttpMatch>,
) -> HTTPRouteGroup {
    HTTPRouteGroup {
        metadata: mk_meta(ns, name),
        spec: HttpRouteGroupSpec {
            matches: matches.into_iter().collect(),
        },
    }
}

fn mk_match(name: &str, path: &str, methods: impl IntoIterator<Item = &'static str>) -> HttpMatch {
    HttpMatch {
        name: name.to_string(),
        path_regex: Some(path.to_string()),
        methods: Some(methods.into_iter().map(String::from).collect()),
        headers: None,
    }
}

fn mk_tcp_route(ns: &str, name: &str, ports: impl IntoIterator<Item = u16>) -> TCPRoute {
    TCPRoute {
        metadata: mk_meta(ns, name),
        spec: TcpRouteSpec {
            matches: TcpMatch {
                name: None,
                ports: ports.into_iter().collect(),
            },
        },
    }
}

fn mk_split(
    ns: &str,
    name: &str,
    apex: &str,
    backends: impl IntoIterator<Item = (&'static str, u32)>,
) -> TrafficSplit {
    TrafficSplit {
        metadata: mk_meta(ns, name),
        spec: TrafficSplitSpec {
            service: apex.to_string(),
            backends: backends
                .into_iter()
                .map(|(service, weight)| TrafficSplitBackend {
                    service: service.to_string(),
                    weight,
                })
                .collect(),
        },
    }
}

fn mk_upstream_traffic_setting(
    ns: &str,
    name: &str,
    spec: UpstreamTrafficSettingSpec,
) -> UpstreamTrafficSetting {
    UpstreamTrafficSetting {
        metadata: mk_meta(ns, name),
        spec,
    }
}
