use crate::{
    identity::{self, SourceIdentity},
    ratelimit,
    routes::RouteIndex,
    rules::RuleResolver,
    split, ClusterInfo, MeshCatalog, Result,
};
use ahash::AHashSet as HashSet;
use mesh_catalog_core::{
    inbound::{
        InboundMeshTrafficPolicy, InboundTrafficPolicy, MeshClusterConfig, RouteWeightedClusters,
        TcpAuthorization, TrafficMatch,
    },
    routes::HttpRouteMatch,
    MeshProvider, MeshService, Principal, ServiceAccount, TrustDomains, WeightedCluster, LOCALHOST,
};
use mesh_catalog_k8s_api::{
    access::TrafficTarget, policy::UpstreamTrafficSetting, specs::{HTTPRouteGroup, TCPRoute},
    split::TrafficSplit, ResourceExt,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument, warn};

/// The name of the TCP authorization granted to all clients in permissive
/// mode.
pub const PERMISSIVE_TCP_AUTHORIZATION: &str = "permissive";

const LOCAL_CLUSTER_WEIGHT: u32 = 100;

/// A point-in-time copy of the provider's resources.
///
/// Each catalog operation reads its inputs exactly once so that the trust
/// domains and mesh mode cannot change partway through a computation.
struct Inputs {
    permissive: bool,
    trust_domains: TrustDomains,
    traffic_targets: Vec<TrafficTarget>,
    http_route_groups: Vec<HTTPRouteGroup>,
    tcp_routes: Vec<TCPRoute>,
    splits: Vec<TrafficSplit>,
    settings: Vec<UpstreamTrafficSetting>,
}

/// Routes granted to a set of principals by a single access rule.
struct Grant {
    routes: Vec<HttpRouteMatch>,
    principals: BTreeSet<Principal>,
}

// === impl MeshCatalog ===

impl<P: MeshProvider> MeshCatalog<P> {
    /// Returns the clusters through which the proxy reaches its local
    /// services, their split apexes, and any external rate limit services.
    pub fn inbound_cluster_configs(&self, services: &[MeshService]) -> Vec<MeshClusterConfig> {
        let splits = self.provider.list_traffic_splits();
        let settings = self.provider.list_upstream_traffic_settings();
        cluster_configs(services, &splits, &settings)
    }

    /// Returns the HTTP virtual hosts served by the identity's services,
    /// keyed by the port on which they are served.
    pub fn inbound_http_route_configs_per_port(
        &self,
        identity: &ServiceAccount,
        services: &[MeshService],
    ) -> Result<BTreeMap<u16, Vec<InboundTrafficPolicy>>> {
        let inputs = Inputs::load(&self.provider);
        let index = RouteIndex::build(&inputs.http_route_groups);
        let rules = RuleResolver::new(&index, &inputs.tcp_routes, self.cluster.route_references);
        inputs.http_route_configs(&rules, &self.cluster, identity, services)
    }

    /// Returns a traffic match for each service, by which the proxy selects
    /// the filter chain for an inbound connection.
    pub fn inbound_traffic_matches(&self, services: &[MeshService]) -> Vec<TrafficMatch> {
        traffic_matches(services, &self.cluster.dns_domain)
    }

    /// Returns the clients allowed to open TCP connections to the identity's
    /// workloads, and the ports on which they may connect.
    pub fn inbound_tcp_authorizations(
        &self,
        identity: &ServiceAccount,
    ) -> Result<Vec<TcpAuthorization>> {
        let inputs = Inputs::load(&self.provider);
        let index = RouteIndex::build(&inputs.http_route_groups);
        let rules = RuleResolver::new(&index, &inputs.tcp_routes, self.cluster.route_references);
        inputs.tcp_authorizations(&rules, identity)
    }

    /// Computes the complete inbound policy for the identity's services from a
    /// single read of the provider's resources.
    #[instrument(skip_all, fields(%identity, services = services.len()))]
    pub fn inbound_mesh_traffic_policy(
        &self,
        identity: &ServiceAccount,
        services: &[MeshService],
    ) -> Result<InboundMeshTrafficPolicy> {
        let inputs = Inputs::load(&self.provider);
        let index = RouteIndex::build(&inputs.http_route_groups);
        let rules = RuleResolver::new(&index, &inputs.tcp_routes, self.cluster.route_references);

        let http_route_configs_per_port =
            inputs.http_route_configs(&rules, &self.cluster, identity, services)?;
        let tcp_authorizations = inputs.tcp_authorizations(&rules, identity)?;
        let policy = InboundMeshTrafficPolicy {
            http_route_configs_per_port,
            cluster_configs: cluster_configs(services, &inputs.splits, &inputs.settings),
            traffic_matches: traffic_matches(services, &self.cluster.dns_domain),
            tcp_authorizations,
        };
        debug!(
            hosts = policy.http_route_configs_per_port.values().map(Vec::len).sum::<usize>(),
            clusters = policy.cluster_configs.len(),
            "Computed inbound policy"
        );
        Ok(policy)
    }
}

// === impl Inputs ===

impl Inputs {
    fn load(provider: &impl MeshProvider) -> Self {
        Self {
            permissive: provider.is_permissive_mode(),
            trust_domains: provider.active_trust_domains(),
            traffic_targets: provider.list_traffic_targets(),
            http_route_groups: provider.list_http_route_groups(),
            tcp_routes: provider.list_tcp_routes(),
            splits: provider.list_traffic_splits(),
            settings: provider.list_upstream_traffic_settings(),
        }
    }

    fn http_route_configs(
        &self,
        rules: &RuleResolver<'_>,
        cluster: &ClusterInfo,
        identity: &ServiceAccount,
        services: &[MeshService],
    ) -> Result<BTreeMap<u16, Vec<InboundTrafficPolicy>>> {
        let grants = self.http_grants(rules, identity)?;

        let mut by_port = BTreeMap::<u16, Vec<InboundTrafficPolicy>>::new();
        for svc in services.iter().filter(|s| s.protocol.is_http()) {
            let apexes = split::apexes_for_backend(&self.splits, svc)
                .into_iter()
                .filter(|apex| *apex != svc.name)
                .map(|apex| svc.with_name(apex));

            let policies = by_port.entry(svc.target_port).or_default();
            for host in Some(svc.clone()).into_iter().chain(apexes) {
                let name = host.fqdn(&cluster.dns_domain);
                if policies.iter().any(|p| p.name == name) {
                    continue;
                }

                let mut policy = InboundTrafficPolicy::new(name, host.hostnames(&cluster.dns_domain));
                let local = WeightedCluster {
                    cluster_name: host.local_cluster_name(),
                    weight: LOCAL_CLUSTER_WEIGHT,
                };
                for grant in &grants {
                    for route in &grant.routes {
                        policy.add_rule(
                            RouteWeightedClusters::new(route.clone(), local.clone()),
                            grant.principals.iter().cloned(),
                        );
                    }
                }
                ratelimit::attach(&mut policy, &self.settings);
                policies.push(policy);
            }
        }

        Ok(by_port)
    }

    fn http_grants(&self, rules: &RuleResolver<'_>, identity: &ServiceAccount) -> Result<Vec<Grant>> {
        if self.permissive {
            return Ok(vec![Grant {
                routes: vec![HttpRouteMatch::wildcard()],
                principals: identity::principals_for(SourceIdentity::Any, &self.trust_domains),
            }]);
        }

        if self.trust_domains.is_empty() {
            warn!(%identity, "No active trust domains; no clients will be authorized");
        }

        let mut grants = Vec::new();
        for target in self.targets_for(identity) {
            let namespace = target.namespace().unwrap_or_default();
            let routes = rules.resolve(&target.spec.rules, &namespace)?;
            if routes.http.is_empty() {
                continue;
            }
            grants.push(Grant {
                routes: routes.http,
                principals: self.source_principals(target, &namespace),
            });
        }
        Ok(grants)
    }

    fn tcp_authorizations(
        &self,
        rules: &RuleResolver<'_>,
        identity: &ServiceAccount,
    ) -> Result<Vec<TcpAuthorization>> {
        if self.permissive {
            return Ok(vec![TcpAuthorization {
                name: PERMISSIVE_TCP_AUTHORIZATION.to_string(),
                ports: Vec::new(),
                allowed_principals: identity::principals_for(
                    SourceIdentity::Any,
                    &self.trust_domains,
                ),
            }]);
        }

        let mut authzs = Vec::new();
        for target in self.targets_for(identity) {
            let namespace = target.namespace().unwrap_or_default();
            let routes = rules.resolve(&target.spec.rules, &namespace)?;
            let ports = routes
                .tcp
                .iter()
                .map(|m| m.port)
                .collect::<BTreeSet<_>>();
            if ports.is_empty() {
                continue;
            }
            authzs.push(TcpAuthorization {
                name: format!("{}/{}", namespace, target.name_any()),
                ports: ports.into_iter().collect(),
                allowed_principals: self.source_principals(target, &namespace),
            });
        }
        Ok(authzs)
    }

    /// Iterates over the access rules whose destination is `identity`.
    fn targets_for<'i>(
        &'i self,
        identity: &'i ServiceAccount,
    ) -> impl Iterator<Item = &'i TrafficTarget> + 'i {
        self.traffic_targets.iter().filter(move |target| {
            let namespace = target.namespace().unwrap_or_default();
            identity::service_account(&target.spec.destination, &namespace).as_ref() == Some(identity)
        })
    }

    fn source_principals(&self, target: &TrafficTarget, namespace: &str) -> BTreeSet<Principal> {
        let mut principals = BTreeSet::new();
        for source in &target.spec.sources {
            match identity::service_account(source, namespace) {
                Some(sa) => principals.extend(identity::principals_for(
                    SourceIdentity::ServiceAccount(&sa),
                    &self.trust_domains,
                )),
                None => debug!(
                    target = %target.name_any(),
                    kind = %source.kind,
                    name = %source.name,
                    "Ignoring unsupported source"
                ),
            }
        }
        principals
    }
}

fn cluster_configs(
    services: &[MeshService],
    splits: &[TrafficSplit],
    settings: &[UpstreamTrafficSetting],
) -> Vec<MeshClusterConfig> {
    let mut configs = Vec::with_capacity(services.len());
    let mut names = HashSet::new();

    for svc in services {
        let apexes = if svc.protocol.is_http() {
            split::apexes_for_backend(splits, svc)
        } else {
            BTreeSet::new()
        };
        let hosts = Some(svc.clone())
            .into_iter()
            .chain(apexes.into_iter().map(|apex| svc.with_name(apex)));

        for host in hosts {
            let config = local_cluster(host);
            if names.insert(config.name.clone()) {
                configs.push(config);
            }
        }
    }

    for config in ratelimit::global_rate_limit_clusters(settings) {
        if names.insert(config.name.clone()) {
            configs.push(config);
        }
    }

    configs
}

fn local_cluster(svc: MeshService) -> MeshClusterConfig {
    MeshClusterConfig {
        name: svc.local_cluster_name(),
        address: LOCALHOST.to_string(),
        port: svc.target_port,
        protocol: svc.protocol.clone(),
        service: Some(svc),
    }
}

fn traffic_matches(services: &[MeshService], dns_domain: &str) -> Vec<TrafficMatch> {
    services
        .iter()
        .map(|svc| TrafficMatch {
            name: format!(
                "inbound_{}/{}_{}_{}",
                svc.namespace, svc.name, svc.target_port, svc.protocol
            ),
            destination_port: svc.target_port,
            destination_protocol: svc.protocol.clone(),
            server_names: vec![svc.fqdn(dns_domain)],
            cluster: svc.local_cluster_name(),
        })
        .collect()
}
