use crate::{routes::RouteIndex, Error, Result, RouteReferences};
use ahash::AHashMap as HashMap;
use mesh_catalog_core::routes::{HttpRouteMatch, TcpRouteMatch};
use mesh_catalog_k8s_api::{access::TrafficTargetRule, specs::TCPRoute, ResourceExt};
use tracing::debug;

/// Resolves the route references of `TrafficTarget` rules.
#[derive(Debug)]
pub struct RuleResolver<'a> {
    http: &'a RouteIndex,
    tcp: HashMap<(String, String), &'a TCPRoute>,
    references: RouteReferences,
}

/// The routes referenced by a set of rules.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedRoutes {
    pub http: Vec<HttpRouteMatch>,
    pub tcp: Vec<TcpRouteMatch>,
}

// === impl RuleResolver ===

impl<'a> RuleResolver<'a> {
    pub fn new(
        http: &'a RouteIndex,
        tcp_routes: &'a [TCPRoute],
        references: RouteReferences,
    ) -> Self {
        let tcp = tcp_routes
            .iter()
            .map(|r| ((r.namespace().unwrap_or_default(), r.name_any()), r))
            .collect();
        Self {
            http,
            tcp,
            references,
        }
    }

    /// Resolves `rules`, written in `namespace`, to route matches.
    ///
    /// Matches are returned in the order in which they are referenced. Fails
    /// if a referenced match could not be parsed.
    pub fn resolve(&self, rules: &[TrafficTargetRule], namespace: &str) -> Result<ResolvedRoutes> {
        let mut routes = ResolvedRoutes::default();
        for rule in rules {
            match rule {
                TrafficTargetRule::HttpRouteGroup { name, matches } => {
                    let Some(group) = self.http.group(namespace, name) else {
                        self.unresolved(rule.kind(), namespace, name, None)?;
                        continue;
                    };
                    for match_name in matches {
                        match group.get(match_name) {
                            Some(Ok(m)) => routes.http.push(m.clone()),
                            Some(Err(reason)) => {
                                return Err(Error::InvalidRouteGroup {
                                    namespace: namespace.to_string(),
                                    name: name.clone(),
                                    match_name: match_name.clone(),
                                    reason: reason.clone(),
                                })
                            }
                            None => {
                                self.unresolved(rule.kind(), namespace, name, Some(match_name))?
                            }
                        }
                    }
                }

                TrafficTargetRule::TcpRoute { name } => {
                    let Some(route) = self.tcp.get(&(namespace.to_string(), name.clone())) else {
                        self.unresolved(rule.kind(), namespace, name, None)?;
                        continue;
                    };
                    routes.tcp.extend(
                        route
                            .spec
                            .matches
                            .ports
                            .iter()
                            .map(|&port| TcpRouteMatch { port }),
                    );
                }
            }
        }
        Ok(routes)
    }

    fn unresolved(
        &self,
        kind: &'static str,
        namespace: &str,
        name: &str,
        match_name: Option<&String>,
    ) -> Result<()> {
        match self.references {
            RouteReferences::Lenient => {
                debug!(%kind, %namespace, %name, ?match_name, "Skipping unresolved route reference");
                Ok(())
            }
            RouteReferences::Strict => Err(Error::UnresolvedRoute {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
                match_name: match_name.cloned(),
            }),
        }
    }
}
