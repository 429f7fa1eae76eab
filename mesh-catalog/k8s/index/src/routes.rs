use ahash::AHashMap as HashMap;
use mesh_catalog_core::routes::{HttpRouteMatch, PathMatchType, WILDCARD_METHOD, WILDCARD_PATH};
use mesh_catalog_k8s_api::{
    specs::{HTTPRouteGroup, HttpMatch},
    ResourceExt,
};
use std::fmt;
use tracing::warn;

/// Indexes the named matches of every `HTTPRouteGroup`.
///
/// Matches that cannot be parsed are kept alongside the reason they are
/// invalid so that only the rules that reference them fail to resolve.
#[derive(Clone, Debug, Default)]
pub struct RouteIndex {
    by_group: HashMap<TrafficSpecName, HashMap<String, IndexedMatch>>,
}

pub type IndexedMatch = Result<HttpRouteMatch, InvalidMatch>;

/// Identifies a route document, e.g. `HTTPRouteGroup/ns1/rule-1`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TrafficSpecName(String);

#[derive(Clone, Debug, thiserror::Error)]
pub enum InvalidMatch {
    #[error("invalid path regex: {0}")]
    PathRegex(#[from] regex::Error),

    #[error("invalid method {0:?}")]
    Method(String),
}

// === impl RouteIndex ===

impl RouteIndex {
    /// Builds an index over all route groups.
    ///
    /// A match whose path pattern is not a valid regular expression, or whose
    /// method is not a valid HTTP method token, is recorded as invalid.
    pub fn build<'g>(groups: impl IntoIterator<Item = &'g HTTPRouteGroup>) -> Self {
        let mut by_group = HashMap::new();
        for group in groups {
            let namespace = group.namespace().unwrap_or_default();
            let name = group.name_any();

            let mut matches = HashMap::with_capacity(group.spec.matches.len());
            for m in &group.spec.matches {
                let route = try_match(m);
                if let Err(error) = &route {
                    warn!(%namespace, %name, match_name = %m.name, %error, "Invalid route match");
                }
                matches.insert(m.name.clone(), route);
            }

            by_group.insert(TrafficSpecName::http_route_group(&namespace, &name), matches);
        }

        Self { by_group }
    }

    /// Returns the matches of the named route group, if it exists.
    pub fn group(&self, namespace: &str, name: &str) -> Option<&HashMap<String, IndexedMatch>> {
        self.by_group
            .get(&TrafficSpecName::http_route_group(namespace, name))
    }
}

fn try_match(
    HttpMatch {
        path_regex,
        methods,
        headers,
        ..
    }: &HttpMatch,
) -> Result<HttpRouteMatch, InvalidMatch> {
    let path = match path_regex.as_deref() {
        Some(path) if !path.is_empty() => {
            regex::Regex::new(path)?;
            path.to_string()
        }
        _ => WILDCARD_PATH.to_string(),
    };

    let methods = match methods.as_deref() {
        Some(methods) if !methods.is_empty() => methods
            .iter()
            .map(|m| method(m))
            .collect::<Result<Vec<_>, _>>()?,
        _ => vec![WILDCARD_METHOD.to_string()],
    };

    Ok(HttpRouteMatch {
        path,
        path_match_type: PathMatchType::Regex,
        methods,
        headers: headers.clone().unwrap_or_default(),
    })
}

fn method(m: &str) -> Result<String, InvalidMatch> {
    if m == WILDCARD_METHOD {
        return Ok(m.to_string());
    }
    http::Method::from_bytes(m.as_bytes())
        .map(|_| m.to_string())
        .map_err(|_| InvalidMatch::Method(m.to_string()))
}

// === impl TrafficSpecName ===

impl TrafficSpecName {
    pub fn http_route_group(namespace: &str, name: &str) -> Self {
        Self(format!("HTTPRouteGroup/{namespace}/{name}"))
    }
}

impl fmt::Display for TrafficSpecName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
