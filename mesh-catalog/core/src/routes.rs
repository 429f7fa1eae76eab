use serde::Serialize;
use std::collections::BTreeMap;

/// The path pattern that matches every request.
pub const WILDCARD_PATH: &str = ".*";

/// The method list entry that matches every method.
pub const WILDCARD_METHOD: &str = "*";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathMatchType {
    Regex,
    Prefix,
    Exact,
}

/// Matches HTTP requests by path, method and headers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRouteMatch {
    pub path: String,
    pub path_match_type: PathMatchType,
    pub methods: Vec<String>,

    /// Header values that must match exactly.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

/// Identifies structurally equal [`HttpRouteMatch`]es.
///
/// Rules whose matches have equal keys are merged.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteMatchKey {
    path_match_type: PathMatchType,
    path: String,
    methods: Vec<String>,
    headers: Vec<(String, String)>,
}

/// Matches TCP connections by destination port.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpRouteMatch {
    pub port: u16,
}

// === impl HttpRouteMatch ===

impl HttpRouteMatch {
    /// Matches every request.
    pub fn wildcard() -> Self {
        Self {
            path: WILDCARD_PATH.to_string(),
            path_match_type: PathMatchType::Regex,
            methods: vec![WILDCARD_METHOD.to_string()],
            headers: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> RouteMatchKey {
        RouteMatchKey {
            path_match_type: self.path_match_type,
            path: self.path.clone(),
            methods: self.methods.clone(),
            headers: self
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;

    #[test]
    fn keys_compare_structurally() {
        let get = HttpRouteMatch {
            path: "/get".to_string(),
            path_match_type: PathMatchType::Regex,
            methods: vec!["GET".to_string()],
            headers: btreemap! { "foo".to_string() => "bar".to_string() },
        };
        assert_eq!(get.key(), get.clone().key());

        let other_headers = HttpRouteMatch {
            headers: btreemap! { "foo".to_string() => "baz".to_string() },
            ..get.clone()
        };
        assert_ne!(get.key(), other_headers.key());

        let exact = HttpRouteMatch {
            path_match_type: PathMatchType::Exact,
            ..get.clone()
        };
        assert_ne!(get.key(), exact.key());
    }

    #[test]
    fn wildcard() {
        let m = HttpRouteMatch::wildcard();
        assert_eq!(m.path, ".*");
        assert_eq!(m.path_match_type, PathMatchType::Regex);
        assert_eq!(m.methods, vec!["*"]);
        assert!(m.headers.is_empty());
    }
}
