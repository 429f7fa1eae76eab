//! Relates services to the traffic splits in their namespace.
//!
//! A service may back one or more splits and may itself be the apex of a
//! split; the two relations are queried independently.

use mesh_catalog_core::MeshService;
use mesh_catalog_k8s_api::{split::TrafficSplit, ResourceExt};
use std::collections::BTreeSet;

/// Returns the names of the apex services of every split that `svc` backs.
pub fn apexes_for_backend(splits: &[TrafficSplit], svc: &MeshService) -> BTreeSet<String> {
    splits_in(splits, &svc.namespace)
        .filter(|split| {
            split
                .spec
                .backends
                .iter()
                .any(|b| service_name(&b.service, &svc.namespace) == svc.name)
        })
        .map(|split| service_name(&split.spec.service, &svc.namespace).to_string())
        .collect()
}

/// Indicates whether `svc` is the apex of any split.
pub fn is_apex(splits: &[TrafficSplit], svc: &MeshService) -> bool {
    splits_in(splits, &svc.namespace)
        .any(|split| service_name(&split.spec.service, &svc.namespace) == svc.name)
}

fn splits_in<'s>(
    splits: &'s [TrafficSplit],
    namespace: &'s str,
) -> impl Iterator<Item = &'s TrafficSplit> + 's {
    splits
        .iter()
        .filter(move |s| s.namespace().as_deref() == Some(namespace))
}

/// Strips a namespace qualification, e.g. `s1-apex.ns1.svc.cluster.local`,
/// from a service name.
fn service_name<'n>(name: &'n str, namespace: &str) -> &'n str {
    let qualifier = format!(".{namespace}");
    for (i, _) in name.match_indices(&qualifier) {
        let rest = &name[i + qualifier.len()..];
        if rest.is_empty() || rest == ".svc" || rest.starts_with(".svc.") {
            return &name[..i];
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_namespace_qualification() {
        assert_eq!(service_name("s1-apex", "ns1"), "s1-apex");
        assert_eq!(service_name("s1-apex.ns1", "ns1"), "s1-apex");
        assert_eq!(service_name("s1-apex.ns1.svc", "ns1"), "s1-apex");
        assert_eq!(
            service_name("s1-apex.ns1.svc.cluster.local", "ns1"),
            "s1-apex"
        );
        assert_eq!(
            service_name("mysql-0.mysql.ns1.svc.cluster.local", "ns1"),
            "mysql-0.mysql"
        );
        assert_eq!(service_name("s1.ns10", "ns1"), "s1.ns10");
        assert_eq!(service_name("s1.ns2.svc", "ns1"), "s1.ns2.svc");
    }
}
