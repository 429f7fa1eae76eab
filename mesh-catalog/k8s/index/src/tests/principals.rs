use super::*;
use crate::identity::{self, SourceIdentity};
use maplit::btreeset;
use mesh_catalog_core::{Principal, PrincipalFormat};
use mesh_catalog_k8s_api::config::{
    MeshRootCertificate, MeshRootCertificateIntent, MeshRootCertificateSpec,
};

fn mk_root(
    name: &str,
    trust_domain: &str,
    intent: MeshRootCertificateIntent,
    spiffe_enabled: bool,
) -> MeshRootCertificate {
    MeshRootCertificate {
        metadata: mk_meta("osm-system", name),
        spec: MeshRootCertificateSpec {
            trust_domain: trust_domain.to_string(),
            intent,
            spiffe_enabled,
        },
    }
}

#[test]
fn one_principal_per_trust_domain() {
    let sa2 = sa("ns2", "sa2");
    let principals = identity::principals_for(
        SourceIdentity::ServiceAccount(&sa2),
        &TrustDomains::new(["cluster.local", "cluster.new"], false),
    );
    assert_eq!(
        principals
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        vec!["sa2.ns2.cluster.local", "sa2.ns2.cluster.new"]
    );
}

#[test]
fn spiffe_principals() {
    let sa2 = sa("ns2", "sa2");
    let principals = identity::principals_for(
        SourceIdentity::ServiceAccount(&sa2),
        &TrustDomains::new(["cluster.local"], true),
    );
    assert_eq!(
        principals,
        btreeset! { sa2.principal("cluster.local", PrincipalFormat::Spiffe) }
    );
    assert_eq!(
        principals.iter().next().map(ToString::to_string).as_deref(),
        Some("spiffe://cluster.local/ns2/sa2")
    );
}

#[test]
fn any_source_is_a_single_wildcard() {
    for domains in [
        TrustDomains::default(),
        cluster_local(),
        TrustDomains::new(["cluster.local", "cluster.new"], true),
    ] {
        assert_eq!(
            identity::principals_for(SourceIdentity::Any, &domains),
            btreeset! { Principal::Any }
        );
    }
}

#[test]
fn no_trust_domains_authorize_nothing() {
    let sa2 = sa("ns2", "sa2");
    assert!(
        identity::principals_for(SourceIdentity::ServiceAccount(&sa2), &TrustDomains::default())
            .is_empty()
    );
}

#[test]
fn trust_domains_from_root_certificates() {
    let _test = TestConfig::default();

    let domains = identity::trust_domains(&[mk_root(
        "root-1",
        "cluster.local",
        MeshRootCertificateIntent::Active,
        false,
    )]);
    assert_eq!(domains, cluster_local());

    // While rotating, both the active and passive roots are trusted.
    let domains = identity::trust_domains(&[
        mk_root("root-1", "cluster.local", MeshRootCertificateIntent::Passive, false),
        mk_root("root-2", "cluster.new", MeshRootCertificateIntent::Active, true),
        mk_root("root-0", "cluster.old", MeshRootCertificateIntent::Inactive, false),
    ]);
    assert_eq!(
        domains,
        TrustDomains::new(["cluster.local", "cluster.new"], true)
    );

    // Passive roots only validate certificates, so they do not change the
    // identity format.
    let domains = identity::trust_domains(&[
        mk_root("root-1", "cluster.local", MeshRootCertificateIntent::Passive, true),
        mk_root("root-2", "cluster.new", MeshRootCertificateIntent::Active, false),
    ]);
    assert_eq!(
        domains,
        TrustDomains::new(["cluster.local", "cluster.new"], false)
    );

    assert!(identity::trust_domains(std::iter::empty::<&MeshRootCertificate>()).is_empty());
}

#[test]
fn service_account_subjects() {
    let subject = IdentityBindingSubject {
        kind: "ServiceAccount".to_string(),
        name: "sa2".to_string(),
        namespace: None,
    };
    assert_eq!(
        identity::service_account(&subject, "ns1"),
        Some(sa("ns1", "sa2"))
    );

    let group = IdentityBindingSubject {
        kind: "Group".to_string(),
        ..subject
    };
    assert_eq!(identity::service_account(&group, "ns1"), None);
}
