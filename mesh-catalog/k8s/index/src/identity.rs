use mesh_catalog_core::{Principal, ServiceAccount, TrustDomains};
use mesh_catalog_k8s_api::{
    access::IdentityBindingSubject, config::MeshRootCertificate, ResourceExt,
};
use std::collections::BTreeSet;

/// A client that may be granted access.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SourceIdentity<'a> {
    /// Every client, as in permissive mode.
    Any,

    ServiceAccount(&'a ServiceAccount),
}

/// Returns the principals under which `source` is authorized: one per trust
/// domain, so that clients holding a certificate from either side of a root
/// rotation are accepted.
///
/// Nothing is authorized when there are no trust domains.
pub fn principals_for(source: SourceIdentity<'_>, trust_domains: &TrustDomains) -> BTreeSet<Principal> {
    match source {
        SourceIdentity::Any => Some(Principal::Any).into_iter().collect(),
        SourceIdentity::ServiceAccount(sa) => {
            let format = trust_domains.format();
            trust_domains
                .iter()
                .map(|td| sa.principal(td, format))
                .collect()
        }
    }
}

/// Derives the trust domains in effect from the published root certificates.
///
/// Every active or passive root contributes its trust domain. SPIFFE
/// identities are used if any active root enables them, since only active
/// roots issue certificates.
pub fn trust_domains<'c>(
    roots: impl IntoIterator<Item = &'c MeshRootCertificate>,
) -> TrustDomains {
    let mut domains = TrustDomains::default();
    for root in roots {
        if !root.spec.intent.is_trusted() {
            tracing::trace!(name = %root.name_any(), intent = ?root.spec.intent, "Ignoring root certificate");
            continue;
        }
        domains.domains.insert(root.spec.trust_domain.clone());
        if root.spec.intent.is_issuing() {
            domains.spiffe_enabled |= root.spec.spiffe_enabled;
        }
    }
    domains
}

/// Returns the service account named by a binding subject, or `None` if the
/// subject is of another kind.
pub fn service_account(subject: &IdentityBindingSubject, default_ns: &str) -> Option<ServiceAccount> {
    if !subject.is_service_account() {
        return None;
    }
    Some(ServiceAccount::new(
        subject.namespace_or(default_ns),
        subject.name.as_str(),
    ))
}
