use anyhow::{bail, Error};
use serde::{Deserialize, Serialize, Serializer};
use std::{collections::BTreeSet, fmt, str::FromStr};

/// A workload identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct ServiceAccount {
    pub namespace: String,
    pub name: String,
}

/// An authenticated client identity that may be authorized.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Principal {
    /// Matches every client.
    Any,

    Identity {
        service_account: ServiceAccount,
        trust_domain: String,
        format: PrincipalFormat,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrincipalFormat {
    /// `{name}.{namespace}.{trust-domain}`
    Plain,

    /// `spiffe://{trust-domain}/{namespace}/{name}`
    Spiffe,
}

/// The trust domains in effect when policy is computed.
///
/// Holds more than one domain while a root certificate is being rotated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustDomains {
    #[serde(default)]
    pub domains: BTreeSet<String>,

    #[serde(default)]
    pub spiffe_enabled: bool,
}

// === impl ServiceAccount ===

impl ServiceAccount {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn principal(&self, trust_domain: impl Into<String>, format: PrincipalFormat) -> Principal {
        Principal::Identity {
            service_account: self.clone(),
            trust_domain: trust_domain.into(),
            format,
        }
    }
}

impl fmt::Display for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for ServiceAccount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((ns, name)) if !ns.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self::new(ns, name))
            }
            _ => bail!("invalid service account {s:?}: expected <namespace>/<name>"),
        }
    }
}

// === impl Principal ===

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Identity {
                service_account: ServiceAccount { namespace, name },
                trust_domain,
                format: PrincipalFormat::Plain,
            } => write!(f, "{name}.{namespace}.{trust_domain}"),
            Self::Identity {
                service_account: ServiceAccount { namespace, name },
                trust_domain,
                format: PrincipalFormat::Spiffe,
            } => write!(f, "spiffe://{trust_domain}/{namespace}/{name}"),
        }
    }
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// === impl TrustDomains ===

impl TrustDomains {
    pub fn new<D: Into<String>>(domains: impl IntoIterator<Item = D>, spiffe_enabled: bool) -> Self {
        Self {
            domains: domains.into_iter().map(Into::into).collect(),
            spiffe_enabled,
        }
    }

    #[inline]
    pub fn format(&self) -> PrincipalFormat {
        if self.spiffe_enabled {
            PrincipalFormat::Spiffe
        } else {
            PrincipalFormat::Plain
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.domains.iter().map(String::as_str)
    }
}
