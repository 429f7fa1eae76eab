use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{convert::Infallible, fmt, str::FromStr};

/// An addressable backend in the mesh: one port of a Kubernetes service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshService {
    pub namespace: String,
    pub name: String,

    /// The port exposed by the service.
    pub port: u16,

    /// The port on which the workload's container listens.
    pub target_port: u16,

    pub protocol: AppProtocol,
}

/// The application protocol of a service port.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AppProtocol {
    Http,
    Http2,
    Grpc,

    /// Cleartext HTTP/2.
    H2c,

    Tcp,

    /// Opaque TCP where the server sends the first bytes, so the proxy must
    /// not wait to sniff the protocol.
    TcpServerFirst,

    Other(String),
}

/// A route destination and the share of traffic it receives.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedCluster {
    pub cluster_name: String,
    pub weight: u32,
}

// === impl MeshService ===

impl MeshService {
    /// Returns a copy of this service under another name in the same namespace,
    /// e.g. the apex of a traffic split it backs.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// The name of the cluster through which a proxy reaches this service's
    /// local workload, e.g. `ns1/s1|8080|local`.
    pub fn local_cluster_name(&self) -> String {
        format!("{}/{}|{}|local", self.namespace, self.name, self.target_port)
    }

    /// E.g. `s1.ns1.svc.cluster.local`.
    pub fn fqdn(&self, dns_domain: &str) -> String {
        format!("{}.{}.svc.{}", self.name, self.namespace, dns_domain)
    }

    /// Lists every hostname by which clients may address this service.
    ///
    /// The name is qualified one label at a time up to the FQDN, and each form
    /// is listed both bare and with an explicit port.
    pub fn hostnames(&self, dns_domain: &str) -> Vec<String> {
        let labels = [self.namespace.as_str(), "svc"]
            .into_iter()
            .chain(dns_domain.split('.').filter(|l| !l.is_empty()));

        let mut qualified = self.name.clone();
        let mut hostnames = vec![qualified.clone(), format!("{}:{}", qualified, self.port)];
        for label in labels {
            qualified.push('.');
            qualified.push_str(label);
            hostnames.push(qualified.clone());
            hostnames.push(format!("{}:{}", qualified, self.port));
        }
        hostnames
    }
}

impl fmt::Display for MeshService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.namespace, self.name, self.port)
    }
}

// === impl AppProtocol ===

impl AppProtocol {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Http => "http",
            Self::Http2 => "http2",
            Self::Grpc => "grpc",
            Self::H2c => "h2c",
            Self::Tcp => "tcp",
            Self::TcpServerFirst => "tcp-server-first",
            Self::Other(p) => p,
        }
    }

    /// Indicates whether inbound traffic on this protocol is routed by HTTP
    /// route tables.
    #[inline]
    pub fn is_http(&self) -> bool {
        !matches!(self, Self::Tcp | Self::TcpServerFirst)
    }
}

/// Protocol names are case-sensitive. Unrecognized names are kept verbatim so
/// that a protocol always renders as it was written.
impl FromStr for AppProtocol {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let protocol = match s {
            "http" => Self::Http,
            "http2" => Self::Http2,
            "grpc" => Self::Grpc,
            "h2c" => Self::H2c,
            "tcp" => Self::Tcp,
            "tcp-server-first" => Self::TcpServerFirst,
            _ => Self::Other(s.to_string()),
        };
        Ok(protocol)
    }
}

impl fmt::Display for AppProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AppProtocol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AppProtocol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s1() -> MeshService {
        MeshService {
            namespace: "ns1".to_string(),
            name: "s1".to_string(),
            port: 80,
            target_port: 8080,
            protocol: AppProtocol::Http,
        }
    }

    #[test]
    fn hostnames_cover_every_qualification() {
        assert_eq!(
            s1().hostnames("cluster.local"),
            vec![
                "s1",
                "s1:80",
                "s1.ns1",
                "s1.ns1:80",
                "s1.ns1.svc",
                "s1.ns1.svc:80",
                "s1.ns1.svc.cluster",
                "s1.ns1.svc.cluster:80",
                "s1.ns1.svc.cluster.local",
                "s1.ns1.svc.cluster.local:80",
            ]
        );
    }

    #[test]
    fn cluster_name_uses_target_port() {
        assert_eq!(s1().local_cluster_name(), "ns1/s1|8080|local");
        assert_eq!(
            s1().with_name("s1-apex").local_cluster_name(),
            "ns1/s1-apex|8080|local"
        );
    }

    #[test]
    fn protocols() {
        for (s, http) in [
            ("http", true),
            ("grpc", true),
            ("h2c", true),
            ("tcp", false),
            ("tcp-server-first", false),
        ] {
            let protocol = s.parse::<AppProtocol>().unwrap();
            assert_eq!(protocol.as_str(), s);
            assert_eq!(protocol.is_http(), http, "{s}");
        }
        assert_eq!(
            "mongo".parse::<AppProtocol>().unwrap(),
            AppProtocol::Other("mongo".to_string())
        );

        for s in ["HTTP", "Tcp"] {
            let protocol = s.parse::<AppProtocol>().unwrap();
            assert_eq!(protocol, AppProtocol::Other(s.to_string()));
            assert_eq!(protocol.to_string(), s);
        }
    }

    #[test]
    fn decodes_protocol_from_string() {
        let svc = serde_json::from_str::<MeshService>(
            r#"{"namespace":"ns1","name":"mysql-0.mysql","port":3306,"targetPort":3306,"protocol":"tcp"}"#,
        )
        .unwrap();
        assert_eq!(svc.protocol, AppProtocol::Tcp);
        assert_eq!(svc.fqdn("cluster.local"), "mysql-0.mysql.ns1.svc.cluster.local");
    }
}
