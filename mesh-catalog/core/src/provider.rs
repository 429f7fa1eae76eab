use crate::{MeshService, TrustDomains};
use mesh_catalog_k8s_api::{
    access::TrafficTarget,
    policy::UpstreamTrafficSetting,
    specs::{HTTPRouteGroup, TCPRoute},
    split::TrafficSplit,
};

/// Provides a point-in-time view of the mesh's resources.
///
/// Implementations are expected to return consistent data for the duration of
/// a single policy computation; the catalog reads each list at most once per
/// call.
pub trait MeshProvider {
    fn list_services(&self) -> Vec<MeshService>;

    fn list_traffic_targets(&self) -> Vec<TrafficTarget>;

    fn list_http_route_groups(&self) -> Vec<HTTPRouteGroup>;

    fn list_tcp_routes(&self) -> Vec<TCPRoute>;

    fn list_traffic_splits(&self) -> Vec<TrafficSplit>;

    fn list_upstream_traffic_settings(&self) -> Vec<UpstreamTrafficSetting>;

    /// Returns the trust domains in which identities are currently valid.
    ///
    /// More than one domain is returned while a root certificate rotates.
    fn active_trust_domains(&self) -> TrustDomains;

    /// Indicates whether all clients are allowed to reach all services.
    fn is_permissive_mode(&self) -> bool;
}
