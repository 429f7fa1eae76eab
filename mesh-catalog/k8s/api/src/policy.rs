pub mod ratelimit;
pub mod upstream_traffic_setting;

pub use self::{
    ratelimit::{
        DescriptorEntry, GlobalRateLimitSpec, HttpGlobalPerRouteRateLimitSpec,
        HttpGlobalRateLimitDescriptor, HttpGlobalRateLimitSpec, HttpHeaderValue,
        HttpLocalRateLimitSpec, HttpPerRouteRateLimitSpec, LocalRateLimitSpec, RateLimitServiceSpec,
        RateLimitSpec, RateLimitUnit, TcpGlobalRateLimitSpec, TcpLocalRateLimitSpec,
    },
    upstream_traffic_setting::{HttpRouteSpec, UpstreamTrafficSetting, UpstreamTrafficSettingSpec},
};
