use axum::{extract::ConnectInfo, http::Request};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tower_governor::{key_extractor::KeyExtractor, GovernorError};

/// Client IP for rate limiting.
///
/// Dashboards usually sit behind a reverse proxy, so the first
/// `X-Forwarded-For` hop wins over the socket peer. Requests with neither
/// share the loopback bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIpKeyExtractor;

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|chain| chain.split(',').next())
            .and_then(|first| first.trim().parse::<IpAddr>().ok());

        let peer = || {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0.ip())
        };

        Ok(forwarded
            .or_else(peer)
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)))
    }
}
