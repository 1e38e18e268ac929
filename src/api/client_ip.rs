use crate::api::AppState;
use crate::config::ClientIpMode;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{HeaderMap, request::Parts};
use ipnetwork::IpNetwork;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

pub const UNKNOWN_CLIENT: &str = "unknown";

/// Derives the best-effort client identifier used as the admission key.
#[derive(Clone, Debug)]
pub struct ClientIdResolver {
    mode: ClientIpMode,
    trusted_proxies: Vec<IpNetwork>,
}

impl ClientIdResolver {
    #[must_use]
    pub const fn new(mode: ClientIpMode, trusted_proxies: Vec<IpNetwork>) -> Self {
        Self { mode, trusted_proxies }
    }

    #[must_use]
    pub fn resolve(&self, headers: &HeaderMap, peer_addr: Option<IpAddr>) -> String {
        match self.mode {
            ClientIpMode::FirstHop => Self::first_hop(headers, peer_addr),
            ClientIpMode::TrustedProxies => self.behind_trusted_proxies(headers, peer_addr),
        }
    }

    fn first_hop(headers: &HeaderMap, peer_addr: Option<IpAddr>) -> String {
        header_str(headers, "x-forwarded-for")
            .and_then(|xff| xff.split(',').next())
            .map(str::trim)
            .filter(|hop| !hop.is_empty())
            .or_else(|| header_str(headers, "x-real-ip").map(str::trim).filter(|ip| !ip.is_empty()))
            .map(ToString::to_string)
            .or_else(|| peer_addr.map(|ip| ip.to_string()))
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
    }

    fn behind_trusted_proxies(&self, headers: &HeaderMap, peer_addr: Option<IpAddr>) -> String {
        let Some(peer_addr) = peer_addr else {
            return UNKNOWN_CLIENT.to_string();
        };

        // Only trust X-Forwarded-For if the request comes from a known proxy.
        if !self.is_trusted(&peer_addr) {
            return peer_addr.to_string();
        }

        // Walk the chain from right to left; the first hop outside our own infrastructure is the client.
        header_str(headers, "x-forwarded-for")
            .and_then(|xff| {
                xff.rsplit(',').filter_map(|s| s.trim().parse::<IpAddr>().ok()).find(|ip| !self.is_trusted(ip))
            })
            .unwrap_or(peer_addr)
            .to_string()
    }

    fn is_trusted(&self, ip: &IpAddr) -> bool {
        self.trusted_proxies.iter().any(|net| net.contains(*ip))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Client identifier of the current request. Extraction never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl FromRequestParts<AppState> for ClientId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let peer_addr = parts.extensions.get::<ConnectInfo<SocketAddr>>().map(|ConnectInfo(addr)| addr.ip());
        Ok(Self(state.client_ids.resolve(&parts.headers, peer_addr)))
    }
}
