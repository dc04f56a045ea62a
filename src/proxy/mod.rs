//! Reverse proxy to the KMS, Compute, Agents and Zero-Trust services

pub mod forward;
pub mod hop;
pub mod upstream;
pub mod zt;

pub use forward::ProxyService;
pub use hop::{strip_hop_by_hop, HOP_BY_HOP_HEADERS};
pub use upstream::{build_target_url, Upstream, UpstreamAuth, UpstreamTarget, UpstreamTargets};
pub use zt::{ZtError, ZtSessionManager, ZT_SESSION_HEADER};
