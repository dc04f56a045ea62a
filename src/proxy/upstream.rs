//! Upstream services reachable through the proxy routes

use std::fmt;

use crate::config::UpstreamsConfig;
use crate::error::ApiError;

/// A service behind one of the proxy routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Upstream {
    Kms,
    Compute,
    Agents,
    ZeroTrust,
}

impl Upstream {
    pub const ALL: [Upstream; 4] = [
        Upstream::Kms,
        Upstream::Compute,
        Upstream::Agents,
        Upstream::ZeroTrust,
    ];

    /// Route prefix the upstream is mounted under
    pub fn mount_path(&self) -> &'static str {
        match self {
            Upstream::Kms => "/api/kms",
            Upstream::Compute => "/api/compute",
            Upstream::Agents => "/api/agents",
            Upstream::ZeroTrust => "/api/zap/zt",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Upstream::Kms => "kms",
            Upstream::Compute => "compute",
            Upstream::Agents => "agents",
            Upstream::ZeroTrust => "zero_trust",
        }
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Credentials the gateway adds when talking to an upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamAuth {
    /// Forward the client's `Authorization` header unchanged
    PassThrough,
    /// Replace `Authorization` with a service token
    Bearer(String),
    /// Log in to the Zero-Trust controller and send `zt-session`
    ZeroTrustSession,
}

/// Where and how to reach an upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    pub base_url: String,
    pub auth: UpstreamAuth,
}

/// Configured targets, `None` when an upstream has no base URL
#[derive(Debug, Clone, Default)]
pub struct UpstreamTargets {
    kms: Option<UpstreamTarget>,
    compute: Option<UpstreamTarget>,
    agents: Option<UpstreamTarget>,
    zero_trust: Option<UpstreamTarget>,
}

impl UpstreamTargets {
    pub fn from_config(config: &UpstreamsConfig) -> Self {
        let kms = config.kms_api_url.clone().map(|base_url| UpstreamTarget {
            base_url,
            auth: match &config.kms_service_token {
                Some(token) => UpstreamAuth::Bearer(token.clone()),
                None => UpstreamAuth::PassThrough,
            },
        });
        let compute = config.compute_api_url.clone().map(|base_url| UpstreamTarget {
            base_url,
            auth: UpstreamAuth::PassThrough,
        });
        let agents = config.agents_api_url.clone().map(|base_url| UpstreamTarget {
            base_url,
            auth: UpstreamAuth::PassThrough,
        });
        let zt_login = config.zt_admin_username.is_some() && config.zt_admin_password.is_some();
        let zero_trust = config.zt_api_url.clone().map(|base_url| UpstreamTarget {
            base_url,
            auth: if zt_login {
                UpstreamAuth::ZeroTrustSession
            } else {
                UpstreamAuth::PassThrough
            },
        });

        Self {
            kms,
            compute,
            agents,
            zero_trust,
        }
    }

    pub fn get(&self, upstream: Upstream) -> Option<&UpstreamTarget> {
        match upstream {
            Upstream::Kms => self.kms.as_ref(),
            Upstream::Compute => self.compute.as_ref(),
            Upstream::Agents => self.agents.as_ref(),
            Upstream::ZeroTrust => self.zero_trust.as_ref(),
        }
    }

    pub fn is_configured(&self, upstream: Upstream) -> bool {
        self.get(upstream).is_some()
    }
}

/// Join `base`, the path remaining after the mount prefix, and the query.
///
/// Dot segments are rejected so a caller cannot climb out of the
/// upstream's base path.
pub fn build_target_url(base: &str, rest: &str, query: Option<&str>) -> Result<String, ApiError> {
    let rest = rest.trim_start_matches('/');

    for segment in rest.split('/') {
        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        if decoded == "." || decoded == ".." {
            return Err(ApiError::InvalidRequest(
                "path must not contain dot segments".to_string(),
            ));
        }
        if segment.to_ascii_lowercase().contains("%2f") {
            return Err(ApiError::InvalidRequest(
                "path must not contain encoded slashes".to_string(),
            ));
        }
    }

    let mut url = base.trim_end_matches('/').to_string();
    if !rest.is_empty() {
        url.push('/');
        url.push_str(rest);
    }
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }

    Ok(url)
}
