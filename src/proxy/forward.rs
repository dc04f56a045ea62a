//! Request forwarding

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method},
    response::Response,
};
use reqwest::Client;
use std::time::Duration;

use crate::config::ProxyConfig;
use crate::error::ApiError;
use crate::proxy::hop::strip_hop_by_hop;
use crate::proxy::upstream::{build_target_url, Upstream, UpstreamAuth, UpstreamTarget, UpstreamTargets};
use crate::proxy::zt::{ZtSessionManager, ZT_SESSION_HEADER};
use crate::tenant::apply_tenant_headers;
use crate::utils::{with_timeout, TimeoutError};

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Forwards requests to the configured upstream services
#[derive(Clone)]
pub struct ProxyService {
    client: Client,
    targets: UpstreamTargets,
    request_timeout: Duration,
    max_body_bytes: usize,
    zt_session: Option<ZtSessionManager>,
}

impl ProxyService {
    pub fn new(
        config: &ProxyConfig,
        targets: UpstreamTargets,
        zt_credentials: Option<(String, String)>,
    ) -> anyhow::Result<Self> {
        // Redirects are returned to the caller rather than followed here
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        let request_timeout = Duration::from_millis(config.request_timeout_ms);
        let zt_session = match (targets.get(Upstream::ZeroTrust), zt_credentials) {
            (Some(target), Some((username, password)))
                if target.auth == UpstreamAuth::ZeroTrustSession =>
            {
                Some(
                    ZtSessionManager::new(client.clone(), target.base_url.clone(), username, password)
                        .with_login_timeout(request_timeout),
                )
            }
            _ => None,
        };

        Ok(Self {
            client,
            targets,
            request_timeout,
            max_body_bytes: config.max_body_bytes,
            zt_session,
        })
    }

    pub fn targets(&self) -> &UpstreamTargets {
        &self.targets
    }

    /// The configured target, or 503 when the upstream has no base URL
    pub fn target(&self, upstream: Upstream) -> Result<&UpstreamTarget, ApiError> {
        self.targets.get(upstream).ok_or_else(|| {
            tracing::warn!(upstream = %upstream, "Upstream is not configured");
            ApiError::ServiceUnavailable(format!("{} service is not configured", upstream))
        })
    }

    /// Forward `request` to `upstream`.
    ///
    /// `tenant` must be the server-resolved tenant header set; it is applied
    /// after every other header so it cannot be overridden by the client.
    pub async fn forward(
        &self,
        upstream: Upstream,
        request: Request,
        tenant: &HeaderMap,
        trace_id: Option<&str>,
    ) -> Result<Response, ApiError> {
        let target = self.target(upstream)?;

        let (parts, body) = request.into_parts();

        let rest = parts
            .uri
            .path()
            .strip_prefix(upstream.mount_path())
            .unwrap_or("");
        let url = build_target_url(&target.base_url, rest, parts.uri.query())?;

        let body = self.read_body(&parts.headers, body).await?;

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(header::CONTENT_LENGTH);
        headers.remove(header::COOKIE);
        apply_tenant_headers(&mut headers, tenant);
        if let Some(value) = trace_id.and_then(|id| HeaderValue::from_str(id).ok()) {
            headers.insert(REQUEST_ID_HEADER, value);
        }

        tracing::debug!(
            upstream = %upstream,
            method = %parts.method,
            url = %url,
            body_bytes = body.len(),
            "Forwarding request"
        );

        let mut response = self
            .send(upstream, target, &parts.method, &url, &headers, &body)
            .await?;

        if target.auth == UpstreamAuth::ZeroTrustSession
            && response.status() == reqwest::StatusCode::UNAUTHORIZED
        {
            if let Some(zt) = &self.zt_session {
                tracing::info!("Zero-Trust session rejected, logging in again");
                zt.invalidate().await;
                response = self
                    .send(upstream, target, &parts.method, &url, &headers, &body)
                    .await?;
            }
        }

        Ok(into_streaming_response(response))
    }

    async fn read_body(&self, headers: &HeaderMap, body: Body) -> Result<Bytes, ApiError> {
        let declared = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if declared.is_some_and(|len| len > self.max_body_bytes) {
            return Err(ApiError::PayloadTooLarge {
                limit: self.max_body_bytes,
            });
        }

        axum::body::to_bytes(body, self.max_body_bytes)
            .await
            .map_err(|_| ApiError::PayloadTooLarge {
                limit: self.max_body_bytes,
            })
    }

    async fn send(
        &self,
        upstream: Upstream,
        target: &UpstreamTarget,
        method: &Method,
        url: &str,
        headers: &HeaderMap,
        body: &Bytes,
    ) -> Result<reqwest::Response, ApiError> {
        // The upstream login counts against the same deadline as the request
        let attempt = async {
            let mut headers = headers.clone();
            self.apply_upstream_auth(upstream, &target.auth, &mut headers).await?;

            self.client
                .request(method.clone(), url)
                .headers(headers)
                .body(body.clone())
                .send()
                .await
                .map_err(|e| self.map_send_error(upstream, e))
        };

        match with_timeout(self.request_timeout, attempt).await {
            Ok(response) => Ok(response),
            Err(TimeoutError::Inner(e)) => Err(e),
            Err(TimeoutError::Timeout(after)) => {
                tracing::warn!(upstream = %upstream, timeout_ms = after.as_millis() as u64, "Upstream timed out");
                Err(gateway_timeout(upstream))
            }
        }
    }

    async fn apply_upstream_auth(
        &self,
        upstream: Upstream,
        auth: &UpstreamAuth,
        headers: &mut HeaderMap,
    ) -> Result<(), ApiError> {
        match auth {
            UpstreamAuth::PassThrough => {}
            UpstreamAuth::Bearer(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                    ApiError::Internal(anyhow::anyhow!("service token is not a valid header value"))
                })?;
                headers.insert(header::AUTHORIZATION, value);
            }
            UpstreamAuth::ZeroTrustSession => {
                let Some(zt) = &self.zt_session else {
                    return Ok(());
                };
                let token = zt.token().await.map_err(|e| {
                    if e.is_timeout() {
                        tracing::warn!(error = %e, "Zero-Trust login timed out");
                        return gateway_timeout(upstream);
                    }
                    tracing::error!(error = %e, "Zero-Trust login failed");
                    ApiError::BadGateway("could not authenticate to the Zero-Trust controller".to_string())
                })?;
                let value = HeaderValue::from_str(&token).map_err(|_| {
                    ApiError::BadGateway("Zero-Trust controller returned an invalid token".to_string())
                })?;
                headers.insert(ZT_SESSION_HEADER, value);
            }
        }
        Ok(())
    }

    fn map_send_error(&self, upstream: Upstream, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            tracing::warn!(upstream = %upstream, error = %err, "Upstream timed out");
            return gateway_timeout(upstream);
        }
        tracing::error!(upstream = %upstream, error = %err, connect = err.is_connect(), "Upstream request failed");
        ApiError::BadGateway(format!("{} service is unreachable", upstream))
    }
}

fn gateway_timeout(upstream: Upstream) -> ApiError {
    ApiError::GatewayTimeout(format!("{} service did not respond in time", upstream))
}

/// Relay the upstream response without buffering its body
fn into_streaming_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
