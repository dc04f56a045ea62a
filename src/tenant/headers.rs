//! Building and applying tenant headers

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::identity::{Identity, IdentityResolver};

pub const X_ORG_ID: HeaderName = HeaderName::from_static("x-org-id");
pub const X_PROJECT_ID: HeaderName = HeaderName::from_static("x-project-id");
pub const X_TENANT_ID: HeaderName = HeaderName::from_static("x-tenant-id");
pub const X_ACTOR_ID: HeaderName = HeaderName::from_static("x-actor-id");
pub const X_ENV: HeaderName = HeaderName::from_static("x-env");

/// Every header name this module owns on outbound requests
pub const TENANT_HEADER_NAMES: [HeaderName; 5] =
    [X_ORG_ID, X_PROJECT_ID, X_TENANT_ID, X_ACTOR_ID, X_ENV];

/// Headers for `identity` in deployment `env`.
///
/// `x-env` is always present. Identity fields that are missing, empty or
/// not representable as a header value are left out.
pub fn tenant_headers(env: &str, identity: Option<&Identity>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert_non_empty(&mut headers, X_ENV, Some(env));

    let Some(identity) = identity else {
        return headers;
    };

    insert_non_empty(&mut headers, X_ACTOR_ID, Some(&identity.actor_id));
    insert_non_empty(&mut headers, X_ORG_ID, identity.org_id.as_deref());
    insert_non_empty(&mut headers, X_TENANT_ID, identity.org_id.as_deref());
    insert_non_empty(&mut headers, X_PROJECT_ID, identity.project_id.as_deref());

    headers
}

fn insert_non_empty(headers: &mut HeaderMap, name: HeaderName, value: Option<&str>) {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return;
    };
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::warn!(header = %name, "Dropping tenant header with invalid value"),
    }
}

/// Resolve the tenant headers for one request.
///
/// Any failure to establish the identity yields the `x-env`-only set, so
/// the downstream service sees an unscoped request and refuses it.
pub async fn resolve_tenant_headers(
    resolver: &IdentityResolver,
    env: &str,
    inbound: &HeaderMap,
) -> HeaderMap {
    match resolver.resolve(inbound).await {
        Ok(identity) => {
            if let Some(identity) = &identity {
                tracing::debug!(
                    actor_id = %identity.actor_id,
                    org_id = %identity.org_id.as_deref().unwrap_or("-"),
                    project_id = %identity.project_id.as_deref().unwrap_or("-"),
                    source = ?identity.source,
                    "Resolved request identity"
                );
            }
            tenant_headers(env, identity.as_ref())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Identity resolution failed, forwarding without tenant headers");
            tenant_headers(env, None)
        }
    }
}

/// Replace every tenant header on `outbound` with the resolved set
pub fn apply_tenant_headers(outbound: &mut HeaderMap, tenant: &HeaderMap) {
    for name in TENANT_HEADER_NAMES.iter() {
        outbound.remove(name);
    }
    for (name, value) in tenant {
        outbound.insert(name.clone(), value.clone());
    }
}
