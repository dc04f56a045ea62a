//! Tenant scoping headers
//!
//! Downstream services scope every response by the headers built here.
//! Their values come only from the identity resolved on the server, and
//! they always replace anything the client sent under the same names.

pub mod headers;

pub use headers::{
    apply_tenant_headers, resolve_tenant_headers, tenant_headers, TENANT_HEADER_NAMES,
    X_ACTOR_ID, X_ENV, X_ORG_ID, X_PROJECT_ID, X_TENANT_ID,
};
