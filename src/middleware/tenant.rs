use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::jwt;
use crate::config::TenantSource;
use crate::state::SharedState;

/// Verified tenant of the current request, set by [`resolve_tenant`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantId(pub String);

/// Attaches a [`TenantId`] when one can be established. Requests without
/// one are rejected by the handlers that need it.
pub async fn resolve_tenant(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(tenant_id) = tenant_for(&state.config.tenant_source, req.headers()) {
        tracing::Span::current().record("tenant_id", tenant_id.as_str());
        req.extensions_mut().insert(TenantId(tenant_id));
    }
    next.run(req).await
}

fn tenant_for(source: &TenantSource, headers: &HeaderMap) -> Option<String> {
    match source {
        TenantSource::Static(tenant_id) => Some(tenant_id.clone()),
        TenantSource::Jwt { secret } => {
            let token = headers
                .get(AUTHORIZATION)?
                .to_str()
                .ok()?
                .strip_prefix("Bearer ")?;

            match jwt::decode_token(token, secret) {
                Ok(claims) if !claims.tid.is_empty() => Some(claims.tid),
                Ok(claims) => {
                    tracing::warn!(sub = %claims.sub, "Bearer token has no tenant claim");
                    None
                }
                Err(e) => {
                    tracing::debug!("Rejected bearer token: {e}");
                    None
                }
            }
        }
    }
}
