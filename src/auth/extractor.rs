use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::context::{trace_id_from_traceparent, RequestContext};
use crate::error::AppError;
use crate::middleware::tenant::TenantId;

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tenant_id = parts
            .extensions
            .get::<TenantId>()
            .map(|tenant| tenant.0.clone())
            .filter(|tenant| !tenant.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Missing tenant context".to_string()))?;

        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let trace_id = parts
            .headers
            .get("traceparent")
            .and_then(|v| v.to_str().ok())
            .and_then(trace_id_from_traceparent)
            .map(str::to_string);

        Ok(RequestContext {
            tenant_id,
            request_id,
            trace_id,
        })
    }
}
