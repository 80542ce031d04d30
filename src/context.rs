/// Per-request values every service call is made with.
///
/// `tenant_id` comes from the verified tenant middleware, never from a
/// request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub tenant_id: String,
    pub request_id: Option<String>,
    pub trace_id: Option<String>,
}

impl RequestContext {
    pub fn for_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            request_id: None,
            trace_id: None,
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }
}

/// Trace id from a W3C `traceparent` header (`version-traceid-parentid-flags`).
pub fn trace_id_from_traceparent(value: &str) -> Option<&str> {
    value.split('-').nth(1).filter(|id| !id.is_empty())
}
