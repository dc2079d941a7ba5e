//! Span helpers for remote calls and flow steps

use tracing::Span;

/// Create a span for one HTTP call to a remote service
///
/// # Arguments
/// * `service` - Logical service name (e.g. "agents", "openai")
/// * `method` - HTTP method
/// * `path` - Request path without query string
///
/// # Example
/// ```
/// use aif_telemetry::service_call_span;
/// let span = service_call_span("agents", "POST", "/assistants");
/// let _enter = span.enter();
/// ```
pub fn service_call_span(service: &str, method: &str, path: &str) -> Span {
    tracing::debug_span!(
        "service.call",
        service.name = service,
        http.method = method,
        http.path = path,
        otel.kind = "client"
    )
}

/// Create a span covering a whole poll loop
///
/// # Arguments
/// * `resource` - Kind of resource being watched ("run", "fine_tuning.job")
/// * `id` - Server-issued identifier
pub fn poll_span(resource: &str, id: &str) -> Span {
    tracing::info_span!("poll", poll.resource = resource, poll.id = id, otel.kind = "internal")
}

/// Create a span for one end-to-end flow invocation
pub fn flow_span(flow: &str) -> Span {
    tracing::info_span!("flow", flow.name = flow)
}
