use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use hearth_types::{TraceContext, TRACEPARENT_HEADER};

/// Trace context of the current request, stored in request extensions.
#[derive(Clone, Debug)]
pub struct RequestTrace(pub TraceContext);

/// Continues the caller's trace from a `traceparent` header, or starts a new
/// one, and echoes the request's own span back in the response.
///
/// A header that is missing or fails to parse starts a fresh root trace.
pub async fn trace_context_middleware(mut req: Request<Body>, next: Next) -> Response {
    let parent = req
        .headers()
        .get(TRACEPARENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(TraceContext::from_traceparent);

    let trace = match parent {
        Some(parent) => parent.child(),
        None => TraceContext::new_root(),
    };
    req.extensions_mut().insert(RequestTrace(trace.clone()));

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&trace.to_traceparent()) {
        response.headers_mut().insert(TRACEPARENT_HEADER, value);
    }
    response
}
