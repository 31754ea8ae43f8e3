//! Middleware layer.
//!
//! Middleware intercepts the request on its way to a route handler and the
//! response on its way back. It is the right place for cross-cutting
//! concerns: request-id injection, header rewriting, tracing.
//!
//! # Ordering
//!
//! The chain is an onion. For middlewares registered as `M1, M2, M3`:
//!
//! ```text
//! process_request:   M1 → M2 → M3 → handler
//! process_response:  handler → M3 → M2 → M1
//! ```
//!
//! Middleware only wraps requests that reached a route. Responses the
//! dispatcher produces on its own (404, 405, 406, 401) bypass the chain.
//!
//! Built-in middleware:
//! - [`Trace`]: one log line per request and per response

mod trace;

pub use trace::Trace;

use std::sync::Arc;

use crate::request::InboundRequest;
use crate::response::RouteResponse;

/// A request/response transform composed into the router's chain.
///
/// Both hooks default to passing their input through unchanged, so an
/// implementation only overrides the side it cares about.
///
/// ```rust
/// use viaduct::{InboundRequest, RouteResponse};
/// use viaduct::middleware::Middleware;
///
/// struct PoweredBy;
///
/// impl Middleware for PoweredBy {
///     fn process_response(&self, response: RouteResponse, _: &InboundRequest) -> RouteResponse {
///         response.header("x-powered-by", "viaduct")
///     }
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn process_request(&self, request: InboundRequest) -> InboundRequest {
        request
    }

    /// Sees the response produced downstream and the request as it left
    /// this middleware's `process_request`.
    fn process_response(&self, response: RouteResponse, _request: &InboundRequest) -> RouteResponse {
        response
    }
}

/// Shared handle to a middleware.
pub type SharedMiddleware = Arc<dyn Middleware>;

/// Runs `inner` wrapped in `chain`.
pub(crate) fn run_chain(
    chain: &[SharedMiddleware],
    request: InboundRequest,
    inner: impl FnOnce(InboundRequest) -> RouteResponse,
) -> RouteResponse {
    match chain.split_first() {
        None => inner(request),
        Some((outer, rest)) => {
            let request = outer.process_request(request);
            let response = run_chain(rest, request.clone(), inner);
            outer.process_response(response, &request)
        }
    }
}
