use tracing::info;

use super::Middleware;
use crate::request::InboundRequest;
use crate::response::RouteResponse;

/// Logs each routed request and the status it was answered with.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl Middleware for Trace {
    fn process_request(&self, request: InboundRequest) -> InboundRequest {
        info!(method = %request.method(), path = %request.path(), "request");
        request
    }

    fn process_response(&self, response: RouteResponse, request: &InboundRequest) -> RouteResponse {
        info!(
            method = %request.method(),
            path = %request.path(),
            status = response.status_code(),
            "response"
        );
        response
    }
}
