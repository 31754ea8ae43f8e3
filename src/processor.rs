//! Route processor: runs one matched route.
//!
//! Picks the body (none for `GET`/`DELETE`, the decoded payload for
//! `POST`/`PUT`/`PATCH`), calls the handler, and turns every failure on the
//! way into a response. Nothing here returns an error.

use tracing::{debug, error, info};

use crate::handler::{HandlerFailure, RawBody};
use crate::method::Method;
use crate::request::InboundRequest;
use crate::response::RouteResponse;
use crate::router::RouteFunction;
use crate::status::Status;

pub(crate) fn process(route: &RouteFunction, request: InboundRequest) -> RouteResponse {
    let predicate = route.predicate();
    debug!(route = %predicate, "processing route");

    let body = match request.method().parse::<Method>() {
        Ok(Method::Get | Method::Delete) => None,
        Ok(method) if method.carries_body() => {
            if predicate.body_type().is_none() {
                info!(route = %predicate, "route has no body type");
                return RouteResponse::plain(Status::BadRequest, "No type information for handler function");
            }
            Some(extract_body(&request))
        }
        _ => {
            info!(method = %request.method(), path = %request.path(), "method not supported");
            return RouteResponse::plain(
                Status::MethodNotAllowed,
                format!(
                    "Method {} not supported for path {}",
                    request.method(),
                    predicate.path_pattern()
                ),
            );
        }
    };

    let method = request.method().to_owned();
    match route.handler().call(request, predicate.path_pattern(), body) {
        Ok(response) => response,
        Err(HandlerFailure::Decode(e)) => {
            info!(route = %predicate, error = %e, "could not decode request body");
            RouteResponse::plain(Status::BadRequest, e.to_string())
        }
        Err(HandlerFailure::Fault(message)) => {
            error!(route = %predicate, error = %message, "handler failed");
            RouteResponse::plain(
                Status::InternalServerError,
                format!(
                    "Server error in processing request for {method} {}: {message}",
                    predicate.path_pattern()
                ),
            )
        }
    }
}

/// A `Content-Length` of `0` means an empty body, whatever the event or the
/// `Content-Type` says.
fn extract_body(request: &InboundRequest) -> RawBody {
    let empty = request.header("content-length") == Some("0");
    let text = if empty { String::new() } else { request.body().to_owned() };
    RawBody { text, content_type: request.content_type(), empty }
}
