//! Request dispatch.
//!
//! [`RequestHandler`] takes one [`InboundRequest`] to one
//! [`OutboundResponse`]. It never fails: every outcome, including "no route"
//! and "handler blew up", is a response.
//!
//! # Decision order
//!
//! Routes are checked in registration order. The first check that rules out
//! every route decides the status:
//!
//! | Check | None left | Extra header |
//! |---|---|---|
//! | path matches | 404 | |
//! | method matches | 405 | `Allow` |
//! | `Accept` matches | 406 | `Accept` (what the route can produce) |
//! | authorizer allows | 401 | |
//! | `Content-Type` matches | 400 | |
//!
//! The authorizer runs on the route whose `Content-Type` matches, or on the
//! first acceptable route when none does.
//!
//! A request that survives all five reaches the route processor through the
//! middleware chain. Every response then gets `Content-Type` (the negotiated
//! media type) and `Access-Control-Allow-Origin`.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexSet;
use tracing::{debug, error, info};

use crate::auth::AuthType;
use crate::codec::{self, Format};
use crate::method::Method;
use crate::middleware;
use crate::mime::{self, MimeType};
use crate::processor;
use crate::request::InboundRequest;
use crate::response::{OutboundResponse, RouteResponse};
use crate::router::{RouteFunction, Router};
use crate::status::Status;

/// Dispatches requests against a finished [`Router`].
///
/// Cheap to clone; clones share the router.
#[derive(Clone, Debug)]
pub struct RequestHandler {
    router: Arc<Router>,
}

impl RequestHandler {
    pub fn new(router: Router) -> Self {
        Self { router: Arc::new(router) }
    }

    pub fn router(&self) -> &Router { &self.router }

    /// Handles one request.
    pub fn handle(&self, mut request: InboundRequest) -> OutboundResponse {
        request.normalize_headers();
        let accepted = request.accepted_media_types();
        let (response, negotiated) = self.route(request, &accepted);
        self.finish(response, &negotiated)
    }

    /// Picks the response and the media type to encode it in.
    fn route(&self, request: InboundRequest, accepted: &[MimeType]) -> (RouteResponse, MimeType) {
        let router = &*self.router;

        let on_path: Vec<&RouteFunction> = router
            .routes()
            .map(|(_, route)| route)
            .filter(|route| route.predicate().path_matches(request.path()))
            .collect();

        if on_path.is_empty() {
            return (not_found(router, &request, accepted), router.negotiate_default(accepted));
        }

        let candidates: Vec<&RouteFunction> = on_path
            .iter()
            .copied()
            .filter(|route| route.predicate().method_matches(&request))
            .collect();

        if candidates.is_empty() {
            return (method_not_allowed(&on_path, &request), router.negotiate_default(accepted));
        }

        let acceptable: Vec<&RouteFunction> = candidates
            .iter()
            .copied()
            .filter(|route| route.predicate().accept_matches(&request))
            .collect();

        let Some(&first_acceptable) = acceptable.first() else {
            return (not_acceptable(candidates[0], &request, accepted), router.negotiate_default(accepted));
        };

        let consuming = acceptable
            .iter()
            .copied()
            .find(|route| route.predicate().content_type_matches(&request));
        let route = consuming.unwrap_or(first_acceptable);
        let negotiated = route.predicate().matched_accept_type(accepted, &router.default_media_type());

        let authorizer = route.authorizer();
        if authorizer.auth_type() != AuthType::None {
            let result = authorizer.authorize(&request);
            if !result.authorized {
                info!(
                    method = %request.method(),
                    path = %request.path(),
                    authorizer = authorizer.simple_name(),
                    "request not authorized"
                );
                return (RouteResponse::plain(Status::Unauthorized, result.message), negotiated);
            }
        }

        if consuming.is_none() {
            return (unsupported_content_type(route, &request), negotiated);
        }

        let response = middleware::run_chain(router.middleware_chain(), request, |request| {
            processor::process(route, request)
        });
        (response, negotiated)
    }

    /// Encodes the body and writes the headers every response carries.
    fn finish(&self, response: RouteResponse, negotiated: &MimeType) -> OutboundResponse {
        let format = Format::for_mime(negotiated);
        let mut headers: HashMap<String, String> = response.headers().clone();

        let (status_code, body) = match codec::encode(&response, format) {
            Ok(body) => {
                insert_if_absent(&mut headers, "Content-Type", negotiated.to_string());
                (response.status_code(), body)
            }
            Err(e) => {
                error!(error = %e, "could not encode response");
                headers.retain(|name, _| !name.eq_ignore_ascii_case("content-type"));
                headers.insert("Content-Type".to_owned(), MimeType::plain_text().to_string());
                (
                    Status::InternalServerError.code(),
                    format!("Could not encode response as {negotiated}: {e}"),
                )
            }
        };
        insert_if_absent(&mut headers, "Access-Control-Allow-Origin", self.router.cors_domain().to_owned());

        OutboundResponse { status_code, headers, body }
    }
}

fn insert_if_absent(headers: &mut HashMap<String, String>, name: &str, value: String) {
    if !headers.keys().any(|k| k.eq_ignore_ascii_case(name)) {
        headers.insert(name.to_owned(), value);
    }
}

// ── Rejections ───────────────────────────────────────────────────────────────

fn not_found(router: &Router, request: &InboundRequest, accepted: &[MimeType]) -> RouteResponse {
    info!(method = %request.method(), path = %request.path(), "no route matched");
    for (predicate, _) in router.routes() {
        if predicate.method_matches(request) {
            debug!(candidate = %predicate, "route with the same method");
        }
    }
    RouteResponse::plain(
        Status::NotFound,
        format!(
            "No match found for route '{} {}' which accepts [{}]",
            request.method(),
            request.path(),
            mime::join(accepted)
        ),
    )
}

fn method_not_allowed(on_path: &[&RouteFunction], request: &InboundRequest) -> RouteResponse {
    let allowed: IndexSet<Method> = on_path.iter().map(|route| route.predicate().method()).collect();
    let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
    info!(method = %request.method(), path = %request.path(), allow = %allow, "method not allowed");

    RouteResponse::plain(
        Status::MethodNotAllowed,
        format!("Method {} not allowed for path {}", request.method(), request.path()),
    )
    .header("Allow", allow)
}

fn not_acceptable(route: &RouteFunction, request: &InboundRequest, accepted: &[MimeType]) -> RouteResponse {
    let produces: Vec<MimeType> = route.predicate().produces().iter().cloned().collect();
    let supported = mime::join(&produces);
    info!(
        method = %request.method(),
        path = %request.path(),
        route = %route.predicate(),
        "no acceptable media type"
    );

    RouteResponse::plain(
        Status::NotAcceptable,
        format!(
            "Requested media types [{}] are not supported by {} {}; it produces [{supported}]",
            mime::join(accepted),
            route.predicate().method(),
            route.predicate().path_pattern(),
        ),
    )
    .header("Accept", supported)
}

fn unsupported_content_type(route: &RouteFunction, request: &InboundRequest) -> RouteResponse {
    let consumes: Vec<MimeType> = route.predicate().consumes().iter().cloned().collect();
    let sent = request.content_type().map(|m| m.to_string()).unwrap_or_else(|| "none".to_owned());
    info!(
        method = %request.method(),
        path = %request.path(),
        content_type = %sent,
        "unsupported content type"
    );

    RouteResponse::plain(
        Status::BadRequest,
        format!(
            "Content-Type {sent} is not supported by {} {}; it consumes [{}]",
            route.predicate().method(),
            route.predicate().path_pattern(),
            mime::join(&consumes),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;
    use crate::response::Response;

    fn handler(routes: impl FnOnce(&mut Router)) -> RequestHandler {
        RequestHandler::new(Router::build(routes))
    }

    fn hello(_: Request<()>) -> Response<&'static str> {
        Response::ok("hello")
    }

    #[test]
    fn headers_are_always_written() {
        let handler = handler(|r| {
            r.get("/x", hello);
        });
        let response = handler.handle(InboundRequest::new("GET", "/missing"));
        assert_eq!(response.status_code, 404);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("access-control-allow-origin"), Some("*"));
    }

    #[test]
    fn handler_content_type_wins() {
        let handler = handler(|r| {
            r.get("/x", |_: Request<()>| Response::ok("<p/>").header("Content-Type", "text/html"));
        });
        let response = handler.handle(InboundRequest::new("GET", "/x").with_header("Accept", "*/*"));
        assert_eq!(response.status_code, 200);
        assert_eq!(response.header("content-type"), Some("text/html"));
        assert_eq!(response.headers.len(), 2);
    }

    #[test]
    fn encode_failure_is_plain_text() {
        let handler = handler(|r| {
            r.get("/x", |_: Request<()>| Response::ok(serde_json::json!({ "1st": true })))
                .supplies([MimeType::xml()]);
        });
        let response = handler.handle(InboundRequest::new("GET", "/x").with_header("Accept", "application/xml"));
        assert_eq!(response.status_code, 500);
        assert_eq!(response.header("content-type"), Some("text/plain"));
        assert!(response.body.starts_with("Could not encode response as application/xml"));
    }

    #[test]
    fn first_registered_overlapping_route_wins() {
        let handler = handler(|r| {
            r.get("/items/{id}", |_: Request<()>| Response::ok("by id"));
            r.get("/items/special", |_: Request<()>| Response::ok("special"));
        });
        let response = handler.handle(InboundRequest::new("GET", "/items/special").with_header("accept", "*/*"));
        assert_eq!(response.body, r#""by id""#);
    }

    #[test]
    fn content_type_mismatch_is_a_bad_request() {
        let handler = handler(|r| {
            r.post("/x", |req: Request<String>| Response::ok(req.into_body()));
        });
        let request = InboundRequest::new("POST", "/x")
            .with_header("Accept", "application/json")
            .with_header("Content-Type", "text/csv")
            .with_body("a,b");
        let response = handler.handle(request);
        assert_eq!(response.status_code, 400);
        assert!(response.body.starts_with("Content-Type text/csv is not supported by POST /x"));
    }

    #[test]
    fn authorization_comes_before_content_type() {
        use crate::auth::{AuthResult, Authorizer};

        struct Deny;
        impl Authorizer for Deny {
            fn simple_name(&self) -> &str { "deny" }
            fn auth_type(&self) -> AuthType { AuthType::Bearer }
            fn authorize(&self, _: &InboundRequest) -> AuthResult { AuthResult::deny("reason") }
        }

        let handler = handler(|r| {
            r.auth(Deny, |r| {
                r.post("/x", |req: Request<String>| Response::ok(req.into_body()));
            });
        });
        let request = InboundRequest::new("POST", "/x")
            .with_header("Accept", "application/json")
            .with_header("Content-Type", "text/csv")
            .with_body("a,b");
        let response = handler.handle(request);
        assert_eq!(response.status_code, 401);
        assert_eq!(response.body, "reason");
    }

    #[test]
    fn lowercased_headers_reach_the_handler() {
        let handler = handler(|r| {
            r.get("/x", |req: Request<()>| {
                Response::ok(req.headers().contains_key("x-request-id"))
            });
        });
        let request = InboundRequest::new("GET", "/x")
            .with_header("Accept", "application/json")
            .with_header("X-Request-Id", "abc");
        assert_eq!(handler.handle(request).body, "true");
    }

    #[test]
    fn unsupported_method_on_a_registered_route() {
        let handler = handler(|r| {
            r.on(Method::Options, "/x", hello);
        });
        let response = handler.handle(InboundRequest::new("OPTIONS", "/x").with_header("Accept", "*/*"));
        assert_eq!(response.status_code, 405);
        assert_eq!(response.body, "Method OPTIONS not supported for path /x");
        assert!(response.header("allow").is_none());
    }
}
