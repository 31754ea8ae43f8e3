//! AWS Lambda host (feature `lambda`).
//!
//! Converts API Gateway (REST and HTTP API), ALB and Function URL events
//! into [`InboundRequest`]s, dispatches them, and hands the
//! [`OutboundResponse`] back to the runtime.
//!
//! ```rust,ignore
//! use viaduct::{Request, RequestHandler, Response, Router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), lambda_http::Error> {
//!     viaduct::lambda::init_tracing();
//!     let router = Router::build(|r| {
//!         r.get("/ping", |_: Request<()>| Response::ok("pong"));
//!     });
//!     viaduct::lambda::run(RequestHandler::new(router)).await
//! }
//! ```

use lambda_http::{Body, Error, Request, RequestExt, Response, service_fn};
use tracing::{debug, info};

use crate::dispatch::RequestHandler;
use crate::request::InboundRequest;
use crate::response::OutboundResponse;

/// Runs the Lambda runtime loop. Returns only if the runtime shuts down.
pub async fn run(handler: RequestHandler) -> Result<(), Error> {
    info!(routes = handler.router().len(), "starting viaduct Lambda runtime");

    lambda_http::run(service_fn(move |event: Request| {
        let handler = handler.clone();
        async move { handle_event(&handler, event) }
    }))
    .await
}

fn handle_event(handler: &RequestHandler, event: Request) -> Result<Response<Body>, Error> {
    let inbound = from_event(event);
    debug!(method = %inbound.method(), path = %inbound.path(), "handling Lambda event");
    let outbound = handler.handle(inbound);
    debug!(status = outbound.status_code, "Lambda response");
    into_lambda(outbound)
}

/// The path used for matching is the raw path, before any API Gateway
/// stage prefix is stripped.
pub(crate) fn from_event(event: Request) -> InboundRequest {
    let path = event.raw_http_path().to_owned();
    let (parts, body) = event.into_parts();

    let body = match body {
        Body::Empty => String::new(),
        Body::Text(text) => text,
        Body::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
    };

    let mut inbound = InboundRequest::new(parts.method.as_str(), path).with_body(body);
    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            inbound.append_header(name.as_str(), value);
        }
    }
    inbound
}

fn into_lambda(outbound: OutboundResponse) -> Result<Response<Body>, Error> {
    let mut builder = Response::builder().status(outbound.status_code);
    for (name, value) in &outbound.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let body = if outbound.body.is_empty() { Body::Empty } else { Body::Text(outbound.body) };
    Ok(builder.body(body)?)
}

/// Installs a JSON `tracing` subscriber filtered by `RUST_LOG` (default
/// `info`), the format CloudWatch Logs Insights parses.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
        .init();
}
