//! # viaduct
//!
//! A small, declarative request router for serverless HTTP functions.
//!
//! One request in, one response out. You describe routes with a builder,
//! hand the finished [`Router`] to a [`RequestHandler`], and feed it
//! [`InboundRequest`]s from whatever host you run on: API Gateway through
//! the `lambda` feature, the bundled hyper [`Server`], or a test.
//!
//! ## What the dispatcher does for you
//!
//! - Path templates with `{name}` placeholders, matched segment by segment
//! - Content negotiation on `Accept` and `Content-Type` (JSON, YAML, plain
//!   text, HTML, XML)
//! - Typed bodies: `post`, `put` and `patch` handlers receive
//!   `Request<T>` for any `T: Deserialize`
//! - A per-group authorization gate and an onion-ordered middleware chain
//! - A fixed status table for everything that goes wrong: 404, 405, 406,
//!   401, 400, 500
//!
//! ## Quick start
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use viaduct::{InboundRequest, Request, RequestHandler, Response, Router};
//!
//! #[derive(Deserialize, Serialize)]
//! struct Person { name: String, age: u32 }
//!
//! let router = Router::build(|r| {
//!     r.get("/people/{name}", |req: Request<()>| {
//!         let name = req.param("name").unwrap_or_default();
//!         Response::ok(Person { name: name.to_owned(), age: 42 })
//!     });
//!     r.post("/people", |req: Request<Person>| Response::created(req.into_body()));
//! });
//!
//! let handler = RequestHandler::new(router);
//! let response = handler.handle(
//!     InboundRequest::new("GET", "/people/ada").with_header("Accept", "application/json"),
//! );
//! assert_eq!(response.status_code, 200);
//! assert_eq!(response.body, r#"{"name":"ada","age":42}"#);
//! ```

mod auth;
mod codec;
mod config;
mod dispatch;
mod error;
mod handler;
mod method;
mod mime;
mod predicate;
mod processor;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod middleware;

#[cfg(feature = "lambda")]
pub mod lambda;

pub use auth::{AuthResult, AuthType, Authorizer, NoAuth, SharedAuthorizer};
pub use codec::Format;
pub use config::Config;
pub use dispatch::RequestHandler;
pub use error::{DecodeError, Error, HandlerError};
pub use method::Method;
pub use mime::MimeType;
pub use predicate::{MatchResult, RequestPredicate};
pub use request::{InboundRequest, Request};
pub use response::{IntoHandlerResult, OutboundResponse, Response, RouteResponse, SerializeAs};
pub use router::{RouteFunction, Router};
pub use server::Server;
pub use status::Status;
