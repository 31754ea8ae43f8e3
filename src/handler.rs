//! Handler type erasure.
//!
//! # How typed handlers are stored
//!
//! Every route has its own body type `I` and response type `O`, but the
//! router keeps them all in one table. Each handler is wrapped in a small
//! struct that knows its `I` and `O` and implements [`ErasedHandler`], a
//! trait object with one uniform signature:
//!
//! ```text
//! |req: Request<Person>| Response::ok(req.into_body())   ← user writes this
//!        ↓ router.post("/people", handler)
//! Arc::new(Decoding::new(handler))                       ← knows I = Person
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(inbound, pattern, body)                   ← one vtable dispatch
//!        ↓
//! decode body → run handler → erase Response<O> to RouteResponse
//! ```
//!
//! Bodyless routes (`GET`, `DELETE`) use [`Bodyless`], which never decodes.

use std::any::Any;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec;
use crate::error::{DecodeError, HandlerError};
use crate::mime::MimeType;
use crate::request::{InboundRequest, Request};
use crate::response::{IntoHandlerResult, Response, RouteResponse};

/// The request body as extracted by the route processor.
#[derive(Clone, Debug)]
pub(crate) struct RawBody {
    pub(crate) text: String,
    pub(crate) content_type: Option<MimeType>,
    /// Set for `Content-Length: 0`. The body is then the empty string and
    /// is never run through a format decoder.
    pub(crate) empty: bool,
}

/// Why an erased handler call produced no response.
#[derive(Debug)]
pub(crate) enum HandlerFailure {
    Decode(DecodeError),
    Fault(String),
}

/// Uniform call interface over typed handlers.
pub(crate) trait ErasedHandler: Send + Sync + 'static {
    fn call(
        &self,
        inbound: InboundRequest,
        path_pattern: &str,
        body: Option<RawBody>,
    ) -> Result<RouteResponse, HandlerFailure>;
}

/// Shared across every concurrent invocation that reads the registry.
pub(crate) type BoxedHandler = Arc<dyn ErasedHandler>;

// ── Bodyless ─────────────────────────────────────────────────────────────────

/// Wraps a handler taking `Request<()>`.
pub(crate) struct Bodyless<F, O> {
    f: F,
    _output: PhantomData<fn() -> O>,
}

impl<F, O> Bodyless<F, O> {
    pub(crate) fn new(f: F) -> Self {
        Self { f, _output: PhantomData }
    }
}

impl<F, R, O> ErasedHandler for Bodyless<F, O>
where
    F: Fn(Request<()>) -> R + Send + Sync + 'static,
    R: IntoHandlerResult<O>,
    O: Serialize + 'static,
{
    fn call(
        &self,
        inbound: InboundRequest,
        path_pattern: &str,
        _body: Option<RawBody>,
    ) -> Result<RouteResponse, HandlerFailure> {
        let request = Request::new(inbound, (), path_pattern);
        invoke(|| (self.f)(request).into_handler_result())
    }
}

// ── Decoding ─────────────────────────────────────────────────────────────────

/// Wraps a handler taking `Request<I>`; decodes the body into `I` first.
pub(crate) struct Decoding<F, I, O> {
    f: F,
    _types: PhantomData<fn() -> (I, O)>,
}

impl<F, I, O> Decoding<F, I, O> {
    pub(crate) fn new(f: F) -> Self {
        Self { f, _types: PhantomData }
    }
}

impl<F, R, I, O> ErasedHandler for Decoding<F, I, O>
where
    F: Fn(Request<I>) -> R + Send + Sync + 'static,
    R: IntoHandlerResult<O>,
    I: DeserializeOwned + 'static,
    O: Serialize + 'static,
{
    fn call(
        &self,
        inbound: InboundRequest,
        path_pattern: &str,
        body: Option<RawBody>,
    ) -> Result<RouteResponse, HandlerFailure> {
        let decoded: I = match body {
            Some(RawBody { empty: true, .. }) | None => codec::decode_raw(""),
            Some(RawBody { text, content_type, .. }) => codec::decode(&text, content_type.as_ref()),
        }
        .map_err(HandlerFailure::Decode)?;
        let request = Request::new(inbound, decoded, path_pattern);
        invoke(|| (self.f)(request).into_handler_result())
    }
}

// ── Invocation ───────────────────────────────────────────────────────────────

/// Runs the user's code, turning errors and panics into `Fault`s.
fn invoke<O: Serialize>(
    f: impl FnOnce() -> Result<Response<O>, HandlerError>,
) -> Result<RouteResponse, HandlerFailure> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(response)) => response
            .erase()
            .map_err(|e| HandlerFailure::Fault(format!("could not serialize response: {e}"))),
        Ok(Err(e)) => Err(HandlerFailure::Fault(e.to_string())),
        Err(payload) => Err(HandlerFailure::Fault(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("handler panicked: {s}")
    } else {
        "handler panicked".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Serialize)]
    struct Named {
        name: String,
    }

    fn json_body(text: &str) -> Option<RawBody> {
        Some(RawBody { text: text.to_owned(), content_type: Some(MimeType::json()), empty: false })
    }

    #[test]
    fn bodyless_sees_path_parameters() {
        let handler = Bodyless::<_, String>::new(|req: Request<()>| {
            Response::ok(req.param("id").unwrap_or_default().to_owned())
        });
        let response = handler
            .call(InboundRequest::new("GET", "/items/9"), "/items/{id}", None)
            .unwrap();
        assert_eq!(response.body(), Some(&serde_json::json!("9")));
    }

    #[test]
    fn decoding_hands_over_typed_body() {
        let handler =
            Decoding::<_, Named, String>::new(|req: Request<Named>| Response::ok(req.into_body().name));
        let response = handler
            .call(InboundRequest::new("POST", "/n"), "/n", json_body(r#"{"name":"bo"}"#))
            .unwrap();
        assert_eq!(response.body(), Some(&serde_json::json!("bo")));
    }

    #[test]
    fn decode_errors_are_reported() {
        let handler =
            Decoding::<_, Named, Named>::new(|req: Request<Named>| Response::ok(req.into_body()));
        let failure = handler
            .call(InboundRequest::new("POST", "/n"), "/n", json_body("{}"))
            .unwrap_err();
        assert!(matches!(failure, HandlerFailure::Decode(DecodeError::MissingField(_))));
    }

    #[test]
    fn empty_body_skips_the_format_decoder() {
        let handler =
            Decoding::<_, String, usize>::new(|req: Request<String>| Response::ok(req.into_body().len()));
        let body = RawBody { text: String::new(), content_type: Some(MimeType::json()), empty: true };
        let response = handler
            .call(InboundRequest::new("POST", "/n"), "/n", Some(body))
            .unwrap();
        assert_eq!(response.body(), Some(&serde_json::json!(0)));
    }

    #[test]
    fn errors_and_panics_become_faults() {
        let failing = Bodyless::<_, ()>::new(|_: Request<()>| -> Result<Response<()>, HandlerError> {
            Err("database unreachable".into())
        });
        match failing.call(InboundRequest::new("GET", "/"), "/", None) {
            Err(HandlerFailure::Fault(message)) => assert_eq!(message, "database unreachable"),
            other => panic!("unexpected: {other:?}"),
        }

        let panicking = Bodyless::<_, ()>::new(|_: Request<()>| -> Response<()> { panic!("boom") });
        match panicking.call(InboundRequest::new("GET", "/"), "/", None) {
            Err(HandlerFailure::Fault(message)) => assert_eq!(message, "handler panicked: boom"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
