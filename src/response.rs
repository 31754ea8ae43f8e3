//! Response types.
//!
//! Handlers build a typed [`Response<T>`]. The router erases it to
//! [`RouteResponse`] (the body becomes a `serde_json::Value`) so middleware
//! can work on any route's output, and finally encodes it into an
//! [`OutboundResponse`] for the host.

use std::any::type_name;
use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::HandlerError;
use crate::status::Status;

// ── SerializeAs ──────────────────────────────────────────────────────────────

/// How the body is turned into bytes at the boundary.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SerializeAs {
    /// Encode with the negotiated format. Carries the body's type name.
    Declared(&'static str),
    /// Write the body string verbatim, whatever was negotiated. Used for the
    /// router's own error messages.
    PlainString,
}

// ── Response ─────────────────────────────────────────────────────────────────

/// A handler's response: status, optional body, headers.
///
/// ```rust
/// use viaduct::{Response, Status};
///
/// let ok = Response::ok("hello");
/// let created = Response::created(vec![1, 2, 3]).header("Location", "/items/3");
/// let gone: Response<()> = Response::with_status(Status::NoContent);
/// ```
#[derive(Clone, Debug)]
pub struct Response<T> {
    pub(crate) status: u16,
    pub(crate) body: Option<T>,
    pub(crate) headers: HashMap<String, String>,
    pub(crate) serialize_as: SerializeAs,
}

impl<T> Response<T> {
    pub fn new(status: impl Into<u16>, body: Option<T>) -> Self {
        Self {
            status: status.into(),
            body,
            headers: HashMap::new(),
            serialize_as: SerializeAs::Declared(type_name::<T>()),
        }
    }

    /// Response with no body.
    pub fn with_status(status: Status) -> Self {
        Self::new(status, None)
    }

    /// `200 OK`
    pub fn ok(body: T) -> Self { Self::new(Status::Ok, Some(body)) }

    /// `201 Created`
    pub fn created(body: T) -> Self { Self::new(Status::Created, Some(body)) }

    /// `202 Accepted`
    pub fn accepted() -> Self { Self::with_status(Status::Accepted) }

    /// `204 No Content`
    pub fn no_content() -> Self { Self::with_status(Status::NoContent) }

    /// `400 Bad Request`
    pub fn bad_request(body: T) -> Self { Self::new(Status::BadRequest, Some(body)) }

    /// `401 Unauthorized`
    pub fn unauthorized(body: T) -> Self { Self::new(Status::Unauthorized, Some(body)) }

    /// `404 Not Found`
    pub fn not_found(body: T) -> Self { Self::new(Status::NotFound, Some(body)) }

    /// `405 Method Not Allowed`. Per RFC 9110 the caller should add `Allow`.
    pub fn method_not_allowed(body: T) -> Self { Self::new(Status::MethodNotAllowed, Some(body)) }

    /// `406 Not Acceptable`
    pub fn not_acceptable(body: T) -> Self { Self::new(Status::NotAcceptable, Some(body)) }

    /// `409 Conflict`
    pub fn conflict(body: T) -> Self { Self::new(Status::Conflict, Some(body)) }

    /// `500 Internal Server Error`
    pub fn server_error(body: T) -> Self { Self::new(Status::InternalServerError, Some(body)) }

    /// `501 Not Implemented`
    pub fn not_implemented() -> Self { Self::with_status(Status::NotImplemented) }

    /// Adds a header. Returns `self` for chaining.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    pub fn status_code(&self) -> u16 { self.status }
    pub fn body(&self) -> Option<&T> { self.body.as_ref() }
    pub fn into_body(self) -> Option<T> { self.body }
    pub fn headers(&self) -> &HashMap<String, String> { &self.headers }
    pub fn serialize_as(&self) -> &SerializeAs { &self.serialize_as }

    /// Case-insensitive header lookup.
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl<T: Serialize> Response<T> {
    /// Converts the typed body into a [`Value`], keeping status, headers and
    /// the serialize-as tag.
    pub(crate) fn erase(self) -> Result<RouteResponse, serde_json::Error> {
        let body = self.body.map(|b| serde_json::to_value(&b)).transpose()?;
        Ok(Response {
            status: self.status,
            body,
            headers: self.headers,
            serialize_as: self.serialize_as,
        })
    }
}

/// A response whose body type has been erased. This is what middleware sees.
pub type RouteResponse = Response<Value>;

impl Response<Value> {
    /// A response whose body is written out verbatim as plain text.
    pub fn plain(status: Status, message: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            body: Some(Value::String(message.into())),
            headers: HashMap::new(),
            serialize_as: SerializeAs::PlainString,
        }
    }
}

// ── Handler results ──────────────────────────────────────────────────────────

/// Implemented for everything a handler may return: a bare [`Response`], or
/// a `Result` whose error becomes a 500.
pub trait IntoHandlerResult<O> {
    fn into_handler_result(self) -> Result<Response<O>, HandlerError>;
}

impl<O> IntoHandlerResult<O> for Response<O> {
    fn into_handler_result(self) -> Result<Response<O>, HandlerError> { Ok(self) }
}

impl<O, E> IntoHandlerResult<O> for Result<Response<O>, E>
where
    E: Into<HandlerError>,
{
    fn into_handler_result(self) -> Result<Response<O>, HandlerError> {
        self.map_err(Into::into)
    }
}

// ── OutboundResponse ─────────────────────────────────────────────────────────

/// The encoded response handed back to the host.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OutboundResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl OutboundResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
