//! HTTP status codes as a typed enum.
//!
//! Use [`Status`] wherever a status is accepted; [`Response`](crate::Response)
//! stores the numeric code so handlers can still return anything they like.
//!
//! ```rust
//! use viaduct::{Response, Status};
//!
//! let created: Response<String> = Response::with_status(Status::Created);
//! assert_eq!(created.status_code(), 201);
//! ```

/// The status codes the router produces itself, plus the ones handlers
/// reach for most often.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                  // 200
    Created,             // 201
    Accepted,            // 202
    NoContent,           // 204

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,          // 400
    Unauthorized,        // 401
    Forbidden,           // 403
    NotFound,            // 404
    MethodNotAllowed,    // 405
    NotAcceptable,       // 406
    Conflict,            // 409
    ImATeapot,           // 418

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError, // 500
    NotImplemented,      // 501
}

impl Status {
    /// Numeric status code.
    pub fn code(self) -> u16 {
        self.into()
    }

    /// Canonical reason phrase.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Ok                  => "OK",
            Self::Created             => "Created",
            Self::Accepted            => "Accepted",
            Self::NoContent           => "No Content",
            Self::BadRequest          => "Bad Request",
            Self::Unauthorized        => "Unauthorized",
            Self::Forbidden           => "Forbidden",
            Self::NotFound            => "Not Found",
            Self::MethodNotAllowed    => "Method Not Allowed",
            Self::NotAcceptable       => "Not Acceptable",
            Self::Conflict            => "Conflict",
            Self::ImATeapot           => "I'm a Teapot",
            Self::InternalServerError => "Internal Server Error",
            Self::NotImplemented      => "Not Implemented",
        }
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        match s {
            Status::Ok                  => 200,
            Status::Created             => 201,
            Status::Accepted            => 202,
            Status::NoContent           => 204,
            Status::BadRequest          => 400,
            Status::Unauthorized        => 401,
            Status::Forbidden           => 403,
            Status::NotFound            => 404,
            Status::MethodNotAllowed    => 405,
            Status::NotAcceptable       => 406,
            Status::Conflict            => 409,
            Status::ImATeapot           => 418,
            Status::InternalServerError => 500,
            Status::NotImplemented      => 501,
        }
    }
}
