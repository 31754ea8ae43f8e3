//! Authorization gate.
//!
//! Every route carries an [`Authorizer`]. Routes registered outside an
//! `auth(...)` block get [`NoAuth`], which the dispatcher skips entirely.

use std::fmt;
use std::sync::Arc;

use crate::request::InboundRequest;

/// The authentication scheme an authorizer implements. Documentation
/// tooling reads this; the dispatcher only cares whether it is `None`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AuthType {
    None,
    Basic,
    Bearer,
    Jwt,
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None   => "NONE",
            Self::Basic  => "BASIC",
            Self::Bearer => "BEARER",
            Self::Jwt    => "JWT",
        })
    }
}

/// Result of an authorization attempt. `message` is sent back as the body
/// of the 401 when `authorized` is false.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuthResult {
    pub authorized: bool,
    pub message: String,
}

impl AuthResult {
    pub fn allow() -> Self {
        Self { authorized: true, message: String::new() }
    }

    pub fn deny(message: impl Into<String>) -> Self {
        Self { authorized: false, message: message.into() }
    }
}

/// A pluggable allow/deny check, evaluated before the handler runs.
///
/// ```rust
/// use viaduct::{AuthResult, AuthType, Authorizer, InboundRequest};
///
/// struct ApiKey(&'static str);
///
/// impl Authorizer for ApiKey {
///     fn simple_name(&self) -> &str { "API key" }
///     fn auth_type(&self) -> AuthType { AuthType::Bearer }
///     fn authorize(&self, request: &InboundRequest) -> AuthResult {
///         match request.header("x-api-key") {
///             Some(key) if key == self.0 => AuthResult::allow(),
///             _ => AuthResult::deny("missing or invalid API key"),
///         }
///     }
/// }
/// ```
pub trait Authorizer: Send + Sync + 'static {
    /// Human-friendly name; not functionally relevant.
    fn simple_name(&self) -> &str;
    fn auth_type(&self) -> AuthType;
    fn authorize(&self, request: &InboundRequest) -> AuthResult;
}

/// Shared handle to an authorizer. Many routes point at the same one.
pub type SharedAuthorizer = Arc<dyn Authorizer>;

/// Allows every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAuth;

impl Authorizer for NoAuth {
    fn simple_name(&self) -> &str { "No authorization" }
    fn auth_type(&self) -> AuthType { AuthType::None }
    fn authorize(&self, _request: &InboundRequest) -> AuthResult { AuthResult::allow() }
}
