//! Request types.
//!
//! [`InboundRequest`] is the transport-neutral shape every host converts its
//! events into. [`Request`] is what a handler receives once a route matched:
//! the inbound request plus the decoded body and the path parameters.

use std::collections::HashMap;

use crate::mime::MimeType;
use crate::predicate::placeholder_name;

/// A raw request as handed over by the host (API Gateway, a local server,
/// a test).
#[derive(Clone, Debug, Default)]
pub struct InboundRequest {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) headers: HashMap<String, String>,
    pub(crate) body: String,
}

impl InboundRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: HashMap::new(),
            body: String::new(),
        }
    }

    /// Adds a header. Returns `self` for chaining.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn body(&self) -> &str { &self.body }
    pub fn headers(&self) -> &HashMap<String, String> { &self.headers }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets a header, replacing any existing value under any casing.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    /// Adds a header value, folding it into any existing value under any
    /// casing as a comma-separated list.
    pub fn append_header(&mut self, name: &str, value: &str) {
        let folded = match self.header(name) {
            Some(existing) => format!("{existing}, {value}"),
            None => value.to_owned(),
        };
        self.set_header(name, folded);
    }

    /// The `Accept` header as an ordered list. Empty when the header is absent.
    pub fn accepted_media_types(&self) -> Vec<MimeType> {
        self.header("accept").map(MimeType::parse_list).unwrap_or_default()
    }

    /// The `Content-Type` header, if any.
    pub fn content_type(&self) -> Option<MimeType> {
        self.header("content-type").map(MimeType::parse)
    }

    /// Lower-cases every header name.
    pub(crate) fn normalize_headers(&mut self) {
        self.headers = std::mem::take(&mut self.headers)
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
    }
}

/// A matched request with a decoded body of type `I`.
///
/// Bodyless routes (`GET`, `DELETE`) use `Request<()>`.
#[derive(Clone, Debug)]
pub struct Request<I> {
    inbound: InboundRequest,
    body: I,
    path_pattern: String,
    path_parameters: HashMap<String, String>,
}

impl<I> Request<I> {
    pub fn new(inbound: InboundRequest, body: I, path_pattern: impl Into<String>) -> Self {
        let path_pattern = path_pattern.into();
        let path_parameters = extract_parameters(&path_pattern, &inbound.path);
        Self { inbound, body, path_pattern, path_parameters }
    }

    pub fn body(&self) -> &I { &self.body }
    pub fn into_body(self) -> I { self.body }
    pub fn inbound(&self) -> &InboundRequest { &self.inbound }
    pub fn path_pattern(&self) -> &str { &self.path_pattern }
    pub fn path_parameters(&self) -> &HashMap<String, String> { &self.path_parameters }
    pub fn headers(&self) -> &HashMap<String, String> { self.inbound.headers() }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inbound.header(name)
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.path_parameters.get(key).map(String::as_str)
    }
}

fn extract_parameters(pattern: &str, path: &str) -> HashMap<String, String> {
    let values: Vec<&str> = path.split('/').collect();
    pattern
        .split('/')
        .enumerate()
        .filter_map(|(i, segment)| {
            let name = placeholder_name(segment)?;
            let value = values.get(i)?;
            Some((name.to_owned(), (*value).to_owned()))
        })
        .collect()
}
