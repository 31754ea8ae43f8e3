//! Route predicates: what a registered route matches on.
//!
//! Matching is split into independent checks (path, method, accept,
//! content type) so the dispatcher can tell *which* one failed and answer
//! 404, 405 or 406 accordingly. [`RequestPredicate::match_request`] runs all
//! four at once when the full picture is wanted.

use std::fmt;

use indexmap::IndexSet;

use crate::method::Method;
use crate::mime::{self, MimeType};
use crate::request::InboundRequest;

/// Returns the name inside a `{name}` path segment.
pub(crate) fn placeholder_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

/// Describes one registered route.
///
/// A route is identified by its method and path pattern. Placeholder
/// segments (`{id}`) match any concrete segment; there are no type or regex
/// constraints on them.
#[derive(Clone, Debug)]
pub struct RequestPredicate {
    method: Method,
    path_pattern: String,
    consumes: IndexSet<MimeType>,
    produces: IndexSet<MimeType>,
    body_type: Option<&'static str>,
}

impl RequestPredicate {
    pub fn new(
        method: Method,
        path_pattern: impl Into<String>,
        consumes: impl IntoIterator<Item = MimeType>,
        produces: impl IntoIterator<Item = MimeType>,
    ) -> Self {
        Self {
            method,
            path_pattern: path_pattern.into(),
            consumes: consumes.into_iter().collect(),
            produces: produces.into_iter().collect(),
            body_type: None,
        }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path_pattern(&self) -> &str { &self.path_pattern }
    pub fn consumes(&self) -> &IndexSet<MimeType> { &self.consumes }
    pub fn produces(&self) -> &IndexSet<MimeType> { &self.produces }

    /// Alias for [`consumes`](Self::consumes).
    pub fn accepts(&self) -> &IndexSet<MimeType> { &self.consumes }

    /// Name of the type the request body decodes into. Only set for routes
    /// registered through `post`, `put` or `patch`.
    pub fn body_type(&self) -> Option<&'static str> { self.body_type }

    pub(crate) fn set_body_type(&mut self, name: &'static str) {
        self.body_type = Some(name);
    }

    pub(crate) fn prefix_path(&mut self, prefix: &str) {
        self.path_pattern = format!("{prefix}{}", self.path_pattern);
    }

    /// Placeholder names in the order they appear in the pattern.
    pub fn path_variables(&self) -> Vec<&str> {
        self.path_pattern.split('/').filter_map(placeholder_name).collect()
    }

    /// Replaces the media types this route accepts.
    pub fn expects(&mut self, types: impl IntoIterator<Item = MimeType>) -> &mut Self {
        self.consumes = types.into_iter().collect();
        self
    }

    /// Replaces the media types this route produces.
    pub fn supplies(&mut self, types: impl IntoIterator<Item = MimeType>) -> &mut Self {
        self.produces = types.into_iter().collect();
        self
    }

    // ── Matching ──────────────────────────────────────────────────────────────

    /// Segment-wise match against a concrete path.
    pub fn path_matches(&self, path: &str) -> bool {
        let route_parts: Vec<&str> = self.path_pattern.split('/').collect();
        let input_parts: Vec<&str> = path.split('/').collect();

        if route_parts.len() != input_parts.len() {
            return false;
        }

        route_parts
            .iter()
            .zip(&input_parts)
            .all(|(route, input)| placeholder_name(route).is_some() || route == input)
    }

    pub fn method_matches(&self, request: &InboundRequest) -> bool {
        self.method.matches(request.method())
    }

    /// True if the client accepts something this route produces.
    ///
    /// A route that produces nothing matches a client that accepts nothing.
    /// Otherwise a missing `Accept` header matches nothing.
    pub fn accept_matches(&self, request: &InboundRequest) -> bool {
        let accepted = request.accepted_media_types();
        if self.produces.is_empty() && accepted.is_empty() {
            return true;
        }
        self.produces
            .iter()
            .any(|produced| accepted.iter().any(|a| produced.is_compatible_with(a)))
    }

    /// True if the request's `Content-Type` is one this route consumes.
    pub fn content_type_matches(&self, request: &InboundRequest) -> bool {
        if self.consumes.is_empty() {
            return true;
        }
        match request.content_type() {
            Some(content_type) => self.consumes.contains(&content_type),
            None => false,
        }
    }

    /// First produced type compatible with the client's list, else `default`.
    pub fn matched_accept_type(&self, accepted: &[MimeType], default: &MimeType) -> MimeType {
        self.produces
            .iter()
            .find(|produced| accepted.iter().any(|a| produced.is_compatible_with(a)))
            .unwrap_or(default)
            .clone()
    }

    /// Runs every check against `request`.
    pub fn match_request(&self, request: &InboundRequest) -> MatchResult {
        MatchResult {
            path: self.path_matches(request.path()),
            method: self.method_matches(request),
            accept: self.accept_matches(request),
            content_type: self.content_type_matches(request),
        }
    }
}

impl fmt::Display for RequestPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let consumes: Vec<MimeType> = self.consumes.iter().cloned().collect();
        let produces: Vec<MimeType> = self.produces.iter().cloned().collect();
        write!(
            f,
            "{} {}[{}]->[{}]",
            self.method,
            self.path_pattern,
            mime::join(&consumes),
            mime::join(&produces),
        )
    }
}

/// Outcome of each matching check for one route.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MatchResult {
    pub path: bool,
    pub method: bool,
    pub accept: bool,
    pub content_type: bool,
}

impl MatchResult {
    pub fn matches(&self) -> bool {
        self.path && self.method && self.accept && self.content_type
    }
}
