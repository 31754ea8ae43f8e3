//! Route registry.
//!
//! Routes live in an insertion-ordered map keyed by method and path pattern.
//! Dispatch walks them in registration order, so the first route registered
//! for an overlapping pattern wins. Build the router once at startup; after
//! that it is only ever read.

use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::{AuthType, Authorizer, NoAuth, SharedAuthorizer};
use crate::config::Config;
use crate::handler::{Bodyless, BoxedHandler, Decoding};
use crate::method::Method;
use crate::middleware::{Middleware, SharedMiddleware};
use crate::mime::MimeType;
use crate::predicate::RequestPredicate;
use crate::request::Request;
use crate::response::IntoHandlerResult;

type RouteKey = (Method, String);

// ── RouteFunction ────────────────────────────────────────────────────────────

/// A registered route: what it matches, who may call it, what it runs.
#[derive(Clone)]
pub struct RouteFunction {
    predicate: RequestPredicate,
    authorizer: SharedAuthorizer,
    handler: BoxedHandler,
}

impl RouteFunction {
    pub fn predicate(&self) -> &RequestPredicate { &self.predicate }
    pub fn authorizer(&self) -> &dyn Authorizer { self.authorizer.as_ref() }
    pub(crate) fn handler(&self) -> &BoxedHandler { &self.handler }
}

impl fmt::Debug for RouteFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteFunction")
            .field("predicate", &self.predicate.to_string())
            .field("authorizer", &self.authorizer.simple_name())
            .finish_non_exhaustive()
    }
}

// ── Router ───────────────────────────────────────────────────────────────────

/// The application router.
///
/// Each verb registers a handler and returns the route's
/// [`RequestPredicate`] so its media types can be adjusted in place:
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use viaduct::{MimeType, Request, Response, Router};
///
/// #[derive(Deserialize, Serialize)]
/// struct Person { name: String }
///
/// let router = Router::build(|r| {
///     r.get("/people/{id}", |req: Request<()>| {
///         Response::ok(Person { name: req.param("id").unwrap_or_default().to_owned() })
///     });
///     r.post("/people", |req: Request<Person>| Response::created(req.into_body()))
///         .supplies([MimeType::json(), MimeType::yaml()]);
///     r.group("/admin", |r| {
///         r.delete("/people/{id}", |_: Request<()>| Response::<()>::no_content());
///     });
/// });
///
/// assert_eq!(router.len(), 3);
/// assert!(router.route(viaduct::Method::Delete, "/admin/people/{id}").is_some());
/// ```
pub struct Router {
    routes: IndexMap<RouteKey, RouteFunction>,
    default_consumes: IndexSet<MimeType>,
    default_produces: IndexSet<MimeType>,
    cors_domain: String,
    middlewares: Vec<SharedMiddleware>,
    group_paths: Vec<String>,
}

impl Router {
    /// An empty router with JSON as the default media type both ways.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// An empty router with defaults taken from `config`.
    pub fn with_config(config: Config) -> Self {
        Self {
            routes: IndexMap::new(),
            default_consumes: config.consumes.into_iter().collect(),
            default_produces: config.produces.into_iter().collect(),
            cors_domain: config.cors_domain,
            middlewares: Vec::new(),
            group_paths: Vec::new(),
        }
    }

    /// Creates a router and runs `routes` against it.
    pub fn build(routes: impl FnOnce(&mut Router)) -> Self {
        let mut router = Self::new();
        routes(&mut router);
        router
    }

    // ── Verbs ─────────────────────────────────────────────────────────────────

    pub fn get<F, R, O>(&mut self, path: &str, handler: F) -> &mut RequestPredicate
    where
        F: Fn(Request<()>) -> R + Send + Sync + 'static,
        R: IntoHandlerResult<O>,
        O: Serialize + 'static,
    {
        self.on(Method::Get, path, handler)
    }

    pub fn delete<F, R, O>(&mut self, path: &str, handler: F) -> &mut RequestPredicate
    where
        F: Fn(Request<()>) -> R + Send + Sync + 'static,
        R: IntoHandlerResult<O>,
        O: Serialize + 'static,
    {
        self.on(Method::Delete, path, handler)
    }

    pub fn post<F, R, I, O>(&mut self, path: &str, handler: F) -> &mut RequestPredicate
    where
        F: Fn(Request<I>) -> R + Send + Sync + 'static,
        R: IntoHandlerResult<O>,
        I: DeserializeOwned + 'static,
        O: Serialize + 'static,
    {
        self.with_body(Method::Post, path, handler)
    }

    pub fn put<F, R, I, O>(&mut self, path: &str, handler: F) -> &mut RequestPredicate
    where
        F: Fn(Request<I>) -> R + Send + Sync + 'static,
        R: IntoHandlerResult<O>,
        I: DeserializeOwned + 'static,
        O: Serialize + 'static,
    {
        self.with_body(Method::Put, path, handler)
    }

    pub fn patch<F, R, I, O>(&mut self, path: &str, handler: F) -> &mut RequestPredicate
    where
        F: Fn(Request<I>) -> R + Send + Sync + 'static,
        R: IntoHandlerResult<O>,
        I: DeserializeOwned + 'static,
        O: Serialize + 'static,
    {
        self.with_body(Method::Patch, path, handler)
    }

    /// Registers a handler that takes no body for any method.
    ///
    /// Nothing is decoded, so a `POST`, `PUT` or `PATCH` route registered
    /// this way answers 400: it has no body type to decode into. Methods the
    /// processor does not know how to run (`HEAD`, `OPTIONS`, ...) answer 405.
    pub fn on<F, R, O>(&mut self, method: Method, path: &str, handler: F) -> &mut RequestPredicate
    where
        F: Fn(Request<()>) -> R + Send + Sync + 'static,
        R: IntoHandlerResult<O>,
        O: Serialize + 'static,
    {
        let consumes = if method.carries_body() {
            self.default_consumes.clone()
        } else {
            IndexSet::new()
        };
        let predicate = RequestPredicate::new(method, path, consumes, self.default_produces.clone());
        self.register(predicate, Arc::new(Bodyless::<F, O>::new(handler)))
    }

    fn with_body<F, R, I, O>(&mut self, method: Method, path: &str, handler: F) -> &mut RequestPredicate
    where
        F: Fn(Request<I>) -> R + Send + Sync + 'static,
        R: IntoHandlerResult<O>,
        I: DeserializeOwned + 'static,
        O: Serialize + 'static,
    {
        let mut predicate = RequestPredicate::new(
            method,
            path,
            self.default_consumes.clone(),
            self.default_produces.clone(),
        );
        predicate.set_body_type(std::any::type_name::<I>());
        self.register(predicate, Arc::new(Decoding::<F, I, O>::new(handler)))
    }

    fn register(&mut self, predicate: RequestPredicate, handler: BoxedHandler) -> &mut RequestPredicate {
        debug!(route = %predicate, "registering route");
        let route = RouteFunction { predicate, authorizer: Arc::new(NoAuth), handler };
        let index = self.insert(route);
        &mut self.routes[index].predicate
    }

    /// A later registration for the same method and pattern replaces the
    /// earlier one but keeps its position.
    fn insert(&mut self, route: RouteFunction) -> usize {
        let key = (route.predicate.method(), route.predicate.path_pattern().to_owned());
        let (index, replaced) = self.routes.insert_full(key, route);
        if let Some(old) = replaced {
            warn!(route = %old.predicate, "route registered twice, keeping the later handler");
        }
        index
    }

    // ── Composition ───────────────────────────────────────────────────────────

    /// Registers the routes built by `routes` under `prefix`.
    ///
    /// Groups nest: `group("/a", |r| r.group("/b", ..))` yields `/a/b/...`.
    pub fn group(&mut self, prefix: &str, routes: impl FnOnce(&mut Router)) -> &mut Self {
        let mut nested = self.nested();
        routes(&mut nested);
        debug!(prefix, routes = nested.len(), "merging route group");

        self.group_paths.push(prefix.to_owned());
        self.group_paths.extend(nested.group_paths.drain(..).map(|p| format!("{prefix}{p}")));
        self.merge(nested, |route| route.predicate.prefix_path(prefix));
        self
    }

    /// Puts every route built by `routes` behind `authorizer`.
    ///
    /// Nested `auth` blocks resolve inner-first, except that a
    /// [`AuthType::None`] authorizer never replaces a real one.
    pub fn auth(&mut self, authorizer: impl Authorizer, routes: impl FnOnce(&mut Router)) -> &mut Self {
        let authorizer: SharedAuthorizer = Arc::new(authorizer);
        let mut nested = self.nested();
        routes(&mut nested);
        debug!(
            authorizer = authorizer.simple_name(),
            routes = nested.len(),
            "merging authorized routes"
        );

        self.group_paths.append(&mut nested.group_paths);
        self.merge(nested, |route| {
            if authorizer.auth_type() != AuthType::None {
                route.authorizer = Arc::clone(&authorizer);
            }
        });
        self
    }

    fn nested(&self) -> Router {
        Router {
            routes: IndexMap::new(),
            default_consumes: self.default_consumes.clone(),
            default_produces: self.default_produces.clone(),
            cors_domain: self.cors_domain.clone(),
            middlewares: Vec::new(),
            group_paths: Vec::new(),
        }
    }

    /// Moves routes and middleware out of `nested`, rewriting each route.
    fn merge(&mut self, nested: Router, mut rewrite: impl FnMut(&mut RouteFunction)) {
        for (_, mut route) in nested.routes {
            rewrite(&mut route);
            self.insert(route);
        }
        self.middlewares.extend(nested.middlewares);
    }

    // ── Middleware ────────────────────────────────────────────────────────────

    /// Appends one middleware to the chain. Middleware registered inside a
    /// `group` or `auth` block still applies router-wide.
    pub fn middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Appends several already-shared middlewares, in order.
    pub fn middlewares(&mut self, middlewares: impl IntoIterator<Item = SharedMiddleware>) -> &mut Self {
        self.middlewares.extend(middlewares);
        self
    }

    // ── Defaults ──────────────────────────────────────────────────────────────

    /// Replaces the media types later `post`/`put`/`patch` routes consume.
    pub fn set_default_consumes(&mut self, types: impl IntoIterator<Item = MimeType>) -> &mut Self {
        self.default_consumes = types.into_iter().collect();
        self
    }

    /// Replaces the media types later routes produce.
    pub fn set_default_produces(&mut self, types: impl IntoIterator<Item = MimeType>) -> &mut Self {
        self.default_produces = types.into_iter().collect();
        self
    }

    pub fn set_cors_domain(&mut self, domain: impl Into<String>) -> &mut Self {
        self.cors_domain = domain.into();
        self
    }

    pub fn default_consumes(&self) -> &IndexSet<MimeType> { &self.default_consumes }
    pub fn default_produces(&self) -> &IndexSet<MimeType> { &self.default_produces }
    pub fn cors_domain(&self) -> &str { &self.cors_domain }

    /// The type answered with when nothing better was negotiated: the first
    /// default produced type, or JSON when there is none.
    pub fn default_media_type(&self) -> MimeType {
        self.default_produces.first().cloned().unwrap_or_else(MimeType::json)
    }

    /// First default produced type the client accepts, else
    /// [`default_media_type`](Self::default_media_type).
    pub(crate) fn negotiate_default(&self, accepted: &[MimeType]) -> MimeType {
        self.default_produces
            .iter()
            .find(|produced| accepted.iter().any(|a| produced.is_compatible_with(a)))
            .cloned()
            .unwrap_or_else(|| self.default_media_type())
    }

    // ── Introspection ─────────────────────────────────────────────────────────

    /// Every route in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (&RequestPredicate, &RouteFunction)> {
        self.routes.values().map(|route| (&route.predicate, route))
    }

    /// Looks up a route by method and exact path pattern.
    pub fn route(&self, method: Method, path_pattern: &str) -> Option<&RouteFunction> {
        self.routes.get(&(method, path_pattern.to_owned()))
    }

    /// Prefixes of every `group` block, outermost first. Documentation only.
    pub fn group_paths(&self) -> &[String] { &self.group_paths }

    pub fn middleware_chain(&self) -> &[SharedMiddleware] { &self.middlewares }

    pub fn len(&self) -> usize { self.routes.len() }
    pub fn is_empty(&self) -> bool { self.routes.is_empty() }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.values().collect::<Vec<_>>())
            .field("cors_domain", &self.cors_domain)
            .field("middlewares", &self.middlewares.len())
            .field("group_paths", &self.group_paths)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthResult;
    use crate::request::InboundRequest;
    use crate::response::Response;
    use serde::Deserialize;

    #[derive(Deserialize, Serialize)]
    struct Item {
        id: u32,
    }

    struct Deny;

    impl Authorizer for Deny {
        fn simple_name(&self) -> &str { "deny" }
        fn auth_type(&self) -> AuthType { AuthType::Bearer }
        fn authorize(&self, _: &InboundRequest) -> AuthResult { AuthResult::deny("no") }
    }

    fn hello(_: Request<()>) -> Response<&'static str> {
        Response::ok("hello")
    }

    fn echo(req: Request<Item>) -> Response<Item> {
        Response::ok(req.into_body())
    }

    fn patterns(router: &Router) -> Vec<String> {
        router.routes().map(|(p, _)| p.to_string()).collect()
    }

    #[test]
    fn verbs_use_default_media_types() {
        let router = Router::build(|r| {
            r.get("/items", hello);
            r.post("/items", echo);
        });
        assert_eq!(
            patterns(&router),
            vec![
                "GET /items[]->[application/json]",
                "POST /items[application/json]->[application/json]",
            ]
        );
        let post = router.route(Method::Post, "/items").unwrap();
        assert!(post.predicate().body_type().unwrap().ends_with("Item"));
        assert!(router.route(Method::Get, "/items").unwrap().predicate().body_type().is_none());
    }

    #[test]
    fn returned_predicate_can_be_adjusted() {
        let router = Router::build(|r| {
            r.put("/items/{id}", echo)
                .expects([MimeType::yaml()])
                .supplies([MimeType::plain_text()]);
        });
        let predicate = router.route(Method::Put, "/items/{id}").unwrap().predicate();
        assert_eq!(predicate.accepts().first(), Some(&MimeType::yaml()));
        assert_eq!(predicate.produces().first(), Some(&MimeType::plain_text()));
    }

    #[test]
    fn groups_prefix_recursively() {
        let router = Router::build(|r| {
            r.group("/v1", |r| {
                r.get("/ping", hello);
                r.group("/items", |r| {
                    r.get("/{id}", hello);
                });
            });
        });
        let paths: Vec<&str> = router.routes().map(|(p, _)| p.path_pattern()).collect();
        assert_eq!(paths, vec!["/v1/ping", "/v1/items/{id}"]);
        assert_eq!(router.group_paths(), ["/v1".to_owned(), "/v1/items".to_owned()]);
    }

    #[test]
    fn auth_wraps_nested_groups_either_way() {
        let router = Router::build(|r| {
            r.auth(Deny, |r| {
                r.group("/a", |r| {
                    r.get("/x", hello);
                });
            });
            r.group("/b", |r| {
                r.auth(Deny, |r| {
                    r.get("/y", hello);
                });
            });
            r.get("/open", hello);
        });
        let auth = |path: &str| router.route(Method::Get, path).unwrap().authorizer().auth_type();
        assert_eq!(auth("/a/x"), AuthType::Bearer);
        assert_eq!(auth("/b/y"), AuthType::Bearer);
        assert_eq!(auth("/open"), AuthType::None);
    }

    #[test]
    fn no_auth_does_not_override_a_real_authorizer() {
        let router = Router::build(|r| {
            r.auth(NoAuth, |r| {
                r.auth(Deny, |r| {
                    r.get("/secret", hello);
                });
            });
        });
        let route = router.route(Method::Get, "/secret").unwrap();
        assert_eq!(route.authorizer().simple_name(), "deny");
    }

    #[test]
    fn duplicate_registration_keeps_position_and_replaces_handler() {
        let router = Router::build(|r| {
            r.get("/a", hello);
            r.get("/b", hello);
            r.get("/a", hello).supplies([MimeType::plain_text()]);
        });
        assert_eq!(router.len(), 2);
        assert_eq!(
            patterns(&router),
            vec!["GET /a[]->[text/plain]", "GET /b[]->[application/json]"]
        );
    }

    #[test]
    fn defaults_come_from_config() {
        let config = Config::default()
            .with_cors_domain("https://example.com")
            .with_produces([MimeType::yaml()]);
        let mut router = Router::with_config(config);
        router.get("/x", hello);
        assert_eq!(router.cors_domain(), "https://example.com");
        assert_eq!(router.default_media_type(), MimeType::yaml());
        assert_eq!(patterns(&router), vec!["GET /x[]->[application/yaml]"]);
    }

    #[test]
    fn negotiate_default_falls_back_to_first_produced() {
        let mut router = Router::new();
        router.set_default_produces([MimeType::json(), MimeType::plain_text()]);
        assert_eq!(router.negotiate_default(&[MimeType::parse("text/*")]), MimeType::plain_text());
        assert_eq!(router.negotiate_default(&[MimeType::html()]), MimeType::json());
        router.set_default_produces([]);
        assert_eq!(router.negotiate_default(&[]), MimeType::json());
    }

    #[test]
    fn nested_middleware_joins_the_parent_chain() {
        struct Noop;
        impl Middleware for Noop {}

        let router = Router::build(|r| {
            r.middleware(Noop);
            r.group("/g", |r| {
                r.middleware(Noop);
            });
        });
        assert_eq!(router.middleware_chain().len(), 2);
        assert!(router.is_empty());
    }
}
