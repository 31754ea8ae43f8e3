use serde::{Deserialize, Serialize};
use tracing_test::traced_test;
use viaduct::{InboundRequest, Method, MimeType, Request, RequestHandler, Response, Router};

#[derive(Debug, Deserialize, PartialEq, Serialize)]
struct Person {
    name: String,
    age: u32,
}

fn people() -> Router {
    Router::build(|r| {
        r.get("/test", |_: Request<()>| Response::ok("Hello from /test"))
            .supplies([MimeType::plain_text(), MimeType::json()]);
        r.get("/people/{name}", |req: Request<()>| {
            Response::ok(Person { name: req.param("name").unwrap_or_default().to_owned(), age: 42 })
        })
        .supplies([MimeType::json(), MimeType::yaml()]);
        r.post("/people", |req: Request<Person>| Response::created(req.into_body()))
            .supplies([MimeType::json(), MimeType::yaml()]);
        r.put("/people/{name}", |req: Request<Person>| {
            let renamed = Person { name: req.param("name").unwrap_or_default().to_owned(), ..req.into_body() };
            Response::ok(renamed)
        });
        r.delete("/people/{name}", |_: Request<()>| Response::<()>::no_content());
    })
}

fn json(method: &str, path: &str) -> InboundRequest {
    InboundRequest::new(method, path)
        .with_header("Accept", "application/json")
        .with_header("Content-Type", "application/json")
}

#[test]
fn get_plain_text() {
    let handler = RequestHandler::new(people());
    let response = handler.handle(InboundRequest::new("GET", "/test").with_header("accept", "text/plain"));
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "Hello from /test");
    assert_eq!(response.header("Content-Type"), Some("text/plain"));
}

#[test]
fn get_with_path_parameter_as_yaml() {
    let handler = RequestHandler::new(people());
    let response = handler.handle(InboundRequest::new("GET", "/people/ada").with_header("Accept", "application/yaml"));
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "name: ada\nage: 42\n");
    assert_eq!(response.header("content-type"), Some("application/yaml"));
}

#[test]
fn post_round_trips_json() {
    let handler = RequestHandler::new(people());
    let body = r#"{"name":"grace","age":85}"#;
    let response = handler.handle(json("POST", "/people").with_body(body));
    assert_eq!(response.status_code, 201);
    assert_eq!(response.body, body);
}

#[test]
fn put_decodes_and_uses_parameters() {
    let handler = RequestHandler::new(people());
    let response = handler.handle(json("PUT", "/people/linus").with_body(r#"{"name":"x","age":30}"#));
    assert_eq!(response.status_code, 200);
    let person: Person = serde_json::from_str(&response.body).unwrap();
    assert_eq!(person, Person { name: "linus".into(), age: 30 });
}

#[test]
fn delete_has_no_body() {
    let handler = RequestHandler::new(people());
    let response = handler.handle(InboundRequest::new("DELETE", "/people/ada").with_header("Accept", "*/*"));
    assert_eq!(response.status_code, 204);
    assert_eq!(response.body, "");
}

#[test]
fn unknown_path_is_404() {
    let handler = RequestHandler::new(people());
    let response = handler.handle(InboundRequest::new("GET", "/nowhere").with_header("Accept", "application/json"));
    assert_eq!(response.status_code, 404);
    assert!(response.body.contains("GET /nowhere"));
    assert!(response.body.contains("application/json"));
}

#[test]
fn wrong_method_is_405_with_allow() {
    let handler = RequestHandler::new(people());
    let response = handler.handle(json("PATCH", "/people/ada"));
    assert_eq!(response.status_code, 405);
    assert_eq!(response.header("Allow"), Some("GET, PUT, DELETE"));
}

#[test]
fn incompatible_accept_is_406() {
    let handler = RequestHandler::new(people());
    let response = handler.handle(InboundRequest::new("GET", "/people/ada").with_header("Accept", "text/html"));
    assert_eq!(response.status_code, 406);
    assert_eq!(response.header("accept"), Some("application/json, application/yaml"));
}

#[test]
fn missing_accept_is_406_when_the_route_produces() {
    let handler = RequestHandler::new(people());
    let response = handler.handle(InboundRequest::new("GET", "/people/ada"));
    assert_eq!(response.status_code, 406);
}

#[test]
fn malformed_json_is_400() {
    let handler = RequestHandler::new(people());
    let response = handler.handle(json("POST", "/people").with_body("wibble"));
    assert_eq!(response.status_code, 400);
    assert!(response.body.starts_with("Could not deserialize body."));
}

#[test]
fn missing_field_is_400() {
    let handler = RequestHandler::new(people());
    let response = handler.handle(json("POST", "/people").with_body(r#"{"name":"grace"}"#));
    assert_eq!(response.status_code, 400);
    assert!(response.body.starts_with("Invalid request."));
}

#[test]
fn groups_behave_like_prefixed_routes() {
    let grouped = RequestHandler::new(Router::build(|r| {
        r.group("/api", |r| {
            r.group("/v1", |r| {
                r.get("/ping/{n}", |req: Request<()>| Response::ok(req.param("n").unwrap_or_default().to_owned()));
            });
        });
    }));
    let flat = RequestHandler::new(Router::build(|r| {
        r.get("/api/v1/ping/{n}", |req: Request<()>| Response::ok(req.param("n").unwrap_or_default().to_owned()));
    }));

    for path in ["/api/v1/ping/7", "/api/v1/ping", "/v1/ping/7"] {
        let request = InboundRequest::new("GET", path).with_header("Accept", "application/json");
        assert_eq!(grouped.handle(request.clone()), flat.handle(request), "{path}");
    }
    assert_eq!(grouped.router().group_paths(), ["/api".to_owned(), "/api/v1".to_owned()]);
}

#[test]
fn cors_domain_comes_from_config() {
    let config = viaduct::Config::from_toml(r#"cors_domain = "https://example.com""#).unwrap();
    let mut router = Router::with_config(config);
    router.get("/x", |_: Request<()>| Response::ok(1));
    let handler = RequestHandler::new(router);

    let ok = handler.handle(InboundRequest::new("GET", "/x").with_header("Accept", "*/*"));
    let missing = handler.handle(InboundRequest::new("GET", "/y"));
    assert_eq!(ok.header("access-control-allow-origin"), Some("https://example.com"));
    assert_eq!(missing.header("access-control-allow-origin"), Some("https://example.com"));
}

#[test]
fn registry_is_introspectable() {
    let router = people();
    let described: Vec<String> = router
        .routes()
        .map(|(predicate, route)| format!("{predicate} {:?} {}", predicate.path_variables(), route.authorizer().auth_type()))
        .collect();
    assert_eq!(described[1], r#"GET /people/{name}[]->[application/json, application/yaml] ["name"] NONE"#);
    assert_eq!(router.route(Method::Post, "/people").map(|r| r.predicate().body_type().is_some()), Some(true));
}

#[test]
#[traced_test]
fn rejections_are_logged() {
    let handler = RequestHandler::new(people());
    handler.handle(InboundRequest::new("GET", "/nowhere"));
    handler.handle(json("PATCH", "/people/ada"));
    assert!(logs_contain("no route matched"));
    assert!(logs_contain("method not allowed"));
}
