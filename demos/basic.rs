//! Minimal viaduct example: a people API served locally.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl -H 'accept: application/json' http://localhost:3000/people/ada
//!   curl -H 'accept: application/yaml' http://localhost:3000/people/ada
//!   curl -X POST http://localhost:3000/people \
//!        -H 'accept: application/json' -H 'content-type: application/json' \
//!        -d '{"name":"grace","age":85}'
//!   curl -X DELETE -H 'accept: */*' -H 'x-api-key: letmein' http://localhost:3000/admin/people/ada

use serde::{Deserialize, Serialize};
use viaduct::middleware::Trace;
use viaduct::{
    AuthResult, AuthType, Authorizer, InboundRequest, MimeType, Request, RequestHandler, Response, Router,
    Server,
};

#[derive(Deserialize, Serialize)]
struct Person {
    name: String,
    age: u32,
}

struct ApiKey(&'static str);

impl Authorizer for ApiKey {
    fn simple_name(&self) -> &str { "API key" }
    fn auth_type(&self) -> AuthType { AuthType::Bearer }

    fn authorize(&self, request: &InboundRequest) -> AuthResult {
        match request.header("x-api-key") {
            Some(key) if key == self.0 => AuthResult::allow(),
            _ => AuthResult::deny("missing or invalid x-api-key"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), viaduct::Error> {
    tracing_subscriber::fmt::init();

    let mut router = Router::build(|r| {
        r.get("/people/{name}", get_person).supplies([MimeType::json(), MimeType::yaml()]);
        r.post("/people", create_person);
        r.auth(ApiKey("letmein"), |r| {
            r.group("/admin", |r| {
                r.delete("/people/{name}", delete_person);
            });
        });
    });
    router.middleware(Trace);

    Server::bind("0.0.0.0:3000").serve(RequestHandler::new(router)).await
}

// GET /people/{name}
fn get_person(req: Request<()>) -> Response<Person> {
    let name = req.param("name").unwrap_or("unknown");
    Response::ok(Person { name: name.to_owned(), age: 36 })
}

// POST /people → 201 with a Location header
fn create_person(req: Request<Person>) -> Response<Person> {
    let person = req.into_body();
    let location = format!("/people/{}", person.name);
    Response::created(person).header("location", location)
}

// DELETE /admin/people/{name} → 204 No Content
fn delete_person(_req: Request<()>) -> Response<()> {
    Response::no_content()
}
