//! Minimal trellis example — two feature modules resolved into a route
//! table, dispatched through a matchit router standing in for the host
//! runtime.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Walks through:
//!   GET /users/42                        → 200, extracted id
//!   GET /users/42 (no auth header)       → 401, guard rejection
//!   POST /users with a body              → 201
//!   GET /healthz                         → 200, imported health unit

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as PathRouter;
use trellis::{
    health, resolve, ExtractError, GuardKind, Method, Module, Pipeline, Rejection, Request,
    Response, RouteHandler, StatusCode,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    // GET /users/{id} — authenticated, id extracted from the path.
    let get_user = Pipeline::new()
        .guard(|req: Arc<Request>| async move {
            match req.header("authorization") {
                Some(_) => Ok(()),
                None => Err(GuardKind::Unauthorized),
            }
        })
        .extract(|req: Arc<Request>| async move {
            req.param("id")
                .map(str::to_owned)
                .ok_or_else(|| ExtractError::msg("missing id param"))
        })
        .seal(|id: String| async move {
            Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#))
        });

    // POST /users — body required, no auth for the demo's sake.
    let create_user = Pipeline::new()
        .extract(|req: Arc<Request>| async move {
            if req.body().is_empty() {
                return Err(ExtractError::msg("empty body"));
            }
            Ok(req.body().to_vec())
        })
        .seal(|_body: Vec<u8>| async move {
            Response::builder()
                .status(StatusCode::CREATED)
                .header("location", "/users/99")
                .json(r#"{"id":"99","name":"new_user"}"#)
        });

    let users = Module::named("users")
        .route(Method::GET, "/users/{id}", get_user)
        .route(Method::POST, "/users", create_user)
        .build();

    let app = Module::named("app")
        .import(users)
        .import(health::module())
        .build();

    let resolved = resolve(app).expect("module graph is acyclic");

    // The host runtime's half: a radix-tree router per method, fed from the
    // resolved table.
    let mut tables: HashMap<Method, PathRouter<RouteHandler>> = HashMap::new();
    for entry in resolved.routes {
        tables
            .entry(entry.method.clone())
            .or_default()
            .insert(&entry.path, entry.handler)
            .expect("resolved route paths are valid");
    }

    show(dispatch(&tables, Method::GET, "/users/42", &[("authorization", "Bearer t")], b"").await);
    show(dispatch(&tables, Method::GET, "/users/42", &[], b"").await);
    show(dispatch(&tables, Method::POST, "/users", &[], br#"{"name":"alice"}"#).await);
    show(dispatch(&tables, Method::GET, "/healthz", &[], b"").await);
}

/// Matches, builds the request context, runs the pipeline, and translates a
/// rejection — everything trellis leaves to the host.
async fn dispatch(
    tables: &HashMap<Method, PathRouter<RouteHandler>>,
    method: Method,
    path: &str,
    headers: &[(&str, &str)],
    body: &[u8],
) -> (Method, String, Response) {
    let Some(table) = tables.get(&method) else {
        return (method, path.to_owned(), Response::status(StatusCode::NOT_FOUND));
    };
    let Ok(matched) = table.at(path) else {
        return (method, path.to_owned(), Response::status(StatusCode::NOT_FOUND));
    };

    let params: HashMap<String, String> = matched
        .params
        .iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
    let req = Request::new(method.clone(), path)
        .with_headers(headers.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
        .with_body(body.to_vec())
        .with_params(params);

    let response = match matched.value.call(req).await {
        Ok(response) => response,
        Err(rejection) => reject(rejection),
    };
    (method, path.to_owned(), response)
}

fn reject(rejection: Rejection) -> Response {
    let status = match &rejection {
        Rejection::Guard(GuardKind::Unauthorized) => StatusCode::UNAUTHORIZED,
        Rejection::Guard(GuardKind::Forbidden) => StatusCode::FORBIDDEN,
        Rejection::Guard(GuardKind::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
        Rejection::Guard(GuardKind::Other(_)) => StatusCode::BAD_REQUEST,
        Rejection::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    Response::builder().status(status).text(rejection.to_string())
}

fn show((method, path, response): (Method, String, Response)) {
    let (status, _headers, body) = response.into_parts();
    println!("{method} {path} -> {status} {}", String::from_utf8_lossy(&body));
}
