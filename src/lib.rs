//! # trellis
//!
//! Module graph and typed route pipelines for Rust backend services.
//! Modules in, route table out.
//!
//! ## The contract
//!
//! The host runtime owns the sockets, the TLS, the path matcher, and the
//! response wire format. trellis owns the part that changes between
//! applications: how feature modules compose into one application, and how
//! each route's validation and extraction steps compose into one handler.
//!
//! What the host runtime keeps — trellis intentionally ignores:
//!
//! - **Listening and dispatch** — the resolved route table is data; match
//!   paths with whatever router the runtime prefers
//! - **Provider lifecycles** — the flattened registry says who registered
//!   and exported what; constructing services from it is the injector's job
//! - **Timeouts and cancellation** — policy belongs in steps, via the same
//!   action/guard contract as everything else
//!
//! What's left for trellis:
//!
//! - Typed pipelines — guards and actions never touch the handler
//!   signature; extractors define it, positionally, checked at compile time
//! - Module graphs — depth-first flattening with cycle detection and
//!   deferred edges for mutually-dependent units
//! - Deterministic output — same tree, same route table, every time
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use trellis::{resolve, Method, Module, Pipeline, Request, Response};
//!
//! let get_user = Pipeline::new()
//!     .extract(|req: Arc<Request>| async move {
//!         Ok(req.param("id").unwrap_or("unknown").to_owned())
//!     })
//!     .seal(|id: String| async move {
//!         Response::json(format!(r#"{{"id":"{id}"}}"#))
//!     });
//!
//! let users = Module::named("users")
//!     .route(Method::GET, "/users/{id}", get_user)
//!     .build();
//!
//! let app = Module::named("app").import(users).build();
//!
//! let resolved = resolve(app).expect("acyclic graph");
//! assert_eq!(resolved.routes.len(), 1);
//! assert_eq!(resolved.routes[0].path, "/users/{id}");
//! ```
//!
//! At request time the host's dispatch layer matches a path, builds a
//! [`Request`], and calls the entry's [`RouteHandler`]; an `Err` from the
//! call is a structured rejection to translate into a 4xx/5xx response.

mod error;
mod handler;
mod module;
mod pipeline;
mod request;
mod resolver;
mod response;

pub mod health;

pub use http::{Method, StatusCode};

pub use error::{ExtractError, GuardKind, Rejection, ResolveError};
pub use handler::{Handler, RouteHandler, TupleAppend};
pub use module::{Import, Module, ModuleBuilder, ProviderToken};
pub use pipeline::Pipeline;
pub use request::Request;
pub use resolver::{resolve, ProviderRecord, ResolvedApp, RouteEntry, UnitInfo};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
