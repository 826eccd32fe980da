//! Built-in health-check unit.
//!
//! Kubernetes asks two questions; this module answers them as an importable
//! unit:
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the pod serve traffic? Failure → pulled from load-balancer. |
//!
//! Import it like any other unit:
//!
//! ```rust
//! use trellis::{health, Module};
//!
//! let app = Module::named("app")
//!     .import(health::module())
//!     .build();
//! ```
//!
//! Register your own routes at the same paths in a different unit if
//! readiness must gate on dependency availability — but remember duplicate
//! paths across units are a fatal conflict, so replace the import rather
//! than shadowing it.

use std::sync::Arc;

use http::Method;

use crate::module::Module;
use crate::pipeline::Pipeline;
use crate::response::Response;

/// Liveness probe handler.
///
/// Always `200 OK` with body `"ok"`. If the process can run a pipeline at
/// all, it is alive — this handler intentionally has no dependencies.
pub async fn liveness() -> Response {
    Response::text("ok")
}

/// Readiness probe handler (default implementation).
///
/// Always `200 OK` with body `"ready"`. Declare your own unit instead if
/// the application needs a warm-up period or must verify dependency health
/// before accepting traffic.
pub async fn readiness() -> Response {
    Response::text("ready")
}

/// A ready-made unit exposing `GET /healthz` and `GET /readyz`.
///
/// Each call builds a fresh unit instance; import it once per application.
pub fn module() -> Arc<Module> {
    Module::named("health")
        .route(Method::GET, "/healthz", Pipeline::new().seal(liveness))
        .route(Method::GET, "/readyz", Pipeline::new().seal(readiness))
        .build()
}
