//! Module units: named, immutable bundles of imports, routes, and providers.
//!
//! A module declares what a feature area contributes to the application —
//! nothing executes here. Composition happens later, when the root unit is
//! handed to [`resolve`](crate::resolve).
//!
//! ```rust
//! use trellis::{Method, Module, Pipeline, ProviderToken, Response};
//!
//! let users = Module::named("users")
//!     .provider(ProviderToken::new("UsersRepo"))
//!     .export(ProviderToken::new("UsersRepo"))
//!     .route(Method::GET, "/users/{id}", Pipeline::new().seal(|| async {
//!         Response::text("a user")
//!     }))
//!     .build();
//!
//! let app = Module::named("app").import(users).build();
//! ```
//!
//! # Cyclic graphs
//!
//! Two units that need each other cannot both hold the other's finished
//! value. Two escapes exist, matching how the cycle is meant to be read:
//!
//! - [`import_lazy`](ModuleBuilder::import_lazy) defers the edge behind a
//!   producer that is only invoked during resolution, by which time both
//!   units exist. Build the target in a `std::sync::LazyLock` (or capture an
//!   `Arc` clone) so the producer returns the **same instance** on every
//!   call — unit identity is the instance, and a producer that builds a
//!   fresh unit each call makes the graph unbounded.
//! - [`Module::wire`] attaches imports to an already-built unit, exactly
//!   once. This is the surface for graphs assembled programmatically (plugin
//!   registries, config-driven composition) — and the only way to express a
//!   purely eager cycle, which [`resolve`](crate::resolve) then reports as
//!   fatal.

use std::fmt;
use std::sync::{Arc, OnceLock};

use http::Method;

use crate::handler::RouteHandler;

// ── ProviderToken ─────────────────────────────────────────────────────────────

/// An opaque token naming a provider a unit registers.
///
/// The composition core records who registered and exported which tokens;
/// what a token *constructs* is the concern of whatever dependency-resolution
/// layer consumes the flattened registry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProviderToken(String);

impl ProviderToken {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Import ────────────────────────────────────────────────────────────────────

/// One import edge of a unit.
pub enum Import {
    /// An eager edge to an already-built unit.
    Direct(Arc<Module>),
    /// A deferred edge: the producer is invoked during resolution only.
    /// It must return the same instance on every call.
    Deferred(Box<dyn Fn() -> Arc<Module> + Send + Sync>),
}

// ── Module ────────────────────────────────────────────────────────────────────

/// A route registered by a unit.
pub(crate) struct Route {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) handler: RouteHandler,
}

/// A named, immutable declaration of imports, routes, and providers.
///
/// Built once at application-definition time via [`Module::named`]; never
/// mutated afterwards (imports may be attached exactly once, at build time
/// or later via [`wire`](Module::wire)). The `name` exists for diagnostics
/// only — identity, everywhere it matters, is the `Arc` instance.
pub struct Module {
    pub(crate) name: String,
    imports: OnceLock<Vec<Import>>,
    pub(crate) routes: Vec<Route>,
    pub(crate) providers: Vec<ProviderToken>,
    pub(crate) exports: Vec<ProviderToken>,
}

impl Module {
    /// Starts declaring a unit. The name appears in logs and resolution
    /// errors; pick something a human can locate in the source tree.
    pub fn named(name: impl Into<String>) -> ModuleBuilder {
        ModuleBuilder {
            name: name.into(),
            imports: Vec::new(),
            routes: Vec::new(),
            providers: Vec::new(),
            exports: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attaches imports to a unit that was built without any.
    ///
    /// Completes the unit's definition; callable at most once, and only when
    /// no imports were given at build time.
    ///
    /// # Panics
    ///
    /// Panics if the unit's imports are already set — re-wiring a composed
    /// unit is a definition-time defect.
    pub fn wire(&self, imports: Vec<Import>) {
        if self.imports.set(imports).is_err() {
            panic!("unit `{}` is already wired", self.name);
        }
    }

    pub(crate) fn imports(&self) -> &[Import] {
        self.imports.get().map(Vec::as_slice).unwrap_or(&[])
    }
}

// ── ModuleBuilder ─────────────────────────────────────────────────────────────

/// Chaining builder for [`Module`]. Obtain via [`Module::named`].
pub struct ModuleBuilder {
    name: String,
    imports: Vec<Import>,
    routes: Vec<Route>,
    providers: Vec<ProviderToken>,
    exports: Vec<ProviderToken>,
}

impl ModuleBuilder {
    /// Eagerly imports another unit.
    pub fn import(mut self, unit: Arc<Module>) -> Self {
        self.imports.push(Import::Direct(unit));
        self
    }

    /// Lazily imports a unit through a deferred producer. See the module
    /// docs for when to reach for this and the stable-instance requirement.
    pub fn import_lazy<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> Arc<Module> + Send + Sync + 'static,
    {
        self.imports.push(Import::Deferred(Box::new(producer)));
        self
    }

    /// Registers a route owned by this unit. `handler` is a sealed pipeline
    /// from [`Pipeline::seal`](crate::Pipeline::seal).
    pub fn route(mut self, method: Method, path: &str, handler: RouteHandler) -> Self {
        self.routes.push(Route { method, path: path.to_owned(), handler });
        self
    }

    /// Registers a provider token owned by this unit.
    pub fn provider(mut self, token: ProviderToken) -> Self {
        self.providers.push(token);
        self
    }

    /// Marks an already-registered provider as visible to importing units.
    ///
    /// # Panics
    ///
    /// Panics if `token` was not registered with [`provider`](Self::provider)
    /// first — exports must be a subsequence of the unit's providers.
    pub fn export(mut self, token: ProviderToken) -> Self {
        if !self.providers.contains(&token) {
            panic!("unit `{}` exports provider `{token}` that it does not register", self.name);
        }
        self.exports.push(token);
        self
    }

    /// Finishes the declaration.
    ///
    /// If any imports were chained they are fixed now; otherwise the unit
    /// may be wired exactly once later via [`Module::wire`].
    pub fn build(self) -> Arc<Module> {
        let module = Module {
            name: self.name,
            imports: OnceLock::new(),
            routes: self.routes,
            providers: self.providers,
            exports: self.exports,
        };
        if !self.imports.is_empty() {
            // OnceLock was created just above; the first set cannot fail.
            let _ = module.imports.set(self.imports);
        }
        Arc::new(module)
    }
}
