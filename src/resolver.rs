//! Module graph resolution: one depth-first pass from the root unit to a
//! flattened route table and provider registry.
//!
//! Traversal order is the whole contract: within a unit, imports are
//! processed before the unit's own routes, each in declaration order, and a
//! unit reachable along several paths is flattened only the first time. The
//! resulting table order is therefore deterministic for a given tree —
//! resolving the same tree twice yields identical output.
//!
//! Cycles: an import chain that leads back to a unit still being entered is
//! fatal ([`ResolveError::CircularImport`]) when every edge on the loop is
//! eager. If any edge on the loop is deferred, the loop is broken instead —
//! the deferred producer only runs during this pass, by which time every
//! unit on the loop is fully defined, so the back edge is simply skipped and
//! each unit is still flattened exactly once.
//!
//! Resolution runs once per application startup, synchronously, on a fully
//! constructed tree. Errors abort the pass; no partial output escapes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use http::Method;
use tracing::{debug, info, trace};

use crate::error::ResolveError;
use crate::handler::RouteHandler;
use crate::module::{Import, Module, ProviderToken};

// ── Output ────────────────────────────────────────────────────────────────────

/// One entry of the flattened route table.
#[derive(Debug)]
pub struct RouteEntry {
    pub method: Method,
    pub path: String,
    /// Name of the unit that registered the route.
    pub unit: String,
    pub handler: RouteHandler,
}

/// One entry of the flattened provider registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderRecord {
    pub token: ProviderToken,
    /// Name of the unit that registered the token.
    pub owner: String,
    /// Whether the owner exports the token to its importers.
    pub exported: bool,
}

/// Per-unit metadata: which units a unit directly imports.
///
/// Together with [`ProviderRecord`], this is everything an external lookup
/// layer needs to answer "is provider P visible to unit U" — visible means
/// registered by U itself or exported by one of U's direct imports. The
/// resolver supplies the data; it does not enforce the policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitInfo {
    pub name: String,
    pub imports: Vec<String>,
}

/// The output of one resolution pass: route table, provider registry, and
/// the unit metadata backing provider-visibility checks.
///
/// Hand `routes` to the host's dispatch layer; it owns path matching and
/// handler invocation from here on.
#[derive(Debug)]
pub struct ResolvedApp {
    pub routes: Vec<RouteEntry>,
    pub providers: Vec<ProviderRecord>,
    pub units: Vec<UnitInfo>,
}

// ── Traversal ─────────────────────────────────────────────────────────────────

/// Flattens the module graph reachable from `root`.
pub fn resolve(root: Arc<Module>) -> Result<ResolvedApp, ResolveError> {
    let mut walk = Walk {
        visited: HashSet::new(),
        stack: Vec::new(),
        seen_routes: HashMap::new(),
        out: ResolvedApp { routes: Vec::new(), providers: Vec::new(), units: Vec::new() },
    };
    walk.visit(&root, false)?;

    info!(
        routes = walk.out.routes.len(),
        providers = walk.out.providers.len(),
        units = walk.out.units.len(),
        "module graph resolved"
    );
    Ok(walk.out)
}

/// A unit currently being entered, and the kind of edge that entered it.
struct Frame {
    unit: *const Module,
    name: String,
    via_deferred: bool,
}

struct Walk {
    /// Units whose subtree is fully flattened.
    visited: HashSet<*const Module>,
    /// Units on the current entry path, root first.
    stack: Vec<Frame>,
    /// method + path → owning unit, for conflict detection.
    seen_routes: HashMap<(Method, String), String>,
    out: ResolvedApp,
}

impl Walk {
    fn visit(&mut self, unit: &Arc<Module>, via_deferred: bool) -> Result<(), ResolveError> {
        let key = Arc::as_ptr(unit);
        if self.visited.contains(&key) {
            return Ok(());
        }

        if let Some(pos) = self.stack.iter().position(|f| f.unit == key) {
            // The loop runs from the first occurrence on the stack back to
            // this edge. Deferred anywhere on it breaks the cycle; all-eager
            // is fatal.
            let broken =
                via_deferred || self.stack[pos + 1..].iter().any(|f| f.via_deferred);
            if broken {
                trace!(unit = %unit.name, "deferred edge closed a cycle, skipping");
                return Ok(());
            }
            let mut cycle: Vec<String> =
                self.stack[pos..].iter().map(|f| f.name.clone()).collect();
            cycle.push(unit.name.clone());
            return Err(ResolveError::CircularImport { cycle });
        }

        self.stack.push(Frame { unit: key, name: unit.name.clone(), via_deferred });

        let mut import_names = Vec::new();
        for import in unit.imports() {
            match import {
                Import::Direct(target) => {
                    import_names.push(target.name.clone());
                    self.visit(target, false)?;
                }
                Import::Deferred(producer) => {
                    let target = producer();
                    import_names.push(target.name.clone());
                    self.visit(&target, true)?;
                }
            }
        }

        self.flatten(unit, import_names)?;

        self.stack.pop();
        self.visited.insert(key);
        Ok(())
    }

    /// Appends the unit's own routes and providers, imports already done.
    fn flatten(&mut self, unit: &Arc<Module>, import_names: Vec<String>) -> Result<(), ResolveError> {
        debug!(unit = %unit.name, routes = unit.routes.len(), "flattening unit");

        for route in &unit.routes {
            let slot = (route.method.clone(), route.path.clone());
            if let Some(first) = self.seen_routes.get(&slot) {
                return Err(ResolveError::RouteConflict {
                    method: route.method.clone(),
                    path: route.path.clone(),
                    first: first.clone(),
                    second: unit.name.clone(),
                });
            }
            self.seen_routes.insert(slot, unit.name.clone());
            self.out.routes.push(RouteEntry {
                method: route.method.clone(),
                path: route.path.clone(),
                unit: unit.name.clone(),
                handler: route.handler.clone(),
            });
        }

        for token in &unit.providers {
            self.out.providers.push(ProviderRecord {
                token: token.clone(),
                owner: unit.name.clone(),
                exported: unit.exports.contains(token),
            });
        }

        self.out.units.push(UnitInfo { name: unit.name.clone(), imports: import_names });
        Ok(())
    }
}
