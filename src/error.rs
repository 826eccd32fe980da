//! Error taxonomy: definition-time failures and per-request rejections.
//!
//! Two families, deliberately kept apart:
//!
//! - [`ResolveError`] — resolution-time defects in the module graph. Fatal:
//!   resolution aborts and no partial application is produced. Fix the
//!   declarations; there is nothing to retry.
//! - [`Rejection`] — request-time outcomes of a pipeline run. Contained to
//!   the single invocation that produced them; the dispatch layer translates
//!   them into a response.
//!
//! Handler signature mismatches are the third family the taxonomy would
//! otherwise need — the type-state builder makes them a compile error
//! instead, so no runtime variant exists for them.

use std::error::Error as StdError;

use http::Method;
use thiserror::Error;

// ── Resolution-time ───────────────────────────────────────────────────────────

/// A defect found while flattening a module graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A cycle made entirely of eager import edges. The path lists unit
    /// names from the first repeated unit back to itself.
    #[error("circular import: {}", .cycle.join(" -> "))]
    CircularImport { cycle: Vec<String> },

    /// Two units registered the same method + path. Always fatal — a
    /// duplicate route is a declaration bug, not something to paper over
    /// with registration order.
    #[error("duplicate route {method} {path}: registered by `{first}` and `{second}`")]
    RouteConflict {
        method: Method,
        path: String,
        first: String,
        second: String,
    },
}

// ── Request-time ──────────────────────────────────────────────────────────────

/// Why a guard refused a request.
///
/// The dispatch layer owns the mapping to a wire response (401, 403, 429, …);
/// guards only state the reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardKind {
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("rate limited")]
    RateLimited,
    /// Application-defined reason, carried verbatim.
    #[error("{0}")]
    Other(String),
}

/// Why an extractor failed to produce its value.
///
/// Carries a display message and, when the failure wraps another error
/// (malformed body, schema validation, …), the underlying cause.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ExtractError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl ExtractError {
    /// Wraps an underlying cause. The display message is taken from the cause.
    pub fn new(cause: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        let cause = cause.into();
        Self { message: cause.to_string(), source: Some(cause) }
    }

    /// A bare message with no underlying cause.
    pub fn msg(message: impl Into<String>) -> Self {
        Self { message: message.into(), source: None }
    }
}

/// A pipeline invocation that halted before reaching its handler.
///
/// Returned as the `Err` arm of [`RouteHandler::call`](crate::RouteHandler::call).
/// One rejection affects exactly one invocation: the sealed pipeline itself
/// stays valid and other concurrent invocations are untouched.
#[derive(Debug, Error)]
pub enum Rejection {
    /// A guard refused the request; no later step ran.
    #[error("guard rejected the request: {0}")]
    Guard(GuardKind),
    /// An extractor failed to produce its value; no later step ran.
    #[error("extraction failed: {0}")]
    Extraction(#[source] ExtractError),
}
