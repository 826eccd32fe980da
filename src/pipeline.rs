//! Per-route pipeline builder.
//!
//! A pipeline is an ordered sequence of steps in front of one terminal
//! handler. Three step kinds, one rule each:
//!
//! - **action** — runs for side effects; its return value is discarded.
//! - **guard** — may refuse the request; a refusal halts the pipeline before
//!   any later step runs.
//! - **extract** — produces exactly one typed value, appended to the
//!   handler's positional argument list in declaration order.
//!
//! Only extractors shape the handler's signature. A pipeline with extractors
//! `String` then `u64` seals against `async fn(String, u64)` no matter how
//! many actions and guards sit before, between, or after them. The builder
//! carries the accumulated tuple in its type parameter, so the compiler
//! enforces the match — see the `compile_fail` example on [`Pipeline::seal`].
//!
//! Steps run strictly in declaration order, sequentially, once per
//! invocation. Nothing is reordered, parallelized, or memoized.
//!
//! ```rust
//! use std::sync::Arc;
//! use trellis::{ExtractError, GuardKind, Pipeline, Request, Response};
//!
//! let handler = Pipeline::new()
//!     .action(|req: Arc<Request>| async move {
//!         tracing::info!(path = req.path(), "hit");
//!     })
//!     .guard(|req: Arc<Request>| async move {
//!         match req.header("authorization") {
//!             Some(_) => Ok(()),
//!             None => Err(GuardKind::Unauthorized),
//!         }
//!     })
//!     .extract(|req: Arc<Request>| async move {
//!         req.param("id").map(str::to_owned)
//!             .ok_or_else(|| ExtractError::msg("missing id param"))
//!     })
//!     .seal(|id: String| async move {
//!         Response::json(format!(r#"{{"id":"{id}"}}"#))
//!     });
//! # let _ = handler;
//! ```

use std::future::Future;
use std::sync::Arc;

use crate::error::{ExtractError, GuardKind, Rejection};
use crate::handler::{BoxFuture, Handler, RouteHandler, TupleAppend};
use crate::request::Request;

/// Runs every step declared so far and yields the extracted values, or the
/// first rejection.
type StepChain<Args> =
    Box<dyn Fn(Arc<Request>) -> BoxFuture<Result<Args, Rejection>> + Send + Sync>;

/// Builder for a route's request pipeline.
///
/// `Args` is the tuple of extracted value types accumulated so far; it
/// starts at `()` and grows by one type per [`extract`](Pipeline::extract)
/// call. The builder is consumed by every method — a pipeline belongs to the
/// code composing it until [`seal`](Pipeline::seal) turns it into an
/// immutable [`RouteHandler`].
pub struct Pipeline<Args = ()> {
    run: StepChain<Args>,
}

impl Pipeline<()> {
    /// An empty pipeline: no steps, no extracted values.
    pub fn new() -> Self {
        Self { run: Box::new(|_| Box::pin(std::future::ready(Ok(())))) }
    }
}

impl Default for Pipeline<()> {
    fn default() -> Self { Self::new() }
}

impl<Args: Send + 'static> Pipeline<Args> {
    /// Appends a side-effecting step. Does not touch the handler signature.
    pub fn action<F, Fut>(self, action: F) -> Self
    where
        F: Fn(Arc<Request>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let prev = self.run;
        let action = Arc::new(action);
        Self {
            run: Box::new(move |req| {
                let ahead = prev(Arc::clone(&req));
                let action = Arc::clone(&action);
                Box::pin(async move {
                    let args = ahead.await?;
                    action(req).await;
                    Ok(args)
                })
            }),
        }
    }

    /// Appends a validating step. Does not touch the handler signature.
    ///
    /// A guard that returns `Err` halts the pipeline: no later step runs,
    /// the handler never runs, and the invocation resolves to
    /// [`Rejection::Guard`] carrying the refusal kind.
    pub fn guard<F, Fut>(self, guard: F) -> Self
    where
        F: Fn(Arc<Request>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), GuardKind>> + Send + 'static,
    {
        let prev = self.run;
        let guard = Arc::new(guard);
        Self {
            run: Box::new(move |req| {
                let ahead = prev(Arc::clone(&req));
                let guard = Arc::clone(&guard);
                Box::pin(async move {
                    let args = ahead.await?;
                    guard(req).await.map_err(Rejection::Guard)?;
                    Ok(args)
                })
            }),
        }
    }

    /// Appends an extracting step producing one `T`, which becomes the next
    /// positional argument of the terminal handler.
    ///
    /// A failing extractor halts the pipeline the same way a failing guard
    /// does, resolving the invocation to [`Rejection::Extraction`] with the
    /// underlying cause.
    pub fn extract<F, Fut, T>(self, extractor: F) -> Pipeline<Args::Out>
    where
        Args: TupleAppend<T>,
        Args::Out: Send + 'static,
        T: Send + 'static,
        F: Fn(Arc<Request>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ExtractError>> + Send + 'static,
    {
        let prev = self.run;
        let extractor = Arc::new(extractor);
        Pipeline {
            run: Box::new(move |req| {
                let ahead = prev(Arc::clone(&req));
                let extractor = Arc::clone(&extractor);
                Box::pin(async move {
                    let args = ahead.await?;
                    let value = extractor(req).await.map_err(Rejection::Extraction)?;
                    Ok(args.append(value))
                })
            }),
        }
    }

    /// Attaches the terminal handler and seals the pipeline.
    ///
    /// The handler's parameters must be exactly the extracted value types,
    /// positionally, in declaration order — enforced by the compiler, not at
    /// request time:
    ///
    /// ```compile_fail
    /// use std::sync::Arc;
    /// use trellis::{Pipeline, Request, Response};
    ///
    /// // One extractor declared, two-argument handler: does not compile.
    /// Pipeline::new()
    ///     .extract(|req: Arc<Request>| async move { Ok(req.path().to_owned()) })
    ///     .seal(|_path: String, _n: u64| async move { Response::text("no") });
    /// ```
    ///
    /// The returned [`RouteHandler`] is immutable; no further steps can be
    /// appended.
    pub fn seal<H>(self, handler: H) -> RouteHandler
    where
        H: Handler<Args>,
    {
        let prev = self.run;
        let handler = Arc::new(handler);
        RouteHandler::new(Arc::new(move |req| {
            let ahead = prev(req);
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let args = ahead.await?;
                Ok(handler.call(args).await)
            })
        }))
    }
}
