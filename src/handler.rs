//! Handler trait, tuple plumbing, and type erasure.
//!
//! # How typed pipelines become storable handlers
//!
//! A route table has to hold handlers of *different* shapes — zero extracted
//! values here, a `(String, u64)` pair there — in one `Vec`. Rust collections
//! hold one concrete type, so the typed world is bridged to a uniform one in
//! two places:
//!
//! ```text
//! Pipeline<(T1, …, Tn)>            ← type-state: the extracted-value tuple
//!        ↓ .seal(handler)             handler: Handler<(T1, …, Tn)>
//! Arc<dyn Fn(Arc<Request>) -> BoxFuture<…>>
//!        ↓ stored in RouteHandler  ← one erased closure per route
//! handler.call(req)  at request time
//! ```
//!
//! [`Handler<Args>`] is implemented once per arity (0..=8) for any async
//! function or closure whose parameters are exactly the tuple's types, in
//! order, returning `impl IntoResponse`. Sealing a pipeline against a
//! handler of any other shape does not compile — there is no runtime arity
//! or type check to fail.
//!
//! The per-request cost of the erased form is one `Arc` clone plus one
//! virtual call, same as any boxed async handler.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::debug;

use crate::error::Rejection;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future.
///
/// `Pin<Box<…>>` because the runtime polls the future in-place; `Send +
/// 'static` so a multithreaded runtime may move it across threads.
pub(crate) type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// The erased form of a fully-composed pipeline: request in, response or
/// rejection out.
pub(crate) type PipelineFn =
    dyn Fn(Arc<Request>) -> BoxFuture<Result<Response, Rejection>> + Send + Sync;

// ── RouteHandler ──────────────────────────────────────────────────────────────

/// A sealed pipeline: immutable, cheap to clone, invokable any number of
/// times, from any number of tasks at once.
///
/// Produced by [`Pipeline::seal`](crate::Pipeline::seal); consumed by the
/// host's dispatch layer, one invocation per matched request. Every
/// invocation re-runs every step and buffers its own extracted values, so
/// concurrent calls never observe each other.
#[derive(Clone)]
pub struct RouteHandler {
    run: Arc<PipelineFn>,
}

impl std::fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteHandler").finish_non_exhaustive()
    }
}

impl RouteHandler {
    pub(crate) fn new(run: Arc<PipelineFn>) -> Self {
        Self { run }
    }

    /// Runs the pipeline against one request.
    ///
    /// `Err` means a guard refused the request or an extractor failed; the
    /// terminal handler did not run. Translating the rejection into a wire
    /// response is the caller's job.
    pub async fn call(&self, req: Request) -> Result<Response, Rejection> {
        let result = (self.run)(Arc::new(req)).await;
        if let Err(rejection) = &result {
            debug!(%rejection, "pipeline halted before handler");
        }
        result
    }
}

// ── Handler trait ─────────────────────────────────────────────────────────────

/// Implemented for every valid terminal handler of a pipeline whose
/// accumulated extractor tuple is `Args`.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn`/closure taking exactly the extracted values, positionally, in
/// declaration order:
///
/// ```text
/// async fn name(v1: T1, …, vn: Tn) -> impl IntoResponse
/// ```
///
/// The trait is **sealed** (via the private `Sealed` supertrait): only the
/// arity impls below can satisfy it, which keeps the API surface stable.
pub trait Handler<Args>: private::Sealed<Args> + Send + Sync + 'static {
    #[doc(hidden)]
    fn call(&self, args: Args) -> BoxFuture<Response>;
}

/// The sealing module. Because `Sealed` is private, external crates cannot
/// name it and therefore cannot implement `Handler` on their own types.
mod private {
    pub trait Sealed<Args> {}
}

/// One impl per arity. `$ty` idents double as type parameters and binding
/// names, so the tuple can be unpacked positionally without a second ident
/// list.
macro_rules! impl_handler {
    ($($ty:ident),*) => {
        impl<F, Fut, R, $($ty,)*> private::Sealed<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: IntoResponse + Send + 'static,
        {
        }

        #[allow(non_snake_case)]
        impl<F, Fut, R, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: IntoResponse + Send + 'static,
            $($ty: Send + 'static,)*
        {
            fn call(&self, ($($ty,)*): ($($ty,)*)) -> BoxFuture<Response> {
                let fut = (self)($($ty),*);
                Box::pin(async move { fut.await.into_response() })
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);

// ── Tuple accumulation ────────────────────────────────────────────────────────

/// Appends one element to the end of a tuple, at the type level and the
/// value level at once.
///
/// This is how [`Pipeline::extract`](crate::Pipeline::extract) grows its
/// accumulated argument list: `()` → `(T1,)` → `(T1, T2)` → …, capped at
/// eight elements.
pub trait TupleAppend<T> {
    type Out;
    fn append(self, value: T) -> Self::Out;
}

macro_rules! impl_tuple_append {
    ($($ty:ident),*) => {
        #[allow(non_snake_case)]
        impl<Z, $($ty,)*> TupleAppend<Z> for ($($ty,)*) {
            type Out = ($($ty,)* Z,);
            fn append(self, value: Z) -> Self::Out {
                let ($($ty,)*) = self;
                ($($ty,)* value,)
            }
        }
    };
}

impl_tuple_append!();
impl_tuple_append!(T1);
impl_tuple_append!(T1, T2);
impl_tuple_append!(T1, T2, T3);
impl_tuple_append!(T1, T2, T3, T4);
impl_tuple_append!(T1, T2, T3, T4, T5);
impl_tuple_append!(T1, T2, T3, T4, T5, T6);
impl_tuple_append!(T1, T2, T3, T4, T5, T6, T7);
