//! Pipeline composition and execution semantics.
//!
//! The load-bearing invariant: extractors — and only extractors — shape the
//! terminal handler's parameter list, in declaration order, regardless of
//! how many guards and actions surround them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use trellis::{ExtractError, GuardKind, Method, Pipeline, Rejection, Request, Response};

fn get(path: &str) -> Request {
    Request::new(Method::GET, path)
}

#[tokio::test]
async fn extractors_feed_the_handler_positionally_in_declaration_order() {
    let handler = Pipeline::new()
        .extract(|req: Arc<Request>| async move { Ok(req.path().to_owned()) })
        .extract(|req: Arc<Request>| async move { Ok(req.path().len() as u64) })
        .seal(|path: String, len: u64| async move {
            Response::text(format!("{path}:{len}"))
        });

    let response = handler.call(get("/orders")).await.expect("pipeline passes");
    assert_eq!(response.body(), b"/orders:7");
}

#[tokio::test]
async fn guards_and_actions_do_not_change_the_required_signature() {
    // Actions and guards before, between, and after the two extractors; the
    // handler still takes exactly (String, u64).
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_a = Arc::clone(&hits);
    let hits_b = Arc::clone(&hits);

    let handler = Pipeline::new()
        .action(move |_req| {
            let hits = Arc::clone(&hits_a);
            async move { hits.fetch_add(1, Ordering::SeqCst); }
        })
        .guard(|_req| async move { Ok(()) })
        .extract(|req: Arc<Request>| async move { Ok(req.path().to_owned()) })
        .action(move |_req| {
            let hits = Arc::clone(&hits_b);
            async move { hits.fetch_add(1, Ordering::SeqCst); }
        })
        .extract(|_req| async move { Ok(7u64) })
        .guard(|_req| async move { Ok(()) })
        .seal(|path: String, n: u64| async move { Response::text(format!("{path}/{n}")) });

    let response = handler.call(get("/x")).await.expect("all steps pass");
    assert_eq!(response.body(), b"/x/7");
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failing_guard_halts_before_later_steps_and_handler() {
    let later_extractor_runs = Arc::new(AtomicUsize::new(0));
    let handler_runs = Arc::new(AtomicUsize::new(0));
    let extractor_probe = Arc::clone(&later_extractor_runs);
    let handler_probe = Arc::clone(&handler_runs);

    let handler = Pipeline::new()
        .extract(|req: Arc<Request>| async move { Ok(req.path().to_owned()) })
        .guard(|_req| async move { Err(GuardKind::RateLimited) })
        .extract(move |_req| {
            let probe = Arc::clone(&extractor_probe);
            async move {
                probe.fetch_add(1, Ordering::SeqCst);
                Ok(1u64)
            }
        })
        .seal(move |_path: String, _n: u64| {
            let probe = Arc::clone(&handler_probe);
            async move {
                probe.fetch_add(1, Ordering::SeqCst);
                Response::text("unreachable")
            }
        });

    let rejection = handler.call(get("/limited")).await.unwrap_err();
    assert!(matches!(rejection, Rejection::Guard(GuardKind::RateLimited)));
    assert_eq!(later_extractor_runs.load(Ordering::SeqCst), 0);
    assert_eq!(handler_runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failing_extractor_surfaces_the_cause_and_skips_the_handler() {
    let handler_runs = Arc::new(AtomicUsize::new(0));
    let probe = Arc::clone(&handler_runs);

    let handler = Pipeline::new()
        .extract(|_req| async move {
            Err::<u64, _>(ExtractError::msg("malformed body"))
        })
        .seal(move |_n: u64| {
            let probe = Arc::clone(&probe);
            async move {
                probe.fetch_add(1, Ordering::SeqCst);
                Response::text("unreachable")
            }
        });

    let rejection = handler.call(get("/broken")).await.unwrap_err();
    match rejection {
        Rejection::Extraction(cause) => {
            assert_eq!(cause.to_string(), "malformed body");
        }
        other => panic!("expected extraction rejection, got: {other}"),
    }
    assert_eq!(handler_runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn extract_error_keeps_the_underlying_cause_in_the_chain() {
    let parse_failure = "zzz".parse::<u64>().unwrap_err();

    let handler = Pipeline::new()
        .extract(move |_req| {
            let cause = parse_failure.clone();
            async move { Err::<u64, _>(ExtractError::new(cause)) }
        })
        .seal(|_n: u64| async move { Response::text("unreachable") });

    let rejection = handler.call(get("/parse")).await.unwrap_err();
    let source = std::error::Error::source(&rejection).expect("extraction cause");
    assert!(source.to_string().contains("invalid digit"));
}

#[tokio::test]
async fn steps_rerun_on_every_invocation() {
    let extractor_runs = Arc::new(AtomicUsize::new(0));
    let probe = Arc::clone(&extractor_runs);

    let handler = Pipeline::new()
        .extract(move |_req| {
            let probe = Arc::clone(&probe);
            async move { Ok(probe.fetch_add(1, Ordering::SeqCst)) }
        })
        .seal(|n: usize| async move { Response::text(n.to_string()) });

    let first = handler.call(get("/a")).await.unwrap();
    let second = handler.call(get("/a")).await.unwrap();
    assert_eq!(first.body(), b"0");
    assert_eq!(second.body(), b"1");
    assert_eq!(extractor_runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn sealed_pipeline_handles_concurrent_invocations_independently() {
    let handler = Pipeline::new()
        .extract(|req: Arc<Request>| async move {
            req.param("id")
                .map(str::to_owned)
                .ok_or_else(|| ExtractError::msg("missing id"))
        })
        .seal(|id: String| async move { Response::text(id) });

    let with_id = |id: &str| {
        get("/items").with_params(HashMap::from([("id".to_owned(), id.to_owned())]))
    };

    let (a, b, c) = tokio::join!(
        handler.call(with_id("1")),
        handler.call(with_id("2")),
        handler.call(get("/items")),
    );

    // Each invocation buffers its own values; the failing one does not
    // disturb its neighbours.
    assert_eq!(a.unwrap().body(), b"1");
    assert_eq!(b.unwrap().body(), b"2");
    assert!(matches!(c.unwrap_err(), Rejection::Extraction(_)));
}

#[tokio::test]
async fn guard_rejection_kinds_reach_the_dispatch_layer_intact() {
    for (kind, expected) in [
        (GuardKind::Unauthorized, "unauthorized"),
        (GuardKind::RateLimited, "rate limited"),
        (GuardKind::Other("quota exceeded".to_owned()), "quota exceeded"),
    ] {
        let rejecting = kind.clone();
        let handler = Pipeline::new()
            .guard(move |_req| {
                let kind = rejecting.clone();
                async move { Err(kind) }
            })
            .seal(|| async { Response::text("unreachable") });

        let rejection = handler.call(get("/")).await.unwrap_err();
        match rejection {
            Rejection::Guard(got) => {
                assert_eq!(got, kind);
                assert_eq!(got.to_string(), expected);
            }
            other => panic!("expected guard rejection, got: {other}"),
        }
    }
}
