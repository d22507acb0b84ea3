//! Feed controller reconciliation and guard behavior: dedup on load-more,
//! replace-on-refresh, mutual exclusion, and the pagination gate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mockall::predicate::eq;
use tokio::sync::Semaphore;
use tokio::task::yield_now;

use domains::{AppError, FeedPage, FeedSource, MockFeedSource};
use integration_tests::fixtures;
use services::{FeedController, ScrollMetrics};

const LIMIT: u32 = 10;

fn controller(source: MockFeedSource) -> FeedController {
    FeedController::new(Arc::new(source), LIMIT)
}

#[tokio::test]
async fn load_more_appends_without_duplicating_ids() {
    let mut source = MockFeedSource::new();
    let first = fixtures::page(
        vec![fixtures::post(1), fixtures::post(2), fixtures::post(3)],
        1,
        2,
    );
    let second = fixtures::page(
        vec![fixtures::post(3), fixtures::post(4), fixtures::post(5)],
        2,
        2,
    );
    source
        .expect_fetch_page()
        .with(eq(1), eq(LIMIT))
        .times(1)
        .returning(move |_, _| Ok(first.clone()));
    source
        .expect_fetch_page()
        .with(eq(2), eq(LIMIT))
        .times(1)
        .returning(move |_, _| Ok(second.clone()));

    let controller = controller(source);
    controller.ensure_initial_load().await;
    controller.load_more().await;

    let state = controller.snapshot();
    assert_eq!(fixtures::ids(&state.posts), vec![1, 2, 3, 4, 5]);
    assert_eq!(state.pagination.unwrap().current_page, 2);
    assert!(!state.loading_more);
}

#[tokio::test]
async fn refresh_replaces_the_list_even_when_empty() {
    let mut source = MockFeedSource::new();
    let initial = fixtures::page(vec![fixtures::post(1), fixtures::post(2)], 1, 1);
    let empty = fixtures::page(Vec::new(), 1, 1);
    source
        .expect_fetch_page()
        .with(eq(1), eq(LIMIT))
        .times(1)
        .returning(move |_, _| Ok(initial.clone()));
    source
        .expect_fetch_page()
        .with(eq(1), eq(LIMIT))
        .times(1)
        .returning(move |_, _| Ok(empty.clone()));

    let controller = controller(source);
    controller.ensure_initial_load().await;
    assert_eq!(controller.snapshot().posts.len(), 2);

    controller.refresh().await;
    let state = controller.snapshot();
    assert!(state.posts.is_empty(), "refresh replaces, never prepends");
    assert!(state.error.is_none());
    assert!(state.last_fetch_time.is_some());
}

#[tokio::test]
async fn load_more_is_gated_on_has_next_page() {
    let mut source = MockFeedSource::new();
    let only = fixtures::page(vec![fixtures::post(1)], 1, 1);
    source
        .expect_fetch_page()
        .with(eq(1), eq(LIMIT))
        .times(1)
        .returning(move |_, _| Ok(only.clone()));

    let controller = controller(source);
    controller.ensure_initial_load().await;

    // No further expectation is set: any fetch here would fail the test.
    controller.load_more().await;
    // Scroll proximity alone must not override the pagination gate.
    controller
        .on_scroll(ScrollMetrics {
            scroll_top: 900.0,
            scroll_height: 1500.0,
            client_height: 600.0,
        })
        .await;

    let state = controller.snapshot();
    assert_eq!(fixtures::ids(&state.posts), vec![1]);
    assert!(!state.loading_more);
}

#[tokio::test]
async fn load_more_is_a_noop_before_any_page_arrived() {
    let source = MockFeedSource::new();
    let controller = controller(source);
    controller.load_more().await;
    assert!(controller.snapshot().posts.is_empty());
}

#[tokio::test]
async fn initial_load_runs_at_most_once() {
    let mut source = MockFeedSource::new();
    let page = fixtures::page(vec![fixtures::post(1)], 1, 2);
    source
        .expect_fetch_page()
        .with(eq(1), eq(LIMIT))
        .times(1)
        .returning(move |_, _| Ok(page.clone()));

    let controller = controller(source);
    controller.ensure_initial_load().await;
    controller.ensure_initial_load().await;

    let state = controller.snapshot();
    assert!(state.initial_attempted);
    assert_eq!(state.posts.len(), 1);
}

#[tokio::test]
async fn initial_failure_surfaces_error_and_leaves_list_empty() {
    let mut source = MockFeedSource::new();
    source
        .expect_fetch_page()
        .with(eq(1), eq(LIMIT))
        .times(1)
        .returning(|_, _| Err(AppError::Request("feed service unavailable".into())));

    let controller = controller(source);
    controller.ensure_initial_load().await;

    let state = controller.snapshot();
    assert!(state.posts.is_empty());
    assert_eq!(state.error.as_deref(), Some("feed service unavailable"));
    assert!(!state.loading);

    controller.clear_error();
    assert!(controller.snapshot().error.is_none());
}

#[tokio::test]
async fn refresh_failure_keeps_existing_posts() {
    let mut source = MockFeedSource::new();
    let initial = fixtures::page(vec![fixtures::post(1), fixtures::post(2)], 1, 1);
    source
        .expect_fetch_page()
        .with(eq(1), eq(LIMIT))
        .times(1)
        .returning(move |_, _| Ok(initial.clone()));
    source
        .expect_fetch_page()
        .with(eq(1), eq(LIMIT))
        .times(1)
        .returning(|_, _| Err(AppError::Request("timeout".into())));

    let controller = controller(source);
    controller.ensure_initial_load().await;
    controller.refresh().await;

    let state = controller.snapshot();
    assert_eq!(fixtures::ids(&state.posts), vec![1, 2]);
    assert_eq!(state.error.as_deref(), Some("timeout"));
    assert!(!state.refreshing);
}

#[tokio::test]
async fn load_more_failure_keeps_list_and_stops_the_tail_spinner() {
    let mut source = MockFeedSource::new();
    let initial = fixtures::page(vec![fixtures::post(1)], 1, 3);
    source
        .expect_fetch_page()
        .with(eq(1), eq(LIMIT))
        .times(1)
        .returning(move |_, _| Ok(initial.clone()));
    source
        .expect_fetch_page()
        .with(eq(2), eq(LIMIT))
        .times(1)
        .returning(|_, _| Err(AppError::Request("timeout".into())));

    let controller = controller(source);
    controller.ensure_initial_load().await;
    controller.load_more().await;

    let state = controller.snapshot();
    assert_eq!(fixtures::ids(&state.posts), vec![1]);
    assert!(!state.loading_more);
    // Cursor unchanged: the next load-more asks for page 2 again.
    assert_eq!(state.pagination.unwrap().current_page, 1);
}

#[tokio::test]
async fn scroll_near_bottom_triggers_load_more() {
    let mut source = MockFeedSource::new();
    let first = fixtures::page(vec![fixtures::post(1)], 1, 2);
    let second = fixtures::page(vec![fixtures::post(2)], 2, 2);
    source
        .expect_fetch_page()
        .with(eq(1), eq(LIMIT))
        .times(1)
        .returning(move |_, _| Ok(first.clone()));
    source
        .expect_fetch_page()
        .with(eq(2), eq(LIMIT))
        .times(1)
        .returning(move |_, _| Ok(second.clone()));

    let controller = controller(source);
    controller.ensure_initial_load().await;

    // Far from the bottom: nothing happens.
    controller
        .on_scroll(ScrollMetrics {
            scroll_top: 0.0,
            scroll_height: 5000.0,
            client_height: 600.0,
        })
        .await;
    assert_eq!(controller.snapshot().posts.len(), 1);

    controller
        .on_scroll(ScrollMetrics {
            scroll_top: 4350.0,
            scroll_height: 5000.0,
            client_height: 600.0,
        })
        .await;
    assert_eq!(fixtures::ids(&controller.snapshot().posts), vec![1, 2]);
}

/// Blocks every fetch until a permit is released; counts calls.
struct BlockingSource {
    calls: AtomicUsize,
    gate: Semaphore,
}

impl BlockingSource {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            gate: Semaphore::new(0),
        }
    }
}

#[async_trait]
impl FeedSource for BlockingSource {
    async fn fetch_page(&self, page: u32, _limit: u32) -> domains::Result<FeedPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let permit = self.gate.acquire().await.expect("gate closed");
        permit.forget();
        Ok(fixtures::page(vec![fixtures::post(page as u128)], page, 3))
    }
}

#[tokio::test]
async fn refresh_is_a_noop_while_the_initial_load_is_in_flight() {
    let source = Arc::new(BlockingSource::new());
    let controller = Arc::new(FeedController::new(source.clone(), LIMIT));

    let initial = tokio::spawn({
        let controller = controller.clone();
        async move { controller.ensure_initial_load().await }
    });
    while source.calls.load(Ordering::SeqCst) == 0 {
        yield_now().await;
    }

    // Guarded: no network call is issued and state is unchanged.
    controller.refresh().await;
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert!(!controller.snapshot().refreshing);
    assert!(controller.snapshot().loading);

    source.gate.add_permits(1);
    initial.await.unwrap();
    let state = controller.snapshot();
    assert!(!state.loading);
    assert_eq!(fixtures::ids(&state.posts), vec![1]);
}

/// Page 1 resolves immediately; deeper pages block on the gate.
struct TailBlockingSource {
    tail_calls: AtomicUsize,
    gate: Semaphore,
}

#[async_trait]
impl FeedSource for TailBlockingSource {
    async fn fetch_page(&self, page: u32, _limit: u32) -> domains::Result<FeedPage> {
        if page > 1 {
            self.tail_calls.fetch_add(1, Ordering::SeqCst);
            let permit = self.gate.acquire().await.expect("gate closed");
            permit.forget();
        }
        Ok(fixtures::page(vec![fixtures::post(page as u128)], page, 3))
    }
}

#[tokio::test]
async fn overlapping_load_more_calls_fetch_once() {
    let source = Arc::new(TailBlockingSource {
        tail_calls: AtomicUsize::new(0),
        gate: Semaphore::new(0),
    });
    let controller = Arc::new(FeedController::new(source.clone(), LIMIT));
    controller.ensure_initial_load().await;

    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.load_more().await }
    });
    let second = tokio::spawn({
        let controller = controller.clone();
        async move { controller.load_more().await }
    });

    for _ in 0..20 {
        yield_now().await;
    }
    assert_eq!(source.tail_calls.load(Ordering::SeqCst), 1);

    source.gate.add_permits(1);
    first.await.unwrap();
    second.await.unwrap();

    let state = controller.snapshot();
    assert_eq!(fixtures::ids(&state.posts), vec![1, 2]);
    assert_eq!(state.pagination.unwrap().current_page, 2);
    assert!(!state.loading_more);
}

#[tokio::test]
async fn reset_posts_wipes_list_and_cursor() {
    let mut source = MockFeedSource::new();
    let page = fixtures::page(vec![fixtures::post(1)], 1, 2);
    source
        .expect_fetch_page()
        .with(eq(1), eq(LIMIT))
        .times(1)
        .returning(move |_, _| Ok(page.clone()));

    let controller = controller(source);
    controller.ensure_initial_load().await;
    controller.reset_posts();

    let state = controller.snapshot();
    assert!(state.posts.is_empty());
    assert!(state.pagination.is_none());
    assert!(state.last_fetch_time.is_none());
}
