//! # FeedController
//!
//! Owns three logically distinct async loading operations over the same
//! post list (initial load, refresh, load-more) and reconciles their
//! results deterministically. Drives the infinite-scroll trigger and the
//! pull-to-refresh gesture.
//!
//! The list is owned exclusively here; the view layer only reads
//! snapshots and dispatches operations. Every reconciliation happens
//! under one lock acquisition, so no intermediate state is observable.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use domains::{FeedSource, PaginationMeta, Post};

use crate::gesture::{PullEffect, PullGesture, SETTLE_DELAY};

/// Scroll proximity (distance units from the bottom) that triggers
/// loading the next page.
pub const SCROLL_THRESHOLD: f64 = 100.0;

/// Posts requested per page unless configured otherwise.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Scroll container geometry as reported by the view layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    pub fn near_bottom(&self, threshold: f64) -> bool {
        self.scroll_height - self.scroll_top <= self.client_height + threshold
    }

    pub fn at_top(&self) -> bool {
        self.scroll_top == 0.0
    }
}

/// The reconciled view model. Busy flags are independent so the view can
/// distinguish first-load spinners from refresh spinners from tail
/// spinners.
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    /// Unique by id, insertion order preserved.
    pub posts: Vec<Post>,
    pub pagination: Option<PaginationMeta>,
    pub loading: bool,
    pub refreshing: bool,
    pub loading_more: bool,
    pub error: Option<String>,
    pub last_fetch_time: Option<DateTime<Utc>>,
    pub initial_attempted: bool,
}

pub struct FeedController {
    source: Arc<dyn FeedSource>,
    page_limit: u32,
    state: Mutex<FeedState>,
    /// Guards load-more re-entry from scroll events that fire again before
    /// the `loading_more` state flag is observable; the two updates are
    /// not atomic with each other.
    load_more_in_flight: AtomicBool,
    gesture: Mutex<PullGesture>,
}

impl FeedController {
    pub fn new(source: Arc<dyn FeedSource>, page_limit: u32) -> Self {
        Self {
            source,
            page_limit,
            state: Mutex::new(FeedState::default()),
            load_more_in_flight: AtomicBool::new(false),
            gesture: Mutex::new(PullGesture::new()),
        }
    }

    /// Runs the initial load at most once. On success the post list is
    /// replaced wholesale; on failure previously loaded posts (none, on a
    /// true first load) are left untouched and the error is surfaced.
    pub async fn ensure_initial_load(&self) {
        {
            let mut state = self.state();
            if state.initial_attempted || state.loading {
                return;
            }
            state.initial_attempted = true;
            state.loading = true;
            state.error = None;
        }

        let outcome = self.source.fetch_page(1, self.page_limit).await;

        let mut state = self.state();
        state.loading = false;
        match outcome {
            Ok(page) => {
                debug!(posts = page.posts.len(), "initial feed load");
                state.posts = page.posts;
                state.pagination = Some(page.pagination);
                state.last_fetch_time = Some(Utc::now());
                state.error = None;
            }
            Err(err) => {
                warn!(error = %err, "initial feed load failed");
                state.error = Some(err.to_string());
            }
        }
    }

    /// Re-fetches page 1 and replaces the whole list, never prepends, so
    /// an empty result legitimately empties the feed rather than leaving
    /// stale posts. No-op while a refresh or the initial load is running.
    pub async fn refresh(&self) {
        {
            let mut state = self.state();
            // Deliberately not gated on `loading_more`; see DESIGN.md.
            if state.refreshing || state.loading {
                return;
            }
            state.refreshing = true;
            state.error = None;
        }

        let outcome = self.source.fetch_page(1, self.page_limit).await;

        let mut state = self.state();
        state.refreshing = false;
        match outcome {
            Ok(page) => {
                debug!(posts = page.posts.len(), "feed refreshed");
                state.posts = page.posts;
                state.pagination = Some(page.pagination);
                state.last_fetch_time = Some(Utc::now());
                state.error = None;
            }
            Err(err) => {
                warn!(error = %err, "feed refresh failed");
                state.error = Some(err.to_string());
            }
        }
    }

    /// Fetches the page after the current cursor and appends only posts
    /// whose id is not already present. No-op while any other load is
    /// running or when the cursor says there is nothing further.
    pub async fn load_more(&self) {
        let next_page = {
            let mut state = self.state();
            let (has_next, next_page) = match state.pagination.as_ref() {
                Some(pagination) => (pagination.has_next_page, pagination.current_page + 1),
                None => return,
            };
            if !has_next || state.loading_more || state.loading {
                return;
            }
            if self.load_more_in_flight.swap(true, Ordering::SeqCst) {
                return;
            }
            state.loading_more = true;
            state.error = None;
            next_page
        };

        let outcome = self.source.fetch_page(next_page, self.page_limit).await;

        {
            let mut state = self.state();
            state.loading_more = false;
            match outcome {
                Ok(page) => {
                    let seen: HashSet<Uuid> = state.posts.iter().map(|post| post.id).collect();
                    let fresh: Vec<Post> = page
                        .posts
                        .into_iter()
                        .filter(|post| !seen.contains(&post.id))
                        .collect();
                    debug!(page = next_page, appended = fresh.len(), "loaded more posts");
                    state.posts.extend(fresh);
                    state.pagination = Some(page.pagination);
                    state.error = None;
                }
                Err(err) => {
                    warn!(error = %err, "load more failed");
                    state.error = Some(err.to_string());
                }
            }
        }
        self.load_more_in_flight.store(false, Ordering::SeqCst);
    }

    /// Scroll handler: tracks whether the container sits at the very top
    /// (gating pull-to-refresh) and triggers load-more near the bottom.
    pub async fn on_scroll(&self, metrics: ScrollMetrics) {
        self.gesture().set_at_top(metrics.at_top());
        if metrics.near_bottom(SCROLL_THRESHOLD) {
            self.load_more().await;
        }
    }

    /// Pointer down. Ignored unless the container is at the top and
    /// neither refreshing nor initial-loading.
    pub fn gesture_start(&self, coordinate: f64) {
        let busy = {
            let state = self.state();
            state.refreshing || state.loading
        };
        self.gesture().begin(coordinate, busy);
    }

    /// Pointer move. Returns what the view should do (suppress native
    /// scrolling, current pull distance).
    pub fn gesture_move(&self, coordinate: f64) -> PullEffect {
        self.gesture().track(coordinate)
    }

    /// Pointer up: triggers a refresh when the pull crossed the threshold,
    /// then waits out the settle delay before resetting the gesture. The
    /// refresh guard makes an overlapping second refresh impossible.
    pub async fn gesture_end(&self) {
        let release = self.gesture().release();
        if release.trigger_refresh {
            self.refresh().await;
        }
        tokio::time::sleep(SETTLE_DELAY).await;
        self.gesture().settle();
    }

    pub fn snapshot(&self) -> FeedState {
        self.state().clone()
    }

    pub fn pull_distance(&self) -> f64 {
        self.gesture().pull_distance()
    }

    pub fn is_pulling(&self) -> bool {
        self.gesture().is_pulling()
    }

    pub fn clear_error(&self) {
        self.state().error = None;
    }

    /// Wipes the reconciled list and cursor, e.g. when the feed view is
    /// torn down on logout.
    pub fn reset_posts(&self) {
        let mut state = self.state();
        state.posts.clear();
        state.pagination = None;
        state.last_fetch_time = None;
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().expect("feed state poisoned")
    }

    fn gesture(&self) -> MutexGuard<'_, PullGesture> {
        self.gesture.lock().expect("gesture state poisoned")
    }
}
