//! # RefreshCoordinator
//!
//! Single-flight guard around the token refresh operation. Without it,
//! parallel in-flight requests that all receive a 401 would each fire an
//! independent refresh call, racing to rotate the refresh token and
//! invalidating each other. The coordinator collapses N concurrent 401s
//! into exactly one refresh attempt per session.
//!
//! Constructed once at application startup and owned by the gateway;
//! never ambient global state.

use std::sync::Mutex;

use tokio::sync::watch;

/// Where the session's one refresh attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    /// No refresh has been attempted this session.
    Idle,
    /// The single allowed refresh is running.
    InFlight,
    /// The attempt finished; `renewed` says whether tokens were rotated.
    Settled { renewed: bool },
}

/// What a 401 handler is allowed to do next.
#[derive(Debug)]
pub enum RefreshTicket {
    /// Caller won the race: run the refresh, then `settle` the outcome.
    Lead,
    /// A refresh is in flight; await its outcome on this receiver.
    Follow(watch::Receiver<RefreshPhase>),
    /// The session already spent its one attempt. Force logout.
    Denied,
}

#[derive(Debug, Default)]
struct Flags {
    /// Mirrors "a refresh is currently in flight".
    refreshing: bool,
    /// Sticky until `reset`; prevents infinite refresh loops when the
    /// refresh token itself is invalid.
    attempted: bool,
}

pub struct RefreshCoordinator {
    flags: Mutex<Flags>,
    phase: watch::Sender<RefreshPhase>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        let (phase, _) = watch::channel(RefreshPhase::Idle);
        Self {
            flags: Mutex::new(Flags::default()),
            phase,
        }
    }

    /// Atomically decides the caller's role for a fresh (non-retried) 401.
    pub fn acquire(&self) -> RefreshTicket {
        let mut flags = self.flags.lock().expect("refresh flags poisoned");
        if flags.refreshing {
            return RefreshTicket::Follow(self.phase.subscribe());
        }
        if flags.attempted {
            return RefreshTicket::Denied;
        }
        flags.refreshing = true;
        flags.attempted = true;
        self.phase.send_replace(RefreshPhase::InFlight);
        RefreshTicket::Lead
    }

    /// Records the outcome of the lead's refresh and wakes all followers.
    pub fn settle(&self, renewed: bool) {
        let mut flags = self.flags.lock().expect("refresh flags poisoned");
        flags.refreshing = false;
        self.phase.send_replace(RefreshPhase::Settled { renewed });
    }

    /// Re-arms the session. Called exactly once per successful login or
    /// registration so a fresh session is allowed its own refresh attempt.
    pub fn reset(&self) {
        let mut flags = self.flags.lock().expect("refresh flags poisoned");
        flags.refreshing = false;
        flags.attempted = false;
        self.phase.send_replace(RefreshPhase::Idle);
    }

    pub fn is_refreshing(&self) -> bool {
        self.flags.lock().expect("refresh flags poisoned").refreshing
    }

    pub fn has_attempted(&self) -> bool {
        self.flags.lock().expect("refresh flags poisoned").attempted
    }
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
