//! # Pull-to-refresh gesture machine
//!
//! An explicit state machine (`Idle → Tracking → Releasing → Idle`)
//! driven by discrete transition functions, independent of any UI
//! framework's event binding. The controller feeds it pointer
//! coordinates; it reports what the view layer should do.

/// Downward pull distance that must be exceeded to trigger a refresh.
pub const PULL_THRESHOLD: f64 = 80.0;

/// How long the release animation is given to settle before the pull
/// state resets, avoiding a visual snap.
pub const SETTLE_DELAY: std::time::Duration = std::time::Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GesturePhase {
    Idle,
    /// A gesture started at `start`; `pull` is the current downward distance.
    Tracking { start: f64, pull: f64 },
    /// Fingers lifted; waiting out the settle delay.
    Releasing,
}

/// What the view layer should do after a move event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PullEffect {
    /// Suppress the platform's native scroll/refresh for this movement.
    pub suppress_native: bool,
    pub pull_distance: f64,
    pub is_pulling: bool,
}

impl PullEffect {
    fn inert() -> Self {
        Self {
            suppress_native: false,
            pull_distance: 0.0,
            is_pulling: false,
        }
    }
}

/// Outcome of lifting the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Release {
    pub trigger_refresh: bool,
}

#[derive(Debug)]
pub struct PullGesture {
    phase: GesturePhase,
    at_top: bool,
}

impl PullGesture {
    pub fn new() -> Self {
        Self {
            phase: GesturePhase::Idle,
            at_top: true,
        }
    }

    /// Scroll handler keeps this current; pulls are only eligible from
    /// the very top of the container.
    pub fn set_at_top(&mut self, at_top: bool) {
        self.at_top = at_top;
    }

    pub fn is_at_top(&self) -> bool {
        self.at_top
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn pull_distance(&self) -> f64 {
        match self.phase {
            GesturePhase::Tracking { pull, .. } => pull,
            _ => 0.0,
        }
    }

    pub fn is_pulling(&self) -> bool {
        self.pull_distance() > 0.0
    }

    /// Gesture start: ignored unless at the top and the feed is not busy.
    pub fn begin(&mut self, coordinate: f64, busy: bool) {
        if !self.at_top || busy || self.phase != GesturePhase::Idle {
            return;
        }
        self.phase = GesturePhase::Tracking {
            start: coordinate,
            pull: 0.0,
        };
    }

    /// Gesture move: only downward motion counts as a pull; upward motion
    /// yields zero and leaves native scrolling alone.
    pub fn track(&mut self, coordinate: f64) -> PullEffect {
        let GesturePhase::Tracking { start, .. } = self.phase else {
            return PullEffect::inert();
        };
        let pull = (coordinate - start).max(0.0);
        self.phase = GesturePhase::Tracking { start, pull };
        PullEffect {
            suppress_native: pull > 0.0,
            pull_distance: pull,
            is_pulling: pull > 0.0,
        }
    }

    /// Gesture end: reports whether the pull crossed the threshold and
    /// enters the releasing window. `settle` must follow after
    /// `SETTLE_DELAY` regardless of the outcome.
    pub fn release(&mut self) -> Release {
        let trigger_refresh =
            matches!(self.phase, GesturePhase::Tracking { pull, .. } if pull > PULL_THRESHOLD);
        self.phase = match self.phase {
            GesturePhase::Tracking { .. } => GesturePhase::Releasing,
            other => other,
        };
        Release { trigger_refresh }
    }

    /// Ends the release window; the machine is ready for the next gesture.
    pub fn settle(&mut self) {
        self.phase = GesturePhase::Idle;
    }
}

impl Default for PullGesture {
    fn default() -> Self {
        Self::new()
    }
}
