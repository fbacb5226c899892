//! [`TransitionRunner`] – tick-driven vertical move between postures.
//!
//! ```text
//!            start()                    elapsed >= duration
//!   Idle ───────────────▶ Running ─────────────────────────▶ Idle
//!                          │   ▲
//!                          └───┘ tick(dt): y = lerp(start, end, t)
//! ```
//!
//! The runner is a plain state machine advanced by the caller once per
//! simulation tick.  While it is running, [`TransitionRunner::start`] refuses
//! new work, which is what keeps the posture from being re-targeted mid-move.
//! The interpolation parameter is clamped to `[0, 1]`, and the final tick
//! lands exactly on the target coordinate.
//!
//! # Example
//!
//! ```rust
//! use stancelink_runtime::transition::{Step, TransitionRunner};
//! use stancelink_types::Posture;
//!
//! let mut runner = TransitionRunner::new();
//! assert!(runner.start(3.0, -3.0, 1.0, Posture::Sitting));
//!
//! assert_eq!(runner.tick(0.5), Some(Step::Moving { y: 0.0 }));
//! assert_eq!(
//!     runner.tick(0.5),
//!     Some(Step::Finished { y: -3.0, posture: Posture::Sitting })
//! );
//! assert!(!runner.is_busy());
//! ```

use stancelink_types::Posture;

/// Linear interpolation from `a` to `b`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Snapshot of an in-flight transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionState {
    pub start_y: f32,
    pub end_y: f32,
    /// Seconds accumulated so far.
    pub elapsed: f32,
    /// Seconds the move takes in total.
    pub duration: f32,
    pub target: Posture,
}

impl TransitionState {
    /// Interpolation parameter, clamped to `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    /// Where the body should be right now.
    pub fn current_y(&self) -> f32 {
        lerp(self.start_y, self.end_y, self.progress())
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// What one tick of the runner produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Still on the way; write `y` to the body.
    Moving { y: f32 },
    /// Arrived; write `y` (exactly the target) and commit `posture`.
    Finished { y: f32, posture: Posture },
}

impl Step {
    /// The coordinate to write this tick.
    pub fn y(self) -> f32 {
        match self {
            Step::Moving { y } | Step::Finished { y, .. } => y,
        }
    }
}

/// Owns at most one [`TransitionState`].
#[derive(Debug, Default)]
pub struct TransitionRunner {
    active: Option<TransitionState>,
}

impl TransitionRunner {
    /// Create an idle runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` while a transition is running.
    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// The running transition, if any.
    pub fn active(&self) -> Option<&TransitionState> {
        self.active.as_ref()
    }

    /// Begin moving from `start_y` to `end_y` over `duration` seconds.
    ///
    /// Returns `false`, leaving the running transition untouched, if one is
    /// already in flight.  A non-positive or non-finite `duration` completes
    /// on the next tick.
    pub fn start(&mut self, start_y: f32, end_y: f32, duration: f32, target: Posture) -> bool {
        if self.active.is_some() {
            return false;
        }
        let duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
        self.active = Some(TransitionState {
            start_y,
            end_y,
            elapsed: 0.0,
            duration,
            target,
        });
        true
    }

    /// Advance the running transition by `dt` seconds.
    ///
    /// Negative deltas count as zero.  Returns `None` when idle.
    pub fn tick(&mut self, dt: f32) -> Option<Step> {
        let state = self.active.as_mut()?;
        state.elapsed += dt.max(0.0);

        if state.is_complete() {
            let TransitionState { end_y, target, .. } = *state;
            self.active = None;
            return Some(Step::Finished {
                y: end_y,
                posture: target,
            });
        }
        Some(Step::Moving {
            y: state.current_y(),
        })
    }

    /// Drop any running transition without committing it.  Only used for a
    /// full lifecycle reset.
    pub fn clear(&mut self) {
        self.active = None;
    }
}
