//! In-process body for headless runs and tests.
//!
//! [`SimBody`] stands in for the physics engine: it stores the last written
//! vertical coordinate and counts writes, so tests can assert both where the
//! player ended up and how many ticks actually moved it.  Clones share the
//! same underlying state, which lets a test keep a probe while the controller
//! owns the body.
//!
//! # Example
//!
//! ```rust
//! use stancelink_hal::{PositionSink, SimBody};
//!
//! let body = SimBody::new(0.0);
//! let mut driver = body.clone();
//! driver.set_vertical(3.0);
//!
//! assert_eq!(body.vertical(), 3.0);
//! assert_eq!(body.writes(), 1);
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

use crate::position::PositionSink;

#[derive(Debug, Default)]
struct BodyState {
    y: f32,
    writes: u64,
}

/// A simulated body.  Always accepts writes.
#[derive(Debug, Clone, Default)]
pub struct SimBody {
    state: Arc<Mutex<BodyState>>,
}

impl SimBody {
    /// Create a body resting at vertical coordinate `y`.
    pub fn new(y: f32) -> Self {
        Self {
            state: Arc::new(Mutex::new(BodyState { y, writes: 0 })),
        }
    }

    /// Number of [`set_vertical`][PositionSink::set_vertical] calls so far.
    pub fn writes(&self) -> u64 {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).writes
    }
}

impl PositionSink for SimBody {
    fn vertical(&self) -> f32 {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).y
    }

    fn set_vertical(&mut self, y: f32) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.y = y;
        state.writes += 1;
        trace!(y, "sim body moved");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_given_height_without_writes() {
        let body = SimBody::new(-3.0);
        assert!((body.vertical() - (-3.0)).abs() < f32::EPSILON);
        assert_eq!(body.writes(), 0);
    }

    #[test]
    fn records_latest_write_and_count() {
        let mut body = SimBody::default();
        body.set_vertical(1.0);
        body.set_vertical(2.0);
        assert!((body.vertical() - 2.0).abs() < f32::EPSILON);
        assert_eq!(body.writes(), 2);
    }

    #[test]
    fn clones_share_state() {
        let probe = SimBody::new(0.0);
        let mut owned: Box<dyn PositionSink> = Box::new(probe.clone());
        owned.set_vertical(-1.5);
        assert!((probe.vertical() - (-1.5)).abs() < f32::EPSILON);
        assert_eq!(probe.writes(), 1);
    }
}
