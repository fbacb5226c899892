//! Two-state posture classifier.
//!
//! Both feet must agree.  If both readings are strictly below the threshold
//! the player is sitting; strictly above, standing.  Anything else (feet on
//! opposite sides, a foot exactly on the threshold, a NaN) is a hold.  There
//! is no hysteresis: the decision depends only on the current frame.
//!
//! # Example
//!
//! ```rust
//! use stancelink_runtime::classifier::classify;
//! use stancelink_types::Posture;
//!
//! assert_eq!(classify(100.0, 120.0, Posture::Unknown, 400.0, false), Some(Posture::Sitting));
//! assert_eq!(classify(400.0, 900.0, Posture::Sitting, 400.0, false), None);
//! ```

use stancelink_types::{FootReading, Posture};

/// Why a reading did not start a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    /// The feet do not both sit strictly on the same side of the threshold.
    /// This is the only hold worth reporting as ambiguous.
    Straddling,
    /// Both feet agree, but the player already holds that posture.
    AlreadyInPosture,
    /// Both feet agree, but a transition is still running.
    TransitionInProgress,
}

/// Outcome of classifying one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Start moving toward this posture.
    Transition(Posture),
    /// Leave everything as it is.
    Hold(HoldReason),
}

impl Decision {
    /// The proposed posture, if any.
    pub fn proposal(self) -> Option<Posture> {
        match self {
            Decision::Transition(posture) => Some(posture),
            Decision::Hold(_) => None,
        }
    }

    /// `true` for readings whose feet disagree about the threshold.
    pub fn is_ambiguous(self) -> bool {
        self == Decision::Hold(HoldReason::Straddling)
    }
}

/// Classify `reading` against `threshold` given the committed posture and
/// whether a transition is in flight.
pub fn decide(reading: FootReading, current: Posture, threshold: f32, busy: bool) -> Decision {
    let FootReading {
        foot_left,
        foot_right,
    } = reading;

    let target = if foot_left < threshold && foot_right < threshold {
        Posture::Sitting
    } else if foot_left > threshold && foot_right > threshold {
        Posture::Standing
    } else {
        return Decision::Hold(HoldReason::Straddling);
    };

    if busy {
        Decision::Hold(HoldReason::TransitionInProgress)
    } else if current == target {
        Decision::Hold(HoldReason::AlreadyInPosture)
    } else {
        Decision::Transition(target)
    }
}

/// Flat form of [`decide`]: the posture to move to, or `None` for no change.
pub fn classify(
    foot_left: f32,
    foot_right: f32,
    current: Posture,
    threshold: f32,
    busy: bool,
) -> Option<Posture> {
    decide(
        FootReading {
            foot_left,
            foot_right,
        },
        current,
        threshold,
        busy,
    )
    .proposal()
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: f32 = 400.0;

    fn reading(foot_left: f32, foot_right: f32) -> FootReading {
        FootReading {
            foot_left,
            foot_right,
        }
    }

    #[test]
    fn both_below_proposes_sitting() {
        for current in [Posture::Unknown, Posture::Standing] {
            assert_eq!(classify(10.0, 399.9, current, T, false), Some(Posture::Sitting));
        }
    }

    #[test]
    fn both_above_proposes_standing() {
        for current in [Posture::Unknown, Posture::Sitting] {
            assert_eq!(classify(400.1, 900.0, current, T, false), Some(Posture::Standing));
        }
    }

    #[test]
    fn straddling_readings_hold() {
        assert_eq!(
            decide(reading(100.0, 900.0), Posture::Unknown, T, false),
            Decision::Hold(HoldReason::Straddling)
        );
        assert_eq!(
            decide(reading(900.0, 100.0), Posture::Sitting, T, false),
            Decision::Hold(HoldReason::Straddling)
        );
    }

    #[test]
    fn exactly_at_threshold_never_triggers() {
        for (l, r) in [(T, T), (T, 10.0), (10.0, T), (T, 900.0), (900.0, T)] {
            for current in [Posture::Unknown, Posture::Sitting, Posture::Standing] {
                let d = decide(reading(l, r), current, T, false);
                assert!(d.is_ambiguous(), "({l}, {r}) from {current} gave {d:?}");
                assert_eq!(d.proposal(), None);
            }
        }
    }

    #[test]
    fn already_in_target_posture_holds() {
        assert_eq!(
            decide(reading(10.0, 10.0), Posture::Sitting, T, false),
            Decision::Hold(HoldReason::AlreadyInPosture)
        );
        assert_eq!(
            decide(reading(900.0, 900.0), Posture::Standing, T, false),
            Decision::Hold(HoldReason::AlreadyInPosture)
        );
    }

    #[test]
    fn busy_blocks_every_proposal() {
        for current in [Posture::Unknown, Posture::Sitting, Posture::Standing] {
            assert_eq!(classify(10.0, 10.0, current, T, true), None);
            assert_eq!(classify(900.0, 900.0, current, T, true), None);
        }
        assert_eq!(
            decide(reading(900.0, 900.0), Posture::Sitting, T, true),
            Decision::Hold(HoldReason::TransitionInProgress)
        );
    }

    #[test]
    fn nan_reading_is_ambiguous() {
        assert!(decide(reading(f32::NAN, 10.0), Posture::Unknown, T, false).is_ambiguous());
    }

    #[test]
    fn only_straddling_counts_as_ambiguous() {
        assert!(!Decision::Hold(HoldReason::AlreadyInPosture).is_ambiguous());
        assert!(!Decision::Hold(HoldReason::TransitionInProgress).is_ambiguous());
        assert!(!Decision::Transition(Posture::Sitting).is_ambiguous());
    }
}
