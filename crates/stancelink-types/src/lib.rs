use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Discrete vertical pose of the player, derived from both feet.
///
/// `Unknown` is only ever the initial value; once a real posture has been
/// committed the controller never returns to it except through a full reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Posture {
    #[default]
    Unknown,
    Sitting,
    Standing,
}

impl fmt::Display for Posture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Posture::Unknown => write!(f, "unknown"),
            Posture::Sitting => write!(f, "sitting"),
            Posture::Standing => write!(f, "standing"),
        }
    }
}

/// One decoded sensor record: the mean of four pressure taps per foot.
///
/// Both fields are finite and non-negative.  A frame that cannot be decoded
/// is a [`DecodeError`], never a zeroed reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FootReading {
    pub foot_left: f32,
    pub foot_right: f32,
}

/// Which tap group of a frame a [`DecodeError::MalformedGroup`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TapGroup {
    /// Right-foot group of a three-field frame.
    Right,
    /// Left-foot group of a three-field frame.
    Left,
    /// The single eight-tap group of a two-field frame.
    Combined,
}

impl fmt::Display for TapGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TapGroup::Right => write!(f, "right-foot"),
            TapGroup::Left => write!(f, "left-foot"),
            TapGroup::Combined => write!(f, "combined"),
        }
    }
}

/// Reasons a raw sensor frame is rejected.  None of them are fatal: the frame
/// is dropped and the stream carries on.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DecodeError {
    #[error("malformed frame: expected 2 or 3 ';'-separated fields, found {fields} in {raw:?}")]
    MalformedFrame { raw: String, fields: usize },

    #[error("malformed {group} group: expected {expected} taps, found {found} in {raw:?}")]
    MalformedGroup {
        raw: String,
        group: TapGroup,
        expected: usize,
        found: usize,
    },

    #[error("unparsable tap {token:?} in {raw:?}: {detail}")]
    ParseFailure {
        raw: String,
        token: String,
        detail: String,
    },
}

impl DecodeError {
    /// The trimmed frame text that failed to decode.
    pub fn raw(&self) -> &str {
        match self {
            DecodeError::MalformedFrame { raw, .. }
            | DecodeError::MalformedGroup { raw, .. }
            | DecodeError::ParseFailure { raw, .. } => raw,
        }
    }
}

/// Failures of the producer-side byte stream.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("sensor link I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sensor link thread terminated abnormally")]
    Disconnected,
}

/// Diagnostic event published on the in-process bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g. "stancelink-runtime::controller"
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Stamp `payload` with a fresh id and the current time.
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// What happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    /// A frame decoded successfully and reached the consumer.
    Reading(FootReading),
    /// A frame was rejected by the decoder.
    DecodeFault { raw: String, reason: String },
    /// The feet disagree about which side of the threshold they are on (or
    /// one of them sits exactly on it).
    Ambiguous {
        foot_left: f32,
        foot_right: f32,
        threshold: f32,
    },
    /// A transition finished and the new posture was committed.
    PostureCommitted { posture: Posture, y: f32 },
    /// The producer reached the end of its byte stream.
    LinkClosed { frames: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posture_defaults_to_unknown() {
        assert_eq!(Posture::default(), Posture::Unknown);
    }

    #[test]
    fn posture_serialization_roundtrip() {
        let json = serde_json::to_string(&Posture::Standing).unwrap();
        let back: Posture = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Posture::Standing);
    }

    #[test]
    fn decode_error_exposes_raw_text() {
        let err = DecodeError::MalformedFrame {
            raw: "garbage".to_string(),
            fields: 1,
        };
        assert_eq!(err.raw(), "garbage");

        let err = DecodeError::ParseFailure {
            raw: "H;1,2,x,4;1,2,3,4".to_string(),
            token: "x".to_string(),
            detail: "invalid digit found in string".to_string(),
        };
        assert_eq!(err.raw(), "H;1,2,x,4;1,2,3,4");
    }

    #[test]
    fn decode_error_display() {
        let err = DecodeError::MalformedGroup {
            raw: "H;1,2,3;1,2,3,4".to_string(),
            group: TapGroup::Right,
            expected: 4,
            found: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("right-foot"));
        assert!(msg.contains("found 3"));

        let err = DecodeError::ParseFailure {
            raw: "H;a,2,3,4;1,2,3,4".to_string(),
            token: "a".to_string(),
            detail: "invalid digit found in string".to_string(),
        };
        assert!(err.to_string().contains("\"a\""));
    }

    #[test]
    fn event_roundtrip() {
        let event = Event::new(
            "stancelink-runtime::controller",
            EventPayload::PostureCommitted {
                posture: Posture::Sitting,
                y: -3.0,
            },
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event.id, back.id);
        assert_eq!(event.source, back.source);
        match back.payload {
            EventPayload::PostureCommitted { posture, y } => {
                assert_eq!(posture, Posture::Sitting);
                assert!((y - (-3.0)).abs() < f32::EPSILON);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn link_error_from_io() {
        let err: LinkError = std::io::Error::other("port vanished").into();
        assert!(err.to_string().contains("port vanished"));
    }
}
