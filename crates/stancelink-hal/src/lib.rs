//! `stancelink-hal` – the body the posture drives.
//!
//! The runtime never talks to a physics engine directly.  It writes the
//! player's vertical coordinate through the [`PositionSink`] trait, so the
//! same controller can move a rigid body, a sprite, or the in-process
//! [`SimBody`] used in tests and headless runs.
//!
//! # Modules
//!
//! - [`position`] – [`PositionSink`]: read/write access to the vertical
//!   coordinate.
//! - [`sim`] – [`SimBody`]: in-process sink that records every write.

pub mod position;
pub mod sim;

pub use position::PositionSink;
pub use sim::SimBody;
