//! `stancelink-runtime` – The posture state machine.
//!
//! Everything that runs on the simulation tick lives here.
//!
//! # Modules
//!
//! - [`classifier`] – [`decide`][classifier::decide] /
//!   [`classify`][classifier::classify]: strict two-sided thresholding of
//!   both feet into a [`Decision`][classifier::Decision].
//! - [`transition`] – [`TransitionRunner`][transition::TransitionRunner]:
//!   non-reentrant, tick-driven linear move between posture heights.
//! - [`controller`] – [`PostureController`][controller::PostureController]
//!   owns posture, runner and body and receives sensor callbacks;
//!   [`PostureLoop`][controller::PostureLoop] drains the mailbox and advances
//!   the controller once per tick.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: console
//!   logging plus optional OTLP span export.

pub mod classifier;
pub mod controller;
pub mod telemetry;
pub mod transition;

pub use classifier::{Decision, HoldReason, classify, decide};
pub use controller::{ControllerStats, PostureConfig, PostureController, PostureLoop, TickReport};
pub use telemetry::{TracerProviderGuard, init_tracing};
pub use transition::{Step, TransitionRunner, TransitionState};
