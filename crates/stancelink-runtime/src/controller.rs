//! [`PostureController`] and [`PostureLoop`] – the consumer side.
//!
//! The controller owns every piece of simulation state the sensor can
//! influence: the committed [`Posture`], the [`TransitionRunner`] and the
//! body it moves.  It is only ever touched from the tick thread; the sensor
//! thread reaches it exclusively through actions queued in the mailbox.
//!
//! [`PostureLoop`] pairs the controller with the mailbox's [`Inbox`].  Each
//! call to [`PostureLoop::tick`]:
//!
//! 1. **Drain** – runs every queued action (readings, decode faults, link
//!    shutdown) against the controller, in arrival order.
//! 2. **Advance** – steps the running transition by `dt` and writes the new
//!    vertical coordinate to the body; commits the posture on arrival.
//!
//! # Example
//!
//! ```rust
//! use stancelink_hal::SimBody;
//! use stancelink_middleware::{EventBus, SensorHandler};
//! use stancelink_runtime::controller::{PostureConfig, PostureController, PostureLoop};
//! use stancelink_types::{FootReading, Posture};
//!
//! let body = SimBody::new(0.0);
//! let controller =
//!     PostureController::new(PostureConfig::default(), Box::new(body.clone()), EventBus::default());
//! let mut posture_loop = PostureLoop::new(controller);
//!
//! posture_loop
//!     .outbox()
//!     .enqueue(|c: &mut PostureController| {
//!         c.on_reading(FootReading { foot_left: 900.0, foot_right: 900.0 })
//!     });
//!
//! posture_loop.tick(1.0);
//! assert_eq!(posture_loop.controller().posture(), Posture::Standing);
//! ```

use serde::{Deserialize, Serialize};
use stancelink_hal::PositionSink;
use stancelink_middleware::mailbox::{self, Inbox, Outbox};
use stancelink_middleware::{EventBus, SensorHandler, Topic};
use stancelink_types::{DecodeError, Event, EventPayload, FootReading, Posture};
use tracing::{debug, debug_span, field, info, warn};

use crate::classifier::{self, Decision};
use crate::transition::{Step, TransitionRunner};

const SOURCE: &str = "stancelink-runtime::controller";

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Tunables for the posture state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostureConfig {
    /// Foot-pressure level separating sitting (below) from standing (above).
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// Vertical coordinate of the sitting pose.
    #[serde(default = "default_sitting_y")]
    pub sitting_y: f32,
    /// Vertical coordinate of the standing pose.
    #[serde(default = "default_standing_y")]
    pub standing_y: f32,
    /// Seconds a posture change takes.
    #[serde(default = "default_move_duration")]
    pub move_duration_secs: f32,
}

fn default_threshold() -> f32 {
    400.0
}
fn default_sitting_y() -> f32 {
    -3.0
}
fn default_standing_y() -> f32 {
    3.0
}
fn default_move_duration() -> f32 {
    1.0
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            sitting_y: default_sitting_y(),
            standing_y: default_standing_y(),
            move_duration_secs: default_move_duration(),
        }
    }
}

impl PostureConfig {
    /// Canonical vertical coordinate for `posture`; `None` for
    /// [`Posture::Unknown`], which has no place on screen.
    pub fn target_y(&self, posture: Posture) -> Option<f32> {
        match posture {
            Posture::Sitting => Some(self.sitting_y),
            Posture::Standing => Some(self.standing_y),
            Posture::Unknown => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PostureController
// ─────────────────────────────────────────────────────────────────────────────

/// Running totals, for the end-of-run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerStats {
    pub readings: u64,
    pub decode_faults: u64,
    pub ambiguous: u64,
    pub transitions: u64,
}

/// Single-writer owner of posture, transition and body.
pub struct PostureController {
    config: PostureConfig,
    posture: Posture,
    runner: TransitionRunner,
    body: Box<dyn PositionSink>,
    bus: EventBus,
    alive: bool,
    link_closed: bool,
    stats: ControllerStats,
}

impl PostureController {
    /// Build a controller around `body`.  Diagnostics go to `bus` as well as
    /// to `tracing`.
    pub fn new(config: PostureConfig, body: Box<dyn PositionSink>, bus: EventBus) -> Self {
        Self {
            config,
            posture: Posture::Unknown,
            runner: TransitionRunner::new(),
            body,
            bus,
            alive: true,
            link_closed: false,
            stats: ControllerStats::default(),
        }
    }

    /// Last committed posture.  Stays put while a transition is running.
    pub fn posture(&self) -> Posture {
        self.posture
    }

    /// Current vertical coordinate of the body.
    pub fn vertical(&self) -> f32 {
        self.body.vertical()
    }

    /// `true` while a transition is running.
    pub fn is_busy(&self) -> bool {
        self.runner.is_busy()
    }

    pub fn config(&self) -> &PostureConfig {
        &self.config
    }

    pub fn stats(&self) -> ControllerStats {
        self.stats
    }

    /// `true` once the sensor link has reported end of stream.
    pub fn link_closed(&self) -> bool {
        self.link_closed
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Freeze (or unfreeze) classification from the game side.  While frozen,
    /// readings are dropped before they are counted or classified; a running
    /// transition still completes.  This does not touch the sensor link: to
    /// end input on death, [`disconnect`] the link as well.
    ///
    /// [`disconnect`]: stancelink_middleware::SensorLink::disconnect
    pub fn set_alive(&mut self, alive: bool) {
        if self.alive != alive {
            info!(alive, "player liveness changed");
        }
        self.alive = alive;
    }

    /// Classify `reading` and start a transition if warranted.
    ///
    /// Returns `None` without classifying while the player is not alive.
    pub fn apply_reading(&mut self, reading: FootReading) -> Option<Decision> {
        if !self.alive {
            debug!(
                foot_l = reading.foot_left,
                foot_r = reading.foot_right,
                "reading ignored: player not alive"
            );
            return None;
        }
        self.stats.readings += 1;
        debug!(
            foot_l = reading.foot_left,
            foot_r = reading.foot_right,
            "foot reading"
        );
        self.bus
            .publish_to(Topic::Readings, Event::new(SOURCE, EventPayload::Reading(reading)));

        let threshold = self.config.threshold;
        let decision = classifier::decide(reading, self.posture, threshold, self.runner.is_busy());
        match decision {
            Decision::Transition(target) => self.begin_transition(target),
            Decision::Hold(reason) if decision.is_ambiguous() => {
                self.stats.ambiguous += 1;
                info!(
                    foot_l = reading.foot_left,
                    foot_r = reading.foot_right,
                    threshold,
                    ?reason,
                    "foot readings straddle threshold"
                );
                self.bus.publish_to(
                    Topic::Readings,
                    Event::new(
                        SOURCE,
                        EventPayload::Ambiguous {
                            foot_left: reading.foot_left,
                            foot_right: reading.foot_right,
                            threshold,
                        },
                    ),
                );
            }
            Decision::Hold(reason) => debug!(?reason, "reading holds posture"),
        }
        Some(decision)
    }

    /// Record a rejected frame.  State is left untouched.
    pub fn report_decode_error(&mut self, error: &DecodeError) {
        self.stats.decode_faults += 1;
        warn!(raw = error.raw(), error = %error, "sensor frame rejected");
        self.bus.publish_to(
            Topic::Faults,
            Event::new(
                SOURCE,
                EventPayload::DecodeFault {
                    raw: error.raw().to_string(),
                    reason: error.to_string(),
                },
            ),
        );
    }

    /// Step the running transition by `dt` seconds and move the body.
    ///
    /// Returns the posture committed on this tick, if the transition arrived.
    pub fn advance(&mut self, dt: f32) -> Option<Posture> {
        match self.runner.tick(dt)? {
            Step::Moving { y } => {
                self.body.set_vertical(y);
                None
            }
            Step::Finished { y, posture } => {
                self.body.set_vertical(y);
                self.posture = posture;
                info!(%posture, y, "posture committed");
                self.bus.publish_to(
                    Topic::Posture,
                    Event::new(SOURCE, EventPayload::PostureCommitted { posture, y }),
                );
                Some(posture)
            }
        }
    }

    /// Full lifecycle restart: back to [`Posture::Unknown`], no transition,
    /// alive, counters cleared.  The body stays where it is.  Queued mailbox
    /// actions are not touched; [`PostureLoop::reset`] discards those too.
    pub fn reset(&mut self) {
        self.runner.clear();
        self.posture = Posture::Unknown;
        self.alive = true;
        self.link_closed = false;
        self.stats = ControllerStats::default();
        info!("posture controller reset");
    }

    fn begin_transition(&mut self, target: Posture) {
        let Some(end_y) = self.config.target_y(target) else {
            return;
        };
        let start_y = self.body.vertical();
        if self
            .runner
            .start(start_y, end_y, self.config.move_duration_secs, target)
        {
            self.stats.transitions += 1;
            info!(%target, start_y, end_y, "posture transition started");
        }
    }
}

impl SensorHandler for PostureController {
    fn on_reading(&mut self, reading: FootReading) {
        self.apply_reading(reading);
    }

    fn on_decode_error(&mut self, error: DecodeError) {
        self.report_decode_error(&error);
    }

    fn on_link_closed(&mut self, frames: u64) {
        self.link_closed = true;
        info!(frames, "sensor link reported end of stream");
        self.bus.publish_to(
            Topic::Faults,
            Event::new(SOURCE, EventPayload::LinkClosed { frames }),
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PostureLoop
// ─────────────────────────────────────────────────────────────────────────────

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Mailbox actions executed.
    pub drained: usize,
    /// Posture committed by this tick's advance, if any.
    pub committed: Option<Posture>,
}

/// The per-tick consumer: drains the mailbox, then advances the controller.
pub struct PostureLoop {
    controller: PostureController,
    inbox: Inbox<PostureController>,
    ticks: u64,
}

impl PostureLoop {
    /// Wrap `controller` with a fresh mailbox.
    pub fn new(controller: PostureController) -> Self {
        let (_, inbox) = mailbox::channel();
        Self {
            controller,
            inbox,
            ticks: 0,
        }
    }

    /// Producer handle for the sensor thread (or anyone else).
    pub fn outbox(&self) -> Outbox<PostureController> {
        self.inbox.outbox()
    }

    /// Run one simulation tick of `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> TickReport {
        self.ticks += 1;
        let span = debug_span!("posture_tick", tick = self.ticks, dt, drained = field::Empty);
        let _enter = span.enter();
        let drained = self.inbox.drain_and_run(&mut self.controller);
        span.record("drained", drained);
        let committed = self.controller.advance(dt);
        TickReport { drained, committed }
    }

    /// Full lifecycle restart.  Actions queued before the restart belong to
    /// the previous run and are discarded unrun; the controller is then
    /// [`reset`](PostureController::reset).  Returns how many were dropped.
    pub fn reset(&mut self) -> usize {
        let stale = self.inbox.discard();
        if stale > 0 {
            debug!(stale, "discarded queued sensor actions on reset");
        }
        self.controller.reset();
        stale
    }

    /// `true` when nothing is queued and no transition is running.
    pub fn is_settled(&self) -> bool {
        self.inbox.pending() == 0 && !self.controller.is_busy()
    }

    /// Ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn controller(&self) -> &PostureController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PostureController {
        &mut self.controller
    }
}
