//! `stancelink-middleware` – The Nervous System
//!
//! Moves sensor data from the I/O thread to the simulation tick without
//! caring what the readings mean.
//!
//! # Modules
//!
//! - [`wire`] – decoder for the `;`/`,`-delimited insole frame format.
//! - [`mailbox`] – [`Outbox`]/[`Inbox`] pair: a locked FIFO of deferred
//!   actions drained once per tick by a single consumer.
//! - [`link`] – [`SensorLink`]: the background reader that decodes records
//!   and posts them through an [`Outbox`].
//! - [`bus`] – topic-based diagnostics bus built on Tokio broadcast channels.

pub mod bus;
pub mod link;
pub mod mailbox;
pub mod wire;

pub use bus::{EventBus, Topic, TopicReceiver};
pub use link::{SensorHandler, SensorLink};
pub use mailbox::{Inbox, Outbox};
pub use wire::decode;
