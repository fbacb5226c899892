//! [`SensorLink`] – background reader for the insole byte stream.
//!
//! The link owns the byte source (a serial device node, a pipe, stdin, …) on
//! a dedicated thread.  Every newline-terminated record is decoded with
//! [`wire::decode`] on that thread and the outcome is posted to the
//! simulation through an [`Outbox`].  Nothing on this thread touches
//! simulation state; it only enqueues calls to a [`SensorHandler`].
//!
//! Reads are blocking and have no timeout.  [`SensorLink::disconnect`] is
//! honoured between records, so a source that never produces another line
//! keeps the thread parked until it closes.

use std::io::{BufRead, BufReader, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use stancelink_types::{DecodeError, FootReading, LinkError};
use tracing::{debug, field, info, info_span, warn};

use crate::mailbox::Outbox;
use crate::wire;

/// Name given to the producer thread.
pub const THREAD_NAME: &str = "stancelink-sensor";

/// Consumer-side callbacks invoked (on the consumer's thread) for each record
/// the link produced.
pub trait SensorHandler: 'static {
    /// A frame decoded cleanly.
    fn on_reading(&mut self, reading: FootReading);

    /// A frame was rejected by the decoder.
    fn on_decode_error(&mut self, error: DecodeError);

    /// The byte stream ended after `frames` non-blank records.
    fn on_link_closed(&mut self, frames: u64) {
        let _ = frames;
    }
}

/// Handle to a running producer thread.
pub struct SensorLink {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<Result<u64, LinkError>>>,
}

impl SensorLink {
    /// Start reading `source` on a new thread, posting results to `outbox`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Io`] if the OS refuses to spawn the thread.
    pub fn spawn<R, T>(source: R, outbox: Outbox<T>) -> Result<Self, LinkError>
    where
        R: Read + Send + 'static,
        T: SensorHandler,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || pump(BufReader::new(source), &outbox, &thread_stop))?;
        info!(thread = THREAD_NAME, "sensor link started");
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Ask the producer to stop after the record it is currently reading.
    pub fn disconnect(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// `true` once the producer thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the producer to exit and return the number of records it read.
    ///
    /// # Errors
    ///
    /// Returns the [`LinkError::Io`] that ended the stream, or
    /// [`LinkError::Disconnected`] if the thread panicked.
    pub fn join(mut self) -> Result<u64, LinkError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| LinkError::Disconnected)?,
            None => Err(LinkError::Disconnected),
        }
    }
}

impl Drop for SensorLink {
    fn drop(&mut self) {
        // Never join here: the thread may be parked in a blocking read.
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// Read records from `reader` until EOF, an I/O error, or `stop` is raised,
/// posting one action per non-blank record.  The close notification is always
/// posted last, even when the stream fails.
pub fn pump<B, T>(reader: B, outbox: &Outbox<T>, stop: &AtomicBool) -> Result<u64, LinkError>
where
    B: BufRead,
    T: SensorHandler,
{
    let span = info_span!("sensor_link", frames = field::Empty);
    let _enter = span.enter();
    let mut frames = 0u64;
    let outcome = read_records(reader, outbox, stop, &mut frames);
    span.record("frames", frames);
    match &outcome {
        Ok(()) => info!(frames, "sensor link closed"),
        Err(e) => warn!(frames, error = %e, "sensor link failed"),
    }
    outbox.enqueue(move |handler: &mut T| handler.on_link_closed(frames));
    outcome.map(|()| frames)
}

fn read_records<B, T>(
    mut reader: B,
    outbox: &Outbox<T>,
    stop: &AtomicBool,
    frames: &mut u64,
) -> Result<(), LinkError>
where
    B: BufRead,
    T: SensorHandler,
{
    let mut buf = Vec::new();
    while !stop.load(Ordering::SeqCst) {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        if buf.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        *frames += 1;
        match wire::decode(&buf) {
            Ok(reading) => {
                outbox.enqueue(move |handler: &mut T| handler.on_reading(reading));
            }
            Err(error) => {
                debug!(raw = error.raw(), "frame rejected on sensor thread");
                outbox.enqueue(move |handler: &mut T| handler.on_decode_error(error));
            }
        }
    }
    debug!("sensor link disconnect requested");
    Ok(())
}
