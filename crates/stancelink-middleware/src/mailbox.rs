//! Cross-thread mailbox between the sensor thread and the simulation tick.
//!
//! Producers hold an [`Outbox`] and push deferred actions from any thread.
//! Exactly one consumer holds the matching [`Inbox`] and runs everything that
//! has accumulated once per tick via [`Inbox::drain_and_run`].
//!
//! The split enforces the single-consumer contract at compile time: `Outbox`
//! is `Clone`, `Inbox` is not, and draining needs `&mut Inbox`.
//!
//! The lock is held only long enough to swap the queue out.  Actions run with
//! the lock released, so an action may enqueue follow-up work; that work lands
//! in the fresh queue and runs on the next drain, not the current one.
//!
//! # Example
//!
//! ```rust
//! use stancelink_middleware::mailbox;
//!
//! let (outbox, mut inbox) = mailbox::channel::<Vec<u32>>();
//! let producer = outbox.clone();
//! std::thread::spawn(move || producer.enqueue(|log| log.push(7)))
//!     .join()
//!     .unwrap();
//!
//! let mut log = Vec::new();
//! assert_eq!(inbox.drain_and_run(&mut log), 1);
//! assert_eq!(log, vec![7]);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A unit of deferred work executed on the consumer's state.
pub type Action<T> = Box<dyn FnOnce(&mut T) + Send + 'static>;

struct Shared<T> {
    queue: Mutex<VecDeque<Action<T>>>,
}

impl<T> Shared<T> {
    // A panicking action runs outside the lock, so poisoning can only come
    // from a panic inside push/take; the queue itself is still consistent.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Action<T>>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a connected producer/consumer pair.
pub fn channel<T>() -> (Outbox<T>, Inbox<T>) {
    let shared = Arc::new(Shared {
        queue: Mutex::new(VecDeque::new()),
    });
    (
        Outbox {
            shared: Arc::clone(&shared),
        },
        Inbox { shared },
    )
}

/// Producer handle.  Cheap to clone and safe to use from any thread.
pub struct Outbox<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Outbox<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Outbox<T> {
    /// Append `action` to the tail of the queue.
    ///
    /// Never drops or reorders entries and never waits for the consumer; the
    /// only blocking is contention on the queue lock.
    pub fn enqueue<F>(&self, action: F)
    where
        F: FnOnce(&mut T) + Send + 'static,
    {
        self.shared.lock().push_back(Box::new(action));
    }

    /// Number of actions waiting for the next drain.
    pub fn pending(&self) -> usize {
        self.shared.lock().len()
    }
}

/// Consumer handle.  There is exactly one per mailbox.
pub struct Inbox<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Inbox<T> {
    /// Hand out another producer handle for this mailbox.
    pub fn outbox(&self) -> Outbox<T> {
        Outbox {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Take every action queued so far and run it against `target`, oldest
    /// first.  Returns how many actions ran.
    pub fn drain_and_run(&mut self, target: &mut T) -> usize {
        let batch = std::mem::take(&mut *self.shared.lock());
        let count = batch.len();
        for action in batch {
            action(target);
        }
        count
    }

    /// Drop every queued action without running it.  Returns how many were
    /// discarded.  Producers keep their handles and may enqueue again.
    pub fn discard(&mut self) -> usize {
        let batch = std::mem::take(&mut *self.shared.lock());
        batch.len()
    }

    /// Number of actions waiting for the next drain.
    pub fn pending(&self) -> usize {
        self.shared.lock().len()
    }
}
