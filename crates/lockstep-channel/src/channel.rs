//! The rendezvous channel itself.
//!
//! Internally a channel is an unbounded FIFO of *waiting slots*.  A `get`
//! registers a fresh slot and parks on it; a `put` takes the oldest slot,
//! fills it, and parks until the getter has taken the value out.  A value can
//! therefore never sit in the channel without a receiver already committed to
//! consuming it.

use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};

/// One single-use blocking cell, handed from a getter to a putter.
struct Slot<T> {
    state:   Mutex<SlotState<T>>,
    changed: Condvar,
}

enum SlotState<T> {
    /// The getter is registered but no value has arrived yet.
    Empty,
    /// The putter has deposited a value; the getter has not taken it.
    Full(T),
    /// The getter has consumed the value; the putter may return.
    Taken,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Slot {
            state:   Mutex::new(SlotState::Empty),
            changed: Condvar::new(),
        }
    }
}

struct Inner<T> {
    closed:  AtomicBool,
    waiters: Mutex<VecDeque<Arc<Slot<T>>>>,
    /// Signalled whenever a getter registers a new slot.
    waiter_ready: Condvar,
}

/// A blocking, strictly-alternating one-slot handoff between two parties.
///
/// `Channel` is a cheap clonable handle (the clones share one channel), so a
/// channel can itself travel inside a message — the reply channel carried by
/// a `WantAction` message is exactly that.
///
/// See the [crate docs][crate] for the contract.
pub struct Channel<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Channel<T> {
    /// Create an open channel with no waiting receivers.
    pub fn new() -> Self {
        Channel {
            inner: Arc::new(Inner {
                closed:       AtomicBool::new(false),
                waiters:      Mutex::new(VecDeque::new()),
                waiter_ready: Condvar::new(),
            }),
        }
    }

    /// Block until a `put` on the other thread hands over a value, and return
    /// exactly that value.
    ///
    /// # Panics
    /// Panics if the channel has been closed.
    pub fn get(&self) -> T {
        self.check_open("get");

        let slot = Arc::new(Slot::new());
        {
            let mut waiters = self.lock_waiters();
            waiters.push_back(Arc::clone(&slot));
            self.inner.waiter_ready.notify_one();
        }

        let mut state = slot.state.lock().expect("channel slot lock poisoned");
        loop {
            match &*state {
                SlotState::Full(_) => break,
                _ => state = slot.changed.wait(state).expect("channel slot lock poisoned"),
            }
        }
        let value = match mem::replace(&mut *state, SlotState::Taken) {
            SlotState::Full(v) => v,
            _ => unreachable!("slot left the Full state without its getter"),
        };
        // Release the putter, which is parked until the value is consumed.
        slot.changed.notify_one();
        value
    }

    /// Block until a receiver is waiting in `get`, hand `value` to the oldest
    /// one, and return once that receiver has consumed it.
    ///
    /// # Panics
    /// Panics if the channel has been closed.
    pub fn put(&self, value: T) {
        self.check_open("put");

        let slot = {
            let mut waiters = self.lock_waiters();
            loop {
                match waiters.pop_front() {
                    Some(slot) => break slot,
                    None => {
                        waiters = self
                            .inner
                            .waiter_ready
                            .wait(waiters)
                            .expect("channel waiter lock poisoned");
                    }
                }
            }
        };

        let mut state = slot.state.lock().expect("channel slot lock poisoned");
        *state = SlotState::Full(value);
        slot.changed.notify_one();
        // The handoff completes only once the getter has taken the value.
        while !matches!(*state, SlotState::Taken) {
            state = slot.changed.wait(state).expect("channel slot lock poisoned");
        }
    }

    /// Close the channel.  One-shot: closing twice panics, as does any later
    /// `get`/`put`.  Callers coordinate shutdown through protocol messages
    /// before closing; the channel does not arbitrate close-vs-operate races.
    pub fn close(&self) {
        let was_closed = self.inner.closed.swap(true, Ordering::SeqCst);
        assert!(!was_closed, "rendezvous channel closed twice");
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn check_open(&self, op: &str) {
        assert!(
            !self.is_closed(),
            "{op} on a closed rendezvous channel",
        );
    }

    fn lock_waiters(&self) -> std::sync::MutexGuard<'_, VecDeque<Arc<Slot<T>>>> {
        self.inner.waiters.lock().expect("channel waiter lock poisoned")
    }
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Channel { inner: Arc::clone(&self.inner) }
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Channel::new()
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
