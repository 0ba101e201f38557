//! Single-flight gate.
//!
//! Collapses concurrent runs for the same key into one in-flight future whose
//! completion every caller awaits.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

type Flight = Shared<BoxFuture<'static, ()>>;

/// How a call to [`SingleFlight::run`] participated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightRole {
    /// Started the flight
    Leader,
    /// Joined a flight already in progress; `start` was not called
    Follower,
}

struct InFlight<K> {
    key: K,
    ticket: u64,
    flight: Flight,
}

/// A one-slot in-flight cache.
///
/// Only the most recent key occupies the slot. Starting a flight for a
/// different key replaces the slot without cancelling the older flight; its
/// awaiters still see it complete.
pub struct SingleFlight<K> {
    slot: Mutex<Option<InFlight<K>>>,
    next_ticket: AtomicU64,
}

impl<K: PartialEq> SingleFlight<K> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            next_ticket: AtomicU64::new(0),
        }
    }

    /// Runs the future built by `start` unless a flight for `key` is already
    /// outstanding, in which case that flight is awaited instead.
    pub async fn run<F>(&self, key: K, start: F) -> FlightRole
    where
        F: FnOnce() -> BoxFuture<'static, ()>,
    {
        let (flight, role, ticket) = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                // A finished flight left behind by a dropped leader does not count.
                Some(current) if current.key == key && current.flight.peek().is_none() => {
                    (current.flight.clone(), FlightRole::Follower, current.ticket)
                }
                _ => {
                    let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
                    let flight = start().shared();
                    *slot = Some(InFlight {
                        key,
                        ticket,
                        flight: flight.clone(),
                    });
                    (flight, FlightRole::Leader, ticket)
                }
            }
        };

        flight.await;

        if role == FlightRole::Leader {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.as_ref().is_some_and(|current| current.ticket == ticket) {
                *slot = None;
            }
        }
        role
    }

    /// Returns true while a flight for `key` is outstanding.
    pub fn is_in_flight(&self, key: &K) -> bool {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .is_some_and(|current| current.key == *key && current.flight.peek().is_none())
    }
}

impl<K: PartialEq> Default for SingleFlight<K> {
    fn default() -> Self {
        Self::new()
    }
}
