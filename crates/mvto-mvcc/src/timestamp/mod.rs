//! Timestamp issuance and the garbage-collection watermark.
//!
//! The authority hands out strictly increasing timestamps and tracks which
//! of them are still in flight. The oldest in-flight timestamp is the
//! watermark: no current or future transaction reads below it.
//!
//! # Watermark advance
//!
//! ```text
//! active: [120, 135, 260, 261]
//!
//! release(135)  -> not the head, removed in place, no GC
//! release(120)  -> head; new head 260; 260 - 120 >= threshold -> GC(260)
//! ```
//!
//! The authority only reports that a sweep is due. The caller runs the sweep
//! after the authority lock has been released, so the authority lock is
//! never held while item locks are taken.

use std::collections::BTreeSet;
use std::fmt;

use mvto_common::error::{MvtoError, MvtoResult};
use mvto_common::types::Tid;
use parking_lot::Mutex;

/// State guarded by the authority lock.
#[derive(Debug)]
struct AuthorityState {
    /// Last issued timestamp.
    counter: u64,
    /// Issued and not yet released. Ordered by value, hence by issuance.
    active: BTreeSet<Tid>,
}

/// Issues timestamps and decides when the GC watermark has moved far enough.
pub struct TimestampAuthority {
    state: Mutex<AuthorityState>,
    gc_threshold: u64,
}

impl TimestampAuthority {
    /// Creates an authority that requests GC once the watermark has advanced
    /// by at least `gc_threshold`.
    pub fn new(gc_threshold: u64) -> Self {
        Self {
            state: Mutex::new(AuthorityState {
                counter: Tid::ZERO.as_u64(),
                active: BTreeSet::new(),
            }),
            gc_threshold,
        }
    }

    /// Returns the configured GC threshold.
    pub fn gc_threshold(&self) -> u64 {
        self.gc_threshold
    }

    /// Issues a new timestamp and marks it active.
    pub fn issue(&self) -> Tid {
        let mut state = self.state.lock();
        state.counter += 1;
        let tid = Tid::new(state.counter);
        state.active.insert(tid);
        tid
    }

    /// Marks `tid` as finished.
    ///
    /// Returns `Some(watermark)` when `tid` was the oldest active timestamp
    /// and the next oldest lies at least `gc_threshold` beyond it; the
    /// caller should then collect every item below `watermark`.
    pub fn release(&self, tid: Tid) -> MvtoResult<Option<Tid>> {
        let mut state = self.state.lock();

        let was_head = state.active.first() == Some(&tid);
        if !state.active.remove(&tid) {
            return Err(MvtoError::TimestampNotActive(tid));
        }
        if !was_head {
            return Ok(None);
        }

        Ok(state
            .active
            .first()
            .copied()
            .filter(|new_min| new_min.distance_from(tid) >= self.gc_threshold))
    }

    /// Returns the oldest active timestamp.
    pub fn watermark(&self) -> Option<Tid> {
        self.state.lock().active.first().copied()
    }

    /// Returns the number of in-flight timestamps.
    pub fn active_count(&self) -> usize {
        self.state.lock().active.len()
    }

    /// Returns how many timestamps have been issued.
    pub fn issued_count(&self) -> u64 {
        self.state.lock().counter
    }
}

impl Default for TimestampAuthority {
    fn default() -> Self {
        Self::new(mvto_common::DEFAULT_GC_THRESHOLD)
    }
}

impl fmt::Debug for TimestampAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TimestampAuthority")
            .field("issued", &state.counter)
            .field("active", &state.active.len())
            .field("gc_threshold", &self.gc_threshold)
            .finish()
    }
}
