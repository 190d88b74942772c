//! Guard against applying a stale computation result.
//!
//! Parsing and aggregation run synchronously, but the surrounding host can
//! still overlap invocations: a new file dropped while an earlier result is
//! pending display. The gate tags every invocation with an increasing
//! sequence number and refuses to commit anything older than what has
//! already been committed, so the most recently *started* computation wins.

/// Monotonic sequence gate for overlapping recomputations.
///
/// ```rust
/// use betting_analytics::session::RefreshGate;
///
/// let mut gate = RefreshGate::new();
/// let first = gate.begin();
/// let second = gate.begin();
/// assert!(gate.commit(second));  // newer result lands
/// assert!(!gate.commit(first)); // stale result is discarded
/// ```
#[derive(Debug, Default)]
pub struct RefreshGate {
    issued: u64,
    committed: u64,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag a new invocation. Sequence numbers start at 1.
    pub fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Try to commit the result of invocation `seq`. Returns `false` when a
    /// newer result already landed, in which case the caller must drop this
    /// one instead of displaying it.
    pub fn commit(&mut self, seq: u64) -> bool {
        if seq > self.committed {
            self.committed = seq;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_order_commits_succeed() {
        let mut gate = RefreshGate::new();
        let a = gate.begin();
        let b = gate.begin();
        assert!(gate.commit(a));
        assert!(gate.commit(b));
    }

    #[test]
    fn out_of_order_result_is_discarded() {
        let mut gate = RefreshGate::new();
        let old = gate.begin();
        let new = gate.begin();
        assert!(gate.commit(new));
        assert!(!gate.commit(old));
        // committing the same sequence twice is also rejected
        assert!(!gate.commit(new));
    }
}
