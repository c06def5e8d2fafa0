//! In-flight key tracking for work de-duplication
//!
//! A key is present iff some work item carrying it is currently queued or
//! executing. Reservation happens atomically with a successful enqueue and is
//! released only after the item finishes executing, so a re-submission while
//! the first copy is still running is coalesced away.

use dashmap::DashSet;

/// Tracks the set of in-flight de-duplication keys
#[derive(Default)]
pub struct UniquenessTracker {
    keys: DashSet<String>,
}

impl UniquenessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically test-and-reserve a key. Returns `false` when the key is
    /// already in flight; the caller must then drop the submission silently
    /// (intentional coalescing, not an error). `None` keys always pass.
    pub fn try_reserve(&self, key: Option<&str>) -> bool {
        match key {
            Some(k) if !k.is_empty() => self.keys.insert(k.to_string()),
            _ => true,
        }
    }

    /// Release a reservation. Must be called exactly once per successful
    /// `try_reserve`, after the corresponding item finished executing.
    pub fn release(&self, key: Option<&str>) {
        if let Some(k) = key {
            self.keys.remove(k);
        }
    }

    /// Number of reserved keys (introspection)
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_reserve_and_release() {
        let tracker = UniquenessTracker::new();
        assert!(tracker.try_reserve(Some("wf-1")));
        assert!(!tracker.try_reserve(Some("wf-1")));
        assert_eq!(tracker.len(), 1);

        tracker.release(Some("wf-1"));
        assert!(tracker.is_empty());
        assert!(tracker.try_reserve(Some("wf-1")));
    }

    #[test]
    fn test_distinct_keys_do_not_collide() {
        let tracker = UniquenessTracker::new();
        assert!(tracker.try_reserve(Some("wf-1")));
        assert!(tracker.try_reserve(Some("wf-2")));
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_none_and_empty_keys_bypass() {
        let tracker = UniquenessTracker::new();
        assert!(tracker.try_reserve(None));
        assert!(tracker.try_reserve(None));
        assert!(tracker.try_reserve(Some("")));
        assert!(tracker.try_reserve(Some("")));
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_reservation_admits_exactly_one() {
        let tracker = Arc::new(UniquenessTracker::new());
        let mut handles = Vec::new();
        for _ in 0..32 {
            let tracker = Arc::clone(&tracker);
            handles.push(tokio::spawn(async move {
                tracker.try_reserve(Some("contended"))
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 1);
        assert_eq!(tracker.len(), 1);
    }
}
