//! Recent-Timestamp Window

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Newest-first bounded window of a user's recent transaction timestamps.
///
/// Eviction is strict bounded-FIFO: pushing past capacity drops the oldest
/// entries. No TTL-based expiry.
#[derive(Debug, Clone, Default)]
pub struct RecentWindow {
    entries: VecDeque<DateTime<Utc>>,
}

impl RecentWindow {
    /// Push a timestamp, trim to `capacity`, and return the retained
    /// window newest-first.
    pub fn push_and_trim(
        &mut self,
        timestamp: DateTime<Utc>,
        capacity: usize,
    ) -> Vec<DateTime<Utc>> {
        self.entries.push_front(timestamp);
        self.entries.truncate(capacity);
        self.entries.iter().copied().collect()
    }

    /// Number of retained timestamps
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the window is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn ts(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().unwrap()
    }

    #[test]
    fn test_newest_first_order() {
        let mut window = RecentWindow::default();
        window.push_and_trim(ts(0), 5);
        window.push_and_trim(ts(10_000), 5);
        let retained = window.push_and_trim(ts(20_000), 5);

        assert_eq!(retained, vec![ts(20_000), ts(10_000), ts(0)]);
    }

    #[test]
    fn test_oldest_evicted_at_capacity() {
        let mut window = RecentWindow::default();
        for i in 0..7 {
            window.push_and_trim(ts(i * 1000), 5);
        }

        assert_eq!(window.len(), 5);
        let retained = window.push_and_trim(ts(7000), 5);
        assert_eq!(retained.first(), Some(&ts(7000)));
        assert_eq!(retained.last(), Some(&ts(3000)));
    }

    proptest! {
        #[test]
        fn window_never_exceeds_capacity(millis in prop::collection::vec(0i64..1_000_000_000, 0..40)) {
            let mut window = RecentWindow::default();
            for (i, ms) in millis.iter().enumerate() {
                let retained = window.push_and_trim(ts(*ms), 5);
                prop_assert_eq!(retained.len(), (i + 1).min(5));
                prop_assert!(window.len() <= 5);
            }
        }
    }
}
