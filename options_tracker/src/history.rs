//! Bounded log of observed prices and their deltas.
use std::collections::VecDeque;

use chrono::{DateTime, Local};
use options_common::config::HISTORY_CAPACITY;
use options_common::model::PriceHistoryEntry;
use options_common::{Result, TrackerError};

/// Last `capacity` recorded prices, oldest first.
///
/// Not synchronized: it is owned by the display thread and reset only between drains.
#[derive(Debug, Clone)]
pub struct PriceHistoryTracker {
    entries: VecDeque<PriceHistoryEntry>,
    capacity: usize,
}

impl PriceHistoryTracker {
    /// Empty tracker keeping at most `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(TrackerError::InvalidConfig(
                "history capacity must be at least 1".to_string(),
            ));
        }
        Ok(PriceHistoryTracker {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Append a price. `change` is measured against the previous entry, 0 for the first.
    ///
    /// The oldest entry is evicted once the tracker is over capacity. A non-finite
    /// price or a timestamp not after the latest entry leaves the tracker untouched.
    pub fn record(&mut self, timestamp: DateTime<Local>, price: f64) -> Result<PriceHistoryEntry> {
        if !price.is_finite() {
            return Err(TrackerError::Format(format!("cannot record price {price}")));
        }
        if let Some(last) = self.entries.back() {
            if timestamp <= last.timestamp {
                return Err(TrackerError::OutOfOrder(format!(
                    "{} is not after {}",
                    timestamp, last.timestamp
                )));
            }
        }

        let change = self.entries.back().map_or(0.0, |last| price - last.price);
        let entry = PriceHistoryEntry {
            timestamp,
            price,
            change,
        };
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        Ok(entry)
    }

    /// Forget every entry.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Up to `k` most recent entries, newest first.
    pub fn last_n(&self, k: usize) -> Vec<PriceHistoryEntry> {
        self.entries.iter().rev().take(k).copied().collect()
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<&PriceHistoryEntry> {
        self.entries.back()
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &PriceHistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for PriceHistoryTracker {
    fn default() -> Self {
        PriceHistoryTracker {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY),
            capacity: HISTORY_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(second: i64) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 7, 10, 0, 0).unwrap() + Duration::seconds(second)
    }

    #[test]
    fn first_change_is_zero_then_delta() {
        let mut history = PriceHistoryTracker::default();
        let first = history.record(at(0), 100.00).unwrap();
        assert_eq!(first.change, 0.0);
        assert_eq!(first.price, 100.00);
        let second = history.record(at(5), 101.50).unwrap();
        assert_eq!(second.change, 1.50);
        assert_eq!(second.timestamp, at(5));
    }

    #[test]
    fn fifty_one_records_evict_the_oldest() {
        let mut history = PriceHistoryTracker::default();
        for i in 0..51 {
            history.record(at(i), 100.0 + i as f64).unwrap();
            assert!(history.len() <= 50);
        }
        assert_eq!(history.len(), 50);
        assert!(history.entries().all(|e| e.timestamp != at(0)));
        assert_eq!(history.entries().next().map(|e| e.timestamp), Some(at(1)));
    }

    #[test]
    fn changes_chain_across_eviction() {
        let mut history = PriceHistoryTracker::new(3).unwrap();
        let prices = [10.0, 12.0, 11.0, 15.0, 14.5];
        for (i, p) in prices.iter().enumerate() {
            history.record(at(i as i64), *p).unwrap();
        }
        let entries: Vec<_> = history.entries().copied().collect();
        assert_eq!(entries.len(), 3);
        for pair in entries.windows(2) {
            assert_eq!(pair[1].change, pair[1].price - pair[0].price);
        }
        assert_eq!(entries[0].change, 11.0 - 12.0, "change is kept from when it was recorded");
    }

    #[test]
    fn last_n_is_newest_first() {
        let mut history = PriceHistoryTracker::default();
        for i in 0..15 {
            history.record(at(i), i as f64).unwrap();
        }
        let recent: Vec<f64> = history.last_n(10).iter().map(|e| e.price).collect();
        assert_eq!(recent, vec![14.0, 13.0, 12.0, 11.0, 10.0, 9.0, 8.0, 7.0, 6.0, 5.0]);
        assert_eq!(history.last_n(100).len(), 15);
    }

    #[test]
    fn out_of_order_and_nan_are_rejected() {
        let mut history = PriceHistoryTracker::default();
        history.record(at(10), 1.0).unwrap();
        assert!(matches!(history.record(at(10), 2.0), Err(TrackerError::OutOfOrder(_))));
        assert!(matches!(history.record(at(3), 2.0), Err(TrackerError::OutOfOrder(_))));
        assert!(history.record(at(11), f64::NAN).is_err());
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().map(|e| e.price), Some(1.0));
    }

    #[test]
    fn reset_empties() {
        let mut history = PriceHistoryTracker::default();
        history.record(at(0), 1.0).unwrap();
        history.reset();
        assert!(history.is_empty());
        let entry = history.record(at(1), 5.0).unwrap();
        assert_eq!(entry.change, 0.0);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(PriceHistoryTracker::new(0).is_err());
    }
}
