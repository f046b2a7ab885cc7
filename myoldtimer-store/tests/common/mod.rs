//! Helpers for integration tests.

use chrono::NaiveDate;
use myoldtimer_core::{FixedClock, SequentialIds};
use myoldtimer_store::{Garage, KeyValueStore};

/// Deterministic ids and a clock pinned to 2024-06-01.
pub struct Workshop {
    pub ids: SequentialIds,
    pub clock: FixedClock,
}

impl Workshop {
    pub fn new() -> Self {
        Self {
            ids: SequentialIds::new(),
            clock: FixedClock::at(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
        }
    }

    pub fn garage<'a, S: KeyValueStore + ?Sized>(&'a self, store: &'a S) -> Garage<'a, S> {
        Garage::new(store, &self.ids, &self.clock)
    }
}
