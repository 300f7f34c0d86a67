//! Deterministic time slicing for tests.
//!
//! [`ManualSlicer`] queues slice requests until the test grants them, and the
//! deadlines here measure budgets in units of work instead of wall time.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

use fibril_core::{Deadline, SliceCallback, TimeSlicer};

/// Grants at most `units` units of work. With the default yield threshold
/// the work loop performs exactly `units` fibers before yielding.
#[derive(Debug)]
pub struct UnitBudget {
    left: Cell<usize>,
}

impl UnitBudget {
    pub fn new(units: usize) -> Self {
        Self {
            left: Cell::new(units),
        }
    }

    pub fn remaining(&self) -> usize {
        self.left.get()
    }
}

impl Deadline for UnitBudget {
    fn time_remaining(&self) -> Duration {
        match self.left.get() {
            0 | 1 => {
                self.left.set(0);
                Duration::ZERO
            }
            left => {
                self.left.set(left - 1);
                Duration::MAX
            }
        }
    }
}

/// A deadline that never runs out.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

/// A deadline that is already over; the loop still performs one unit.
#[derive(Debug, Default, Clone, Copy)]
pub struct Expired;

impl Deadline for Expired {
    fn time_remaining(&self) -> Duration {
        Duration::ZERO
    }
}

/// Time slicer driven by the test.
#[derive(Default)]
pub struct ManualSlicer {
    queue: RefCell<VecDeque<SliceCallback>>,
    granted: Cell<usize>,
}

impl ManualSlicer {
    /// Number of slices granted before `run_until_idle` gives up.
    pub const SETTLE_LIMIT: usize = 10_000;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn has_pending(&self) -> bool {
        self.pending() > 0
    }

    /// Total slices granted so far.
    pub fn granted(&self) -> usize {
        self.granted.get()
    }

    /// Runs the oldest queued request with `deadline`. Returns `false` when
    /// nothing was queued.
    pub fn grant(&self, deadline: &dyn Deadline) -> bool {
        let next = self.queue.borrow_mut().pop_front();
        match next {
            Some(callback) => {
                self.granted.set(self.granted.get() + 1);
                callback(deadline);
                true
            }
            None => false,
        }
    }

    pub fn grant_units(&self, units: usize) -> bool {
        self.grant(&UnitBudget::new(units))
    }

    /// Grants unbounded slices until no request is left and returns how many
    /// were granted.
    ///
    /// Panics if work keeps rescheduling itself past [`Self::SETTLE_LIMIT`].
    pub fn run_until_idle(&self) -> usize {
        let mut slices = 0;
        while self.grant(&Unbounded) {
            slices += 1;
            assert!(
                slices < Self::SETTLE_LIMIT,
                "work did not settle after {slices} slices"
            );
        }
        slices
    }
}

impl TimeSlicer for ManualSlicer {
    fn request_time_slice(&self, callback: SliceCallback) {
        log::trace!("slice requested ({} queued)", self.pending());
        self.queue.borrow_mut().push_back(callback);
    }
}

#[cfg(test)]
#[path = "tests/slicer_tests.rs"]
mod tests;
