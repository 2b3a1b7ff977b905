//! Clock capability
//!
//! Everything that compares against "now" (due-times, pending counts, backup
//! names) reads the time through a [`Clock`] handed to it at construction.
//! Production code uses [`SystemClock`]; tests use [`FixedClock`] and move it
//! forward explicitly between review sessions.

use std::cell::Cell;

use chrono::{DateTime, SubsecRound, Utc};

/// Source of the current time
pub trait Clock {
    /// Current UTC time, truncated to whole seconds
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(0)
    }
}

/// Clock frozen at a settable instant
///
/// # Example
///
/// ```rust,ignore
/// let clock = Rc::new(FixedClock::new("2023-01-01T12:00:00Z".parse()?));
/// let scheduler = Scheduler::new(ReviewConfig::default(), clock.clone());
/// let mut book = RepertoireBook::open(&paths, Color::Black, scheduler)?;
/// clock.set("2023-01-01T14:00:00Z".parse()?);
/// ```
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    /// Move the clock to another instant (forwards or backwards)
    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}
