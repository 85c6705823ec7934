//! Time values used to order recorded operations.
//!
//! A [`Timestamp`] is a nanosecond instant on a single timeline. An
//! [`Interval`] is the `[start, end]` span of one operation and carries the
//! real-time precedence relation used by the checkers:
//!
//! ```text
//! a ≺ b  ⇔  a.end ≤ b.start
//! ```
//!
//! Intervals that are not ordered either way overlap and are concurrent.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

use crate::error::HistoryError;

/// Nanoseconds since the Unix epoch.
///
/// # Example
///
/// ```
/// use linear_kv_core::Timestamp;
///
/// let t1 = Timestamp::from_nanos(1_000);
/// let t2 = Timestamp::from_nanos(2_500);
///
/// assert!(t1 < t2);
/// assert_eq!(t2.saturating_duration_since(t1).as_nanos(), 1_500);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp from nanoseconds since the epoch.
    #[inline]
    pub const fn from_nanos(nanos: u64) -> Self {
        Timestamp(nanos)
    }

    /// Returns nanoseconds since the epoch.
    #[inline]
    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Returns the time elapsed since `earlier`, or zero if `earlier` is later.
    #[inline]
    pub fn saturating_duration_since(self, earlier: Timestamp) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }

    /// Converts to a UTC wall-clock time.
    pub fn to_datetime(self) -> DateTime<Utc> {
        Utc.timestamp_nanos(i64::try_from(self.0).unwrap_or(i64::MAX))
    }

    /// Converts from a UTC wall-clock time.
    ///
    /// Returns `None` for times before the epoch or outside the nanosecond
    /// range of `DateTime`.
    pub fn from_datetime(datetime: &DateTime<Utc>) -> Option<Self> {
        datetime
            .timestamp_nanos_opt()
            .and_then(|nanos| u64::try_from(nanos).ok())
            .map(Timestamp)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.to_datetime().to_rfc3339_opts(SecondsFormat::Nanos, true)
        )
    }
}

/// The real-time span `[start, end]` of one operation.
///
/// The constructor enforces `start ≤ end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    start: Timestamp,
    end: Timestamp,
}

impl Interval {
    /// Creates a new interval.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::InvalidInterval`] if `end` is before `start`.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, HistoryError> {
        if end < start {
            return Err(HistoryError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates the interval between two clock readings taken in order.
    ///
    /// A clock that stepped backwards yields a zero-length interval at
    /// `start` rather than an error.
    pub fn from_readings(start: Timestamp, end: Timestamp) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Returns the start of the interval.
    #[inline]
    pub const fn start(&self) -> Timestamp {
        self.start
    }

    /// Returns the end of the interval.
    #[inline]
    pub const fn end(&self) -> Timestamp {
        self.end
    }

    /// Returns the length of the interval.
    pub fn duration(&self) -> Duration {
        self.end.saturating_duration_since(self.start)
    }

    /// Returns true if this interval completes at or before `other` begins.
    #[inline]
    pub fn precedes(&self, other: &Interval) -> bool {
        self.end <= other.start
    }

    /// Returns true if neither interval precedes the other.
    #[inline]
    pub fn overlaps(&self, other: &Interval) -> bool {
        !self.precedes(other) && !other.precedes(self)
    }

    /// Returns the smallest interval covering both.
    pub fn cover(&self, other: &Interval) -> Interval {
        Interval {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start.as_nanos(), self.end.as_nanos())
    }
}

/// A source of timestamps for recording operations.
///
/// Readings must never decrease.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Wall-clock anchored, strictly increasing clock.
///
/// The wall-clock time is sampled once at construction; afterwards the clock
/// advances with a monotonic [`Instant`], so wall-clock adjustments cannot
/// move it backwards. Successive readings (across all threads) are strictly
/// increasing, so two calls ordered in real time never share a timestamp.
#[derive(Debug)]
pub struct SystemClock {
    anchor_nanos: u64,
    anchor: Instant,
    last: AtomicU64,
}

impl SystemClock {
    /// Creates a new clock anchored at the current wall-clock time.
    pub fn new() -> Self {
        let anchor_nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or(0);

        Self {
            anchor_nanos,
            anchor: Instant::now(),
            last: AtomicU64::new(0),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let elapsed = u64::try_from(self.anchor.elapsed().as_nanos()).unwrap_or(u64::MAX);
        let reading = self.anchor_nanos.saturating_add(elapsed);

        // fetch_update only fails when the closure returns None.
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |prev| {
                Some(reading.max(prev.saturating_add(1)))
            })
            .unwrap_or_else(|prev| prev);

        Timestamp(reading.max(previous.saturating_add(1)))
    }
}

/// Deterministic clock that advances by a fixed step on every reading.
///
/// Intended for tests that need reproducible intervals.
#[derive(Debug)]
pub struct ManualClock {
    next: AtomicU64,
    step: u64,
}

impl ManualClock {
    /// Creates a clock whose first reading is `start`.
    pub fn new(start: u64, step: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
            step,
        }
    }

    /// Moves the clock forward without taking a reading.
    pub fn advance(&self, nanos: u64) {
        self.next.fetch_add(nanos, Ordering::AcqRel);
    }

    /// Returns the next reading without consuming it.
    pub fn peek(&self) -> Timestamp {
        Timestamp(self.next.load(Ordering::Acquire))
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.next.fetch_add(self.step, Ordering::AcqRel))
    }
}
