//! Signed durations with one-second resolution.

/// Seconds in one day.
pub const SECONDS_PER_DAY: i32 = 86_400;

/// A signed span of time, stored as a single count of seconds.
///
/// The day/hour/minute/second accessors are truncating decompositions of that
/// count, so each carries the sign of the whole span.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeSpan {
    seconds: i32,
}

impl TimeSpan {
    /// Creates a span of `seconds` seconds.
    pub const fn from_seconds(seconds: i32) -> Self {
        Self { seconds }
    }

    /// Creates a span from its components, combined by fixed-radix
    /// multiplication. Components are not normalized first, so
    /// `TimeSpan::new(1, -1, 0, 0)` is 23 hours.
    ///
    /// Spans beyond about 24855 days don't fit and wrap around, like
    /// [`add`](Self::add); use [`checked_new`](Self::checked_new) to detect it.
    pub const fn new(days: i16, hours: i8, minutes: i8, seconds: i8) -> Self {
        Self {
            seconds: (days as i32)
                .wrapping_mul(SECONDS_PER_DAY)
                .wrapping_add(hours as i32 * 3600 + minutes as i32 * 60 + seconds as i32),
        }
    }

    /// Like [`new`](Self::new), but `None` if the span doesn't fit.
    pub const fn checked_new(days: i16, hours: i8, minutes: i8, seconds: i8) -> Option<Self> {
        let days = match (days as i32).checked_mul(SECONDS_PER_DAY) {
            Some(days) => days,
            None => return None,
        };
        match days.checked_add(hours as i32 * 3600 + minutes as i32 * 60 + seconds as i32) {
            Some(seconds) => Some(TimeSpan::from_seconds(seconds)),
            None => None,
        }
    }

    /// Whole days in the span.
    pub const fn days(&self) -> i16 {
        (self.seconds / SECONDS_PER_DAY) as i16
    }

    /// Hours left over after whole days (-23..=23).
    pub const fn hours(&self) -> i8 {
        (self.seconds / 3600 % 24) as i8
    }

    /// Minutes left over after whole hours (-59..=59).
    pub const fn minutes(&self) -> i8 {
        (self.seconds / 60 % 60) as i8
    }

    /// Seconds left over after whole minutes (-59..=59).
    pub const fn seconds(&self) -> i8 {
        (self.seconds % 60) as i8
    }

    /// The whole span in seconds.
    pub const fn total_seconds(&self) -> i32 {
        self.seconds
    }

    /// Sum of two spans. Overflow wraps around.
    #[allow(clippy::should_implement_trait)]
    pub const fn add(self, other: TimeSpan) -> TimeSpan {
        TimeSpan::from_seconds(self.seconds.wrapping_add(other.seconds))
    }

    /// Difference of two spans. Overflow wraps around.
    pub const fn subtract(self, other: TimeSpan) -> TimeSpan {
        TimeSpan::from_seconds(self.seconds.wrapping_sub(other.seconds))
    }

    /// Sum of two spans, or `None` on overflow.
    pub const fn checked_add(self, other: TimeSpan) -> Option<TimeSpan> {
        match self.seconds.checked_add(other.seconds) {
            Some(seconds) => Some(TimeSpan::from_seconds(seconds)),
            None => None,
        }
    }

    /// Difference of two spans, or `None` on overflow.
    pub const fn checked_sub(self, other: TimeSpan) -> Option<TimeSpan> {
        match self.seconds.checked_sub(other.seconds) {
            Some(seconds) => Some(TimeSpan::from_seconds(seconds)),
            None => None,
        }
    }
}

impl From<TimeSpan> for chrono::TimeDelta {
    fn from(span: TimeSpan) -> Self {
        chrono::TimeDelta::seconds(i64::from(span.seconds))
    }
}
