//! Calendar date/time values.
//!
//! [`DateTime`] is a plain, timezone-naive point in time with one-second
//! resolution. It is the value the driver reads from and writes to the
//! MCP7940 timekeeping registers, and the unit the calibration code uses to
//! measure drift.
//!
//! # Arithmetic
//!
//! All arithmetic goes through Unix timestamps: a [`TimeSpan`] is added to the
//! timestamp and the result is decomposed back into calendar fields, so the
//! value is always normalized across month and year boundaries.
//!
//! # Validation
//!
//! [`DateTime::new`] validates every field, including the day against the
//! length of the month. Values decoded from hardware go through the same
//! check, so a corrupted register block surfaces as
//! [`DateTimeError::InvalidDateTime`] instead of a garbage date.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};

use crate::timespan::TimeSpan;

/// Seconds between 1970-01-01 and 2000-01-01.
pub const SECONDS_FROM_1970_TO_2000: i64 = 946_684_800;

const SECONDS_PER_DAY: i64 = 86_400;

/// Days before the first of each month in a common year.
const DAYS_BEFORE_MONTH: [u16; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Errors that can occur while building or converting a [`DateTime`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DateTimeError {
    /// A field is out of range (e.g. month 13, February 30, hour 24), or the
    /// registers held invalid BCD.
    InvalidDateTime,
    /// The year can't be represented (by the value type or by the chip's
    /// two-digit year register).
    YearOutOfRange,
    /// Build timestamp text did not have the `"Mmm dd yyyy"` / `"hh:mm:ss"` shape.
    InvalidFormat,
}

/// Returns true for Gregorian leap years.
pub const fn is_leap_year(year: u16) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Number of days in `month` (1-12) of `year`. Returns 0 for an invalid month.
pub const fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

// Days since 1970-01-01 for a validated date.
fn days_from_civil(year: u16, month: u8, day: u8) -> i64 {
    let leaps_through = |y: i64| y.div_euclid(4) - y.div_euclid(100) + y.div_euclid(400);
    let y = i64::from(year);
    let mut days = (y - 1970) * 365 + leaps_through(y - 1) - leaps_through(1969);
    days += i64::from(DAYS_BEFORE_MONTH[usize::from(month - 1)]);
    if month > 2 && is_leap_year(year) {
        days += 1;
    }
    days + i64::from(day) - 1
}

// Proleptic Gregorian decomposition of a day count relative to 1970-01-01.
fn civil_from_days(days: i64) -> (i64, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u8;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// A timezone-naive calendar date and time of day.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    // Field order matters for the derived ordering.
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl DateTime {
    /// Earliest year accepted by [`DateTime::new`].
    pub const MIN_YEAR: u16 = 1970;
    /// Latest year accepted by [`DateTime::new`].
    pub const MAX_YEAR: u16 = 9999;

    /// Creates a validated date/time.
    ///
    /// # Errors
    ///
    /// [`DateTimeError::YearOutOfRange`] for years outside
    /// [`MIN_YEAR`](Self::MIN_YEAR)..=[`MAX_YEAR`](Self::MAX_YEAR), and
    /// [`DateTimeError::InvalidDateTime`] for any other field out of range.
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, DateTimeError> {
        if !(Self::MIN_YEAR..=Self::MAX_YEAR).contains(&year) {
            return Err(DateTimeError::YearOutOfRange);
        }
        if !(1..=12).contains(&month)
            || day == 0
            || day > days_in_month(year, month)
            || hour > 23
            || minute > 59
            || second > 59
        {
            return Err(DateTimeError::InvalidDateTime);
        }
        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// Midnight at the start of the given date.
    pub fn from_ymd(year: u16, month: u8, day: u8) -> Result<Self, DateTimeError> {
        Self::new(year, month, day, 0, 0, 0)
    }

    /// Decomposes an unsigned Unix timestamp.
    pub fn from_unix(seconds: u32) -> Self {
        Self::decompose(i64::from(seconds))
    }

    /// Decomposes a signed Unix timestamp.
    ///
    /// # Errors
    ///
    /// [`DateTimeError::YearOutOfRange`] if the year falls outside `0..=65535`.
    pub fn from_timestamp(seconds: i64) -> Result<Self, DateTimeError> {
        let days = seconds.div_euclid(SECONDS_PER_DAY);
        let (year, _, _) = civil_from_days(days);
        if u16::try_from(year).is_err() {
            return Err(DateTimeError::YearOutOfRange);
        }
        Ok(Self::decompose(seconds))
    }

    // Caller guarantees the year fits in u16.
    fn decompose(seconds: i64) -> Self {
        let days = seconds.div_euclid(SECONDS_PER_DAY);
        let time_of_day = seconds.rem_euclid(SECONDS_PER_DAY);
        let (year, month, day) = civil_from_days(days);
        Self {
            year: year as u16,
            month,
            day,
            hour: (time_of_day / 3600) as u8,
            minute: (time_of_day / 60 % 60) as u8,
            second: (time_of_day % 60) as u8,
        }
    }

    /// Parses the compiler-style build timestamp pair, e.g.
    /// `("Jul 19 2017", "12:34:56")`. The day may be space padded.
    ///
    /// # Errors
    ///
    /// [`DateTimeError::InvalidFormat`] if the text doesn't parse, or the
    /// errors of [`DateTime::new`] if the parsed fields are out of range.
    pub fn from_build_timestamp(date: &str, time: &str) -> Result<Self, DateTimeError> {
        let mut date_parts = date.split_whitespace();
        let month_name = date_parts.next().ok_or(DateTimeError::InvalidFormat)?;
        let month = MONTH_NAMES
            .iter()
            .position(|name| *name == month_name)
            .ok_or(DateTimeError::InvalidFormat)? as u8
            + 1;
        let day = parse_number::<u8>(date_parts.next())?;
        let year = parse_number::<u16>(date_parts.next())?;
        if date_parts.next().is_some() {
            return Err(DateTimeError::InvalidFormat);
        }

        let mut time_parts = time.trim().split(':');
        let hour = parse_number::<u8>(time_parts.next())?;
        let minute = parse_number::<u8>(time_parts.next())?;
        let second = parse_number::<u8>(time_parts.next())?;
        if time_parts.next().is_some() {
            return Err(DateTimeError::InvalidFormat);
        }

        Self::new(year, month, day, hour, minute, second)
    }

    /// Absolute year, e.g. 2024.
    pub const fn year(&self) -> u16 {
        self.year
    }

    /// Month, 1-12.
    pub const fn month(&self) -> u8 {
        self.month
    }

    /// Day of the month, 1-31.
    pub const fn day(&self) -> u8 {
        self.day
    }

    /// Hour, 0-23.
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute, 0-59.
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    /// Second, 0-59.
    pub const fn second(&self) -> u8 {
        self.second
    }

    /// Day of the week, 0 = Sunday through 6 = Saturday.
    pub fn day_of_week(&self) -> u8 {
        // 2000-01-01 was a Saturday
        let days = self.seconds_since_2000().div_euclid(SECONDS_PER_DAY);
        (days + 6).rem_euclid(7) as u8
    }

    /// Day of the week as a chrono [`Weekday`].
    pub fn weekday(&self) -> Weekday {
        match self.day_of_week() {
            0 => Weekday::Sun,
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            _ => Weekday::Sat,
        }
    }

    /// Seconds since 1970-01-01 00:00:00, treating the value as UTC.
    pub fn timestamp(&self) -> i64 {
        days_from_civil(self.year, self.month, self.day) * SECONDS_PER_DAY
            + i64::from(self.hour) * 3600
            + i64::from(self.minute) * 60
            + i64::from(self.second)
    }

    /// Unsigned Unix time, saturating outside 1970..=2106.
    pub fn unix_time(&self) -> u32 {
        let ts = self.timestamp();
        u32::try_from(ts).unwrap_or(if ts < 0 { 0 } else { u32::MAX })
    }

    /// Seconds since 2000-01-01 00:00:00.
    pub fn seconds_since_2000(&self) -> i64 {
        self.timestamp() - SECONDS_FROM_1970_TO_2000
    }

    /// The point in time `span` later.
    #[allow(clippy::should_implement_trait)]
    pub fn add(&self, span: TimeSpan) -> DateTime {
        Self::decompose(self.timestamp() + i64::from(span.total_seconds()))
    }

    /// The point in time `span` earlier.
    pub fn subtract(&self, span: TimeSpan) -> DateTime {
        Self::decompose(self.timestamp() - i64::from(span.total_seconds()))
    }

    /// Span from `earlier` to `self`; negative when `earlier` is later.
    ///
    /// Saturates for differences beyond roughly 68 years.
    pub fn difference(&self, earlier: &DateTime) -> TimeSpan {
        let delta = self.timestamp() - earlier.timestamp();
        let delta = i32::try_from(delta).unwrap_or(if delta < 0 { i32::MIN } else { i32::MAX });
        TimeSpan::from_seconds(delta)
    }

    /// Same day and time one month later. The day is clamped to the length of
    /// the new month, so January 31st becomes February 28th or 29th.
    pub fn next_month(&self) -> DateTime {
        if self.month == 12 {
            self.with_year_month(self.year.saturating_add(1), 1)
        } else {
            self.with_year_month(self.year, self.month + 1)
        }
    }

    /// Same day and time one month earlier, with the day clamped.
    pub fn previous_month(&self) -> DateTime {
        if self.month == 1 {
            self.with_year_month(self.year.saturating_sub(1), 12)
        } else {
            self.with_year_month(self.year, self.month - 1)
        }
    }

    /// Same date and time one year later; February 29th becomes the 28th.
    pub fn next_year(&self) -> DateTime {
        self.with_year_month(self.year.saturating_add(1), self.month)
    }

    /// Same date and time one year earlier; February 29th becomes the 28th.
    pub fn previous_year(&self) -> DateTime {
        self.with_year_month(self.year.saturating_sub(1), self.month)
    }

    fn with_year_month(&self, year: u16, month: u8) -> DateTime {
        DateTime {
            year,
            month,
            day: self.day.min(days_in_month(year, month)),
            ..*self
        }
    }
}

fn parse_number<T: core::str::FromStr>(text: Option<&str>) -> Result<T, DateTimeError> {
    text.ok_or(DateTimeError::InvalidFormat)?
        .trim()
        .parse()
        .map_err(|_| DateTimeError::InvalidFormat)
}

impl TryFrom<NaiveDateTime> for DateTime {
    type Error = DateTimeError;

    fn try_from(value: NaiveDateTime) -> Result<Self, Self::Error> {
        let year = u16::try_from(value.year()).map_err(|_| DateTimeError::YearOutOfRange)?;
        DateTime::new(
            year,
            value.month() as u8,
            value.day() as u8,
            value.hour() as u8,
            value.minute() as u8,
            value.second() as u8,
        )
    }
}

impl TryFrom<DateTime> for NaiveDateTime {
    type Error = DateTimeError;

    fn try_from(value: DateTime) -> Result<Self, Self::Error> {
        NaiveDate::from_ymd_opt(
            i32::from(value.year),
            u32::from(value.month),
            u32::from(value.day),
        )
        .and_then(|d| {
            d.and_hms_opt(
                u32::from(value.hour),
                u32::from(value.minute),
                u32::from(value.second),
            )
        })
        .ok_or(DateTimeError::InvalidDateTime)
    }
}
