//! Raw register blocks and their conversion to [`DateTime`].
//!
//! A snapshot is read or written in one bus transaction and only lives for
//! the duration of one driver call; nothing here is cached.

use crate::bcd;
use crate::datetime::{DateTime, DateTimeError};
use crate::registers::{
    Date, Hours, Minutes, Month, PowerFailMonth, Seconds, TimeRepresentation, Weekday, Year,
};

/// First year the two-digit year register can represent.
pub const FIRST_YEAR: u16 = 2000;
/// Last year the two-digit year register can represent.
pub const LAST_YEAR: u16 = 2099;

/// Encodes a 0-23 hour in the requested format.
pub(crate) fn encode_hours(hour: u8, representation: TimeRepresentation) -> Hours {
    match representation {
        TimeRepresentation::TwentyFourHour => Hours(bcd::encode(hour)),
        TimeRepresentation::TwelveHour => {
            let twelve_hour = match hour {
                0 => 12,
                1..=12 => hour,
                _ => hour - 12,
            };
            let mut value = Hours(bcd::encode(twelve_hour));
            value.set_time_representation(TimeRepresentation::TwelveHour);
            value.set_pm_or_twenty_hours(u8::from(hour >= 12));
            value
        }
    }
}

/// Decodes an hours register in either format to a 0-23 hour.
pub(crate) fn decode_hours(hours: Hours) -> Result<u8, DateTimeError> {
    let raw = u8::from(hours);
    match hours.time_representation() {
        TimeRepresentation::TwentyFourHour => bcd::checked_decode(raw, bcd::MASK_HOURS_24)
            .filter(|hour| *hour < 24)
            .ok_or(DateTimeError::InvalidDateTime),
        TimeRepresentation::TwelveHour => {
            let hour = bcd::checked_decode(raw, bcd::MASK_HOURS_12)
                .filter(|hour| (1..=12).contains(hour))
                .ok_or(DateTimeError::InvalidDateTime)?;
            let is_pm = hours.pm_or_twenty_hours() != 0;
            Ok(match (hour, is_pm) {
                (12, false) => 0,
                (12, true) => 12,
                (hour, false) => hour,
                (hour, true) => hour + 12,
            })
        }
    }
}

fn digits(byte: u8, mask: u8) -> Result<u8, DateTimeError> {
    bcd::checked_decode(byte, mask).ok_or(DateTimeError::InvalidDateTime)
}

/// The seven timekeeping registers, RTCSEC through RTCYEAR.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RawDateTime {
    pub seconds: Seconds,
    pub minutes: Minutes,
    pub hours: Hours,
    pub weekday: Weekday,
    pub date: Date,
    pub month: Month,
    pub year: Year,
}

impl From<[u8; 7]> for RawDateTime {
    fn from(data: [u8; 7]) -> Self {
        RawDateTime {
            seconds: Seconds(data[0]),
            minutes: Minutes(data[1]),
            hours: Hours(data[2]),
            weekday: Weekday(data[3]),
            date: Date(data[4]),
            month: Month(data[5]),
            year: Year(data[6]),
        }
    }
}

impl From<&RawDateTime> for [u8; 7] {
    fn from(raw: &RawDateTime) -> Self {
        [
            raw.seconds.0,
            raw.minutes.0,
            raw.hours.0,
            raw.weekday.0,
            raw.date.0,
            raw.month.0,
            raw.year.0,
        ]
    }
}

impl RawDateTime {
    /// Encodes `datetime` with all flag bits clear.
    ///
    /// # Errors
    ///
    /// [`DateTimeError::YearOutOfRange`] unless the year is 2000-2099.
    pub fn from_datetime(
        datetime: &DateTime,
        representation: TimeRepresentation,
    ) -> Result<Self, DateTimeError> {
        if !(FIRST_YEAR..=LAST_YEAR).contains(&datetime.year()) {
            return Err(DateTimeError::YearOutOfRange);
        }
        let mut weekday = Weekday::default();
        weekday.set_weekday(datetime.day_of_week() + 1);
        Ok(RawDateTime {
            seconds: Seconds(bcd::encode(datetime.second())),
            minutes: Minutes(bcd::encode(datetime.minute())),
            hours: encode_hours(datetime.hour(), representation),
            weekday,
            date: Date(bcd::encode(datetime.day())),
            month: Month(bcd::encode(datetime.month())),
            year: Year(bcd::encode((datetime.year() - FIRST_YEAR) as u8)),
        })
    }

    /// Decodes the block. The hour is returned in 24-hour form regardless of
    /// the register format.
    pub fn to_datetime(&self) -> Result<DateTime, DateTimeError> {
        let year = digits(self.year.0, bcd::MASK_YEAR)?;
        DateTime::new(
            FIRST_YEAR + u16::from(year),
            digits(self.month.0, bcd::MASK_MONTH)?,
            digits(self.date.0, bcd::MASK_DATE)?,
            decode_hours(self.hours)?,
            digits(self.minutes.0, bcd::MASK_MINUTES)?,
            digits(self.seconds.0, bcd::MASK_SECONDS)?,
        )
    }

    /// Copies the status bits that share bytes with the time digits from
    /// `current` (OSCRUN, PWRFAIL, VBATEN, LPYR). ST is left clear so the
    /// write doesn't restart the oscillator.
    pub fn with_flags_from(mut self, current: &RawDateTime) -> Self {
        self.seconds = Seconds(bcd::merge(current.seconds.0, self.seconds.0, bcd::MASK_SECONDS));
        self.seconds.set_start_oscillator(false);
        self.weekday = Weekday(bcd::merge(current.weekday.0, self.weekday.0, bcd::MASK_WEEKDAY));
        self.month = Month(bcd::merge(current.month.0, self.month.0, bcd::MASK_MONTH));
        self
    }
}

/// One of the two power-fail timestamps: minute, hour, date and month, plus
/// the weekday. The chip doesn't record seconds or the year.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RawTimestamp {
    pub minutes: Minutes,
    pub hours: Hours,
    pub date: Date,
    pub month: PowerFailMonth,
}

impl From<[u8; 4]> for RawTimestamp {
    fn from(data: [u8; 4]) -> Self {
        RawTimestamp {
            minutes: Minutes(data[0]),
            hours: Hours(data[1]),
            date: Date(data[2]),
            month: PowerFailMonth(data[3]),
        }
    }
}

impl RawTimestamp {
    /// Decodes the stamp with the year fixed to 2000 and seconds to 0.
    ///
    /// A stamp that was never captured reads as all zeros and fails with
    /// [`DateTimeError::InvalidDateTime`].
    pub fn to_datetime(&self) -> Result<DateTime, DateTimeError> {
        DateTime::new(
            FIRST_YEAR,
            digits(self.month.0, bcd::MASK_MONTH)?,
            digits(self.date.0, bcd::MASK_DATE)?,
            decode_hours(self.hours)?,
            digits(self.minutes.0, bcd::MASK_MINUTES)?,
            0,
        )
    }

    /// Recorded weekday register value (1-7).
    pub fn weekday(&self) -> u8 {
        self.month.weekday()
    }
}
