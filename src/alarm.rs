//! Alarm configuration for the MCP7940's two alarm channels.
//!
//! Each alarm is a block of six registers (seconds, minutes, hours, weekday,
//! date, month) plus a match type that selects which of them the chip
//! compares against the running clock:
//!
//! | [`AlarmMatch`] | Code | Compared fields |
//! |---|---|---|
//! | `Seconds` | 0 | seconds |
//! | `Minutes` | 1 | minutes |
//! | `Hours` | 2 | hours |
//! | `DayOfWeek` | 3 | weekday |
//! | `Date` | 4 | day of month |
//! | `All` | 7 | seconds, minutes, hours, weekday, day of month and month |
//!
//! Codes 5 and 6 are reserved by the chip.
//!
//! There is no year register, so an alarm target read back from the chip is
//! reported in the year 2000 with every field the match type ignores set to a
//! neutral value; see [`AlarmMatch::restrict`].
//!
//! Both alarms drive the same MFP pin with a single shared polarity bit, which
//! lives in the alarm 0 weekday register.

use embedded_hal::i2c::I2c;

use crate::bcd;
use crate::datetime::DateTime;
use crate::registers::{AlarmPolarity, AlarmWeekday, Field, Hours, RegAddr, TimeRepresentation};
use crate::snapshot::{decode_hours, encode_hours, FIRST_YEAR};
use crate::{Mcp7940, Mcp7940Error};

/// Error type for alarm configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmError {
    /// Alarm channel other than 0 or 1
    InvalidAlarm(u8),
    /// Reserved or out of range match type code
    InvalidMatchType(u8),
}

/// One of the two alarm channels.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alarm {
    /// Alarm 0, registers 0x0A-0x0F
    Zero = 0,
    /// Alarm 1, registers 0x11-0x16
    One = 1,
}

impl TryFrom<u8> for Alarm {
    type Error = AlarmError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Alarm::Zero),
            1 => Ok(Alarm::One),
            n => Err(AlarmError::InvalidAlarm(n)),
        }
    }
}

impl Alarm {
    /// First register of the alarm block.
    pub const fn base(self) -> RegAddr {
        match self {
            Alarm::Zero => RegAddr::Alarm0Seconds,
            Alarm::One => RegAddr::Alarm1Seconds,
        }
    }

    /// The ALMxWKDAY register holding match type, flag and weekday.
    pub const fn weekday_register(self) -> RegAddr {
        match self {
            Alarm::Zero => RegAddr::Alarm0Weekday,
            Alarm::One => RegAddr::Alarm1Weekday,
        }
    }

    /// The ALMxEN bit in CONTROL.
    pub const fn enable_field(self) -> Field {
        match self {
            Alarm::Zero => Field::ALM0EN,
            Alarm::One => Field::ALM1EN,
        }
    }

    /// The ALMxIF interrupt flag.
    pub const fn interrupt_flag_field(self) -> Field {
        Field::bit(self.weekday_register(), 3)
    }
}

/// Which fields of the alarm registers have to match the clock.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmMatch {
    /// Seconds match; fires once a minute
    Seconds = 0,
    /// Minutes match; fires once an hour
    Minutes = 1,
    /// Hours match; fires once a day
    Hours = 2,
    /// Weekday matches; fires at midnight of that day
    DayOfWeek = 3,
    /// Day of month matches; fires at midnight of that date
    Date = 4,
    /// Seconds, minutes, hours, weekday, date and month all match
    All = 7,
}

impl TryFrom<u8> for AlarmMatch {
    type Error = AlarmError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AlarmMatch::Seconds),
            1 => Ok(AlarmMatch::Minutes),
            2 => Ok(AlarmMatch::Hours),
            3 => Ok(AlarmMatch::DayOfWeek),
            4 => Ok(AlarmMatch::Date),
            7 => Ok(AlarmMatch::All),
            n => Err(AlarmError::InvalidMatchType(n)),
        }
    }
}

impl From<AlarmMatch> for u8 {
    fn from(value: AlarmMatch) -> Self {
        value as u8
    }
}

fn neutral(month: u8, day: u8, hour: u8, minute: u8, second: u8) -> DateTime {
    // Callers pass fields taken from a valid DateTime, and 2000 is a leap year.
    match DateTime::new(FIRST_YEAR, month, day, hour, minute, second) {
        Ok(value) => value,
        Err(_) => DateTime::from_unix(crate::datetime::SECONDS_FROM_1970_TO_2000 as u32),
    }
}

impl AlarmMatch {
    /// Keeps only the fields of `target` this match type compares, moved to
    /// the year 2000. Every other field takes its neutral value: month 1,
    /// day 1, 00:00:00.
    ///
    /// A weekday target becomes the matching day in the first week of
    /// January 2000 (Sunday the 2nd through Saturday the 8th).
    pub fn restrict(self, target: &DateTime) -> DateTime {
        match self {
            AlarmMatch::Seconds => neutral(1, 1, 0, 0, target.second()),
            AlarmMatch::Minutes => neutral(1, 1, 0, target.minute(), 0),
            AlarmMatch::Hours => neutral(1, 1, target.hour(), 0, 0),
            AlarmMatch::DayOfWeek => neutral(1, 2 + target.day_of_week(), 0, 0, 0),
            AlarmMatch::Date => neutral(1, target.day(), 0, 0, 0),
            AlarmMatch::All => neutral(
                target.month(),
                target.day(),
                target.hour(),
                target.minute(),
                target.second(),
            ),
        }
    }
}

/// Encodes the six alarm registers. The weekday is always the target's, the
/// other fields come from the restricted target; the interrupt flag is clear.
pub(crate) fn encode_alarm(
    alarm_match: AlarmMatch,
    target: &DateTime,
    representation: TimeRepresentation,
    polarity: AlarmPolarity,
) -> [u8; 6] {
    let restricted = alarm_match.restrict(target);
    let mut weekday = AlarmWeekday::default();
    weekday.set_polarity(polarity);
    weekday.set_match_type(alarm_match.into());
    weekday.set_weekday(target.day_of_week() + 1);
    [
        bcd::encode(restricted.second()),
        bcd::encode(restricted.minute()),
        encode_hours(restricted.hour(), representation).into(),
        weekday.into(),
        bcd::encode(restricted.day()),
        bcd::encode(restricted.month()),
    ]
}

/// Decodes the six alarm registers into the restricted target and match type.
///
/// Only the registers the match type compares are decoded, so leftovers in
/// the others (reset values, another firmware's settings) are ignored.
pub(crate) fn decode_alarm<E>(block: &[u8; 6]) -> Result<(DateTime, AlarmMatch), Mcp7940Error<E>> {
    let weekday = AlarmWeekday::from(block[3]);
    let alarm_match = AlarmMatch::try_from(weekday.match_type()).map_err(Mcp7940Error::Alarm)?;
    let invalid = || Mcp7940Error::<E>::DateTime(crate::DateTimeError::InvalidDateTime);
    let digits = |byte: u8, mask: u8| bcd::checked_decode(byte, mask).ok_or_else(invalid);
    let hours = || -> Result<u8, Mcp7940Error<E>> {
        decode_hours(Hours::from(block[2])).map_err(Mcp7940Error::DateTime)
    };
    let at = |month: u8, day: u8, hour: u8, minute: u8, second: u8| -> Result<DateTime, Mcp7940Error<E>> {
        DateTime::new(FIRST_YEAR, month, day, hour, minute, second).map_err(Mcp7940Error::DateTime)
    };

    let target = match alarm_match {
        AlarmMatch::Seconds => at(1, 1, 0, 0, digits(block[0], bcd::MASK_SECONDS)?)?,
        AlarmMatch::Minutes => at(1, 1, 0, digits(block[1], bcd::MASK_MINUTES)?, 0)?,
        AlarmMatch::Hours => at(1, 1, hours()?, 0, 0)?,
        AlarmMatch::DayOfWeek => {
            let day = weekday.weekday();
            if !(1..=7).contains(&day) {
                return Err(invalid());
            }
            at(1, 1 + day, 0, 0, 0)?
        }
        AlarmMatch::Date => at(1, digits(block[4], bcd::MASK_DATE)?, 0, 0, 0)?,
        AlarmMatch::All => at(
            digits(block[5], bcd::MASK_MONTH)?,
            digits(block[4], bcd::MASK_DATE)?,
            hours()?,
            digits(block[1], bcd::MASK_MINUTES)?,
            digits(block[0], bcd::MASK_SECONDS)?,
        )?,
    };
    Ok((target, alarm_match))
}

impl<I2C: I2c> Mcp7940<I2C> {
    /// Programs an alarm.
    ///
    /// The channel is disabled while its registers are rewritten, its
    /// interrupt flag is cleared, and the shared polarity bit is preserved.
    /// The hour is written in the clock's current 12/24-hour format.
    ///
    /// # Arguments
    /// * `alarm` - Which channel to program
    /// * `alarm_match` - Which fields have to match
    /// * `target` - When to fire; fields `alarm_match` ignores don't matter
    /// * `enabled` - Enable the channel once programmed
    pub fn set_alarm(
        &mut self,
        alarm: Alarm,
        alarm_match: AlarmMatch,
        target: &DateTime,
        enabled: bool,
    ) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.set_alarm_enabled(alarm, false)?;
        let polarity = self.alarm_polarity()?;
        let representation = self.time_representation()?;
        let block = encode_alarm(alarm_match, target, representation, polarity);
        debug!("MCP7940: alarm {} registers {:?}", alarm as u8, block);
        self.write_block(alarm.base(), &block)?;
        if enabled {
            self.set_alarm_enabled(alarm, true)?;
        }
        Ok(())
    }

    /// Reads an alarm back as the restricted target and its match type.
    pub fn alarm(&mut self, alarm: Alarm) -> Result<(DateTime, AlarmMatch), Mcp7940Error<I2C::Error>> {
        let mut block = [0; 6];
        self.read_block(alarm.base(), &mut block)?;
        decode_alarm(&block)
    }

    /// Disables an alarm and clears its interrupt flag.
    pub fn clear_alarm(&mut self, alarm: Alarm) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.set_alarm_enabled(alarm, false)?;
        self.write_field(alarm.interrupt_flag_field(), 0)
    }

    /// Enables or disables an alarm without touching its registers.
    pub fn set_alarm_enabled(
        &mut self,
        alarm: Alarm,
        enabled: bool,
    ) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.write_field(alarm.enable_field(), u8::from(enabled))
    }

    /// Reports whether an alarm is enabled (ALMxEN).
    pub fn alarm_enabled(&mut self, alarm: Alarm) -> Result<bool, Mcp7940Error<I2C::Error>> {
        Ok(self.read_field(alarm.enable_field())? != 0)
    }

    /// Reports whether the alarm has fired. The flag is left as it is; use
    /// [`clear_alarm`](Self::clear_alarm) to acknowledge it.
    pub fn is_alarm_triggered(&mut self, alarm: Alarm) -> Result<bool, Mcp7940Error<I2C::Error>> {
        Ok(self.read_field(alarm.interrupt_flag_field())? != 0)
    }

    /// Sets the MFP level used by both alarms.
    pub fn set_alarm_polarity(
        &mut self,
        polarity: AlarmPolarity,
    ) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.write_field(Field::ALMPOL, polarity.into())
    }

    /// MFP level used by both alarms.
    pub fn alarm_polarity(&mut self) -> Result<AlarmPolarity, Mcp7940Error<I2C::Error>> {
        Ok(self.read_field(Field::ALMPOL)?.into())
    }
}
