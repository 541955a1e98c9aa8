//! Register map and bitfield views for the MCP7940 RTC.
//!
//! The MCP7940 keeps its control and status flags in the same bytes as the BCD
//! time digits, so each timekeeping register has a bitfield view here that
//! names both. Single flags that the driver reads or toggles on their own are
//! also described by [`Field`] constants, which the generic
//! read-modify-write accessors on [`Mcp7940`](crate::Mcp7940) consume.

use bitfield::bitfield;

/// Fixed I2C address of the MCP7940.
pub const DEVICE_ADDRESS: u8 = 0x6F;

/// Size of the battery-backed SRAM in bytes.
pub const SRAM_SIZE: u8 = 64;

/// Largest number of data bytes moved in one bus transaction.
pub const MAX_TRANSFER: usize = 32;

/// Register addresses for the MCP7940 RTC.
#[allow(unused)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegAddr {
    /// Seconds register with the oscillator start bit (ST)
    Seconds = 0x00,
    /// Minutes register (0-59)
    Minutes = 0x01,
    /// Hours register (1-12 + AM/PM or 0-23)
    Hours = 0x02,
    /// Weekday register with OSCRUN, PWRFAIL and VBATEN
    Weekday = 0x03,
    /// Date register (1-31)
    Date = 0x04,
    /// Month register with the leap year flag
    Month = 0x05,
    /// Year register (0-99)
    Year = 0x06,
    /// Control register
    Control = 0x07,
    /// Digital trim register
    OscTrim = 0x08,
    /// Alarm 0 seconds register
    Alarm0Seconds = 0x0A,
    /// Alarm 0 minutes register
    Alarm0Minutes = 0x0B,
    /// Alarm 0 hours register
    Alarm0Hours = 0x0C,
    /// Alarm 0 weekday register, also holds the shared polarity bit
    Alarm0Weekday = 0x0D,
    /// Alarm 0 date register
    Alarm0Date = 0x0E,
    /// Alarm 0 month register
    Alarm0Month = 0x0F,
    /// Alarm 1 seconds register
    Alarm1Seconds = 0x11,
    /// Alarm 1 minutes register
    Alarm1Minutes = 0x12,
    /// Alarm 1 hours register
    Alarm1Hours = 0x13,
    /// Alarm 1 weekday register
    Alarm1Weekday = 0x14,
    /// Alarm 1 date register
    Alarm1Date = 0x15,
    /// Alarm 1 month register
    Alarm1Month = 0x16,
    /// Power-down timestamp, minutes
    PowerDownMinutes = 0x18,
    /// Power-down timestamp, hours
    PowerDownHours = 0x19,
    /// Power-down timestamp, date
    PowerDownDate = 0x1A,
    /// Power-down timestamp, weekday and month
    PowerDownMonth = 0x1B,
    /// Power-up timestamp, minutes
    PowerUpMinutes = 0x1C,
    /// Power-up timestamp, hours
    PowerUpHours = 0x1D,
    /// Power-up timestamp, date
    PowerUpDate = 0x1E,
    /// Power-up timestamp, weekday and month
    PowerUpMonth = 0x1F,
    /// First byte of the 64-byte SRAM
    Sram = 0x20,
}

impl From<RegAddr> for u8 {
    fn from(reg: RegAddr) -> Self {
        reg as u8
    }
}

/// Time representation format for the hours registers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeRepresentation {
    /// 24-hour format (0-23)
    TwentyFourHour = 0,
    /// 12-hour format (1-12 + AM/PM)
    TwelveHour = 1,
}
impl From<u8> for TimeRepresentation {
    /// Creates a `TimeRepresentation` from the 12/24 bit. Only bit 0 is
    /// looked at.
    fn from(v: u8) -> Self {
        match v & 0x01 {
            0 => TimeRepresentation::TwentyFourHour,
            _ => TimeRepresentation::TwelveHour,
        }
    }
}
impl From<TimeRepresentation> for u8 {
    fn from(v: TimeRepresentation) -> Self {
        v as u8
    }
}

/// Square wave output frequency (SQWFS1:SQWFS0).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SquareWaveFrequency {
    /// 1 Hz, trimmed
    Hz1 = 0b00,
    /// 4.096 kHz, trimmed
    Hz4096 = 0b01,
    /// 8.192 kHz, trimmed
    Hz8192 = 0b10,
    /// 32.768 kHz, straight from the crystal and not affected by the trim
    Hz32768 = 0b11,
}
impl From<u8> for SquareWaveFrequency {
    /// Creates a `SquareWaveFrequency` from the two SQWFS bits.
    fn from(v: u8) -> Self {
        match v & 0b11 {
            0b00 => SquareWaveFrequency::Hz1,
            0b01 => SquareWaveFrequency::Hz4096,
            0b10 => SquareWaveFrequency::Hz8192,
            _ => SquareWaveFrequency::Hz32768,
        }
    }
}
impl From<SquareWaveFrequency> for u8 {
    fn from(v: SquareWaveFrequency) -> Self {
        v as u8
    }
}

impl SquareWaveFrequency {
    /// Nominal output frequency in hertz.
    pub const fn hz(self) -> u32 {
        match self {
            SquareWaveFrequency::Hz1 => 1,
            SquareWaveFrequency::Hz4096 => 4096,
            SquareWaveFrequency::Hz8192 => 8192,
            SquareWaveFrequency::Hz32768 => 32_768,
        }
    }

    /// True if the output is derived after the digital trim.
    pub const fn is_trimmed(self) -> bool {
        !matches!(self, SquareWaveFrequency::Hz32768)
    }
}

/// Logic level of the MFP pin when an alarm is asserted (ALMPOL).
///
/// There is one polarity bit for both alarms; it lives in ALM0WKDAY.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmPolarity {
    /// MFP is driven low on a match
    ActiveLow = 0,
    /// MFP is driven high on a match
    ActiveHigh = 1,
}
impl From<u8> for AlarmPolarity {
    fn from(v: u8) -> Self {
        match v & 0x01 {
            0 => AlarmPolarity::ActiveLow,
            _ => AlarmPolarity::ActiveHigh,
        }
    }
}
impl From<AlarmPolarity> for u8 {
    fn from(v: AlarmPolarity) -> Self {
        v as u8
    }
}

/// I2C bus speeds the MCP7940 supports. Informational: the HAL owns the clock.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusSpeed {
    /// 100 kHz
    Standard = 100_000,
    /// 400 kHz
    Fast = 400_000,
}

impl BusSpeed {
    /// Bus clock in hertz.
    pub const fn hz(self) -> u32 {
        self as u32
    }
}

/// A named run of bits inside one register.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Field {
    /// Register holding the field
    pub reg: RegAddr,
    /// Position of the least significant bit
    pub shift: u8,
    /// Number of bits
    pub width: u8,
}

impl Field {
    /// Oscillator start/stop (RTCSEC bit 7).
    pub const ST: Field = Field::bit(RegAddr::Seconds, 7);
    /// 12/24 hour select (RTCHOUR bit 6).
    pub const HOUR_FORMAT: Field = Field::bit(RegAddr::Hours, 6);
    /// Oscillator running status, read only (RTCWKDAY bit 5).
    pub const OSCRUN: Field = Field::bit(RegAddr::Weekday, 5);
    /// Power failure status (RTCWKDAY bit 4).
    pub const PWRFAIL: Field = Field::bit(RegAddr::Weekday, 4);
    /// Battery backup enable (RTCWKDAY bit 3).
    pub const VBATEN: Field = Field::bit(RegAddr::Weekday, 3);
    /// Weekday counter (RTCWKDAY bits 2:0).
    pub const WKDAY: Field = Field::new(RegAddr::Weekday, 0, 3);
    /// Leap year flag, read only (RTCMTH bit 5).
    pub const LPYR: Field = Field::bit(RegAddr::Month, 5);
    /// General purpose output level on MFP (CONTROL bit 7).
    pub const OUT: Field = Field::bit(RegAddr::Control, 7);
    /// Square wave output enable (CONTROL bit 6).
    pub const SQWEN: Field = Field::bit(RegAddr::Control, 6);
    /// Alarm 1 enable (CONTROL bit 5).
    pub const ALM1EN: Field = Field::bit(RegAddr::Control, 5);
    /// Alarm 0 enable (CONTROL bit 4).
    pub const ALM0EN: Field = Field::bit(RegAddr::Control, 4);
    /// External oscillator input (CONTROL bit 3).
    pub const EXTOSC: Field = Field::bit(RegAddr::Control, 3);
    /// Coarse trim mode (CONTROL bit 2).
    pub const CRSTRIM: Field = Field::bit(RegAddr::Control, 2);
    /// Square wave frequency select (CONTROL bits 1:0).
    pub const SQWFS: Field = Field::new(RegAddr::Control, 0, 2);
    /// Alarm interrupt polarity, shared by both alarms (ALM0WKDAY bit 7).
    pub const ALMPOL: Field = Field::bit(RegAddr::Alarm0Weekday, 7);

    /// A field of `width` bits starting at `shift`.
    pub const fn new(reg: RegAddr, shift: u8, width: u8) -> Self {
        Field { reg, shift, width }
    }

    /// A single bit.
    pub const fn bit(reg: RegAddr, bit: u8) -> Self {
        Field::new(reg, bit, 1)
    }

    /// Mask of the field within its register.
    pub const fn mask(&self) -> u8 {
        (((1u16 << self.width) - 1) << self.shift) as u8
    }

    /// Extracts the field from a register value.
    pub const fn extract(&self, register: u8) -> u8 {
        (register & self.mask()) >> self.shift
    }

    /// Replaces the field inside a register value; extra bits in `value` are dropped.
    pub const fn insert(&self, register: u8, value: u8) -> u8 {
        (register & !self.mask()) | ((value << self.shift) & self.mask())
    }
}

// This macro generates the From<u8> and Into<u8> implementations for the
// register type
macro_rules! from_register_u8 {
    ($typ:ty) => {
        impl From<u8> for $typ {
            fn from(v: u8) -> Self {
                paste::paste!([< $typ >](v))
            }
        }
        impl From<$typ> for u8 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// Seconds register with the oscillator start bit.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Seconds(u8);
    impl Debug;
    /// Oscillator start (ST)
    pub start_oscillator, set_start_oscillator: 7;
    /// Tens place of seconds (0-5)
    pub ten_seconds, set_ten_seconds: 6, 4;
    /// Ones place of seconds (0-9)
    pub seconds, set_seconds: 3, 0;
}
from_register_u8!(Seconds);

#[cfg(feature = "defmt")]
impl defmt::Format for Seconds {
    fn format(&self, f: defmt::Formatter) {
        let seconds = 10 * self.ten_seconds() + self.seconds();
        defmt::write!(f, "Seconds({}s", seconds);
        if self.start_oscillator() {
            defmt::write!(f, ", ST");
        }
        defmt::write!(f, ")");
    }
}

bitfield! {
    /// Minutes register (0-59) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Minutes(u8);
    impl Debug;
    /// Tens place of minutes (0-5)
    pub ten_minutes, set_ten_minutes: 6, 4;
    /// Ones place of minutes (0-9)
    pub minutes, set_minutes: 3, 0;
}
from_register_u8!(Minutes);

#[cfg(feature = "defmt")]
impl defmt::Format for Minutes {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Minutes({}m)", 10 * self.ten_minutes() + self.minutes());
    }
}

bitfield! {
    /// Hours register with format selection and BCD encoding. Shared by the
    /// time, alarm and power-fail blocks.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Hours(u8);
    impl Debug;
    /// Time representation format (12/24 hour)
    pub from into TimeRepresentation, time_representation, set_time_representation: 6, 6;
    /// PM flag (12-hour) or 20-hour bit (24-hour)
    pub pm_or_twenty_hours, set_pm_or_twenty_hours: 5, 5;
    /// Tens place of hours
    pub ten_hours, set_ten_hours: 4, 4;
    /// Ones place of hours
    pub hours, set_hours: 3, 0;
}
from_register_u8!(Hours);

#[cfg(feature = "defmt")]
impl defmt::Format for Hours {
    fn format(&self, f: defmt::Formatter) {
        let hours = 10 * self.ten_hours() + self.hours();
        match self.time_representation() {
            TimeRepresentation::TwentyFourHour => {
                let hours = hours + 20 * self.pm_or_twenty_hours();
                defmt::write!(f, "Hours({}h 24h)", hours);
            }
            TimeRepresentation::TwelveHour => {
                let is_pm = self.pm_or_twenty_hours() != 0;
                defmt::write!(f, "Hours({}h {})", hours, if is_pm { "PM" } else { "AM" });
            }
        }
    }
}

bitfield! {
    /// Weekday register with oscillator, power and battery status.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Weekday(u8);
    impl Debug;
    /// Oscillator running (OSCRUN), read only
    pub oscillator_running, _: 5;
    /// Power failure recorded (PWRFAIL), write 0 to clear
    pub power_fail, set_power_fail: 4;
    /// Battery backup enabled (VBATEN)
    pub battery_backup, set_battery_backup: 3;
    /// Day of week (1-7, user defined; this driver uses 1 = Sunday)
    pub weekday, set_weekday: 2, 0;
}
from_register_u8!(Weekday);

#[cfg(feature = "defmt")]
impl defmt::Format for Weekday {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Weekday({}", self.weekday());
        if self.oscillator_running() {
            defmt::write!(f, ", OSCRUN");
        }
        if self.power_fail() {
            defmt::write!(f, ", PWRFAIL");
        }
        if self.battery_backup() {
            defmt::write!(f, ", VBATEN");
        }
        defmt::write!(f, ")");
    }
}

bitfield! {
    /// Date register (1-31) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Date(u8);
    impl Debug;
    /// Tens place of date (0-3)
    pub ten_date, set_ten_date: 5, 4;
    /// Ones place of date (0-9)
    pub date, set_date: 3, 0;
}
from_register_u8!(Date);

bitfield! {
    /// Month register (1-12) with the leap year flag.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Month(u8);
    impl Debug;
    /// Leap year (LPYR), read only
    pub leap_year, _: 5;
    /// Tens place of month (0-1)
    pub ten_month, set_ten_month: 4, 4;
    /// Ones place of month (0-9)
    pub month, set_month: 3, 0;
}
from_register_u8!(Month);

bitfield! {
    /// Year register (0-99) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Year(u8);
    impl Debug;
    /// Tens place of year (0-9)
    pub ten_year, set_ten_year: 7, 4;
    /// Ones place of year (0-9)
    pub year, set_year: 3, 0;
}
from_register_u8!(Year);

bitfield! {
    /// Control register for device configuration.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Control(u8);
    impl Debug;
    /// MFP output level when neither alarms nor square wave are active
    pub output, set_output: 7;
    /// Square wave output enable
    pub square_wave_enable, set_square_wave_enable: 6;
    /// Alarm 1 enable
    pub alarm1_enable, set_alarm1_enable: 5;
    /// Alarm 0 enable
    pub alarm0_enable, set_alarm0_enable: 4;
    /// External 32.768 kHz oscillator input
    pub external_oscillator, set_external_oscillator: 3;
    /// Coarse trim mode
    pub coarse_trim, set_coarse_trim: 2;
    /// Square wave output frequency selection
    pub from into SquareWaveFrequency, square_wave_frequency, set_square_wave_frequency: 1, 0;
}
from_register_u8!(Control);

#[cfg(feature = "defmt")]
impl defmt::Format for Control {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Control(OUT={}", self.output());
        if self.square_wave_enable() {
            defmt::write!(f, ", {} Hz square wave", self.square_wave_frequency().hz());
        }
        if self.alarm0_enable() {
            defmt::write!(f, ", ALM0EN");
        }
        if self.alarm1_enable() {
            defmt::write!(f, ", ALM1EN");
        }
        if self.external_oscillator() {
            defmt::write!(f, ", EXTOSC");
        }
        if self.coarse_trim() {
            defmt::write!(f, ", CRSTRIM");
        }
        defmt::write!(f, ")");
    }
}

bitfield! {
    /// Digital trim register, sign-magnitude.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct OscTrim(u8);
    impl Debug;
    /// Sign: set adds clock cycles, clear subtracts them
    pub sign, set_sign: 7;
    /// Number of trim steps (0-127)
    pub magnitude, set_magnitude: 6, 0;
}
from_register_u8!(OscTrim);

impl OscTrim {
    /// Signed trim value. Positive values slow the clock down.
    pub fn trim(&self) -> i8 {
        let magnitude = self.magnitude() as i8;
        if self.sign() {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Encodes a signed trim value, clamped to -127..=127.
    pub fn from_trim(trim: i32) -> Self {
        let clamped = trim.clamp(-127, 127);
        let mut value = OscTrim::default();
        value.set_sign(clamped < 0);
        value.set_magnitude(clamped.unsigned_abs() as u8);
        value
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for OscTrim {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "OscTrim({})", self.trim());
    }
}

bitfield! {
    /// Alarm weekday register: match type, interrupt flag and weekday.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmWeekday(u8);
    impl Debug;
    /// Interrupt polarity; only meaningful in ALM0WKDAY
    pub from into AlarmPolarity, polarity, set_polarity: 7, 7;
    /// Match type (ALMxMSK2:0)
    pub match_type, set_match_type: 6, 4;
    /// Interrupt flag (ALMxIF), write 0 to clear
    pub interrupt_flag, set_interrupt_flag: 3;
    /// Day of week (1-7)
    pub weekday, set_weekday: 2, 0;
}
from_register_u8!(AlarmWeekday);

#[cfg(feature = "defmt")]
impl defmt::Format for AlarmWeekday {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "AlarmWeekday(match={}, day={}",
            self.match_type(),
            self.weekday()
        );
        if self.interrupt_flag() {
            defmt::write!(f, ", IF");
        }
        defmt::write!(f, ")");
    }
}

bitfield! {
    /// Weekday/month register of the power-fail timestamps.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct PowerFailMonth(u8);
    impl Debug;
    /// Day of week (1-7)
    pub weekday, set_weekday: 7, 5;
    /// Tens place of month (0-1)
    pub ten_month, set_ten_month: 4, 4;
    /// Ones place of month (0-9)
    pub month, set_month: 3, 0;
}
from_register_u8!(PowerFailMonth);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_conversions() {
        assert_eq!(TimeRepresentation::from(0), TimeRepresentation::TwentyFourHour);
        assert_eq!(TimeRepresentation::from(1), TimeRepresentation::TwelveHour);
        assert_eq!(u8::from(TimeRepresentation::TwelveHour), 1);

        assert_eq!(SquareWaveFrequency::from(0b00), SquareWaveFrequency::Hz1);
        assert_eq!(SquareWaveFrequency::from(0b01), SquareWaveFrequency::Hz4096);
        assert_eq!(SquareWaveFrequency::from(0b10), SquareWaveFrequency::Hz8192);
        assert_eq!(SquareWaveFrequency::from(0b11), SquareWaveFrequency::Hz32768);
        assert_eq!(u8::from(SquareWaveFrequency::Hz8192), 0b10);

        assert_eq!(AlarmPolarity::from(0), AlarmPolarity::ActiveLow);
        assert_eq!(AlarmPolarity::from(1), AlarmPolarity::ActiveHigh);
        assert_eq!(u8::from(RegAddr::Alarm1Weekday), 0x14);
    }

    #[test]
    fn test_square_wave_frequency_properties() {
        assert_eq!(SquareWaveFrequency::Hz1.hz(), 1);
        assert_eq!(SquareWaveFrequency::Hz32768.hz(), 32_768);
        assert!(SquareWaveFrequency::Hz4096.is_trimmed());
        assert!(!SquareWaveFrequency::Hz32768.is_trimmed());
        assert_eq!(BusSpeed::Standard.hz(), 100_000);
        assert_eq!(BusSpeed::Fast.hz(), 400_000);
    }

    #[test]
    fn test_field_masks() {
        assert_eq!(Field::ST.mask(), 0x80);
        assert_eq!(Field::OSCRUN.mask(), 0x20);
        assert_eq!(Field::VBATEN.mask(), 0x08);
        assert_eq!(Field::SQWFS.mask(), 0x03);
        assert_eq!(Field::WKDAY.mask(), 0x07);
        assert_eq!(Field::new(RegAddr::Alarm0Weekday, 4, 3).mask(), 0x70);
        assert_eq!(Field::new(RegAddr::OscTrim, 0, 8).mask(), 0xFF);
    }

    #[test]
    fn test_field_extract_and_insert() {
        // OSCRUN | VBATEN | Tuesday
        let weekday = 0x2B;
        assert_eq!(Field::OSCRUN.extract(weekday), 1);
        assert_eq!(Field::PWRFAIL.extract(weekday), 0);
        assert_eq!(Field::WKDAY.extract(weekday), 3);
        assert_eq!(Field::VBATEN.insert(weekday, 0), 0x23);
        assert_eq!(Field::WKDAY.insert(weekday, 5), 0x2D);
        // value wider than the field is cut to the field
        assert_eq!(Field::SQWFS.insert(0x40, 0xFF), 0x43);
    }

    #[test]
    fn test_seconds_register() {
        let seconds = Seconds::from(0xD9);
        assert!(seconds.start_oscillator());
        assert_eq!(seconds.ten_seconds(), 5);
        assert_eq!(seconds.seconds(), 9);
        assert_eq!(u8::from(seconds), 0xD9);
    }

    #[test]
    fn test_hours_register() {
        // 24-hour mode, 23h
        let hours = Hours::from(0x23);
        assert_eq!(
            hours.time_representation(),
            TimeRepresentation::TwentyFourHour
        );
        assert_eq!(hours.pm_or_twenty_hours(), 1);
        assert_eq!(hours.hours(), 3);

        // 12-hour mode, 11 PM
        let hours = Hours::from(0x71);
        assert_eq!(hours.time_representation(), TimeRepresentation::TwelveHour);
        assert_eq!(hours.pm_or_twenty_hours(), 1);
        assert_eq!(hours.ten_hours(), 1);
        assert_eq!(hours.hours(), 1);
    }

    #[test]
    fn test_weekday_register_flags() {
        let weekday = Weekday::from(0x3F);
        assert!(weekday.oscillator_running());
        assert!(weekday.power_fail());
        assert!(weekday.battery_backup());
        assert_eq!(weekday.weekday(), 7);

        let mut weekday = Weekday::from(0x21);
        weekday.set_battery_backup(true);
        weekday.set_weekday(4);
        assert_eq!(u8::from(weekday), 0x2C);
    }

    #[test]
    fn test_month_register_leap_year() {
        let month = Month::from(0x22);
        assert!(month.leap_year());
        assert_eq!(month.ten_month(), 0);
        assert_eq!(month.month(), 2);
        assert!(!Month::from(0x12).leap_year());
    }

    #[test]
    fn test_control_register() {
        let control = Control::from(0xFF);
        assert!(control.output());
        assert!(control.square_wave_enable());
        assert!(control.alarm1_enable());
        assert!(control.alarm0_enable());
        assert!(control.external_oscillator());
        assert!(control.coarse_trim());
        assert_eq!(
            control.square_wave_frequency(),
            SquareWaveFrequency::Hz32768
        );

        let mut control = Control::default();
        control.set_square_wave_enable(true);
        control.set_square_wave_frequency(SquareWaveFrequency::Hz4096);
        control.set_alarm0_enable(true);
        assert_eq!(u8::from(control), 0x51);
    }

    #[test]
    fn test_osc_trim_sign_magnitude() {
        assert_eq!(OscTrim::from(0x05).trim(), 5);
        assert_eq!(OscTrim::from(0x85).trim(), -5);
        assert_eq!(OscTrim::from(0x7F).trim(), 127);
        assert_eq!(OscTrim::from(0xFF).trim(), -127);
        // negative zero reads as zero
        assert_eq!(OscTrim::from(0x80).trim(), 0);

        assert_eq!(u8::from(OscTrim::from_trim(5)), 0x05);
        assert_eq!(u8::from(OscTrim::from_trim(-5)), 0x85);
        assert_eq!(u8::from(OscTrim::from_trim(128)), 0x7F);
        assert_eq!(u8::from(OscTrim::from_trim(-128)), 0xFF);
        assert_eq!(u8::from(OscTrim::from_trim(0)), 0x00);
    }

    #[test]
    fn test_alarm_weekday_register() {
        let reg = AlarmWeekday::from(0xF9);
        assert_eq!(reg.polarity(), AlarmPolarity::ActiveHigh);
        assert_eq!(reg.match_type(), 7);
        assert!(reg.interrupt_flag());
        assert_eq!(reg.weekday(), 1);

        let mut reg = AlarmWeekday::default();
        reg.set_polarity(AlarmPolarity::ActiveHigh);
        reg.set_match_type(4);
        reg.set_weekday(6);
        assert_eq!(u8::from(reg), 0xC6);
    }

    #[test]
    fn test_power_fail_month_register() {
        // Wednesday (4), December
        let reg = PowerFailMonth::from(0x92);
        assert_eq!(reg.weekday(), 4);
        assert_eq!(reg.ten_month(), 1);
        assert_eq!(reg.month(), 2);
    }

    #[test]
    fn test_register_roundtrip_conversions() {
        let test_values = [0x00, 0x55, 0xAA, 0xFF, 0x12, 0x34, 0x9A, 0xDE];
        for &value in &test_values {
            assert_eq!(u8::from(Seconds::from(value)), value);
            assert_eq!(u8::from(Minutes::from(value)), value);
            assert_eq!(u8::from(Hours::from(value)), value);
            assert_eq!(u8::from(Weekday::from(value)), value);
            assert_eq!(u8::from(Date::from(value)), value);
            assert_eq!(u8::from(Month::from(value)), value);
            assert_eq!(u8::from(Year::from(value)), value);
            assert_eq!(u8::from(Control::from(value)), value);
            assert_eq!(u8::from(OscTrim::from(value)), value);
            assert_eq!(u8::from(AlarmWeekday::from(value)), value);
            assert_eq!(u8::from(PowerFailMonth::from(value)), value);
        }
    }
}
