//! A platform-agnostic driver for the Microchip MCP7940M/MCP7940N real-time
//! clock.
//!
//! The driver talks to the chip through any [`embedded_hal::i2c::I2c`]
//! implementation and covers the whole register map:
//!
//! - Timekeeping in 12 or 24-hour format, oscillator start/stop, battery
//!   backup and the power-fail timestamps
//! - Both alarms with every match type the chip supports
//! - Square wave output and the general purpose MFP level
//! - Digital trim, including drift calibration against a reference time or a
//!   measured output frequency
//! - The 64 bytes of battery-backed SRAM
//!
//! Dates and times are plain [`DateTime`] values with [`TimeSpan`]
//! arithmetic, convertible to and from [`chrono::NaiveDateTime`].
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp7940::{Alarm, AlarmMatch, DateTime, Mcp7940, TimeSpan};
//!
//! let mut rtc = Mcp7940::new(i2c);
//! rtc.start()?;
//! rtc.set(&DateTime::new(2024, 3, 14, 15, 30, 0)?)?;
//!
//! let wake = rtc.now()?.add(TimeSpan::new(0, 0, 5, 0));
//! rtc.set_alarm(Alarm::Zero, AlarmMatch::Minutes, &wake, true)?;
//! ```
//!
//! # Features
//!
//! - `log`: log through the `log` crate
//! - `defmt`: log through `defmt` and implement `defmt::Format` for the
//!   public types
#![no_std]

#[macro_use]
mod fmt;

pub mod alarm;
pub mod bcd;
mod calibration;
mod clock;
pub mod datetime;
pub mod registers;
pub mod snapshot;
mod sram;
pub mod timespan;

use embedded_hal::i2c::I2c;

pub use alarm::{Alarm, AlarmError, AlarmMatch};
pub use calibration::{ppm_to_trim, MAX_CORRECTABLE_PPM};
pub use clock::MfpMode;
pub use datetime::{DateTime, DateTimeError};
pub use registers::{
    AlarmPolarity, BusSpeed, Control, Field, OscTrim, RegAddr, SquareWaveFrequency,
    TimeRepresentation, DEVICE_ADDRESS, MAX_TRANSFER, SRAM_SIZE,
};
pub use timespan::TimeSpan;

/// Default number of status reads while waiting for the oscillator to start
/// or stop.
pub const DEFAULT_OSCILLATOR_ATTEMPTS: u16 = 100;

/// Device configuration applied by [`Mcp7940::configure`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Hour register format
    pub time_representation: TimeRepresentation,
    /// Square wave output frequency
    pub square_wave_frequency: SquareWaveFrequency,
    /// Drive the square wave onto MFP
    pub square_wave_enabled: bool,
    /// MFP level when an alarm fires
    pub alarm_polarity: AlarmPolarity,
    /// Keep time on VBAT when VCC fails
    pub battery_backup: bool,
    /// Use an external 32.768 kHz clock instead of the crystal
    pub external_oscillator: bool,
    /// Apply the trim 128 times per second instead of once per minute
    pub coarse_trim: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            time_representation: TimeRepresentation::TwentyFourHour,
            square_wave_frequency: SquareWaveFrequency::Hz1,
            square_wave_enabled: false,
            alarm_polarity: AlarmPolarity::ActiveLow,
            battery_backup: true,
            external_oscillator: false,
            coarse_trim: false,
        }
    }
}

/// Errors returned by the driver.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mcp7940Error<I2CE> {
    /// I2C bus error
    I2c(I2CE),
    /// Date/time out of range or registers held invalid data
    DateTime(DateTimeError),
    /// Invalid alarm channel or match type
    Alarm(AlarmError),
    /// The oscillator didn't change state within the configured number of reads
    OscillatorTimeout,
    /// SRAM address or length outside the 64-byte window
    SramOutOfRange,
    /// Calibration needs a reference time, but the clock hasn't been set
    NoReferenceTime,
    /// MFP is driven by the square wave or an alarm
    MfpInUse,
}

impl<I2CE> From<I2CE> for Mcp7940Error<I2CE> {
    fn from(e: I2CE) -> Self {
        Mcp7940Error::I2c(e)
    }
}

// Generates a typed getter and setter for a single register.
macro_rules! set_and_get_register {
    ($(($name:ident, $regaddr:expr, $typ:ty)),+ $(,)?) => {
        $(
            paste::paste! {
                #[doc = concat!("Writes the raw `", stringify!($typ), "` register.")]
                pub fn [< set_ $name >](&mut self, value: $typ) -> Result<(), Mcp7940Error<I2C::Error>> {
                    self.write_register($regaddr, value.into())
                }

                #[doc = concat!("Reads the raw `", stringify!($typ), "` register.")]
                pub fn $name(&mut self) -> Result<$typ, Mcp7940Error<I2C::Error>> {
                    Ok(<$typ>::from(self.read_register($regaddr)?))
                }
            }
        )+
    };
}

/// MCP7940 real-time clock driver.
///
/// The driver owns the bus handle; use [`release`](Self::release) to get it
/// back. The chip has a fixed address, so only one MCP7940 can sit on a bus.
pub struct Mcp7940<I2C: I2c> {
    i2c: I2C,
    oscillator_attempts: u16,
    reference_time: Option<u32>,
}

impl<I2C: I2c> Mcp7940<I2C> {
    /// Creates a driver instance. No bus traffic happens until the first call.
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            oscillator_attempts: DEFAULT_OSCILLATOR_ATTEMPTS,
            reference_time: None,
        }
    }

    /// Sets how many status reads [`start`](Self::start) and
    /// [`stop`](Self::stop) make before giving up. At least one read is
    /// always made.
    pub fn with_oscillator_attempts(mut self, attempts: u16) -> Self {
        self.oscillator_attempts = attempts.max(1);
        self
    }

    /// Consumes the driver and returns the bus handle.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Reads one register.
    pub fn read_register(&mut self, reg: impl Into<u8>) -> Result<u8, Mcp7940Error<I2C::Error>> {
        let addr = reg.into();
        let mut data = [0];
        self.i2c.write_read(DEVICE_ADDRESS, &[addr], &mut data)?;
        trace!("read reg {} = {}", addr, data[0]);
        Ok(data[0])
    }

    /// Writes one register.
    pub fn write_register(
        &mut self,
        reg: impl Into<u8>,
        value: u8,
    ) -> Result<(), Mcp7940Error<I2C::Error>> {
        let addr = reg.into();
        trace!("write reg {} = {}", addr, value);
        self.i2c.write(DEVICE_ADDRESS, &[addr, value])?;
        Ok(())
    }

    /// Reads bit `bit` (0-7) of a register.
    pub fn read_bit(&mut self, reg: RegAddr, bit: u8) -> Result<bool, Mcp7940Error<I2C::Error>> {
        Ok(self.read_field(Field::bit(reg, bit))? != 0)
    }

    /// Sets bit `bit` of a register, leaving the others as they are.
    pub fn set_bit(&mut self, reg: RegAddr, bit: u8) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.write_field(Field::bit(reg, bit), 1)
    }

    /// Clears bit `bit` of a register, leaving the others as they are.
    pub fn clear_bit(&mut self, reg: RegAddr, bit: u8) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.write_field(Field::bit(reg, bit), 0)
    }

    /// Sets or clears bit `bit` of a register.
    pub fn write_bit(
        &mut self,
        reg: RegAddr,
        bit: u8,
        value: bool,
    ) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.write_field(Field::bit(reg, bit), u8::from(value))
    }

    /// Reads a field, shifted down to bit 0.
    pub fn read_field(&mut self, field: Field) -> Result<u8, Mcp7940Error<I2C::Error>> {
        Ok(field.extract(self.read_register(field.reg)?))
    }

    /// Read-modify-write of a field. Bits of `value` that don't fit the field
    /// are ignored.
    pub fn write_field(&mut self, field: Field, value: u8) -> Result<(), Mcp7940Error<I2C::Error>> {
        let current = self.read_register(field.reg)?;
        self.write_register(field.reg, field.insert(current, value))
    }

    /// Reads consecutive registers starting at `start` into `buf`, in
    /// transactions of at most [`MAX_TRANSFER`] bytes.
    pub fn read_block(
        &mut self,
        start: impl Into<u8>,
        buf: &mut [u8],
    ) -> Result<(), Mcp7940Error<I2C::Error>> {
        let start = start.into();
        for (index, chunk) in buf.chunks_mut(MAX_TRANSFER).enumerate() {
            let addr = start.wrapping_add((index * MAX_TRANSFER) as u8);
            self.i2c.write_read(DEVICE_ADDRESS, &[addr], chunk)?;
        }
        Ok(())
    }

    /// Writes `data` to consecutive registers starting at `start`, in
    /// transactions of at most [`MAX_TRANSFER`] bytes.
    pub fn write_block(
        &mut self,
        start: impl Into<u8>,
        data: &[u8],
    ) -> Result<(), Mcp7940Error<I2C::Error>> {
        let start = start.into();
        let mut frame = [0u8; MAX_TRANSFER + 1];
        for (index, chunk) in data.chunks(MAX_TRANSFER).enumerate() {
            frame[0] = start.wrapping_add((index * MAX_TRANSFER) as u8);
            frame[1..=chunk.len()].copy_from_slice(chunk);
            self.i2c.write(DEVICE_ADDRESS, &frame[..=chunk.len()])?;
        }
        Ok(())
    }

    set_and_get_register!(
        (control, RegAddr::Control, Control),
        (osc_trim, RegAddr::OscTrim, OscTrim),
        (rtc_hours, RegAddr::Hours, registers::Hours),
    );
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

    #[test]
    fn test_read_and_write_register() {
        let mock = I2cMock::new(&[
            I2cTrans::write_read(DEVICE_ADDRESS, vec![0x07], vec![0x43]),
            I2cTrans::write(DEVICE_ADDRESS, vec![0x08, 0x85]),
        ]);
        let mut dev = Mcp7940::new(mock);
        assert_eq!(dev.read_register(RegAddr::Control).unwrap(), 0x43);
        dev.write_register(RegAddr::OscTrim, 0x85).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_bit_helpers_preserve_other_bits() {
        let mock = I2cMock::new(&[
            // read_bit
            I2cTrans::write_read(DEVICE_ADDRESS, vec![0x03], vec![0x2B]),
            // set_bit VBATEN already set: still written back unchanged
            I2cTrans::write_read(DEVICE_ADDRESS, vec![0x03], vec![0x2B]),
            I2cTrans::write(DEVICE_ADDRESS, vec![0x03, 0x2B]),
            // clear_bit
            I2cTrans::write_read(DEVICE_ADDRESS, vec![0x03], vec![0x2B]),
            I2cTrans::write(DEVICE_ADDRESS, vec![0x03, 0x23]),
            // write_bit(true)
            I2cTrans::write_read(DEVICE_ADDRESS, vec![0x07], vec![0x01]),
            I2cTrans::write(DEVICE_ADDRESS, vec![0x07, 0x41]),
        ]);
        let mut dev = Mcp7940::new(mock);
        assert!(dev.read_bit(RegAddr::Weekday, 5).unwrap());
        dev.set_bit(RegAddr::Weekday, 3).unwrap();
        dev.clear_bit(RegAddr::Weekday, 3).unwrap();
        dev.write_bit(RegAddr::Control, 6, true).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_field_read_modify_write() {
        let mock = I2cMock::new(&[
            I2cTrans::write_read(DEVICE_ADDRESS, vec![0x07], vec![0x52]),
            I2cTrans::write_read(DEVICE_ADDRESS, vec![0x07], vec![0x52]),
            I2cTrans::write(DEVICE_ADDRESS, vec![0x07, 0x51]),
        ]);
        let mut dev = Mcp7940::new(mock);
        assert_eq!(dev.read_field(Field::SQWFS).unwrap(), 0b10);
        dev.write_field(Field::SQWFS, 0b01).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_block_transfers_are_chunked() {
        let data: Vec<u8> = (0..40).collect();
        let mock = I2cMock::new(&[
            I2cTrans::write_read(DEVICE_ADDRESS, vec![0x20], data[..32].to_vec()),
            I2cTrans::write_read(DEVICE_ADDRESS, vec![0x40], data[32..].to_vec()),
            I2cTrans::write(
                DEVICE_ADDRESS,
                [&[0x20u8][..], &data[..32]].concat(),
            ),
            I2cTrans::write(
                DEVICE_ADDRESS,
                [&[0x40u8][..], &data[32..]].concat(),
            ),
        ]);
        let mut dev = Mcp7940::new(mock);
        let mut buf = [0u8; 40];
        dev.read_block(RegAddr::Sram, &mut buf).unwrap();
        assert_eq!(&buf[..], &data[..]);
        dev.write_block(RegAddr::Sram, &data).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_empty_block_is_a_no_op() {
        let mock = I2cMock::new(&[]);
        let mut dev = Mcp7940::new(mock);
        dev.read_block(0x20, &mut []).unwrap();
        dev.write_block(0x20, &[]).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_typed_register_accessors() {
        let mock = I2cMock::new(&[
            I2cTrans::write_read(DEVICE_ADDRESS, vec![0x08], vec![0x8A]),
            I2cTrans::write(DEVICE_ADDRESS, vec![0x07, 0x40]),
        ]);
        let mut dev = Mcp7940::new(mock);
        assert_eq!(dev.osc_trim().unwrap().trim(), -10);
        let mut control = Control::default();
        control.set_square_wave_enable(true);
        dev.set_control(control).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_bus_errors_propagate() {
        let mock = I2cMock::new(&[I2cTrans::write_read(DEVICE_ADDRESS, vec![0x07], vec![0])
            .with_error(embedded_hal::i2c::ErrorKind::Other)]);
        let mut dev = Mcp7940::new(mock);
        assert!(matches!(
            dev.read_register(RegAddr::Control),
            Err(Mcp7940Error::I2c(embedded_hal::i2c::ErrorKind::Other))
        ));
        dev.i2c.done();
    }

    #[test]
    fn test_release_returns_bus() {
        let mock = I2cMock::new(&[]);
        let dev = Mcp7940::new(mock).with_oscillator_attempts(0);
        assert_eq!(dev.oscillator_attempts, 1);
        let mut mock = dev.release();
        mock.done();
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.time_representation, TimeRepresentation::TwentyFourHour);
        assert_eq!(config.square_wave_frequency, SquareWaveFrequency::Hz1);
        assert!(!config.square_wave_enabled);
        assert_eq!(config.alarm_polarity, AlarmPolarity::ActiveLow);
        assert!(config.battery_backup);
        assert!(!config.external_oscillator);
        assert!(!config.coarse_trim);
    }
}
