//! Timekeeping, oscillator control and MFP configuration.

use chrono::Weekday;
use embedded_hal::i2c::I2c;

use crate::datetime::{DateTime, DateTimeError};
use crate::registers::{Field, RegAddr, SquareWaveFrequency, TimeRepresentation};
use crate::snapshot::{decode_hours, encode_hours, RawDateTime, RawTimestamp};
use crate::{Config, Mcp7940, Mcp7940Error};

/// What currently drives the MFP pin.
///
/// The square wave takes precedence over the alarms, which take precedence
/// over the general purpose output bit.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MfpMode {
    /// Square wave output (SQWEN set)
    SquareWave,
    /// Alarm interrupt output (ALM0EN or ALM1EN set)
    Alarm,
    /// General purpose output at the given level (OUT)
    Output(bool),
}

fn weekday_from_register(value: u8) -> Result<Weekday, DateTimeError> {
    match value {
        1 => Ok(Weekday::Sun),
        2 => Ok(Weekday::Mon),
        3 => Ok(Weekday::Tue),
        4 => Ok(Weekday::Wed),
        5 => Ok(Weekday::Thu),
        6 => Ok(Weekday::Fri),
        7 => Ok(Weekday::Sat),
        _ => Err(DateTimeError::InvalidDateTime),
    }
}

impl<I2C: I2c> Mcp7940<I2C> {
    /// Reports whether the oscillator is running (OSCRUN).
    pub fn is_running(&mut self) -> Result<bool, Mcp7940Error<I2C::Error>> {
        Ok(self.read_field(Field::OSCRUN)? != 0)
    }

    /// Starts the oscillator and waits until OSCRUN confirms it.
    ///
    /// # Returns
    /// * `Ok(())` once the oscillator runs; also when it was already running
    /// * `Err(Mcp7940Error::OscillatorTimeout)` if OSCRUN didn't come up in time
    pub fn start(&mut self) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.write_field(Field::ST, 1)?;
        self.wait_for_oscillator(true)
    }

    /// Stops the oscillator and waits until OSCRUN clears.
    pub fn stop(&mut self) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.write_field(Field::ST, 0)?;
        self.wait_for_oscillator(false)
    }

    fn wait_for_oscillator(&mut self, running: bool) -> Result<(), Mcp7940Error<I2C::Error>> {
        for _ in 0..self.oscillator_attempts {
            if self.is_running()? == running {
                return Ok(());
            }
        }
        warn!(
            "MCP7940: oscillator still not running={} after {} reads",
            running, self.oscillator_attempts
        );
        Err(Mcp7940Error::OscillatorTimeout)
    }

    fn read_raw_datetime(&mut self) -> Result<RawDateTime, Mcp7940Error<I2C::Error>> {
        let mut data = [0; 7];
        self.read_block(RegAddr::Seconds, &mut data)?;
        Ok(data.into())
    }

    fn write_raw_datetime(&mut self, raw: &RawDateTime) -> Result<(), Mcp7940Error<I2C::Error>> {
        let data: [u8; 7] = raw.into();
        self.write_block(RegAddr::Seconds, &data)
    }

    /// Reads the current date and time.
    ///
    /// The seven time registers are read in one transfer so the fields are
    /// consistent with each other. 12-hour register values are converted to
    /// 24-hour form.
    pub fn now(&mut self) -> Result<DateTime, Mcp7940Error<I2C::Error>> {
        let raw = self.read_raw_datetime()?;
        raw.to_datetime().map_err(|e| {
            error!("MCP7940: invalid time registers {:?}", <[u8; 7]>::from(&raw));
            Mcp7940Error::DateTime(e)
        })
    }

    /// Sets the date and time.
    ///
    /// The oscillator is stopped while the registers are written, then
    /// restarted. The battery backup and power-fail flags survive, and the
    /// hour is written in whatever format the chip is using. The new time is
    /// also remembered as the reference for [`calibrate`](Self::calibrate).
    ///
    /// # Arguments
    /// * `datetime` - The date and time to set; the year must be 2000-2099
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(Mcp7940Error::DateTime)` for an unsupported year, before any bus traffic
    /// * `Err(Mcp7940Error::OscillatorTimeout)` if the oscillator didn't stop or restart
    pub fn set(&mut self, datetime: &DateTime) -> Result<(), Mcp7940Error<I2C::Error>> {
        let encoded = RawDateTime::from_datetime(datetime, TimeRepresentation::TwentyFourHour)
            .map_err(Mcp7940Error::DateTime)?;
        self.stop()?;
        let current = self.read_raw_datetime()?;
        let mut raw = encoded.with_flags_from(&current);
        raw.hours = encode_hours(datetime.hour(), current.hours.time_representation());
        debug!("MCP7940: writing time registers {:?}", <[u8; 7]>::from(&raw));
        self.write_raw_datetime(&raw)?;
        self.start()?;
        self.reference_time = Some(datetime.unix_time());
        Ok(())
    }

    /// Day of the week from the weekday counter, 1 = Sunday.
    pub fn weekday(&mut self) -> Result<Weekday, Mcp7940Error<I2C::Error>> {
        weekday_from_register(self.read_field(Field::WKDAY)?).map_err(Mcp7940Error::DateTime)
    }

    /// Overwrites the weekday counter without touching the date.
    pub fn set_weekday(&mut self, weekday: Weekday) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.write_field(Field::WKDAY, weekday.num_days_from_sunday() as u8 + 1)
    }

    /// Reads the hour register format.
    pub fn time_representation(&mut self) -> Result<TimeRepresentation, Mcp7940Error<I2C::Error>> {
        Ok(self.read_field(Field::HOUR_FORMAT)?.into())
    }

    /// Switches the hour register format, converting the current hour so the
    /// clock keeps showing the same time.
    pub fn set_time_representation(
        &mut self,
        representation: TimeRepresentation,
    ) -> Result<(), Mcp7940Error<I2C::Error>> {
        let hours = self.rtc_hours()?;
        if hours.time_representation() == representation {
            return Ok(());
        }
        let hour = decode_hours(hours).map_err(Mcp7940Error::DateTime)?;
        self.set_rtc_hours(encode_hours(hour, representation))
    }

    /// Reports whether the clock switches to VBAT on a power failure.
    pub fn battery_backup(&mut self) -> Result<bool, Mcp7940Error<I2C::Error>> {
        Ok(self.read_field(Field::VBATEN)? != 0)
    }

    /// Enables or disables the switch to VBAT on a power failure.
    pub fn set_battery_backup(&mut self, enabled: bool) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.write_field(Field::VBATEN, u8::from(enabled))
    }

    /// Reports whether a power failure was recorded (PWRFAIL).
    pub fn power_fail(&mut self) -> Result<bool, Mcp7940Error<I2C::Error>> {
        Ok(self.read_field(Field::PWRFAIL)? != 0)
    }

    /// Clears PWRFAIL. The chip also resets both power-fail timestamps.
    pub fn clear_power_fail(&mut self) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.write_field(Field::PWRFAIL, 0)
    }

    /// When main power was lost. The year reads as 2000 and the seconds as 0.
    pub fn power_down_time(&mut self) -> Result<DateTime, Mcp7940Error<I2C::Error>> {
        self.read_power_fail_stamp(RegAddr::PowerDownMinutes)
    }

    /// When main power came back. The year reads as 2000 and the seconds as 0.
    pub fn power_up_time(&mut self) -> Result<DateTime, Mcp7940Error<I2C::Error>> {
        self.read_power_fail_stamp(RegAddr::PowerUpMinutes)
    }

    fn read_power_fail_stamp(&mut self, start: RegAddr) -> Result<DateTime, Mcp7940Error<I2C::Error>> {
        let mut data = [0; 4];
        self.read_block(start, &mut data)?;
        RawTimestamp::from(data)
            .to_datetime()
            .map_err(Mcp7940Error::DateTime)
    }

    /// Reports whether the chip runs from an external clock (EXTOSC).
    pub fn external_oscillator(&mut self) -> Result<bool, Mcp7940Error<I2C::Error>> {
        Ok(self.read_field(Field::EXTOSC)? != 0)
    }

    /// Selects an external 32.768 kHz clock on X1 instead of the crystal.
    pub fn set_external_oscillator(&mut self, enabled: bool) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.write_field(Field::EXTOSC, u8::from(enabled))
    }

    /// Selected square wave frequency.
    pub fn square_wave_frequency(&mut self) -> Result<SquareWaveFrequency, Mcp7940Error<I2C::Error>> {
        Ok(self.read_field(Field::SQWFS)?.into())
    }

    /// Selects the square wave frequency and turns the output on or off in
    /// one register write.
    pub fn set_square_wave(
        &mut self,
        frequency: SquareWaveFrequency,
        enabled: bool,
    ) -> Result<(), Mcp7940Error<I2C::Error>> {
        let mut control = self.control()?;
        control.set_square_wave_frequency(frequency);
        control.set_square_wave_enable(enabled);
        self.set_control(control)
    }

    /// Reports whether the square wave drives MFP (SQWEN).
    pub fn square_wave_enabled(&mut self) -> Result<bool, Mcp7940Error<I2C::Error>> {
        Ok(self.read_field(Field::SQWEN)? != 0)
    }

    /// Turns the square wave output on or off, keeping the frequency.
    pub fn set_square_wave_enabled(&mut self, enabled: bool) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.write_field(Field::SQWEN, u8::from(enabled))
    }

    /// What currently drives MFP.
    pub fn mfp_mode(&mut self) -> Result<MfpMode, Mcp7940Error<I2C::Error>> {
        let control = self.control()?;
        Ok(if control.square_wave_enable() {
            MfpMode::SquareWave
        } else if control.alarm0_enable() || control.alarm1_enable() {
            MfpMode::Alarm
        } else {
            MfpMode::Output(control.output())
        })
    }

    /// Drives MFP as a general purpose output.
    ///
    /// # Returns
    /// * `Err(Mcp7940Error::MfpInUse)` while the square wave or an alarm owns the pin
    pub fn set_mfp(&mut self, level: bool) -> Result<(), Mcp7940Error<I2C::Error>> {
        let mut control = self.control()?;
        if control.square_wave_enable() || control.alarm0_enable() || control.alarm1_enable() {
            return Err(Mcp7940Error::MfpInUse);
        }
        control.set_output(level);
        self.set_control(control)
    }

    /// Applies a [`Config`].
    ///
    /// The control register is written once; the alarm polarity, the battery
    /// backup bit and the hour format are each updated with a
    /// read-modify-write.
    pub fn configure(&mut self, config: &Config) -> Result<(), Mcp7940Error<I2C::Error>> {
        debug!("MCP7940: configure {:?}", config);
        let mut control = self.control()?;
        control.set_square_wave_frequency(config.square_wave_frequency);
        control.set_square_wave_enable(config.square_wave_enabled);
        control.set_external_oscillator(config.external_oscillator);
        control.set_coarse_trim(config.coarse_trim);
        self.set_control(control)?;

        self.write_field(Field::ALMPOL, config.alarm_polarity.into())?;
        self.set_battery_backup(config.battery_backup)?;
        self.set_time_representation(config.time_representation)
    }

    /// Unix time of the last [`set`](Self::set), or of
    /// [`set_reference_time`](Self::set_reference_time).
    pub fn reference_time(&self) -> Option<u32> {
        self.reference_time
    }

    /// Overrides the calibration reference, e.g. with a value persisted across
    /// a reset. `None` forgets it.
    pub fn set_reference_time(&mut self, unix_time: Option<u32>) {
        self.reference_time = unix_time;
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use crate::registers::{AlarmPolarity, DEVICE_ADDRESS};
    use alloc::vec;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

    fn read(reg: u8, value: u8) -> I2cTrans {
        I2cTrans::write_read(DEVICE_ADDRESS, vec![reg], vec![value])
    }

    fn write(reg: u8, value: u8) -> I2cTrans {
        I2cTrans::write(DEVICE_ADDRESS, vec![reg, value])
    }

    fn dt(y: u16, mo: u8, d: u8, h: u8, mi: u8, s: u8) -> DateTime {
        DateTime::new(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_start_when_already_running() {
        let mock = I2cMock::new(&[read(0x00, 0x80), write(0x00, 0x80), read(0x03, 0x20)]);
        let mut dev = Mcp7940::new(mock);
        dev.start().unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_start_times_out() {
        let mock = I2cMock::new(&[
            read(0x00, 0x00),
            write(0x00, 0x80),
            read(0x03, 0x08),
            read(0x03, 0x08),
            read(0x03, 0x08),
        ]);
        let mut dev = Mcp7940::new(mock).with_oscillator_attempts(3);
        assert!(matches!(dev.start(), Err(Mcp7940Error::OscillatorTimeout)));
        dev.i2c.done();
    }

    #[test]
    fn test_stop_polls_until_oscillator_halts() {
        let mock = I2cMock::new(&[
            read(0x00, 0x85),
            write(0x00, 0x05),
            read(0x03, 0x20),
            read(0x03, 0x20),
            read(0x03, 0x00),
        ]);
        let mut dev = Mcp7940::new(mock);
        dev.stop().unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_now_24_hour() {
        let mock = I2cMock::new(&[I2cTrans::write_read(
            DEVICE_ADDRESS,
            vec![0x00],
            vec![0xB0, 0x15, 0x14, 0x2D, 0x14, 0x03, 0x24],
        )]);
        let mut dev = Mcp7940::new(mock);
        assert_eq!(dev.now().unwrap(), dt(2024, 3, 14, 14, 15, 30));
        dev.i2c.done();
    }

    #[test]
    fn test_now_12_hour() {
        let mock = I2cMock::new(&[I2cTrans::write_read(
            DEVICE_ADDRESS,
            vec![0x00],
            vec![0xB0, 0x15, 0x62, 0x2D, 0x14, 0x03, 0x24],
        )]);
        let mut dev = Mcp7940::new(mock);
        assert_eq!(dev.now().unwrap(), dt(2024, 3, 14, 14, 15, 30));
        dev.i2c.done();
    }

    #[test]
    fn test_now_rejects_garbage() {
        let mock = I2cMock::new(&[I2cTrans::write_read(
            DEVICE_ADDRESS,
            vec![0x00],
            vec![0xFF; 7],
        )]);
        let mut dev = Mcp7940::new(mock);
        assert!(matches!(
            dev.now(),
            Err(Mcp7940Error::DateTime(DateTimeError::InvalidDateTime))
        ));
        dev.i2c.done();
    }

    #[test]
    fn test_set_preserves_status_flags() {
        let mock = I2cMock::new(&[
            // stop
            read(0x00, 0x92),
            write(0x00, 0x12),
            read(0x03, 0x1A),
            // current block: PWRFAIL + VBATEN, 24-hour mode
            I2cTrans::write_read(
                DEVICE_ADDRESS,
                vec![0x00],
                vec![0x12, 0x34, 0x08, 0x1A, 0x01, 0x21, 0x23],
            ),
            I2cTrans::write(
                DEVICE_ADDRESS,
                vec![0x00, 0x30, 0x15, 0x14, 0x1D, 0x14, 0x23, 0x24],
            ),
            // start
            read(0x00, 0x30),
            write(0x00, 0xB0),
            read(0x03, 0x3D),
        ]);
        let mut dev = Mcp7940::new(mock);
        assert_eq!(dev.reference_time(), None);
        dev.set(&dt(2024, 3, 14, 14, 15, 30)).unwrap();
        assert_eq!(dev.reference_time(), Some(1_710_425_730));
        dev.i2c.done();
    }

    #[test]
    fn test_set_keeps_12_hour_format() {
        let mock = I2cMock::new(&[
            read(0x00, 0x80),
            write(0x00, 0x00),
            read(0x03, 0x08),
            I2cTrans::write_read(
                DEVICE_ADDRESS,
                vec![0x00],
                vec![0x00, 0x00, 0x52, 0x08, 0x01, 0x01, 0x24],
            ),
            I2cTrans::write(
                DEVICE_ADDRESS,
                vec![0x00, 0x00, 0x00, 0x52, 0x0C, 0x01, 0x01, 0x25],
            ),
            read(0x00, 0x00),
            write(0x00, 0x80),
            read(0x03, 0x29),
        ]);
        let mut dev = Mcp7940::new(mock);
        // 2025-01-01 is a Wednesday, midnight is 12 AM
        dev.set(&dt(2025, 1, 1, 0, 0, 0)).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_set_rejects_year_before_touching_bus() {
        let mock = I2cMock::new(&[]);
        let mut dev = Mcp7940::new(mock);
        assert!(matches!(
            dev.set(&dt(2100, 1, 1, 0, 0, 0)),
            Err(Mcp7940Error::DateTime(DateTimeError::YearOutOfRange))
        ));
        assert_eq!(dev.reference_time(), None);
        dev.i2c.done();
    }

    #[test]
    fn test_weekday() {
        let mock = I2cMock::new(&[read(0x03, 0x2B), read(0x03, 0x2B), write(0x03, 0x2E)]);
        let mut dev = Mcp7940::new(mock);
        assert_eq!(dev.weekday().unwrap(), Weekday::Tue);
        dev.set_weekday(Weekday::Fri).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_battery_and_power_fail_flags() {
        let mock = I2cMock::new(&[
            read(0x03, 0x39),
            read(0x03, 0x39),
            read(0x03, 0x39),
            write(0x03, 0x29),
            read(0x03, 0x29),
            write(0x03, 0x21),
        ]);
        let mut dev = Mcp7940::new(mock);
        assert!(dev.battery_backup().unwrap());
        assert!(dev.power_fail().unwrap());
        dev.clear_power_fail().unwrap();
        dev.set_battery_backup(false).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_power_fail_timestamps() {
        let mock = I2cMock::new(&[
            I2cTrans::write_read(DEVICE_ADDRESS, vec![0x18], vec![0x45, 0x71, 0x07, 0x72]),
            I2cTrans::write_read(DEVICE_ADDRESS, vec![0x1C], vec![0x50, 0x51, 0x08, 0x92]),
        ]);
        let mut dev = Mcp7940::new(mock);
        assert_eq!(dev.power_down_time().unwrap(), dt(2000, 12, 7, 23, 45, 0));
        assert_eq!(dev.power_up_time().unwrap(), dt(2000, 12, 8, 11, 50, 0));
        dev.i2c.done();
    }

    #[test]
    fn test_square_wave() {
        let mock = I2cMock::new(&[
            read(0x07, 0x90),
            write(0x07, 0xD3),
            read(0x07, 0xD3),
            read(0x07, 0xD3),
            read(0x07, 0xD3),
            write(0x07, 0x93),
        ]);
        let mut dev = Mcp7940::new(mock);
        dev.set_square_wave(SquareWaveFrequency::Hz32768, true).unwrap();
        assert_eq!(dev.square_wave_frequency().unwrap(), SquareWaveFrequency::Hz32768);
        assert!(dev.square_wave_enabled().unwrap());
        dev.set_square_wave_enabled(false).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_mfp_output() {
        let mock = I2cMock::new(&[
            read(0x07, 0x00),
            write(0x07, 0x80),
            read(0x07, 0x80),
            read(0x07, 0x10),
            read(0x07, 0x50),
            read(0x07, 0x20),
            read(0x07, 0x40),
        ]);
        let mut dev = Mcp7940::new(mock);
        dev.set_mfp(true).unwrap();
        assert_eq!(dev.mfp_mode().unwrap(), MfpMode::Output(true));
        assert!(matches!(dev.set_mfp(false), Err(Mcp7940Error::MfpInUse)));
        assert!(matches!(dev.set_mfp(false), Err(Mcp7940Error::MfpInUse)));
        assert_eq!(dev.mfp_mode().unwrap(), MfpMode::Alarm);
        assert_eq!(dev.mfp_mode().unwrap(), MfpMode::SquareWave);
        dev.i2c.done();
    }

    #[test]
    fn test_external_oscillator() {
        let mock = I2cMock::new(&[read(0x07, 0x00), write(0x07, 0x08), read(0x07, 0x08)]);
        let mut dev = Mcp7940::new(mock);
        dev.set_external_oscillator(true).unwrap();
        assert!(dev.external_oscillator().unwrap());
        dev.i2c.done();
    }

    #[test]
    fn test_configure_converts_hour_format() {
        let config = Config {
            time_representation: TimeRepresentation::TwelveHour,
            square_wave_frequency: SquareWaveFrequency::Hz4096,
            square_wave_enabled: true,
            alarm_polarity: AlarmPolarity::ActiveHigh,
            ..Config::default()
        };
        let mock = I2cMock::new(&[
            read(0x07, 0x84),
            write(0x07, 0xC1),
            read(0x0D, 0x00),
            write(0x0D, 0x80),
            read(0x03, 0x20),
            write(0x03, 0x28),
            read(0x02, 0x14),
            write(0x02, 0x62),
        ]);
        let mut dev = Mcp7940::new(mock);
        dev.configure(&config).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_same_hour_format_is_not_rewritten() {
        let mock = I2cMock::new(&[read(0x02, 0x62), read(0x02, 0x62)]);
        let mut dev = Mcp7940::new(mock);
        assert_eq!(
            dev.time_representation().unwrap(),
            TimeRepresentation::TwelveHour
        );
        dev.set_time_representation(TimeRepresentation::TwelveHour)
            .unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_reference_time_override() {
        let mock = I2cMock::new(&[]);
        let mut dev = Mcp7940::new(mock);
        dev.set_reference_time(Some(1_700_000_000));
        assert_eq!(dev.reference_time(), Some(1_700_000_000));
        dev.set_reference_time(None);
        assert_eq!(dev.reference_time(), None);
        dev.i2c.done();
    }
}
