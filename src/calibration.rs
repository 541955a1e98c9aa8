//! Crystal drift compensation through the OSCTRIM register.
//!
//! In fine trim mode the chip adds or subtracts two oscillator cycles per
//! trim step once a minute, so one step is 2 / (32768 * 60) ≈ 1.017 ppm.
//! A positive trim subtracts cycles and slows a fast clock down.
//!
//! The deviation can be measured two ways: by comparing the clock against a
//! known correct time some while after it was set, or by measuring the square
//! wave output with a frequency counter.

use embedded_hal::i2c::I2c;

use crate::datetime::DateTime;
use crate::registers::{Field, OscTrim};
use crate::{Mcp7940, Mcp7940Error};

/// Trim steps per ppm of deviation in fine trim mode (32768 * 60 / 2 / 1e6).
const STEPS_PER_PPM: f32 = 0.983_04;

/// Largest deviation the trim register can correct.
pub const MAX_CORRECTABLE_PPM: f32 = 127.0 / STEPS_PER_PPM;

/// Converts a deviation in ppm (positive means the clock runs fast) to the
/// nearest number of fine trim steps. The result isn't clamped to the trim
/// range and saturates at the `i32` limits.
pub fn ppm_to_trim(ppm: f32) -> i32 {
    let steps = ppm * STEPS_PER_PPM;
    // round half away from zero; `as` saturates
    if steps >= 0.0 {
        (steps + 0.5) as i32
    } else {
        (steps - 0.5) as i32
    }
}

// Deviation of the device clock from the actual time since `reference`, or
// None if no time has passed.
fn ppm_between(reference: u32, device: &DateTime, actual: &DateTime) -> Option<f32> {
    let actual_elapsed = actual.timestamp() - i64::from(reference);
    if actual_elapsed <= 0 {
        return None;
    }
    let device_elapsed = device.timestamp() - i64::from(reference);
    Some((device_elapsed - actual_elapsed) as f32 * 1_000_000.0 / actual_elapsed as f32)
}

impl<I2C: I2c> Mcp7940<I2C> {
    /// Current trim value. Positive values slow the clock down.
    pub fn trim(&mut self) -> Result<i8, Mcp7940Error<I2C::Error>> {
        Ok(self.osc_trim()?.trim())
    }

    /// Writes a trim value, clamped to -127..=127, and returns what was
    /// written.
    pub fn set_trim(&mut self, trim: i32) -> Result<i8, Mcp7940Error<I2C::Error>> {
        self.apply_trim(trim)
    }

    fn apply_trim(&mut self, trim: i32) -> Result<i8, Mcp7940Error<I2C::Error>> {
        let value = OscTrim::from_trim(trim);
        if value.trim() as i32 != trim {
            warn!("MCP7940: trim {} clamped to {}", trim, value.trim());
        }
        self.set_osc_trim(value)?;
        debug!("MCP7940: trim set to {}", value.trim());
        Ok(value.trim())
    }

    /// Drift of the clock since the reference time, in ppm. Positive means
    /// the clock runs fast.
    ///
    /// # Arguments
    /// * `actual` - The correct current time
    ///
    /// # Returns
    /// * `Err(Mcp7940Error::NoReferenceTime)` if the clock was never set, or
    ///   `actual` isn't later than the reference
    pub fn ppm_deviation(&mut self, actual: &DateTime) -> Result<f32, Mcp7940Error<I2C::Error>> {
        let reference = self.reference_time.ok_or(Mcp7940Error::NoReferenceTime)?;
        let device = self.now()?;
        ppm_between(reference, &device, actual).ok_or(Mcp7940Error::NoReferenceTime)
    }

    /// Measures the drift against `actual`, corrects the clock to `actual`
    /// and adjusts the trim to compensate. Returns the new trim.
    ///
    /// The longer the clock has run since it was set, the more accurate the
    /// correction.
    pub fn calibrate(&mut self, actual: &DateTime) -> Result<i8, Mcp7940Error<I2C::Error>> {
        let ppm = self.ppm_deviation(actual)?;
        self.calibrate_with_deviation(actual, ppm)
    }

    /// Like [`calibrate`](Self::calibrate), but when the drift is beyond what
    /// the trim can correct only the time is fixed and the trim is left
    /// alone. Returns the trim in effect afterwards.
    pub fn calibrate_or_adjust(&mut self, actual: &DateTime) -> Result<i8, Mcp7940Error<I2C::Error>> {
        let ppm = self.ppm_deviation(actual)?;
        if ppm > MAX_CORRECTABLE_PPM || ppm < -MAX_CORRECTABLE_PPM {
            warn!("MCP7940: drift of {} ppm can't be trimmed, adjusting time only", ppm);
            self.set(actual)?;
            return self.trim();
        }
        self.calibrate_with_deviation(actual, ppm)
    }

    fn calibrate_with_deviation(
        &mut self,
        actual: &DateTime,
        ppm: f32,
    ) -> Result<i8, Mcp7940Error<I2C::Error>> {
        debug!("MCP7940: measured drift {} ppm", ppm);
        self.set(actual)?;
        let current = self.trim()?;
        self.apply_trim(i32::from(current).saturating_add(ppm_to_trim(ppm)))
    }

    /// Adjusts the trim from a measurement of the square wave output in hertz.
    ///
    /// The nominal frequency is taken from the selected output. The 1, 4096
    /// and 8192 Hz outputs already include the current trim, so the correction
    /// is added to it. The 32.768 kHz output comes straight from the crystal,
    /// so the correction replaces the current trim.
    pub fn calibrate_frequency(&mut self, measured_hz: f32) -> Result<i8, Mcp7940Error<I2C::Error>> {
        let frequency = self.square_wave_frequency()?;
        let ideal = frequency.hz() as f32;
        let ppm = (measured_hz - ideal) * 1_000_000.0 / ideal;
        let correction = ppm_to_trim(ppm);
        debug!(
            "MCP7940: measured {} Hz against {} Hz, {} ppm",
            measured_hz,
            frequency.hz(),
            ppm
        );
        if frequency.is_trimmed() {
            let current = self.trim()?;
            self.apply_trim(i32::from(current).saturating_add(correction))
        } else {
            self.apply_trim(correction)
        }
    }

    /// Reports whether coarse trim mode (CRSTRIM) is on.
    pub fn coarse_trim(&mut self) -> Result<bool, Mcp7940Error<I2C::Error>> {
        Ok(self.read_field(Field::CRSTRIM)? != 0)
    }

    /// Switches coarse trim mode, where the trim is applied 128 times a
    /// second instead of once a minute. [`ppm_to_trim`] assumes fine mode.
    pub fn set_coarse_trim(&mut self, enabled: bool) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.write_field(Field::CRSTRIM, u8::from(enabled))
    }
}
