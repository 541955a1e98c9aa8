//! The 64 bytes of battery-backed SRAM at 0x20-0x5F.
//!
//! SRAM addresses are relative to the start of the SRAM window. A transfer
//! that runs past the last byte wraps around to the first one.

use embedded_hal::i2c::I2c;

use crate::registers::{RegAddr, SRAM_SIZE};
use crate::{Mcp7940, Mcp7940Error};

// Splits a transfer of `len` bytes starting at `addr` at the end of the window.
fn check_range<E>(addr: u8, len: usize) -> Result<usize, Mcp7940Error<E>> {
    let size = usize::from(SRAM_SIZE);
    if addr >= SRAM_SIZE || len > size {
        warn!("MCP7940: SRAM access of {} bytes at {} out of range", len, addr);
        return Err(Mcp7940Error::SramOutOfRange);
    }
    Ok(len.min(size - usize::from(addr)))
}

fn register(addr: u8) -> u8 {
    u8::from(RegAddr::Sram) + addr
}

impl<I2C: I2c> Mcp7940<I2C> {
    /// Reads `buf.len()` bytes of SRAM starting at `addr`.
    ///
    /// # Errors
    ///
    /// [`Mcp7940Error::SramOutOfRange`] if `addr` is 64 or more, or the
    /// buffer is longer than 64 bytes.
    pub fn read_sram(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), Mcp7940Error<I2C::Error>> {
        let head = check_range(addr, buf.len())?;
        let (first, wrapped) = buf.split_at_mut(head);
        self.read_block(register(addr), first)?;
        if !wrapped.is_empty() {
            self.read_block(RegAddr::Sram, wrapped)?;
        }
        Ok(())
    }

    /// Writes `data` to SRAM starting at `addr`.
    ///
    /// # Errors
    ///
    /// [`Mcp7940Error::SramOutOfRange`] if `addr` is 64 or more, or `data`
    /// is longer than 64 bytes.
    pub fn write_sram(&mut self, addr: u8, data: &[u8]) -> Result<(), Mcp7940Error<I2C::Error>> {
        let head = check_range(addr, data.len())?;
        let (first, wrapped) = data.split_at(head);
        self.write_block(register(addr), first)?;
        if !wrapped.is_empty() {
            self.write_block(RegAddr::Sram, wrapped)?;
        }
        Ok(())
    }

    /// Reads one SRAM byte.
    pub fn read_sram_byte(&mut self, addr: u8) -> Result<u8, Mcp7940Error<I2C::Error>> {
        let mut data = [0];
        self.read_sram(addr, &mut data)?;
        Ok(data[0])
    }

    /// Writes one SRAM byte.
    pub fn write_sram_byte(&mut self, addr: u8, value: u8) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.write_sram(addr, &[value])
    }
}
