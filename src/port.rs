//! Transceiver port bitmaps
//!
//! Port CPLDs report one bit per SFP cage, eight cages to a register. A
//! [`PortBitmap`] stitches a list of such registers into a single `u64`,
//! register `i` supplying bits `8*i..8*i+7`.
//!
//! QSFP control registers are smaller but their bit order does not follow the
//! front panel. [`PermutedPorts`] applies a [`BitPermutation`] so that bit `n`
//! of the value is the `n`th cage as labelled on the panel.

use crate::Error;
use crate::registry::RegisterAccess;

/// Status bits of a run of ports spread over several registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortBitmap {
    /// Register ids, lowest ports first (at most 8)
    pub registers: &'static [u32],
    /// Signal is active-low and is inverted on access
    pub active_low: bool,
}

impl PortBitmap {
    /// Create a bitmap over `registers`
    ///
    /// # Panics
    ///
    /// Panics if more than 8 registers are given.
    #[must_use]
    pub const fn new(registers: &'static [u32], active_low: bool) -> Self {
        assert!(registers.len() <= 8, "port bitmap exceeds 64 bits");
        Self {
            registers,
            active_low,
        }
    }

    /// Number of ports covered
    #[must_use]
    pub const fn ports(&self) -> usize {
        self.registers.len() * 8
    }

    /// Mask of all valid port bits
    #[must_use]
    pub const fn mask(&self) -> u64 {
        if self.ports() >= 64 {
            u64::MAX
        } else {
            (1u64 << self.ports()) - 1
        }
    }

    const fn from_hw(&self, raw: u8) -> u8 {
        if self.active_low { !raw } else { raw }
    }

    /// Read every register and assemble the bitmap
    ///
    /// # Errors
    ///
    /// Returns the first register access error.
    pub fn read<A: RegisterAccess>(&self, regs: &mut A) -> Result<u64, Error<A::BusError>> {
        let mut bitmap = 0u64;
        for (i, &register) in self.registers.iter().enumerate() {
            let raw = regs.read_register(register)?;
            bitmap |= u64::from(self.from_hw(raw)) << (i * 8);
        }
        Ok(bitmap)
    }

    /// Split `bitmap` over the registers and write each one
    ///
    /// Writing stops at the first failure, leaving later registers
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if `bitmap` has bits beyond the last
    /// port, or the first register access error.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write<A: RegisterAccess>(&self, regs: &mut A, bitmap: u64) -> Result<(), Error<A::BusError>> {
        if bitmap & !self.mask() != 0 {
            return Err(Error::InvalidValue);
        }
        for (i, &register) in self.registers.iter().enumerate() {
            let byte = (bitmap >> (i * 8)) as u8;
            regs.write_register(register, self.from_hw(byte))?;
        }
        Ok(())
    }

    /// Read the bit of a single port (0-based)
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for a port outside the bitmap, or the
    /// register access error.
    pub fn port_bit<A: RegisterAccess>(&self, regs: &mut A, port: usize) -> Result<bool, Error<A::BusError>> {
        let register = *self.registers.get(port / 8).ok_or(Error::InvalidValue)?;
        let raw = self.from_hw(regs.read_register(register)?);
        Ok(raw & (1 << (port % 8)) != 0)
    }

    /// Change the bit of a single port (0-based), leaving its neighbours alone
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for a port outside the bitmap, or the
    /// register access error.
    pub fn set_port_bit<A: RegisterAccess>(
        &self,
        regs: &mut A,
        port: usize,
        on: bool,
    ) -> Result<(), Error<A::BusError>> {
        let register = *self.registers.get(port / 8).ok_or(Error::InvalidValue)?;
        let bit = 1u8 << (port % 8);
        // Hardware level for "on" flips with the polarity
        if on != self.active_low {
            regs.modify_register(register, 0, bit)?;
        } else {
            regs.modify_register(register, bit, 0)?;
        }
        Ok(())
    }
}

/// Mapping between hardware bit order and front-panel order
///
/// `read[i]` is the front-panel bit for hardware bit `i`; `write[i]` is the
/// hardware bit for front-panel bit `i`. The two tables must be inverse
/// permutations of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitPermutation {
    /// Front-panel bit masks indexed by hardware bit
    pub read: &'static [u8],
    /// Hardware bit masks indexed by front-panel bit
    pub write: &'static [u8],
}

impl BitPermutation {
    /// Create a permutation from its two tables
    ///
    /// # Panics
    ///
    /// Panics if the tables differ in length or exceed 8 entries.
    #[must_use]
    pub const fn new(read: &'static [u8], write: &'static [u8]) -> Self {
        assert!(read.len() == write.len(), "permutation tables differ in length");
        assert!(read.len() <= 8, "permutation exceeds one register");
        Self { read, write }
    }

    /// Mask of the bits taking part in the permutation
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn mask(&self) -> u8 {
        ((1u16 << self.read.len()) - 1) as u8
    }

    /// Reorder a hardware byte into front-panel order
    #[must_use]
    pub fn to_panel(&self, hw: u8) -> u8 {
        Self::apply(self.read, hw)
    }

    /// Reorder a front-panel value into hardware order
    #[must_use]
    pub fn to_hardware(&self, panel: u8) -> u8 {
        Self::apply(self.write, panel)
    }

    fn apply(table: &[u8], value: u8) -> u8 {
        table
            .iter()
            .enumerate()
            .filter(|&(i, _)| value & (1 << i) != 0)
            .fold(0, |acc, (_, &bit)| acc | bit)
    }
}

/// One QSFP control or status register in front-panel order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PermutedPorts {
    /// Register id
    pub register: u32,
    /// Bit reordering between hardware and panel
    pub permutation: BitPermutation,
    /// Signal is active-low and is inverted on access
    pub active_low: bool,
    /// Register may be written
    pub writable: bool,
}

impl PermutedPorts {
    /// Describe a read-only, active-high register
    #[must_use]
    pub const fn new(register: u32, permutation: BitPermutation) -> Self {
        Self {
            register,
            permutation,
            active_low: false,
            writable: false,
        }
    }

    /// Mark the signal as active-low
    #[must_use]
    pub const fn active_low(mut self) -> Self {
        self.active_low = true;
        self
    }

    /// Allow writes
    #[must_use]
    pub const fn writable(mut self) -> Self {
        self.writable = true;
        self
    }

    /// Read the register in front-panel order, positive logic
    ///
    /// # Errors
    ///
    /// Returns the register access error.
    pub fn read<A: RegisterAccess>(&self, regs: &mut A) -> Result<u8, Error<A::BusError>> {
        let raw = regs.read_register(self.register)?;
        let mut value = self.permutation.to_panel(raw);
        if self.active_low {
            value = !value;
        }
        Ok(value & self.permutation.mask())
    }

    /// Write a front-panel ordered value
    ///
    /// The whole register is replaced; bits above the permutation are
    /// written as zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] for read-only registers,
    /// [`Error::InvalidValue`] if `value` has bits above the permutation, or
    /// the register access error.
    pub fn write<A: RegisterAccess>(&self, regs: &mut A, value: u8) -> Result<(), Error<A::BusError>> {
        if !self.writable {
            return Err(Error::ReadOnly);
        }
        let mask = self.permutation.mask();
        if value & !mask != 0 {
            return Err(Error::InvalidValue);
        }
        let mut raw = self.permutation.to_hardware(value);
        if self.active_low {
            raw = !raw;
        }
        regs.write_register(self.register, raw & mask)
    }

    /// Read the bit of one front-panel port (0-based)
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for a port outside the register, or
    /// the register access error.
    pub fn port_bit<A: RegisterAccess>(&self, regs: &mut A, port: usize) -> Result<bool, Error<A::BusError>> {
        if port >= self.permutation.read.len() {
            return Err(Error::InvalidValue);
        }
        Ok(self.read(regs)? & (1 << port) != 0)
    }
}
