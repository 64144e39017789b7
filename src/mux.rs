//! Transceiver EEPROM channel selection
//!
//! On boards without a dedicated I2C mux chip, each port CPLD exposes a
//! select register that routes one cage's EEPROM onto a shared bus. Writing
//! a cage number connects it; writing the idle value disconnects every cage.

use crate::Error;
use crate::logging::error;
use crate::registry::RegisterAccess;

/// Select value that disconnects every channel
pub const IDLE: u8 = 0xff;

/// A run of consecutive channels served by one select register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MuxRange {
    /// First channel of the run
    pub first_channel: u8,
    /// Number of channels in the run
    pub count: u8,
    /// Register id of the select register
    pub select_register: u32,
    /// Select value substitutions, as `(computed, written)` pairs
    pub remap: &'static [(u8, u8)],
}

impl MuxRange {
    /// Channels `first_channel..first_channel + count` written as
    /// `channel - first_channel` to `select_register`
    #[must_use]
    pub const fn new(first_channel: u8, count: u8, select_register: u32) -> Self {
        Self {
            first_channel,
            count,
            select_register,
            remap: &[],
        }
    }

    /// Substitute some computed select values before writing them
    #[must_use]
    pub const fn with_remap(mut self, remap: &'static [(u8, u8)]) -> Self {
        self.remap = remap;
        self
    }

    /// Whether `channel` belongs to this range
    #[must_use]
    pub const fn contains(&self, channel: u8) -> bool {
        channel >= self.first_channel && channel - self.first_channel < self.count
    }

    /// Select value for a channel of this range
    #[must_use]
    pub fn select_value(&self, channel: u8) -> Option<u8> {
        if !self.contains(channel) {
            return None;
        }
        let value = channel - self.first_channel;
        Some(
            self.remap
                .iter()
                .find(|&&(from, _)| from == value)
                .map_or(value, |&(_, to)| to),
        )
    }
}

/// CPLD-driven EEPROM mux
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortMux {
    /// Channel ranges, one per select register
    pub ranges: &'static [MuxRange],
    /// Value written to every select register on deselect
    pub idle: u8,
}

impl PortMux {
    /// Create a mux that idles with [`IDLE`]
    #[must_use]
    pub const fn new(ranges: &'static [MuxRange]) -> Self {
        Self { ranges, idle: IDLE }
    }

    /// Total number of channels
    #[must_use]
    pub fn channels(&self) -> usize {
        self.ranges.iter().map(|range| usize::from(range.count)).sum()
    }

    /// Register id and value that select `channel`
    #[must_use]
    pub fn route(&self, channel: u8) -> Option<(u32, u8)> {
        self.ranges
            .iter()
            .find_map(|range| Some((range.select_register, range.select_value(channel)?)))
    }

    /// Connect `channel`
    ///
    /// A failed write is reported, not retried, and the previous selection
    /// state is then unknown.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for a channel outside every range, or
    /// the register access error.
    pub fn select<A: RegisterAccess>(&self, regs: &mut A, channel: u8) -> Result<(), Error<A::BusError>> {
        let Some((register, value)) = self.route(channel) else {
            error!("invalid mux channel number {}", channel);
            return Err(Error::InvalidValue);
        };
        regs.write_register(register, value)
    }

    /// Disconnect every channel
    ///
    /// Every select register is written even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the first register access error.
    pub fn deselect<A: RegisterAccess>(&self, regs: &mut A) -> Result<(), Error<A::BusError>> {
        let mut result = Ok(());
        for range in self.ranges {
            let written = regs.write_register(range.select_register, self.idle);
            if result.is_ok() {
                result = written;
            }
        }
        result
    }
}
