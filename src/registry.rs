//! Device registry and register access
//!
//! A [`ChipRegistry`] owns one transport per CPLD on the board together with
//! the board's [`AddressLayout`]. It is built once during bring-up and passed
//! by `&mut` to everything that touches registers.
//!
//! The registry is not internally synchronized: every access takes
//! `&mut self`, so sharing one between threads requires the caller's own
//! mutex. A read-modify-write is one logical operation only as far as that
//! outer lock makes it one.

use crate::Error;
use crate::address::{AddressLayout, RegisterAddress};
use crate::interface::Transport;
use crate::logging::error;

/// Single-byte register access by chip index and offset
///
/// Implemented by [`ChipRegistry`]; test code and alternative registries can
/// implement it directly. The id-based helpers decode through
/// [`RegisterAccess::layout`] before dispatching.
pub trait RegisterAccess {
    /// Error type of the underlying transports
    type BusError;

    /// Layout used to decode register ids
    fn layout(&self) -> &AddressLayout;

    /// Read one byte from `offset` on chip `chip`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChip`] if the chip is not configured and
    /// [`Error::Bus`] if the transfer fails.
    fn read(&mut self, chip: u8, offset: u8) -> Result<u8, Error<Self::BusError>>;

    /// Write one byte to `offset` on chip `chip`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChip`] if the chip is not configured and
    /// [`Error::Bus`] if the transfer fails.
    fn write(&mut self, chip: u8, offset: u8, value: u8) -> Result<(), Error<Self::BusError>>;

    /// Resolve a register id, logging it when it selects no chip
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChip`] for ids outside the layout.
    fn resolve(&self, id: u32) -> Result<RegisterAddress, Error<Self::BusError>> {
        self.layout().decode(id).map_err(|e| {
            error!("invalid CPLD register [{:#x}]", id);
            Error::from(e)
        })
    }

    /// Read the register identified by `id`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChip`] for ids outside the layout and
    /// [`Error::Bus`] if the transfer fails.
    fn read_register(&mut self, id: u32) -> Result<u8, Error<Self::BusError>> {
        let address = self.resolve(id)?;
        self.read(address.chip, address.offset)
    }

    /// Write the register identified by `id`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChip`] for ids outside the layout and
    /// [`Error::Bus`] if the transfer fails.
    fn write_register(&mut self, id: u32, value: u8) -> Result<(), Error<Self::BusError>> {
        let address = self.resolve(id)?;
        self.write(address.chip, address.offset, value)
    }

    /// Clear then set bits in the register identified by `id`
    ///
    /// Reads the register, applies `(value & !clear) | set` and writes the
    /// result back, returning the written byte. The write is skipped if the
    /// read fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChip`] for ids outside the layout and
    /// [`Error::Bus`] if either transfer fails.
    fn modify_register(&mut self, id: u32, clear: u8, set: u8) -> Result<u8, Error<Self::BusError>> {
        let address = self.resolve(id)?;
        let value = (self.read(address.chip, address.offset)? & !clear) | set;
        self.write(address.chip, address.offset, value)?;
        Ok(value)
    }
}

/// The board's CPLD transports, indexed by chip
pub struct ChipRegistry<T, const N: usize> {
    layout: AddressLayout,
    chips: [T; N],
}

impl<T, const N: usize> ChipRegistry<T, N> {
    /// Create a registry from a layout and one transport per chip
    ///
    /// Chip `i` of the layout is served by `chips[i]`. If the layout names
    /// more chips than transports were supplied, accesses to the missing ones
    /// fail with [`Error::InvalidChip`].
    pub const fn new(layout: AddressLayout, chips: [T; N]) -> Self {
        Self { layout, chips }
    }

    /// Borrow the transport of one chip
    pub fn chip(&self, chip: u8) -> Option<&T> {
        self.chips.get(usize::from(chip))
    }

    /// Mutably borrow the transport of one chip
    pub fn chip_mut(&mut self, chip: u8) -> Option<&mut T> {
        self.chips.get_mut(usize::from(chip))
    }

    /// Consume the registry and return the transports
    pub fn release(self) -> [T; N] {
        self.chips
    }
}

impl<T: Transport, const N: usize> ChipRegistry<T, N> {
    fn transport(&mut self, chip: u8, offset: u8) -> Result<&mut T, Error<T::Error>> {
        let id = self.layout.pack(chip, offset);
        if chip >= self.layout.chip_count() {
            error!("access to invalid CPLD register [{:#x}]", id);
            return Err(Error::InvalidChip(id));
        }
        self.chips.get_mut(usize::from(chip)).ok_or_else(|| {
            error!("no transport for CPLD register [{:#x}]", id);
            Error::InvalidChip(id)
        })
    }
}

impl<T: Transport, const N: usize> RegisterAccess for ChipRegistry<T, N> {
    type BusError = T::Error;

    fn layout(&self) -> &AddressLayout {
        &self.layout
    }

    fn read(&mut self, chip: u8, offset: u8) -> Result<u8, Error<Self::BusError>> {
        let transport = self.transport(chip, offset)?;
        let mut value = [0u8; 1];
        match transport.read_register(offset, 8, &mut value) {
            Ok(()) => Ok(value[0]),
            Err(source) => {
                let address = transport.bus_address();
                error!("CPLD read error - addr: {:#x}, offset: {:#x}", address, offset);
                Err(Error::Bus {
                    chip,
                    address,
                    offset,
                    source,
                })
            }
        }
    }

    fn write(&mut self, chip: u8, offset: u8, value: u8) -> Result<(), Error<Self::BusError>> {
        let transport = self.transport(chip, offset)?;
        transport.write_register(offset, 8, &[value]).map_err(|source| {
            let address = transport.bus_address();
            error!(
                "CPLD write error - addr: {:#x}, offset: {:#x}, value: {:#x}",
                address, offset, value
            );
            Error::Bus {
                chip,
                address,
                offset,
                source,
            }
        })
    }
}
