#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod address;
pub mod attribute;
pub mod boards;
pub mod field;
pub mod interface;
pub mod mux;
pub mod port;
pub mod registry;
pub mod status;

mod logging;

// Re-export main types
pub use address::{AddressError, AddressLayout, RegisterAddress};
pub use attribute::{Attribute, AttributeKind, AttributeTable, Scale};
pub use field::{BitField, EnumEntry, FieldInput, Value};
pub use interface::{I2cInterface, IoPortInterface, PortIo, Transport, WriteRetry};
pub use mux::{MuxRange, PortMux};
pub use port::{BitPermutation, PermutedPorts, PortBitmap};
pub use registry::{ChipRegistry, RegisterAccess};
pub use status::{StatusGroup, StatusRule, Summary};

/// Driver errors
///
/// `E` is the error type of the underlying transport.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// A single-byte bus transfer failed
    Bus {
        /// Chip index in the device registry
        chip: u8,
        /// Bus address of the chip (I2C address or I/O port base)
        address: u16,
        /// Register offset inside the chip
        offset: u8,
        /// Error reported by the transport
        source: E,
    },
    /// Register id selects a chip that is not configured (contains the raw id)
    InvalidChip(u32),
    /// Register offset overlaps the chip index bits (contains the raw id)
    InvalidOffset(u32),
    /// Value is not a recognized name or does not fit the field
    InvalidValue,
    /// Attempt to write a read-only field or attribute
    ReadOnly,
    /// No attribute with the requested name
    UnknownAttribute,
    /// The text sink rejected the rendered value
    Format,
}

impl<E> From<AddressError> for Error<E> {
    fn from(error: AddressError) -> Self {
        match error {
            AddressError::InvalidChip(id) => Self::InvalidChip(id),
            AddressError::InvalidOffset(id) => Self::InvalidOffset(id),
        }
    }
}

impl<E> From<core::fmt::Error> for Error<E> {
    fn from(_: core::fmt::Error) -> Self {
        Self::Format
    }
}
