//! Logical register ids
//!
//! Boards with several CPLDs present them as one flat register space: each
//! register id carries the chip index in a small bit field above the register
//! offset. An [`AddressLayout`] describes where that field lives for a given
//! board, and converts between ids and [`RegisterAddress`] pairs.
//!
//! ```
//! use switch_cpld::address::{AddressLayout, RegisterAddress};
//!
//! // Two index bits at bit 6, chips numbered from 1 in the id, three chips.
//! const LAYOUT: AddressLayout = AddressLayout::one_based(6, 2, 3);
//! const PSU_STATUS: u32 = LAYOUT.reg(0, 0x02);
//!
//! assert_eq!(PSU_STATUS, 0x42);
//! assert_eq!(LAYOUT.decode(PSU_STATUS), Ok(RegisterAddress::new(0, 0x02)));
//! ```

/// A register resolved to a physical chip and an offset within it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterAddress {
    /// Index of the chip in the board's device registry
    pub chip: u8,
    /// Register offset inside the chip
    pub offset: u8,
}

impl RegisterAddress {
    /// Create a new address
    #[must_use]
    pub const fn new(chip: u8, offset: u8) -> Self {
        Self { chip, offset }
    }
}

/// Failure to convert between a register id and a [`RegisterAddress`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressError {
    /// The id selects a chip the board does not have (contains the raw id)
    InvalidChip(u32),
    /// The offset does not fit below the chip index bits (contains the raw id)
    InvalidOffset(u32),
}

/// Placement of the chip index inside a register id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AddressLayout {
    shift: u8,
    index_bits: u8,
    first_chip: u8,
    chip_count: u8,
}

impl AddressLayout {
    /// Layout whose index field holds the chip index directly
    ///
    /// # Panics
    ///
    /// Panics (at compile time when used in a `const`) if `chip_count` chips
    /// do not fit in `index_bits` bits or the id would exceed 32 bits.
    #[must_use]
    pub const fn new(shift: u8, index_bits: u8, chip_count: u8) -> Self {
        Self::with_first_chip(shift, index_bits, 0, chip_count)
    }

    /// Layout whose index field numbers chips from 1
    ///
    /// An index field of zero then selects no chip at all, which catches
    /// register ids built without a chip tag.
    ///
    /// # Panics
    ///
    /// Same conditions as [`AddressLayout::new`].
    #[must_use]
    pub const fn one_based(shift: u8, index_bits: u8, chip_count: u8) -> Self {
        Self::with_first_chip(shift, index_bits, 1, chip_count)
    }

    /// Layout with an arbitrary index field value for chip 0
    ///
    /// # Panics
    ///
    /// Same conditions as [`AddressLayout::new`].
    #[must_use]
    pub const fn with_first_chip(shift: u8, index_bits: u8, first_chip: u8, chip_count: u8) -> Self {
        assert!(index_bits >= 1 && index_bits <= 8, "index field must be 1 to 8 bits");
        assert!((shift as u32) + (index_bits as u32) <= 32, "register id exceeds 32 bits");
        assert!(
            (first_chip as u32) + (chip_count as u32) <= 1u32 << index_bits,
            "chips do not fit in the index field"
        );
        Self {
            shift,
            index_bits,
            first_chip,
            chip_count,
        }
    }

    /// Bit position of the chip index field
    #[must_use]
    pub const fn shift(&self) -> u8 {
        self.shift
    }

    /// Number of chips addressable through this layout
    #[must_use]
    pub const fn chip_count(&self) -> u8 {
        self.chip_count
    }

    /// Mask covering the chip index field
    #[must_use]
    pub const fn index_mask(&self) -> u32 {
        ((1u32 << self.index_bits) - 1) << self.shift
    }

    /// Mask covering the offset bits
    ///
    /// Offsets are single bytes, so with the index field above bit 8 the bits
    /// in between belong to neither field.
    #[must_use]
    pub const fn offset_mask(&self) -> u32 {
        let bits = if self.shift > 8 { 8 } else { self.shift };
        (1u32 << bits) - 1
    }

    /// Pack a chip index and offset without any validation
    ///
    /// Used to report the id a caller asked for when it turns out invalid.
    #[must_use]
    pub const fn pack(&self, chip: u8, offset: u8) -> u32 {
        let field = (chip as u32).wrapping_add(self.first_chip as u32);
        (field << self.shift) | offset as u32
    }

    /// Build a register id for use in `const` register tables
    ///
    /// # Panics
    ///
    /// Panics (at compile time in a `const`) if the chip or offset is out of
    /// range. Use [`AddressLayout::encode`] for runtime values.
    #[must_use]
    pub const fn reg(&self, chip: u8, offset: u8) -> u32 {
        assert!(chip < self.chip_count, "chip index out of range");
        assert!((offset as u32) <= self.offset_mask(), "offset overlaps chip index bits");
        self.pack(chip, offset)
    }

    /// Encode an address into a register id
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::InvalidChip`] if the chip is not part of the
    /// layout and [`AddressError::InvalidOffset`] if the offset would spill
    /// into the chip index bits.
    pub const fn encode(&self, address: RegisterAddress) -> Result<u32, AddressError> {
        let id = self.pack(address.chip, address.offset);
        if address.chip >= self.chip_count {
            return Err(AddressError::InvalidChip(id));
        }
        if (address.offset as u32) > self.offset_mask() {
            return Err(AddressError::InvalidOffset(id));
        }
        Ok(id)
    }

    /// Decode a register id into its chip index and offset
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::InvalidChip`] if the index field selects no
    /// configured chip, or if bits above the index field are set.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn decode(&self, id: u32) -> Result<RegisterAddress, AddressError> {
        if id & !(self.index_mask() | self.offset_mask()) != 0 {
            return Err(AddressError::InvalidChip(id));
        }

        let field = (id & self.index_mask()) >> self.shift;
        if field < self.first_chip as u32 {
            return Err(AddressError::InvalidChip(id));
        }

        let chip = field - self.first_chip as u32;
        if chip >= self.chip_count as u32 {
            return Err(AddressError::InvalidChip(id));
        }

        Ok(RegisterAddress {
            chip: chip as u8,
            offset: (id & self.offset_mask()) as u8,
        })
    }
}
