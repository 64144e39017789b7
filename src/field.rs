//! Bit-field views over CPLD registers
//!
//! A [`BitField`] names a run of bits inside one register and describes how
//! to present it: as a plain number, or through an enumeration table such as
//! LED color codes. Active-low fields are complemented on the way in and out
//! so callers always see positive logic.
//!
//! # Example
//!
//! ```
//! use switch_cpld::field::{BitField, EnumEntry, Value};
//!
//! const LED_COLORS: &[EnumEntry] = &[
//!     EnumEntry::new("hw_ctrl", 0),
//!     EnumEntry::new("yellow", 1),
//!     EnumEntry::new("green", 2),
//!     EnumEntry::new("off", 3),
//! ];
//!
//! // Bits 3:2 of register 0x4b
//! const LED_PSU2: BitField = BitField::new("led_psu2", 0x4b, 2, 2).with_enum(LED_COLORS);
//!
//! assert_eq!(LED_PSU2.decode(0b0000_1000), Value::Named("green"));
//! ```

use core::fmt;

use crate::Error;
use crate::registry::RegisterAccess;

/// One entry of a field's enumeration table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EnumEntry {
    /// Name shown to and accepted from users
    pub name: &'static str,
    /// Field value, already shifted down to bit 0
    pub value: u8,
}

impl EnumEntry {
    /// Create a new table entry
    #[must_use]
    pub const fn new(name: &'static str, value: u8) -> Self {
        Self { name, value }
    }
}

/// Decoded value of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Value {
    /// Plain numeric field
    Raw(u8),
    /// Enumerated field with a matching table entry
    Named(&'static str),
    /// Enumerated field holding a pattern the table does not list
    ///
    /// Firmware can report reserved encodings, so this is a value rather than
    /// an error. Contains the raw field value and displays as
    /// `undefined color`, the text board drivers print for such patterns.
    Undefined(u8),
}

impl Value {
    /// Numeric value of a [`Value::Raw`] field
    #[must_use]
    pub const fn raw(self) -> Option<u8> {
        match self {
            Self::Raw(v) => Some(v),
            _ => None,
        }
    }

    /// Name of a [`Value::Named`] field
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        match self {
            Self::Named(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw(v) => write!(f, "{v}"),
            Self::Named(name) => f.write_str(name),
            Self::Undefined(_) => f.write_str("undefined color"),
        }
    }
}

/// Value to store into a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldInput<'a> {
    /// Numeric value, in positive logic, shifted down to bit 0
    Raw(u8),
    /// Name from the field's enumeration table
    Named(&'a str),
}

/// Descriptor of a named run of bits in one register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitField {
    /// Attribute name of the field
    pub name: &'static str,
    /// Register id, decoded through the board's address layout
    pub register: u32,
    /// Lowest bit of the field
    pub start_bit: u8,
    /// Number of bits in the field
    pub width: u8,
    /// Optional table mapping field values to names
    pub enum_table: Option<&'static [EnumEntry]>,
    /// Field is active-low and is complemented on access
    pub complement: bool,
    /// Field may be written
    pub writable: bool,
}

impl BitField {
    /// Describe `width` bits of `register` starting at `start_bit`
    ///
    /// # Panics
    ///
    /// Panics (at compile time when used in a `const`) unless
    /// `width >= 1` and `start_bit + width <= 8`.
    #[must_use]
    pub const fn new(name: &'static str, register: u32, start_bit: u8, width: u8) -> Self {
        assert!(width >= 1, "bit field must be at least one bit wide");
        assert!((start_bit as u32) + (width as u32) <= 8, "bit field exceeds the register");
        Self {
            name,
            register,
            start_bit,
            width,
            enum_table: None,
            complement: false,
            writable: true,
        }
    }

    /// Describe a single bit
    ///
    /// # Panics
    ///
    /// Panics if `bit > 7`.
    #[must_use]
    pub const fn bit(name: &'static str, register: u32, bit: u8) -> Self {
        Self::new(name, register, bit, 1)
    }

    /// Present the field through an enumeration table
    #[must_use]
    pub const fn with_enum(mut self, table: &'static [EnumEntry]) -> Self {
        self.enum_table = Some(table);
        self
    }

    /// Mark the field as active-low
    #[must_use]
    pub const fn active_low(mut self) -> Self {
        self.complement = true;
        self
    }

    /// Mark the field as read-only
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Mask of the field's bits once shifted down to bit 0
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn mask(&self) -> u8 {
        ((1u16 << self.width) - 1) as u8
    }

    /// Mask of the field's bits in place within the register
    #[must_use]
    pub const fn register_mask(&self) -> u8 {
        self.mask() << self.start_bit
    }

    /// Extract the field from a register byte, in positive logic
    #[must_use]
    pub const fn extract(&self, register: u8) -> u8 {
        let raw = (register >> self.start_bit) & self.mask();
        if self.complement {
            !raw & self.mask()
        } else {
            raw
        }
    }

    /// Decode the field from a register byte
    #[must_use]
    pub fn decode(&self, register: u8) -> Value {
        let value = self.extract(register);
        match self.enum_table {
            None => Value::Raw(value),
            Some(table) => table
                .iter()
                .find(|entry| entry.value == value)
                .map_or(Value::Undefined(value), |entry| Value::Named(entry.name)),
        }
    }

    /// Resolve an input to a positive-logic field value
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for names missing from the table (or
    /// any name when there is no table) and for numbers wider than the field.
    pub fn resolve<E>(&self, input: FieldInput<'_>) -> Result<u8, Error<E>> {
        let value = match input {
            FieldInput::Raw(v) => v,
            FieldInput::Named(name) => self
                .enum_table
                .and_then(|table| table.iter().find(|entry| entry.name == name))
                .map(|entry| entry.value)
                .ok_or(Error::InvalidValue)?,
        };
        if value & !self.mask() != 0 {
            return Err(Error::InvalidValue);
        }
        Ok(value)
    }

    /// Merge a positive-logic field value into a register byte
    #[must_use]
    pub const fn insert(&self, register: u8, value: u8) -> u8 {
        let value = (if self.complement { !value } else { value }) & self.mask();
        (register & !self.register_mask()) | (value << self.start_bit)
    }

    /// Read and decode the field
    ///
    /// # Errors
    ///
    /// Returns an error if the register id is invalid or the read fails. An
    /// unlisted enumeration pattern is not an error, see [`Value::Undefined`].
    pub fn get<A: RegisterAccess>(&self, regs: &mut A) -> Result<Value, Error<A::BusError>> {
        let register = regs.read_register(self.register)?;
        Ok(self.decode(register))
    }

    /// Read the field as a positive-logic number, ignoring any table
    ///
    /// # Errors
    ///
    /// Returns an error if the register id is invalid or the read fails.
    pub fn get_raw<A: RegisterAccess>(&self, regs: &mut A) -> Result<u8, Error<A::BusError>> {
        let register = regs.read_register(self.register)?;
        Ok(self.extract(register))
    }

    /// Store a value into the field with a read-modify-write of its register
    ///
    /// The input is validated before any bus traffic. Other bits of the
    /// register are preserved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] for read-only fields,
    /// [`Error::InvalidValue`] for unusable input, or the register access
    /// error.
    pub fn set<A: RegisterAccess>(
        &self,
        regs: &mut A,
        input: FieldInput<'_>,
    ) -> Result<(), Error<A::BusError>> {
        if !self.writable {
            return Err(Error::ReadOnly);
        }
        let value = self.resolve(input)?;
        let address = regs.resolve(self.register)?;
        let register = regs.read(address.chip, address.offset)?;
        regs.write(address.chip, address.offset, self.insert(register, value))
    }

    /// Store a value given as text
    ///
    /// Leading and trailing whitespace is ignored. Fields with a table take
    /// a name; other fields take a number in decimal, `0x` hex, `0b` binary
    /// or `0`-prefixed octal.
    ///
    /// # Errors
    ///
    /// Same as [`BitField::set`].
    pub fn set_str<A: RegisterAccess>(&self, regs: &mut A, text: &str) -> Result<(), Error<A::BusError>> {
        let text = text.trim();
        let input = if self.enum_table.is_some() {
            FieldInput::Named(text)
        } else {
            let value = parse_number(text).ok_or(Error::InvalidValue)?;
            FieldInput::Raw(u8::try_from(value).map_err(|_| Error::InvalidValue)?)
        };
        self.set(regs, input)
    }
}

/// Parse an unsigned integer the way the kernel's `kstrtouint` does with base 0
///
/// Accepts an optional `+`, then `0x`/`0X` hex, `0b`/`0B` binary, a leading
/// `0` for octal, or plain decimal.
pub(crate) fn parse_number(text: &str) -> Option<u64> {
    let text = text.strip_prefix('+').unwrap_or(text);
    let (digits, radix) = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        (hex, 16)
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        (bin, 2)
    } else if text.len() > 1 && text.starts_with('0') {
        (&text[1..], 8)
    } else {
        (text, 10)
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}
