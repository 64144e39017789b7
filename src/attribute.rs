//! Named attribute tables
//!
//! Board drivers expose their registers as a flat list of named text
//! attributes (`led_psu1`, `psu_pwr1`, `fan01_input`, ...). Each
//! [`Attribute`] pairs a name with a descriptor saying how to render the
//! register contents as text and how to parse text back into them. An
//! [`AttributeTable`] is a board's complete list, normally a `const`.
//!
//! Rendering goes to any [`core::fmt::Write`] sink and always ends with a
//! newline.

use core::fmt::{self, Write};

use crate::Error;
use crate::field::{BitField, parse_number};
use crate::port::{PermutedPorts, PortBitmap};
use crate::registry::RegisterAccess;
use crate::status::StatusGroup;

/// Linear conversion between a register byte and a user-facing number
///
/// Shown values are `raw * num / den`. Stored values above the shown value of
/// `max_raw` are rejected; the rest are converted back with `value * den /
/// num` and raised to `min_raw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Scale {
    /// Numerator
    pub num: u32,
    /// Denominator
    pub den: u32,
    /// Smallest register value ever written
    pub min_raw: u8,
    /// Largest register value accepted
    pub max_raw: u8,
}

impl Scale {
    /// Plain multiplier over the full byte range
    #[must_use]
    pub const fn multiplier(factor: u32) -> Self {
        Self::ratio(factor, 1)
    }

    /// Ratio `num / den` over the full byte range
    ///
    /// # Panics
    ///
    /// Panics if either term is zero.
    #[must_use]
    pub const fn ratio(num: u32, den: u32) -> Self {
        assert!(num != 0 && den != 0, "scale terms must be non-zero");
        Self {
            num,
            den,
            min_raw: 0,
            max_raw: u8::MAX,
        }
    }

    /// Restrict the register values written
    #[must_use]
    pub const fn with_raw_range(mut self, min_raw: u8, max_raw: u8) -> Self {
        self.min_raw = min_raw;
        self.max_raw = max_raw;
        self
    }

    /// User-facing value of a register byte
    #[must_use]
    pub const fn to_user(&self, raw: u8) -> u64 {
        raw as u64 * self.num as u64 / self.den as u64
    }

    /// Register byte for a user-facing value
    #[must_use]
    pub fn to_raw(&self, value: u64) -> Option<u8> {
        if value > self.to_user(self.max_raw) {
            return None;
        }
        let raw = value * u64::from(self.den) / u64::from(self.num);
        let raw = u8::try_from(raw).ok()?.min(self.max_raw);
        Some(raw.max(self.min_raw))
    }
}

/// How an attribute maps onto registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AttributeKind {
    /// A bit-field, shown as a number or an enumeration name
    Field(BitField),
    /// A status rule evaluated for one unit of a group
    Status {
        /// Group holding the rule
        group: &'static StatusGroup,
        /// Unit number, counting from 1
        unit: u8,
        /// Rule name
        rule: &'static str,
    },
    /// Several status rules for one unit, reported as one line
    Summary {
        /// Group holding the rules
        group: &'static StatusGroup,
        /// Unit number, counting from 1
        unit: u8,
        /// Rule names, in report order
        rules: &'static [&'static str],
    },
    /// A whole register scaled to a user-facing number
    Scaled {
        /// Register id
        register: u32,
        /// Conversion
        scale: Scale,
        /// Attribute accepts writes
        writable: bool,
    },
    /// A multi-register port bitmap, shown in hex
    Ports {
        /// Registers and polarity
        bitmap: PortBitmap,
        /// Attribute accepts writes
        writable: bool,
    },
    /// A permuted QSFP register, shown as two hex digits
    Permuted(PermutedPorts),
    /// A version register, shown as two upper-case hex digits
    Version {
        /// Register id
        register: u32,
    },
    /// Constant text with no register behind it
    ///
    /// Stores succeed only for the same text, optionally followed by one
    /// newline.
    Fixed {
        /// Text shown
        text: &'static str,
    },
}

/// A named attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Attribute {
    /// Name under which the attribute is published
    pub name: &'static str,
    /// Register mapping
    pub kind: AttributeKind,
}

impl Attribute {
    /// Attribute named after its bit-field
    #[must_use]
    pub const fn field(field: BitField) -> Self {
        Self {
            name: field.name,
            kind: AttributeKind::Field(field),
        }
    }

    /// Status rule attribute
    #[must_use]
    pub const fn status(name: &'static str, group: &'static StatusGroup, unit: u8, rule: &'static str) -> Self {
        Self {
            name,
            kind: AttributeKind::Status { group, unit, rule },
        }
    }

    /// One-line status report built from several rules
    #[must_use]
    pub const fn summary(
        name: &'static str,
        group: &'static StatusGroup,
        unit: u8,
        rules: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            kind: AttributeKind::Summary { group, unit, rules },
        }
    }

    /// Read-only scaled register
    #[must_use]
    pub const fn scaled(name: &'static str, register: u32, scale: Scale) -> Self {
        Self {
            name,
            kind: AttributeKind::Scaled {
                register,
                scale,
                writable: false,
            },
        }
    }

    /// Read-write scaled register
    #[must_use]
    pub const fn scaled_rw(name: &'static str, register: u32, scale: Scale) -> Self {
        Self {
            name,
            kind: AttributeKind::Scaled {
                register,
                scale,
                writable: true,
            },
        }
    }

    /// Port bitmap
    #[must_use]
    pub const fn ports(name: &'static str, bitmap: PortBitmap, writable: bool) -> Self {
        Self {
            name,
            kind: AttributeKind::Ports { bitmap, writable },
        }
    }

    /// Permuted QSFP register
    #[must_use]
    pub const fn permuted(name: &'static str, ports: PermutedPorts) -> Self {
        Self {
            name,
            kind: AttributeKind::Permuted(ports),
        }
    }

    /// Version register
    #[must_use]
    pub const fn version(name: &'static str, register: u32) -> Self {
        Self {
            name,
            kind: AttributeKind::Version { register },
        }
    }

    /// Constant attribute
    #[must_use]
    pub const fn fixed(name: &'static str, text: &'static str) -> Self {
        Self {
            name,
            kind: AttributeKind::Fixed { text },
        }
    }

    /// Whether [`Attribute::store`] can succeed
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        match self.kind {
            AttributeKind::Field(field) => field.writable,
            AttributeKind::Scaled { writable, .. } | AttributeKind::Ports { writable, .. } => writable,
            AttributeKind::Permuted(ports) => ports.writable,
            AttributeKind::Fixed { .. } => true,
            AttributeKind::Status { .. } | AttributeKind::Summary { .. } | AttributeKind::Version { .. } => false,
        }
    }

    /// Render the current value followed by a newline
    ///
    /// Nothing is written to `out` if the register access fails.
    ///
    /// # Errors
    ///
    /// Returns the register access error, [`Error::InvalidValue`] for a
    /// status attribute naming an unknown unit or rule, or [`Error::Format`]
    /// if `out` rejects the text.
    pub fn show<A, W>(&self, regs: &mut A, out: &mut W) -> Result<(), Error<A::BusError>>
    where
        A: RegisterAccess,
        W: Write + ?Sized,
    {
        match self.kind {
            AttributeKind::Field(field) => {
                let value = field.get(regs)?;
                writeln!(out, "{value}")?;
            }
            AttributeKind::Status { group, unit, rule } => {
                let message = group.evaluate(regs, unit, rule)?;
                writeln!(out, "{message}")?;
            }
            AttributeKind::Summary { group, unit, rules } => {
                let summary = group.summary(regs, unit, rules)?;
                writeln!(out, "{summary}")?;
            }
            AttributeKind::Scaled { register, scale, .. } => {
                let raw = regs.read_register(register)?;
                writeln!(out, "{}", scale.to_user(raw))?;
            }
            AttributeKind::Ports { bitmap, .. } => {
                let value = bitmap.read(regs)?;
                writeln!(out, "{value:#x}")?;
            }
            AttributeKind::Permuted(ports) => {
                let value = ports.read(regs)?;
                writeln!(out, "{value:#04x}")?;
            }
            AttributeKind::Version { register } => {
                let value = regs.read_register(register)?;
                writeln!(out, "{value:#04X}")?;
            }
            AttributeKind::Fixed { text } => writeln!(out, "{text}")?,
        }
        Ok(())
    }

    /// Parse `text` and write it to the attribute's registers
    ///
    /// Surrounding whitespace, including the trailing newline `echo` adds, is
    /// ignored, except by constant attributes, which take only their own text
    /// and one optional newline. Bitmaps take hex with or without a `0x` prefix; everything
    /// else numeric takes decimal, `0x` hex, `0b` binary or `0`-prefixed
    /// octal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] for read-only attributes,
    /// [`Error::InvalidValue`] for unparsable or out-of-range text, or the
    /// register access error. Input is validated before any bus traffic.
    pub fn store<A: RegisterAccess>(&self, regs: &mut A, text: &str) -> Result<(), Error<A::BusError>> {
        if !self.is_writable() {
            return Err(Error::ReadOnly);
        }
        if let AttributeKind::Fixed { text: fixed } = self.kind {
            return if text.strip_suffix('\n').unwrap_or(text) == fixed {
                Ok(())
            } else {
                Err(Error::InvalidValue)
            };
        }
        let text = text.trim();
        match self.kind {
            AttributeKind::Field(field) => field.set_str(regs, text),
            AttributeKind::Scaled { register, scale, .. } => {
                let value = parse_number(text).ok_or(Error::InvalidValue)?;
                let raw = scale.to_raw(value).ok_or(Error::InvalidValue)?;
                regs.write_register(register, raw)
            }
            AttributeKind::Ports { bitmap, .. } => {
                let value = parse_hex(text).ok_or(Error::InvalidValue)?;
                bitmap.write(regs, value)
            }
            AttributeKind::Permuted(ports) => {
                let value = parse_hex(text).ok_or(Error::InvalidValue)?;
                ports.write(regs, u8::try_from(value).map_err(|_| Error::InvalidValue)?)
            }
            AttributeKind::Status { .. } | AttributeKind::Summary { .. } | AttributeKind::Version { .. } => {
                Err(Error::ReadOnly)
            }
            AttributeKind::Fixed { .. } => Err(Error::InvalidValue),
        }
    }
}

/// A board's attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AttributeTable {
    attributes: &'static [Attribute],
}

impl AttributeTable {
    /// Wrap a list of attributes
    #[must_use]
    pub const fn new(attributes: &'static [Attribute]) -> Self {
        Self { attributes }
    }

    /// All attributes, in publication order
    #[must_use]
    pub const fn attributes(&self) -> &'static [Attribute] {
        self.attributes
    }

    /// Number of attributes
    #[must_use]
    pub const fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Iterate over the attributes
    pub fn iter(&self) -> core::slice::Iter<'static, Attribute> {
        self.attributes.iter()
    }

    /// Look up an attribute by name
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&'static Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// Render attribute `name`, see [`Attribute::show`]
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAttribute`] if no attribute has that name,
    /// otherwise as [`Attribute::show`].
    pub fn show<A, W>(&self, name: &str, regs: &mut A, out: &mut W) -> Result<(), Error<A::BusError>>
    where
        A: RegisterAccess,
        W: Write + ?Sized,
    {
        self.find(name).ok_or(Error::UnknownAttribute)?.show(regs, out)
    }

    /// Store into attribute `name`, see [`Attribute::store`]
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAttribute`] if no attribute has that name,
    /// otherwise as [`Attribute::store`].
    pub fn store<A: RegisterAccess>(&self, name: &str, regs: &mut A, text: &str) -> Result<(), Error<A::BusError>> {
        self.find(name).ok_or(Error::UnknownAttribute)?.store(regs, text)
    }
}

impl IntoIterator for &AttributeTable {
    type Item = &'static Attribute;
    type IntoIter = core::slice::Iter<'static, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Parse hex digits with an optional `0x`/`0X` prefix
fn parse_hex(text: &str) -> Option<u64> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}
