//! Good/bad mask status rules
//!
//! PSU status registers pack a few signal bits per supply. A status word such
//! as `all_ok` is true when every "good" bit is set and no "bad" bit is set;
//! bad bits always win. A [`StatusGroup`] locates each unit's bits inside the
//! register and holds the rules that apply to all of them.

use core::fmt;

use crate::Error;
use crate::registry::RegisterAccess;

/// One named status rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusRule {
    /// Rule name, e.g. `all_ok` or `present`
    pub name: &'static str,
    /// Bits that must all be set
    pub good_mask: u8,
    /// Bits that must all be clear
    pub bad_mask: u8,
    /// Text for a passing rule
    pub msg_good: &'static str,
    /// Text for a failing rule
    pub msg_bad: &'static str,
}

impl StatusRule {
    /// Rule reporting `1` when it passes and `0` when it fails
    #[must_use]
    pub const fn new(name: &'static str, good_mask: u8, bad_mask: u8) -> Self {
        Self {
            name,
            good_mask,
            bad_mask,
            msg_good: "1",
            msg_bad: "0",
        }
    }

    /// Replace the pass/fail texts
    #[must_use]
    pub const fn with_messages(mut self, msg_good: &'static str, msg_bad: &'static str) -> Self {
        self.msg_good = msg_good;
        self.msg_bad = msg_bad;
        self
    }

    /// Evaluate the rule against a unit's status bits
    #[must_use]
    pub const fn is_ok(&self, bits: u8) -> bool {
        bits & self.good_mask == self.good_mask && bits & self.bad_mask == 0
    }

    /// Text for the rule evaluated against a unit's status bits
    #[must_use]
    pub const fn message(&self, bits: u8) -> &'static str {
        if self.is_ok(bits) {
            self.msg_good
        } else {
            self.msg_bad
        }
    }
}

/// Status rules shared by several units packed into one register
///
/// Unit `n` (counting from 1) owns the bits selected by `unit_mask` after
/// shifting the register right by `unit_shifts[n - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusGroup {
    /// Register id holding the status bits
    pub register: u32,
    /// Right shift that brings each unit's bits down to bit 0
    pub unit_shifts: &'static [u8],
    /// Mask applied after shifting
    pub unit_mask: u8,
    /// Rules applicable to every unit
    pub rules: &'static [StatusRule],
}

impl StatusGroup {
    /// Create a group over `register`
    #[must_use]
    pub const fn new(
        register: u32,
        unit_shifts: &'static [u8],
        unit_mask: u8,
        rules: &'static [StatusRule],
    ) -> Self {
        Self {
            register,
            unit_shifts,
            unit_mask,
            rules,
        }
    }

    /// Number of units in the group
    #[must_use]
    pub const fn units(&self) -> usize {
        self.unit_shifts.len()
    }

    /// Look up a rule by name
    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&'static StatusRule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    /// Extract the bits of unit `unit` (1-based) from a register byte
    #[must_use]
    pub fn unit_bits(&self, register: u8, unit: u8) -> Option<u8> {
        let shift = *self.unit_shifts.get(usize::from(unit).checked_sub(1)?)?;
        Some((register >> shift) & self.unit_mask)
    }

    /// Read the register and evaluate `rule` for `unit`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for an unknown unit or rule, checked
    /// before the register is read, or the register access error.
    pub fn evaluate<A: RegisterAccess>(
        &self,
        regs: &mut A,
        unit: u8,
        rule: &str,
    ) -> Result<&'static str, Error<A::BusError>> {
        let (rule, bits) = self.sample(regs, unit, rule)?;
        Ok(rule.message(bits))
    }

    /// Read the register and test `rule` for `unit`
    ///
    /// # Errors
    ///
    /// Same as [`StatusGroup::evaluate`].
    pub fn is_ok<A: RegisterAccess>(
        &self,
        regs: &mut A,
        unit: u8,
        rule: &str,
    ) -> Result<bool, Error<A::BusError>> {
        let (rule, bits) = self.sample(regs, unit, rule)?;
        Ok(rule.is_ok(bits))
    }

    /// Read the register once and evaluate several rules for `unit`
    ///
    /// The result displays each rule's message in order, joined by `, `, up
    /// to and including the first failing rule.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for an unknown unit, an empty rule
    /// list or an unknown rule, checked before the register is read, or the
    /// register access error.
    pub fn summary<'a, A: RegisterAccess>(
        &'a self,
        regs: &mut A,
        unit: u8,
        rules: &'a [&'a str],
    ) -> Result<Summary<'a>, Error<A::BusError>> {
        if rules.is_empty() || rules.iter().any(|name| self.rule(name).is_none()) {
            return Err(Error::InvalidValue);
        }
        let bits = self.read_unit(regs, unit)?;
        Ok(Summary {
            group: self,
            rules,
            bits,
        })
    }

    fn sample<A: RegisterAccess>(
        &self,
        regs: &mut A,
        unit: u8,
        rule: &str,
    ) -> Result<(&'static StatusRule, u8), Error<A::BusError>> {
        let rule = self.rule(rule).ok_or(Error::InvalidValue)?;
        let bits = self.read_unit(regs, unit)?;
        Ok((rule, bits))
    }

    fn read_unit<A: RegisterAccess>(&self, regs: &mut A, unit: u8) -> Result<u8, Error<A::BusError>> {
        if usize::from(unit) == 0 || usize::from(unit) > self.units() {
            return Err(Error::InvalidValue);
        }
        let register = regs.read_register(self.register)?;
        self.unit_bits(register, unit).ok_or(Error::InvalidValue)
    }
}

/// Several rules of one unit, evaluated from a single register read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary<'a> {
    group: &'a StatusGroup,
    rules: &'a [&'a str],
    bits: u8,
}

impl Summary<'_> {
    /// The unit's status bits
    #[must_use]
    pub const fn bits(&self) -> u8 {
        self.bits
    }

    /// Whether every rule passes
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.rules
            .iter()
            .filter_map(|name| self.group.rule(name))
            .all(|rule| rule.is_ok(self.bits))
    }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rules = self.rules.iter().filter_map(|name| self.group.rule(name));
        for (i, rule) in rules.enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(rule.message(self.bits))?;
            if !rule.is_ok(self.bits) {
                break;
            }
        }
        Ok(())
    }
}
