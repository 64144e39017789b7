//! Accton AS7412-32X
//!
//! Two CPLDs presented as one register space. The fan CPLD at `0x66` carries
//! tray presence, tachometers, PWM and the fan watchdog. The main CPLD at
//! `0x60` carries PSU status and the version register.
//!
//! Register ids carry the chip in bits 7:6, numbered from 1, so the fan CPLD
//! is chip 0 and the main CPLD is chip 1.

use crate::address::AddressLayout;
use crate::attribute::{Attribute, AttributeTable, Scale};
use crate::field::BitField;
use crate::status::{StatusGroup, StatusRule};

/// Register id layout
pub const LAYOUT: AddressLayout = AddressLayout::one_based(6, 2, 2);

/// Fan CPLD
pub const CHIP_FAN: u8 = 0;
/// Main CPLD
pub const CHIP_MAIN: u8 = 1;

/// 7-bit I2C addresses, indexed by chip
pub const I2C_ADDRESSES: [u8; 2] = [0x66, 0x60];

const fn main_cpld(offset: u8) -> u32 {
    LAYOUT.reg(CHIP_MAIN, offset)
}

const fn fan_cpld(offset: u8) -> u32 {
    LAYOUT.reg(CHIP_FAN, offset)
}

/// Main CPLD version
pub const CPLD_VERSION_REG: u32 = main_cpld(0x00);
/// PSU presence, power-good and alert bits for both supplies
pub const PSU_STATUS_REG: u32 = main_cpld(0x02);
/// Fan tray absent bits, one per tray
pub const FAN_PRESENT_REG: u32 = fan_cpld(0x0f);
/// Fan duty cycle, one register for every tray
pub const PWM_REG: u32 = fan_cpld(0x11);
/// Front rotor tachometers of trays 1-6
pub const FAN_SPEED_REG: u32 = fan_cpld(0x12);
/// Rear rotor tachometers of trays 1-6
pub const FANR_SPEED_REG: u32 = fan_cpld(0x22);
/// Fan watchdog control
pub const FAN_WATCHDOG_REG: u32 = fan_cpld(0x33);

// PSU bits after shifting a supply down; PSU 1 sits one bit above PSU 2.
const PSU_PRESENT_L: u8 = 0x01;
const PSU_POWER_GOOD: u8 = 0x04;
const PSU_ALERT_L: u8 = 0x10;

/// PSU status rules
pub const PSU_RULES: &[StatusRule] = &[
    StatusRule::new("present", 0, PSU_PRESENT_L).with_messages("installed", "not_installed"),
    StatusRule::new("power_ok", PSU_POWER_GOOD | PSU_ALERT_L, 0).with_messages("ok", "power_bad"),
];

/// Rules reported by `psu_pwr1` and `psu_pwr2`, presence first
pub const PSU_REPORT: &[&str] = &["present", "power_ok"];

/// PSU 1 in bits 1, 3 and 5; PSU 2 in bits 0, 2 and 4
pub const PSU_STATUS: StatusGroup = StatusGroup::new(PSU_STATUS_REG, &[1, 0], 0x15, PSU_RULES);

/// Fan duty cycle register scaled to 0-255
pub const PWM_SCALE: Scale = Scale::multiplier(17);

/// Tachometer registers count in units of 100 rpm
pub const RPM_SCALE: Scale = Scale::multiplier(100);

/// Fan watchdog enable
pub const FAN_WATCHDOG_ENABLE: BitField = BitField::bit("fan_watchdog_enable", FAN_WATCHDOG_REG, 0);

/// Fans `2n-1` and `2n` share the presence bit of tray `n`
const fn fan_ok(name: &'static str, n: u8) -> Attribute {
    Attribute::field(BitField::bit(name, FAN_PRESENT_REG, (n - 1) / 2).active_low().read_only())
}

/// Odd fans are front rotors, even fans rear rotors
const fn fan_input(name: &'static str, n: u8) -> Attribute {
    let base = if n % 2 == 1 { 0x12 } else { 0x22 };
    Attribute::scaled(name, fan_cpld(base + (n - 1) / 2), RPM_SCALE)
}

/// Every attribute published by the board
pub const ATTRIBUTES: AttributeTable = AttributeTable::new(&[
    Attribute::version("cpld_version", CPLD_VERSION_REG),
    Attribute::summary("psu_pwr1", &PSU_STATUS, 1, PSU_REPORT),
    Attribute::summary("psu_pwr2", &PSU_STATUS, 2, PSU_REPORT),
    Attribute::scaled_rw("pwm1", PWM_REG, PWM_SCALE),
    Attribute::scaled_rw("pwm2", PWM_REG, PWM_SCALE),
    Attribute::scaled_rw("pwm3", PWM_REG, PWM_SCALE),
    Attribute::scaled_rw("pwm4", PWM_REG, PWM_SCALE),
    Attribute::scaled_rw("pwm5", PWM_REG, PWM_SCALE),
    Attribute::scaled_rw("pwm6", PWM_REG, PWM_SCALE),
    fan_ok("fan1_ok", 1),
    fan_ok("fan2_ok", 2),
    fan_ok("fan3_ok", 3),
    fan_ok("fan4_ok", 4),
    fan_ok("fan5_ok", 5),
    fan_ok("fan6_ok", 6),
    fan_ok("fan7_ok", 7),
    fan_ok("fan8_ok", 8),
    fan_ok("fan9_ok", 9),
    fan_ok("fan10_ok", 10),
    fan_ok("fan11_ok", 11),
    fan_ok("fan12_ok", 12),
    fan_input("fan1_input", 1),
    fan_input("fan2_input", 2),
    fan_input("fan3_input", 3),
    fan_input("fan4_input", 4),
    fan_input("fan5_input", 5),
    fan_input("fan6_input", 6),
    fan_input("fan7_input", 7),
    fan_input("fan8_input", 8),
    fan_input("fan9_input", 9),
    fan_input("fan10_input", 10),
    fan_input("fan11_input", 11),
    fan_input("fan12_input", 12),
    Attribute::field(FAN_WATCHDOG_ENABLE),
]);
