//! Accton AS5712-54X
//!
//! Three CPLDs on the CPU board's I2C bus:
//!
//! | Chip | Address | Role                                   |
//! |------|---------|----------------------------------------|
//! | 0    | `0x60`  | System: PSUs, fans, front-panel LEDs   |
//! | 1    | `0x61`  | Ports 1-24: SFP control, EEPROM select |
//! | 2    | `0x62`  | Ports 25-54: SFP and QSFP control      |
//!
//! Register ids carry the chip in bits 7:6, numbered from 1.

use crate::address::AddressLayout;
use crate::attribute::{Attribute, AttributeTable, Scale};
use crate::field::{BitField, EnumEntry};
use crate::mux::{MuxRange, PortMux};
use crate::port::{BitPermutation, PermutedPorts, PortBitmap};
use crate::status::{StatusGroup, StatusRule};

/// Register id layout
pub const LAYOUT: AddressLayout = AddressLayout::one_based(6, 2, 3);

/// System CPLD
pub const CHIP_SYSTEM: u8 = 0;
/// Port CPLD for ports 1-24
pub const CHIP_PORT1_24: u8 = 1;
/// Port CPLD for ports 25-54
pub const CHIP_PORT25_54: u8 = 2;

/// 7-bit I2C addresses, indexed by chip
pub const I2C_ADDRESSES: [u8; 3] = [0x60, 0x61, 0x62];

const fn system(offset: u8) -> u32 {
    LAYOUT.reg(CHIP_SYSTEM, offset)
}

const fn port1_24(offset: u8) -> u32 {
    LAYOUT.reg(CHIP_PORT1_24, offset)
}

const fn port25_54(offset: u8) -> u32 {
    LAYOUT.reg(CHIP_PORT25_54, offset)
}

// System CPLD
/// Board revision id
pub const BOARD_ID_REG: u32 = system(0x00);
/// System CPLD version
pub const SYS_CPLD_VERSION_REG: u32 = system(0x01);
/// PSU presence and power status, see [`PSU_STATUS`]
pub const PSU_STATUS_REG: u32 = system(0x02);
/// Peripheral reset control
pub const RESET_CONTROL_REG: u32 = system(0x04);
/// Temperature sensor interrupt status
pub const LM75_INTR_STATUS_REG: u32 = system(0x07);
/// Fan, diagnostic and locator LEDs
pub const SYSTEM_LED_REG: u32 = system(0x0a);
/// PSU LEDs
pub const PSU_LED_REG: u32 = system(0x0b);
/// Front rotor fault bits, one per tray
pub const FAN_FAULT_REG: u32 = system(0x0c);
/// Fan duty cycle in 5% steps
pub const FAN_PWM_REG: u32 = system(0x0d);
/// Front rotor tachometer of tray 1, trays 2-5 follow
pub const FAN1_SPEED_REG: u32 = system(0x10);
/// LEDs of fan trays 1-4, two bits each
pub const FAN1_4_LED_REG: u32 = system(0x16);
/// LED of fan tray 5
pub const FAN5_LED_REG: u32 = system(0x17);
/// Rear rotor tachometer of tray 1, trays 2-5 follow
pub const FANR1_SPEED_REG: u32 = system(0x18);
/// Airflow direction bits, one per tray
pub const FAN_DIRECTION_REG: u32 = system(0x1e);
/// Rear rotor fault bits, one per tray
pub const FANR_FAULT_REG: u32 = system(0x1f);

// Port CPLD, ports 1-24
/// Port 1-24 CPLD version
pub const PORT1_24_CPLD_VERSION_REG: u32 = port1_24(0x01);
/// EEPROM select for ports 1-24
pub const PORT1_24_I2C_SELECT_REG: u32 = port1_24(0x02);
/// Module absent bits for ports 1-8
pub const SFP1_8_PRESENT_STAT_REG: u32 = port1_24(0x06);
/// Transmitter fault bits for ports 1-8
pub const SFP1_8_TX_FAULT_REG: u32 = port1_24(0x09);
/// Transmitter disable bits for ports 1-8
pub const SFP1_8_TX_DISABLE_REG: u32 = port1_24(0x0c);
/// Receiver loss-of-signal bits for ports 1-8
pub const SFP1_8_RX_LOS_REG: u32 = port1_24(0x0f);

// Port CPLD, ports 25-54
/// Port 25-54 CPLD version
pub const PORT25_54_CPLD_VERSION_REG: u32 = port25_54(0x01);
/// EEPROM select for ports 25-54
pub const PORT25_54_I2C_SELECT_REG: u32 = port25_54(0x02);
/// Module absent bits for ports 25-32
pub const SFP25_32_PRESENT_STAT_REG: u32 = port25_54(0x06);
/// QSFP presence change interrupt
pub const QSFP_PRESENT_INTR_REG: u32 = port25_54(0x12);
/// QSFP interrupt lines, hardware order
pub const QSFP_FAULT_STAT_REG: u32 = port25_54(0x13);
/// QSFP module absent bits, hardware order
pub const QSFP_PRESENT_STAT_REG: u32 = port25_54(0x14);
/// QSFP reset lines, hardware order
pub const QSFP_MOD_RESET_REG: u32 = port25_54(0x15);
/// QSFP low-power mode lines, hardware order
pub const QSFP_LPMODE_REG: u32 = port25_54(0x16);

/// PSU AC input good (alert is active-low)
pub const PSU_AC_ALERT_L: u8 = 0x04;
/// PSU 12V rail good
pub const PSU_12V_GOOD: u8 = 0x02;
/// PSU absent when set
pub const PSU_PRESENT_L: u8 = 0x01;

/// PSU status rules
pub const PSU_RULES: &[StatusRule] = &[
    StatusRule::new("all_ok", PSU_AC_ALERT_L | PSU_12V_GOOD, PSU_PRESENT_L),
    StatusRule::new("present", 0, PSU_PRESENT_L),
    StatusRule::new("ac_ok", PSU_AC_ALERT_L, PSU_PRESENT_L),
    StatusRule::new("dc_ok", PSU_12V_GOOD, PSU_PRESENT_L),
];

/// PSU 1 in bits 2:0, PSU 2 in bits 6:4
pub const PSU_STATUS: StatusGroup = StatusGroup::new(PSU_STATUS_REG, &[0, 4], 0x07, PSU_RULES);

/// Colors of the PSU and fan LEDs
pub const LED_COLORS: &[EnumEntry] = &[
    EnumEntry::new("green", 2),
    EnumEntry::new("yellow", 1),
    EnumEntry::new("off", 3),
    EnumEntry::new("hw_ctrl", 0),
];

/// Colors of the diagnostic LED
pub const DIAG_LED_COLORS: &[EnumEntry] = &[
    EnumEntry::new("green", 2),
    EnumEntry::new("yellow", 0),
    EnumEntry::new("off", 3),
    EnumEntry::new("red", 1),
];

/// Colors of the locator LED
pub const LOC_LED_COLORS: &[EnumEntry] = &[
    EnumEntry::new("off", 1),
    EnumEntry::new("yellow", 0),
    EnumEntry::new("yellow_blinking", 2),
];

/// Colors of the fan tray LEDs
pub const FAN_TRAY_LED_COLORS: &[EnumEntry] = &[
    EnumEntry::new("off", 0),
    EnumEntry::new("green", 1),
    EnumEntry::new("red", 2),
    EnumEntry::new("yellow", 3),
];

/// Fan tray airflow direction
pub const AIR_FLOW: &[EnumEntry] = &[
    EnumEntry::new("front-to-back", 0),
    EnumEntry::new("back-to-front", 1),
];

/// PSU 1 LED
pub const LED_PSU1: BitField = BitField::new("led_psu1", PSU_LED_REG, 0, 2).with_enum(LED_COLORS);
/// PSU 2 LED
pub const LED_PSU2: BitField = BitField::new("led_psu2", PSU_LED_REG, 2, 2).with_enum(LED_COLORS);
/// Diagnostic LED
pub const LED_DIAG: BitField = BitField::new("led_diag", SYSTEM_LED_REG, 2, 2).with_enum(DIAG_LED_COLORS);
/// Fan LED
pub const LED_FAN: BitField = BitField::new("led_fan", SYSTEM_LED_REG, 0, 2).with_enum(LED_COLORS);
/// Locator LED
pub const LED_LOC: BitField = BitField::new("led_loc", SYSTEM_LED_REG, 4, 2).with_enum(LOC_LED_COLORS);

/// Fan duty cycle: the register counts 5% steps up to `0x14`, presented as
/// 0-255 with a 20% floor
pub const PWM_SCALE: Scale = Scale::ratio(1275, 100).with_raw_range(4, 0x14);

/// Tachometer registers count in units of 150 rpm
pub const RPM_SCALE: Scale = Scale::multiplier(150);

/// SFP status registers: three per port CPLD, ports 1-24 then 25-48
const fn sfp_registers(first: u8) -> [u32; 6] {
    [
        port1_24(first),
        port1_24(first + 1),
        port1_24(first + 2),
        port25_54(first),
        port25_54(first + 1),
        port25_54(first + 2),
    ]
}

const SFP_PRESENT_REGS: [u32; 6] = sfp_registers(0x06);
const SFP_TX_FAULT_REGS: [u32; 6] = sfp_registers(0x09);
const SFP_TX_DISABLE_REGS: [u32; 6] = sfp_registers(0x0c);
const SFP_RX_LOS_REGS: [u32; 6] = sfp_registers(0x0f);

/// SFP module present, ports 1-48
pub const SFP_PRESENT: PortBitmap = PortBitmap::new(&SFP_PRESENT_REGS, true);
/// SFP transmitter fault, ports 1-48
pub const SFP_TX_FAULT: PortBitmap = PortBitmap::new(&SFP_TX_FAULT_REGS, false);
/// Transmitter enable, stored inverted as tx_disable
pub const SFP_TX_ENABLE: PortBitmap = PortBitmap::new(&SFP_TX_DISABLE_REGS, true);
/// SFP receiver loss of signal, ports 1-48
pub const SFP_RX_LOS: PortBitmap = PortBitmap::new(&SFP_RX_LOS_REGS, false);

/// QSFP bits 5:0 belong to panel ports 54, 51, 53, 50, 52, 49. Reorder them
/// to 54..49.
pub const QSFP_ORDER: BitPermutation = BitPermutation::new(
    &[0x01, 0x08, 0x02, 0x10, 0x04, 0x20],
    &[0x01, 0x04, 0x10, 0x02, 0x08, 0x20],
);

/// QSFP module present, panel order
pub const QSFP_PRESENT: PermutedPorts = PermutedPorts::new(QSFP_PRESENT_STAT_REG, QSFP_ORDER).active_low();
/// QSFP fault, panel order
pub const QSFP_FAULT: PermutedPorts = PermutedPorts::new(QSFP_FAULT_STAT_REG, QSFP_ORDER).active_low();
/// QSFP low-power mode, panel order
pub const QSFP_LP_MODE: PermutedPorts = PermutedPorts::new(QSFP_LPMODE_REG, QSFP_ORDER).writable();
/// QSFP held in reset, panel order
pub const QSFP_RESET: PermutedPorts = PermutedPorts::new(QSFP_MOD_RESET_REG, QSFP_ORDER)
    .active_low()
    .writable();

/// Port EEPROM select: channels 0-23 on the first port CPLD, 24-53 on the
/// second. QSFP channels 49-52 are wired out of panel order.
pub const PORT_MUX: PortMux = PortMux::new(&[
    MuxRange::new(0, 24, PORT1_24_I2C_SELECT_REG),
    MuxRange::new(24, 30, PORT25_54_I2C_SELECT_REG).with_remap(&[(25, 26), (26, 28), (27, 25), (28, 27)]),
]);

/// Fan `n` (1-10) alternates between the front and rear rotor of tray
/// `(n + 1) / 2`.
const fn fan_ok(name: &'static str, n: u8) -> Attribute {
    let register = if n % 2 == 1 { FAN_FAULT_REG } else { FANR_FAULT_REG };
    Attribute::field(BitField::bit(name, register, (n - 1) / 2).active_low().read_only())
}

const fn fan_input(name: &'static str, n: u8) -> Attribute {
    let base = if n % 2 == 1 { 0x10 } else { 0x18 };
    Attribute::scaled(name, system(base + (n - 1) / 2), RPM_SCALE)
}

const fn fan_tray_led(name: &'static str, tray: u8) -> Attribute {
    let field = if tray < 5 {
        BitField::new(name, FAN1_4_LED_REG, (tray - 1) * 2, 2)
    } else {
        BitField::new(name, FAN5_LED_REG, 0, 2)
    };
    Attribute::field(field.with_enum(FAN_TRAY_LED_COLORS).read_only())
}

const fn air_flow(name: &'static str, tray: u8) -> Attribute {
    Attribute::field(
        BitField::bit(name, FAN_DIRECTION_REG, tray - 1)
            .with_enum(AIR_FLOW)
            .read_only(),
    )
}

const fn register_value(name: &'static str, register: u32) -> Attribute {
    Attribute::field(BitField::new(name, register, 0, 8).read_only())
}

/// Every attribute published by the board
pub const ATTRIBUTES: AttributeTable = AttributeTable::new(&[
    register_value("board_id", BOARD_ID_REG),
    register_value("cpld1_version", SYS_CPLD_VERSION_REG),
    register_value("cpld2_version", PORT1_24_CPLD_VERSION_REG),
    register_value("cpld3_version", PORT25_54_CPLD_VERSION_REG),
    Attribute::fixed("pwm1_enable", "1"),
    fan_ok("fan01_ok", 1),
    fan_ok("fan02_ok", 2),
    fan_ok("fan03_ok", 3),
    fan_ok("fan04_ok", 4),
    fan_ok("fan05_ok", 5),
    fan_ok("fan06_ok", 6),
    fan_ok("fan07_ok", 7),
    fan_ok("fan08_ok", 8),
    fan_ok("fan09_ok", 9),
    fan_ok("fan10_ok", 10),
    fan_tray_led("led_fan_tray_1", 1),
    fan_tray_led("led_fan_tray_2", 2),
    fan_tray_led("led_fan_tray_3", 3),
    fan_tray_led("led_fan_tray_4", 4),
    fan_tray_led("led_fan_tray_5", 5),
    air_flow("air_flow_fan_tray_1", 1),
    air_flow("air_flow_fan_tray_2", 2),
    air_flow("air_flow_fan_tray_3", 3),
    air_flow("air_flow_fan_tray_4", 4),
    air_flow("air_flow_fan_tray_5", 5),
    Attribute::status("psu_pwr1_all_ok", &PSU_STATUS, 1, "all_ok"),
    Attribute::status("psu_pwr1_present", &PSU_STATUS, 1, "present"),
    Attribute::status("psu_pwr1_ac_ok", &PSU_STATUS, 1, "ac_ok"),
    Attribute::status("psu_pwr1_dc_ok", &PSU_STATUS, 1, "dc_ok"),
    Attribute::status("psu_pwr2_all_ok", &PSU_STATUS, 2, "all_ok"),
    Attribute::status("psu_pwr2_present", &PSU_STATUS, 2, "present"),
    Attribute::status("psu_pwr2_ac_ok", &PSU_STATUS, 2, "ac_ok"),
    Attribute::status("psu_pwr2_dc_ok", &PSU_STATUS, 2, "dc_ok"),
    Attribute::field(LED_PSU1),
    Attribute::field(LED_PSU2),
    Attribute::field(LED_DIAG),
    Attribute::field(LED_FAN),
    Attribute::field(LED_LOC),
    Attribute::ports("sfp_present", SFP_PRESENT, false),
    Attribute::ports("sfp_tx_fault", SFP_TX_FAULT, false),
    Attribute::ports("sfp_rx_los", SFP_RX_LOS, false),
    Attribute::ports("sfp_tx_enable", SFP_TX_ENABLE, true),
    Attribute::permuted("qsfp_present", QSFP_PRESENT),
    Attribute::permuted("qsfp_fault", QSFP_FAULT),
    Attribute::permuted("qsfp_lp_mode", QSFP_LP_MODE),
    Attribute::permuted("qsfp_reset", QSFP_RESET),
    fan_input("fan01_input", 1),
    fan_input("fan02_input", 2),
    fan_input("fan03_input", 3),
    fan_input("fan04_input", 4),
    fan_input("fan05_input", 5),
    fan_input("fan06_input", 6),
    fan_input("fan07_input", 7),
    fan_input("fan08_input", 8),
    fan_input("fan09_input", 9),
    fan_input("fan10_input", 10),
    Attribute::scaled_rw("pwm1", FAN_PWM_REG, PWM_SCALE),
]);
