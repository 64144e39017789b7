//! End-to-end tests for the AS5712-54X board over a simulated I2C bus

use crate::common::mock_i2c::{MockI2c, Transfer};
use crate::common::{create_mock_registry, show};
use switch_cpld::boards::as5712_54x::{
    ATTRIBUTES, I2C_ADDRESSES, LAYOUT, LED_DIAG, PORT_MUX, PSU_STATUS, SFP_PRESENT,
};
use switch_cpld::{ChipRegistry, FieldInput, I2cInterface, Value};

fn bring_up(bus: &MockI2c) -> ChipRegistry<I2cInterface<MockI2c>, 3> {
    for address in I2C_ADDRESSES {
        bus.add_device(address);
    }
    let chips = core::array::from_fn(|i| I2cInterface::new(bus.clone(), I2C_ADDRESSES[i]));
    ChipRegistry::new(LAYOUT, chips)
}

#[test]
fn test_board_identification() {
    let bus = MockI2c::new();
    let mut regs = bring_up(&bus);
    bus.set_register(0x60, 0x00, 0x01);
    bus.set_register(0x60, 0x01, 0x0a);
    bus.set_register(0x61, 0x01, 0x0c);
    bus.set_register(0x62, 0x01, 0x0d);

    assert_eq!(show(&ATTRIBUTES, "board_id", &mut regs).unwrap(), "1\n");
    assert_eq!(show(&ATTRIBUTES, "cpld1_version", &mut regs).unwrap(), "10\n");
    assert_eq!(show(&ATTRIBUTES, "cpld2_version", &mut regs).unwrap(), "12\n");
    assert_eq!(show(&ATTRIBUTES, "cpld3_version", &mut regs).unwrap(), "13\n");
}

#[test]
fn test_power_and_led_policy() {
    // Step 1: PSU 1 healthy, PSU 2 present without AC
    let bus = MockI2c::new();
    let mut regs = bring_up(&bus);
    bus.set_register(0x60, 0x02, 0b0010_0110);
    bus.set_register(0x60, 0x0a, 0b0001_1011);

    assert_eq!(PSU_STATUS.is_ok(&mut regs, 1, "all_ok"), Ok(true));
    assert_eq!(PSU_STATUS.is_ok(&mut regs, 2, "present"), Ok(true));
    assert_eq!(PSU_STATUS.is_ok(&mut regs, 2, "ac_ok"), Ok(false));

    // Step 2: reflect it on the front panel
    ATTRIBUTES.store("led_psu1", &mut regs, "green").unwrap();
    ATTRIBUTES.store("led_psu2", &mut regs, "yellow").unwrap();
    assert_eq!(bus.get_register(0x60, 0x0b), Some(0b0000_0110));

    // Step 3: diagnostic LED goes red, locator and fan bits untouched
    LED_DIAG.set(&mut regs, FieldInput::Named("red")).unwrap();
    assert_eq!(bus.get_register(0x60, 0x0a), Some(0b0001_0111));
    assert_eq!(LED_DIAG.get(&mut regs), Ok(Value::Named("red")));
    assert_eq!(show(&ATTRIBUTES, "led_loc", &mut regs).unwrap(), "off\n");
}

#[test]
fn test_fan_monitoring() {
    let bus = MockI2c::new();
    let mut regs = bring_up(&bus);
    // Tray 3 front rotor faulted, tray 3 LED yellow, all trays front-to-back
    bus.set_register(0x60, 0x0c, 0b0000_0100);
    bus.set_register(0x60, 0x16, 0b0011_0000);
    bus.set_register(0x60, 0x12, 0);
    bus.set_register(0x60, 0x1a, 80);
    bus.set_register(0x60, 0x0d, 0x0a);

    assert_eq!(show(&ATTRIBUTES, "fan05_ok", &mut regs).unwrap(), "0\n");
    assert_eq!(show(&ATTRIBUTES, "fan06_ok", &mut regs).unwrap(), "1\n");
    assert_eq!(show(&ATTRIBUTES, "fan05_input", &mut regs).unwrap(), "0\n");
    assert_eq!(show(&ATTRIBUTES, "fan06_input", &mut regs).unwrap(), "12000\n");
    assert_eq!(show(&ATTRIBUTES, "led_fan_tray_3", &mut regs).unwrap(), "yellow\n");
    assert_eq!(show(&ATTRIBUTES, "air_flow_fan_tray_3", &mut regs).unwrap(), "front-to-back\n");
    assert_eq!(show(&ATTRIBUTES, "pwm1", &mut regs).unwrap(), "127\n");

    // Spin up to full speed
    ATTRIBUTES.store("pwm1", &mut regs, "255").unwrap();
    assert_eq!(bus.get_register(0x60, 0x0d), Some(0x14));
}

#[test]
fn test_transceiver_eeprom_access() {
    let bus = MockI2c::new();
    let mut regs = bring_up(&bus);
    // SFP port 1 and one QSFP cage populated
    for (address, offset) in [(0x61, 0x06), (0x61, 0x07), (0x61, 0x08), (0x62, 0x06), (0x62, 0x07), (0x62, 0x08)] {
        bus.set_register(address, offset, 0xff);
    }
    bus.set_register(0x61, 0x06, 0xfe);
    bus.set_register(0x62, 0x14, !0b0000_0100);

    // Step 1: discover modules
    assert_eq!(SFP_PRESENT.read(&mut regs), Ok(0x1));
    assert_eq!(show(&ATTRIBUTES, "qsfp_present", &mut regs).unwrap(), "0x02\n");

    // Step 2: route port 50 to the shared EEPROM bus
    let before = bus.transfers().len();
    PORT_MUX.select(&mut regs, 49).unwrap();
    assert_eq!(
        bus.transfers()[before..],
        [Transfer::Write {
            address: 0x62,
            bytes: vec![0x02, 26]
        }]
    );

    // Step 3: release the bus
    PORT_MUX.deselect(&mut regs).unwrap();
    assert_eq!(bus.get_register(0x61, 0x02), Some(0xff));
    assert_eq!(bus.get_register(0x62, 0x02), Some(0xff));
}

#[test]
fn test_transceiver_control() {
    let bus = MockI2c::new();
    let mut regs = bring_up(&bus);

    // Enable every SFP transmitter, then hold all but the first QSFP in reset
    ATTRIBUTES.store("sfp_tx_enable", &mut regs, "0xffffffffffff").unwrap();
    for address in [0x61, 0x62] {
        for offset in 0x0c..=0x0e {
            assert_eq!(bus.get_register(address, offset), Some(0x00));
        }
    }

    ATTRIBUTES.store("qsfp_reset", &mut regs, "0x3e").unwrap();
    assert_eq!(bus.get_register(0x62, 0x15), Some(0x01));
    assert_eq!(show(&ATTRIBUTES, "qsfp_reset", &mut regs).unwrap(), "0x3e\n");
}

#[test]
fn test_every_attribute_renders() {
    let (mut regs, _chips) = create_mock_registry::<3>(LAYOUT);

    for attr in &ATTRIBUTES {
        let text = show(&ATTRIBUTES, attr.name, &mut regs).unwrap();
        assert!(text.ends_with('\n'), "{attr} rendered {text:?}");
    }

    let writable: Vec<&str> = ATTRIBUTES
        .iter()
        .filter(|attr| attr.is_writable())
        .map(|attr| attr.name)
        .collect();
    assert_eq!(
        writable,
        [
            "pwm1_enable",
            "led_psu1",
            "led_psu2",
            "led_diag",
            "led_fan",
            "led_loc",
            "sfp_tx_enable",
            "qsfp_lp_mode",
            "qsfp_reset",
            "pwm1"
        ]
    );
}
