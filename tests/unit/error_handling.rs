//! Unit tests for error reporting and recovery in the register layer

use crate::common::{MockInterface, Operation, bus_error, create_mock_registry};
use switch_cpld::boards::as5712_54x::{LAYOUT, PSU_LED_REG};
use switch_cpld::{AddressLayout, ChipRegistry, Error, RegisterAccess};

#[test]
fn test_read_failure_carries_chip_context() {
    let (mut regs, chips) = create_mock_registry::<3>(LAYOUT);
    chips[2].fail_next_read();

    assert_eq!(regs.read_register(LAYOUT.reg(2, 0x14)), Err(bus_error(2, 0x14)));
}

#[test]
fn test_write_failure_carries_chip_context() {
    let (mut regs, chips) = create_mock_registry::<3>(LAYOUT);
    chips[1].fail_next_write();

    assert_eq!(regs.write_register(LAYOUT.reg(1, 0x02), 0x05), Err(bus_error(1, 0x02)));
    assert_eq!(chips[1].get_register(0x02), 0);
}

#[test]
fn test_untagged_register_id_is_rejected_without_traffic() {
    let (mut regs, chips) = create_mock_registry::<3>(LAYOUT);

    // Offset 0x0b with no chip field
    assert_eq!(regs.read_register(0x0b), Err(Error::InvalidChip(0x0b)));
    assert_eq!(regs.write_register(0x10b, 0), Err(Error::InvalidChip(0x10b)));
    assert_eq!(regs.modify_register(0x0b, 0x01, 0x00), Err(Error::InvalidChip(0x0b)));

    assert!(chips.iter().all(|chip| chip.operations().is_empty()));
}

#[test]
fn test_chip_index_out_of_range() {
    let (mut regs, _chips) = create_mock_registry::<3>(LAYOUT);

    // Reported with the id the caller would have built
    assert_eq!(regs.read(3, 0x01), Err(Error::InvalidChip(0x101)));
    assert_eq!(regs.write(7, 0x01, 0), Err(Error::InvalidChip(0x201)));
}

#[test]
fn test_modify_skips_write_after_failed_read() {
    let (mut regs, chips) = create_mock_registry::<3>(LAYOUT);
    chips[0].set_register(0x0b, 0xf0);
    chips[0].fail_next_read();

    assert_eq!(regs.modify_register(PSU_LED_REG, 0x03, 0x02), Err(bus_error(0, 0x0b)));
    assert_eq!(chips[0].write_count(), 0);
    assert_eq!(chips[0].get_register(0x0b), 0xf0);
}

#[test]
fn test_modify_returns_written_value() {
    let (mut regs, chips) = create_mock_registry::<3>(LAYOUT);
    chips[0].set_register(0x0b, 0xf3);

    assert_eq!(regs.modify_register(PSU_LED_REG, 0x03, 0x02), Ok(0xf2));
    assert_eq!(
        chips[0].operations(),
        vec![
            Operation::ReadRegister {
                offset: 0x0b,
                value: 0xf3
            },
            Operation::WriteRegister {
                offset: 0x0b,
                value: 0xf2
            },
        ]
    );
}

#[test]
fn test_registry_recovers_after_failure() {
    let (mut regs, chips) = create_mock_registry::<3>(LAYOUT);
    chips[0].set_register(0x01, 0x07);
    chips[0].fail_next_read();

    assert!(regs.read(0, 0x01).is_err());
    assert_eq!(regs.read(0, 0x01), Ok(0x07));

    chips[0].fail_next_write();
    assert!(regs.write(0, 0x0a, 0x01).is_err());
    regs.write(0, 0x0a, 0x01).unwrap();
    assert_eq!(chips[0].get_register(0x0a), 0x01);
}

#[test]
fn test_missing_transport_is_an_invalid_chip() {
    // Layout names three chips, only two are wired up
    let chips = [MockInterface::new(0x60), MockInterface::new(0x61)];
    let mut regs = ChipRegistry::new(LAYOUT, chips.clone());

    assert_eq!(regs.read(1, 0x01), Ok(0));
    assert_eq!(
        regs.read_register(LAYOUT.reg(2, 0x01)),
        Err(Error::InvalidChip(LAYOUT.reg(2, 0x01)))
    );
    assert!(regs.chip(2).is_none());
    assert!(regs.chip_mut(1).is_some());

    let released = regs.release();
    assert_eq!(released.len(), 2);
}

#[test]
fn test_errors_compare_by_content() {
    let layout = AddressLayout::new(8, 1, 1);
    let (mut regs, chips) = create_mock_registry::<1>(layout);
    chips[0].fail_next_read();

    let err = regs.read(0, 0x05).unwrap_err();
    assert_eq!(err, bus_error(0, 0x05));
    assert_ne!(err, bus_error(0, 0x06));
    assert_ne!(err, Error::InvalidValue);
}
