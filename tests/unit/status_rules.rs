//! Unit tests for good/bad mask status evaluation

use crate::common::create_mock_registry;
use switch_cpld::boards::as5712_54x::{self, PSU_12V_GOOD, PSU_AC_ALERT_L, PSU_PRESENT_L, PSU_STATUS};
use switch_cpld::boards::as7412_32x;
use switch_cpld::{Error, StatusRule};

#[test]
fn test_all_ok_requires_good_bits_and_no_bad_bits() {
    let rule = StatusRule::new("all_ok", PSU_AC_ALERT_L | PSU_12V_GOOD, PSU_PRESENT_L);

    // PRESENT_L set means the supply is missing, whatever else is set
    assert!(!rule.is_ok(0b0000_0111));
    // Present, AC good, 12V good
    assert!(rule.is_ok(0b0000_0110));
    // Present but 12V down
    assert!(!rule.is_ok(0b0000_0100));
    assert_eq!(rule.message(0b0000_0110), "1");
    assert_eq!(rule.message(0b0000_0111), "0");
}

#[test]
fn test_custom_messages() {
    let rule = StatusRule::new("present", 0, 0x01).with_messages("installed", "not_installed");
    assert_eq!(rule.message(0x00), "installed");
    assert_eq!(rule.message(0x01), "not_installed");
}

#[test]
fn test_psu_units_read_their_own_nibble() {
    let (mut regs, chips) = create_mock_registry::<3>(as5712_54x::LAYOUT);
    // PSU 1 healthy, PSU 2 absent
    chips[0].set_register(0x02, 0b0111_0110);

    assert_eq!(PSU_STATUS.evaluate(&mut regs, 1, "all_ok"), Ok("1"));
    assert_eq!(PSU_STATUS.evaluate(&mut regs, 2, "all_ok"), Ok("0"));
    assert_eq!(PSU_STATUS.is_ok(&mut regs, 1, "present"), Ok(true));
    assert_eq!(PSU_STATUS.is_ok(&mut regs, 2, "present"), Ok(false));
}

#[test]
fn test_ac_and_dc_rules_are_independent() {
    let (mut regs, chips) = create_mock_registry::<3>(as5712_54x::LAYOUT);
    // PSU 1 present with AC good but 12V down
    chips[0].set_register(0x02, 0b0000_0100);

    assert_eq!(PSU_STATUS.is_ok(&mut regs, 1, "ac_ok"), Ok(true));
    assert_eq!(PSU_STATUS.is_ok(&mut regs, 1, "dc_ok"), Ok(false));
    assert_eq!(PSU_STATUS.is_ok(&mut regs, 1, "all_ok"), Ok(false));
}

#[test]
fn test_unknown_unit_or_rule_is_rejected_before_reading() {
    let (mut regs, chips) = create_mock_registry::<3>(as5712_54x::LAYOUT);

    assert_eq!(PSU_STATUS.evaluate(&mut regs, 0, "all_ok"), Err(Error::InvalidValue));
    assert_eq!(PSU_STATUS.evaluate(&mut regs, 3, "all_ok"), Err(Error::InvalidValue));
    assert_eq!(PSU_STATUS.evaluate(&mut regs, 1, "on_fire"), Err(Error::InvalidValue));
    assert!(chips[0].operations().is_empty());
}

#[test]
fn test_summary_reads_once_and_stops_at_first_failure() {
    let (mut regs, chips) = create_mock_registry::<3>(as5712_54x::LAYOUT);
    // PSU 1 present with AC good but 12V down; PSU 2 absent
    chips[0].set_register(0x02, 0b0111_0100);

    let summary = PSU_STATUS.summary(&mut regs, 1, &["present", "ac_ok", "dc_ok", "all_ok"]).unwrap();
    assert_eq!(summary.to_string(), "1, 1, 0");
    assert!(!summary.is_ok());
    assert_eq!(summary.bits(), 0b0100);

    let summary = PSU_STATUS.summary(&mut regs, 2, &["present", "all_ok"]).unwrap();
    assert_eq!(summary.to_string(), "0");
    assert_eq!(chips[0].operations().len(), 2);
}

#[test]
fn test_summary_rejects_bad_requests_before_reading() {
    let (mut regs, chips) = create_mock_registry::<2>(as7412_32x::LAYOUT);
    let group = &as7412_32x::PSU_STATUS;

    assert_eq!(group.summary(&mut regs, 1, &[]), Err(Error::InvalidValue));
    assert_eq!(group.summary(&mut regs, 1, &["present", "all_ok"]), Err(Error::InvalidValue));
    assert_eq!(group.summary(&mut regs, 3, as7412_32x::PSU_REPORT), Err(Error::InvalidValue));
    assert!(chips[1].operations().is_empty());
}

#[test]
fn test_rule_lookup() {
    assert_eq!(PSU_STATUS.units(), 2);
    assert_eq!(PSU_STATUS.rule("dc_ok").map(|rule| rule.good_mask), Some(PSU_12V_GOOD));
    assert!(PSU_STATUS.rule("fan_ok").is_none());
}
