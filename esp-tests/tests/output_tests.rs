//! Integration Tests für den Output Driver
//!
//! Diese Tests laufen auf dem Host (x86_64) und nutzen MockDutyWriter

mod common;

use common::{MockDutyWriter, controller};
use esp_core::{ChannelDuties, ChannelMode, DUTY_OFF, DutyWriter, OutputDriver, OutputError, OutputState, compute_duties};

fn state(is_on: bool, brightness: u8, mode: ChannelMode) -> OutputState {
    OutputState {
        is_on,
        brightness,
        mode,
    }
}

// ============================================================================
// Tests: MockDutyWriter
// ============================================================================

#[test]
fn test_mock_duty_writer_fail() {
    let mut mock = MockDutyWriter::new();
    mock.fail_next_write = true;

    assert_eq!(mock.write(ChannelDuties::OFF), Err(OutputError::WriteFailed));
    assert!(mock.writes.is_empty());

    // Danach wieder normal
    mock.write(ChannelDuties::OFF).unwrap();
    assert_eq!(mock.writes.len(), 1);
}

// ============================================================================
// Tests: compute_duties
// ============================================================================

#[test]
fn test_inverted_mapping_per_mode() {
    assert_eq!(
        compute_duties(&state(true, 10, ChannelMode::Warm)),
        ChannelDuties { warm: 5, white: DUTY_OFF }
    );
    assert_eq!(
        compute_duties(&state(true, 10, ChannelMode::White)),
        ChannelDuties { warm: DUTY_OFF, white: 5 }
    );
    assert_eq!(
        compute_duties(&state(true, 10, ChannelMode::Both)),
        ChannelDuties { warm: 5, white: 5 }
    );
}

#[test]
fn test_full_brightness_drives_zero_duty() {
    assert_eq!(
        compute_duties(&state(true, 15, ChannelMode::Both)),
        ChannelDuties { warm: 0, white: 0 }
    );
}

#[test]
fn test_off_is_always_fully_off() {
    for brightness in 0..=15 {
        for mode in [ChannelMode::Warm, ChannelMode::White, ChannelMode::Both] {
            assert_eq!(compute_duties(&state(false, brightness, mode)), ChannelDuties::OFF);
        }
    }
}

#[test]
fn test_on_never_drives_dark() {
    for brightness in 0..=15 {
        let duties = compute_duties(&state(true, brightness, ChannelMode::Both));
        assert!(duties.warm < DUTY_OFF, "brightness {} drove warm dark", brightness);
        assert!(duties.white < DUTY_OFF, "brightness {} drove white dark", brightness);
    }
}

// ============================================================================
// Tests: OutputDriver
// ============================================================================

#[test]
fn test_apply_twice_is_idempotent() {
    let mut driver = OutputDriver::new(MockDutyWriter::new());
    let s = state(true, 6, ChannelMode::White);

    driver.apply(&s);
    driver.apply(&s);

    let writes = &driver.writer().writes;
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0], writes[1]);
}

#[test]
fn test_failed_write_keeps_last_duties() {
    let mut driver = OutputDriver::new(MockDutyWriter::new());
    let first = driver.apply(&state(true, 15, ChannelMode::Warm));

    driver.writer_mut().fail_next_write = true;
    driver.apply(&state(false, 15, ChannelMode::Warm));

    assert_eq!(driver.last_duties(), Some(first));
    assert_eq!(driver.writer().writes.len(), 1);
}

#[test]
fn test_controller_applies_power_up_defaults() {
    let controller = controller();

    assert_eq!(*controller.state(), OutputState::default());
    // Both, Helligkeit 8 → 15 - 8 = 7 auf beiden Kanälen
    assert_eq!(
        controller.driver().writer().last(),
        Some(ChannelDuties { warm: 7, white: 7 })
    );
    // Power-Up sendet keinen Frame
    assert!(controller.sink().frames.is_empty());
}
