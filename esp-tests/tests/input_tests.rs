//! Integration Tests für Encoder und Taster
//!
//! Automaten werden mit Zeitstempeln und Pin-Pegeln gefüttert,
//! der Controller mit den daraus entstehenden Ereignissen.

mod common;

use common::{MockDutyWriter, RecordingSink, controller};
use esp_core::input::ClickState;
use esp_core::{
    ButtonConfig, ButtonEvent, ChannelMode, InputEvents, InputHandler, InputLevels, LampController, OutputState,
};

const IDLE: InputLevels = InputLevels {
    encoder_a: true,
    encoder_b: true,
    button_high: true,
};

fn button(high: bool) -> InputLevels {
    InputLevels {
        button_high: high,
        ..IDLE
    }
}

fn encoder(a: bool, b: bool) -> InputLevels {
    InputLevels {
        encoder_a: a,
        encoder_b: b,
        ..IDLE
    }
}

fn handler() -> InputHandler {
    InputHandler::new(IDLE, ButtonConfig::default())
}

// ============================================================================
// Tests: Button
// ============================================================================

#[test]
fn test_two_releases_within_window_is_double_click() {
    let mut input = handler();
    let mut clicks = Vec::new();

    for (t, high) in [(0, false), (100, true), (200, false), (300, true)] {
        clicks.extend(input.poll(t, button(high)).click);
    }
    // Fenster lange abgelaufen: kein nachträglicher Einzelklick
    clicks.extend(input.poll(2000, button(true)).click);

    assert_eq!(clicks, vec![ButtonEvent::DoubleClick]);
    assert_eq!(input.button().click_count(), 0);
    assert_eq!(input.button().state(), ClickState::Idle);
}

#[test]
fn test_single_release_is_classified_after_timeout() {
    let mut input = handler();

    assert_eq!(input.poll(0, button(false)).click, None);
    assert_eq!(input.poll(100, button(true)).click, None);
    assert_eq!(input.button().click_count(), 1);

    // Genau 500 ms nach dem Release noch offen
    assert_eq!(input.poll(600, button(true)).click, None);
    assert_eq!(input.poll(601, button(true)).click, Some(ButtonEvent::SingleClick));
    assert_eq!(input.button().click_count(), 0);
}

#[test]
fn test_bounce_within_debounce_window_is_ignored() {
    let mut input = handler();

    input.poll(0, button(false));
    // Prellen beim Drücken
    input.poll(10, button(true));
    input.poll(20, button(false));
    // Echter Release
    input.poll(100, button(true));

    assert_eq!(input.button().click_count(), 1);
    assert_eq!(input.poll(700, button(true)).click, Some(ButtonEvent::SingleClick));
}

#[test]
fn test_active_high_button() {
    let config = ButtonConfig {
        active_low: false,
        ..ButtonConfig::default()
    };
    let idle_low = InputLevels {
        button_high: false,
        ..IDLE
    };
    let mut input = InputHandler::new(idle_low, config);

    input.poll(0, button(true));
    input.poll(100, button(false));
    assert_eq!(input.poll(700, button(false)).click, Some(ButtonEvent::SingleClick));
}

// ============================================================================
// Tests: Encoder
// ============================================================================

#[test]
fn test_encoder_detents_produce_deltas() {
    let mut input = handler();
    let cw = [encoder(true, false), encoder(false, false), encoder(false, true), encoder(true, true)];

    let mut total = 0;
    for (t, levels) in cw.iter().chain(cw.iter()).enumerate() {
        total += input.poll(t as u64, *levels).brightness_delta;
    }
    assert_eq!(total, 2);

    // Rückwärts zurück auf Position 0
    let mut total = 0;
    for (t, levels) in cw.iter().rev().skip(1).chain(core::iter::once(&IDLE)).enumerate() {
        total += input.poll(100 + t as u64, *levels).brightness_delta;
    }
    assert_eq!(total, -1);
}

// ============================================================================
// Tests: Controller
// ============================================================================

fn delta(value: i32) -> InputEvents {
    InputEvents {
        brightness_delta: value,
        click: None,
    }
}

fn click(event: ButtonEvent) -> InputEvents {
    InputEvents {
        brightness_delta: 0,
        click: Some(event),
    }
}

fn controller_with(state: OutputState) -> LampController<MockDutyWriter, RecordingSink> {
    LampController::with_state(MockDutyWriter::new(), RecordingSink::default(), state)
}

#[test]
fn test_encoder_while_off_can_reach_zero() {
    let mut c = controller_with(OutputState {
        is_on: false,
        brightness: 2,
        mode: ChannelMode::Warm,
    });

    c.handle_input(delta(-5));
    assert_eq!(c.state().brightness, 0);
    assert_eq!(c.sink().states().len(), 1);
}

#[test]
fn test_encoder_while_on_floors_at_one() {
    let mut c = controller_with(OutputState {
        is_on: true,
        brightness: 2,
        mode: ChannelMode::Warm,
    });

    c.handle_input(delta(-5));
    assert_eq!(c.state().brightness, 1);
    c.handle_input(delta(40));
    assert_eq!(c.state().brightness, 15);
}

#[test]
fn test_encoder_without_change_emits_nothing() {
    let mut c = controller_with(OutputState {
        is_on: true,
        brightness: 15,
        mode: ChannelMode::Both,
    });
    let writes_before = c.driver().writer().writes.len();

    c.handle_input(delta(3));

    assert!(c.sink().frames.is_empty());
    assert_eq!(c.driver().writer().writes.len(), writes_before);
}

#[test]
fn test_double_click_cycles_mode_once_without_toggle() {
    let mut c = controller();
    assert_eq!(c.state().mode, ChannelMode::Both);

    c.handle_input(click(ButtonEvent::DoubleClick));

    assert_eq!(c.state().mode, ChannelMode::Warm);
    assert!(c.state().is_on);
    let states = c.sink().states();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].mode, 0);
}

#[test]
fn test_single_click_toggles_power() {
    let mut c = controller();

    c.handle_input(click(ButtonEvent::SingleClick));
    assert!(!c.state().is_on);
    assert_eq!(c.driver().writer().last(), Some(esp_core::ChannelDuties::OFF));

    c.handle_input(click(ButtonEvent::SingleClick));
    assert!(c.state().is_on);
    assert_eq!(c.sink().states().len(), 2);
}

#[test]
fn test_switching_on_at_zero_restores_floor() {
    let mut c = controller_with(OutputState {
        is_on: false,
        brightness: 0,
        mode: ChannelMode::White,
    });

    c.handle_input(click(ButtonEvent::SingleClick));
    assert!(c.state().is_on);
    assert_eq!(c.state().brightness, 1);
}
