//! Integration Tests für den Schedule Evaluator
//!
//! Zeit wird simuliert: die Uhr wird per time_sync bei `now_ms = 0` gesetzt,
//! danach läuft sie mit dem übergebenen monotonen Zeitstempel weiter.

mod common;

use common::{TestController, controller, send, set_clock};
use esp_core::schedule::{alarm_ramp_brightness, routine_window_contains};
use esp_core::{ActiveScheduleRef, Alarm, ChannelMode, ClockTime, MAX_ROUTINES, OutputState};

const MINUTE_MS: u64 = 60_000;

fn t(hour: u8, minute: u8) -> ClockTime {
    ClockTime { hour, minute }
}

fn upsert_routine(c: &mut TestController, id: i32, enabled: bool, start: (u8, u8), end: (u8, u8), brightness: u8, mode: u8) {
    let frame = format!(
        r#"{{"type":"routine_sync","action":"upsert","data":{{"id":{},"enabled":{},"start_hour":{},"start_minute":{},"end_hour":{},"end_minute":{},"brightness":{},"mode":{},"name":"Routine {}"}}}}"#,
        id, enabled, start.0, start.1, end.0, end.1, brightness, mode, id
    );
    send(c, &frame, 0);
}

fn upsert_alarm(c: &mut TestController, id: i32, start: (u8, u8), wake: (u8, u8), duration: u16) {
    let frame = format!(
        r#"{{"type":"alarm_sync","action":"upsert","data":{{"id":{},"enabled":true,"wake_hour":{},"wake_minute":{},"start_hour":{},"start_minute":{},"duration_minutes":{}}}}}"#,
        id, wake.0, wake.1, start.0, start.1, duration
    );
    send(c, &frame, 0);
}

// ============================================================================
// Tests: Zeitfenster
// ============================================================================

#[test]
fn test_routine_with_equal_start_and_end_covers_whole_day() {
    for minute in 0..24 * 60u16 {
        let probe = t((minute / 60) as u8, (minute % 60) as u8);
        assert!(routine_window_contains(t(9, 30), t(9, 30), probe));
    }
}

#[test]
fn test_wrapping_window_membership() {
    let (start, end) = (t(22, 0), t(6, 0));
    for minute in 0..24 * 60u16 {
        let probe = t((minute / 60) as u8, (minute % 60) as u8);
        let expected = minute >= 22 * 60 || minute < 6 * 60;
        assert_eq!(routine_window_contains(start, end, probe), expected, "minute {}", minute);
    }
}

#[test]
fn test_alarm_ramp_is_monotonic_from_zero_to_full() {
    let alarm = Alarm {
        id: 1,
        enabled: true,
        wake: t(6, 30),
        start: t(6, 0),
        duration_minutes: 30,
    };

    assert_eq!(alarm_ramp_brightness(&alarm, t(6, 0)), 0);
    assert_eq!(alarm_ramp_brightness(&alarm, t(6, 30)), 15);

    let mut previous = 0;
    for minute in 0..=30 {
        let level = alarm_ramp_brightness(&alarm, t(6, minute));
        assert!(level >= previous, "ramp dropped at minute {}", minute);
        previous = level;
    }
}

#[test]
fn test_zero_duration_alarm_is_full_immediately() {
    let alarm = Alarm {
        id: 1,
        enabled: true,
        wake: t(6, 0),
        start: t(6, 0),
        duration_minutes: 0,
    };
    assert_eq!(alarm_ramp_brightness(&alarm, t(6, 0)), 15);
}

// ============================================================================
// Tests: Routinen
// ============================================================================

#[test]
fn test_routine_at_eight_applies_and_emits_one_frame() {
    let mut c = controller();
    upsert_routine(&mut c, 1, true, (7, 0), (22, 0), 10, 2);
    set_clock(&mut c, 8, 0, 0);
    c.sink_mut().clear();

    c.poll_schedule(0);

    assert_eq!(
        *c.state(),
        OutputState {
            is_on: true,
            brightness: 10,
            mode: ChannelMode::Both
        }
    );
    assert_eq!(c.active_schedule(), ActiveScheduleRef::Routine(1));
    let states = c.sink().states();
    assert_eq!(states.len(), 1);
    assert!(states[0].routine_active);
    assert!(!states[0].alarm_active);
}

#[test]
fn test_disabling_routine_restores_snapshot_not_live_state() {
    let mut c = controller();
    send(&mut c, r#"{"on":false}"#, 0);
    let before = *c.state();

    upsert_routine(&mut c, 1, true, (7, 0), (22, 0), 10, 2);
    set_clock(&mut c, 8, 0, 0);
    c.poll_schedule(0);

    // Manuelle Änderung während die Routine aktiv ist
    send(&mut c, r#"{"brightness":3,"mode":0}"#, 100);
    assert_eq!(c.state().brightness, 3);

    upsert_routine(&mut c, 1, false, (7, 0), (22, 0), 10, 2);
    c.sink_mut().clear();
    c.poll_schedule(1000);

    assert_eq!(*c.state(), before);
    assert!(!c.state().is_on);
    assert_eq!(c.active_schedule(), ActiveScheduleRef::None);
    assert_eq!(c.sink().states().len(), 1);
}

#[test]
fn test_manual_change_is_overwritten_on_next_minute() {
    let mut c = controller();
    upsert_routine(&mut c, 1, true, (7, 0), (22, 0), 10, 2);
    set_clock(&mut c, 8, 0, 0);
    c.poll_schedule(0);

    send(&mut c, r#"{"brightness":3}"#, 100);
    c.sink_mut().clear();

    // Gleiche Minute: keine erneute Anwendung
    c.poll_schedule(1000);
    assert_eq!(c.state().brightness, 3);
    assert!(c.sink().frames.is_empty());

    // Nächste Minute: Routine setzt sich wieder durch
    c.poll_schedule(MINUTE_MS);
    assert_eq!(c.state().brightness, 10);
    assert_eq!(c.sink().states().len(), 1);
}

#[test]
fn test_routine_end_is_exclusive_and_restores() {
    let mut c = controller();
    upsert_routine(&mut c, 1, true, (7, 0), (7, 2), 12, 1);
    set_clock(&mut c, 7, 1, 0);

    c.poll_schedule(0);
    assert_eq!(c.state().brightness, 12);

    c.poll_schedule(MINUTE_MS);
    assert_eq!(*c.state(), OutputState::default());
    assert_eq!(c.active_schedule(), ActiveScheduleRef::None);
}

#[test]
fn test_first_matching_routine_wins() {
    let mut c = controller();
    upsert_routine(&mut c, 1, true, (6, 0), (12, 0), 4, 0);
    upsert_routine(&mut c, 2, true, (7, 0), (9, 0), 14, 1);
    set_clock(&mut c, 8, 0, 0);

    c.poll_schedule(0);

    assert_eq!(c.active_schedule(), ActiveScheduleRef::Routine(1));
    assert_eq!(c.state().brightness, 4);
    assert_eq!(c.state().mode, ChannelMode::Warm);
}

#[test]
fn test_switch_between_routines_keeps_first_snapshot() {
    let mut c = controller();
    upsert_routine(&mut c, 1, true, (7, 0), (8, 0), 4, 0);
    upsert_routine(&mut c, 2, true, (8, 0), (9, 0), 14, 1);
    set_clock(&mut c, 7, 59, 0);

    c.poll_schedule(0);
    assert_eq!(c.active_schedule(), ActiveScheduleRef::Routine(1));

    c.poll_schedule(MINUTE_MS);
    assert_eq!(c.active_schedule(), ActiveScheduleRef::Routine(2));
    assert_eq!(c.state().brightness, 14);

    c.poll_schedule(61 * MINUTE_MS);
    assert_eq!(*c.state(), OutputState::default());
}

#[test]
fn test_full_capacity_upsert_is_rejected() {
    let mut c = controller();
    for id in 1..=MAX_ROUTINES as i32 {
        upsert_routine(&mut c, id, false, (1, 0), (2, 0), 5, 0);
    }
    c.sink_mut().clear();

    upsert_routine(&mut c, 99, true, (1, 0), (2, 0), 5, 0);

    let acks = c.sink().acks();
    assert_eq!(acks.len(), 1);
    assert!(!acks[0].success);
    assert_eq!(acks[0].message, "Storage full");
    assert_eq!(c.store().routines.len(), MAX_ROUTINES);
    assert!(c.store().routines.find(99).is_none());
}

// ============================================================================
// Tests: Alarme
// ============================================================================

#[test]
fn test_alarm_ramps_then_restores() {
    let mut c = controller();
    send(&mut c, r#"{"brightness":5,"mode":1}"#, 0);
    let before = *c.state();

    upsert_alarm(&mut c, 7, (6, 0), (6, 30), 30);
    set_clock(&mut c, 6, 0, 0);
    c.sink_mut().clear();

    c.poll_schedule(0);
    assert_eq!(c.active_schedule(), ActiveScheduleRef::Alarm(7));
    assert_eq!(c.state().brightness, 0);
    assert_eq!(c.state().mode, ChannelMode::Warm);
    assert!(c.state().is_on);

    c.poll_schedule(15 * MINUTE_MS);
    assert_eq!(c.state().brightness, 7);

    c.poll_schedule(30 * MINUTE_MS);
    assert_eq!(c.state().brightness, 15);

    c.poll_schedule(31 * MINUTE_MS);
    assert_eq!(*c.state(), before);
    assert_eq!(c.active_schedule(), ActiveScheduleRef::None);

    let states = c.sink().states();
    assert_eq!(states.len(), 4);
    assert!(states[..3].iter().all(|s| s.alarm_active));
    assert!(!states[3].alarm_active);
}

#[test]
fn test_zero_duration_alarm_lights_fully_at_wake_minute() {
    let mut c = controller();
    upsert_alarm(&mut c, 4, (6, 0), (6, 0), 0);
    set_clock(&mut c, 6, 0, 0);
    c.sink_mut().clear();

    c.poll_schedule(0);
    assert_eq!(c.active_schedule(), ActiveScheduleRef::Alarm(4));
    assert_eq!(c.state().brightness, 15);
    assert_eq!(c.sink().states().len(), 1);
    assert_eq!(c.sink().states()[0].brightness, 15);
}

#[test]
fn test_routine_pre_empts_active_alarm() {
    let mut c = controller();
    send(&mut c, r#"{"on":false}"#, 0);
    let before = *c.state();

    upsert_alarm(&mut c, 7, (6, 0), (6, 30), 30);
    set_clock(&mut c, 6, 10, 0);
    c.poll_schedule(0);
    assert_eq!(c.active_schedule(), ActiveScheduleRef::Alarm(7));

    upsert_routine(&mut c, 1, true, (6, 0), (7, 0), 9, 2);
    c.poll_schedule(1000);
    assert_eq!(c.active_schedule(), ActiveScheduleRef::Routine(1));
    assert_eq!(c.state().brightness, 9);

    // Routine weg: Zustand vor dem Alarm kommt zurück
    send(&mut c, r#"{"type":"routine_sync","action":"delete","id":1}"#, 1500);
    c.poll_schedule(2000);
    assert_eq!(*c.state(), before);
    assert_eq!(c.active_schedule(), ActiveScheduleRef::None);

    // Alarm läuft im nächsten Tick wieder an
    c.poll_schedule(3000);
    assert_eq!(c.active_schedule(), ActiveScheduleRef::Alarm(7));
}

#[test]
fn test_alarm_not_evaluated_while_routine_active() {
    let mut c = controller();
    upsert_routine(&mut c, 1, true, (5, 0), (8, 0), 11, 1);
    upsert_alarm(&mut c, 7, (6, 0), (6, 30), 30);
    set_clock(&mut c, 6, 15, 0);

    c.poll_schedule(0);

    assert_eq!(c.active_schedule(), ActiveScheduleRef::Routine(1));
    assert_eq!(c.state().mode, ChannelMode::White);
}

// ============================================================================
// Tests: Uhr
// ============================================================================

#[test]
fn test_unset_clock_runs_no_schedule() {
    let mut c = controller();
    upsert_routine(&mut c, 1, true, (0, 0), (0, 0), 3, 0);
    c.sink_mut().clear();

    c.poll_schedule(0);
    c.poll_schedule(5000);

    assert_eq!(*c.state(), OutputState::default());
    assert_eq!(c.active_schedule(), ActiveScheduleRef::None);
    assert!(c.sink().frames.is_empty());
}

#[test]
fn test_tick_gate_limits_evaluation() {
    let mut c = controller();
    upsert_routine(&mut c, 1, true, (7, 0), (22, 0), 10, 2);
    set_clock(&mut c, 8, 0, 0);

    c.poll_schedule(0);
    send(&mut c, r#"{"type":"routine_sync","action":"delete","id":1}"#, 10);

    // Innerhalb der Tick-Periode passiert nichts
    c.poll_schedule(500);
    assert_eq!(c.active_schedule(), ActiveScheduleRef::Routine(1));

    c.poll_schedule(1000);
    assert_eq!(c.active_schedule(), ActiveScheduleRef::None);
}
