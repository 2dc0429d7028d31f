//! Schedule Evaluator
//!
//! Entscheidet pro Tick, welche Routine oder welcher Alarm die Lampe steuert,
//! und führt die Übergänge aktiv ↔ inaktiv inklusive Snapshot/Restore aus.
//!
//! Priorität: eine aktive Routine verdrängt die Alarm-Auswertung komplett.
//! Der Evaluator ist der einzige Schreiber von `ActiveScheduleRef`.

use crate::store::ScheduleStore;
use crate::types::{ActiveScheduleRef, Alarm, ChannelMode, ClockTime, MAX_BRIGHTNESS, OutputState, Routine};

/// Periode des Schedule-Ticks
pub const SCHEDULE_TICK_INTERVAL_MS: u64 = 1000;

/// Periode der "Uhr nicht gesetzt" Warnung
pub const CLOCK_WARNING_INTERVAL_MS: u64 = 30_000;

/// Zeitfenster einer Routine: `[start, end)`, über Mitternacht wenn `end < start`,
/// ganztägig wenn `start == end`
pub fn routine_window_contains(start: ClockTime, end: ClockTime, now: ClockTime) -> bool {
    let start = start.minutes_of_day();
    let end = end.minutes_of_day();
    let current = now.minutes_of_day();

    if start == end {
        true
    } else if end < start {
        current >= start || current < end
    } else {
        start <= current && current < end
    }
}

/// Zeitfenster eines Alarms: `[start, wake]`, ohne Mitternachts-Behandlung
pub fn alarm_window_contains(alarm: &Alarm, now: ClockTime) -> bool {
    let current = now.minutes_of_day();
    alarm.start.minutes_of_day() <= current && current <= alarm.wake.minutes_of_day()
}

/// Helligkeit der Weck-Rampe: `floor(clamp((now - start) / duration, 0, 1) * 15)`
///
/// Ganzzahlig gerechnet, damit 0 am Start und 15 bei voller Dauer exakt sind.
pub fn alarm_ramp_brightness(alarm: &Alarm, now: ClockTime) -> u8 {
    let elapsed = i32::from(now.minutes_of_day()) - i32::from(alarm.start.minutes_of_day());
    let duration = i32::from(alarm.duration_minutes);
    // Dauer 0: volle Helligkeit im ganzen Fenster, auch in der Start-Minute
    if elapsed >= duration {
        return MAX_BRIGHTNESS;
    }
    if elapsed <= 0 {
        return 0;
    }
    (elapsed * i32::from(MAX_BRIGHTNESS) / duration) as u8
}

impl Routine {
    pub fn is_active_at(&self, now: ClockTime) -> bool {
        self.enabled && routine_window_contains(self.start, self.end, now)
    }
}

impl Alarm {
    pub fn is_active_at(&self, now: ClockTime) -> bool {
        self.enabled && alarm_window_contains(self, now)
    }
}

/// Was ein Tick am OutputState geändert hat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScheduleTransition {
    /// Routine angewendet (`started` = Besitzer hat gewechselt)
    RoutineApplied { id: i32, started: bool },
    /// Routine beendet, Snapshot wiederhergestellt
    RoutineEnded { id: i32 },
    /// Alarm-Rampe angewendet
    AlarmApplied { id: i32, started: bool, brightness: u8 },
    /// Alarm beendet, Snapshot wiederhergestellt
    AlarmEnded { id: i32 },
}

/// Zustand des Evaluators: aktiver Besitzer und ein Snapshot pro Zeitplan-Art
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleEvaluator {
    active: ActiveScheduleRef,
    routine_snapshot: Option<OutputState>,
    alarm_snapshot: Option<OutputState>,
    last_applied_minute: Option<u16>,
}

impl ScheduleEvaluator {
    pub const fn new() -> Self {
        Self {
            active: ActiveScheduleRef::None,
            routine_snapshot: None,
            alarm_snapshot: None,
            last_applied_minute: None,
        }
    }

    pub fn active(&self) -> ActiveScheduleRef {
        self.active
    }

    pub fn routine_snapshot(&self) -> Option<OutputState> {
        self.routine_snapshot
    }

    pub fn alarm_snapshot(&self) -> Option<OutputState> {
        self.alarm_snapshot
    }

    /// Nächster Tick wendet den aktiven Zeitplan erneut an, auch in derselben Minute
    ///
    /// Nach Änderungen an Zeitplänen oder Uhr.
    pub fn request_reassert(&mut self) {
        self.last_applied_minute = None;
    }

    /// Ein Tick: liefert `Some`, wenn `state` überschrieben wurde
    ///
    /// Solange derselbe Zeitplan innerhalb derselben Minute aktiv bleibt,
    /// wird nichts erneut angewendet.
    pub fn evaluate(
        &mut self,
        now: ClockTime,
        store: &ScheduleStore,
        state: &mut OutputState,
    ) -> Option<ScheduleTransition> {
        let minute = now.minutes_of_day();

        // Routinen: erster Treffer in Speicher-Reihenfolge gewinnt
        if let Some(routine) = store.routines.as_slice().iter().find(|r| r.is_active_at(now)) {
            let started = self.active != ActiveScheduleRef::Routine(routine.id);
            if !started && self.last_applied_minute == Some(minute) {
                return None;
            }

            if started {
                match self.active {
                    ActiveScheduleRef::None => {
                        self.routine_snapshot = Some(*state);
                        info!(
                            "Schedule: routine {} starts, saved state on={} brightness={} mode={}",
                            routine.id,
                            state.is_on,
                            state.brightness,
                            state.mode.as_wire()
                        );
                    }
                    ActiveScheduleRef::Alarm(alarm_id) => {
                        // Routine verdrängt den Alarm und übernimmt dessen Snapshot
                        self.routine_snapshot = self.alarm_snapshot.take();
                        info!(
                            "Schedule: routine {} pre-empts alarm {}",
                            routine.id,
                            alarm_id
                        );
                    }
                    ActiveScheduleRef::Routine(previous) => {
                        info!("Schedule: routine {} replaces routine {}", routine.id, previous);
                    }
                }
                self.active = ActiveScheduleRef::Routine(routine.id);
            }

            self.last_applied_minute = Some(minute);
            *state = OutputState {
                is_on: true,
                brightness: routine.brightness,
                mode: routine.mode,
            };
            return Some(ScheduleTransition::RoutineApplied {
                id: routine.id,
                started,
            });
        }

        if let ActiveScheduleRef::Routine(id) = self.active {
            if let Some(saved) = self.routine_snapshot.take() {
                *state = saved;
            }
            self.active = ActiveScheduleRef::None;
            self.last_applied_minute = None;
            info!("Schedule: routine {} ended, state restored", id);
            return Some(ScheduleTransition::RoutineEnded { id });
        }

        // Alarme nur wenn keine Routine aktiv ist
        if let Some(alarm) = store.alarms.as_slice().iter().find(|a| a.is_active_at(now)) {
            let started = self.active != ActiveScheduleRef::Alarm(alarm.id);
            if !started && self.last_applied_minute == Some(minute) {
                return None;
            }

            if started {
                if self.active == ActiveScheduleRef::None {
                    self.alarm_snapshot = Some(*state);
                    info!(
                        "Schedule: alarm {} starts, saved state on={} brightness={} mode={}",
                        alarm.id,
                        state.is_on,
                        state.brightness,
                        state.mode.as_wire()
                    );
                }
                self.active = ActiveScheduleRef::Alarm(alarm.id);
            }

            let brightness = alarm_ramp_brightness(alarm, now);
            self.last_applied_minute = Some(minute);
            *state = OutputState {
                is_on: true,
                brightness,
                mode: ChannelMode::Warm,
            };
            return Some(ScheduleTransition::AlarmApplied {
                id: alarm.id,
                started,
                brightness,
            });
        }

        if let ActiveScheduleRef::Alarm(id) = self.active {
            if let Some(saved) = self.alarm_snapshot.take() {
                *state = saved;
            }
            self.active = ActiveScheduleRef::None;
            self.last_applied_minute = None;
            info!("Schedule: alarm {} ended, state restored", id);
            return Some(ScheduleTransition::AlarmEnded { id });
        }

        None
    }
}

/// Zeit-Gate für periodische Arbeit im Loop (kein präziser Timer)
#[derive(Debug, Clone, Copy)]
pub struct TickGate {
    period_ms: u64,
    last_ms: Option<u64>,
}

impl TickGate {
    pub const fn new(period_ms: u64) -> Self {
        Self {
            period_ms,
            last_ms: None,
        }
    }

    /// true, wenn seit dem letzten Auslösen mindestens eine Periode vergangen ist
    pub fn ready(&mut self, now_ms: u64) -> bool {
        match self.last_ms {
            Some(last) if now_ms.saturating_sub(last) < self.period_ms => false,
            _ => {
                self.last_ms = Some(now_ms);
                true
            }
        }
    }
}
