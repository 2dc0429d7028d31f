//! Lamp Controller
//!
//! Expliziter Kontext, den der Main-Loop besitzt: OutputState, Zeitpläne,
//! Uhr, Schedule Evaluator, Output Driver und Frame-Ausgang. Alle Mutationen
//! laufen über `&mut self`, es gibt keinen globalen Zustand.

use crate::clock::WallClock;
use crate::input::{ButtonEvent, InputEvents};
use crate::output::OutputDriver;
use crate::protocol::{OutboundFrame, StatePayload};
use crate::schedule::{CLOCK_WARNING_INTERVAL_MS, SCHEDULE_TICK_INTERVAL_MS, ScheduleEvaluator, ScheduleTransition, TickGate};
use crate::store::ScheduleStore;
use crate::traits::{DutyWriter, FrameSink};
use crate::types::{ActiveScheduleRef, MAX_BRIGHTNESS, OutputState};

pub struct LampController<W: DutyWriter, S: FrameSink> {
    pub(crate) state: OutputState,
    pub(crate) store: ScheduleStore,
    pub(crate) evaluator: ScheduleEvaluator,
    pub(crate) clock: WallClock,
    pub(crate) driver: OutputDriver<W>,
    pub(crate) sink: S,
    schedule_gate: TickGate,
    clock_warning_gate: TickGate,
}

impl<W: DutyWriter, S: FrameSink> LampController<W, S> {
    /// Erstellt den Controller mit Power-Up Defaults und schreibt sie auf die Hardware
    pub fn new(writer: W, sink: S) -> Self {
        Self::with_state(writer, sink, OutputState::default())
    }

    pub fn with_state(writer: W, sink: S, initial: OutputState) -> Self {
        let mut controller = Self {
            state: initial,
            store: ScheduleStore::new(),
            evaluator: ScheduleEvaluator::new(),
            clock: WallClock::new(),
            driver: OutputDriver::new(writer),
            sink,
            schedule_gate: TickGate::new(SCHEDULE_TICK_INTERVAL_MS),
            clock_warning_gate: TickGate::new(CLOCK_WARNING_INTERVAL_MS),
        };
        controller.state.enforce_on_floor();
        controller.driver.apply(&controller.state);
        controller
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> &OutputState {
        &self.state
    }

    pub fn store(&self) -> &ScheduleStore {
        &self.store
    }

    pub fn active_schedule(&self) -> ActiveScheduleRef {
        self.evaluator.active()
    }

    pub fn clock(&self) -> &WallClock {
        &self.clock
    }

    pub fn driver(&self) -> &OutputDriver<W> {
        &self.driver
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn state_payload(&self) -> StatePayload {
        StatePayload::new(&self.state, self.evaluator.active())
    }

    // ========================================================================
    // Ereignisse
    // ========================================================================

    /// Neuer Client verbunden: aktuellen Zustand senden
    pub fn on_client_connected(&mut self) {
        self.emit_state();
    }

    /// Encoder- und Taster-Ereignisse eines Polls
    pub fn handle_input(&mut self, events: InputEvents) {
        if events.brightness_delta != 0 {
            let previous = self.state.brightness;
            let min = i32::from(self.state.min_brightness());
            let target = (i32::from(previous) + events.brightness_delta).clamp(min, i32::from(MAX_BRIGHTNESS));
            self.state.brightness = target as u8;

            if self.state.brightness != previous {
                info!("Encoder: brightness {} -> {}", previous, self.state.brightness);
                self.commit_hardware_change();
            }
        }

        match events.click {
            Some(ButtonEvent::SingleClick) => {
                self.state.is_on = !self.state.is_on;
                self.state.enforce_on_floor();
                info!("Button: single click, on={}", self.state.is_on);
                self.commit_hardware_change();
            }
            Some(ButtonEvent::DoubleClick) => {
                self.state.mode = self.state.mode.next();
                info!("Button: double click, mode={}", self.state.mode.as_wire());
                self.commit_hardware_change();
            }
            None => {}
        }
    }

    /// Schedule-Tick, darf bei jeder Loop-Iteration aufgerufen werden
    ///
    /// Die eigentliche Auswertung läuft höchstens einmal pro `SCHEDULE_TICK_INTERVAL_MS`.
    pub fn poll_schedule(&mut self, now_ms: u64) {
        if !self.schedule_gate.ready(now_ms) {
            return;
        }

        let Some(now) = self.clock.local_time(now_ms) else {
            if self.clock_warning_gate.ready(now_ms) {
                warn!("Schedule: clock not set, waiting for time_sync");
            }
            return;
        };

        if let Some(transition) = self.evaluator.evaluate(now, &self.store, &mut self.state) {
            match transition {
                ScheduleTransition::AlarmApplied { id, brightness, .. } => {
                    debug!("Schedule: alarm {} ramp brightness {}", id, brightness);
                }
                ScheduleTransition::RoutineApplied { id, .. } => {
                    debug!("Schedule: routine {} applied", id);
                }
                ScheduleTransition::RoutineEnded { .. } | ScheduleTransition::AlarmEnded { .. } => {}
            }
            self.driver.apply(&self.state);
            self.emit_state();
        }
    }

    // ========================================================================
    // Interne Helfer
    // ========================================================================

    fn commit_hardware_change(&mut self) {
        self.driver.apply(&self.state);
        self.emit_state();
    }

    pub(crate) fn emit_state(&mut self) {
        let payload = self.state_payload();
        self.sink.broadcast(OutboundFrame::State(payload));
    }
}
