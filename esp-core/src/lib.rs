//! ESP Core - Platform-agnostic Lamp Logic and Traits
//!
//! Diese Crate enthält KEINE Hardware-Dependencies.
//! Sie definiert Traits, Zustandsautomaten und den LampController,
//! den die Firmware (oder ein Host-Test) mit konkreten Implementierungen füttert.

#![no_std]

#[macro_use]
mod fmt;

pub mod clock;
pub mod controller;
pub mod dispatcher;
pub mod input;
pub mod output;
pub mod protocol;
pub mod schedule;
pub mod store;
pub mod traits;
pub mod types;

// Re-exports für einfachen Zugriff
pub use clock::{ClockError, WallClock};
pub use controller::LampController;
pub use input::{ButtonConfig, ButtonEvent, InputEvents, InputHandler, InputLevels};
pub use output::{ChannelDuties, DUTY_OFF, OutputDriver, compute_duties};
pub use protocol::{FrameError, OutboundFrame, StatePayload, SyncAck, SyncKind};
pub use schedule::{ScheduleEvaluator, ScheduleTransition, TickGate};
pub use store::{MAX_ALARMS, MAX_ROUTINES, ScheduleStore, StoreError};
pub use traits::{DutyWriter, FrameSink, OutputError};
pub use types::{ActiveScheduleRef, Alarm, ChannelMode, ClockTime, MAX_BRIGHTNESS, OutputState, Routine};
