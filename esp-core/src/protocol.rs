//! WebSocket-Protokoll
//!
//! Definiert die JSON-Nachrichten für Client ↔ Lampe.
//!
//! Eingehend ist jeder Frame ein flaches Objekt; alle Schlüssel sind optional
//! und werden unabhängig voneinander ausgewertet. Ausgehend gibt es genau zwei
//! Frame-Arten: State und Sync-Antwort, beide gehen an alle Clients.

use core::fmt;
use core::marker::PhantomData;

use heapless::Vec;
use serde::de::{IgnoredAny, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::store::{MAX_ALARMS, MAX_ROUTINES};
use crate::types::{ActiveScheduleRef, Alarm, ChannelMode, ClockTime, MAX_BRIGHTNESS, OutputState, Routine};

/// Maximale Länge eines eingehenden Frames
///
/// Ein `full_sync` mit vollen Listen (10 Routinen, 5 Alarme) und Namen
/// der App bis ca. 64 Zeichen passt hinein.
pub const MAX_FRAME_LEN: usize = 4096;

/// Puffergröße für ausgehende Frames
pub const OUTBOUND_BUFFER_SIZE: usize = 192;

/// Fehler beim Dekodieren/Enkodieren eines Frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Kein gültiges JSON oder falsche Typen
    Parse,
    /// Frame passt nicht in den Puffer
    TooLarge,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Parse => write!(f, "malformed frame"),
            FrameError::TooLarge => write!(f, "frame too large"),
        }
    }
}

// ============================================================================
// Client → Lampe
// ============================================================================

/// Eingehender Frame, jeder Schlüssel optional
#[derive(Debug, Default, Deserialize)]
pub struct ClientFrame<'a> {
    #[serde(default)]
    pub brightness: Option<i32>,
    #[serde(default)]
    pub mode: Option<i32>,
    #[serde(default)]
    pub on: Option<bool>,
    #[serde(default)]
    pub request_state: Option<bool>,

    #[serde(rename = "type", default, borrow)]
    pub kind: Option<&'a str>,
    #[serde(default, borrow)]
    pub action: Option<&'a str>,
    /// Ziel-ID bei `delete`
    #[serde(default)]
    pub id: Option<i32>,
    /// Eintrag bei `upsert`
    #[serde(default)]
    pub data: Option<EntryData>,

    #[serde(default)]
    pub routines: Option<BoundedList<EntryData, MAX_ROUTINES>>,
    #[serde(default)]
    pub alarms: Option<BoundedList<EntryData, MAX_ALARMS>>,

    /// Unix-Zeit in Millisekunden (UTC)
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Offset zur lokalen Zeit in Sekunden
    #[serde(default)]
    pub timezone_offset: Option<i32>,
}

impl ClientFrame<'_> {
    /// true, wenn mindestens ein Schlüssel den OutputState betrifft
    pub fn has_output_keys(&self) -> bool {
        self.brightness.is_some() || self.mode.is_some() || self.on.is_some()
    }
}

/// Strukturierte Kommandos im `type` Feld
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    RoutineSync,
    AlarmSync,
    FullSync,
    TimeSync,
}

impl Command {
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "routine_sync" => Some(Command::RoutineSync),
            "alarm_sync" => Some(Command::AlarmSync),
            "full_sync" => Some(Command::FullSync),
            "time_sync" => Some(Command::TimeSync),
            _ => None,
        }
    }
}

/// Aktion bei `routine_sync` / `alarm_sync`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncAction {
    Upsert,
    Delete,
}

impl SyncAction {
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "upsert" => Some(SyncAction::Upsert),
            "delete" => Some(SyncAction::Delete),
            _ => None,
        }
    }
}

/// Routine- oder Alarm-Eintrag im Wire-Format
///
/// Eine Struktur für beide Arten, nicht gesetzte Felder gelten als 0/false.
/// Das `name` Feld der App wird ignoriert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct EntryData {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub start_hour: Option<i32>,
    #[serde(default)]
    pub start_minute: Option<i32>,
    #[serde(default)]
    pub end_hour: Option<i32>,
    #[serde(default)]
    pub end_minute: Option<i32>,
    #[serde(default)]
    pub brightness: Option<i32>,
    #[serde(default)]
    pub mode: Option<i32>,
    #[serde(default)]
    pub wake_hour: Option<i32>,
    #[serde(default)]
    pub wake_minute: Option<i32>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
}

impl EntryData {
    fn time(hour: Option<i32>, minute: Option<i32>) -> ClockTime {
        ClockTime::new_clamped(hour.unwrap_or(0), minute.unwrap_or(0))
    }

    /// Routine mit geklemmten Werten, `None` ohne ID
    pub fn to_routine(&self) -> Option<Routine> {
        Some(Routine {
            id: self.id?,
            enabled: self.enabled.unwrap_or(false),
            start: Self::time(self.start_hour, self.start_minute),
            end: Self::time(self.end_hour, self.end_minute),
            brightness: self.brightness.unwrap_or(0).clamp(0, i32::from(MAX_BRIGHTNESS)) as u8,
            mode: ChannelMode::from_wire_clamped(self.mode.unwrap_or(0)),
        })
    }

    /// Alarm mit geklemmten Werten, `None` ohne ID
    pub fn to_alarm(&self) -> Option<Alarm> {
        Some(Alarm {
            id: self.id?,
            enabled: self.enabled.unwrap_or(false),
            wake: Self::time(self.wake_hour, self.wake_minute),
            start: Self::time(self.start_hour, self.start_minute),
            duration_minutes: self.duration_minutes.unwrap_or(0).clamp(0, i32::from(u16::MAX)) as u16,
        })
    }
}

/// JSON-Array mit fester Kapazität
///
/// Elemente über der Kapazität werden übersprungen statt als Fehler gewertet,
/// `dropped()` zählt sie.
#[derive(Debug, Clone, Default)]
pub struct BoundedList<T, const N: usize> {
    items: Vec<T, N>,
    dropped: usize,
}

impl<T, const N: usize> BoundedList<T, N> {
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl<'de, T: Deserialize<'de>, const N: usize> Deserialize<'de> for BoundedList<T, N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ListVisitor<T, const N: usize>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>, const N: usize> Visitor<'de> for ListVisitor<T, N> {
            type Value = BoundedList<T, N>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "an array")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut list = BoundedList {
                    items: Vec::new(),
                    dropped: 0,
                };
                while !list.items.is_full() {
                    match seq.next_element::<T>()? {
                        Some(item) => {
                            // Kann nicht fehlschlagen, Kapazität oben geprüft
                            let _ = list.items.push(item);
                        }
                        None => return Ok(list),
                    }
                }
                while seq.next_element::<IgnoredAny>()?.is_some() {
                    list.dropped += 1;
                }
                Ok(list)
            }
        }

        deserializer.deserialize_seq(ListVisitor(PhantomData))
    }
}

/// Dekodiert einen Text-Frame
pub fn decode(frame: &[u8]) -> Result<ClientFrame<'_>, FrameError> {
    if frame.len() > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge);
    }
    serde_json_core::from_slice::<ClientFrame<'_>>(frame)
        .map(|(parsed, _)| parsed)
        .map_err(|_| FrameError::Parse)
}

// ============================================================================
// Lampe → Client
// ============================================================================

/// Inhalt des State-Frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatePayload {
    pub brightness: u8,
    pub mode: u8,
    pub on: bool,
    pub routine_active: bool,
    pub alarm_active: bool,
}

impl StatePayload {
    pub fn new(state: &OutputState, active: ActiveScheduleRef) -> Self {
        Self {
            brightness: state.brightness,
            mode: state.mode.as_wire(),
            on: state.is_on,
            routine_active: active.is_routine(),
            alarm_active: active.is_alarm(),
        }
    }
}

#[derive(Serialize)]
struct StateFrame<'a> {
    state: &'a StatePayload,
}

/// Art der Sync-Antwort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    RoutineSyncResponse,
    AlarmSyncResponse,
    FullSyncResponse,
    TimeSyncResponse,
}

/// Quittung für jede Sync-Operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SyncAck {
    #[serde(rename = "type")]
    pub kind: SyncKind,
    pub success: bool,
    pub message: &'static str,
}

/// Ausgehender Frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutboundFrame {
    State(StatePayload),
    Ack(SyncAck),
}

impl OutboundFrame {
    /// Serialisiert den Frame nach `buf`, gibt die Länge zurück
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, FrameError> {
        let result = match self {
            OutboundFrame::State(state) => serde_json_core::to_slice(&StateFrame { state }, buf),
            OutboundFrame::Ack(ack) => serde_json_core::to_slice(ack, buf),
        };
        result.map_err(|_| FrameError::TooLarge)
    }
}
