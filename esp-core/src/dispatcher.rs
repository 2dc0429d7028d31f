//! Protocol Dispatcher
//!
//! Wendet einen eingehenden Frame auf den LampController an.
//!
//! Reihenfolge innerhalb eines Frames:
//! 1. `on`, `brightness`, `mode` (ein einziger Output-Aufruf, kein State-Echo)
//! 2. `request_state`
//! 3. `type` (Zeitplan- und Uhr-Kommandos, jeweils mit Quittung an alle Clients)

use crate::controller::LampController;
use crate::protocol::{self, BoundedList, ClientFrame, Command, EntryData, FrameError, OutboundFrame, SyncAck, SyncAction, SyncKind};
use crate::store::{EntryList, ScheduleEntry};
use crate::traits::{DutyWriter, FrameSink};
use crate::types::ChannelMode;

const MSG_MISSING_DATA: &str = "Missing data";
const MSG_STORAGE_FULL: &str = "Storage full";
const MSG_FULL_SYNC: &str = "Full sync complete";
const MSG_TIME_OK: &str = "Time synchronized";
const MSG_TIME_INVALID: &str = "Invalid time data";

/// Texte der Quittungen pro Zeitplan-Art
struct AckTexts {
    kind: SyncKind,
    synced: &'static str,
    deleted: &'static str,
    not_found: &'static str,
}

const ROUTINE_TEXTS: AckTexts = AckTexts {
    kind: SyncKind::RoutineSyncResponse,
    synced: "Routine synced successfully",
    deleted: "Routine deleted",
    not_found: "Routine not found",
};

const ALARM_TEXTS: AckTexts = AckTexts {
    kind: SyncKind::AlarmSyncResponse,
    synced: "Alarm synced successfully",
    deleted: "Alarm deleted",
    not_found: "Alarm not found",
};

impl<W: DutyWriter, S: FrameSink> LampController<W, S> {
    /// Verarbeitet einen Text-Frame eines Clients
    ///
    /// Fehlerhafte Frames werden geloggt und verworfen, der Client bekommt keine Antwort.
    pub fn handle_frame(&mut self, frame: &[u8], now_ms: u64) -> Result<(), FrameError> {
        let msg = match protocol::decode(frame) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Protocol: dropped frame ({} bytes): {}", frame.len(), e);
                return Err(e);
            }
        };

        self.apply_output_keys(&msg);

        if msg.request_state == Some(true) {
            debug!("Protocol: state requested");
            self.emit_state();
        }

        if let Some(kind) = msg.kind {
            match Command::parse(kind) {
                Some(Command::RoutineSync) => self.handle_routine_sync(&msg),
                Some(Command::AlarmSync) => self.handle_alarm_sync(&msg),
                Some(Command::FullSync) => self.handle_full_sync(&msg),
                Some(Command::TimeSync) => self.handle_time_sync(&msg, now_ms),
                None => warn!("Protocol: unknown type '{}'", kind),
            }
        }

        Ok(())
    }

    fn apply_output_keys(&mut self, msg: &ClientFrame<'_>) {
        if !msg.has_output_keys() {
            return;
        }

        if let Some(on) = msg.on {
            self.state.is_on = on;
        }
        if let Some(brightness) = msg.brightness {
            self.state.set_brightness_clamped(brightness);
        }
        if let Some(mode) = msg.mode {
            self.state.mode = ChannelMode::from_wire_clamped(mode);
        }
        self.state.enforce_on_floor();

        info!(
            "Protocol: on={} brightness={} mode={}",
            self.state.is_on,
            self.state.brightness,
            self.state.mode.as_wire()
        );
        // Kein State-Frame: der Absender kennt den Zustand bereits
        self.driver.apply(&self.state);
    }

    fn handle_routine_sync(&mut self, msg: &ClientFrame<'_>) {
        let ack = sync_entry(
            &mut self.store.routines,
            msg,
            EntryData::to_routine,
            &ROUTINE_TEXTS,
        );
        if let Some(ack) = ack {
            if ack.success {
                self.evaluator.request_reassert();
            }
            self.broadcast_ack(ack);
        }
    }

    fn handle_alarm_sync(&mut self, msg: &ClientFrame<'_>) {
        let ack = sync_entry(&mut self.store.alarms, msg, EntryData::to_alarm, &ALARM_TEXTS);
        if let Some(ack) = ack {
            if ack.success {
                self.evaluator.request_reassert();
            }
            self.broadcast_ack(ack);
        }
    }

    fn handle_full_sync(&mut self, msg: &ClientFrame<'_>) {
        let routine_overflow = replace_entries(&mut self.store.routines, msg.routines.as_ref(), EntryData::to_routine);
        let alarm_overflow = replace_entries(&mut self.store.alarms, msg.alarms.as_ref(), EntryData::to_alarm);

        info!(
            "Sync: full sync, {} routines, {} alarms",
            self.store.routines.len(),
            self.store.alarms.len()
        );
        if routine_overflow + alarm_overflow > 0 {
            warn!(
                "Sync: full sync dropped {} routines, {} alarms over capacity",
                routine_overflow,
                alarm_overflow
            );
        }

        self.evaluator.request_reassert();
        self.broadcast_ack(SyncAck {
            kind: SyncKind::FullSyncResponse,
            success: true,
            message: MSG_FULL_SYNC,
        });
    }

    fn handle_time_sync(&mut self, msg: &ClientFrame<'_>, now_ms: u64) {
        let result = match msg.timestamp {
            Some(timestamp) => self
                .clock
                .set(timestamp, msg.timezone_offset.unwrap_or(0), now_ms)
                .map_err(|e| {
                    warn!("Sync: rejected time_sync: {}", e);
                }),
            None => {
                warn!("Sync: time_sync without timestamp");
                Err(())
            }
        };

        let success = result.is_ok();
        if success {
            if let Some(local) = self.clock.local_time(now_ms) {
                info!("Sync: clock set, local time {}:{}", local.hour, local.minute);
            }
            self.evaluator.request_reassert();
        }

        self.broadcast_ack(SyncAck {
            kind: SyncKind::TimeSyncResponse,
            success,
            message: if success { MSG_TIME_OK } else { MSG_TIME_INVALID },
        });
    }

    fn broadcast_ack(&mut self, ack: SyncAck) {
        self.sink.broadcast(OutboundFrame::Ack(ack));
    }
}

/// Upsert oder Delete auf einer Liste, `None` bei unbekannter Aktion
fn sync_entry<T: ScheduleEntry, const N: usize>(
    list: &mut EntryList<T, N>,
    msg: &ClientFrame<'_>,
    convert: fn(&EntryData) -> Option<T>,
    texts: &AckTexts,
) -> Option<SyncAck> {
    let Some(action) = msg.action.and_then(SyncAction::parse) else {
        warn!("Sync: unknown or missing action");
        return None;
    };

    let (success, message) = match action {
        SyncAction::Upsert => match msg.data.as_ref().and_then(convert) {
            Some(entry) => match list.upsert(entry) {
                Ok(_) => {
                    info!("Sync: upserted entry {} ({} of {})", entry.id(), list.len(), list.capacity());
                    (true, texts.synced)
                }
                Err(e) => {
                    warn!("Sync: upsert of {} failed: {}", entry.id(), e);
                    (false, MSG_STORAGE_FULL)
                }
            },
            None => {
                warn!("Sync: upsert without data");
                (false, MSG_MISSING_DATA)
            }
        },
        SyncAction::Delete => match msg.id {
            Some(id) => match list.delete(id) {
                Ok(_) => {
                    info!("Sync: deleted entry {}", id);
                    (true, texts.deleted)
                }
                Err(_) => {
                    warn!("Sync: delete of unknown entry {}", id);
                    (false, texts.not_found)
                }
            },
            None => {
                warn!("Sync: delete without id");
                (false, MSG_MISSING_DATA)
            }
        },
    };

    Some(SyncAck {
        kind: texts.kind,
        success,
        message,
    })
}

/// Ersetzt eine Liste komplett, gibt die Anzahl verworfener Einträge zurück
fn replace_entries<T: ScheduleEntry, const N: usize, const M: usize>(
    list: &mut EntryList<T, N>,
    incoming: Option<&BoundedList<EntryData, M>>,
    convert: fn(&EntryData) -> Option<T>,
) -> usize {
    match incoming {
        Some(incoming) => list.replace_all(incoming.as_slice().iter().filter_map(convert)) + incoming.dropped(),
        None => list.replace_all(core::iter::empty()),
    }
}
