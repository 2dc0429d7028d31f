//! Time Source
//!
//! Die Wanduhr wird ausschliesslich per `time_sync` gesetzt. Zwischen zwei
//! Syncs läuft sie auf dem monotonen Millisekunden-Zähler der Firmware weiter.

use time::{OffsetDateTime, UtcOffset};

use crate::types::ClockTime;

/// Fehler beim Setzen der Uhr
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// Zeitzonen-Offset ausserhalb von ±25:59:59
    InvalidOffset,
    /// Zeitstempel nicht darstellbar
    OutOfRange,
}

impl core::fmt::Display for ClockError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ClockError::InvalidOffset => write!(f, "timezone offset out of range"),
            ClockError::OutOfRange => write!(f, "timestamp out of range"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SyncPoint {
    utc_ms: i64,
    monotonic_ms: u64,
    offset: UtcOffset,
}

/// Wanduhr: ungesetzt bis zum ersten erfolgreichen `set()`
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock {
    sync: Option<SyncPoint>,
}

impl WallClock {
    pub const fn new() -> Self {
        Self { sync: None }
    }

    pub fn is_set(&self) -> bool {
        self.sync.is_some()
    }

    /// Setzt die Uhr auf `epoch_ms` (UTC) zum monotonen Zeitpunkt `monotonic_ms`
    ///
    /// Bei Fehler bleibt die bisherige Uhrzeit erhalten.
    pub fn set(&mut self, epoch_ms: i64, offset_secs: i32, monotonic_ms: u64) -> Result<(), ClockError> {
        let offset =
            UtcOffset::from_whole_seconds(offset_secs).map_err(|_| ClockError::InvalidOffset)?;
        OffsetDateTime::from_unix_timestamp(epoch_ms.div_euclid(1000))
            .map_err(|_| ClockError::OutOfRange)?;

        self.sync = Some(SyncPoint {
            utc_ms: epoch_ms,
            monotonic_ms,
            offset,
        });
        Ok(())
    }

    /// Lokale Uhrzeit zum monotonen Zeitpunkt `monotonic_ms`
    pub fn local_time(&self, monotonic_ms: u64) -> Option<ClockTime> {
        let sync = self.sync?;
        let elapsed = i64::try_from(monotonic_ms.saturating_sub(sync.monotonic_ms)).ok()?;
        let utc_ms = sync.utc_ms.checked_add(elapsed)?;
        let local = OffsetDateTime::from_unix_timestamp(utc_ms.div_euclid(1000))
            .ok()?
            .checked_to_offset(sync.offset)?;

        Some(ClockTime {
            hour: local.hour(),
            minute: local.minute(),
        })
    }
}
