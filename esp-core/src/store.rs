//! State Store für Zeitpläne
//!
//! Feste Kapazität, Reihenfolge = Einfüge-Reihenfolge. Die Reihenfolge ist
//! semantisch relevant ("erster Treffer gewinnt"), daher wird beim Löschen
//! verschoben statt getauscht.

use heapless::Vec;

use crate::types::{Alarm, Routine};

/// Maximale Anzahl Routinen (N_R)
pub const MAX_ROUTINES: usize = 10;

/// Maximale Anzahl Alarme (N_A)
pub const MAX_ALARMS: usize = 5;

/// Fehler bei Store-Operationen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Upsert eines neuen Eintrags bei voller Liste
    CapacityExceeded { capacity: usize },
    /// Delete mit unbekannter ID
    NotFound { id: i32 },
}

impl core::fmt::Display for StoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StoreError::CapacityExceeded { capacity } => {
                write!(f, "storage full (capacity {})", capacity)
            }
            StoreError::NotFound { id } => write!(f, "entry {} not found", id),
        }
    }
}

/// Ergebnis eines erfolgreichen Upserts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Upserted {
    Inserted,
    Updated,
}

/// Gemeinsame Eigenschaft aller Zeitplan-Einträge
pub trait ScheduleEntry: Copy {
    fn id(&self) -> i32;
}

impl ScheduleEntry for Routine {
    fn id(&self) -> i32 {
        self.id
    }
}

impl ScheduleEntry for Alarm {
    fn id(&self) -> i32 {
        self.id
    }
}

/// Geordnete Liste fester Kapazität
#[derive(Debug, Clone)]
pub struct EntryList<T: ScheduleEntry, const N: usize> {
    entries: Vec<T, N>,
}

impl<T: ScheduleEntry, const N: usize> Default for EntryList<T, N> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T: ScheduleEntry, const N: usize> EntryList<T, N> {
    pub fn as_slice(&self) -> &[T] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn find(&self, id: i32) -> Option<&T> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Ersetzt einen Eintrag gleicher ID an seiner Position oder hängt an
    ///
    /// Bei voller Liste bleibt die Liste unverändert.
    pub fn upsert(&mut self, entry: T) -> Result<Upserted, StoreError> {
        if let Some(slot) = self.entries.iter_mut().find(|e| e.id() == entry.id()) {
            *slot = entry;
            return Ok(Upserted::Updated);
        }
        self.entries
            .push(entry)
            .map(|_| Upserted::Inserted)
            .map_err(|_| StoreError::CapacityExceeded { capacity: N })
    }

    /// Entfernt einen Eintrag, nachfolgende rücken auf
    pub fn delete(&mut self, id: i32) -> Result<T, StoreError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id() == id)
            .ok_or(StoreError::NotFound { id })?;
        Ok(self.entries.remove(index))
    }

    /// Ersetzt den kompletten Inhalt, Einträge über der Kapazität werden verworfen
    ///
    /// Gibt die Anzahl verworfener Einträge zurück.
    pub fn replace_all<I: IntoIterator<Item = T>>(&mut self, entries: I) -> usize {
        self.entries.clear();
        let mut dropped = 0;
        for entry in entries {
            if self.entries.push(entry).is_err() {
                dropped += 1;
            }
        }
        dropped
    }
}

/// Alle Routinen und Alarme der Lampe
#[derive(Debug, Clone, Default)]
pub struct ScheduleStore {
    pub routines: EntryList<Routine, MAX_ROUTINES>,
    pub alarms: EntryList<Alarm, MAX_ALARMS>,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChannelMode, ClockTime};

    fn routine(id: i32) -> Routine {
        Routine {
            id,
            enabled: true,
            start: ClockTime { hour: 7, minute: 0 },
            end: ClockTime { hour: 8, minute: 0 },
            brightness: 5,
            mode: ChannelMode::Warm,
        }
    }

    #[test]
    fn test_upsert_updates_in_place() {
        let mut list: EntryList<Routine, 3> = EntryList::default();
        list.upsert(routine(1)).unwrap();
        list.upsert(routine(2)).unwrap();

        let mut changed = routine(1);
        changed.brightness = 12;
        assert_eq!(list.upsert(changed), Ok(Upserted::Updated));
        assert_eq!(list.as_slice()[0].brightness, 12);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_upsert_full_keeps_list() {
        let mut list: EntryList<Routine, 2> = EntryList::default();
        list.upsert(routine(1)).unwrap();
        list.upsert(routine(2)).unwrap();
        assert_eq!(
            list.upsert(routine(3)),
            Err(StoreError::CapacityExceeded { capacity: 2 })
        );
        assert_eq!(list.len(), 2);
        // Update einer bestehenden ID geht auch bei voller Liste
        assert_eq!(list.upsert(routine(2)), Ok(Upserted::Updated));
    }

    #[test]
    fn test_delete_shifts_and_keeps_order() {
        let mut list: EntryList<Routine, 4> = EntryList::default();
        for id in 1..=4 {
            list.upsert(routine(id)).unwrap();
        }
        list.delete(2).unwrap();
        let ids: heapless::Vec<i32, 4> = list.as_slice().iter().map(|r| r.id).collect();
        assert_eq!(ids.as_slice(), &[1, 3, 4]);
        assert_eq!(list.delete(2), Err(StoreError::NotFound { id: 2 }));
    }

    #[test]
    fn test_replace_all_truncates() {
        let mut list: EntryList<Routine, 2> = EntryList::default();
        let dropped = list.replace_all((1..=5).map(routine));
        assert_eq!(dropped, 3);
        assert_eq!(list.len(), 2);
    }
}
