//! Core Types für die Lampen-Steuerung
//!
//! Datenstrukturen ohne Hardware-Dependencies

/// Maximale Helligkeitsstufe (4-Bit PWM: 0..=15)
pub const MAX_BRIGHTNESS: u8 = 15;

/// Minuten pro Tag (00:00 bis 23:59)
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Welche LED-Gruppe(n) angesteuert werden
///
/// Wire-Format: 0 = Warm, 1 = White, 2 = Both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelMode {
    Warm,
    White,
    #[default]
    Both,
}

impl ChannelMode {
    /// Wandelt einen Wire-Wert in einen Modus um, ausserhalb von 0..=2 wird geklemmt
    pub fn from_wire_clamped(value: i32) -> Self {
        match value.clamp(0, 2) {
            0 => ChannelMode::Warm,
            1 => ChannelMode::White,
            _ => ChannelMode::Both,
        }
    }

    /// Wire-Wert für JSON-Frames
    pub fn as_wire(self) -> u8 {
        match self {
            ChannelMode::Warm => 0,
            ChannelMode::White => 1,
            ChannelMode::Both => 2,
        }
    }

    /// Doppelklick-Zyklus: Warm → White → Both → Warm
    pub fn next(self) -> Self {
        match self {
            ChannelMode::Warm => ChannelMode::White,
            ChannelMode::White => ChannelMode::Both,
            ChannelMode::Both => ChannelMode::Warm,
        }
    }
}

/// Semantischer Zustand der Lampe (Single Source of Truth)
///
/// Wird nie persistiert, nach Power-Up gilt `OutputState::default()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputState {
    pub is_on: bool,
    /// Immer in `0..=MAX_BRIGHTNESS`
    pub brightness: u8,
    pub mode: ChannelMode,
}

impl Default for OutputState {
    fn default() -> Self {
        Self {
            is_on: true,
            brightness: 8,
            mode: ChannelMode::Both,
        }
    }
}

impl OutputState {
    /// Kleinste erlaubte Helligkeit für den aktuellen Ein/Aus-Zustand
    pub fn min_brightness(&self) -> u8 {
        if self.is_on { 1 } else { 0 }
    }

    /// Setzt die Helligkeit geklemmt auf `min_brightness()..=MAX_BRIGHTNESS`
    pub fn set_brightness_clamped(&mut self, value: i32) {
        let min = i32::from(self.min_brightness());
        self.brightness = value.clamp(min, i32::from(MAX_BRIGHTNESS)) as u8;
    }

    /// Hebt die gespeicherte Helligkeit einer eingeschalteten Lampe auf mindestens 1
    pub fn enforce_on_floor(&mut self) {
        if self.is_on && self.brightness < 1 {
            self.brightness = 1;
        }
    }
}

/// Uhrzeit ohne Datum (Stunde, Minute)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockTime {
    pub hour: u8,
    pub minute: u8,
}

impl ClockTime {
    /// Erstellt eine Uhrzeit, ungültige Werte werden auf 0..=23 / 0..=59 geklemmt
    pub fn new_clamped(hour: i32, minute: i32) -> Self {
        Self {
            hour: hour.clamp(0, 23) as u8,
            minute: minute.clamp(0, 59) as u8,
        }
    }

    /// Minuten seit Mitternacht
    pub fn minutes_of_day(self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }
}

/// Wiederkehrendes Licht-Preset mit festem Zeitfenster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Routine {
    pub id: i32,
    pub enabled: bool,
    pub start: ClockTime,
    pub end: ClockTime,
    pub brightness: u8,
    pub mode: ChannelMode,
}

/// Weckalarm: Helligkeit rampt von 0 bis MAX_BRIGHTNESS bis zur Weckzeit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Alarm {
    pub id: i32,
    pub enabled: bool,
    pub wake: ClockTime,
    pub start: ClockTime,
    pub duration_minutes: u16,
}

/// Welcher Zeitplan (falls überhaupt) gerade den OutputState überschreibt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActiveScheduleRef {
    #[default]
    None,
    Routine(i32),
    Alarm(i32),
}

impl ActiveScheduleRef {
    pub fn is_routine(self) -> bool {
        matches!(self, ActiveScheduleRef::Routine(_))
    }

    pub fn is_alarm(self) -> bool {
        matches!(self, ActiveScheduleRef::Alarm(_))
    }
}
