//! Hardware Abstraction Traits
//!
//! Diese Traits definieren Schnittstellen für Hardware- und Netzwerk-Zugriff
//! ohne konkrete Implementierung.

use crate::output::ChannelDuties;
use crate::protocol::OutboundFrame;

/// Fehler-Typ für PWM-Operationen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    WriteFailed,
}

impl core::fmt::Display for OutputError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            OutputError::WriteFailed => write!(f, "PWM duty write failed"),
        }
    }
}

/// Trait für den Zugriff auf die zwei PWM-Kanäle (Warm, White)
///
/// # Implementierungen
/// - **Production:** LedcDutyWriter (ESP32 LEDC Peripheral)
/// - **Testing:** MockDutyWriter (in-memory Mock)
pub trait DutyWriter {
    /// Schreibt beide Duty-Werte auf die Hardware
    ///
    /// # Fehlerbehandlung
    /// Gibt `OutputError::WriteFailed` zurück wenn Hardware-Zugriff fehlschlägt
    fn write(&mut self, duties: ChannelDuties) -> Result<(), OutputError>;
}

/// Trait für ausgehende Frames
///
/// Jeder Frame geht an alle verbundenen Clients (kein Request-Routing).
pub trait FrameSink {
    fn broadcast(&mut self, frame: OutboundFrame);
}
