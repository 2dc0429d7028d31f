//! Output Driver
//!
//! Bildet den semantischen OutputState auf zwei Duty-Werte ab.
//! Die Verdrahtung ist invertiert: maximaler Duty = minimales Licht.

use crate::traits::DutyWriter;
use crate::types::{ChannelMode, MAX_BRIGHTNESS, OutputState};

/// Duty-Wert für "komplett aus" (4-Bit PWM, invertiert)
pub const DUTY_OFF: u8 = MAX_BRIGHTNESS;

/// Duty-Werte der beiden Kanäle (0 = Warm, 1 = White)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelDuties {
    pub warm: u8,
    pub white: u8,
}

impl ChannelDuties {
    pub const OFF: Self = Self {
        warm: DUTY_OFF,
        white: DUTY_OFF,
    };
}

/// Berechnet die Duty-Werte für einen Zustand
///
/// # Beispiele
///
/// ```
/// # use esp_core::{ChannelDuties, ChannelMode, OutputState, compute_duties};
/// let state = OutputState { is_on: true, brightness: 10, mode: ChannelMode::Warm };
/// assert_eq!(compute_duties(&state), ChannelDuties { warm: 5, white: 15 });
/// ```
pub fn compute_duties(state: &OutputState) -> ChannelDuties {
    // Aus ist ein harter Default, unabhängig von Modus und Helligkeit
    if !state.is_on {
        return ChannelDuties::OFF;
    }

    // Eine eingeschaltete Lampe wird nie dunkel angesteuert
    let effective = state.brightness.clamp(1, MAX_BRIGHTNESS);
    let driven = MAX_BRIGHTNESS - effective;

    match state.mode {
        ChannelMode::Warm => ChannelDuties {
            warm: driven,
            white: DUTY_OFF,
        },
        ChannelMode::White => ChannelDuties {
            warm: DUTY_OFF,
            white: driven,
        },
        ChannelMode::Both => ChannelDuties {
            warm: driven,
            white: driven,
        },
    }
}

/// Output Driver über einem DutyWriter (Hardware oder Mock)
pub struct OutputDriver<W: DutyWriter> {
    writer: W,
    last: Option<ChannelDuties>,
}

impl<W: DutyWriter> OutputDriver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, last: None }
    }

    /// Schreibt den Zustand auf die Hardware
    ///
    /// Total: Schreibfehler werden geloggt, nicht weitergereicht.
    pub fn apply(&mut self, state: &OutputState) -> ChannelDuties {
        let duties = compute_duties(state);
        match self.writer.write(duties) {
            Ok(()) => {
                debug!(
                    "Output: on={} mode={} brightness={} -> warm={} white={}",
                    state.is_on,
                    state.mode.as_wire(),
                    state.brightness,
                    duties.warm,
                    duties.white
                );
                self.last = Some(duties);
            }
            Err(_e) => error!("Output: failed to write PWM duty"),
        }
        duties
    }

    /// Zuletzt erfolgreich geschriebene Duty-Werte
    pub fn last_duties(&self) -> Option<ChannelDuties> {
        self.last
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }
}
