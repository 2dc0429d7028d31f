//! Input Handler
//!
//! Zwei unabhängige Zustandsautomaten, beide einmal pro Loop-Iteration gepollt:
//! - Drehencoder (Quadratur-Dekodierung + Positions-Differenz)
//! - Taster (Entprellung + Einzel-/Doppelklick-Klassifizierung)
//!
//! Keine Interrupts, keine Hardware-Typen: die Automaten bekommen nur
//! Pin-Pegel und Millisekunden-Zeitstempel.

/// Minimale Zeit zwischen zwei akzeptierten Taster-Flanken
pub const DEBOUNCE_MS: u64 = 35;

/// Fenster für den zweiten Release eines Doppelklicks
pub const DOUBLE_CLICK_WINDOW_MS: u64 = 500;

// Richtungs-Tabelle, Index = neuer Zustand | (alter Zustand << 2)
const KNOB_DIR: [i8; 16] = [0, -1, 1, 0, 1, 0, 0, -1, -1, 0, 0, 1, 0, 1, -1, 0];

// Raststellung: beide Signale high (Pull-Ups)
const LATCH_STATE: u8 = 3;

/// Quadratur-Dekoder für einen Drehencoder mit 4 Übergängen pro Raste
///
/// Die Position ändert sich nur in der Raststellung, Prellen zwischen zwei
/// Rasten hebt sich über die Richtungs-Tabelle auf.
#[derive(Debug, Clone, Copy)]
pub struct QuadratureDecoder {
    old_state: u8,
    raw: i32,
    position: i32,
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl QuadratureDecoder {
    /// Erstellt den Dekoder mit den aktuellen Pegeln von DT (a) und CLK (b)
    pub fn new(a: bool, b: bool) -> Self {
        Self {
            old_state: Self::encode(a, b),
            raw: 0,
            position: 0,
        }
    }

    fn encode(a: bool, b: bool) -> u8 {
        u8::from(a) | (u8::from(b) << 1)
    }

    /// Verarbeitet neue Pin-Pegel und liefert die (gerastete) Position
    pub fn update(&mut self, a: bool, b: bool) -> i32 {
        let state = Self::encode(a, b);
        if state != self.old_state {
            let index = usize::from(state | (self.old_state << 2));
            self.raw += i32::from(KNOB_DIR[index]);
            self.old_state = state;

            if state == LATCH_STATE {
                self.position = self.raw >> 2;
            }
        }
        self.position
    }

    pub fn position(&self) -> i32 {
        self.position
    }
}

/// Positions-Differenz zwischen zwei Polls
#[derive(Debug, Clone, Copy, Default)]
pub struct EncoderTracker {
    last_position: i32,
}

impl EncoderTracker {
    pub fn new(initial_position: i32) -> Self {
        Self {
            last_position: initial_position,
        }
    }

    /// Delta seit dem letzten Aufruf (0 = keine Bewegung)
    pub fn delta(&mut self, position: i32) -> i32 {
        let delta = position - self.last_position;
        self.last_position = position;
        delta
    }
}

/// Taster-Konfiguration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonConfig {
    pub debounce_ms: u64,
    pub double_click_window_ms: u64,
    /// true = gedrückt entspricht Pegel LOW (Pull-Up Verdrahtung)
    pub active_low: bool,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEBOUNCE_MS,
            double_click_window_ms: DOUBLE_CLICK_WINDOW_MS,
            active_low: true,
        }
    }
}

/// Klassifiziertes Klick-Ereignis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    SingleClick,
    DoubleClick,
}

/// Klick-Zustand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClickState {
    Idle,
    /// Erster Release erkannt, warte auf zweiten Release oder Timeout
    ClickPending { first_release_ms: u64 },
}

/// Taster-Automat: Entprellung, Release-Flanken, Einzel-/Doppelklick
///
/// Ein Release allein kann Einzel- und Doppelklick nicht unterscheiden,
/// daher wird erst gezählt und dann per Timeout oder zweitem Release entschieden.
#[derive(Debug, Clone, Copy)]
pub struct ButtonMachine {
    config: ButtonConfig,
    pressed: bool,
    last_change_ms: Option<u64>,
    state: ClickState,
}

impl ButtonMachine {
    pub fn new(config: ButtonConfig) -> Self {
        Self {
            config,
            pressed: false,
            last_change_ms: None,
            state: ClickState::Idle,
        }
    }

    pub fn state(&self) -> ClickState {
        self.state
    }

    /// Anzahl gezählter Klicks im laufenden Fenster (0 oder 1)
    pub fn click_count(&self) -> u8 {
        match self.state {
            ClickState::Idle => 0,
            ClickState::ClickPending { .. } => 1,
        }
    }

    /// Ein Poll mit aktuellem Zeitstempel und rohem Pin-Pegel
    pub fn tick(&mut self, now_ms: u64, level_high: bool) -> Option<ButtonEvent> {
        // Timeout zuerst: eine späte Flanke wird im nächsten Poll verarbeitet
        if let ClickState::ClickPending { first_release_ms } = self.state {
            if now_ms.saturating_sub(first_release_ms) > self.config.double_click_window_ms {
                self.state = ClickState::Idle;
                return Some(ButtonEvent::SingleClick);
            }
        }

        let pressed = if self.config.active_low {
            !level_high
        } else {
            level_high
        };

        if pressed == self.pressed {
            return None;
        }

        let settled = match self.last_change_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.config.debounce_ms,
            None => true,
        };
        if !settled {
            return None;
        }

        self.last_change_ms = Some(now_ms);
        let was_pressed = self.pressed;
        self.pressed = pressed;

        // Nur die Release-Flanke zählt als Klick
        if !(was_pressed && !pressed) {
            return None;
        }

        match self.state {
            ClickState::Idle => {
                self.state = ClickState::ClickPending {
                    first_release_ms: now_ms,
                };
                None
            }
            ClickState::ClickPending { .. } => {
                self.state = ClickState::Idle;
                Some(ButtonEvent::DoubleClick)
            }
        }
    }
}

/// Rohe Pin-Pegel eines Polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLevels {
    pub encoder_a: bool,
    pub encoder_b: bool,
    pub button_high: bool,
}

/// Ergebnis eines Polls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputEvents {
    pub brightness_delta: i32,
    pub click: Option<ButtonEvent>,
}

/// Fasst Encoder und Taster zusammen
pub struct InputHandler {
    decoder: QuadratureDecoder,
    tracker: EncoderTracker,
    button: ButtonMachine,
}

impl InputHandler {
    pub fn new(initial: InputLevels, config: ButtonConfig) -> Self {
        let decoder = QuadratureDecoder::new(initial.encoder_a, initial.encoder_b);
        Self {
            tracker: EncoderTracker::new(decoder.position()),
            decoder,
            button: ButtonMachine::new(config),
        }
    }

    pub fn poll(&mut self, now_ms: u64, levels: InputLevels) -> InputEvents {
        let position = self.decoder.update(levels.encoder_a, levels.encoder_b);
        InputEvents {
            brightness_delta: self.tracker.delta(position),
            click: self.button.tick(now_ms, levels.button_high),
        }
    }

    pub fn button(&self) -> &ButtonMachine {
        &self.button
    }
}
