// Pin-Sampling für Drehencoder und Taster
//
// Liefert nur rohe Pegel, Dekodierung und Entprellung passieren in
// esp_core::InputHandler.

use esp_core::InputLevels;
use esp_hal::gpio::{Input, InputConfig, InputPin, Pull};

/// Bedienfeld der Lampe: Encoder (DT, CLK) und Taster, alle mit Pull-Up
pub struct PanelInputs {
    encoder_dt: Input<'static>,
    encoder_clk: Input<'static>,
    button: Input<'static>,
}

impl PanelInputs {
    pub fn new(
        encoder_dt: impl InputPin + 'static,
        encoder_clk: impl InputPin + 'static,
        button: impl InputPin + 'static,
    ) -> Self {
        let config = InputConfig::default().with_pull(Pull::Up);
        Self {
            encoder_dt: Input::new(encoder_dt, config),
            encoder_clk: Input::new(encoder_clk, config),
            button: Input::new(button, config),
        }
    }

    /// Aktuelle Pegel aller drei Pins
    pub fn sample(&self) -> InputLevels {
        InputLevels {
            encoder_a: self.encoder_dt.is_high(),
            encoder_b: self.encoder_clk.is_high(),
            button_high: self.button.is_high(),
        }
    }
}
