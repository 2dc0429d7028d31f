// Lamp Task - Steuert die zwei LED-Kanäle über LEDC, pollt Encoder und Taster
use defmt::{error, info};
use embassy_time::{Instant, Timer};
use esp_core::{ButtonConfig, DutyWriter, InputHandler, LampController};

use crate::config::{
    BUTTON_GPIO_PIN, ENCODER_CLK_GPIO_PIN, ENCODER_DT_GPIO_PIN, LAMP_LOOP_INTERVAL_MS,
    WARM_GPIO_PIN, WHITE_GPIO_PIN,
};
use crate::hal::{LedcDutyWriter, PanelInputs};
use crate::{BroadcastSink, FramePublisher, InboundEvent, InboundReceiver};

/// Lamp Logic - die komplette Hauptschleife ohne Hardware-Initialisierung
///
/// Pro Iteration, in dieser Reihenfolge:
/// 1. Encoder und Taster pollen
/// 2. Alle wartenden WebSocket-Ereignisse abarbeiten
/// 3. Schedule-Tick (intern auf eine Sekunde gedrosselt)
///
/// Der LampController gehört allein diesem Task, WebSocket-Tasks
/// erreichen ihn nur über den Inbound-Channel.
///
/// # Parameter
/// - `writer`: Duty Writer (LEDC oder Mock)
/// - `inputs`: Bedienfeld mit Encoder und Taster
/// - `frame_publisher`: PubSub Publisher für State-Frames und Quittungen
/// - `inbound_receiver`: Channel Receiver für Frames der WebSocket-Clients
pub async fn lamp_control_logic<W: DutyWriter>(
    writer: W,
    inputs: PanelInputs,
    frame_publisher: FramePublisher,
    inbound_receiver: InboundReceiver,
) {
    // Power-Up: an, Helligkeit 8, Modus Both (wird sofort geschrieben)
    let mut lamp = LampController::new(writer, BroadcastSink::new(frame_publisher));
    let mut input = InputHandler::new(inputs.sample(), ButtonConfig::default());

    info!(
        "Lamp: ready (on={}, brightness={}, mode={})",
        lamp.state().is_on,
        lamp.state().brightness,
        lamp.state().mode.as_wire()
    );

    loop {
        let now_ms = Instant::now().as_millis();

        lamp.handle_input(input.poll(now_ms, inputs.sample()));

        // Non-blocking: Encoder-Polling darf nie auf das Netzwerk warten
        while let Ok(event) = inbound_receiver.try_receive() {
            match event {
                InboundEvent::ClientConnected => lamp.on_client_connected(),
                InboundEvent::Frame(frame) => {
                    // Fehler sind bereits geloggt, der Client bekommt keine Antwort
                    let _ = lamp.handle_frame(&frame, now_ms);
                }
            }
        }

        lamp.poll_schedule(now_ms);

        // Async Delay: gibt CPU an andere Tasks zurück
        Timer::after_millis(LAMP_LOOP_INTERVAL_MS).await;
    }
}

/// Lamp Task - Embassy Task für parallele Ausführung
///
/// Initialisiert LEDC und die GPIO-Eingänge und ruft dann
/// `lamp_control_logic()` auf.
#[allow(clippy::too_many_arguments)]
#[embassy_executor::task]
pub async fn lamp_control_task(
    ledc: esp_hal::peripherals::LEDC<'static>,
    warm_pin: esp_hal::peripherals::GPIO4<'static>,
    white_pin: esp_hal::peripherals::GPIO5<'static>,
    encoder_dt: esp_hal::peripherals::GPIO6<'static>,
    encoder_clk: esp_hal::peripherals::GPIO7<'static>,
    button: esp_hal::peripherals::GPIO10<'static>,
    frame_publisher: FramePublisher,
    inbound_receiver: InboundReceiver,
) {
    info!(
        "Lamp: LEDC on GPIO{} (warm) / GPIO{} (white), encoder GPIO{}/{}, button GPIO{}",
        WARM_GPIO_PIN, WHITE_GPIO_PIN, ENCODER_DT_GPIO_PIN, ENCODER_CLK_GPIO_PIN, BUTTON_GPIO_PIN
    );

    let writer = match LedcDutyWriter::new(ledc, warm_pin, white_pin) {
        Ok(writer) => writer,
        Err(e) => {
            error!("Lamp: LEDC setup failed: {}", e);
            return;
        }
    };
    let inputs = PanelInputs::new(encoder_dt, encoder_clk, button);

    lamp_control_logic(writer, inputs, frame_publisher, inbound_receiver).await;
}
