// PWM Duty Writer für die zwei LED-Kanäle
//
// Implementiert esp_core::DutyWriter über das LEDC Peripheral.
// Beide Kanäle teilen sich einen Low-Speed Timer (4 Bit, 5 kHz).

use esp_core::{ChannelDuties, DutyWriter, OutputError};
use esp_hal::gpio::DriveMode;
use esp_hal::gpio::interconnect::PeripheralOutput;
use esp_hal::ledc::channel::{self, ChannelHW, ChannelIFace};
use esp_hal::ledc::timer::{self, TimerIFace};
use esp_hal::ledc::{LSGlobalClkSource, Ledc, LowSpeed};
use esp_hal::time::Rate;
use static_cell::StaticCell;

use crate::config::{PWM_FREQUENCY_KHZ, PWM_RESOLUTION_BITS};

/// Höchster gültiger Duty-Wert bei 4 Bit Auflösung
const MAX_DUTY: u8 = (1 << PWM_RESOLUTION_BITS) - 1;

/// Fehler beim Einrichten des LEDC Peripherals
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum PwmSetupError {
    Timer,
    Channel,
}

/// LEDC-basierter Duty Writer
///
/// Kanal 0 = Warm, Kanal 1 = White. Der Timer muss die Kanäle überleben,
/// daher liegt er in einer StaticCell.
pub struct LedcDutyWriter {
    warm: channel::Channel<'static, LowSpeed>,
    white: channel::Channel<'static, LowSpeed>,
}

impl LedcDutyWriter {
    /// Richtet Timer und beide Kanäle ein
    ///
    /// Darf nur einmal aufgerufen werden (StaticCell).
    pub fn new(
        ledc_peripheral: esp_hal::peripherals::LEDC<'static>,
        warm_pin: impl PeripheralOutput<'static>,
        white_pin: impl PeripheralOutput<'static>,
    ) -> Result<Self, PwmSetupError> {
        static LEDC: StaticCell<Ledc<'static>> = StaticCell::new();
        static TIMER: StaticCell<timer::Timer<'static, LowSpeed>> = StaticCell::new();

        let ledc = LEDC.init(Ledc::new(ledc_peripheral));
        ledc.set_global_slow_clock(LSGlobalClkSource::APBClk);

        let timer = TIMER.init(ledc.timer::<LowSpeed>(timer::Number::Timer0));
        timer
            .configure(timer::config::Config {
                duty: timer::config::Duty::Duty4Bit,
                clock_source: timer::LSClockSource::APBClk,
                frequency: Rate::from_khz(PWM_FREQUENCY_KHZ),
            })
            .map_err(|_| PwmSetupError::Timer)?;
        let timer: &'static timer::Timer<'static, LowSpeed> = timer;

        let mut warm = ledc.channel(channel::Number::Channel0, warm_pin);
        let mut white = ledc.channel(channel::Number::Channel1, white_pin);
        for ch in [&mut warm, &mut white] {
            ch.configure(channel::config::Config {
                timer,
                duty_pct: 100, // invertiert: volle Duty = dunkel, bis zum ersten apply()
                drive_mode: DriveMode::PushPull,
            })
            .map_err(|_| PwmSetupError::Channel)?;
        }

        Ok(Self { warm, white })
    }
}

impl DutyWriter for LedcDutyWriter {
    fn write(&mut self, duties: ChannelDuties) -> Result<(), OutputError> {
        if duties.warm > MAX_DUTY || duties.white > MAX_DUTY {
            return Err(OutputError::WriteFailed);
        }
        self.warm.set_duty_hw(u32::from(duties.warm));
        self.white.set_duty_hw(u32::from(duties.white));
        Ok(())
    }
}
