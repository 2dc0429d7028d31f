// Hardware Abstraction Layer (HAL) Module
//
// Dieses Modul verbindet die Traits aus esp-core mit den ESP32-C6 Peripherals.
// Die Lampen-Logik selbst kennt keine Hardware-Typen.

pub mod inputs;
pub mod pwm_writer;

pub use inputs::PanelInputs;
pub use pwm_writer::LedcDutyWriter;
