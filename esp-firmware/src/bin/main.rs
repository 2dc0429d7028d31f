// Keine Standard-Bibliothek verwenden (Embedded System)
#![no_std]
// Kein normaler main() Einstiegspunkt (wird von esp_rtos bereitgestellt)
#![no_main]
// Verbiete mem::forget - gefährlich bei ESP HAL Types mit DMA-Buffern
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
// Verbiete große Stack-Frames (Stack ist auf Embedded Systemen begrenzt)
#![deny(clippy::large_stack_frames)]

// Heap Allocator (WiFi benötigt dynamischen Speicher)
extern crate alloc;

// Embassy Async Runtime
use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, Stack, StackResources};
use embassy_time::{Duration, Timer};

// ESP32-C6 HAL
use esp_hal::clock::CpuClock;
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;

// Backtrace bei Panic und println!() Support
use {esp_backtrace as _, esp_println as _};

// Projekt-Module und Konfiguration
use circadian_light::config::{EXTRA_HEAP_SIZE, HTTP_TASK_COUNT, NET_SOCKET_COUNT, WIFI_HEAP_SIZE};
use circadian_light::tasks::{
    connection_task, dhcp_task, http_server_task, lamp_control_task, mdns_responder_task, net_task,
};
use circadian_light::{FrameChannel, InboundChannel};

// ESP-IDF App Descriptor - erforderlich für den Bootloader!
// Ohne diesen schlägt das Flashen mit "ESP-IDF App Descriptor missing" fehl
esp_bootloader_esp_idf::esp_app_desc!();

/// Main Entry Point
///
/// Initialisiert Hardware, WiFi, startet Embassy Runtime und spawnt Tasks.
/// Der Lamp Task startet vor WiFi, die Lampe ist also sofort bedienbar.
/// Danach schläft main() - alle Arbeit läuft in Tasks.
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    // ESP32-C6 Konfiguration: CPU auf maximale Taktfrequenz (160 MHz)
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Heap Allocator initialisieren (WiFi braucht dynamischen Speicher!)
    // Zwei Bereiche: reclaimed RAM (64 KB) + extra (36 KB) = 100 KB total
    esp_alloc::heap_allocator!(
        #[esp_hal::ram(reclaimed)]
        size: WIFI_HEAP_SIZE
    );
    esp_alloc::heap_allocator!(size: EXTRA_HEAP_SIZE);

    // Embassy Runtime initialisieren (Timer + Software Interrupt)
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_interrupt =
        esp_hal::interrupt::software::SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_interrupt.software_interrupt0);

    // Frame-Channel (Lamp → alle WebSockets)
    // PubSubChannel für Broadcast: jede Connection hat einen eigenen Subscriber
    static FRAME_CHANNEL: static_cell::StaticCell<FrameChannel> = static_cell::StaticCell::new();
    let frame_channel = &*FRAME_CHANNEL.init(FrameChannel::new());
    let frame_publisher = frame_channel
        .publisher()
        .expect("Frame channel has a publisher slot");

    // Inbound-Channel (WebSockets → Lamp)
    static INBOUND_CHANNEL: static_cell::StaticCell<InboundChannel> =
        static_cell::StaticCell::new();
    let inbound_channel = INBOUND_CHANNEL.init(InboundChannel::new());
    let inbound_sender = inbound_channel.sender();
    let inbound_receiver = inbound_channel.receiver();

    // Spawn Lamp Task (LEDC + Encoder + Taster)
    spawner
        .spawn(lamp_control_task(
            peripherals.LEDC,
            peripherals.GPIO4,
            peripherals.GPIO5,
            peripherals.GPIO6,
            peripherals.GPIO7,
            peripherals.GPIO10,
            frame_publisher,
            inbound_receiver,
        ))
        .unwrap();

    // WiFi Hardware initialisieren
    static RADIO_INIT: static_cell::StaticCell<esp_radio::Controller> =
        static_cell::StaticCell::new();
    let radio_init =
        RADIO_INIT.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));

    let (wifi_controller, wifi_interface) =
        esp_radio::wifi::new(radio_init, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi");

    // Random seed für TCP/IP Stack (von Hardware RNG)
    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    // Sockets: HTTP-Listener (HTTP_TASK_COUNT) + mDNS + DHCP
    static RESOURCES: static_cell::StaticCell<StackResources<NET_SOCKET_COUNT>> =
        static_cell::StaticCell::new();
    let resources = RESOURCES.init(StackResources::new());

    let (stack, runner) = embassy_net::new(
        wifi_interface.sta,
        NetConfig::dhcpv4(Default::default()),
        resources,
        seed,
    );

    // Stack muss 'static sein für Tasks
    static STACK: static_cell::StaticCell<Stack<'static>> = static_cell::StaticCell::new();
    let stack = &*STACK.init(stack);

    // Spawn WiFi Tasks
    spawner.spawn(connection_task(wifi_controller)).unwrap();
    spawner.spawn(net_task(runner)).unwrap();
    spawner.spawn(dhcp_task(stack)).unwrap();

    // Spawn HTTP Server Tasks, eine Instanz pro gleichzeitiger Connection
    for task_id in 0..HTTP_TASK_COUNT {
        spawner
            .spawn(http_server_task(task_id, stack, frame_channel, inbound_sender))
            .unwrap();
    }

    // Spawn mDNS Responder Task (circadian-light.local + _ws._tcp)
    spawner.spawn(mdns_responder_task(stack)).unwrap();

    // Main-Loop: schläft (alle Arbeit läuft in Tasks)
    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}
