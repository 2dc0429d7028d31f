// WiFi Tasks - Station-Verbindung, Netzwerk-Stack und DHCP-Überwachung
use defmt::{Debug2Format, error, info, warn};
use embassy_net::{Runner, Stack};
use embassy_time::{Duration, Timer};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController, WifiDevice, WifiEvent};

use crate::config::{WIFI_PASSWORD, WIFI_RETRY_DELAY_SECS, WIFI_SSID};

/// Polling-Intervall beim Warten auf Link/DHCP
const NETWORK_POLL_INTERVAL_MS: u64 = 500;

/// WiFi Connection Task
///
/// Verbindet als Station mit `WIFI_SSID` und verbindet nach jedem
/// Disconnect neu. Die Lampe selbst läuft auch ohne WiFi weiter.
#[embassy_executor::task]
pub async fn connection_task(mut controller: WifiController<'static>) {
    info!("WiFi: Starting connection task");

    loop {
        if matches!(controller.is_started(), Ok(false)) {
            if let Err(e) = start_station(&mut controller).await {
                error!("WiFi: {}", e);
                retry_delay().await;
                continue;
            }
            info!("WiFi: Started successfully");
        }

        info!("WiFi: Connecting to '{}'...", WIFI_SSID);
        if let Err(e) = controller.connect_async().await {
            error!("WiFi: Connection failed: {}", Debug2Format(&e));
            retry_delay().await;
            continue;
        }
        info!("WiFi: Connected");

        controller.wait_for_event(WifiEvent::StaDisconnected).await;
        warn!("WiFi: Disconnected from AP, reconnecting in {}s", WIFI_RETRY_DELAY_SECS);
        retry_delay().await;
    }
}

/// Setzt die Station-Konfiguration und startet den WiFi-Controller
async fn start_station(controller: &mut WifiController<'static>) -> Result<(), &'static str> {
    let client_config = ModeConfig::Client(
        ClientConfig::default()
            .with_ssid(WIFI_SSID.into())
            .with_password(WIFI_PASSWORD.into()),
    );

    controller.set_config(&client_config).map_err(|e| {
        warn!("WiFi: set_config: {}", Debug2Format(&e));
        "Failed to set configuration"
    })?;

    controller.start_async().await.map_err(|e| {
        warn!("WiFi: start: {}", Debug2Format(&e));
        "Failed to start"
    })
}

async fn retry_delay() {
    Timer::after(Duration::from_secs(WIFI_RETRY_DELAY_SECS)).await;
}

/// Network Task - treibt den embassy-net Stack
#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

/// DHCP Monitor Task
///
/// Loggt die Netzwerk-Konfiguration bei jedem (Neu-)Erhalt einer Adresse,
/// z.B. nach einem WiFi-Reconnect.
#[embassy_executor::task]
pub async fn dhcp_task(stack: &'static Stack<'static>) {
    loop {
        wait_for_network(stack).await;

        if let Some(config) = stack.config_v4() {
            info!("WiFi: Got IP address!");
            info!("  IP:      {}", Debug2Format(&config.address.address()));
            info!("  Gateway: {}", Debug2Format(&config.gateway));
            info!("  WebSocket: ws://{}/ws", Debug2Format(&config.address.address()));
        }

        stack.wait_config_down().await;
        warn!("WiFi: IP address lost");
    }
}

/// Wartet bis der Link steht und DHCP eine IPv4-Adresse geliefert hat
pub async fn wait_for_network(stack: &'static Stack<'static>) {
    loop {
        if stack.is_link_up() && stack.config_v4().is_some() {
            return;
        }
        Timer::after(Duration::from_millis(NETWORK_POLL_INTERVAL_MS)).await;
    }
}
