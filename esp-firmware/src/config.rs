// Projekt-Konfiguration: Konstanten und Hardware-Zuordnungen
#![allow(dead_code)]

// ============================================================================
// Lampen-Hardware
// ============================================================================

/// GPIO-Pin für den warmweißen LED-Kanal (LEDC Kanal 0)
pub const WARM_GPIO_PIN: u8 = 4;

/// GPIO-Pin für den kaltweißen LED-Kanal (LEDC Kanal 1)
pub const WHITE_GPIO_PIN: u8 = 5;

/// GPIO-Pin für Encoder DT (Signal A)
pub const ENCODER_DT_GPIO_PIN: u8 = 6;

/// GPIO-Pin für Encoder CLK (Signal B)
pub const ENCODER_CLK_GPIO_PIN: u8 = 7;

/// GPIO-Pin für den Taster (gegen GND, interner Pull-Up)
pub const BUTTON_GPIO_PIN: u8 = 10;

/// PWM-Frequenz in kHz
pub const PWM_FREQUENCY_KHZ: u32 = 5;

/// PWM-Auflösung in Bit (Duty 0..=15, passend zu den 16 Helligkeitsstufen)
pub const PWM_RESOLUTION_BITS: u8 = 4;

/// Intervall des Lampen-Loops in Millisekunden
/// Encoder und Taster werden gepollt, daher kurz halten
pub const LAMP_LOOP_INTERVAL_MS: u64 = 1;

// ============================================================================
// Channel-Größen (Task-Kommunikation)
// ============================================================================

/// Kapazität der Inbound-Queue (WebSocket → Lamp Task)
pub const INBOUND_QUEUE_SIZE: usize = 2;

/// Kapazität der Outbound-Queue (Lamp Task → WebSockets)
/// Ein Frame kann Quittung + State erzeugen, daher etwas Reserve
pub const OUTBOUND_QUEUE_SIZE: usize = 8;

/// Maximale Anzahl gleichzeitiger WebSocket-Clients (= Subscriber)
pub const MAX_WEBSOCKET_CLIENTS: usize = 4;

// ============================================================================
// WiFi Konfiguration
// ============================================================================

/// WiFi SSID (Netzwerk-Name)
/// Wird zur Build-Zeit aus der Environment Variable WIFI_SSID geladen
/// Setze diese in .env file (siehe .env.example)
pub const WIFI_SSID: &str = env!(
    "WIFI_SSID",
    "WiFi SSID nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// WiFi Passwort
/// Wird zur Build-Zeit aus der Environment Variable WIFI_PASSWORD geladen
pub const WIFI_PASSWORD: &str = env!(
    "WIFI_PASSWORD",
    "WiFi Password nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// Wartezeit nach WiFi-Fehlern in Sekunden
pub const WIFI_RETRY_DELAY_SECS: u64 = 5;

/// Heap-Größe für WiFi (Bytes)
/// WiFi benötigt dynamischen Speicher für Pakete
pub const WIFI_HEAP_SIZE: usize = 65536; // 64 KB

/// Zusätzliche Heap-Größe (Bytes)
pub const EXTRA_HEAP_SIZE: usize = 36864; // 36 KB

/// Anzahl Sockets im embassy-net Stack
/// HTTP-Listener (4) + mDNS (1) + DHCP/DNS Reserve
pub const NET_SOCKET_COUNT: usize = 8;

// ============================================================================
// mDNS-Konfiguration
// ============================================================================

/// mDNS Hostname (ohne .local suffix)
/// Die Lampe ist erreichbar unter: circadian-light.local
pub const MDNS_HOSTNAME: &str = "circadian-light";

/// mDNS Service-Instanzname
pub const MDNS_SERVICE_NAME: &str = "circadian-light";

/// mDNS Service-Typ und Protokoll (_ws._tcp)
pub const MDNS_SERVICE_TYPE: &str = "_ws";
pub const MDNS_SERVICE_PROTOCOL: &str = "_tcp";

/// mDNS TTL (Time To Live) in Sekunden
pub const MDNS_TTL_SECS: u32 = 120;

/// mDNS Reconnect Delay in Sekunden
pub const MDNS_RECONNECT_DELAY_SECS: u64 = 5;

/// mDNS Port (Standard: 5353, RFC 6762)
pub const MDNS_PORT: u16 = 5353;

/// mDNS IPv4 Multicast-Adresse (224.0.0.251)
pub const MDNS_MULTICAST_ADDR: [u8; 4] = [224, 0, 0, 251];

/// UDP Buffer-Größen für mDNS (TX, RX in Bytes)
pub const MDNS_UDP_BUFFER_SIZE: usize = 512;

/// mDNS Receive/Send Buffer-Größen in Bytes
/// 1500 Bytes = Standard MTU für Ethernet/WiFi
pub const MDNS_PACKET_BUFFER_SIZE: usize = 1500;

// ============================================================================
// HTTP / WebSocket Konfiguration
// ============================================================================

/// HTTP Port (WebSocket unter ws://<host>/ws)
pub const HTTP_PORT: u16 = 80;

/// WebSocket-Pfad
pub const WEBSOCKET_PATH: &str = "/ws";

/// Anzahl HTTP-Server Tasks (je eine Connection gleichzeitig)
pub const HTTP_TASK_COUNT: usize = 4;

/// HTTP Buffer-Größe in Bytes (Request-Header beim Upgrade)
pub const HTTP_BUFFER_SIZE: usize = 1024;

/// TCP RX Buffer-Größe in Bytes
pub const TCP_RX_BUFFER_SIZE: usize = 1024;

/// TCP TX Buffer-Größe in Bytes
pub const TCP_TX_BUFFER_SIZE: usize = 1024;

/// WebSocket Message Buffer-Größe in Bytes
/// Ein full_sync mit 10 Routinen und 5 Alarmen (inkl. Namen) passt hinein
/// Liegt im Future-State der HTTP-Tasks und im Inbound-Channel, nicht auf dem Stack
pub const WEBSOCKET_BUFFER_SIZE: usize = esp_core::protocol::MAX_FRAME_LEN;

/// JSON Serialisierungs-Buffer für ausgehende Frames (State + Quittungen)
pub const JSON_FRAME_BUFFER_SIZE: usize = esp_core::protocol::OUTBOUND_BUFFER_SIZE;
