// Build-Script: Wird vor dem Kompilieren ausgeführt
// Konfiguriert den Linker für ESP32-C6 Embedded Rust

fn main() {
    // Lade .env file für WiFi-Credentials
    // Fehler ignorieren wenn .env nicht existiert (dann müssen ENV vars gesetzt sein)
    println!("cargo:rerun-if-changed=.env");
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("⚠️  .env file nicht gefunden: {}", e);
        eprintln!("   Setze WIFI_SSID und WIFI_PASSWORD als Environment-Variablen");
    }

    // Gebe WiFi-Credentials an Rust-Compiler weiter
    // Die Werte werden zur Compile-Zeit in den Code eingebacken
    if let Ok(ssid) = std::env::var("WIFI_SSID") {
        println!("cargo:rustc-env=WIFI_SSID={}", ssid);
    }
    if let Ok(password) = std::env::var("WIFI_PASSWORD") {
        println!("cargo:rustc-env=WIFI_PASSWORD={}", password);
    }
    println!("cargo:rerun-if-env-changed=WIFI_SSID");
    println!("cargo:rerun-if-env-changed=WIFI_PASSWORD");

    // Registriere hilfsbereiten Error-Handler für Linker-Fehler
    linker_be_nice();

    // Füge Linker-Skripte hinzu:

    // 1. defmt.x - defmt Logging-Support
    //    Definiert Symbole für defmt's binäres Log-Format
    println!("cargo:rustc-link-arg=-Tdefmt.x");

    // 2. linkall.x - ESP32 Memory-Layout
    //    WICHTIG: Muss als LETZTES kommen (sonst Probleme mit flip-link)
    //    Definiert Flash/RAM-Layout und Startup-Code
    println!("cargo:rustc-link-arg=-Tlinkall.x");
}

// Hinweise für undefinierte Symbole: (Symbol-Präfix, Tipp)
// Nur für die Crates, die die Lampe tatsächlich linkt
const LINKER_HINTS: &[(&str, &str)] = &[
    ("_defmt_", "`defmt` not found - is `defmt.x` added as a linker script?"),
    ("_stack_start", "Is the linker script `linkall.x` missing?"),
    (
        "esp_rtos_",
        "`esp-radio` has no scheduler - was `esp_rtos::start()` called?",
    ),
    ("malloc", "Is the `esp-alloc` heap initialized (heap_allocator!)?"),
    ("free", "Is the `esp-alloc` heap initialized (heap_allocator!)?"),
];

// Error-Handler: wird vom Linker als "--error-handling-script" aufgerufen
fn linker_be_nice() {
    let args: Vec<String> = std::env::args().collect();

    // Aufruf durch den Linker: <script> <Fehler-Typ> <Symbol>
    if let Some(kind) = args.get(1) {
        if kind == "undefined-symbol" {
            let what = args.get(2).map(String::as_str).unwrap_or_default();
            if let Some((_, hint)) = LINKER_HINTS.iter().find(|(prefix, _)| what.starts_with(prefix)) {
                eprintln!();
                eprintln!("💡 {}", hint);
                eprintln!();
            }
            std::process::exit(0);
        }
        std::process::exit(1);
    }

    println!(
        "cargo:rustc-link-arg=--error-handling-script={}",
        std::env::current_exe()
            .expect("build script path")
            .display()
    );
}
