// Task-Modul: Enthält alle Embassy Tasks
//
// Jeder Task läuft asynchron und unabhängig.
// Tasks kommunizieren über Embassy Channels (WebSocket → Lamp, Lamp → WebSockets).

pub mod http;
pub mod lamp;
pub mod mdns;
pub mod wifi;

// Re-export Tasks für einfachen Import
pub use http::http_server_task;
pub use lamp::lamp_control_task;
pub use mdns::mdns_responder_task;
pub use wifi::{connection_task, dhcp_task, net_task};
