// Library-Root: Hardware-Anbindung und Tasks der Lampe
// Keine Standard-Bibliothek (Embedded System)
#![no_std]

// Module
pub mod config;
pub mod hal;
pub mod tasks;

// Re-exports von esp-core
pub use esp_core::{FrameSink, LampController, OutboundFrame};

// Embassy Channel-Typen
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_sync::pubsub::{PubSubChannel, Publisher, Subscriber};
use heapless::Vec;

use crate::config::{INBOUND_QUEUE_SIZE, MAX_WEBSOCKET_CLIENTS, OUTBOUND_QUEUE_SIZE, WEBSOCKET_BUFFER_SIZE};

// ============================================================================
// Nachrichten zwischen WebSocket-Tasks und Lamp Task
// ============================================================================

/// Ereignis von einer WebSocket-Connection an den Lamp Task
///
/// Der Lamp Task ist der einzige Schreiber des Lampen-Zustands,
/// WebSocket-Tasks reichen Frames nur weiter.
pub enum InboundEvent {
    /// Neuer Client: bekommt den aktuellen Zustand
    ClientConnected,
    /// Roher Text-Frame (JSON)
    Frame(Vec<u8, WEBSOCKET_BUFFER_SIZE>),
}

// ============================================================================
// Type-Aliase für Channel-Typen
// ============================================================================
//
// Statt:  Publisher<'static, NoopRawMutex, OutboundFrame, 8, 4, 1>
// Nutze:  FramePublisher

/// PubSubChannel für ausgehende Frames (Broadcast an alle WebSockets)
/// - OUTBOUND_QUEUE_SIZE: Nachrichten-Kapazität
/// - MAX_WEBSOCKET_CLIENTS: Maximale Anzahl Subscribers
/// - 1: Publisher (nur der Lamp Task)
pub type FrameChannel =
    PubSubChannel<NoopRawMutex, OutboundFrame, OUTBOUND_QUEUE_SIZE, MAX_WEBSOCKET_CLIENTS, 1>;

/// Publisher für ausgehende Frames (Lamp Task)
pub type FramePublisher =
    Publisher<'static, NoopRawMutex, OutboundFrame, OUTBOUND_QUEUE_SIZE, MAX_WEBSOCKET_CLIENTS, 1>;

/// Subscriber für ausgehende Frames (eine pro WebSocket-Connection)
pub type FrameSubscriber =
    Subscriber<'static, NoopRawMutex, OutboundFrame, OUTBOUND_QUEUE_SIZE, MAX_WEBSOCKET_CLIENTS, 1>;

/// Channel für eingehende Ereignisse (WebSocket → Lamp Task)
pub type InboundChannel = Channel<NoopRawMutex, InboundEvent, INBOUND_QUEUE_SIZE>;

/// Sender für eingehende Ereignisse (WebSocket-Tasks)
pub type InboundSender = Sender<'static, NoopRawMutex, InboundEvent, INBOUND_QUEUE_SIZE>;

/// Receiver für eingehende Ereignisse (Lamp Task)
pub type InboundReceiver = Receiver<'static, NoopRawMutex, InboundEvent, INBOUND_QUEUE_SIZE>;

// ============================================================================
// FrameSink über den PubSubChannel
// ============================================================================

/// Broadcastet Frames des LampControllers an alle WebSocket-Connections
///
/// `publish_immediate` blockiert nie: bei voller Queue verliert der
/// langsamste Subscriber den ältesten Frame.
pub struct BroadcastSink {
    publisher: FramePublisher,
}

impl BroadcastSink {
    pub fn new(publisher: FramePublisher) -> Self {
        Self { publisher }
    }
}

impl FrameSink for BroadcastSink {
    fn broadcast(&mut self, frame: OutboundFrame) {
        self.publisher.publish_immediate(frame);
    }
}
