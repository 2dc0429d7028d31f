// HTTP Server Task - WebSocket-Endpoint für die Lampen-Steuerung
use core::future::pending;
use defmt::{info, warn};
use embassy_futures::select::{Either, select};
use embassy_net::Stack;
use embassy_time::Duration;
use heapless::Vec;
use picoserve::{io::embedded_io_async, response::IntoResponse, response::ws, routing::get};

use crate::config::*;
use crate::{FrameChannel, FrameSubscriber, InboundEvent, InboundSender, OutboundFrame};

/// Response-Enum für den WebSocket-Endpoint
/// Ermöglicht Rückgabe von entweder WebSocket-Upgrade oder HTTP-Fehler
enum WebSocketResponse {
    Upgrade(
        ws::UpgradedWebSocket<ws::UnspecifiedProtocol, ws::CallbackNotUsingState<WebSocketHandler>>,
    ),
    ServiceUnavailable,
}

impl IntoResponse for WebSocketResponse {
    async fn write_to<
        R: embedded_io_async::Read,
        W: picoserve::response::ResponseWriter<Error = R::Error>,
    >(
        self,
        connection: picoserve::response::Connection<'_, R>,
        response_writer: W,
    ) -> Result<picoserve::ResponseSent, W::Error> {
        match self {
            WebSocketResponse::Upgrade(ws) => ws.write_to(connection, response_writer).await,
            WebSocketResponse::ServiceUnavailable => {
                picoserve::response::Response::new(
                    picoserve::response::StatusCode::new(503),
                    "Service Unavailable: Too many WebSocket connections",
                )
                .with_header("Retry-After", "5")
                .write_to(connection, response_writer)
                .await
            }
        }
    }
}

/// HTTP Server Task - läuft parallel zu anderen Tasks
///
/// Einziger Endpoint ist `/ws`. Jede Connection bekommt einen eigenen
/// Subscriber auf den Frame-Channel, eingehende Text-Frames gehen
/// unverändert an den Lamp Task.
///
/// **Task Pool:** Diese Task wird `HTTP_TASK_COUNT`x gespawnt, eine
/// Instanz pro gleichzeitiger Connection.
///
/// # Parameter
/// - `task_id`: Eindeutige ID für diese Server-Instanz
/// - `stack`: embassy-net Stack für Netzwerk-Zugriff
/// - `frame_channel`: PubSub Channel für ausgehende Frames
/// - `inbound_sender`: Channel Sender Richtung Lamp Task
#[embassy_executor::task(pool_size = 4)]
pub async fn http_server_task(
    task_id: usize,
    stack: &'static Stack<'static>,
    frame_channel: &'static FrameChannel,
    inbound_sender: InboundSender,
) {
    info!("HTTP: Server task {} starting on port {}...", task_id, HTTP_PORT);

    let app = picoserve::Router::new().route(
        WEBSOCKET_PATH,
        get(
            move |upgrade: picoserve::response::WebSocketUpgrade| async move {
                info!("HTTP: WebSocket upgrade requested");

                // Mehr Clients als Subscriber-Slots: HTTP 503 statt Panic
                match frame_channel.subscriber() {
                    Ok(frame_subscriber) => {
                        let handler = WebSocketHandler {
                            inbound_sender,
                            frame_subscriber,
                        };
                        WebSocketResponse::Upgrade(upgrade.on_upgrade(handler))
                    }
                    Err(_) => {
                        warn!(
                            "HTTP: No subscriber slots available ({}/{} in use), sending HTTP 503",
                            MAX_WEBSOCKET_CLIENTS,
                            MAX_WEBSOCKET_CLIENTS
                        );
                        WebSocketResponse::ServiceUnavailable
                    }
                }
            },
        ),
    );

    // Server-Konfiguration
    let config = picoserve::Config::new(picoserve::Timeouts {
        start_read_request: Some(Duration::from_secs(5)),
        read_request: Some(Duration::from_secs(1)),
        write: Some(Duration::from_secs(1)),
        persistent_start_read_request: Some(Duration::from_secs(5)),
    })
    .keep_connection_alive();

    let mut http_buffer = [0u8; HTTP_BUFFER_SIZE];
    let mut rx_buffer = [0u8; TCP_RX_BUFFER_SIZE];
    let mut tx_buffer = [0u8; TCP_TX_BUFFER_SIZE];

    let server = picoserve::Server::new(&app, &config, &mut http_buffer);

    let _ = server
        .listen_and_serve(task_id, *stack, HTTP_PORT, &mut rx_buffer, &mut tx_buffer)
        .await;

    info!("HTTP: Server task {} ended", task_id);
}

/// WebSocket-Handler State
/// Inbound Sender Richtung Lamp Task und eigener Subscriber für Broadcasts
struct WebSocketHandler {
    inbound_sender: InboundSender,
    frame_subscriber: FrameSubscriber,
}

impl ws::WebSocketCallback for WebSocketHandler {
    async fn run<R: embedded_io_async::Read, W: embedded_io_async::Write<Error = R::Error>>(
        mut self,
        mut rx: ws::SocketRx<R>,
        mut tx: ws::SocketTx<W>,
    ) -> Result<(), W::Error> {
        info!("HTTP: WebSocket connection established");

        // Lamp Task broadcastet daraufhin den aktuellen Zustand
        self.inbound_sender.send(InboundEvent::ClientConnected).await;

        let mut buffer = [0u8; WEBSOCKET_BUFFER_SIZE];

        let close_reason = loop {
            match select(
                rx.next_message(&mut buffer, pending()),
                self.frame_subscriber.next_message_pure(),
            )
            .await
            {
                // Nachricht vom Client
                Either::First(ws_result) => {
                    let ws_result = ws_result?.ignore_never_b();

                    match ws_result {
                        Ok(ws::Message::Text(data)) => {
                            match Vec::from_slice(data.as_bytes()) {
                                Ok(frame) => {
                                    self.inbound_sender.send(InboundEvent::Frame(frame)).await;
                                }
                                Err(_) => {
                                    warn!("HTTP: Dropped text frame ({} bytes)", data.len());
                                }
                            }
                        }
                        Ok(ws::Message::Binary(data)) => {
                            info!("HTTP: Received binary message: {} bytes (ignored)", data.len());
                        }
                        Ok(ws::Message::Ping(data)) => {
                            tx.send_pong(data).await?;
                        }
                        Ok(ws::Message::Pong(_)) => {}
                        Ok(ws::Message::Close(_reason)) => {
                            info!("HTTP: WebSocket close received");
                            break None;
                        }
                        Err(error) => {
                            warn!("HTTP: WebSocket error");
                            break Some((error.code(), "WebSocket Error"));
                        }
                    }
                }
                // Frame vom Lamp Task
                Either::Second(frame) => {
                    Self::send_frame(&mut tx, &frame).await?;
                }
            }
        };

        info!("HTTP: WebSocket connection closed");
        tx.close(close_reason).await
    }
}

impl WebSocketHandler {
    /// Serialisiert einen Frame und sendet ihn als Text
    async fn send_frame<W: embedded_io_async::Write>(
        tx: &mut ws::SocketTx<W>,
        frame: &OutboundFrame,
    ) -> Result<(), W::Error> {
        let mut json_buffer = [0u8; JSON_FRAME_BUFFER_SIZE];
        let n = match frame.encode(&mut json_buffer) {
            Ok(n) => n,
            Err(e) => {
                warn!("HTTP: Failed to encode frame: {}", e);
                return Ok(());
            }
        };

        match core::str::from_utf8(&json_buffer[..n]) {
            Ok(json_str) => tx.send_text(json_str).await,
            Err(_) => Ok(()),
        }
    }
}
