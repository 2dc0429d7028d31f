// mDNS Responder Task - Hostname und WebSocket-Service via Multicast DNS
//
// Die Lampe ist damit als `circadian-light.local` erreichbar und
// advertised den Service `_ws._tcp` auf Port 80, so dass Clients sie
// ohne feste IP-Adresse finden.
//
// - Transport: UDP Multicast auf 224.0.0.251:5353 (RFC 6762)
// - Records: A (Hostname → IPv4) sowie PTR/SRV/TXT für den Service
// - Library: edge-mdns (no_std) über edge-nal-embassy

use defmt::{Debug2Format, error, info, warn};
use embassy_net::Stack;
use embassy_time::{Duration, Timer};

use core::net::{Ipv4Addr, SocketAddr};
use core::sync::atomic::{AtomicU32, Ordering};

use edge_mdns::{
    HostAnswersMdnsHandler,
    buf::VecBufAccess,
    domain::base::Ttl,
    host::{Host, Service, ServiceAnswers},
    io,
};
use edge_nal::{MulticastV4, UdpBind, UdpSplit};
use edge_nal_embassy::{Udp, UdpBuffers};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::signal::Signal;

use crate::config::{
    HTTP_PORT, MDNS_HOSTNAME, MDNS_MULTICAST_ADDR, MDNS_PACKET_BUFFER_SIZE, MDNS_PORT,
    MDNS_RECONNECT_DELAY_SECS, MDNS_SERVICE_NAME, MDNS_SERVICE_PROTOCOL, MDNS_SERVICE_TYPE,
    MDNS_TTL_SECS, MDNS_UDP_BUFFER_SIZE,
};
use crate::tasks::wifi::wait_for_network;

type MdnsUdpBuffers = UdpBuffers<1, MDNS_UDP_BUFFER_SIZE, MDNS_UDP_BUFFER_SIZE>;

/// Counter als Zufallsquelle für mDNS Query IDs (nur Eindeutigkeit nötig)
static RNG_COUNTER: AtomicU32 = AtomicU32::new(0);

fn mdns_rng(buf: &mut [u8]) {
    let mut counter = RNG_COUNTER.fetch_add(1, Ordering::Relaxed);
    for chunk in buf.chunks_mut(4) {
        let bytes = counter.to_le_bytes();
        let len = chunk.len().min(4);
        chunk[..len].copy_from_slice(&bytes[..len]);
        counter = counter.wrapping_add(1);
    }
}

/// mDNS Responder Task
///
/// Wartet auf Link und DHCP, startet dann den Responder. Jeder Fehler
/// (auch eine verlorene IP nach einem WiFi-Reconnect) führt nach
/// `MDNS_RECONNECT_DELAY_SECS` zu einem Neustart mit der aktuellen Adresse.
#[embassy_executor::task]
pub async fn mdns_responder_task(stack: &'static Stack<'static>) {
    info!("mDNS: Task started, waiting for network...");

    // Einmalig pro Task, der Responder bekommt sie bei jedem Neustart wieder
    static UDP_BUFFERS: static_cell::StaticCell<MdnsUdpBuffers> = static_cell::StaticCell::new();
    let udp_buffers: &'static MdnsUdpBuffers = UDP_BUFFERS.init_with(UdpBuffers::new);

    loop {
        wait_for_network(stack).await;

        match run_mdns_responder(stack, udp_buffers).await {
            Ok(_) => warn!("mDNS: Responder stopped normally"),
            Err(e) => error!("mDNS: Error: {}", e),
        }
        info!("mDNS: Restarting in {}s...", MDNS_RECONNECT_DELAY_SECS);
        Timer::after(Duration::from_secs(MDNS_RECONNECT_DELAY_SECS)).await;
    }
}

/// Bindet den Multicast-Socket und beantwortet Queries bis zum ersten Fehler
async fn run_mdns_responder(
    stack: &'static Stack<'static>,
    udp_buffers: &'static MdnsUdpBuffers,
) -> Result<(), MdnsError> {
    let our_ip = stack
        .config_v4()
        .ok_or(MdnsError::NoIpAddress)?
        .address
        .address();
    info!("mDNS: Using IP {}", Debug2Format(&our_ip));

    let udp_stack = Udp::new(*stack, udp_buffers);

    let mut socket = udp_stack
        .bind(SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), MDNS_PORT))
        .await
        .map_err(|_| MdnsError::SocketBindFailed)?;

    socket
        .join_v4(Ipv4Addr::from(MDNS_MULTICAST_ADDR), Ipv4Addr::UNSPECIFIED)
        .await
        .map_err(|_| MdnsError::MulticastJoinFailed)?;

    let (recv, send) = socket.split();

    let host = Host {
        hostname: MDNS_HOSTNAME,
        ipv4: our_ip.into(),
        ipv6: [0u8; 16].into(), // kein proto-ipv6 in smoltcp
        ttl: Ttl::from_secs(MDNS_TTL_SECS),
    };

    let service = Service {
        name: MDNS_SERVICE_NAME,
        priority: 1,
        weight: 5,
        service: MDNS_SERVICE_TYPE,
        protocol: MDNS_SERVICE_PROTOCOL,
        port: HTTP_PORT,
        service_subtypes: &[],
        txt_kvs: &[],
    };

    let recv_buf = VecBufAccess::<NoopRawMutex, MDNS_PACKET_BUFFER_SIZE>::new();
    let send_buf = VecBufAccess::<NoopRawMutex, MDNS_PACKET_BUFFER_SIZE>::new();

    // Broadcast-Signal wird von der API verlangt, aber nie ausgelöst
    let signal = Signal::<NoopRawMutex, ()>::new();

    let mdns = io::Mdns::new(
        Some(our_ip),
        None,
        recv,
        send,
        recv_buf,
        send_buf,
        mdns_rng,
        &signal,
    );

    info!(
        "mDNS: Responder running, advertising '{}.local' ({}.{} port {})",
        MDNS_HOSTNAME, MDNS_SERVICE_TYPE, MDNS_SERVICE_PROTOCOL, HTTP_PORT
    );

    mdns.run(HostAnswersMdnsHandler::new(ServiceAnswers::new(&host, &service)))
        .await
        .map_err(|_| MdnsError::ResponderFailed)?;

    Ok(())
}

/// mDNS Fehler, jeder führt zu einem Neustart des Responders
#[derive(Debug)]
enum MdnsError {
    /// DHCP-Adresse zwischen Warten und Start wieder verloren
    NoIpAddress,
    SocketBindFailed,
    MulticastJoinFailed,
    /// Responder Loop abgebrochen (meist verlorene Verbindung)
    ResponderFailed,
}

impl defmt::Format for MdnsError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            MdnsError::NoIpAddress => defmt::write!(fmt, "No IPv4 address"),
            MdnsError::SocketBindFailed => defmt::write!(fmt, "Socket bind failed"),
            MdnsError::MulticastJoinFailed => defmt::write!(fmt, "Multicast join failed"),
            MdnsError::ResponderFailed => defmt::write!(fmt, "Responder failed"),
        }
    }
}
