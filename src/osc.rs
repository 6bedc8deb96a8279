use crate::command::{CommandArg, InboundMessage, OutboundMessage};
use crate::params::Scalar;
use anyhow::{Context, anyhow};
use ringbuf::traits::{Consumer as _, Observer as _, Producer as _, Split as _};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use rosc::{OscError, OscMessage, OscPacket, OscType, decoder, encoder};
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

const MAX_PACKET_SIZE: usize = 65_535;
const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Inbound control messages received on a background thread.
///
/// The socket thread is the only producer and the frame loop the only
/// consumer of the queue; a full queue drops the newest message.
pub struct OscReceiver {
    cons: HeapCons<InboundMessage>,
    stop: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl OscReceiver {
    /// Binds `port`, or the first free port among the next `probe` ones.
    pub fn bind(port: u16, probe: u16, capacity: usize) -> anyhow::Result<Self> {
        let socket = bind_with_probe(port, probe)?;
        socket
            .set_read_timeout(Some(READ_TIMEOUT))
            .context("set OSC read timeout")?;
        let local_addr = socket.local_addr().context("OSC local address")?;

        let rb = HeapRb::<InboundMessage>::new(capacity.max(1));
        let (mut prod, cons) = rb.split();

        let stop = Arc::new(AtomicBool::new(false));
        let dropped = Arc::new(AtomicU64::new(0));
        let stop_for_thread = Arc::clone(&stop);
        let dropped_for_thread = Arc::clone(&dropped);

        let handle = thread::Builder::new()
            .name("osc-recv".to_string())
            .spawn(move || receive_loop(&socket, &mut prod, &stop_for_thread, &dropped_for_thread))
            .context("spawn OSC receive thread")?;

        info!(%local_addr, "listening for OSC");
        Ok(Self {
            cons,
            stop,
            dropped,
            handle: Some(handle),
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Messages lost to a full queue since start-up.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn pending(&self) -> usize {
        self.cons.occupied_len()
    }

    /// Everything queued so far, oldest first. Never blocks.
    pub fn drain(&mut self) -> Vec<InboundMessage> {
        self.cons.pop_iter().collect()
    }
}

impl Drop for OscReceiver {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

fn bind_with_probe(port: u16, probe: u16) -> anyhow::Result<UdpSocket> {
    let mut last_err = None;
    for offset in 0..=probe {
        let Some(candidate) = port.checked_add(offset) else {
            break;
        };
        match UdpSocket::bind((Ipv4Addr::UNSPECIFIED, candidate)) {
            Ok(socket) => {
                if offset > 0 {
                    info!(requested = port, bound = candidate, "OSC port was taken; probed");
                }
                return Ok(socket);
            }
            Err(err) => {
                debug!(port = candidate, %err, "OSC port unavailable");
                last_err = Some(err);
            }
        }
    }
    match last_err {
        Some(err) => Err(err).with_context(|| format!("bind OSC port {port} (+{probe} probed)")),
        None => Err(anyhow!("no OSC port available from {port}")),
    }
}

fn receive_loop(
    socket: &UdpSocket,
    prod: &mut HeapProd<InboundMessage>,
    stop: &AtomicBool,
    dropped: &AtomicU64,
) {
    let mut buf = vec![0u8; MAX_PACKET_SIZE];
    while !stop.load(Ordering::Relaxed) {
        let (len, from) = match socket.recv_from(&mut buf) {
            Ok(v) => v,
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                continue;
            }
            Err(err) => {
                warn!(%err, "OSC receive failed");
                thread::sleep(READ_TIMEOUT);
                continue;
            }
        };

        let messages = match decode_packet(&buf[..len], Some(from.ip())) {
            Ok(v) => v,
            Err(err) => {
                warn!(%from, ?err, "dropping undecodable OSC packet");
                continue;
            }
        };
        for msg in messages {
            if let Err(msg) = prod.try_push(msg) {
                let total = dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(address = %msg.address, total, "OSC queue full; dropping message");
            }
        }
    }
}

/// Decodes one datagram; bundles are flattened in order.
pub fn decode_packet(buf: &[u8], origin: Option<IpAddr>) -> Result<Vec<InboundMessage>, OscError> {
    let (_, packet) = decoder::decode_udp(buf)?;
    let mut out = Vec::new();
    flatten(packet, origin, &mut out);
    Ok(out)
}

fn flatten(packet: OscPacket, origin: Option<IpAddr>, out: &mut Vec<InboundMessage>) {
    match packet {
        OscPacket::Message(msg) => out.push(InboundMessage {
            address: msg.addr,
            args: msg.args.into_iter().filter_map(from_osc_arg).collect(),
            origin,
        }),
        OscPacket::Bundle(bundle) => {
            for inner in bundle.content {
                flatten(inner, origin, out);
            }
        }
    }
}

fn from_osc_arg(arg: OscType) -> Option<CommandArg> {
    match arg {
        OscType::Float(v) => Some(CommandArg::Float(v)),
        OscType::Double(v) => Some(CommandArg::Float(v as f32)),
        OscType::Int(v) => Some(CommandArg::Int(v)),
        OscType::Long(v) => Some(CommandArg::Int(v.clamp(i32::MIN.into(), i32::MAX.into()) as i32)),
        OscType::Bool(v) => Some(CommandArg::Bool(v)),
        OscType::String(s) => Some(CommandArg::Str(s)),
        _ => None,
    }
}

fn to_osc_arg(arg: &CommandArg) -> OscType {
    match arg {
        CommandArg::Float(v) => OscType::Float(*v),
        CommandArg::Int(v) => OscType::Int(*v),
        CommandArg::Bool(v) => OscType::Bool(*v),
        CommandArg::Str(s) => OscType::String(s.clone()),
    }
}

pub fn encode_command(address: &str, args: &[CommandArg]) -> Result<Vec<u8>, OscError> {
    encoder::encode(&OscPacket::Message(OscMessage {
        addr: address.to_string(),
        args: args.iter().map(to_osc_arg).collect(),
    }))
}

/// Remote faders and toggles only take floats, so every value goes out as one.
pub fn encode_message(msg: &OutboundMessage) -> Result<Vec<u8>, OscError> {
    let value = match msg.value {
        Scalar::Float(v) => v,
        Scalar::Int(v) => v as f32,
        Scalar::Bool(v) => f32::from(u8::from(v)),
    };
    encode_command(&msg.address, &[CommandArg::Float(value)])
}

/// Fire-and-forget sender for echoed parameter values.
pub struct OscEcho {
    socket: UdpSocket,
    port: u16,
}

impl OscEcho {
    pub fn new(port: u16) -> anyhow::Result<Self> {
        let socket =
            UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).context("bind OSC echo socket")?;
        Ok(Self { socket, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns how many messages went out. Failures are logged, not retried.
    pub fn send(&self, peer: IpAddr, messages: &[OutboundMessage]) -> usize {
        let target = SocketAddr::new(peer, self.port);
        let mut sent = 0usize;
        for msg in messages {
            let bytes = match encode_message(msg) {
                Ok(v) => v,
                Err(err) => {
                    debug!(address = %msg.address, ?err, "could not encode echo");
                    continue;
                }
            };
            match self.socket.send_to(&bytes, target) {
                Ok(_) => sent += 1,
                Err(err) => debug!(%target, %err, "echo send failed"),
            }
        }
        sent
    }
}
