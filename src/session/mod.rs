//! Peer session: discovery, color arbitration and move exchange.
//!
//! A session advertises the local device, browses for one opponent under the
//! fixed service tag, breaks the who-plays-white tie with invite timestamps
//! and then exchanges JSON move batches over a single reliable, ordered TCP
//! connection. Transport callbacks arrive on background threads and are
//! marshaled through one ordered event queue; the orchestrator drains it on
//! its own control thread with [`PeerSession::pump`], which keeps move
//! batches applying in receipt order.
//!
//! # Example
//! ```no_run
//! use chess_link::game::MoveRecord;
//! use chess_link::session::{PeerSession, SessionConfig, SessionDelegate};
//!
//! struct Orchestrator;
//!
//! impl SessionDelegate for Orchestrator {
//!     fn connected_as_color(&mut self, is_black: bool) {
//!         println!("playing {}", if is_black { "black" } else { "white" });
//!     }
//!     fn connection_lost(&mut self) {}
//!     fn received_move_batch(&mut self, moves: Vec<MoveRecord>) {
//!         println!("opponent played {} move(s)", moves.len());
//!     }
//! }
//!
//! let mut session = PeerSession::new(SessionConfig::default());
//! session.start();
//! let mut orchestrator = Orchestrator;
//! loop {
//!     session.pump(&mut orchestrator);
//!     std::thread::sleep(std::time::Duration::from_millis(50));
//! }
//! ```

mod arbiter;
mod discovery;
mod error;
mod link;
mod wire;

pub use error::WireError;

use std::collections::HashSet;
use std::fmt;
use std::io::BufReader;
use std::net::{SocketAddr, TcpListener, TcpStream, UdpSocket};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use crate::game::MoveRecord;
use crate::sync::StopFlag;
use arbiter::{Arbiter, InviteDecision};
use link::PeerLink;
use wire::{Beacon, Message};

/// Fixed service tag; peers only discover others advertising the same tag.
pub const SERVICE_TAG: &str = "chess-mc";

/// Default UDP port for discovery beacons.
pub const DEFAULT_DISCOVERY_PORT: u16 = 42807;

const BROWSE_READ_TIMEOUT: Duration = Duration::from_millis(250);
const DEFAULT_BEACON_INTERVAL: Duration = Duration::from_secs(1);

/// Orchestrator-facing session events. All callbacks run on whichever
/// thread calls [`PeerSession::pump`], never on a transport thread.
pub trait SessionDelegate {
    /// A connection was established and the role finalized. Fires once per
    /// connection; `is_black` false means this device invited first and
    /// plays white.
    fn connected_as_color(&mut self, is_black: bool);

    /// The connected peer dropped. Whether to restart the session is the
    /// orchestrator's decision.
    fn connection_lost(&mut self);

    /// A remote move batch was decoded, delivered in receipt order. Batches
    /// are trusted: the sender already validated them.
    fn received_move_batch(&mut self, moves: Vec<MoveRecord>);
}

/// A device's display name. Self-reported and untrusted; it exists to skip
/// self-discovery and to label peers in logs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PeerIdentity(String);

impl PeerIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        PeerIdentity(name.into())
    }

    /// Generate a locally unique name. The random discriminator keeps two
    /// devices with identical host names apart, since identity is what
    /// guards against self-invitation.
    #[must_use]
    pub fn generate() -> Self {
        let discriminator: u16 = rand::random();
        PeerIdentity(format!("player-{discriminator:04x}"))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session configuration. The defaults advertise by IPv4 broadcast on the
/// fixed discovery port; tests and point-to-point setups can aim beacons at
/// explicit addresses instead.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub identity: PeerIdentity,
    pub service_tag: String,
    /// UDP port the browser listens on. 0 picks an ephemeral port (the
    /// bound address is available from [`PeerSession::discovery_addr`]).
    pub discovery_port: u16,
    /// Where beacons are sent.
    pub beacon_targets: Vec<SocketAddr>,
    pub beacon_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            identity: PeerIdentity::generate(),
            service_tag: SERVICE_TAG.to_string(),
            discovery_port: DEFAULT_DISCOVERY_PORT,
            beacon_targets: vec![SocketAddr::from(([255, 255, 255, 255], DEFAULT_DISCOVERY_PORT))],
            beacon_interval: DEFAULT_BEACON_INTERVAL,
        }
    }
}

/// Connection lifecycle. Peer loss is reported as an event rather than an
/// internal transition; restarting is the orchestrator's call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Discovering,
    Connecting,
    Connected,
}

/// Events crossing from transport threads to the control thread.
enum SessionEvent {
    Connected { is_black: bool },
    ConnectionLost,
    MoveBatch(Vec<MoveRecord>),
}

struct CoreState {
    phase: Phase,
    arbiter: Arbiter,
    link: Option<PeerLink>,
    /// Peers already invited; cleared per attempt failure so a fresh beacon
    /// can retry.
    invited: HashSet<String>,
    events: mpsc::Sender<SessionEvent>,
    reader_handle: Option<JoinHandle<()>>,
}

/// State shared between the session's worker threads.
pub(crate) struct SessionCore {
    identity: String,
    /// Whole-session stop: set only by `end()`.
    stop: StopFlag,
    /// Discovery stop: set on connection (exactly one opponent) and by
    /// `end()`.
    discovery_stop: StopFlag,
    state: Mutex<CoreState>,
}

impl SessionCore {
    pub(crate) fn local_name(&self) -> &str {
        &self.identity
    }

    pub(crate) fn stop(&self) -> &StopFlag {
        &self.stop
    }

    /// Browser callback: a peer advertising our service was sighted. Stamp
    /// our invite timestamp on first discovery and invite the peer.
    fn handle_peer_found(core: &Arc<Self>, name: String, addr: SocketAddr) {
        let timestamp;
        {
            let mut state = core.state.lock();
            if matches!(state.phase, Phase::Connected | Phase::Idle) {
                return;
            }
            if !state.invited.insert(name.clone()) {
                return;
            }
            timestamp = state.arbiter.stamp_invite(now_timestamp());
            if state.phase == Phase::Discovering {
                state.phase = Phase::Connecting;
            }
        }
        link::spawn_invite(Arc::clone(core), name, addr, timestamp);
    }

    /// Listener callback: an invitation arrived. Arbitrate; acceptance
    /// answers on the same stream and promotes it to the game link.
    pub(crate) fn handle_invitation(
        core: &Arc<Self>,
        stream: TcpStream,
        reader: BufReader<TcpStream>,
        name: String,
        timestamp: f64,
    ) {
        let decision = {
            let mut state = core.state.lock();
            match state.phase {
                Phase::Connected => {
                    log::debug!(
                        "{}: already connected, dropping invitation from {name}",
                        core.identity
                    );
                    return;
                }
                Phase::Idle => return,
                _ => state.arbiter.on_invitation(&name, timestamp),
            }
        };

        match decision {
            InviteDecision::Ignore => {
                log::info!("{}: ignoring invitation from {name}", core.identity);
            }
            InviteDecision::Accept => {
                log::info!("{}: accepting invitation from {name}", core.identity);
                let accept = Message::Accept {
                    name: core.identity.clone(),
                };
                let line = match wire::encode_message(&accept) {
                    Ok(line) => line,
                    Err(err) => {
                        log::warn!("{}: could not encode acceptance: {err}", core.identity);
                        return;
                    }
                };
                let mut peer_link = PeerLink::new(stream, name);
                if let Err(err) = peer_link.send_line(&line) {
                    log::warn!(
                        "{}: acceptance to {} failed: {err}",
                        core.identity,
                        peer_link.peer_name
                    );
                    return;
                }
                SessionCore::complete_link(core, peer_link, reader);
            }
        }
    }

    /// Promote `peer_link` to the established connection. The design
    /// supports exactly one opponent: extra connections are dropped and
    /// discovery stops immediately.
    pub(crate) fn complete_link(core: &Arc<Self>, peer_link: PeerLink, reader: BufReader<TcpStream>) {
        let mut state = core.state.lock();
        match state.phase {
            Phase::Connected => {
                log::debug!(
                    "{}: dropping extra connection to {}",
                    core.identity,
                    peer_link.peer_name
                );
                peer_link.shutdown();
                return;
            }
            Phase::Idle => {
                peer_link.shutdown();
                return;
            }
            _ => {}
        }

        state.phase = Phase::Connected;
        core.discovery_stop.stop();

        let is_black = state.arbiter.is_black();
        let peer_name = peer_link.peer_name.clone();
        state.link = Some(peer_link);
        log::info!(
            "{}: connected to peer {peer_name} as {}",
            core.identity,
            if is_black { "black" } else { "white" }
        );
        let _ = state.events.send(SessionEvent::Connected { is_black });

        let handle = link::spawn_link_reader(Arc::clone(core), reader, peer_name, core.stop.clone());
        state.reader_handle = Some(handle);
    }

    /// An invite attempt ended without a connection; allow a later beacon
    /// from the same peer to retry (with the unchanged sticky timestamp).
    pub(crate) fn invite_failed(&self, peer_name: &str) {
        let mut state = self.state.lock();
        state.invited.remove(peer_name);
    }

    /// One framed line from the established link.
    pub(crate) fn handle_line(&self, line: &str) {
        match wire::decode_message(line) {
            Ok(Message::Moves(moves)) => {
                log::debug!("{}: received {} move(s)", self.identity, moves.len());
                let state = self.state.lock();
                let _ = state.events.send(SessionEvent::MoveBatch(moves));
            }
            Ok(other) => {
                log::debug!("{}: ignoring unexpected message {other:?}", self.identity);
            }
            Err(err) => {
                // batch dropped, connection stays open
                log::warn!("{}: error receiving moves: {err}", self.identity);
            }
        }
    }

    /// The established peer went away.
    pub(crate) fn handle_connection_lost(&self) {
        let mut state = self.state.lock();
        if state.link.take().is_some() {
            let _ = state.events.send(SessionEvent::ConnectionLost);
        }
    }

    fn send_move_batch(&self, moves: &[MoveRecord]) {
        let message = Message::Moves(moves.to_vec());
        let line = match wire::encode_message(&message) {
            Ok(line) => line,
            Err(err) => {
                log::warn!("{}: error sending move: {err}", self.identity);
                return;
            }
        };

        let mut state = self.state.lock();
        match state.link.as_mut() {
            Some(peer_link) => {
                if let Err(err) = peer_link.send_line(&line) {
                    // best effort: no retry, the lack of a move arriving is
                    // the only signal the opponent gets
                    log::warn!("{}: error sending move: {err}", self.identity);
                }
            }
            None => {
                log::warn!("{}: no connected peer to send moves to", self.identity);
            }
        }
    }
}

/// The peer session: owns discovery, the single connection and color
/// arbitration. See the module docs for the lifecycle.
pub struct PeerSession {
    config: SessionConfig,
    core: Option<Arc<SessionCore>>,
    events: Option<mpsc::Receiver<SessionEvent>>,
    threads: Vec<JoinHandle<()>>,
    discovery_addr: Option<SocketAddr>,
}

impl PeerSession {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        PeerSession {
            config,
            core: None,
            events: None,
            threads: Vec::new(),
            discovery_addr: None,
        }
    }

    #[must_use]
    pub fn identity(&self) -> &PeerIdentity {
        &self.config.identity
    }

    /// The address the browser listens on, once started. Beacons aimed here
    /// reach this session directly (loopback tests, known-peer setups).
    #[must_use]
    pub fn discovery_addr(&self) -> Option<SocketAddr> {
        self.discovery_addr
    }

    /// Whether a connection to the opponent is currently established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        match &self.core {
            Some(core) => {
                let state = core.state.lock();
                state.phase == Phase::Connected && state.link.is_some()
            }
            None => false,
        }
    }

    /// Enter the discovering phase: advertise local presence and browse for
    /// peers simultaneously, with color reset to the white default pending
    /// negotiation. Failures to bind sockets are logged and leave the
    /// device undiscoverable until the session is restarted; they do not
    /// panic or return an error.
    pub fn start(&mut self) {
        self.end();

        let name = self.config.identity.name().to_string();
        let (events_tx, events_rx) = mpsc::channel();
        let core = Arc::new(SessionCore {
            identity: name.clone(),
            stop: StopFlag::new(),
            discovery_stop: StopFlag::new(),
            state: Mutex::new(CoreState {
                phase: Phase::Discovering,
                arbiter: Arbiter::new(name.clone()),
                link: None,
                invited: HashSet::new(),
                events: events_tx,
                reader_handle: None,
            }),
        });

        // invitation listener: the TCP endpoint beacons point peers at
        let mut listener_port = 0;
        match TcpListener::bind(("0.0.0.0", 0)) {
            Ok(listener) => match listener.set_nonblocking(true) {
                Ok(()) => {
                    listener_port = listener.local_addr().map(|addr| addr.port()).unwrap_or(0);
                    self.threads.push(link::spawn_invite_listener(
                        listener,
                        Arc::clone(&core),
                        core.discovery_stop.clone(),
                    ));
                }
                Err(err) => log::error!("{name}: invitation listener setup failed: {err}"),
            },
            Err(err) => log::error!("{name}: could not start invitation listener: {err}"),
        }

        // advertiser, only when there is a listener to point peers at
        if listener_port != 0 {
            let beacon = Beacon {
                service: self.config.service_tag.clone(),
                name: name.clone(),
                port: listener_port,
            };
            if let Some(handle) = discovery::spawn_advertiser(
                &beacon,
                self.config.beacon_targets.clone(),
                self.config.beacon_interval,
                core.discovery_stop.clone(),
            ) {
                self.threads.push(handle);
            }
        }

        // browser
        match UdpSocket::bind(("0.0.0.0", self.config.discovery_port)) {
            Ok(socket) => {
                if let Err(err) = socket.set_read_timeout(Some(BROWSE_READ_TIMEOUT)) {
                    log::error!("{name}: browse socket setup failed: {err}");
                } else {
                    self.discovery_addr = socket.local_addr().ok();
                    let browse_core = Arc::clone(&core);
                    self.threads.push(discovery::spawn_browser(
                        socket,
                        self.config.service_tag.clone(),
                        name,
                        core.discovery_stop.clone(),
                        move |peer, addr| SessionCore::handle_peer_found(&browse_core, peer, addr),
                    ));
                }
            }
            Err(err) => log::error!("{name}: could not start browsing: {err}"),
        }

        self.core = Some(core);
        self.events = Some(events_rx);
    }

    /// Serialize `moves` and send them to the connected peer, in order.
    /// Best-effort: serialization or transport errors are logged and the
    /// batch is dropped, with no retry (the transport itself is reliable).
    pub fn send_move_batch(&self, moves: &[MoveRecord]) {
        match &self.core {
            Some(core) => core.send_move_batch(moves),
            None => log::warn!("{}: session not started", self.config.identity),
        }
    }

    /// Drain pending session events on the calling thread, invoking the
    /// delegate for each. Events come out in transport receipt order, which
    /// is what lets remote batches apply without re-validation. Returns the
    /// number of events delivered.
    pub fn pump(&mut self, delegate: &mut dyn SessionDelegate) -> usize {
        let Some(events) = self.events.as_ref() else {
            return 0;
        };
        let mut delivered = 0;
        while let Ok(event) = events.try_recv() {
            delivered += 1;
            match event {
                SessionEvent::Connected { is_black } => delegate.connected_as_color(is_black),
                SessionEvent::ConnectionLost => delegate.connection_lost(),
                SessionEvent::MoveBatch(moves) => delegate.received_move_batch(moves),
            }
        }
        delivered
    }

    /// Disconnect, stop advertising and browsing and release all networking
    /// resources. Idempotent; safe to call when already idle. Outstanding
    /// sends are not drained.
    pub fn end(&mut self) {
        if let Some(core) = self.core.take() {
            core.stop.stop();
            core.discovery_stop.stop();
            let reader_handle = {
                let mut state = core.state.lock();
                state.phase = Phase::Idle;
                if let Some(peer_link) = state.link.take() {
                    peer_link.shutdown();
                }
                state.invited.clear();
                state.reader_handle.take()
            };
            if let Some(handle) = reader_handle {
                let _ = handle.join();
            }
        }
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
        self.events = None;
        self.discovery_addr = None;
    }
}

impl Drop for PeerSession {
    fn drop(&mut self) {
        self.end();
    }
}

fn now_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0)
}
