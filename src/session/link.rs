//! TCP side of the session: invitation listener, outgoing invites and the
//! established-link reader.
//!
//! An invitation is the first line on a fresh connection. The listener hands
//! it to the session core for arbitration; acceptance answers with an
//! `accept` line and the same stream becomes the game link. Ignored invites
//! are simply dropped; the closing socket is the only signal the inviter
//! gets, so an ignored invitation looks the same as an unreachable peer.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::wire::{self, Message};
use super::SessionCore;
use crate::sync::StopFlag;

const STOP_POLL: Duration = Duration::from_millis(100);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// How long an invitation waits for an answer before giving up.
const INVITE_TIMEOUT: Duration = Duration::from_secs(60);
/// Read timeout on streams; long blocking reads would stall teardown.
const READ_POLL: Duration = Duration::from_millis(500);

/// Writer half of the established connection to the single opponent.
#[derive(Debug)]
pub(crate) struct PeerLink {
    stream: TcpStream,
    pub(crate) peer_name: String,
}

impl PeerLink {
    pub(crate) fn new(stream: TcpStream, peer_name: String) -> Self {
        PeerLink { stream, peer_name }
    }

    /// Write one framed message line. Reliability and ordering come from
    /// TCP; there is no application-level retry on top.
    pub(crate) fn send_line(&mut self, line: &str) -> io::Result<()> {
        self.stream.write_all(line.as_bytes())?;
        self.stream.write_all(b"\n")
    }

    /// Tear the connection down without draining in-flight sends.
    pub(crate) fn shutdown(&self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

/// Spawn the invitation listener: accept connections and hand each one to a
/// short-lived handshake thread. The listener socket must be non-blocking.
pub(crate) fn spawn_invite_listener(
    listener: TcpListener,
    core: Arc<SessionCore>,
    stop: StopFlag,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while !stop.is_stopped() {
            match listener.accept() {
                Ok((stream, _addr)) => {
                    let core = Arc::clone(&core);
                    thread::spawn(move || receive_invitation(&core, stream));
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(STOP_POLL);
                }
                Err(err) => {
                    log::warn!("{}: invitation accept failed: {err}", core.local_name());
                    thread::sleep(STOP_POLL);
                }
            }
        }
        log::debug!("{}: invitation listener stopped", core.local_name());
    })
}

/// Handshake for one inbound connection: read the invite line and let the
/// core arbitrate. Anything malformed drops the connection.
fn receive_invitation(core: &Arc<SessionCore>, stream: TcpStream) {
    if let Err(err) = stream.set_read_timeout(Some(READ_POLL)) {
        log::warn!("{}: invite stream setup failed: {err}", core.local_name());
        return;
    }

    let mut reader = match stream.try_clone() {
        Ok(clone) => BufReader::new(clone),
        Err(err) => {
            log::warn!("{}: invite stream clone failed: {err}", core.local_name());
            return;
        }
    };

    let deadline = Instant::now() + CONNECT_TIMEOUT;
    let Some(line) = read_framed_line(&mut reader, core.stop(), deadline) else {
        return;
    };

    match wire::decode_message(&line) {
        Ok(Message::Invite { name, timestamp }) => {
            SessionCore::handle_invitation(core, stream, reader, name, timestamp);
        }
        Ok(other) => {
            log::warn!("{}: expected an invitation, got {other:?}", core.local_name());
        }
        Err(err) => {
            log::warn!("{}: dropped malformed invitation: {err}", core.local_name());
        }
    }
}

/// Spawn a detached thread that invites `peer_name` at `addr` and waits for
/// acceptance. On acceptance the stream is promoted to the game link; on
/// refusal or timeout the attempt is quietly abandoned.
pub(crate) fn spawn_invite(
    core: Arc<SessionCore>,
    peer_name: String,
    addr: SocketAddr,
    timestamp: f64,
) {
    thread::spawn(move || {
        log::info!("{}: inviting peer {peer_name}", core.local_name());

        let stream = match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(stream) => stream,
            Err(err) => {
                log::warn!("{}: could not reach {peer_name}: {err}", core.local_name());
                core.invite_failed(&peer_name);
                return;
            }
        };
        if let Err(err) = stream.set_read_timeout(Some(READ_POLL)) {
            log::warn!("{}: invite stream setup failed: {err}", core.local_name());
            core.invite_failed(&peer_name);
            return;
        }

        let invite = Message::Invite {
            name: core.local_name().to_string(),
            timestamp,
        };
        let line = match wire::encode_message(&invite) {
            Ok(line) => line,
            Err(err) => {
                log::warn!("{}: could not encode invitation: {err}", core.local_name());
                core.invite_failed(&peer_name);
                return;
            }
        };
        let mut link = PeerLink::new(stream, peer_name.clone());
        if let Err(err) = link.send_line(&line) {
            log::warn!("{}: invitation to {peer_name} failed: {err}", core.local_name());
            core.invite_failed(&peer_name);
            return;
        }

        let mut reader = match link.stream.try_clone() {
            Ok(clone) => BufReader::new(clone),
            Err(err) => {
                log::warn!("{}: invite stream clone failed: {err}", core.local_name());
                core.invite_failed(&peer_name);
                return;
            }
        };

        let deadline = Instant::now() + INVITE_TIMEOUT;
        let Some(answer) = read_framed_line(&mut reader, core.stop(), deadline) else {
            // ignored or unreachable; a later beacon may retry
            log::info!("{}: did not connect to peer {peer_name}", core.local_name());
            core.invite_failed(&peer_name);
            return;
        };

        match wire::decode_message(&answer) {
            Ok(Message::Accept { name }) => {
                log::info!("{}: invitation accepted by {name}", core.local_name());
                SessionCore::complete_link(&core, link, reader);
            }
            Ok(other) => {
                log::warn!("{}: unexpected invite answer {other:?}", core.local_name());
                core.invite_failed(&peer_name);
            }
            Err(err) => {
                log::warn!("{}: dropped malformed invite answer: {err}", core.local_name());
                core.invite_failed(&peer_name);
            }
        }
    });
}

/// Spawn the reader for the established link: decode move batches in receipt
/// order and surface the peer dropping as a connection loss.
pub(crate) fn spawn_link_reader(
    core: Arc<SessionCore>,
    mut reader: BufReader<TcpStream>,
    peer_name: String,
    stop: StopFlag,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut line = String::new();
        loop {
            if stop.is_stopped() {
                break;
            }
            match reader.read_line(&mut line) {
                Ok(0) => {
                    log::info!("{}: peer {peer_name} disconnected", core.local_name());
                    core.handle_connection_lost();
                    break;
                }
                Ok(_) => {
                    core.handle_line(&line);
                    line.clear();
                }
                Err(err)
                    if err.kind() == io::ErrorKind::WouldBlock
                        || err.kind() == io::ErrorKind::TimedOut =>
                {
                    // partial data stays in `line` until the rest arrives
                    continue;
                }
                Err(err) => {
                    if !stop.is_stopped() {
                        log::warn!("{}: link to {peer_name} failed: {err}", core.local_name());
                        core.handle_connection_lost();
                    }
                    break;
                }
            }
        }
        log::debug!("{}: link reader stopped", core.local_name());
    })
}

/// Read one newline-terminated line, tolerating read timeouts until
/// `deadline` or the stop flag. Returns `None` on EOF, hard errors or
/// timeout.
fn read_framed_line(
    reader: &mut BufReader<TcpStream>,
    stop: &StopFlag,
    deadline: Instant,
) -> Option<String> {
    let mut line = String::new();
    loop {
        if stop.is_stopped() || Instant::now() >= deadline {
            return None;
        }
        match reader.read_line(&mut line) {
            Ok(0) => return None,
            Ok(_) => {
                if line.ends_with('\n') {
                    return Some(line);
                }
                // EOF mid-line
                return None;
            }
            Err(err)
                if err.kind() == io::ErrorKind::WouldBlock
                    || err.kind() == io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(_) => return None,
        }
    }
}
