//! Peer discovery: UDP beacon advertiser and browser threads.
//!
//! Advertising and browsing run simultaneously while the session is in its
//! discovering phase and stop as soon as a connection is established. A
//! beacon names the fixed service tag, the device's display name and the
//! TCP port its invitation listener accepts on. Display names are
//! self-reported and untrusted; they only serve to skip our own beacons.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::wire::{self, Beacon};
use crate::sync::StopFlag;

/// Granularity of stop-flag polling in the worker loops.
const STOP_POLL: Duration = Duration::from_millis(100);

/// Spawn the advertiser thread: send `beacon` to every target each
/// `interval` until `stop` is set. Returns `None` (with a log) when the
/// send socket cannot be created, leaving the device undiscoverable until
/// the session is restarted.
pub(crate) fn spawn_advertiser(
    beacon: &Beacon,
    targets: Vec<SocketAddr>,
    interval: Duration,
    stop: StopFlag,
) -> Option<JoinHandle<()>> {
    let socket = match UdpSocket::bind(("0.0.0.0", 0)) {
        Ok(socket) => socket,
        Err(err) => {
            log::error!("{}: could not start advertising: {err}", beacon.name);
            return None;
        }
    };
    if let Err(err) = socket.set_broadcast(true) {
        log::warn!("{}: beacon socket broadcast flag: {err}", beacon.name);
    }

    let payload = match wire::encode_beacon(beacon) {
        Ok(payload) => payload,
        Err(err) => {
            log::error!("{}: could not encode beacon: {err}", beacon.name);
            return None;
        }
    };
    let name = beacon.name.clone();

    Some(thread::spawn(move || {
        while !stop.is_stopped() {
            for target in &targets {
                if let Err(err) = socket.send_to(payload.as_bytes(), target) {
                    log::warn!("{name}: beacon to {target} failed: {err}");
                }
            }
            sleep_until_stopped(interval, &stop);
        }
        log::debug!("{name}: advertiser stopped");
    }))
}

/// Spawn the browser thread: receive beacons on `socket` (read timeout
/// already set by the caller) and report each peer advertising the same
/// service under a different name. `on_peer` receives the peer's display
/// name and the socket address of its invitation listener.
pub(crate) fn spawn_browser<F>(
    socket: UdpSocket,
    service_tag: String,
    local_name: String,
    stop: StopFlag,
    mut on_peer: F,
) -> JoinHandle<()>
where
    F: FnMut(String, SocketAddr) + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = [0u8; 1024];
        while !stop.is_stopped() {
            let (len, src) = match socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(err)
                    if err.kind() == io::ErrorKind::WouldBlock
                        || err.kind() == io::ErrorKind::TimedOut =>
                {
                    continue;
                }
                Err(err) => {
                    log::warn!("{local_name}: browse receive failed: {err}");
                    thread::sleep(STOP_POLL);
                    continue;
                }
            };

            let beacon = match wire::decode_beacon(&buf[..len]) {
                Ok(beacon) => beacon,
                Err(err) => {
                    // stray traffic on the discovery port
                    log::debug!("{local_name}: dropped malformed beacon from {src}: {err}");
                    continue;
                }
            };

            if beacon.service != service_tag {
                continue;
            }
            if beacon.name == local_name {
                log::debug!("{local_name}: ignoring own beacon");
                continue;
            }

            log::info!("{local_name}: browser found peer {}", beacon.name);
            on_peer(beacon.name, SocketAddr::new(src.ip(), beacon.port));
        }
        log::debug!("{local_name}: browser stopped");
    })
}

fn sleep_until_stopped(total: Duration, stop: &StopFlag) {
    let mut slept = Duration::ZERO;
    while slept < total && !stop.is_stopped() {
        thread::sleep(STOP_POLL);
        slept += STOP_POLL;
    }
}
