//! Strength reconciliation for newly bound endpoints.
//!
//! A freshly bound device app starts at zero strength regardless of what the
//! rest of the fleet is running. The listener thread watches the transport's
//! bind events and, after a short settle delay, pushes the engine's current
//! per-channel targets to the new endpoint only.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, select, Receiver, RecvTimeoutError, Sender};
use log::{debug, info, warn};

use pulselink_net::{listing_contains, BindEvent, OutboundMessage};
use pulselink_types::{Channel, EndpointId};

use super::Shared;

pub(super) struct ListenerHandle {
    shutdown: Sender<()>,
    thread: JoinHandle<()>,
}

impl ListenerHandle {
    pub(super) fn stop(self) {
        drop(self.shutdown);
        let _ = self.thread.join();
    }
}

pub(super) fn spawn_listener(shared: Arc<Shared>) -> ListenerHandle {
    let events = shared.transport.bind_events();
    let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
    let thread = thread::spawn(move || listen(shared, events, shutdown_rx));
    ListenerHandle {
        shutdown: shutdown_tx,
        thread,
    }
}

fn listen(shared: Arc<Shared>, events: Receiver<BindEvent>, shutdown: Receiver<()>) {
    debug!("bind-event listener started");
    loop {
        select! {
            recv(events) -> event => match event {
                Ok(BindEvent::Bound(endpoint)) => {
                    reconcile_endpoint(&shared, &shutdown, endpoint)
                }
                Ok(BindEvent::Unbound(endpoint)) => {
                    debug!("endpoint {} unbound", endpoint);
                }
                Err(_) => break,
            },
            recv(shutdown) -> _ => break,
        }
    }
    debug!("bind-event listener stopped");
}

/// Push the current strength targets to one newly bound endpoint.
///
/// The settle wait parks on the shutdown channel so `dispose()` interrupts
/// it instead of blocking on a sleeping listener. Failures are logged and
/// dropped; the endpoint will simply run at zero until the next push.
fn reconcile_endpoint(shared: &Arc<Shared>, shutdown: &Receiver<()>, endpoint: EndpointId) {
    if !shared.initialized.load(Ordering::SeqCst) {
        debug!("reconcile skipped for {}: engine not initialized", endpoint);
        return;
    }
    if !shared.transport.connected_endpoints().contains(&endpoint) {
        debug!("reconcile skipped for {}: not connected", endpoint);
        return;
    }
    let listing = shared.transport.bound_listing(&shared.controller);
    if !listing_contains(&listing, &endpoint) {
        debug!("reconcile skipped for {}: no longer bound", endpoint);
        return;
    }

    match shutdown.recv_timeout(shared.settle_delay) {
        Err(RecvTimeoutError::Timeout) => {}
        _ => return,
    }

    let strength = *shared.strength.lock().unwrap();
    info!(
        "reconciling endpoint {} to strengths A={} B={}",
        endpoint, strength.a, strength.b
    );
    thread::scope(|s| {
        for channel in Channel::ALL {
            let transport = Arc::clone(&shared.transport);
            let endpoint = endpoint.clone();
            s.spawn(move || {
                let message = OutboundMessage::set_strength(channel, strength.get(channel));
                match transport.send(&endpoint, &message) {
                    Ok(true) => {}
                    Ok(false) => {
                        warn!("endpoint {} refused reconcile on channel {}", endpoint, channel)
                    }
                    Err(e) => {
                        warn!("reconcile of {} channel {} failed: {}", endpoint, channel, e)
                    }
                }
            });
        }
    });
}
