//! Emergency stop: cancel everything, then neutralize every endpoint.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

use log::{error, info, warn};

use pulselink_net::{OutboundMessage, Transport};
use pulselink_types::{Channel, EndpointId};

use super::Engine;

impl Engine {
    /// Cancel every in-flight dispatch, then drive every bound endpoint to a
    /// neutral state: clear both channel patterns, then zero both strengths.
    ///
    /// Cancellation always happens first, even when the neutralize phase
    /// cannot run — a stop must never leave repeat loops feeding the device.
    /// Returns `true` only if every neutralize command was accepted by every
    /// endpoint. Calling with nothing in flight is not an error.
    pub fn emergency_stop(&self) -> bool {
        let cancelled = {
            let mut active = self.shared.active.lock().unwrap();
            let n = active.len();
            active.clear();
            n
        };
        if cancelled > 0 {
            info!("emergency stop: cancelled {} active dispatches", cancelled);
        }

        if !self.shared.initialized.load(Ordering::SeqCst) {
            warn!("emergency stop skipped: engine not initialized");
            return false;
        }
        if self.shared.transport.connected_endpoints().is_empty() {
            warn!("emergency stop skipped: no connected endpoints");
            return false;
        }
        let targets = self.shared.targets();
        if targets.is_empty() {
            warn!("emergency stop skipped: no endpoint is both connected and bound");
            return false;
        }

        // Zero the local targets too, so endpoints binding after the stop
        // are reconciled to silence rather than the pre-stop strengths.
        self.shared.strength.lock().unwrap().zero();

        let transport = &self.shared.transport;
        let all_ok = thread::scope(|s| {
            let handles: Vec<_> = targets
                .iter()
                .map(|endpoint| {
                    let transport = Arc::clone(transport);
                    s.spawn(move || neutralize_endpoint(transport.as_ref(), endpoint))
                })
                .collect();
            handles
                .into_iter()
                .fold(true, |all, h| h.join().unwrap_or(false) && all)
        });

        if all_ok {
            info!("emergency stop complete: {} endpoints neutralized", targets.len());
        } else {
            error!("emergency stop incomplete: some endpoints did not accept every command");
        }
        all_ok
    }
}

/// The per-endpoint neutralize sequence, in device order: clear the queued
/// pattern on each channel, then force each strength to zero. Ordered within
/// the endpoint; endpoints run concurrently.
fn neutralize_endpoint(transport: &dyn Transport, endpoint: &EndpointId) -> bool {
    let sequence = [
        OutboundMessage::clear(Channel::A),
        OutboundMessage::clear(Channel::B),
        OutboundMessage::set_strength(Channel::A, 0),
        OutboundMessage::set_strength(Channel::B, 0),
    ];
    let mut ok = true;
    for message in &sequence {
        match transport.send(endpoint, message) {
            Ok(true) => {}
            Ok(false) => {
                warn!(
                    "emergency stop: endpoint {} refused {} command",
                    endpoint,
                    describe(message)
                );
                ok = false;
            }
            Err(e) => {
                warn!(
                    "emergency stop: {} command to {} failed: {}",
                    describe(message),
                    endpoint,
                    e
                );
                ok = false;
            }
        }
    }
    ok
}

fn describe(message: &OutboundMessage) -> String {
    match message {
        OutboundMessage::ClearPattern { channel } => format!("clear-{}", channel),
        OutboundMessage::SetStrength { channel, .. } => format!("zero-{}", channel),
        OutboundMessage::Wave { channel, .. } => format!("wave-{}", channel),
    }
}
