//! Repeat-send dispatch of waveform patterns.
//!
//! A dispatch fans out one repeat-send loop thread per target endpoint.
//! Each loop sends the same message `total_sends` times, parking on its
//! cancellation channel between sends so an emergency stop wakes it
//! immediately. The dispatch call itself returns as soon as every loop's
//! first send has resolved; a detached supervisor joins the loops and
//! retires the dispatch's cancellation handle afterwards.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, info, warn};

use pulselink_net::{OutboundMessage, Transport};
use pulselink_types::{Channel, EndpointId, WaveformSegment};

use super::{Engine, Shared};

/// Milliseconds between repeat sends at a given cadence. Never zero:
/// rates above 1000/s degrade to one send per millisecond.
pub(crate) fn interval_ms(rate_per_sec: u32) -> u64 {
    (1000 / rate_per_sec.max(1) as u64).max(1)
}

/// How many times the pattern is sent over the dispatch's duration.
/// Always at least once, even when the duration is shorter than one interval.
pub(crate) fn total_sends(duration_ms: u64, interval_ms: u64) -> u64 {
    (duration_ms / interval_ms).max(1)
}

impl Engine {
    /// Dispatch a waveform pattern to every bound endpoint on one channel.
    ///
    /// Returns `true` iff at least one endpoint accepted the first send. The
    /// call returns as soon as every first send has resolved; the repeat
    /// loops keep running for the remaining duration in the background.
    pub fn send_wave(
        &self,
        segments: Vec<WaveformSegment>,
        channel: Channel,
        duration_ms: u64,
        rate_per_sec: u32,
    ) -> bool {
        if segments.is_empty() {
            warn!("wave dispatch skipped: empty segment list");
            return false;
        }
        if rate_per_sec == 0 {
            warn!("wave dispatch: send rate 0 treated as 1/s");
        }

        let targets = match dispatch_targets(&self.shared) {
            Some(targets) => targets,
            None => return false,
        };

        let interval = interval_ms(rate_per_sec);
        let total = total_sends(duration_ms, interval);
        let message = OutboundMessage::wave(channel, segments, duration_ms);
        debug!(
            "dispatching wave on channel {} to {} endpoints, {} sends every {}ms",
            channel,
            targets.len(),
            total,
            interval
        );

        // Register the cancellation handle before any loop starts so an
        // emergency stop racing this dispatch still reaches it.
        let (cancel_tx, cancel_rx) = bounded::<()>(0);
        let id = self
            .shared
            .next_dispatch
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.shared.active.lock().unwrap().insert(id, cancel_tx);

        let (first_tx, first_rx) = unbounded();
        let expected = targets.len();
        let mut handles = Vec::with_capacity(expected);
        for endpoint in targets {
            let transport = Arc::clone(&self.shared.transport);
            let message = message.clone();
            let cancel = cancel_rx.clone();
            let first_tx = first_tx.clone();
            handles.push(thread::spawn(move || {
                run_send_loop(
                    transport,
                    endpoint,
                    message,
                    total,
                    Duration::from_millis(interval),
                    cancel,
                    first_tx,
                );
            }));
        }
        drop(first_tx);

        // The supervisor outlives this call; it retires the dispatch once
        // every loop has finished or been cancelled.
        let shared = Arc::clone(&self.shared);
        thread::spawn(move || {
            for handle in handles {
                let _ = handle.join();
            }
            shared.active.lock().unwrap().remove(&id);
            debug!("dispatch {} retired", id);
        });

        // Each loop reports its first-send result exactly once.
        let mut any = false;
        for _ in 0..expected {
            match first_rx.recv() {
                Ok(ok) => any |= ok,
                Err(_) => break,
            }
        }
        if !any {
            warn!("wave dispatch failed: no endpoint accepted the first send");
        }
        any
    }

    /// Dispatch a catalog wave by name.
    pub fn send_wave_named(
        &self,
        name: &str,
        channel: Channel,
        duration_ms: u64,
        rate_per_sec: u32,
    ) -> bool {
        let wave = match self.shared.catalog.get(name) {
            Some(wave) => wave,
            None => {
                warn!("wave dispatch skipped: unknown wave {:?}", name);
                return false;
            }
        };
        self.send_wave(wave.segments().to_vec(), channel, duration_ms, rate_per_sec)
    }

    /// Dispatch the same pattern on both channels concurrently.
    /// Succeeds if either channel's dispatch succeeds.
    pub fn send_wave_both(
        &self,
        segments: Vec<WaveformSegment>,
        duration_ms: u64,
        rate_per_sec: u32,
    ) -> bool {
        thread::scope(|s| {
            let a = {
                let segments = segments.clone();
                s.spawn(move || self.send_wave(segments, Channel::A, duration_ms, rate_per_sec))
            };
            let b =
                s.spawn(move || self.send_wave(segments, Channel::B, duration_ms, rate_per_sec));
            let a = a.join().unwrap_or(false);
            let b = b.join().unwrap_or(false);
            a || b
        })
    }

    /// Dispatch a catalog wave by name on both channels.
    pub fn send_wave_named_both(&self, name: &str, duration_ms: u64, rate_per_sec: u32) -> bool {
        let wave = match self.shared.catalog.get(name) {
            Some(wave) => wave,
            None => {
                warn!("wave dispatch skipped: unknown wave {:?}", name);
                return false;
            }
        };
        self.send_wave_both(wave.segments().to_vec(), duration_ms, rate_per_sec)
    }
}

/// The ordered precondition ladder for a dispatch. Each failure logs its own
/// distinct reason and yields no target set.
fn dispatch_targets(shared: &Shared) -> Option<Vec<EndpointId>> {
    if !shared
        .initialized
        .load(std::sync::atomic::Ordering::SeqCst)
    {
        warn!("wave dispatch skipped: engine not initialized");
        return None;
    }
    let connected = shared.transport.connected_endpoints();
    if connected.is_empty() {
        warn!("wave dispatch skipped: no connected endpoints");
        return None;
    }
    let listing = shared.transport.bound_listing(&shared.controller);
    if listing.is_empty() {
        warn!("wave dispatch skipped: no bound endpoints");
        return None;
    }
    let targets: Vec<EndpointId> = connected
        .into_iter()
        .filter(|endpoint| pulselink_net::listing_contains(&listing, endpoint))
        .collect();
    if targets.is_empty() {
        warn!("wave dispatch skipped: no endpoint is both connected and bound");
        return None;
    }
    Some(targets)
}

/// One endpoint's repeat-send loop. Reports the first send's result on
/// `first_tx`, then keeps renewing the pattern until the send count is
/// exhausted, the transport fails, or the dispatch is cancelled.
fn run_send_loop(
    transport: Arc<dyn Transport>,
    endpoint: EndpointId,
    message: OutboundMessage,
    total: u64,
    interval: Duration,
    cancel: Receiver<()>,
    first_tx: Sender<bool>,
) {
    for i in 0..total {
        match transport.send(&endpoint, &message) {
            Ok(accepted) => {
                if i == 0 {
                    let _ = first_tx.send(accepted);
                }
                if !accepted {
                    debug!("endpoint {} refused wave send {}/{}", endpoint, i + 1, total);
                }
            }
            Err(e) => {
                if i == 0 {
                    let _ = first_tx.send(false);
                }
                warn!("send loop to {} aborted at {}/{}: {}", endpoint, i + 1, total, e);
                return;
            }
        }
        if i + 1 == total {
            break;
        }
        match cancel.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            _ => {
                info!("send loop to {} cancelled after {}/{}", endpoint, i + 1, total);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_from_rate() {
        assert_eq!(interval_ms(1), 1000);
        assert_eq!(interval_ms(4), 250);
        assert_eq!(interval_ms(100), 10);
        // A zero rate degrades to 1/s instead of dividing by zero.
        assert_eq!(interval_ms(0), 1000);
    }

    #[test]
    fn extreme_rates_floor_at_one_millisecond() {
        assert_eq!(interval_ms(1000), 1);
        assert_eq!(interval_ms(1500), 1);
        assert_eq!(interval_ms(u32::MAX), 1);
        // The schedule math stays well-defined at the floor.
        assert_eq!(total_sends(1000, interval_ms(1500)), 1000);
    }

    #[test]
    fn total_sends_floors_but_never_zero() {
        assert_eq!(total_sends(3000, 1000), 3);
        assert_eq!(total_sends(3500, 1000), 3);
        assert_eq!(total_sends(500, 1000), 1);
        assert_eq!(total_sends(0, 1000), 1);
        assert_eq!(total_sends(1000, 250), 4);
    }
}
