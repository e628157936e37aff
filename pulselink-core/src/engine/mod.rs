//! The dispatch engine.
//!
//! One `Engine` drives one controller endpoint: it repeat-sends waveform
//! patterns to every bound device app, tracks in-flight dispatches so an
//! emergency stop can cancel them, pushes strength changes to all targets,
//! and reconciles strength onto endpoints as they bind.
//!
//! Every surface operation returns a boolean and logs its failure reason;
//! nothing here panics or raises on transport trouble.

mod dispatch;
mod reconcile;
mod stop;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::Sender;
use log::{info, warn};

use pulselink_net::{listing_contains, OutboundMessage, Transport};
use pulselink_types::{clamp_strength, Channel, EndpointId, EngineStatus, StrengthState};

use crate::config::Config;
use crate::waves::WaveCatalog;

use reconcile::ListenerHandle;

/// State shared between the engine surface and its worker threads.
pub(crate) struct Shared {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) catalog: Arc<WaveCatalog>,
    pub(crate) controller: EndpointId,
    pub(crate) strength: Mutex<StrengthState>,
    /// Active dispatches by id. Dropping a `Sender` cancels every send loop
    /// holding a clone of its `Receiver`.
    pub(crate) active: Mutex<HashMap<u64, Sender<()>>>,
    pub(crate) next_dispatch: AtomicU64,
    pub(crate) initialized: AtomicBool,
    pub(crate) settle_delay: Duration,
}

impl Shared {
    /// Endpoints that are both connected and bound to the controller.
    pub(crate) fn targets(&self) -> Vec<EndpointId> {
        let listing = self.transport.bound_listing(&self.controller);
        self.transport
            .connected_endpoints()
            .into_iter()
            .filter(|endpoint| listing_contains(&listing, endpoint))
            .collect()
    }
}

pub struct Engine {
    shared: Arc<Shared>,
    listener: Mutex<Option<ListenerHandle>>,
}

impl Engine {
    /// An engine with the default settle delay (500 ms) and both strength
    /// targets at zero.
    pub fn new(
        transport: Arc<dyn Transport>,
        catalog: Arc<WaveCatalog>,
        controller: EndpointId,
    ) -> Self {
        Self::with_options(
            transport,
            catalog,
            controller,
            Duration::from_millis(500),
            (0, 0),
        )
    }

    /// An engine tuned from configuration (settle delay, default strengths).
    pub fn from_config(
        transport: Arc<dyn Transport>,
        catalog: Arc<WaveCatalog>,
        controller: EndpointId,
        config: &Config,
    ) -> Self {
        Self::with_options(
            transport,
            catalog,
            controller,
            config.settle_delay(),
            config.default_strengths(),
        )
    }

    pub fn with_options(
        transport: Arc<dyn Transport>,
        catalog: Arc<WaveCatalog>,
        controller: EndpointId,
        settle_delay: Duration,
        default_strengths: (u8, u8),
    ) -> Self {
        let (a, b) = default_strengths;
        Self {
            shared: Arc::new(Shared {
                transport,
                catalog,
                controller,
                strength: Mutex::new(StrengthState::new(a, b)),
                active: Mutex::new(HashMap::new()),
                next_dispatch: AtomicU64::new(1),
                initialized: AtomicBool::new(false),
                settle_delay,
            }),
            listener: Mutex::new(None),
        }
    }

    /// Bring the engine up: mark it initialized and start the bind-event
    /// listener. Calling twice is harmless.
    pub fn initialize(&self) -> bool {
        if self.shared.initialized.swap(true, Ordering::SeqCst) {
            warn!("engine already initialized");
            return true;
        }
        let handle = reconcile::spawn_listener(Arc::clone(&self.shared));
        *self.listener.lock().unwrap() = Some(handle);
        info!("engine initialized for controller {}", self.shared.controller);
        true
    }

    /// Tear the engine down: cancel every active dispatch and stop the
    /// bind-event listener. Also runs on `Drop`.
    pub fn dispose(&self) {
        if !self.shared.initialized.swap(false, Ordering::SeqCst) {
            return;
        }
        let cancelled = {
            let mut active = self.shared.active.lock().unwrap();
            let n = active.len();
            active.clear();
            n
        };
        if cancelled > 0 {
            info!("dispose cancelled {} active dispatches", cancelled);
        }
        if let Some(handle) = self.listener.lock().unwrap().take() {
            handle.stop();
        }
        info!("engine disposed");
    }

    /// Clamp and record a channel's strength target, then push it to every
    /// current target endpoint. The push is awaited; `true` means every
    /// endpoint accepted it.
    pub fn set_strength(&self, channel: Channel, value: i32) -> bool {
        let value = clamp_strength(value);
        self.shared.strength.lock().unwrap().set(channel, value);

        if !self.shared.initialized.load(Ordering::SeqCst) {
            warn!("strength push skipped: engine not initialized");
            return false;
        }
        let targets = self.shared.targets();
        if targets.is_empty() {
            warn!("strength push skipped: no endpoint is both connected and bound");
            return false;
        }

        let message = OutboundMessage::set_strength(channel, value);
        let transport = &self.shared.transport;
        std::thread::scope(|s| {
            let handles: Vec<_> = targets
                .iter()
                .map(|endpoint| {
                    let transport = Arc::clone(transport);
                    let message = message.clone();
                    s.spawn(move || match transport.send(endpoint, &message) {
                        Ok(true) => true,
                        Ok(false) => {
                            warn!("endpoint {} refused strength update", endpoint);
                            false
                        }
                        Err(e) => {
                            warn!("strength push to {} failed: {}", endpoint, e);
                            false
                        }
                    })
                })
                .collect();
            handles
                .into_iter()
                .fold(true, |all, h| h.join().unwrap_or(false) && all)
        })
    }

    /// Current strength target for one channel.
    pub fn strength(&self, channel: Channel) -> u8 {
        self.shared.strength.lock().unwrap().get(channel)
    }

    pub fn catalog(&self) -> &WaveCatalog {
        &self.shared.catalog
    }

    pub fn status(&self) -> EngineStatus {
        let strength = *self.shared.strength.lock().unwrap();
        EngineStatus {
            connected: self.shared.transport.connected_endpoints().len(),
            bound: self
                .shared
                .transport
                .bound_listing(&self.shared.controller)
                .len(),
            strength_a: strength.a,
            strength_b: strength.b,
        }
    }

    /// Number of dispatches currently registered for cancellation.
    pub fn active_dispatch_count(&self) -> usize {
        self.shared.active.lock().unwrap().len()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.dispose();
    }
}
