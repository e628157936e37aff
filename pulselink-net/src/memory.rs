//! In-process transport for integration tests and demos.
//!
//! `MemoryTransport` keeps the connected/bound bookkeeping of a real
//! transport but delivers nothing anywhere: every send attempt is recorded
//! with a timestamp so tests can assert on ordering (e.g. that an emergency
//! stop's neutralize commands come after the last cancelled wave send).
//! Failures can be scripted per endpoint.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Mutex;
use std::time::Instant;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::debug;

use pulselink_types::EndpointId;

use crate::protocol::{BindEvent, OutboundMessage};
use crate::transport::Transport;

/// How one recorded send attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Transport accepted the message.
    Delivered,
    /// Transport refused the message (send returned `Ok(false)`).
    Refused,
    /// Transport failed outright (send returned `Err`).
    Failed,
}

/// One send attempt observed by the transport.
#[derive(Debug, Clone)]
pub struct SendRecord {
    pub at: Instant,
    pub endpoint: EndpointId,
    pub message: OutboundMessage,
    pub outcome: SendOutcome,
}

struct Inner {
    connected: Vec<EndpointId>,
    /// Controller id -> bound-apps listing entries.
    bound: HashMap<EndpointId, Vec<String>>,
    log: Vec<SendRecord>,
    /// Endpoints whose sends are refused (`Ok(false)`).
    refused: HashSet<EndpointId>,
    /// Endpoints whose sends fail (`Err`).
    severed: HashSet<EndpointId>,
}

/// An in-process [`Transport`] with manual connect/bind control.
pub struct MemoryTransport {
    inner: Mutex<Inner>,
    events_tx: Sender<BindEvent>,
    events_rx: Receiver<BindEvent>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            inner: Mutex::new(Inner {
                connected: Vec::new(),
                bound: HashMap::new(),
                log: Vec::new(),
                refused: HashSet::new(),
                severed: HashSet::new(),
            }),
            events_tx,
            events_rx,
        }
    }

    /// Mark an endpoint as connected at the transport level.
    pub fn connect(&self, endpoint: EndpointId) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.connected.contains(&endpoint) {
            inner.connected.push(endpoint);
        }
    }

    /// Drop an endpoint's transport-level connection.
    pub fn disconnect(&self, endpoint: &EndpointId) {
        let mut inner = self.inner.lock().unwrap();
        inner.connected.retain(|e| e != endpoint);
    }

    /// Bind an endpoint to a controller and emit the bound event.
    ///
    /// The listing entry embeds the endpoint id in a larger addressing
    /// string, matching the substring-containment scheme real transports use.
    pub fn bind(&self, controller: &EndpointId, endpoint: EndpointId) {
        {
            let mut inner = self.inner.lock().unwrap();
            let entry = format!("session/{}/bound", endpoint.as_str());
            let listing = inner.bound.entry(controller.clone()).or_default();
            if !listing.contains(&entry) {
                listing.push(entry);
            }
        }
        let _ = self.events_tx.send(BindEvent::Bound(endpoint));
    }

    /// Release an endpoint's binding and emit the unbound event.
    pub fn unbind(&self, controller: &EndpointId, endpoint: &EndpointId) {
        {
            let mut inner = self.inner.lock().unwrap();
            if let Some(listing) = inner.bound.get_mut(controller) {
                listing.retain(|entry| !entry.contains(endpoint.as_str()));
            }
        }
        let _ = self.events_tx.send(BindEvent::Unbound(endpoint.clone()));
    }

    /// Script sends to this endpoint to be refused (`Ok(false)`).
    pub fn refuse_sends(&self, endpoint: EndpointId) {
        self.inner.lock().unwrap().refused.insert(endpoint);
    }

    /// Script sends to this endpoint to fail (`Err`).
    pub fn sever(&self, endpoint: EndpointId) {
        self.inner.lock().unwrap().severed.insert(endpoint);
    }

    /// Clear any scripted failure for an endpoint.
    pub fn heal(&self, endpoint: &EndpointId) {
        let mut inner = self.inner.lock().unwrap();
        inner.refused.remove(endpoint);
        inner.severed.remove(endpoint);
    }

    /// Snapshot of every send attempt so far, in order.
    pub fn log(&self) -> Vec<SendRecord> {
        self.inner.lock().unwrap().log.clone()
    }

    /// Drain the send log.
    pub fn take_log(&self) -> Vec<SendRecord> {
        std::mem::take(&mut self.inner.lock().unwrap().log)
    }

    /// Send attempts addressed to one endpoint, in order.
    pub fn records_for(&self, endpoint: &EndpointId) -> Vec<SendRecord> {
        self.inner
            .lock()
            .unwrap()
            .log
            .iter()
            .filter(|r| &r.endpoint == endpoint)
            .cloned()
            .collect()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    fn connected_endpoints(&self) -> Vec<EndpointId> {
        self.inner.lock().unwrap().connected.clone()
    }

    fn bound_listing(&self, controller: &EndpointId) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .bound
            .get(controller)
            .cloned()
            .unwrap_or_default()
    }

    fn send(&self, endpoint: &EndpointId, message: &OutboundMessage) -> io::Result<bool> {
        let mut inner = self.inner.lock().unwrap();

        let outcome = if inner.severed.contains(endpoint) {
            SendOutcome::Failed
        } else if inner.refused.contains(endpoint) {
            SendOutcome::Refused
        } else {
            SendOutcome::Delivered
        };

        inner.log.push(SendRecord {
            at: Instant::now(),
            endpoint: endpoint.clone(),
            message: message.clone(),
            outcome,
        });
        drop(inner);

        match outcome {
            SendOutcome::Delivered => Ok(true),
            SendOutcome::Refused => {
                debug!("memory transport refused send to {}", endpoint);
                Ok(false)
            }
            SendOutcome::Failed => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                format!("transport link to {} severed", endpoint),
            )),
        }
    }

    fn bind_events(&self) -> Receiver<BindEvent> {
        self.events_rx.clone()
    }
}
