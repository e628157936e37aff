//! The transport surface the engine consumes.

use std::io;

use crossbeam_channel::Receiver;

use pulselink_types::EndpointId;

use crate::protocol::{BindEvent, OutboundMessage};

/// A message transport carrying commands to bound device apps.
///
/// Implementations own connection lifecycle, addressing and framing. The
/// engine only ever asks who is connected, who is bound to a controller,
/// and to deliver one message to one endpoint.
pub trait Transport: Send + Sync {
    /// Endpoints with a live transport-level connection.
    fn connected_endpoints(&self) -> Vec<EndpointId>;

    /// Raw bound-apps listing for a controller.
    ///
    /// Entries are transport-formatted strings that *contain* the bound
    /// endpoint's id; use [`listing_contains`] for membership tests.
    fn bound_listing(&self, controller: &EndpointId) -> Vec<String>;

    /// Deliver one message to one endpoint.
    ///
    /// `Ok(true)` means the transport accepted the message for that endpoint,
    /// `Ok(false)` means it refused it (endpoint gone, queue full), and `Err`
    /// means the transport itself failed. There are no partial-delivery
    /// semantics.
    fn send(&self, endpoint: &EndpointId, message: &OutboundMessage) -> io::Result<bool>;

    /// Stream of binding lifecycle events.
    fn bind_events(&self) -> Receiver<BindEvent>;
}

/// Membership test against a bound-apps listing.
///
/// The transport's listing entries embed the endpoint id in a larger
/// addressing string, so membership is a substring-containment test. This is
/// a documented quirk of the transport's addressing scheme, isolated here so
/// the engine's own logic only depends on a boolean.
pub fn listing_contains(listing: &[String], endpoint: &EndpointId) -> bool {
    listing.iter().any(|entry| entry.contains(endpoint.as_str()))
}
