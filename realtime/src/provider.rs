// Caller-facing subscription surface
use crate::codec::OutboundCommand;
use crate::connection::TelemetryLink;
use crate::naming;
use crate::registry::Subscriber;
use groundlink_common::{GroundLinkError, LinkConfig, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Uniform surface shared by telemetry providers: whether a channel can be
/// subscribed to here, and subscribing to it. The historical (request/
/// response) provider exposes the same seam; the host combines them.
pub trait Provider {
    fn supports(&self, key: &str) -> bool;

    fn subscribe(&self, key: &str, subscriber: Arc<dyn Subscriber>) -> Result<SubscriptionHandle>;
}

/// Realtime subscription provider over one shared telemetry link.
///
/// `subscribe` returns synchronously; the subscribe control message is sent
/// by the connection task when the link is up, or queued until it is.
pub struct RealtimeProvider {
    link: Arc<TelemetryLink>,
}

impl RealtimeProvider {
    /// Connect over the production WebSocket transport.
    pub fn connect(config: LinkConfig) -> Result<Self> {
        Ok(Self::from_link(TelemetryLink::connect(config)?))
    }

    /// Wrap an already-constructed link (tests use this with an injected
    /// transport).
    pub fn from_link(link: TelemetryLink) -> Self {
        Self {
            link: Arc::new(link),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    pub fn shutdown(&self) {
        self.link.shutdown();
    }
}

impl Provider for RealtimeProvider {
    fn supports(&self, key: &str) -> bool {
        key == self.link.event_key() || naming::is_valid_key(key)
    }

    fn subscribe(&self, key: &str, subscriber: Arc<dyn Subscriber>) -> Result<SubscriptionHandle> {
        if !self.supports(key) {
            return Err(GroundLinkError::InvalidData(format!(
                "unsupported channel: {key}"
            )));
        }

        let epoch = self.link.registry().register(key, subscriber);
        self.link.enqueue(subscribe_command(&self.link, key));

        Ok(SubscriptionHandle {
            key: key.to_string(),
            epoch,
            link: Arc::clone(&self.link),
            released: AtomicBool::new(false),
        })
    }
}

fn subscribe_command(link: &TelemetryLink, key: &str) -> OutboundCommand {
    if key == link.event_key() {
        OutboundCommand::SubscribeEvents
    } else {
        OutboundCommand::SubscribeParameters(vec![naming::to_qualified_name(key)])
    }
}

fn unsubscribe_command(link: &TelemetryLink, key: &str) -> OutboundCommand {
    if key == link.event_key() {
        OutboundCommand::UnsubscribeEvents
    } else {
        OutboundCommand::UnsubscribeParameters(vec![naming::to_qualified_name(key)])
    }
}

/// Handle returned from `subscribe`.
///
/// `unsubscribe` is idempotent: repeated calls are no-ops, at most one
/// unsubscribe control message is issued per registration epoch, and a
/// handle that has been superseded by a newer registration for the same
/// channel leaves the newer registration untouched. Safe to call at any
/// point in the connection lifecycle, including after reconnects.
///
/// Dropping the handle does not unsubscribe; subscriptions are long-lived
/// until explicitly released.
pub struct SubscriptionHandle {
    key: String,
    epoch: u64,
    link: Arc<TelemetryLink>,
    released: AtomicBool,
}

impl SubscriptionHandle {
    pub fn channel(&self) -> &str {
        &self.key
    }

    pub fn unsubscribe(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.link.registry().deactivate(&self.key, self.epoch) {
            self.link.enqueue(unsubscribe_command(&self.link, &self.key));
        }
    }
}
