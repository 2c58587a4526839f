// Realtime telemetry subscription client: one shared duplex connection
// multiplexing named telemetry channels and the distinguished event channel.

pub mod codec;
pub mod connection;
pub mod limits;
pub mod naming;
pub mod provider;
pub mod queue;
pub mod registry;
pub mod transport;
pub mod values;

pub use codec::OutboundCommand;
pub use connection::{ConnectionState, TelemetryLink};
pub use provider::{Provider, RealtimeProvider, SubscriptionHandle};
pub use registry::{Registry, Subscriber};
