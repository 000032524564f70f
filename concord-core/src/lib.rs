//! Protocol engine for the federated service discovery stream: registries,
//! publisher/consumer fan-out, the stream multiplex loop, and the peer
//! endpoint that wires them to a gRPC transport.

pub mod config;
pub mod consumer;
pub mod error;
pub mod logging;
pub mod peer;
pub mod publisher;
pub mod registry;
pub mod stream_handler;
pub mod tls;

pub use error::{Error, Result};
pub use peer::PeerEndpoint;

/// The well-known type URL stamped on every [`concord_proto::FederatedService`]
/// payload and used as the default `resource_url` a peer publishes to and
/// subscribes on.
pub const FEDERATED_SERVICE_RESOURCE_URL: &str = concord_proto::FEDERATED_SERVICE_TYPE_URL;
