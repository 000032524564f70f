//! Wire types for the federated service discovery protocol.
//!
//! Generated from `proto/federation.proto`: the `StreamRequest`/
//! `StreamResponse` envelope and the `FederatedService` payload schema,
//! plus the `FederationDiscovery` bidirectional-streaming gRPC service.

pub mod federation {
    #![allow(clippy::all)]
    #![allow(warnings)]
    include!("concord.federation.v1alpha2.rs");
}

pub use federation::{
    federation_discovery_client, federation_discovery_server, AckCode, AnyPayload,
    BidirectionalStreamMessage, Endpoint, FederatedService, Operation, StreamRequest,
    StreamResponse,
};

pub use federation::bidirectional_stream_message;

/// Canonical type URL for the [`FederatedService`] payload, as carried in
/// `AnyPayload::type_url`.
pub const FEDERATED_SERVICE_TYPE_URL: &str =
    "type.googleapis.com/concord.federation.v1alpha2.FederatedService";
