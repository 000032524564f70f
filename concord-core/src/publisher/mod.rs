//! The outbound half of a stream: sources resource deltas from the local
//! registry and feeds them to the stream handler's writer.

mod publisher;
mod registry;

pub use publisher::{Publisher, WatchResponse, PUBLISHER_QUEUE_CAPACITY};
pub use registry::PublisherRegistry;
