//! The inbound half of a stream: sinks resource deltas into the remote
//! registry and produces acknowledgements.

mod consumer;
mod registry;

pub use consumer::Consumer;
pub use registry::ConsumerRegistry;
