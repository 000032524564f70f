//! The two resource registries the protocol engine binds to a stream: the
//! [`local`] registry of resources this peer advertises, and the [`remote`]
//! registry of resources this peer has learned about from its peers.

pub mod local;
pub mod remote;

pub use local::LocalRegistry;
pub use remote::{RemoteObserver, RemoteRegistry};
