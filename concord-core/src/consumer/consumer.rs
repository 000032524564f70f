//! One consumer per inbound stream: decode, dispatch to the remote
//! registry, emit ack/nack.

use std::sync::Arc;

use concord_proto::{AckCode, Operation, StreamRequest, StreamResponse};

use crate::error::{Error, Result};
use crate::registry::RemoteRegistry;

/// Sinks one inbound stream's resource deltas into the remote registry
/// under `providerId = streamId`. Stateless beyond that association.
pub struct Consumer {
    id: String,
    remote_registry: Arc<RemoteRegistry>,
}

impl Consumer {
    pub(crate) fn new(id: impl Into<String>, remote_registry: Arc<RemoteRegistry>) -> Self {
        Self {
            id: id.into(),
            remote_registry,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Decodes `response` and applies it to the remote registry, returning
    /// an acknowledgement echoing the original nonce. Always returns a
    /// request: decode or registry failures become an `unavailable` status
    /// with a descriptive message rather than an error the stream handler
    /// must tear the stream down for.
    pub fn accept_stream_data(&self, response: &StreamResponse) -> StreamRequest {
        let outcome = self.dispatch(response);
        let mut ack = StreamRequest {
            response_nonce: response.nonce.clone(),
            ..Default::default()
        };
        match outcome {
            Ok(()) => {
                ack.status = AckCode::Ok as i32;
            }
            Err(err) => {
                tracing::warn!(
                    consumer = %self.id,
                    resource_id = %response.resource_id,
                    %err,
                    "failed to process stream response"
                );
                ack.status = AckCode::Unavailable as i32;
                ack.status_message = err.to_string();
            }
        }
        ack
    }

    fn dispatch(&self, response: &StreamResponse) -> Result<()> {
        let operation = Operation::try_from(response.operation)
            .map_err(|_| Error::Decode(format!("unknown operation code {}", response.operation)))?;

        match operation {
            Operation::Upsert => {
                let payload = response
                    .payload
                    .clone()
                    .ok_or_else(|| Error::Decode("UPSERT response carried no payload".to_string()))?;
                self.remote_registry
                    .upsert(&self.id, &response.resource_id, payload)
            }
            Operation::Delete => self.remote_registry.delete(&self.id, &response.resource_id),
        }
    }
}
