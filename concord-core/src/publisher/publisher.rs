//! One publisher per outbound stream: snapshot-on-attach, incremental
//! change feed, bounded per-stream buffer, nonce issuing.

use std::collections::HashMap;

use concord_proto::{AckCode, Operation, StreamRequest, StreamResponse};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::{Error, Result};
use crate::registry::LocalRegistry;

/// Maximum number of outstanding responses a single stream's publisher
/// queue can hold before further updates are dropped with `QueueOverflow`.
/// Mirrors the original implementation's `MaxStreamBufferSize` constant.
pub const PUBLISHER_QUEUE_CAPACITY: usize = 4096;

/// An item delivered over a publisher's outbound queue.
#[derive(Debug, Clone)]
pub enum WatchResponse {
    /// A resource delta to write to the stream.
    Object(StreamResponse),
    /// The stream was explicitly closed; no further items follow.
    Closed,
}

struct StreamState {
    sender: mpsc::Sender<WatchResponse>,
    receiver: Option<mpsc::Receiver<WatchResponse>>,
}

/// One instance of a federated service mesh publisher, bound to a single
/// stream id. A publisher may fan out to at most one `resourceUrl` at a
/// time in this protocol generation, but the map keeps the door open for
/// multiple resource kinds per stream.
pub struct Publisher {
    id: String,
    streams: Mutex<HashMap<String, StreamState>>,
}

impl Publisher {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            streams: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Snapshots `local_registry` for `resource_url`, enqueues one `UPSERT`
    /// response per snapshot entry with a fresh nonce each, and binds the
    /// publisher to subsequent `notify_stream` calls for that url. Fails
    /// with `AlreadyInitialized` if called twice for the same
    /// `resource_url`.
    pub fn init_stream(&self, resource_url: &str, local_registry: &LocalRegistry) -> Result<()> {
        let mut streams = self.streams.lock();
        if streams.contains_key(resource_url) {
            return Err(Error::AlreadyInitialized(format!(
                "publisher {} already publishing to {resource_url}",
                self.id
            )));
        }

        let (sender, receiver) = mpsc::channel(PUBLISHER_QUEUE_CAPACITY);
        for (resource_id, payload) in local_registry.get_full(resource_url) {
            let response = StreamResponse {
                resource_url: payload.type_url.clone(),
                resource_id,
                payload: Some(payload),
                operation: Operation::Upsert as i32,
                nonce: new_nonce(),
            };
            self.enqueue(&sender, resource_url, WatchResponse::Object(response))?;
        }

        streams.insert(
            resource_url.to_string(),
            StreamState {
                sender,
                receiver: Some(receiver),
            },
        );
        Ok(())
    }

    /// Called by the local registry on each change. Stamps a fresh nonce
    /// and enqueues. Non-blocking: a full queue drops the update and
    /// surfaces `QueueOverflow` rather than back-pressuring the registry.
    /// A resource url the publisher hasn't attached to is silently
    /// ignored (there is no subscriber to deliver to).
    pub fn notify_stream(&self, mut response: StreamResponse) -> Result<()> {
        let streams = self.streams.lock();
        let Some(state) = streams.get(&response.resource_url) else {
            return Ok(());
        };
        response.nonce = new_nonce();
        self.enqueue(&state.sender, &response.resource_url, WatchResponse::Object(response))
    }

    /// Returns the outbound queue as a lazy sequence terminated by
    /// `WatchResponse::Closed`. May only be called once per `resource_url`
    /// (per attached stream, there is exactly one reader).
    pub fn watch_stream(&self, resource_url: &str) -> Result<ReceiverStream<WatchResponse>> {
        let mut streams = self.streams.lock();
        let state = streams.get_mut(resource_url).ok_or_else(|| {
            Error::NotFound(format!(
                "publisher {} hasn't subscribed to stream {resource_url}",
                self.id
            ))
        })?;
        let receiver = state.receiver.take().ok_or_else(|| {
            Error::AlreadyInitialized(format!("stream {resource_url} is already being watched"))
        })?;
        Ok(ReceiverStream::new(receiver))
    }

    /// Consumes a peer's acknowledgement. A non-ok status is a logged
    /// error signal only: no replay, retry, or teardown follows from it.
    /// An unknown nonce is not fatal.
    pub fn process_ack_nack(&self, request: &StreamRequest) {
        if request.status == AckCode::Ok as i32 {
            tracing::debug!(
                publisher = %self.id,
                nonce = %request.response_nonce,
                "received ack"
            );
        } else {
            tracing::warn!(
                publisher = %self.id,
                nonce = %request.response_nonce,
                message = %request.status_message,
                "received nack"
            );
        }
    }

    /// Enqueues a `Closed` marker and closes the queue for `resource_url`.
    pub fn close_stream(&self, resource_url: &str) -> Result<()> {
        let mut streams = self.streams.lock();
        let state = streams.get(resource_url).ok_or_else(|| {
            Error::NotFound(format!(
                "publisher {} hasn't subscribed to stream {resource_url}",
                self.id
            ))
        })?;
        // Best-effort: if the queue is already full the reader is about to
        // observe the sender being dropped anyway.
        let _ = state.sender.try_send(WatchResponse::Closed);
        streams.remove(resource_url);
        Ok(())
    }

    fn enqueue(
        &self,
        sender: &mpsc::Sender<WatchResponse>,
        resource_url: &str,
        item: WatchResponse,
    ) -> Result<()> {
        match sender.try_send(item) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => Err(Error::QueueOverflow {
                stream_id: self.id.clone(),
                resource_url: resource_url.to_string(),
            }),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(Error::Transport(format!(
                "publisher {} stream {resource_url} is closed",
                self.id
            ))),
        }
    }
}

fn new_nonce() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::PublisherRegistry;
    use std::sync::Arc;
    use tokio_stream::StreamExt;

    const TYPE_URL: &str = "type/FederatedService";

    fn publisher() -> Publisher {
        Publisher::new("stream-1")
    }

    #[tokio::test]
    async fn init_stream_snapshots_existing_entries() {
        let publisher_registry = Arc::new(PublisherRegistry::new());
        let local = LocalRegistry::new(publisher_registry);
        local
            .upsert(
                "svc.acme.com",
                TYPE_URL,
                &concord_proto::FederatedService {
                    fqdn: "svc.acme.com".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();

        let publisher = publisher();
        publisher.init_stream(TYPE_URL, &local).unwrap();
        let mut stream = publisher.watch_stream(TYPE_URL).unwrap();
        let first = stream.next().await.unwrap();
        assert!(matches!(first, WatchResponse::Object(resp) if resp.resource_id == "svc.acme.com"));
    }

    #[tokio::test]
    async fn init_stream_twice_fails() {
        let publisher_registry = Arc::new(PublisherRegistry::new());
        let local = LocalRegistry::new(publisher_registry);
        let publisher = publisher();
        publisher.init_stream(TYPE_URL, &local).unwrap();
        assert!(matches!(
            publisher.init_stream(TYPE_URL, &local),
            Err(Error::AlreadyInitialized(_))
        ));
    }

    #[tokio::test]
    async fn notify_stream_before_init_is_a_noop() {
        let publisher = publisher();
        let response = StreamResponse {
            resource_url: TYPE_URL.to_string(),
            resource_id: "svc.acme.com".to_string(),
            payload: None,
            operation: Operation::Upsert as i32,
            nonce: String::new(),
        };
        assert!(publisher.notify_stream(response).is_ok());
    }

    #[tokio::test]
    async fn notify_stream_overflow_reports_error() {
        let publisher_registry = Arc::new(PublisherRegistry::new());
        let local = LocalRegistry::new(publisher_registry);
        let publisher = publisher();
        publisher.init_stream(TYPE_URL, &local).unwrap();

        for i in 0..PUBLISHER_QUEUE_CAPACITY {
            let response = StreamResponse {
                resource_url: TYPE_URL.to_string(),
                resource_id: format!("svc-{i}"),
                payload: None,
                operation: Operation::Upsert as i32,
                nonce: String::new(),
            };
            publisher.notify_stream(response).unwrap();
        }

        let overflow = StreamResponse {
            resource_url: TYPE_URL.to_string(),
            resource_id: "svc-overflow".to_string(),
            payload: None,
            operation: Operation::Upsert as i32,
            nonce: String::new(),
        };
        assert!(matches!(
            publisher.notify_stream(overflow),
            Err(Error::QueueOverflow { .. })
        ));
    }

    #[tokio::test]
    async fn close_stream_terminates_watch() {
        let publisher_registry = Arc::new(PublisherRegistry::new());
        let local = LocalRegistry::new(publisher_registry);
        let publisher = publisher();
        publisher.init_stream(TYPE_URL, &local).unwrap();
        let mut stream = publisher.watch_stream(TYPE_URL).unwrap();
        publisher.close_stream(TYPE_URL).unwrap();
        let item = stream.next().await.unwrap();
        assert!(matches!(item, WatchResponse::Closed));
        assert!(stream.next().await.is_none());
    }
}
