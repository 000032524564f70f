//! Binds one duplex stream to one publisher and one consumer, multiplexing
//! outbound publisher events and inbound messages onto a single full-duplex
//! channel with cooperative shutdown.

use std::sync::Arc;

use async_trait::async_trait;
use concord_proto::{bidirectional_stream_message, BidirectionalStreamMessage, StreamRequest};
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::consumer::ConsumerRegistry;
use crate::error::{Error, Result};
use crate::publisher::{PublisherRegistry, WatchResponse};
use crate::registry::LocalRegistry;

/// Abstracts over the server-role and client-role halves of a bidirectional
/// gRPC stream so the multiplex loop below is written once. All writes to
/// the transport are serialized internally: the underlying duplex stream
/// is not safe for concurrent writers, and only this sink should ever call
/// into it.
#[async_trait]
pub trait StreamSink: Send + Sync {
    async fn send(&self, message: BidirectionalStreamMessage) -> Result<()>;
}

/// Sink for the server role: outbound messages are pushed onto the
/// channel tonic drains into the response stream.
pub struct ServerSink {
    tx: mpsc::Sender<std::result::Result<BidirectionalStreamMessage, tonic::Status>>,
    send_lock: AsyncMutex<()>,
}

impl ServerSink {
    #[must_use]
    pub fn new(tx: mpsc::Sender<std::result::Result<BidirectionalStreamMessage, tonic::Status>>) -> Self {
        Self {
            tx,
            send_lock: AsyncMutex::new(()),
        }
    }
}

#[async_trait]
impl StreamSink for ServerSink {
    async fn send(&self, message: BidirectionalStreamMessage) -> Result<()> {
        let _guard = self.send_lock.lock().await;
        self.tx
            .send(Ok(message))
            .await
            .map_err(|_| Error::Transport("response channel closed".to_string()))
    }
}

/// Sink for the client role: outbound messages feed the request stream the
/// client dialed with.
pub struct ClientSink {
    tx: mpsc::Sender<BidirectionalStreamMessage>,
    send_lock: AsyncMutex<()>,
}

impl ClientSink {
    #[must_use]
    pub fn new(tx: mpsc::Sender<BidirectionalStreamMessage>) -> Self {
        Self {
            tx,
            send_lock: AsyncMutex::new(()),
        }
    }
}

#[async_trait]
impl StreamSink for ClientSink {
    async fn send(&self, message: BidirectionalStreamMessage) -> Result<()> {
        let _guard = self.send_lock.lock().await;
        self.tx
            .send(message)
            .await
            .map_err(|_| Error::Transport("request channel closed".to_string()))
    }
}

/// Per-invocation parameters for [`run`]. `stream_id` becomes both the
/// publisher/consumer registration key and the provider id under which
/// this peer's advertisements land in the remote peer's remote registry.
pub struct HandlerContext {
    pub stream_id: String,
    pub resource_url: String,
    pub context_token: String,
    /// `true` for the dialing (client) peer: it sends the initial
    /// handshake request before entering the multiplex loop. The
    /// accepting (server) peer has already consumed that handshake before
    /// `run` is invoked.
    pub send_initial_request: bool,
}

/// Binds `sink`/`inbound` to a freshly registered publisher and consumer,
/// runs the full-duplex multiplex loop until the stream ends or
/// `cancel` fires, then unconditionally deregisters both — which, for the
/// consumer side, cascades into purging every resource this peer had
/// announced from the remote registry.
pub async fn run(
    ctx: HandlerContext,
    sink: Arc<dyn StreamSink>,
    inbound: tonic::Streaming<BidirectionalStreamMessage>,
    local_registry: Arc<LocalRegistry>,
    publisher_registry: Arc<PublisherRegistry>,
    consumer_registry: Arc<ConsumerRegistry>,
    cancel: CancellationToken,
) -> Result<()> {
    let publisher = match publisher_registry.register(&ctx.stream_id) {
        Ok(publisher) => publisher,
        Err(err) => return Err(err),
    };
    let consumer = match consumer_registry.register(&ctx.stream_id) {
        Ok(consumer) => consumer,
        Err(err) => {
            publisher_registry.deregister(&ctx.stream_id);
            return Err(err);
        }
    };

    let result = run_inner(&ctx, sink, inbound, &local_registry, &publisher, &consumer, cancel).await;

    consumer_registry.deregister(&ctx.stream_id);
    publisher_registry.deregister(&ctx.stream_id);

    if let Err(err) = &result {
        tracing::warn!(stream_id = %ctx.stream_id, %err, "stream handler exited with error");
    } else {
        tracing::info!(stream_id = %ctx.stream_id, "stream handler exited");
    }

    result
}

async fn run_inner(
    ctx: &HandlerContext,
    sink: Arc<dyn StreamSink>,
    mut inbound: tonic::Streaming<BidirectionalStreamMessage>,
    local_registry: &LocalRegistry,
    publisher: &crate::publisher::Publisher,
    consumer: &crate::consumer::Consumer,
    cancel: CancellationToken,
) -> Result<()> {
    publisher.init_stream(&ctx.resource_url, local_registry)?;
    let mut outbound = publisher.watch_stream(&ctx.resource_url)?;

    if ctx.send_initial_request {
        let handshake = StreamRequest {
            resource_url: ctx.resource_url.clone(),
            context: ctx.context_token.clone(),
            ..Default::default()
        };
        sink.send(envelope_request(handshake)).await?;
    }

    let (inbound_tx, mut inbound_rx) = mpsc::channel::<BidirectionalStreamMessage>(128);
    let reader_stream_id = ctx.stream_id.clone();
    let reader = tokio::spawn(async move {
        loop {
            match inbound.message().await {
                Ok(Some(message)) => {
                    if inbound_tx.send(message).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(stream_id = %reader_stream_id, %err, "stream recv failed");
                    break;
                }
            }
        }
    });

    let outcome = loop {
        // Unbiased: a peer continuously streaming inbound deltas must not
        // starve this side's own outbound advertisements.
        tokio::select! {
            () = cancel.cancelled() => {
                break Ok(());
            }

            maybe_message = inbound_rx.recv() => {
                let Some(message) = maybe_message else {
                    break Ok(());
                };
                match message.payload {
                    Some(bidirectional_stream_message::Payload::Response(response)) => {
                        let mut ack = consumer.accept_stream_data(&response);
                        ack.context = ctx.context_token.clone();
                        if let Err(err) = sink.send(envelope_request(ack)).await {
                            tracing::warn!(stream_id = %ctx.stream_id, %err, "failed to send ack/nack");
                        }
                    }
                    Some(bidirectional_stream_message::Payload::Request(request)) => {
                        if request.response_nonce.is_empty() {
                            tracing::debug!(
                                stream_id = %ctx.stream_id,
                                "ignoring request without response_nonce after handshake"
                            );
                        } else {
                            publisher.process_ack_nack(&request);
                        }
                    }
                    None => {}
                }
            }

            maybe_event = outbound.next() => {
                match maybe_event {
                    Some(WatchResponse::Object(response)) => {
                        if let Err(err) = sink.send(envelope_response(response)).await {
                            tracing::warn!(stream_id = %ctx.stream_id, %err, "failed to send stream data");
                            break Err(err);
                        }
                    }
                    Some(WatchResponse::Closed) | None => {
                        break Ok(());
                    }
                }
            }
        }
    };

    reader.abort();
    outcome
}

fn envelope_request(request: StreamRequest) -> BidirectionalStreamMessage {
    BidirectionalStreamMessage {
        payload: Some(bidirectional_stream_message::Payload::Request(request)),
    }
}

fn envelope_response(response: concord_proto::StreamResponse) -> BidirectionalStreamMessage {
    BidirectionalStreamMessage {
        payload: Some(bidirectional_stream_message::Payload::Response(response)),
    }
}
