//! The peer endpoint: the process-wide registries plus the two ways a
//! stream gets bound to them — accepting as a gRPC server, or dialing out
//! as a gRPC client. Both roles end up driving the same
//! [`stream_handler::run`].

use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use concord_proto::federation_discovery_client::FederationDiscoveryClient;
use concord_proto::federation_discovery_server::{FederationDiscovery, FederationDiscoveryServer};
use concord_proto::{bidirectional_stream_message, BidirectionalStreamMessage};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint, Server, ServerTlsConfig};
use tonic::{Request, Response, Status, Streaming};

use crate::config::KeepaliveConfig;
use crate::consumer::ConsumerRegistry;
use crate::error::{Error, Result};
use crate::publisher::PublisherRegistry;
use crate::registry::{LocalRegistry, RemoteRegistry};
use crate::stream_handler::{self, ClientSink, HandlerContext, ServerSink};

/// The set of registries a running peer binds every stream to, plus a
/// cancellation token that cascades shutdown to every handler this
/// endpoint has spawned.
pub struct PeerEndpoint {
    local_registry: Arc<LocalRegistry>,
    remote_registry: Arc<RemoteRegistry>,
    publisher_registry: Arc<PublisherRegistry>,
    consumer_registry: Arc<ConsumerRegistry>,
    cancel: CancellationToken,
}

impl PeerEndpoint {
    #[must_use]
    pub fn new() -> Arc<Self> {
        let publisher_registry = Arc::new(PublisherRegistry::new());
        let remote_registry = Arc::new(RemoteRegistry::new());
        Arc::new(Self {
            local_registry: Arc::new(LocalRegistry::new(publisher_registry.clone())),
            remote_registry: remote_registry.clone(),
            publisher_registry,
            consumer_registry: Arc::new(ConsumerRegistry::new(remote_registry)),
            cancel: CancellationToken::new(),
        })
    }

    /// The registry of resources this peer advertises to whoever connects
    /// to it.
    #[must_use]
    pub fn local_registry(&self) -> &Arc<LocalRegistry> {
        &self.local_registry
    }

    /// The registry of resources this peer has learned about from every
    /// peer it talks to.
    #[must_use]
    pub fn remote_registry(&self) -> &Arc<RemoteRegistry> {
        &self.remote_registry
    }

    /// Cascades a shutdown signal to every stream handler this endpoint
    /// has spawned, server or client role.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Accepts streams on `listen_addr` until `shutdown` is called or the
    /// listener fails. Each dialing peer's handshake `context` is checked
    /// against `context_token` before a stream handler is spawned for it.
    pub async fn serve(
        self: Arc<Self>,
        listen_addr: SocketAddr,
        context_token: String,
        tls: Option<ServerTlsConfig>,
        keepalive: &KeepaliveConfig,
    ) -> Result<()> {
        let service = FederationDiscoveryServer::new(DiscoveryService {
            endpoint: self.clone(),
            context_token,
        });

        let mut builder = Server::builder();
        if let Some(tls) = tls {
            builder = builder.tls_config(tls).map_err(|e| Error::Transport(e.to_string()))?;
        }
        builder = builder
            .http2_keepalive_interval(Some(Duration::from_secs(keepalive.server_min_ping_interval_secs)))
            .http2_keepalive_timeout(Some(Duration::from_secs(20)));

        let shutdown = self.cancel.clone();
        builder
            .add_service(service)
            .serve_with_shutdown(listen_addr, shutdown.cancelled_owned())
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }

    /// Dials `peer_addr`, sends the initial handshake request for
    /// `resource_url`, and drives the resulting stream through the same
    /// multiplex loop the server role uses. Returns once the stream ends
    /// or `shutdown` is called.
    pub async fn dial(
        self: Arc<Self>,
        peer_addr: String,
        resource_url: String,
        context_token: String,
        tls: Option<ClientTlsConfig>,
        keepalive: &KeepaliveConfig,
    ) -> Result<()> {
        let mut endpoint = Endpoint::from_shared(peer_addr)
            .map_err(|e| Error::Transport(e.to_string()))?
            .http2_keep_alive_interval(Duration::from_secs(keepalive.client_ping_interval_secs))
            .keep_alive_timeout(Duration::from_secs(keepalive.client_ping_timeout_secs))
            .keep_alive_while_idle(keepalive.client_permit_without_stream);

        if let Some(tls) = tls {
            endpoint = endpoint.tls_config(tls).map_err(|e| Error::Transport(e.to_string()))?;
        }

        let channel: Channel = endpoint.connect().await.map_err(|e| Error::Transport(e.to_string()))?;
        let mut client = FederationDiscoveryClient::new(channel);

        let (tx, rx) = mpsc::channel::<BidirectionalStreamMessage>(128);
        let response = client
            .stream_resources(ReceiverStream::new(rx))
            .await
            .map_err(Error::from)?;
        let inbound = response.into_inner();

        let ctx = HandlerContext {
            stream_id: uuid::Uuid::new_v4().simple().to_string(),
            resource_url,
            context_token,
            send_initial_request: true,
        };
        let sink: Arc<dyn stream_handler::StreamSink> = Arc::new(ClientSink::new(tx));

        stream_handler::run(
            ctx,
            sink,
            inbound,
            self.local_registry.clone(),
            self.publisher_registry.clone(),
            self.consumer_registry.clone(),
            self.cancel.clone(),
        )
        .await
    }
}

/// The gRPC service implementation. Returns the response stream immediately
/// and hands the inbound stream to a spawned task ([`accept_stream`]) that
/// validates the handshake before driving [`stream_handler::run`].
struct DiscoveryService {
    endpoint: Arc<PeerEndpoint>,
    context_token: String,
}

#[tonic::async_trait]
impl FederationDiscovery for DiscoveryService {
    type StreamResourcesStream =
        Pin<Box<dyn Stream<Item = std::result::Result<BidirectionalStreamMessage, Status>> + Send + 'static>>;

    async fn stream_resources(
        &self,
        request: Request<Streaming<BidirectionalStreamMessage>>,
    ) -> std::result::Result<Response<Self::StreamResourcesStream>, Status> {
        // The response stream must go back to tonic before we read anything
        // from `inbound`: tonic only writes response HEADERS once this
        // method returns `Ok`, and the dialing peer's call future does not
        // resolve until those headers arrive. Reading the handshake inline
        // here, before returning, would have both sides waiting on each
        // other forever. So: return the stream now, and validate the
        // handshake from a spawned task instead.
        let inbound = request.into_inner();
        let (tx, rx) = mpsc::channel(128);

        let endpoint = self.endpoint.clone();
        let context_token = self.context_token.clone();
        tokio::spawn(accept_stream(endpoint, context_token, inbound, tx));

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }
}

/// Reads and validates the handshake that must be the first message on an
/// accepted stream, then hands the rest of it to [`stream_handler::run`].
/// A missing or mismatched handshake closes the stream with the
/// corresponding `Status` instead of a spawned-task panic, since the RPC
/// itself has already returned `Ok`.
async fn accept_stream(
    endpoint: Arc<PeerEndpoint>,
    context_token: String,
    mut inbound: Streaming<BidirectionalStreamMessage>,
    tx: mpsc::Sender<std::result::Result<BidirectionalStreamMessage, Status>>,
) {
    let stream_id = uuid::Uuid::new_v4().simple().to_string();

    let first = match inbound.message().await {
        Ok(Some(message)) => message,
        Ok(None) => {
            let _ = tx
                .send(Err(Status::invalid_argument("stream closed before handshake")))
                .await;
            return;
        }
        Err(err) => {
            tracing::warn!(%stream_id, %err, "failed to read handshake");
            return;
        }
    };
    let Some(bidirectional_stream_message::Payload::Request(handshake)) = first.payload else {
        let _ = tx
            .send(Err(Status::invalid_argument(
                "first message on a stream must be a handshake request",
            )))
            .await;
        return;
    };
    if handshake.context != context_token {
        let _ = tx.send(Err(Status::unauthenticated("unknown connection context"))).await;
        return;
    }

    let sink: Arc<dyn stream_handler::StreamSink> = Arc::new(ServerSink::new(tx));
    let ctx = HandlerContext {
        stream_id: stream_id.clone(),
        resource_url: handshake.resource_url,
        context_token,
        send_initial_request: false,
    };

    let outcome = stream_handler::run(
        ctx,
        sink,
        inbound,
        endpoint.local_registry.clone(),
        endpoint.publisher_registry.clone(),
        endpoint.consumer_registry.clone(),
        endpoint.cancel.clone(),
    )
    .await;
    if let Err(err) = outcome {
        tracing::warn!(%stream_id, %err, "accepted stream terminated with error");
    }
}
