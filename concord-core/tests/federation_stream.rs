//! End-to-end coverage of the federation stream: two peers, one dialing
//! the other, each side publishing its own local registry and observing
//! the other's through a `RemoteObserver`.
//!
//! Run with: cargo test --test federation_stream

use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use std::time::Duration;

use concord_core::config::KeepaliveConfig;
use concord_core::peer::PeerEndpoint;
use concord_core::registry::RemoteObserver;
use concord_core::Result;
use concord_proto::{AnyPayload, FederatedService};
use prost::Message;
use tokio::sync::mpsc;
use tokio::time::timeout;

const CONTEXT_TOKEN: &str = "shared-secret";
const AWAIT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
enum ObservedEvent {
    Upsert { provider_id: String, fqdn: String },
    Delete { provider_id: String, fqdn: String },
}

struct ChannelObserver {
    tx: mpsc::UnboundedSender<ObservedEvent>,
}

impl RemoteObserver for ChannelObserver {
    fn on_upsert(&self, _resource_url: &str, provider_id: &str, payload: &AnyPayload) -> Result<()> {
        let service = FederatedService::decode(payload.value.as_slice())
            .expect("test payloads are always well-formed FederatedService messages");
        let _ = self.tx.send(ObservedEvent::Upsert {
            provider_id: provider_id.to_string(),
            fqdn: service.fqdn,
        });
        Ok(())
    }

    fn on_delete(&self, _resource_url: &str, provider_id: &str, payload: &AnyPayload) -> Result<()> {
        let service = FederatedService::decode(payload.value.as_slice())
            .expect("test payloads are always well-formed FederatedService messages");
        let _ = self.tx.send(ObservedEvent::Delete {
            provider_id: provider_id.to_string(),
            fqdn: service.fqdn,
        });
        Ok(())
    }
}

fn reserve_loopback_addr() -> std::net::SocketAddr {
    let listener = StdTcpListener::bind("127.0.0.1:0").expect("binding an ephemeral port never fails");
    listener.local_addr().expect("a bound listener always has a local address")
}

fn service(fqdn: &str) -> FederatedService {
    FederatedService {
        fqdn: fqdn.to_string(),
        name: "acme-frontend".to_string(),
        ..Default::default()
    }
}

async fn expect_event(rx: &mut mpsc::UnboundedReceiver<ObservedEvent>) -> ObservedEvent {
    timeout(AWAIT_TIMEOUT, rx.recv())
        .await
        .expect("observer event did not arrive within the timeout")
        .expect("observer channel closed unexpectedly")
}

async fn assert_no_event(rx: &mut mpsc::UnboundedReceiver<ObservedEvent>) {
    assert!(
        timeout(Duration::from_millis(300), rx.recv()).await.is_err(),
        "expected no further observer events"
    );
}

/// Spins up a server-role endpoint and a client-role endpoint connected to
/// it over loopback TCP, each watching the other's remote registry.
/// Returns both endpoints plus the two observer channels, leaving the
/// caller free to drive the local registries and assert on the channels.
async fn connected_pair() -> (
    Arc<PeerEndpoint>,
    Arc<PeerEndpoint>,
    mpsc::UnboundedReceiver<ObservedEvent>,
    mpsc::UnboundedReceiver<ObservedEvent>,
) {
    let addr = reserve_loopback_addr();
    let server = PeerEndpoint::new();
    let client = PeerEndpoint::new();

    let (server_tx, server_rx) = mpsc::unbounded_channel();
    server
        .remote_registry()
        .watch_remote_resources("test-observer", Arc::new(ChannelObserver { tx: server_tx }))
        .unwrap();

    let (client_tx, client_rx) = mpsc::unbounded_channel();
    client
        .remote_registry()
        .watch_remote_resources("test-observer", Arc::new(ChannelObserver { tx: client_tx }))
        .unwrap();

    let keepalive = KeepaliveConfig::default();

    {
        let server = server.clone();
        let keepalive = keepalive.clone();
        tokio::spawn(async move {
            let _ = server
                .serve(addr, CONTEXT_TOKEN.to_string(), None, &keepalive)
                .await;
        });
    }
    // Give the listener a moment to bind before the client dials it.
    tokio::time::sleep(Duration::from_millis(100)).await;

    {
        let client = client.clone();
        let keepalive = keepalive.clone();
        tokio::spawn(async move {
            let _ = client
                .dial(
                    format!("http://{addr}"),
                    "type/FederatedService".to_string(),
                    CONTEXT_TOKEN.to_string(),
                    None,
                    &keepalive,
                )
                .await;
        });
    }
    tokio::time::sleep(Duration::from_millis(200)).await;

    (server, client, server_rx, client_rx)
}

#[tokio::test]
async fn single_upsert_is_observed_once_by_the_peer() {
    let (server, _client, _server_rx, mut client_rx) = connected_pair().await;

    server
        .local_registry()
        .upsert("svc.acme.com", "type/FederatedService", &service("svc.acme.com"))
        .unwrap();

    let event = expect_event(&mut client_rx).await;
    assert!(matches!(event, ObservedEvent::Upsert { fqdn, .. } if fqdn == "svc.acme.com"));
    assert_no_event(&mut client_rx).await;
}

#[tokio::test]
async fn idempotent_reupsert_is_not_observed_again() {
    let (server, _client, _server_rx, mut client_rx) = connected_pair().await;

    server
        .local_registry()
        .upsert("svc.acme.com", "type/FederatedService", &service("svc.acme.com"))
        .unwrap();
    expect_event(&mut client_rx).await;

    server
        .local_registry()
        .upsert("svc.acme.com", "type/FederatedService", &service("svc.acme.com"))
        .unwrap();
    assert_no_event(&mut client_rx).await;
}

#[tokio::test]
async fn changed_body_is_observed_again() {
    let (server, _client, _server_rx, mut client_rx) = connected_pair().await;

    server
        .local_registry()
        .upsert("svc.acme.com", "type/FederatedService", &service("svc.acme.com"))
        .unwrap();
    expect_event(&mut client_rx).await;

    let mut changed = service("svc.acme.com");
    changed.name = "acme-frontend-blue".to_string();
    server
        .local_registry()
        .upsert("svc.acme.com", "type/FederatedService", &changed)
        .unwrap();

    let event = expect_event(&mut client_rx).await;
    assert!(matches!(event, ObservedEvent::Upsert { fqdn, .. } if fqdn == "svc.acme.com"));
    assert_no_event(&mut client_rx).await;
}

#[tokio::test]
async fn delete_is_observed_once() {
    let (server, _client, _server_rx, mut client_rx) = connected_pair().await;

    server
        .local_registry()
        .upsert("svc.acme.com", "type/FederatedService", &service("svc.acme.com"))
        .unwrap();
    expect_event(&mut client_rx).await;

    server.local_registry().delete("svc.acme.com").unwrap();
    let event = expect_event(&mut client_rx).await;
    assert!(matches!(event, ObservedEvent::Delete { fqdn, .. } if fqdn == "svc.acme.com"));
    assert_no_event(&mut client_rx).await;
}

#[tokio::test]
async fn fresh_connection_replays_the_full_snapshot() {
    let addr = reserve_loopback_addr();
    let server = PeerEndpoint::new();

    server
        .local_registry()
        .upsert("one.acme.com", "type/FederatedService", &service("one.acme.com"))
        .unwrap();
    server
        .local_registry()
        .upsert("two.acme.com", "type/FederatedService", &service("two.acme.com"))
        .unwrap();
    server
        .local_registry()
        .upsert("three.acme.com", "type/FederatedService", &service("three.acme.com"))
        .unwrap();

    let keepalive = KeepaliveConfig::default();
    {
        let server = server.clone();
        let keepalive = keepalive.clone();
        tokio::spawn(async move {
            let _ = server
                .serve(addr, CONTEXT_TOKEN.to_string(), None, &keepalive)
                .await;
        });
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    let client = PeerEndpoint::new();
    let (client_tx, mut client_rx) = mpsc::unbounded_channel();
    client
        .remote_registry()
        .watch_remote_resources("test-observer", Arc::new(ChannelObserver { tx: client_tx }))
        .unwrap();

    {
        let client = client.clone();
        let keepalive = keepalive.clone();
        tokio::spawn(async move {
            let _ = client
                .dial(
                    format!("http://{addr}"),
                    "type/FederatedService".to_string(),
                    CONTEXT_TOKEN.to_string(),
                    None,
                    &keepalive,
                )
                .await;
        });
    }

    let mut seen = Vec::new();
    for _ in 0..3 {
        match expect_event(&mut client_rx).await {
            ObservedEvent::Upsert { fqdn, .. } => seen.push(fqdn),
            other => panic!("expected an upsert, got {other:?}"),
        }
    }
    seen.sort();
    assert_eq!(seen, vec!["one.acme.com", "three.acme.com", "two.acme.com"]);
}

#[tokio::test]
async fn stream_drop_purges_the_remote_registry() {
    let addr = reserve_loopback_addr();
    let server = PeerEndpoint::new();
    let client = PeerEndpoint::new();

    let (server_tx, mut server_rx) = mpsc::unbounded_channel();
    server
        .remote_registry()
        .watch_remote_resources("test-observer", Arc::new(ChannelObserver { tx: server_tx }))
        .unwrap();

    let keepalive = KeepaliveConfig::default();
    {
        let server = server.clone();
        let keepalive = keepalive.clone();
        tokio::spawn(async move {
            let _ = server
                .serve(addr, CONTEXT_TOKEN.to_string(), None, &keepalive)
                .await;
        });
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    client
        .local_registry()
        .upsert("svc.acme.com", "type/FederatedService", &service("svc.acme.com"))
        .unwrap();

    let client_handle = {
        let client = client.clone();
        let keepalive = keepalive.clone();
        tokio::spawn(async move {
            let _ = client
                .dial(
                    format!("http://{addr}"),
                    "type/FederatedService".to_string(),
                    CONTEXT_TOKEN.to_string(),
                    None,
                    &keepalive,
                )
                .await;
        })
    };

    let event = expect_event(&mut server_rx).await;
    assert!(matches!(event, ObservedEvent::Upsert { fqdn, .. } if fqdn == "svc.acme.com"));

    client.shutdown();
    client_handle.abort();

    let event = expect_event(&mut server_rx).await;
    assert!(matches!(event, ObservedEvent::Delete { fqdn, .. } if fqdn == "svc.acme.com"));
}
