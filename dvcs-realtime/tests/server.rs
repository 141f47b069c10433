//! WebSocket server end-to-end tests

use dvcs_realtime::{ChannelHub, OutboundKind, RealtimeServer, RealtimeServerConfig};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tungstenite::Message;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start() -> (SocketAddr, Arc<ChannelHub>) {
    let hub = Arc::new(ChannelHub::new());
    let config = RealtimeServerConfig::default().bind("127.0.0.1:0").unwrap();
    let server = RealtimeServer::bind(config, hub.clone()).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    (addr, hub)
}

async fn join(addr: SocketAddr, repository_id: &str) -> Client {
    let (client, _) = connect_async(format!("ws://{}/?repoId={}", addr, repository_id))
        .await
        .unwrap();
    client
}

async fn wait_for(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

async fn next_frame(client: &mut Client) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("no frame received")
            .expect("stream ended")
            .unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn send(client: &mut Client, frame: Value) {
    client
        .send(Message::text(frame.to_string()))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_collaborative_relay() {
    let (addr, hub) = start().await;
    let mut alice = join(addr, "repo-1").await;
    let mut bob = join(addr, "repo-1").await;
    let mut carol = join(addr, "repo-2").await;
    wait_for(|| hub.channel_size("repo-1") == 2 && hub.channel_size("repo-2") == 1).await;

    send(
        &mut alice,
        json!({"type": "file_change", "payload": {"path": "src/lib.rs", "rev": 4}}),
    )
    .await;
    assert_eq!(
        next_frame(&mut bob).await,
        json!({"type": "file_updated", "payload": {"path": "src/lib.rs", "rev": 4}})
    );

    // Alice's first frame is Bob's comment, not an echo of her own edit
    send(&mut bob, json!({"type": "comment_added", "payload": {"id": 1}})).await;
    let expected = json!({"type": "new_comment", "payload": {"id": 1}});
    assert_eq!(next_frame(&mut alice).await, expected);
    assert_eq!(next_frame(&mut bob).await, expected);

    hub.notify_repository_update("repo-2", OutboundKind::IssueUpdated, json!({"number": 9}));
    assert_eq!(
        next_frame(&mut carol).await,
        json!({"type": "issue_updated", "payload": {"number": 9}})
    );
}

#[tokio::test]
async fn test_invalid_json_keeps_connection_open() {
    let (addr, hub) = start().await;
    let mut client = join(addr, "repo-1").await;
    wait_for(|| hub.channel_size("repo-1") == 1).await;

    client.send(Message::text("{oops")).await.unwrap();
    send(&mut client, json!({"type": "pr_status_change", "payload": {"state": "merged"}})).await;

    assert_eq!(
        next_frame(&mut client).await,
        json!({"type": "pr_updated", "payload": {"state": "merged"}})
    );
}

#[tokio::test]
async fn test_ping_pong() {
    let (addr, hub) = start().await;
    let mut client = join(addr, "repo-1").await;
    wait_for(|| hub.channel_size("repo-1") == 1).await;

    client
        .send(Message::Ping(b"hb".to_vec().into()))
        .await
        .unwrap();
    send(&mut client, json!({"type": "comment_added", "payload": {"id": 2}})).await;

    // Everything up to the relayed comment
    let pongs = tokio::time::timeout(Duration::from_secs(5), async {
        let mut pongs = Vec::new();
        while let Some(Ok(message)) = client.next().await {
            match message {
                Message::Pong(data) => pongs.push(data),
                Message::Text(_) => break,
                _ => {}
            }
        }
        pongs
    })
    .await
    .unwrap();

    assert_eq!(pongs.len(), 1);
    assert_eq!(&pongs[0][..], b"hb");
}

#[tokio::test]
async fn test_missing_repository_is_closed() {
    let (addr, hub) = start().await;
    let (mut client, _) = connect_async(format!("ws://{}/", addr)).await.unwrap();

    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match client.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return true,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await
    .unwrap();

    assert!(closed);
    assert_eq!(hub.connection_count(), 0);
}

#[tokio::test]
async fn test_disconnect_removes_channel() {
    let (addr, hub) = start().await;
    let mut client = join(addr, "repo-1").await;
    wait_for(|| hub.has_channel("repo-1")).await;

    client.close(None).await.unwrap();
    wait_for(|| !hub.has_channel("repo-1")).await;
    assert_eq!(hub.connection_count(), 0);
}
