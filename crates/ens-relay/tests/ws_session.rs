//! End-to-end relay tests over real WebSocket connections

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use ens_protocol::{
    decode_server, encode_client, AssignTrackPayload, ClientId, ClientMessage, Role, ServerMessage,
};
use ens_relay::server::start_local;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

struct TestClient {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    async fn connect(port: u16) -> Self {
        let url = format!("ws://127.0.0.1:{}/ws", port);
        let (socket, _) = connect_async(&url).await.expect("connect failed");
        Self { socket }
    }

    async fn send(&mut self, message: &ClientMessage) {
        let text = encode_client(message).unwrap();
        self.socket.send(Message::Text(text)).await.unwrap();
    }

    /// Next protocol message, skipping transport-level frames
    async fn recv(&mut self) -> ServerMessage {
        let deadline = tokio::time::sleep(RECV_TIMEOUT);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                frame = self.socket.next() => {
                    match frame.expect("connection closed").expect("read error") {
                        Message::Text(text) => return decode_server(&text).unwrap(),
                        Message::Close(_) => panic!("connection closed by relay"),
                        _ => continue,
                    }
                }
                _ = &mut deadline => panic!("timed out waiting for message"),
            }
        }
    }

    async fn close(mut self) {
        let _ = self.socket.close(None).await;
    }
}

async fn connect_and_greet(port: u16) -> TestClient {
    let mut client = TestClient::connect(port).await;
    match client.recv().await {
        ServerMessage::Role { role: Role::Slave, .. } => {}
        other => panic!("expected slave greeting, got {:?}", other),
    }
    client
}

async fn elect_master(client: &mut TestClient, secret: &str) {
    client
        .send(&ClientMessage::AttemptMaster {
            secret: secret.to_string(),
        })
        .await;
    match client.recv().await {
        ServerMessage::Role { role: Role::Master, .. } => {}
        other => panic!("expected master grant, got {:?}", other),
    }
}

#[tokio::test]
async fn test_greeting_and_election() {
    let relay = start_local("s3cret", 2000).await.unwrap();
    let port = relay.local_addr().port();

    let mut a = connect_and_greet(port).await;

    a.send(&ClientMessage::AttemptMaster {
        secret: "wrong".to_string(),
    })
    .await;
    match a.recv().await {
        ServerMessage::Role { role, message, .. } => {
            assert_eq!(role, Role::Slave);
            assert!(message.contains("Incorrect"));
        }
        other => panic!("unexpected message: {:?}", other),
    }

    a.send(&ClientMessage::AttemptMaster {
        secret: "s3cret".to_string(),
    })
    .await;
    match a.recv().await {
        ServerMessage::Role {
            role,
            existing_clients,
            ..
        } => {
            assert_eq!(role, Role::Master);
            assert_eq!(existing_clients, Some(Vec::new()));
        }
        other => panic!("unexpected message: {:?}", other),
    }

    relay.shutdown();
}

#[tokio::test]
async fn test_master_takeover_demotes_previous() {
    let relay = start_local("s3cret", 2000).await.unwrap();
    let port = relay.local_addr().port();

    let mut a = connect_and_greet(port).await;
    elect_master(&mut a, "s3cret").await;

    let mut b = TestClient::connect(port).await;
    match b.recv().await {
        ServerMessage::Role { role: Role::Slave, .. } => {}
        other => panic!("unexpected message: {:?}", other),
    }
    // B learns a master exists; A learns B joined
    match b.recv().await {
        ServerMessage::MasterStatusChange { master_present, .. } => assert!(master_present),
        other => panic!("unexpected message: {:?}", other),
    }
    match a.recv().await {
        ServerMessage::NewClientConnected { .. } => {}
        other => panic!("unexpected message: {:?}", other),
    }

    elect_master(&mut b, "s3cret").await;
    match a.recv().await {
        ServerMessage::Role { role, message, .. } => {
            assert_eq!(role, Role::Slave);
            assert!(message.contains("taken"));
        }
        other => panic!("unexpected message: {:?}", other),
    }

    relay.shutdown();
}

#[tokio::test]
async fn test_assignment_readiness_and_playback() {
    let relay = start_local("s3cret", 500).await.unwrap();
    let port = relay.local_addr().port();

    let mut a = connect_and_greet(port).await;
    elect_master(&mut a, "s3cret").await;

    let mut b = connect_and_greet(port).await;
    match b.recv().await {
        ServerMessage::MasterStatusChange { master_present, .. } => assert!(master_present),
        other => panic!("unexpected message: {:?}", other),
    }
    let b_id: ClientId = match a.recv().await {
        ServerMessage::NewClientConnected { client_id } => client_id,
        other => panic!("unexpected message: {:?}", other),
    };

    // Assign a track: target loads it, master sees readiness reset
    a.send(&ClientMessage::AssignTrackToClient {
        payload: AssignTrackPayload {
            target_client_id: b_id.clone(),
            track_name: "loop-04.mp3".to_string(),
        },
    })
    .await;
    match a.recv().await {
        ServerMessage::ClientStateUpdate { client_id, is_ready } => {
            assert_eq!(client_id, b_id);
            assert!(!is_ready);
        }
        other => panic!("unexpected message: {:?}", other),
    }
    match b.recv().await {
        ServerMessage::AssignTrack { track_name } => assert_eq!(track_name, "loop-04.mp3"),
        other => panic!("unexpected message: {:?}", other),
    }

    b.send(&ClientMessage::ClientReady).await;
    match a.recv().await {
        ServerMessage::ClientStateUpdate { client_id, is_ready } => {
            assert_eq!(client_id, b_id);
            assert!(is_ready);
        }
        other => panic!("unexpected message: {:?}", other),
    }

    // Play: both sides get the same absolute target time
    a.send(&ClientMessage::RequestPlayback {
        target_client_ids: vec![b_id.clone()],
    })
    .await;
    let time_a = match a.recv().await {
        ServerMessage::PlaybackCommand { server_start_time } => server_start_time,
        other => panic!("unexpected message: {:?}", other),
    };
    let time_b = match b.recv().await {
        ServerMessage::PlaybackCommand { server_start_time } => server_start_time,
        other => panic!("unexpected message: {:?}", other),
    };
    assert_eq!(time_a, time_b);

    // Stop reaches everyone, master included
    a.send(&ClientMessage::RequestStop).await;
    assert_eq!(a.recv().await, ServerMessage::StopCommand);
    assert_eq!(b.recv().await, ServerMessage::StopCommand);

    relay.shutdown();
}

#[tokio::test]
async fn test_time_sync_round_trip() {
    let relay = start_local("s3cret", 2000).await.unwrap();
    let port = relay.local_addr().port();

    let mut a = connect_and_greet(port).await;
    a.send(&ClientMessage::TimeSync { client_time: 42.5 }).await;
    match a.recv().await {
        ServerMessage::TimeSyncResponse {
            client_time,
            server_time,
        } => {
            assert_eq!(client_time, 42.5);
            assert!(server_time > 0.0);
        }
        other => panic!("unexpected message: {:?}", other),
    }

    relay.shutdown();
}

#[tokio::test]
async fn test_master_disconnect_vacates_role() {
    let relay = start_local("s3cret", 2000).await.unwrap();
    let port = relay.local_addr().port();

    let mut a = connect_and_greet(port).await;
    elect_master(&mut a, "s3cret").await;

    let mut b = connect_and_greet(port).await;
    match b.recv().await {
        ServerMessage::MasterStatusChange { master_present, .. } => assert!(master_present),
        other => panic!("unexpected message: {:?}", other),
    }
    match a.recv().await {
        ServerMessage::NewClientConnected { .. } => {}
        other => panic!("unexpected message: {:?}", other),
    }

    a.close().await;
    match b.recv().await {
        ServerMessage::MasterStatusChange {
            master_present,
            message,
        } => {
            assert!(!master_present);
            assert!(message.unwrap().contains("vacant"));
        }
        other => panic!("unexpected message: {:?}", other),
    }

    // The role is claimable again
    elect_master(&mut b, "s3cret").await;

    relay.shutdown();
}

#[tokio::test]
async fn test_non_master_control_messages_are_ignored() {
    let relay = start_local("s3cret", 2000).await.unwrap();
    let port = relay.local_addr().port();

    let mut a = connect_and_greet(port).await;
    elect_master(&mut a, "s3cret").await;

    let mut b = connect_and_greet(port).await;
    match b.recv().await {
        ServerMessage::MasterStatusChange { master_present, .. } => assert!(master_present),
        other => panic!("unexpected message: {:?}", other),
    }
    match a.recv().await {
        ServerMessage::NewClientConnected { .. } => {}
        other => panic!("unexpected message: {:?}", other),
    }

    // A slave's stop request produces nothing for anyone
    b.send(&ClientMessage::RequestStop).await;

    // A real stop from the master still flows, and is the next thing
    // either side sees
    a.send(&ClientMessage::RequestStop).await;
    assert_eq!(a.recv().await, ServerMessage::StopCommand);
    assert_eq!(b.recv().await, ServerMessage::StopCommand);

    relay.shutdown();
}
