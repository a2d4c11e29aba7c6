use super::*;
use crate::common::{Server, spawn_udp_server};
use crate::DuoError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;

#[test]
fn test_config_default() {
    let config = UdpConfig::default();
    assert_eq!(config.buffer_size, MAX_DATAGRAM_SIZE);
    assert_eq!(config.write_timeout, Duration::from_secs(5));
    assert_eq!(config.greeting.as_ref(), DEFAULT_GREETING);
    assert!(config.bind_addr.ip().is_loopback());
}

#[tokio::test]
async fn test_bind_reports_actual_port() {
    let server = UdpGreetingServer::bind(UdpConfig::default()).await.unwrap();
    assert_ne!(server.local_addr().port(), 0);
    assert!(!server.shutdown_token().is_cancelled());
}

#[tokio::test]
async fn test_reply_is_greeting() {
    let server = spawn_udp_server().await.unwrap();
    let client = UdpGreetingClient::connect(server.addr).await.unwrap();

    let reply = client.send_string("hi there").await.unwrap();
    assert_eq!(reply, "Hello from server!");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_reply_ignores_payload() {
    let server = spawn_udp_server().await.unwrap();
    let client = UdpGreetingClient::connect(server.addr).await.unwrap();

    let payloads: [&[u8]; 4] = [b"", b"\x00\xff\x10", b"Hello from server!", &[b'x'; 4096]];
    for payload in payloads {
        let reply = client.send(payload).await.unwrap();
        assert_eq!(reply, DEFAULT_GREETING);
    }

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_multiple_senders() {
    let server = spawn_udp_server().await.unwrap();

    let mut handles = Vec::new();
    for i in 0..5 {
        let addr = server.addr;
        handles.push(tokio::spawn(async move {
            let client = UdpGreetingClient::connect(addr).await?;
            client.send(format!("sender {i}").as_bytes()).await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), DEFAULT_GREETING);
    }

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_custom_greeting() {
    let config = UdpConfig::default().with_greeting("pong");
    let server = UdpGreetingServer::bind(config).await.unwrap();
    let addr = server.local_addr();
    let shutdown = server.shutdown_token();
    let handle = tokio::spawn(async move { server.run().await });

    let client = UdpGreetingClient::connect(addr).await.unwrap();
    assert_eq!(client.send_string("ping").await.unwrap(), "pong");

    shutdown.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_shutdown_stops_run() {
    let server = spawn_udp_server().await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(2), server.stop()).await;
    assert!(matches!(result, Ok(Ok(()))));
}

#[tokio::test]
async fn test_bind_occupied_port_fails() {
    let occupied = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = occupied.local_addr().unwrap();

    let result = UdpGreetingServer::bind(UdpConfig::new(addr)).await;
    match result {
        Err(DuoError::Bind { protocol, addr: failed, .. }) => {
            assert_eq!(protocol, "UDP");
            assert_eq!(failed, addr);
        }
        Err(e) => panic!("Expected bind error, got {e}"),
        Ok(_) => panic!("Expected bind error"),
    }
}
