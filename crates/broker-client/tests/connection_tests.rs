//! Connection lifecycle tests against loopback listeners

use broker_client::{ClientConfig, ClientError, Credential, KafkaClient};
use tokio::net::TcpListener;

async fn listener() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let addr = listener.local_addr().expect("local addr").to_string();
    (listener, addr)
}

#[tokio::test]
async fn test_connect_and_stop() {
    let (listener, addr) = listener().await;
    let accept = tokio::spawn(async move { listener.accept().await.map(|(s, _)| s) });

    let client = KafkaClient::new(ClientConfig::new(vec![addr])).unwrap();
    assert!(!client.is_connected());

    client.connect().await.unwrap();
    assert!(client.is_connected());

    // Connecting again reuses the transport
    client.connect().await.unwrap();

    let _server_side = accept.await.unwrap().unwrap();

    client.stop().await.unwrap();
    assert!(!client.is_connected());
    assert!(client.is_stopped());
    assert!(matches!(client.connect().await, Err(ClientError::Stopped)));
}

#[tokio::test]
async fn test_connect_falls_through_to_next_broker() {
    // Grab a port and release it so the first seed refuses connections
    let (dead, dead_addr) = listener().await;
    drop(dead);

    let (live, live_addr) = listener().await;
    let accept = tokio::spawn(async move { live.accept().await.map(|(s, _)| s) });

    let mut config = ClientConfig::new(vec![dead_addr, live_addr]);
    config.retries = 0;
    let client = KafkaClient::new(config).unwrap();

    client.connect().await.unwrap();
    assert!(client.is_connected());
    let _server_side = accept.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_no_brokers_available() {
    let (dead, dead_addr) = listener().await;
    drop(dead);

    let mut config = ClientConfig::new(vec![dead_addr]);
    config.retries = 1;
    config.retry_base_backoff_ms = 1;
    config.connect_timeout_ms = 500;
    let client = KafkaClient::new(config).unwrap();

    let result = client.connect().await;
    assert!(matches!(result, Err(ClientError::NoBrokersAvailable(2))));
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_rotated_password_survives_connection() {
    let (listener, addr) = listener().await;
    let accept = tokio::spawn(async move { listener.accept().await.map(|(s, _)| s) });

    let mut config = ClientConfig::new(vec![addr]);
    config.apply_scram_credentials(&Credential::new("alice", "s1"));
    let client = KafkaClient::new(config).unwrap();
    client.connect().await.unwrap();
    let _server_side = accept.await.unwrap().unwrap();

    client.set_scram_password("s2".to_string());
    assert!(client.is_connected());
    assert_eq!(client.config().scram_password.as_deref(), Some("s2"));
}
