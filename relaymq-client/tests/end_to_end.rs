//! End-to-end tests: the real client against a real broker.

use relaymq::{BrokerConfig, BrokerServer};
use relaymq_client::{BrokerClient, Message};
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

async fn start_broker() -> SocketAddr {
    let config = BrokerConfig {
        endpoint_port: 0,
        ..Default::default()
    };
    let server = BrokerServer::bind(config).await.expect("bind broker");
    let addr = server.local_addr();
    tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    addr
}

async fn connect(addr: SocketAddr) -> BrokerClient {
    BrokerClient::connect(&addr.ip().to_string(), addr.port())
        .await
        .expect("connect client")
}

#[tokio::test]
async fn test_single_client_round_trip() {
    let addr = start_broker().await;
    let mut client = connect(addr).await;

    client
        .post_message("t1", Message::text("111"))
        .await
        .unwrap();
    client
        .post_message("t2", Message::binary("2222"))
        .await
        .unwrap();
    client
        .post_message("t1", Message::text("33333"))
        .await
        .unwrap();

    assert_eq!(
        client.try_get_message("t1").await.unwrap(),
        Some(Message::text("111"))
    );
    assert_eq!(
        client.try_get_message("t1").await.unwrap(),
        Some(Message::text("33333"))
    );
    assert_eq!(
        client.try_get_message("t2").await.unwrap(),
        Some(Message::binary("2222"))
    );
    assert_eq!(client.try_get_message("t1").await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_blocking_get_matches_a_later_post() {
    let addr = start_broker().await;

    let consumer = tokio::spawn(async move {
        let mut client = connect(addr).await;
        client.get_message("tx").await.unwrap()
    });

    // Let the consumer park before the post arrives.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut producer = connect(addr).await;
    producer
        .post_message("tx", Message::text("abc"))
        .await
        .unwrap();

    let received = consumer.await.unwrap();
    assert_eq!(received, Message::text("abc"));

    // The hand-off bypassed the queue; nothing remains on the topic.
    assert_eq!(producer.try_get_message("tx").await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fifo_under_contention() {
    const MESSAGES: usize = 200;
    const CONSUMERS: usize = 4;

    let addr = start_broker().await;

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            tokio::spawn(async move {
                let mut client = connect(addr).await;
                let mut received = Vec::new();
                loop {
                    let message = client.get_message("tx").await.unwrap();
                    if message.data.as_ref() == b"stop" {
                        return received;
                    }
                    let index: usize = String::from_utf8_lossy(&message.data)
                        .parse()
                        .expect("numeric payload");
                    received.push(index);
                }
            })
        })
        .collect();

    let mut producer = connect(addr).await;
    for i in 0..MESSAGES {
        producer
            .post_message("tx", Message::text(format!("{}", i)))
            .await
            .unwrap();
    }
    for _ in 0..CONSUMERS {
        producer
            .post_message("tx", Message::text("stop"))
            .await
            .unwrap();
    }

    let mut all = BTreeSet::new();
    for consumer in consumers {
        let received = consumer.await.unwrap();
        // Each consumer saw its own receipts in increasing order.
        for window in received.windows(2) {
            assert!(window[0] < window[1]);
        }
        for index in received {
            // No duplicates across consumers.
            assert!(all.insert(index));
        }
    }
    // Every message was delivered to exactly one consumer.
    assert_eq!(all, (0..MESSAGES).collect::<BTreeSet<_>>());
}

#[tokio::test]
async fn test_two_clients_share_a_topic() {
    let addr = start_broker().await;

    let mut producer = connect(addr).await;
    let mut consumer = connect(addr).await;

    producer
        .post_message("shared", Message::text("from-producer"))
        .await
        .unwrap();
    assert_eq!(
        consumer.try_get_message("shared").await.unwrap(),
        Some(Message::text("from-producer"))
    );
    assert_eq!(consumer.try_get_message("shared").await.unwrap(), None);
}

#[tokio::test]
async fn test_acked_messages_do_not_reappear() {
    let addr = start_broker().await;
    let mut client = connect(addr).await;

    for i in 0..50 {
        client
            .post_message("t", Message::text(format!("m{}", i)))
            .await
            .unwrap();
    }
    for i in 0..50 {
        assert_eq!(
            client.try_get_message("t").await.unwrap(),
            Some(Message::text(format!("m{}", i)))
        );
    }
    assert_eq!(client.try_get_message("t").await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_parked_consumers_are_served_fifo_without_loss() {
    const CONSUMERS: usize = 8;

    let addr = start_broker().await;

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            tokio::spawn(async move {
                let mut client = connect(addr).await;
                client.get_message("fanin").await.unwrap()
            })
        })
        .collect();

    // Give the consumers time to park.
    tokio::time::sleep(Duration::from_millis(150)).await;

    let mut producer = connect(addr).await;
    for i in 0..CONSUMERS {
        producer
            .post_message("fanin", Message::text(format!("m{}", i)))
            .await
            .unwrap();
    }

    let mut received = Vec::new();
    for consumer in consumers {
        received.push(consumer.await.unwrap());
    }
    let mut payloads: Vec<_> = received
        .iter()
        .map(|m| String::from_utf8_lossy(&m.data).to_string())
        .collect();
    payloads.sort();
    let mut expected: Vec<_> = (0..CONSUMERS).map(|i| format!("m{}", i)).collect();
    expected.sort();
    assert_eq!(payloads, expected);

    // All handed off; the queue holds nothing.
    assert_eq!(producer.try_get_message("fanin").await.unwrap(), None);
}

#[tokio::test]
async fn test_client_config_connects(){
    let addr = start_broker().await;
    let config = relaymq_client::ClientConfig {
        server_address: addr.ip().to_string(),
        server_port: addr.port(),
    };
    let mut client = BrokerClient::connect_with(&config).await.unwrap();
    client
        .post_message("cfg", Message::text("ok"))
        .await
        .unwrap();
    assert_eq!(
        client.try_get_message("cfg").await.unwrap(),
        Some(Message::text("ok"))
    );
}

/// An Arc keeps the server alive so it can be shut down mid-test without
/// dropping the listener early.
#[tokio::test]
async fn test_shutdown_is_graceful() {
    let config = BrokerConfig {
        endpoint_port: 0,
        ..Default::default()
    };
    let server = Arc::new(BrokerServer::bind(config).await.expect("bind broker"));
    let addr = server.local_addr();
    let runner = Arc::clone(&server);
    let handle = tokio::spawn(async move { runner.run().await });

    let mut client = connect(addr).await;
    client
        .post_message("t", Message::text("before-shutdown"))
        .await
        .unwrap();

    server.shutdown();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .expect("server task panicked")
        .expect("server run failed");
}
