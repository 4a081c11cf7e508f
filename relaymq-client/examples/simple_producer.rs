//! Posts a handful of messages to a running broker.
//!
//! Start a broker first: `cargo run -p relaymq -- --port 9090`

use relaymq_client::{BrokerClient, Message};

#[tokio::main]
async fn main() -> relaymq_client::Result<()> {
    tracing_subscriber::fmt::init();

    let mut client = BrokerClient::connect("127.0.0.1", 9090).await?;

    for i in 0..10 {
        client
            .post_message("events", Message::text(format!("event-{}", i)))
            .await?;
        println!("posted event-{}", i);
    }

    Ok(())
}
