//! Consumes messages from a running broker, waiting when the topic is
//! empty.
//!
//! Start a broker first: `cargo run -p relaymq -- --port 9090`

use relaymq_client::BrokerClient;

#[tokio::main]
async fn main() -> relaymq_client::Result<()> {
    tracing_subscriber::fmt::init();

    let mut client = BrokerClient::connect("127.0.0.1", 9090).await?;

    loop {
        let message = client.get_message("events").await?;
        println!(
            "received {:?}: {}",
            message.kind,
            String::from_utf8_lossy(&message.data)
        );
    }
}
