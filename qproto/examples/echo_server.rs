//! A minimal echo server: accepts connections, reads frames, writes them
//! back. Pair it with the `send_message` example.
//!
//! ```sh
//! cargo run --example echo_server
//! ```

use std::sync::Arc;

use qproto::{Config, ContentEncoding, Server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder()
        .delimiter(&b"&"[..])
        .use_encoding(true)
        .encoding(ContentEncoding::Base64)
        .build()?;

    let mut server = Server::new("127.0.0.1", 7676u16, config);
    server.listen().await?;
    println!("echoing on {}", server.addr()?);

    let server = Arc::new(server);
    loop {
        let peer = match server.accept().await {
            Ok(peer) => peer,
            Err(err) => {
                eprintln!("accept failed: {err}");
                continue;
            }
        };

        // one task per connection; an error there ends only that connection
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            loop {
                let mut msg = match server.read(&peer).await {
                    Ok(msg) => msg,
                    Err(_) => break,
                };
                if server.write(&peer, &mut msg).await.is_err() {
                    break;
                }
            }
            server.remove_client(peer.addr()).await;
        });
    }
}
