//! Sends one message (headers, body and a file) to the echo server and
//! prints what comes back.
//!
//! ```sh
//! cargo run --example send_message
//! ```

use qproto::{Client, Config, ContentEncoding};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder()
        .delimiter(&b"&"[..])
        .use_encoding(true)
        .encoding(ContentEncoding::Base64)
        .build()?;

    let mut client = Client::new("127.0.0.1", 7676u16, config);
    client.connect().await?;

    let mut msg = client.config().new_message();
    msg.add_header("from", "send_message")?;
    msg.set_body(b"Hello World".to_vec());
    msg.add_raw_file("greeting.txt", b"Hello World".to_vec());
    client.write(&mut msg).await?;

    let reply = client.read().await?;
    println!("headers: {:?}", reply.headers());
    println!("body:    {}", String::from_utf8_lossy(reply.body()));
    println!("files:   {:?}", reply.file_sizes());

    client.terminate().await?;
    Ok(())
}
