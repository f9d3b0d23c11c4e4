//! Example: stream one answer from a running docchat backend.
//!
//! Creates a conversation, sends the message given on the command line, and
//! prints tokens as they arrive followed by the cited sources. Ctrl-C cancels
//! the answer and keeps what was received so far.
//!
//! Run with: `DOCCHAT_URL=http://localhost:8000 cargo run --example stream_chat -p docchat-client -- "What is the notice period?"`
//!
//! Set `RUST_LOG=docchat_client=debug` to see request and state-transition logs.

use std::io::Write;

use docchat_client::{ChatHandler, DocChat};
use docchat_types::{ChatRequest, Citation, MessageAccumulator, MessageStatus};
use tracing_subscriber::EnvFilter;

/// Prints the answer to stdout as it streams.
struct Printer;

impl ChatHandler for Printer {
    fn on_token(&mut self, token: &str) {
        print!("{token}");
        let _ = std::io::stdout().flush();
    }

    fn on_citations(&mut self, citations: &[Citation]) {
        println!("\n\nSources:");
        for citation in citations {
            println!("  [{}] {}", citation.number, citation.location());
        }
    }

    fn on_cancelled(&mut self, message: &MessageAccumulator) {
        println!("\n\n(cancelled after {} characters)", message.content.len());
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let question = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Summarize the uploaded documents.".to_string());
    let client = match std::env::var("DOCCHAT_URL") {
        Ok(url) => DocChat::new(url),
        Err(_) => DocChat::default(),
    };

    let conversation = client.create_conversation(None).await?;
    println!("Conversation {} ({})\n", conversation.id, conversation.title);

    let stream = client.send_message(ChatRequest::new(&conversation.id, question));
    let cancel = stream.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let message = stream.drive(&mut Printer).await;
    match message.status {
        MessageStatus::Errored(error) => {
            eprintln!("\nerror: {error}");
            std::process::exit(1);
        }
        _ => println!(),
    }
    Ok(())
}
