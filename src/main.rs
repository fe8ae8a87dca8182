// Copyright 2026 The Shopclerk Project
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use shopclerk::articles;
use shopclerk::client::HttpTransport;
use shopclerk::config::WidgetConfig;
use shopclerk::render::ConsoleSurface;
use shopclerk::session::{ChatSession, MemoryStore};
use shopclerk::widget::{ChatWidget, QuickAction};

use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "shopclerk", about = "Streaming storefront assistant")]
struct Cli {
    /// Path to the shopclerk.yaml config file
    #[arg(long, env = "SHOPCLERK_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Chat backend endpoint; overrides the config file
    #[arg(long, env = "SHOPCLERK_ENDPOINT")]
    endpoint: Option<String>,

    /// Send a single message, print the reply, and exit
    #[arg(long)]
    message: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match (&cli.config, &cli.endpoint) {
        (Some(path), _) => match WidgetConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("failed to load config: {e}");
                std::process::exit(1);
            }
        },
        (None, Some(endpoint)) => WidgetConfig::for_endpoint(endpoint.clone()),
        (None, None) => {
            tracing::error!("either --config or --endpoint is required");
            std::process::exit(1);
        }
    };
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }

    tracing::info!(endpoint = %config.endpoint, shop_id = %config.shop_id, "shopclerk starting");

    let transport = Arc::new(HttpTransport::new(
        config.endpoint.clone(),
        config.shop_id.clone(),
    ));
    let session = Arc::new(ChatSession::new(Arc::new(MemoryStore::new())));
    let surface = Arc::new(ConsoleSurface::new());
    let widget = ChatWidget::new(
        transport,
        Arc::clone(&session),
        surface,
        Arc::new(config),
    );

    widget.open().await;

    if let Some(message) = cli.message {
        widget.send(&message);
        widget.flush().await;
        return;
    }

    repl(&widget, &session).await;
}

async fn repl(widget: &ChatWidget, session: &ChatSession) {
    println!("Commands: /articles, /article <title>, /search <term>, /track, /auth, /reset, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt(session);
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim().to_string();
        match line.as_str() {
            "" => {}
            "/quit" | "/exit" => break,
            "/reset" => {
                widget.abandon();
                println!("Conversation cleared.");
            }
            "/auth" => {
                widget.trigger_auth();
                widget.flush().await;
            }
            "/track" => widget.quick_action(QuickAction::OrderTracking),
            "/articles" => {
                for article in articles::ARTICLES {
                    println!("- {}", article.title);
                }
            }
            _ if line.starts_with("/article ") => {
                let title = line["/article ".len()..].trim();
                match articles::find(title) {
                    Some(article) => {
                        println!("{} ({}, {})", article.title, article.author, article.updated);
                        println!("{}", article.content);
                    }
                    None => println!("No article titled {title:?}."),
                }
            }
            _ if line.starts_with("/search ") => {
                let term = line["/search ".len()..].trim();
                let hits = articles::search(term);
                if hits.is_empty() {
                    println!("No articles match {term:?}.");
                }
                for article in hits {
                    println!("- {}", article.title);
                }
            }
            _ if session.order_tracking_mode() => {
                if line.eq_ignore_ascii_case("cancel") {
                    widget.cancel_order_tracking();
                    println!("Order tracking cancelled.");
                } else {
                    // Expected input: "<order number> <email>".
                    let mut parts = line.split_whitespace();
                    let order_number = parts.next().unwrap_or("");
                    let email = parts.next().unwrap_or("");
                    widget.send_order_tracking(order_number, email);
                    widget.flush().await;
                }
            }
            _ => {
                widget.send(&line);
                widget.flush().await;
            }
        }
        prompt(session);
    }
}

fn prompt(session: &ChatSession) {
    if session.order_tracking_mode() {
        print!("order+email> ");
    } else {
        print!("> ");
    }
    let _ = std::io::stdout().flush();
}
