use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use chatview_core::{ChatBackend, ChatClient, Config};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

mod app;
mod handler;
mod logging;
mod render;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "chatview", version)]
#[command(about = "Terminal chat client for a remote chat endpoint")]
struct Args {
    /// Chat endpoint URL (overrides the config file)
    #[arg(long, env = "CHATVIEW_ENDPOINT")]
    endpoint: Option<String>,

    /// Write logs here instead of the default cache location
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Remember the endpoint in the config file
    #[arg(long)]
    save_endpoint: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the reply
    Send {
        /// Message text
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match &args.command {
        Some(_) => logging::init_stderr(args.debug),
        None => {
            let path = args.log_file.clone().unwrap_or_else(logging::default_log_path);
            logging::init_file(&path, args.debug)?;
        }
    }

    let mut config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "could not read config, using defaults");
        Config::new()
    });

    let endpoint = args
        .endpoint
        .clone()
        .unwrap_or_else(|| config.endpoint().to_string());

    if args.save_endpoint {
        config.endpoint = Some(endpoint.clone());
        config.save()?;
        info!(endpoint = %endpoint, "endpoint saved to config");
    }

    match args.command {
        Some(Commands::Send { message }) => send_once(&endpoint, &message).await,
        None => run_tui(&endpoint, config.placeholder()).await,
    }
}

async fn send_once(endpoint: &str, message: &str) -> Result<()> {
    if message.trim().is_empty() {
        bail!("message is empty");
    }

    let client = ChatClient::new(endpoint);
    match client.send(message).await {
        Ok(exchange) => {
            println!("{}", exchange.bot_response.content);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "chat request failed");
            Err(e.into())
        }
    }
}

async fn run_tui(endpoint: &str, placeholder: &str) -> Result<()> {
    info!(endpoint = %endpoint, "starting chatview");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let backend: Arc<dyn ChatBackend> = Arc::new(ChatClient::new(endpoint));
    let mut app = App::new(backend, events.sender(), endpoint, placeholder);

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}
