mod api;
mod responder;
#[cfg(test)]
mod testkit;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{info, warn};

use arbolito_channels::{whatsapp, Readiness, WhatsAppMessenger};
use arbolito_core::{
    config::{self, Config},
    message::{InboundMessage, OutboundMessage},
    recipient::RecipientId,
    traits::{Messenger, Provider},
};
use arbolito_delivery::{ack, dispatcher, resolver};
use arbolito_providers::OpenAiProvider;

#[derive(Parser)]
#[command(
    name = "arbolito",
    version,
    about = "Arbolito — WhatsApp welcome bot for the Enchanted Tree"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server and the auto-reply bot.
    Serve,
    /// Pair with WhatsApp by scanning a QR code, without sending anything.
    Auth,
    /// Send the welcome message to a phone number.
    Send {
        /// Phone number in any format; non-digit characters are stripped.
        phone: String,
        /// Path to a welcome video to attach.
        #[arg(long)]
        video: Option<String>,
    },
    /// Strict delivery check: resolve, send, and require a server ack.
    Probe {
        /// Phone number in any format; non-digit characters are stripped.
        phone: String,
    },
    /// Check configuration and provider availability.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Serve => serve(&cli.config).await,
        Commands::Auth => auth(&cli.config).await,
        Commands::Send { phone, video } => send(&cli.config, &phone, video, false).await,
        Commands::Probe { phone } => send(&cli.config, &phone, None, true).await,
        Commands::Status => status(&cli.config).await,
    }
}

/// Start the WhatsApp client and return it with its inbound stream.
async fn start_messenger(
    cfg: &Config,
) -> anyhow::Result<(Arc<WhatsAppMessenger>, mpsc::Receiver<InboundMessage>)> {
    let messenger = Arc::new(WhatsAppMessenger::new(
        cfg.whatsapp.clone(),
        &cfg.arbolito.data_dir,
    ));
    let rx = messenger.start().await?;
    Ok((messenger, rx))
}

/// Block until the client is authenticated and connected.
async fn wait_ready(messenger: &WhatsAppMessenger, window: Duration) -> anyhow::Result<()> {
    let mut readiness = messenger.readiness();
    let result = match tokio::time::timeout(window, readiness.wait_for(|r| *r != Readiness::Starting)).await {
        Ok(Ok(state)) if *state == Readiness::Ready => Ok(()),
        Ok(Ok(_)) => {
            anyhow::bail!("WhatsApp authentication failed — run `arbolito auth` to pair a device")
        }
        Ok(Err(_)) => anyhow::bail!("WhatsApp connection closed unexpectedly"),
        Err(_) => anyhow::bail!(
            "timed out after {}s waiting for WhatsApp connection",
            window.as_secs()
        ),
    };
    result
}

async fn serve(config_path: &str) -> anyhow::Result<()> {
    let cfg = config::load(config_path)?;

    let provider: Option<Arc<dyn Provider>> =
        OpenAiProvider::from_config(&cfg.openai).map(|p| Arc::new(p) as Arc<dyn Provider>);
    if provider.is_none() {
        warn!("auto-reply disabled (no OpenAI API key configured)");
    }

    let (messenger, inbound_rx) = start_messenger(&cfg).await?;

    let responder = Arc::new(responder::Responder::new(
        messenger.clone() as Arc<dyn Messenger>,
        provider,
    ));
    tokio::spawn(responder.run(inbound_rx));

    let state = api::ApiState {
        messenger: messenger.clone() as Arc<dyn Messenger>,
        welcome: cfg.welcome.clone(),
        ack_window: Duration::from_secs(cfg.whatsapp.ack_timeout_secs),
        started: std::time::Instant::now(),
    };

    println!("🎄 Arbolito — serving on {}:{}", cfg.api.host, cfg.api.port);
    api::serve(state, &cfg.api.host, cfg.api.port).await
}

async fn auth(config_path: &str) -> anyhow::Result<()> {
    let cfg = config::load(config_path)?;
    let (messenger, _inbound_rx) = start_messenger(&cfg).await?;

    let mut qr_rx = messenger.pairing_channel().await;
    let mut readiness = messenger.readiness();

    if *readiness.borrow() == Readiness::Ready {
        println!("Already paired — session is valid.");
        return Ok(());
    }

    println!("Scan the QR code with WhatsApp (Linked Devices):\n");
    loop {
        tokio::select! {
            qr = qr_rx.recv() => {
                match qr {
                    Some(data) => println!("{}", whatsapp::generate_qr_terminal(&data)?),
                    None => anyhow::bail!("QR stream closed before pairing completed"),
                }
            }
            changed = readiness.changed() => {
                changed.map_err(|_| anyhow::anyhow!("WhatsApp connection closed"))?;
                match *readiness.borrow() {
                    Readiness::Ready => {
                        println!("Paired successfully.");
                        return Ok(());
                    }
                    Readiness::AuthFailed => anyhow::bail!("pairing failed"),
                    Readiness::Starting => {}
                }
            }
        }
    }
}

/// Shared by `send` and `probe`. The probe variant requires the recipient
/// to resolve and the server ack to arrive; the plain send treats both as
/// best-effort.
async fn send(
    config_path: &str,
    phone: &str,
    video: Option<String>,
    strict: bool,
) -> anyhow::Result<()> {
    let cfg = config::load(config_path)?;
    let recipient = RecipientId::normalize(phone)?;

    let (messenger, _inbound_rx) = start_messenger(&cfg).await?;
    wait_ready(&messenger, Duration::from_secs(60)).await?;

    let resolution = match resolver::resolve(messenger.as_ref(), &recipient).await {
        Ok(resolution) => resolution,
        Err(e) if !strict => {
            warn!(recipient = %recipient, error = %e, "lookup failed, sending anyway");
            resolver::Resolution::Unresolved
        }
        Err(e) => return Err(e.into()),
    };
    if strict && resolution == resolver::Resolution::Unresolved {
        anyhow::bail!("number {recipient} is not registered on WhatsApp");
    }
    let target = resolution.target(&recipient).to_string();

    let message = if strict {
        OutboundMessage::text(recipient.clone(), "🧪 Mensaje de prueba del Árbol Encantado")
    } else {
        match video.or_else(|| cfg.welcome.video_path.clone()) {
            Some(path) => {
                OutboundMessage::with_media(recipient.clone(), &cfg.welcome.text, path.into())
            }
            None => OutboundMessage::text(recipient.clone(), &cfg.welcome.text),
        }
    };

    let ack_rx = messenger.ack_events();
    let handle = dispatcher::dispatch(messenger.as_ref(), &target, &message).await?;
    println!("Message sent to {target} (id {handle})");

    let window = Duration::from_secs(cfg.whatsapp.ack_timeout_secs);
    match ack::await_server_ack(ack_rx, &handle, window).await {
        ack::AckOutcome::Satisfied(level) => {
            info!(handle = %handle, ?level, "delivery confirmed");
            println!("Delivery confirmed ({level:?}).");
        }
        ack::AckOutcome::TimedOut if strict => {
            anyhow::bail!("no delivery confirmation within {}s", window.as_secs());
        }
        ack::AckOutcome::TimedOut => {
            warn!(handle = %handle, window_secs = window.as_secs(), "no delivery confirmation");
        }
    }

    messenger.stop().await?;
    Ok(())
}

async fn status(config_path: &str) -> anyhow::Result<()> {
    let cfg = config::load(config_path)?;
    println!("🎄 Arbolito — Status Check\n");
    println!("Config: {config_path}");
    println!("Data dir: {}", cfg.arbolito.data_dir);
    println!("API: {}:{}", cfg.api.host, cfg.api.port);
    println!();

    let session = format!("{}/whatsapp.db", config::shellexpand(&cfg.arbolito.data_dir));
    println!(
        "  whatsapp session: {}",
        if std::path::Path::new(&session).exists() {
            "present"
        } else {
            "not paired"
        }
    );

    match OpenAiProvider::from_config(&cfg.openai) {
        Some(provider) => {
            let available = provider.is_available().await;
            println!(
                "  openai ({}): {}",
                cfg.openai.model,
                if available { "available" } else { "unreachable" }
            );
        }
        None => println!("  openai: no API key configured"),
    }

    Ok(())
}
