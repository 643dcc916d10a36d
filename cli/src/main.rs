//! `wa-send`: send WhatsApp Cloud API messages from the command line.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use whatsapp_core::{ButtonItem, Dispatcher, ListRow};

const DEFAULT_CONFIG: &str = "whatsapp.toml";

#[derive(Parser, Debug)]
#[command(name = "wa-send", version, about = "Send messages through the WhatsApp Cloud API")]
struct Cli {
    /// Config file with a [whatsapp] table. Defaults to ./whatsapp.toml.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a plain text message
    Text { to: String, body: String },

    /// Upload an OGG file and send it as audio
    Audio { to: String, file: PathBuf },

    /// Upload a JPEG file and send it as an image
    Image { to: String, file: PathBuf },

    /// Send a map pin
    Location {
        to: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },

    /// Send an interactive list with one section
    List {
        to: String,
        #[arg(long)]
        body: String,
        /// Label of the button that opens the list
        #[arg(long)]
        button: String,
        /// Row as `id:title` or `id:title:description`; repeatable
        #[arg(long = "row", value_parser = parse_row, required = true)]
        rows: Vec<ListRow>,
    },

    /// Send reply buttons, a call-to-action link or a location request
    Buttons {
        to: String,
        /// Interactive type: `button`, `cta_url`, `location_request_message` or `text`
        #[arg(long, default_value = "button")]
        kind: String,
        #[arg(long)]
        body: String,
        /// Reply button as `id:title`; repeatable
        #[arg(long = "reply", value_parser = parse_reply)]
        replies: Vec<ButtonItem>,
        /// Link button as `text=url`; the last one wins
        #[arg(long = "link", value_parser = parse_link)]
        links: Vec<ButtonItem>,
    },

    /// Upload a file and print its media ID
    Upload {
        file: PathBuf,
        #[arg(long)]
        mime_type: String,
    },

    /// Resolve a media ID to its metadata and download URL
    MediaUrl { media_id: String },

    /// Resolve and download a media ID into a file
    Download {
        media_id: String,
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn parse_row(raw: &str) -> Result<ListRow, String> {
    let mut parts = raw.splitn(3, ':');
    let id = parts.next().unwrap_or_default();
    let title = parts
        .next()
        .ok_or_else(|| format!("expected `id:title[:description]`, got `{raw}`"))?;
    if id.is_empty() || title.is_empty() {
        return Err(format!("row id and title must be non-empty in `{raw}`"));
    }
    let row = ListRow::new(id, title);
    Ok(match parts.next() {
        Some(description) if !description.is_empty() => row.with_description(description),
        _ => row,
    })
}

fn parse_reply(raw: &str) -> Result<ButtonItem, String> {
    match raw.split_once(':') {
        Some((id, title)) if !id.is_empty() && !title.is_empty() => Ok(ButtonItem::reply(id, title)),
        _ => Err(format!("expected `id:title`, got `{raw}`")),
    }
}

fn parse_link(raw: &str) -> Result<ButtonItem, String> {
    match raw.split_once('=') {
        Some((text, url)) if !text.is_empty() && !url.is_empty() => Ok(ButtonItem::link(text, url)),
        _ => Err(format!("expected `text=url`, got `{raw}`")),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let required = cli.config.is_some();
    let path = cli.config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = config::load(&path, required)?;
    info!(api_url = %config.api_url, "loaded config");
    let dispatcher = Dispatcher::from_config(&config);

    match cli.command {
        Command::Text { to, body } => {
            print_json(&dispatcher.send_text(&to, &body).context("failed to send text")?)
        }
        Command::Audio { to, file } => print_json(
            &dispatcher
                .send_audio(&to, &file)
                .with_context(|| format!("failed to send audio {}", file.display()))?,
        ),
        Command::Image { to, file } => print_json(
            &dispatcher
                .send_image(&to, &file)
                .with_context(|| format!("failed to send image {}", file.display()))?,
        ),
        Command::Location {
            to,
            lat,
            lon,
            name,
            address,
        } => print_json(
            &dispatcher
                .send_location(&to, lat, lon, name.as_deref(), address.as_deref())
                .context("failed to send location")?,
        ),
        Command::List {
            to,
            body,
            button,
            rows,
        } => print_json(
            &dispatcher
                .send_interactive_list(&to, &body, &button, rows)
                .context("failed to send list")?,
        ),
        Command::Buttons {
            to,
            kind,
            body,
            mut replies,
            links,
        } => {
            replies.extend(links);
            print_json(
                &dispatcher
                    .send_interactive_buttons(&to, &kind, &body, &replies)
                    .context("failed to send buttons")?,
            )
        }
        Command::Upload { file, mime_type } => print_json(
            &dispatcher
                .upload_media(&file, &mime_type)
                .with_context(|| format!("failed to upload {}", file.display()))?,
        ),
        Command::MediaUrl { media_id } => print_json(
            &dispatcher
                .resolve_media_url(&media_id)
                .with_context(|| format!("failed to resolve media {media_id}"))?,
        ),
        Command::Download { media_id, output } => {
            let (metadata, bytes) = dispatcher
                .fetch_media(&media_id)
                .with_context(|| format!("failed to download media {media_id}"))?;
            std::fs::write(&output, &bytes)
                .with_context(|| format!("failed to write {}", output.display()))?;
            info!(path = %output.display(), size = bytes.len(), "media saved");
            print_json(&metadata)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,whatsapp_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(Cli::parse())
}
