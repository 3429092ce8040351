use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cardmark_core::{RenderOptions, Renderer};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Render Markdown to HTML with link cards and embedded posts.
#[derive(Debug, Parser)]
#[command(name = "cardmark", version, about)]
struct Cli {
    /// Markdown file to render; reads stdin when omitted.
    input: Option<PathBuf>,

    /// TOML file with render options (breaks, linkify, embeds, cardProxy, trustedHost).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Keep soft line breaks as newlines instead of `<br>`.
    #[arg(long)]
    no_breaks: bool,

    /// Leave standalone URLs as plain links.
    #[arg(long)]
    no_embeds: bool,

    /// Log more; repeat for trace output. `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut options = match &cli.config {
        Some(path) => load_options(path)?,
        None => RenderOptions::default(),
    };
    if cli.no_breaks {
        options.breaks = false;
    }
    if cli.no_embeds {
        options.embeds = false;
    }
    let renderer = Renderer::new(options).context("invalid render options")?;

    let source = read_source(cli.input.as_deref())?;
    let html = renderer.render(&source);

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(html.as_bytes())
        .context("failed to write output")?;
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(io::stderr)
        .init();
}

fn load_options(path: &Path) -> Result<RenderOptions> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let options = toml::from_str(&content)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    tracing::debug!(path = %path.display(), ?options, "loaded render options");
    Ok(options)
}

fn read_source(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}
