use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::{Parser, Subcommand};
use labelscan_api::ApiConfig;
use labelscan_core::{classify_with_trace, ImageRef, ScanRequest};
use labelscan_dispatch::HybridDispatcher;
use labelscan_observability::{init_tracing, AppMetrics};
use labelscan_provider::OpenAiProvider;

#[derive(Debug, Parser)]
#[command(name = "labelscan")]
#[command(about = "Gluten and lactose check for food-label text")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify label text (argument, --file, or stdin) or a label photo.
    Analyze {
        text: Option<String>,
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        #[arg(long)]
        image: Option<PathBuf>,
        /// Skip the external provider even when a key is configured.
        #[arg(long, env = "LABELSCAN_OFFLINE")]
        offline: bool,
        /// Print the matched rules next to the result (heuristic only).
        #[arg(long, requires = "offline")]
        explain: bool,
    },
    Serve {
        #[arg(long, env = "LABELSCAN_BIND")]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("labelscan_cli");
    let cli = Cli::parse();

    match cli.command {
        Command::Analyze {
            text,
            file,
            image,
            offline,
            explain,
        } => {
            let request = build_request(text, file, image)?;
            if explain {
                let (result, trace) = classify_with_trace(request.fallback_text());
                let output = serde_json::json!({ "result": result, "trace": trace });
                println!("{}", serde_json::to_string_pretty(&output)?);
                return Ok(());
            }

            let provider = if offline {
                None
            } else {
                OpenAiProvider::from_env().context("failed to configure label provider")?
            };
            let dispatcher = HybridDispatcher::new(provider, AppMetrics::shared());
            let resolution = dispatcher.resolve(request).await;
            if let Some(diagnostic) = resolution.diagnostic.as_deref() {
                eprintln!("provider unavailable, used local rules: {diagnostic}");
            }
            println!("{}", serde_json::to_string_pretty(&resolution.result)?);
        }
        Command::Serve { bind } => {
            let mut config = ApiConfig::from_env();
            if let Some(bind) = bind {
                config.bind = bind;
            }
            labelscan_api::serve(config).await?;
        }
    }

    Ok(())
}

fn build_request(
    text: Option<String>,
    file: Option<PathBuf>,
    image: Option<PathBuf>,
) -> Result<ScanRequest> {
    let image = image
        .map(|path| {
            fs::read(&path)
                .map(|bytes| ImageRef::from_base64(STANDARD.encode(bytes)))
                .with_context(|| format!("failed reading image {}", path.display()))
        })
        .transpose()?;

    let text = match (text, file) {
        (Some(text), _) => Some(text),
        (None, Some(path)) => Some(
            fs::read_to_string(&path)
                .with_context(|| format!("failed reading label text {}", path.display()))?,
        ),
        (None, None) if image.is_none() => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed reading label text from stdin")?;
            Some(buffer)
        }
        (None, None) => None,
    };

    if text.as_deref().is_some_and(|value| value.len() > 64 * 1024) {
        bail!("label text is larger than 64 KiB; pass only the ingredient panel");
    }

    Ok(ScanRequest { text, image })
}
