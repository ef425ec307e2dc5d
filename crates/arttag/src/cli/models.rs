//! The `arttag models` command for managing the CLIP encoders.

use std::path::Path;

use anyhow::Context;
use arttag_core::embedding::VISUAL_MODEL_FILENAME;
use arttag_core::tagging::text_encoder::{TEXT_MODEL_FILENAME, TOKENIZER_FILENAME};
use arttag_core::{ClipTextEncoder, Config, EmbeddingEngine};
use clap::{Args, Subcommand};

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download the CLIP vision encoder, text encoder and tokenizer
    Download {
        /// Re-download files that already exist
        #[arg(long)]
        force: bool,
    },

    /// List installed model files
    List,

    /// Show model directory path
    Path,
}

/// A file fetched from the Hugging Face hub.
struct ModelFile {
    label: &'static str,
    remote_path: &'static str,
    local_name: &'static str,
}

/// ONNX export of OpenAI CLIP ViT-B/32.
const MODEL_REPO: &str = "Xenova/clip-vit-base-patch32";

const MODEL_FILES: &[ModelFile] = &[
    ModelFile {
        label: "Vision encoder",
        remote_path: "onnx/vision_model.onnx",
        local_name: VISUAL_MODEL_FILENAME,
    },
    ModelFile {
        label: "Text encoder",
        remote_path: "onnx/text_model.onnx",
        local_name: TEXT_MODEL_FILENAME,
    },
    ModelFile {
        label: "Tokenizer",
        remote_path: "tokenizer.json",
        local_name: TOKENIZER_FILENAME,
    },
];

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

fn download_url(file: &ModelFile) -> String {
    format!(
        "https://huggingface.co/{}/resolve/main/{}",
        MODEL_REPO, file.remote_path
    )
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs, config: Config) -> anyhow::Result<()> {
    let model_path = config.model_path();

    match args.command {
        ModelsCommand::Download { force } => {
            std::fs::create_dir_all(&model_path)
                .with_context(|| format!("Cannot create {}", model_path.display()))?;
            let client = reqwest::Client::new();

            for file in MODEL_FILES {
                let dest = model_path.join(file.local_name);
                if dest.exists() && !force {
                    tracing::info!("{} already exists at {:?}", file.label, dest);
                    continue;
                }

                let url = download_url(file);
                tracing::info!("Downloading {}...", file.label);
                tracing::info!("  Source: {}", url);
                tracing::info!("  Destination: {:?}", dest);
                download_file(&client, &url, &dest).await?;

                let size = std::fs::metadata(&dest)?.len();
                tracing::info!(
                    "  {} complete ({:.1} MB)",
                    file.label,
                    size as f64 / BYTES_PER_MB
                );
            }

            tracing::info!("All downloads complete.");
        }

        ModelsCommand::List => {
            if !model_path.exists() {
                println!("No models installed.");
                println!("Run `arttag models download` to download required models.");
                return Ok(());
            }

            println!("Installed models ({}):", config.embedding.model);
            println!("  Directory: {}\n", model_path.display());
            for file in MODEL_FILES {
                let local = model_path.join(file.local_name);
                let status = match std::fs::metadata(&local) {
                    Ok(meta) => format!("ready ({:.1} MB)", meta.len() as f64 / BYTES_PER_MB),
                    Err(_) => "not installed".to_string(),
                };
                println!("    - {:20} {:20} {}", file.label, file.local_name, status);
            }

            let ready = EmbeddingEngine::model_exists(&model_path)
                && ClipTextEncoder::model_exists(&model_path);
            println!("\n  Ready to analyze: {}", if ready { "yes" } else { "no" });
        }

        ModelsCommand::Path => {
            println!("{}", model_path.display());
        }
    }

    Ok(())
}

/// Stream a URL to disk.
///
/// Writes to a `.part` file first so an interrupted download never leaves a
/// truncated model behind under the final name.
async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> anyhow::Result<()> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download failed: {e}"))?;

    let total_size = response.content_length();
    let progress = match total_size {
        Some(size) => {
            tracing::info!("  Size: {:.1} MB", size as f64 / BYTES_PER_MB);
            create_progress_bar(size)
        }
        None => indicatif::ProgressBar::new_spinner(),
    };

    let partial = dest.with_extension("part");
    let mut file = tokio::fs::File::create(&partial).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        progress.inc(chunk.len() as u64);
    }
    file.flush().await?;
    drop(file);
    progress.finish_and_clear();

    tokio::fs::rename(&partial, dest).await?;
    Ok(())
}

fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("  [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
        .map(|style| style.progress_chars("##-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}
