//! The `arttag analyze` command: tag local image files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use arttag_core::{ArtTagger, Config, ImageAnalysis, OutputFormat, OutputWriter};
use clap::{Args, ValueEnum};

/// Arguments for the `analyze` command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Image files to analyze
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (defaults to `output.format` from the config)
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Stop at the first image that fails instead of skipping it
    #[arg(long)]
    pub fail_fast: bool,
}

/// Output format selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// A single JSON document (an array when several images are given)
    Json,
    /// One JSON object per line
    Jsonl,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Jsonl => OutputFormat::JsonLines,
        }
    }
}

/// Execute the analyze command.
pub async fn execute(args: AnalyzeArgs, config: Config) -> anyhow::Result<()> {
    let format = resolve_format(args.format, &config)?;
    let pretty = args.pretty || config.output.pretty;

    let tagger = ArtTagger::load(&config).context("Failed to initialize the tagger")?;
    tracing::info!(
        "Taxonomy ready: {} categories ({})",
        tagger.store().len(),
        tagger.store().category_names().join(", ")
    );

    let start = Instant::now();
    let progress = (args.inputs.len() > 1).then(|| create_progress_bar(args.inputs.len() as u64));

    let mut results: Vec<ImageAnalysis> = Vec::with_capacity(args.inputs.len());
    let mut failed = 0usize;
    for path in &args.inputs {
        if let Some(pb) = &progress {
            pb.set_message(path.display().to_string());
        }
        match tagger.analyze_file(path).await {
            Ok(analysis) => results.push(analysis),
            Err(e) if args.fail_fast => {
                return Err(e).with_context(|| format!("Failed to analyze {}", path.display()));
            }
            Err(e) => {
                tracing::error!("Failed to analyze {:?}: {}", path, e);
                failed += 1;
            }
        }
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Cannot create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    let mut writer = OutputWriter::new(sink, format, pretty);

    // A single JSON result is written bare, matching the HTTP response shape.
    if results.len() == 1 && format == OutputFormat::Json {
        writer.write(&results[0])?;
    } else {
        writer.write_all(&results)?;
    }
    writer.flush()?;

    tracing::info!(
        "Analyzed {} image(s) in {:.2?} ({} failed)",
        writer.items_written(),
        start.elapsed(),
        failed
    );

    if results.is_empty() {
        anyhow::bail!("No images could be analyzed");
    }
    Ok(())
}

/// CLI flag wins over the config file.
fn resolve_format(flag: Option<FormatArg>, config: &Config) -> anyhow::Result<OutputFormat> {
    match flag {
        Some(format) => Ok(format.into()),
        None => OutputFormat::parse(&config.output.format).ok_or_else(|| {
            anyhow::anyhow!("Unknown output format in config: {}", config.output.format)
        }),
    }
}

/// Progress bar for multi-image runs, drawn on stderr.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("##-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_flag_overrides_config() {
        let mut config = Config::default();
        config.output.format = "json".to_string();
        let format = resolve_format(Some(FormatArg::Jsonl), &config).unwrap();
        assert_eq!(format, OutputFormat::JsonLines);
    }

    #[test]
    fn format_falls_back_to_config() {
        let mut config = Config::default();
        config.output.format = "jsonl".to_string();
        assert_eq!(
            resolve_format(None, &config).unwrap(),
            OutputFormat::JsonLines
        );
    }

    #[test]
    fn unknown_config_format_is_an_error() {
        let mut config = Config::default();
        config.output.format = "xml".to_string();
        assert!(resolve_format(None, &config).is_err());
    }
}
