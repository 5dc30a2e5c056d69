use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

mod output;

use output::ColorMode;

use abstractor_core::config_file;
use abstractor_core::llm::HttpCompletion;
use abstractor_core::{Pipeline, PipelineConfig, TextExtractor, locate_abstract, normalize};
use abstractor_pdf_mupdf::MupdfExtractor;

const DEFAULT_API_URL: &str = "http://localhost:8000/v1";
const DEFAULT_MODEL: &str = "microsoft/phi-2";

/// Paper Abstract Summarizer - locate and summarize the abstract of an academic PDF
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize the abstract of a PDF
    Summarize {
        /// Path to the PDF file
        pdf_path: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Base URL of the OpenAI-compatible completion API
        #[arg(long)]
        api_url: Option<String>,

        /// API key for the completion API
        #[arg(long)]
        api_key: Option<String>,

        /// Model name passed to the completion API
        #[arg(long)]
        model: Option<String>,

        /// Seconds to wait for the completion call
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Token budget for the generated summary
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Path to write the summary to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the located segment alongside the summary
        #[arg(long)]
        show_segment: bool,
    },

    /// Extract text and print the located abstract segment without summarizing
    Locate {
        /// Path to the PDF file
        pdf_path: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Summarize {
            pdf_path,
            no_color,
            api_url,
            api_key,
            model,
            timeout_secs,
            max_tokens,
            output,
            show_segment,
        } => {
            summarize(
                pdf_path,
                no_color,
                api_url,
                api_key,
                model,
                timeout_secs,
                max_tokens,
                output,
                show_segment,
            )
            .await
        }
        Command::Locate { pdf_path, no_color } => locate(pdf_path, no_color),
    }
}

#[allow(clippy::too_many_arguments)]
async fn summarize(
    pdf_path: PathBuf,
    no_color: bool,
    api_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_tokens: Option<u32>,
    output: Option<PathBuf>,
    show_segment: bool,
) -> anyhow::Result<()> {
    let file = config_file::load_config();
    let model_file = file.model.clone().unwrap_or_default();

    // Resolve configuration: CLI flags > env vars > config file > defaults
    let api_url = api_url
        .or_else(|| std::env::var("ABSTRACTOR_API_URL").ok())
        .or(model_file.api_url)
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let api_key = api_key
        .or_else(|| std::env::var("ABSTRACTOR_API_KEY").ok())
        .or(model_file.api_key);
    let model = model
        .or_else(|| std::env::var("ABSTRACTOR_MODEL").ok())
        .or(model_file.model)
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let mut config = PipelineConfig::default();
    file.apply(&mut config)
        .map_err(|e| anyhow::anyhow!("invalid marker pattern in config file: {e}"))?;
    if let Some(secs) = timeout_secs {
        config.summarize_timeout = Duration::from_secs(secs);
    }
    if let Some(tokens) = max_tokens {
        config.max_tokens = tokens;
    }

    let pdf_bytes = std::fs::read(&pdf_path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", pdf_path.display()))?;
    let document_id = document_id(&pdf_path);

    let extractor = MupdfExtractor::default();
    let completion = HttpCompletion::new(api_url, model, api_key);
    let locator = config.locator.clone();
    let pipeline = Pipeline::new(&extractor, &completion, config);

    // Ctrl-C cancels the in-flight run
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            cancel.cancel();
        });
    }

    // Progress is a terminal concern, independent of color
    let spinner = std::io::stderr().is_terminal().then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::default_spinner());
        bar.set_message(format!("Summarizing {}...", document_id));
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    });

    let result = pipeline.run(&document_id, &pdf_bytes, &cancel).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let color = ColorMode(!no_color);
    let mut stdout = std::io::stdout();

    match result {
        Ok(summary) => {
            output::print_summary(&mut stdout, &summary, color)?;
            if show_segment {
                // Re-derive the segment for display; location is cheap and pure
                if let Ok(raw_text) = extractor.extract(&pdf_bytes) {
                    let text = normalize(&raw_text);
                    let segment = locate_abstract(&text, &locator);
                    writeln!(stdout)?;
                    output::print_segment(
                        &mut stdout,
                        &summary.document_id,
                        segment.text(&text),
                        segment.source,
                        color,
                    )?;
                }
            }
            if let Some(path) = output {
                std::fs::write(&path, &summary.summary)
                    .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;
                writeln!(stdout, "\nSummary saved to: {}", path.display())?;
            }
            Ok(())
        }
        Err(failure) => {
            output::print_failure(&mut std::io::stderr(), &failure, color)?;
            std::process::exit(1);
        }
    }
}

fn locate(pdf_path: PathBuf, no_color: bool) -> anyhow::Result<()> {
    let pdf_bytes = std::fs::read(&pdf_path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", pdf_path.display()))?;
    let document_id = document_id(&pdf_path);

    let extractor = MupdfExtractor::default();
    let raw_text = extractor
        .extract(&pdf_bytes)
        .map_err(|e| anyhow::anyhow!("extraction failed for {}: {e}", pdf_path.display()))?;

    let mut config = PipelineConfig::default();
    config_file::load_config()
        .apply(&mut config)
        .map_err(|e| anyhow::anyhow!("invalid marker pattern in config file: {e}"))?;

    let text = normalize(&raw_text);
    let segment = locate_abstract(&text, &config.locator);

    let color = ColorMode(!no_color);
    output::print_segment(
        &mut std::io::stdout(),
        &document_id,
        segment.text(&text),
        segment.source,
        color,
    )?;
    Ok(())
}

fn document_id(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string()
}
