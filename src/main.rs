use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use oai_corpus_harvester::harvest::{harvest, HarvestConfig};
use oai_corpus_harvester::predictions::export_predictions;
use oai_corpus_harvester::{
    HttpTransport, ListRecordsRequest, DEFAULT_BASE_URL, DEFAULT_METADATA_PREFIX,
    DEFAULT_REQUEST_TIMEOUT,
};

/// Harvest an OAI-PMH repository into a JSONL corpus of (text, keywords) pairs.
#[derive(Parser, Debug)]
#[command(name = "oai-harvest", version, about, args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output JSONL file (truncated at start)
    #[arg(long, default_value = "econstor_finance_en.jsonl")]
    out: PathBuf,

    /// Stop after this many accepted documents
    #[arg(long, default_value_t = 8000)]
    max_records: usize,

    /// Minimum length of title + abstract, in characters
    #[arg(long, default_value_t = 150)]
    min_text_chars: usize,

    /// Minimum number of surviving keywords per document
    #[arg(long = "min-kws", default_value_t = 1)]
    min_kws: usize,

    /// Only keep keywords made of several words
    #[arg(long)]
    multiword_only: bool,

    /// Do not require keywords to appear in the text
    #[arg(long)]
    no_require_kw_in_text: bool,

    /// Delay between requests, in seconds
    #[arg(long, default_value_t = 0.4)]
    sleep: f64,

    /// OAI-PMH endpoint
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Metadata format to request
    #[arg(long, default_value = DEFAULT_METADATA_PREFIX)]
    metadata_prefix: String,

    /// Only records modified on or after this date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,

    /// Only records modified on or before this date (YYYY-MM-DD)
    #[arg(long)]
    until: Option<String>,

    /// Restrict the harvest to one set
    #[arg(long = "set")]
    set_spec: Option<String>,

    /// HTTP request timeout, in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    timeout: u64,

    /// Also write the final report as JSON to this file
    #[arg(long)]
    stats_out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export per-document candidate scores as top-k prediction JSONL
    ExportPredictions {
        /// Directory holding `<doc>_candidate_cross_attn_value.csv` files
        #[arg(long)]
        cross_dir: PathBuf,

        /// Output JSONL file
        #[arg(long, default_value = "predictions_top15.jsonl")]
        out: PathBuf,

        /// Keywords kept per document
        #[arg(long, default_value_t = 15)]
        top_k: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Some(Commands::ExportPredictions {
        cross_dir,
        out,
        top_k,
    }) = &cli.command
    {
        let written = export_predictions(cross_dir, out, *top_k)
            .context("prediction export failed")?;
        println!("Wrote {} predictions to {}", written, out.display());
        return Ok(());
    }

    let delay = Duration::try_from_secs_f64(cli.sleep)
        .with_context(|| format!("invalid --sleep value: {}", cli.sleep))?;
    let request = ListRecordsRequest::default()
        .with_metadata_prefix(cli.metadata_prefix)
        .with_from(cli.from)
        .with_until(cli.until)
        .with_set(cli.set_spec)
        .with_delay(delay);
    let config = HarvestConfig::default()
        .with_max_records(cli.max_records)
        .with_min_text_chars(cli.min_text_chars)
        .with_min_kws_present(cli.min_kws)
        .with_multiword_only(cli.multiword_only)
        .with_require_kw_in_text(!cli.no_require_kw_in_text);

    let transport = HttpTransport::new(&cli.base_url, Duration::from_secs(cli.timeout))?;
    let report = harvest(transport, request, &cli.out, config)
        .await
        .context("harvest failed")?;

    println!("\nRejection summary:");
    for (reason, count) in report.rejected.iter() {
        println!("  - {}: {}", reason, count);
    }
    println!("\nSaved {} documents to {}", report.kept, cli.out.display());

    if let Some(path) = cli.stats_out {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write stats to {}", path.display()))?;
    }

    Ok(())
}
