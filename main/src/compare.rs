use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use common::utils::{config::get_config, model_loader::ProviderEnv};
use comparison_pipeline::DocumentComparer;
use ingestion_pipeline::DocumentIngestion;
use tracing::error;

/// Compare two revisions of a PDF document with an LLM.
#[derive(Debug, Parser)]
#[command(name = "compare", version)]
struct Cli {
    /// The reference (original) PDF.
    reference: PathBuf,

    /// The actual (revised) PDF.
    actual: PathBuf,

    /// Print `{"columns": [...], "rows": [...]}` instead of a text table.
    #[arg(long)]
    json: bool,

    /// Staging directory, defaults to `{data_dir}/document_compare`.
    #[arg(long, env = "DOCDIFF_STAGING_DIR")]
    staging_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    docdiff::init_tracing();
    let cli = Cli::parse();

    let config = get_config().context("reading app configuration")?;
    let loader = docdiff::load_models(&config, ProviderEnv::from_process())
        .context("loading model configuration")?;

    let staging_dir = cli.staging_dir.unwrap_or_else(|| config.staging_dir());
    let ingestion = DocumentIngestion::new(&staging_dir)
        .await
        .with_context(|| format!("preparing staging directory {}", staging_dir.display()))?;
    let comparer = DocumentComparer::new(&loader)?;

    let reference = docdiff::upload_from_path(&cli.reference)
        .await
        .with_context(|| format!("reading {}", cli.reference.display()))?;
    let actual = docdiff::upload_from_path(&cli.actual)
        .await
        .with_context(|| format!("reading {}", cli.actual.display()))?;

    let table = docdiff::run_comparison(&ingestion, &comparer, reference, actual)
        .await
        .inspect_err(|err| error!(error = %err, "Comparison failed"))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&table.to_json_rows())?);
    } else {
        print!("{}", table.render_text());
    }

    Ok(())
}
