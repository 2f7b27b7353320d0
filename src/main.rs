//! AP.Signal - content metrics loader
//!
//! Loads the content metrics workbook and prints a summary of the standardized table.

use anyhow::{Context, Result};
use ap_signal::{ContentDataset, DataConfig, TableSummary};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ap-signal")]
#[command(about = "Load and summarize the content performance workbook")]
struct Args {
    /// JSON config file (data_dir, filenames, require_img_type)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the source workbooks (overrides the config file)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Fail when no classification column can be found
    #[arg(long)]
    require_img_type: bool,

    /// Summarize the reference table (with log_eng) instead of the base table
    #[arg(long)]
    reference: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DataConfig::from_json_file(path)?,
        None => DataConfig::default(),
    };
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    config.require_img_type |= args.require_img_type;
    info!(data_dir = %config.data_dir.display(), "using data directory");

    let mut dataset = ContentDataset::with_config(config);
    let source = dataset.resolve_source_path()?;
    let table = if args.reference {
        dataset.load_reference_table()
    } else {
        dataset.load_base_table()
    }
    .with_context(|| format!("loading {}", source.display()))?;

    let summary = TableSummary::from_table(source, &table)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
    }

    Ok(())
}
