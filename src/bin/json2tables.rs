//! json2tables: Decompose a folder of JSON documents into linked tables
//!
//! Usage:
//!   # Melt every *.json in ./Data, write <context>.csv next to the input
//!   json2tables --folder Data
//!
//!   # Link child rows on custom identifier columns
//!   json2tables -f Data -i customer_id order_id
//!
//!   # Process NDJSON (*.jsonl / *.ndjson), write JSON Lines elsewhere
//!   json2tables -f events --ndjson --format jsonl --output-dir ./tables

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use json2tables::melt::{
    BatchMelter, CsvTableWriter, ErrorPolicy, JsonlTableWriter, MeltConfig, MeltOutput,
};
use json2tables::source;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Jsonl,
}

#[derive(Parser, Debug)]
#[command(name = "json2tables")]
#[command(about = "Decompose nested JSON documents into linked flat tables", long_about = None)]
struct Args {
    /// Folder to parse
    #[arg(long, short = 'f', value_name = "DIR")]
    folder: PathBuf,

    /// Identifier columns used to link child rows, highest priority first
    /// (default: heron_id oppID)
    #[arg(long, short = 'i', num_args = 1..)]
    id_columns: Option<Vec<String>>,

    /// Name of the top-level table (default: json)
    #[arg(long)]
    root: Option<String>,

    /// Separator for flattened column names and foreign keys (default: ".")
    #[arg(long)]
    separator: Option<String>,

    /// Maximum object depth merged into dotted column names
    #[arg(long)]
    max_depth: Option<usize>,

    /// Fail a document whose child rows cannot be linked to a parent
    #[arg(long)]
    require_links: bool,

    /// Stop at the first bad document instead of skipping it
    #[arg(long)]
    fail_fast: bool,

    /// Read *.jsonl / *.ndjson files, one document per line
    #[arg(long)]
    ndjson: bool,

    /// Where to write the tables (default: the input folder)
    #[arg(long, short = 'o', value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Write a leading row-number column (CSV only)
    #[arg(long)]
    index: bool,

    /// Log debug output (RUST_LOG overrides)
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Args {
    fn melt_config(&self) -> MeltConfig {
        let mut config = MeltConfig::default();
        if let Some(columns) = &self.id_columns {
            config = config.with_id_columns(columns.iter().cloned());
        }
        if let Some(root) = &self.root {
            config = config.with_root_context(root.clone());
        }
        if let Some(sep) = &self.separator {
            config = config.with_separator(sep.clone());
        }
        let policy = if self.fail_fast {
            ErrorPolicy::Abort
        } else {
            ErrorPolicy::Skip
        };

        config
            .with_max_depth(self.max_depth)
            .with_require_links(self.require_links)
            .with_error_policy(policy)
    }

    /// Where tables go; the input folder unless told otherwise
    ///
    /// JSON Lines output from NDJSON input would land among the inputs and
    /// be read back on the next run, so that pairing needs an explicit dir.
    fn output_dir(&self) -> Result<PathBuf> {
        match &self.output_dir {
            Some(dir) => Ok(dir.clone()),
            None if self.ndjson && self.format == Format::Jsonl => bail!(
                "--ndjson with --format jsonl needs --output-dir: tables written to {} would be read back as input",
                self.folder.display()
            ),
            None => Ok(self.folder.clone()),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let melter = BatchMelter::new(args.melt_config())?;
    let output_dir = args.output_dir()?;

    let (output, inputs) = melt_folder(&melter, &args)?;
    if output.report.processed == 0 && output.report.skipped_count() == 0 {
        warn!("No JSON documents found in {}", args.folder.display());
    }

    match args.format {
        Format::Csv => {
            CsvTableWriter::new(&output_dir)?
                .with_index(args.index)
                .protect(&inputs)
                .write_registry(&output.tables)?;
        }
        Format::Jsonl => {
            JsonlTableWriter::new(&output_dir)?
                .protect(&inputs)
                .write_registry(&output.tables)?;
        }
    }

    for summary in output.tables.summary() {
        println!("{}", summary);
    }
    for skipped in &output.report.skipped {
        eprintln!("⚠ Skipped {}: {}", skipped.source, skipped.reason);
    }

    Ok(())
}

/// Melt the folder; also returns the input files so they are never overwritten
fn melt_folder(melter: &BatchMelter, args: &Args) -> Result<(MeltOutput, Vec<PathBuf>)> {
    let output = if args.ndjson {
        let files = source::ndjson_files_in(&args.folder)?;
        (melter.run(source::read_ndjson(&files))?, files)
    } else {
        let files = source::json_files_in(&args.folder)?;
        (melter.run(source::read_documents(&files))?, files)
    };
    Ok(output)
}
