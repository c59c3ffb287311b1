//! vibequery - filter JSON-lines records with a typed query

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use log::{debug, info};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use vibequery::query::{QueryOptions, StringMatching};
use vibequery::record::{read_records, FieldCatalog, Record, Schema};
use vibequery::runner::QueryRunner;

/// vibequery - evaluate a query against every record of a JSON-lines file
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Query text, e.g. `age > 27 AND name IN ("ann", "bob")`
    #[arg(short, long)]
    query: String,

    /// JSON schema file mapping field names to bool, int, float, string or unknown.
    /// Without it the fields are the keys seen in the records, and a name no
    /// record carries is read as plain text
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// JSON-lines record file (stdin when omitted)
    #[arg(short, long)]
    records: Option<PathBuf>,

    /// Compare strings case-sensitively
    #[arg(short = 'C', long)]
    case_sensitive: bool,

    /// How equality treats text: plain, wildcard or regex
    #[arg(short, long, default_value = "plain")]
    matching: StringMatching,

    /// Print only the number of matching records
    #[arg(short, long)]
    count: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let records = match &args.records {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open records file {}", path.display()))?;
            load(BufReader::new(file))?
        }
        None => load(io::stdin().lock())?,
    };
    info!("Loaded {} records", records.len());

    let catalog = match &args.schema {
        Some(path) => FieldCatalog::from_schema(&Schema::load(path)?),
        None => {
            debug!("No schema given, using record keys as fields");
            FieldCatalog::from_records(&records)
        }
    };

    let options = QueryOptions::default()
        .case_sensitive(args.case_sensitive)
        .with_matching(args.matching);

    let mut runner = QueryRunner::new(&args.query, options, catalog)?;
    debug!(
        "Running {} over {} fields",
        runner.query(),
        runner.catalog().len()
    );
    let (matched, stats) = runner.filter(&records)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if args.count {
        writeln!(out, "{}", stats.matched)?;
    } else {
        for index in matched {
            writeln!(out, "{}", records[index].to_json())?;
        }
    }
    out.flush().context("Failed to write output")?;

    Ok(())
}

fn load<R: BufRead>(reader: R) -> Result<Vec<Record>> {
    read_records(reader).context("Failed to read records")
}
