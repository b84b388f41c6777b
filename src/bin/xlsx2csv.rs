//! `xlsx2csv`: the external CLI surface over [`excelstream::Reader`] (§6).
//!
//! Only this binary owns argument parsing, logging setup, and the
//! stderr diagnostic format; the library crate stays free of CLI concerns.

use clap::Parser;
use excelstream::{ExcelError, Reader, ReaderBuilder, SourceSpec};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Stream an XLSX workbook to CSV without loading it fully into memory.
#[derive(Parser, Debug)]
#[command(name = "xlsx2csv", version, about)]
struct Args {
    /// Source URI or path: a local path, `http(s)://...`, or `s3://bucket/key`.
    source: String,

    /// Write CSV here instead of stdout.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Worksheet to stream; defaults to the first sheet in the workbook.
    #[arg(long, value_name = "NAME")]
    sheet_name: Option<String>,

    /// Upper bound, in bytes, for the raw read buffer.
    #[arg(long, value_name = "BYTES", default_value_t = 16_777_216)]
    chunk_size: usize,

    /// Raise log verbosity and print error detail (not just the kind).
    #[arg(long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // clap's own exit code doesn't match the spec's usage-error
            // code (1); print its formatted message and map it ourselves.
            let _ = e.print();
            return ExitCode::from(if e.exit_code() == 0 { 0 } else { 1 });
        }
    };

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&args) {
        Ok(row_count) => {
            log::debug!("wrote {row_count} rows");
            ExitCode::from(0)
        }
        Err(e) => {
            if args.verbose {
                eprintln!("xlsx2csv: {e:#?}");
            } else {
                eprintln!("xlsx2csv: {e}");
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(args: &Args) -> Result<u64, ExcelError> {
    let spec = SourceSpec::detect(&args.source)?;
    let mut builder = ReaderBuilder::new(spec).chunk_size(args.chunk_size);
    if let Some(name) = &args.sheet_name {
        builder = builder.sheet_name(name.clone());
    }
    let mut reader = builder.build();

    match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(ExcelError::Io)?;
            reader.to_csv(BufWriter::new(file))
        }
        None => {
            let stdout = io::stdout();
            let rows = reader.to_csv(BufWriter::new(stdout.lock()))?;
            io::stdout().flush().map_err(ExcelError::SinkIo)?;
            Ok(rows)
        }
    }
}
