//! # excelstream
//!
//! A memory-bounded pipeline that converts large XLSX workbooks into
//! row-oriented output without ever materializing the full workbook: a
//! forward-only ZIP decompressor, an XLSX package index (shared strings +
//! worksheet directory), and an incremental worksheet-XML streamer, fed by
//! a byte source that can be a local file, an HTTP URL, or an S3 object.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use excelstream::Reader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut reader = Reader::open("data.xlsx")?;
//! for row in reader.rows()? {
//!     let row = row?;
//!     println!("{:?}", row.cells);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Writing CSV directly:
//!
//! ```rust,no_run
//! use excelstream::Reader;
//! use std::io::stdout;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut reader = Reader::open("s3://my-bucket/reports/q1.xlsx")?;
//! reader.to_csv(stdout())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## What this crate does not do
//!
//! No formatting, formulas, styles, pivot tables, charts, or workbook
//! mutation. Rows are read once, forward, per invocation; there is no
//! random access and no archive repair.

pub mod csv;
pub mod error;
pub mod package;
pub mod reader;
pub mod source;
pub mod types;
pub mod worksheet;
pub mod zip;

pub use error::{ExcelError, Result, Warning, WarningSink};
pub use reader::{Reader, ReaderBuilder, ReaderMetadata, RowIter};
pub use source::{OriginKind, SourceSpec};
pub use types::Row;
