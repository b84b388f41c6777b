//! Error types for the excelstream library

use thiserror::Error;

/// Result type alias for excelstream operations
pub type Result<T> = std::result::Result<T, ExcelError>;

/// Main error type for all workbook-streaming operations.
///
/// Variants line up with the error kinds a caller needs to branch on
/// (source, archive, package, XML/data, sink) rather than with internal
/// module boundaries.
#[derive(Error, Debug)]
pub enum ExcelError {
    // --- source errors ---
    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected HTTP status {status} fetching {url}")]
    HttpStatus { status: u16, url: String },

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("too many redirects (> {0})")]
    TooManyRedirects(usize),

    // --- archive errors ---
    #[error("unexpected end of archive while reading '{0}'")]
    UnexpectedEof(String),

    #[error("CRC-32 mismatch for archive member '{name}': expected {expected:08x}, got {actual:08x}")]
    CrcMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    #[error("unsupported ZIP compression method {0} for '{1}'")]
    UnsupportedMethod(u16, String),

    #[error("archive member '{0}' is encrypted")]
    EncryptedEntry(String),

    #[error("split (multi-disk) archives are not supported")]
    SplitArchive,

    // --- package errors ---
    #[error("workbook part 'xl/workbook.xml' is missing from the package")]
    MissingWorkbookPart,

    #[error("relationships part 'xl/_rels/workbook.xml.rels' is missing from the package")]
    MissingRelationshipsPart,

    #[error("sheet '{sheet}' not found. Available sheets: {available}")]
    SheetNotFound { sheet: String, available: String },

    // --- XML / data errors ---
    #[error("malformed XML in '{part}': {detail}")]
    MalformedXml { part: String, detail: String },

    #[error("shared string index {0} out of range")]
    SharedStringIndex(usize),

    #[error("invalid cell address: {0}")]
    BadCellAddress(String),

    // --- sink errors ---
    #[error("failed writing CSV output: {0}")]
    SinkIo(std::io::Error),

    // --- generic I/O passthrough (local file source, temp files, etc.) ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The row iterator was cancelled by the caller before it finished.
    #[error("operation cancelled")]
    Cancelled,
}

impl ExcelError {
    /// Recovers the original error if a `quick_xml::Error::Io` is just a
    /// wrapper around one raised earlier by the streaming unzipper (CRC
    /// mismatch, truncated archive, ...); otherwise reports it as malformed
    /// XML in `part`.
    pub fn from_quick_xml(part: &str, e: quick_xml::Error) -> ExcelError {
        if let quick_xml::Error::Io(io_err) = &e {
            if let Some(inner) = io_err.get_ref().and_then(|inner| inner.downcast_ref::<ExcelError>()) {
                match inner {
                    ExcelError::CrcMismatch { name, expected, actual } => {
                        return ExcelError::CrcMismatch {
                            name: name.clone(),
                            expected: *expected,
                            actual: *actual,
                        };
                    }
                    ExcelError::UnexpectedEof(name) => return ExcelError::UnexpectedEof(name.clone()),
                    ExcelError::UnsupportedMethod(method, name) => {
                        return ExcelError::UnsupportedMethod(*method, name.clone());
                    }
                    ExcelError::EncryptedEntry(name) => return ExcelError::EncryptedEntry(name.clone()),
                    _ => {}
                }
            }
        }
        ExcelError::MalformedXml {
            part: part.to_string(),
            detail: e.to_string(),
        }
    }

    /// Maps an error to the CLI exit code defined in the spec's external
    /// interface (`0` success is not represented here — only failures are).
    pub fn exit_code(&self) -> i32 {
        match self {
            ExcelError::UnsupportedSource(_) => 2,
            ExcelError::NotFound(_) => 3,
            ExcelError::Auth(_) => 4,
            ExcelError::UnexpectedEof(_)
            | ExcelError::CrcMismatch { .. }
            | ExcelError::UnsupportedMethod(_, _)
            | ExcelError::EncryptedEntry(_)
            | ExcelError::SplitArchive
            | ExcelError::MissingWorkbookPart
            | ExcelError::MissingRelationshipsPart
            | ExcelError::SheetNotFound { .. }
            | ExcelError::MalformedXml { .. }
            | ExcelError::SharedStringIndex(_)
            | ExcelError::BadCellAddress(_) => 5,
            ExcelError::Cancelled => 7,
            _ => 6,
        }
    }
}

/// Non-fatal conditions surfaced out-of-band per the spec's warning channel.
///
/// Warnings never terminate the row stream; they are either handed to a
/// caller-supplied [`WarningSink`] or logged at `warn!` level when no sink
/// is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    DuplicateSheetName(String),
    EmptyWorkbook,
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::DuplicateSheetName(name) => {
                write!(f, "duplicate sheet name '{name}'; keeping the first occurrence")
            }
            Warning::EmptyWorkbook => write!(f, "workbook contains no sheets"),
        }
    }
}

/// Callback for receiving [`Warning`]s as they are discovered.
pub trait WarningSink {
    fn warn(&mut self, warning: Warning);
}

impl<F: FnMut(Warning)> WarningSink for F {
    fn warn(&mut self, warning: Warning) {
        self(warning)
    }
}

/// Default sink used when the caller doesn't supply one: routes warnings
/// through the `log` facade instead of dropping them.
pub struct LogWarningSink;

impl WarningSink for LogWarningSink {
    fn warn(&mut self, warning: Warning) {
        log::warn!("{warning}");
    }
}
