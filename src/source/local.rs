//! Local filesystem byte source.

use super::{OriginKind, SourceMetadata};
use crate::error::{ExcelError, Result};
use std::io::{self, Read};
use std::path::Path;

pub fn open(path: &Path, chunk_size: usize) -> Result<Box<dyn Read + Send>> {
    let file = std::fs::File::open(path).map_err(|e| map_io_err(e, path))?;
    Ok(Box::new(io::BufReader::with_capacity(chunk_size, file)))
}

pub fn metadata(path: &Path) -> Result<SourceMetadata> {
    let meta = std::fs::metadata(path).map_err(|e| map_io_err(e, path))?;
    Ok(SourceMetadata {
        size: Some(meta.len()),
        content_type: None,
        origin_kind: Some(OriginKind::Local),
    })
}

fn map_io_err(e: io::Error, path: &Path) -> ExcelError {
    match e.kind() {
        io::ErrorKind::NotFound => ExcelError::NotFound(path.display().to_string()),
        io::ErrorKind::PermissionDenied => {
            ExcelError::PermissionDenied(path.display().to_string())
        }
        _ => ExcelError::Io(e),
    }
}
