//! Reader Facade: composes the byte source, streaming unzipper, package
//! index, and worksheet streamer into the public two-pass pipeline (§4.5).
//!
//! `stream_rows` and `to_csv` each open two independent byte sources against
//! the same [`SourceSpec`]: pass 1 builds the [`PackageIndex`] (shared
//! strings + worksheet directory), pass 2 streams the selected worksheet.
//! This is forced by forward-only archive access: the shared string table
//! may live after the worksheet member in archive order, so it must be
//! fully resolved before worksheet cells referencing it are seen.

use crate::csv::CsvWriter;
use crate::error::{ExcelError, LogWarningSink, Result, WarningSink};
use crate::package::{self, PackageIndex};
use crate::source::{OriginKind, SourceSpec};
use crate::types::Row;
use crate::worksheet::WorksheetStreamer;
use crate::zip::StreamingZip;
use std::io::Write;
use std::path::Path;

const DEFAULT_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Coarse facts about a reader's source and (once a pass has run) workbook
/// structure, per §4.5's `get_metadata` operation.
#[derive(Debug, Clone, Default)]
pub struct ReaderMetadata {
    pub origin_kind: Option<OriginKind>,
    pub size: Option<u64>,
    pub content_type: Option<String>,
    pub sheet_names: Option<Vec<String>>,
}

/// Builder for a [`Reader`], mirroring the construct operation's optional
/// sheet name and chunk size (§4.5, §6).
pub struct ReaderBuilder {
    spec: SourceSpec,
    sheet_name: Option<String>,
    chunk_size: usize,
}

impl ReaderBuilder {
    pub fn new(spec: SourceSpec) -> Self {
        ReaderBuilder {
            spec,
            sheet_name: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Worksheet to stream; defaults to the first sheet in workbook order.
    pub fn sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = Some(name.into());
        self
    }

    /// Upper bound on the raw read buffer a byte source may use, in bytes.
    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes;
        self
    }

    pub fn build(self) -> Reader {
        Reader {
            spec: self.spec,
            sheet_name: self.sheet_name,
            chunk_size: self.chunk_size,
            index: None,
        }
    }
}

/// A reader handle bound to one [`SourceSpec`]. Each row-producing operation
/// opens its own fresh byte sources; the handle itself can be reused to
/// start another pass (e.g. `to_csv` twice for the idempotence property in
/// §8).
pub struct Reader {
    spec: SourceSpec,
    sheet_name: Option<String>,
    chunk_size: usize,
    index: Option<PackageIndex>,
}

impl Reader {
    /// Detects the transport from a URI or path and builds a reader with
    /// default options. See [`SourceSpec::detect`] for the grammar.
    pub fn open(uri: &str) -> Result<Self> {
        Ok(Self::builder(SourceSpec::detect(uri)?).build())
    }

    /// Opens a reader directly against a local filesystem path, bypassing
    /// URI auto-detection.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::builder(SourceSpec::Local(path.as_ref().to_path_buf())).build())
    }

    pub fn builder(spec: SourceSpec) -> ReaderBuilder {
        ReaderBuilder::new(spec)
    }

    /// Upper bound, in bytes, that byte sources use for their raw read
    /// buffer. Configured at construction; exposed read-only here since
    /// changing it mid-pass has no well-defined meaning.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn run_pass1(&mut self, warnings: &mut dyn WarningSink) -> Result<()> {
        if self.index.is_some() {
            return Ok(());
        }
        let raw = self.spec.open(self.chunk_size)?;
        let mut zip = StreamingZip::with_chunk_size(raw, self.chunk_size);
        let index = package::build(&mut zip, warnings)?;
        self.index = Some(index);
        Ok(())
    }

    /// Ensures the package index has been built, using the default
    /// log-based warning sink if the caller hasn't requested one directly.
    fn ensure_index(&mut self) -> Result<()> {
        let mut sink = LogWarningSink;
        self.run_pass1(&mut sink)
    }

    /// Builds the package index (if not already built) using a
    /// caller-supplied warning observer for §7's non-fatal warnings.
    pub fn ensure_index_with(&mut self, warnings: &mut dyn WarningSink) -> Result<()> {
        self.run_pass1(warnings)
    }

    /// Sheet names in workbook document order. Triggers pass 1 if it
    /// hasn't run yet.
    pub fn sheet_names(&mut self) -> Result<Vec<String>> {
        self.ensure_index()?;
        Ok(self.index.as_ref().unwrap().sheet_names())
    }

    pub fn sheet_count(&mut self) -> Result<usize> {
        Ok(self.sheet_names()?.len())
    }

    /// Known facts about the source and, once a pass has run, the workbook's
    /// sheet names. Does not itself trigger a pass.
    pub fn metadata(&self) -> Result<ReaderMetadata> {
        let source_meta = self.spec.metadata()?;
        Ok(ReaderMetadata {
            origin_kind: source_meta.origin_kind,
            size: source_meta.size,
            content_type: source_meta.content_type,
            sheet_names: self.index.as_ref().map(PackageIndex::sheet_names),
        })
    }

    fn resolve_part_name(&self) -> Result<String> {
        let index = self.index.as_ref().expect("pass 1 must run before resolving a sheet");
        let path = match &self.sheet_name {
            Some(name) => index.path_for_sheet(name)?,
            None => index
                .first_sheet_path()
                .ok_or_else(|| ExcelError::SheetNotFound {
                    sheet: String::new(),
                    available: String::new(),
                })?,
        };
        Ok(path.to_string())
    }

    /// Opens pass 2's byte source and advances a fresh [`StreamingZip`] to
    /// the worksheet member located by pass 1, in archive order.
    fn open_worksheet_member(&self, part_name: &str) -> Result<StreamingZip<Box<dyn std::io::Read + Send>>> {
        let raw = self.spec.open(self.chunk_size)?;
        let mut zip = StreamingZip::with_chunk_size(raw, self.chunk_size);
        loop {
            match zip.next_member()? {
                Some(meta) if meta.name == part_name => return Ok(zip),
                Some(_) => continue,
                None => {
                    return Err(ExcelError::MalformedXml {
                        part: part_name.to_string(),
                        detail: "worksheet member listed in the package index was not found in the archive".into(),
                    })
                }
            }
        }
    }

    /// Runs the two-pass orchestration and returns a lazy row iterator over
    /// the selected worksheet (§4.5's `stream_rows`).
    pub fn rows(&mut self) -> Result<RowIter<'_>> {
        self.ensure_index()?;
        let part_name = self.resolve_part_name()?;
        let zip = self.open_worksheet_member(&part_name)?;
        let shared_strings = &self.index.as_ref().unwrap().shared_strings;
        let streamer = WorksheetStreamer::new(zip, shared_strings, &part_name);
        Ok(RowIter { inner: streamer })
    }

    /// Runs the two-pass orchestration and writes every row to `sink` as
    /// CSV (§4.5's `to_csv`), returning the number of rows written.
    pub fn to_csv<W: Write>(&mut self, sink: W) -> Result<u64> {
        let mut writer = CsvWriter::new(sink);
        let mut count: u64 = 0;
        for row in self.rows()? {
            let row = row?;
            writer.write_row(row.as_slice()).map_err(ExcelError::SinkIo)?;
            count += 1;
        }
        writer.flush().map_err(ExcelError::SinkIo)?;
        Ok(count)
    }

    /// Row and column counts for the selected sheet, derived by running the
    /// row stream to completion. Not a cheap O(1) lookup: the worksheet
    /// must be fully read once to know its widest row.
    pub fn dimensions(&mut self) -> Result<(u64, usize)> {
        let mut rows: u64 = 0;
        let mut max_cols = 0usize;
        for row in self.rows()? {
            let row = row?;
            rows += 1;
            max_cols = max_cols.max(row.len());
        }
        Ok((rows, max_cols))
    }
}

/// Lazy sequence of dense [`Row`]s produced by [`Reader::rows`]. Dropping
/// this iterator early (cancellation, `?` short-circuit) releases the
/// underlying byte source and decompressor.
pub struct RowIter<'a> {
    inner: WorksheetStreamer<'a, Box<dyn std::io::Read + Send>>,
}

impl<'a> Iterator for RowIter<'a> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write as _};

    fn build_xlsx(
        workbook_xml: &[u8],
        rels_xml: &[u8],
        shared_strings_xml: Option<&[u8]>,
        sheets: &[(&str, &[u8])],
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated);
            writer.start_file("xl/workbook.xml", options).unwrap();
            writer.write_all(workbook_xml).unwrap();
            writer.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
            writer.write_all(rels_xml).unwrap();
            if let Some(sst) = shared_strings_xml {
                writer.start_file("xl/sharedStrings.xml", options).unwrap();
                writer.write_all(sst).unwrap();
            }
            for (path, xml) in sheets {
                writer.start_file(*path, options).unwrap();
                writer.write_all(xml).unwrap();
            }
            writer.finish().unwrap();
        }
        buf
    }

    const WORKBOOK_XML: &[u8] = br#"<?xml version="1.0"?>
        <workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
                  xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
          <sheets>
            <sheet name="Summary" sheetId="1" r:id="rId1"/>
            <sheet name="Data" sheetId="2" r:id="rId2"/>
          </sheets>
        </workbook>"#;

    const RELS_XML: &[u8] = br#"<?xml version="1.0"?>
        <Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
          <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
          <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/>
        </Relationships>"#;

    const SHEET1_XML: &[u8] = br#"<?xml version="1.0"?>
        <worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
          <sheetData>
            <row r="1"><c r="A1" t="inlineStr"><is><t>name</t></is></c><c r="B1" t="inlineStr"><is><t>age</t></is></c></row>
            <row r="2"><c r="A2" t="inlineStr"><is><t>alice</t></is></c><c r="B2"><v>30</v></c></row>
          </sheetData>
        </worksheet>"#;

    const SHEET2_XML: &[u8] = br#"<?xml version="1.0"?>
        <worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
          <sheetData>
            <row r="1"><c r="A1" t="inlineStr"><is><t>from-data-sheet</t></is></c></row>
          </sheetData>
        </worksheet>"#;

    fn write_fixture(dir: &tempfile::TempDir, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join("fixture.xlsx");
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn s1_two_column_two_row_to_csv() {
        let archive = build_xlsx(
            WORKBOOK_XML,
            RELS_XML,
            None,
            &[("xl/worksheets/sheet1.xml", SHEET1_XML), ("xl/worksheets/sheet2.xml", SHEET2_XML)],
        );
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, &archive);

        let mut reader = Reader::open_path(&path).unwrap();
        let mut out = Vec::new();
        let rows_written = reader.to_csv(&mut out).unwrap();

        assert_eq!(rows_written, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "name,age\r\nalice,30\r\n");
    }

    #[test]
    fn s4_selects_named_sheet_over_first() {
        let archive = build_xlsx(
            WORKBOOK_XML,
            RELS_XML,
            None,
            &[("xl/worksheets/sheet1.xml", SHEET1_XML), ("xl/worksheets/sheet2.xml", SHEET2_XML)],
        );
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, &archive);

        let mut reader = Reader::builder(SourceSpec::Local(path)).sheet_name("Data").build();
        let rows: Vec<Row> = reader.rows().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells, vec!["from-data-sheet"]);
    }

    #[test]
    fn s5_missing_sheet_errors_before_any_row() {
        let archive = build_xlsx(
            WORKBOOK_XML,
            RELS_XML,
            None,
            &[("xl/worksheets/sheet1.xml", SHEET1_XML), ("xl/worksheets/sheet2.xml", SHEET2_XML)],
        );
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, &archive);

        let mut reader = Reader::builder(SourceSpec::Local(path)).sheet_name("Ghost").build();
        let err = reader.rows().unwrap_err();
        assert!(matches!(err, ExcelError::SheetNotFound { .. }));
    }

    #[test]
    fn s3_shared_string_resolution_end_to_end() {
        const SST_XML: &[u8] = br#"<?xml version="1.0"?>
            <sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
              <si><t>hello</t></si>
              <si><t>world</t></si>
            </sst>"#;
        const SHEET_WITH_SHARED: &[u8] = br#"<?xml version="1.0"?>
            <worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
              <sheetData>
                <row r="1"><c r="A1" t="s"><v>1</v></c></row>
              </sheetData>
            </worksheet>"#;
        let archive = build_xlsx(
            WORKBOOK_XML,
            RELS_XML,
            Some(SST_XML),
            &[("xl/worksheets/sheet1.xml", SHEET_WITH_SHARED), ("xl/worksheets/sheet2.xml", SHEET2_XML)],
        );
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, &archive);

        let mut reader = Reader::open_path(&path).unwrap();
        let rows: Vec<Row> = reader.rows().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(rows[0].cells, vec!["world"]);
    }

    #[test]
    fn idempotent_to_csv_across_fresh_handles() {
        let archive = build_xlsx(
            WORKBOOK_XML,
            RELS_XML,
            None,
            &[("xl/worksheets/sheet1.xml", SHEET1_XML), ("xl/worksheets/sheet2.xml", SHEET2_XML)],
        );
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, &archive);

        let mut first_out = Vec::new();
        Reader::open_path(&path).unwrap().to_csv(&mut first_out).unwrap();

        let mut second_out = Vec::new();
        Reader::open_path(&path).unwrap().to_csv(&mut second_out).unwrap();

        assert_eq!(first_out, second_out);
    }

    #[test]
    fn sheet_names_lists_workbook_order() {
        let archive = build_xlsx(
            WORKBOOK_XML,
            RELS_XML,
            None,
            &[("xl/worksheets/sheet1.xml", SHEET1_XML), ("xl/worksheets/sheet2.xml", SHEET2_XML)],
        );
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, &archive);

        let mut reader = Reader::open_path(&path).unwrap();
        assert_eq!(reader.sheet_names().unwrap(), vec!["Summary", "Data"]);
    }
}
