//! Worksheet Streamer: incremental XML parsing of one worksheet member into
//! dense rows, with the live node set bounded to the current `<row>`'s
//! subtree plus O(depth) ancestor context.

use crate::error::{ExcelError, Result};
use crate::types::{column_index_from_address, row_number_from_address, Row};
use crate::zip::StreamingZip;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use std::io::{BufReader, Read};

enum CellKind {
    SharedString,
    InlineString,
    FormulaString,
    Boolean,
    Error,
    Numeric,
}

fn cell_kind(t: Option<&str>) -> CellKind {
    match t {
        Some("s") => CellKind::SharedString,
        Some("inlineStr") => CellKind::InlineString,
        Some("str") => CellKind::FormulaString,
        Some("b") => CellKind::Boolean,
        Some("e") => CellKind::Error,
        _ => CellKind::Numeric,
    }
}

/// Lazily yields dense [`Row`]s from one worksheet member's XML. Rows outside
/// `<sheetData>` are never retained; within it, only one row's cells are
/// live at a time. Owns the [`StreamingZip`] it reads from, since nothing
/// else needs it once the worksheet member has been located.
pub struct WorksheetStreamer<'a, R: Read> {
    reader: Reader<BufReader<StreamingZip<R>>>,
    shared_strings: &'a [String],
    part_name: String,
    in_sheet_data: bool,
    next_row_ordinal: u32,
    done: bool,
}

impl<'a, R: Read> WorksheetStreamer<'a, R> {
    pub fn new(zip: StreamingZip<R>, shared_strings: &'a [String], part_name: &str) -> Self {
        let mut reader = Reader::from_reader(BufReader::new(zip));
        reader.config_mut().trim_text(false);
        WorksheetStreamer {
            reader,
            shared_strings,
            part_name: part_name.to_string(),
            in_sheet_data: false,
            next_row_ordinal: 0,
            done: false,
        }
    }

    fn xml_err(&self, e: quick_xml::Error) -> ExcelError {
        ExcelError::from_quick_xml(&self.part_name, e)
    }

    fn parse_row(&mut self, start: &BytesStart<'_>) -> Result<Row> {
        let declared = row_r_attribute(start, self.reader.decoder())?;
        let index = match declared {
            Some(r) => {
                self.next_row_ordinal = r + 1;
                r.saturating_sub(1)
            }
            None => {
                let idx = self.next_row_ordinal;
                self.next_row_ordinal += 1;
                idx
            }
        };

        let mut cells: Vec<Option<String>> = Vec::new();
        let mut next_col: u32 = 0;
        let mut buf = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match self.reader.read_event_into(&mut buf).map_err(|e| self.xml_err(e))? {
                Event::Start(ref e) if e.local_name().as_ref() == b"c" => {
                    let (col, kind) = self.cell_attrs(e, next_col)?;
                    let value = self.parse_cell_body(&kind)?;
                    place(&mut cells, col, value);
                    next_col = col + 1;
                }
                Event::Empty(ref e) if e.local_name().as_ref() == b"c" => {
                    let (col, _kind) = self.cell_attrs(e, next_col)?;
                    place(&mut cells, col, String::new());
                    next_col = col + 1;
                }
                Event::End(ref e) if e.local_name().as_ref() == b"row" => break,
                Event::Eof => {
                    self.done = true;
                    return Err(ExcelError::UnexpectedEof(self.part_name.clone()));
                }
                _ => {}
            }
        }

        let dense = cells.into_iter().map(|c| c.unwrap_or_default()).collect();
        Ok(Row::new(index, dense))
    }

    fn cell_attrs(&self, e: &BytesStart<'_>, next_col: u32) -> Result<(u32, Option<String>)> {
        let mut addr = None;
        let mut t = None;
        for attr in e.attributes().flatten() {
            match attr.key {
                QName(b"r") => {
                    addr = Some(
                        attr.decode_and_unescape_value(self.reader.decoder())
                            .map_err(|err| self.xml_err(err))?
                            .into_owned(),
                    );
                }
                QName(b"t") => {
                    t = Some(
                        attr.decode_and_unescape_value(self.reader.decoder())
                            .map_err(|err| self.xml_err(err))?
                            .into_owned(),
                    );
                }
                _ => {}
            }
        }
        let col = match &addr {
            Some(a) => column_index_from_address(a)
                .ok_or_else(|| ExcelError::BadCellAddress(a.clone()))?,
            None => next_col,
        };
        Ok((col, t))
    }

    fn parse_cell_body(&mut self, cell_type: &Option<String>) -> Result<String> {
        let kind = cell_kind(cell_type.as_deref());
        let mut value_text: Option<String> = None;
        let mut inline_text = String::new();
        let mut in_is = false;
        let mut buf = Vec::with_capacity(512);

        loop {
            buf.clear();
            match self.reader.read_event_into(&mut buf).map_err(|e| self.xml_err(e))? {
                Event::Start(ref e) => {
                    let local = e.local_name();
                    if local.as_ref() == b"v" {
                        value_text = Some(self.read_text_until(b"v")?);
                    } else if local.as_ref() == b"f" {
                        self.skip_to_end_of(b"f")?;
                    } else if local.as_ref() == b"is" {
                        in_is = true;
                    } else if local.as_ref() == b"t" && in_is {
                        inline_text.push_str(&self.read_text_until(b"t")?);
                    }
                }
                Event::Empty(ref e) if e.local_name().as_ref() == b"f" => {}
                Event::End(ref e) => {
                    let local = e.local_name();
                    if local.as_ref() == b"c" {
                        break;
                    }
                    if local.as_ref() == b"is" {
                        in_is = false;
                    }
                }
                Event::Eof => {
                    self.done = true;
                    return Err(ExcelError::UnexpectedEof(self.part_name.clone()));
                }
                _ => {}
            }
        }

        match kind {
            CellKind::InlineString => Ok(inline_text),
            CellKind::SharedString => {
                let raw = value_text.unwrap_or_default();
                let idx: usize = raw
                    .trim()
                    .parse()
                    .map_err(|_| ExcelError::BadCellAddress(raw.clone()))?;
                self.shared_strings
                    .get(idx)
                    .cloned()
                    .ok_or(ExcelError::SharedStringIndex(idx))
            }
            CellKind::Boolean => {
                let raw = value_text.unwrap_or_default();
                match raw.trim() {
                    "1" => Ok("true".to_string()),
                    "0" => Ok("false".to_string()),
                    other => Ok(other.to_string()),
                }
            }
            CellKind::FormulaString | CellKind::Error | CellKind::Numeric => {
                Ok(value_text.unwrap_or_default())
            }
        }
    }

    fn read_text_until(&mut self, end_tag: &[u8]) -> Result<String> {
        let mut text = String::new();
        let mut buf = Vec::with_capacity(256);
        loop {
            buf.clear();
            match self.reader.read_event_into(&mut buf).map_err(|e| self.xml_err(e))? {
                Event::Text(ref e) => {
                    text.push_str(&e.unescape().map_err(|err| self.xml_err(err))?);
                }
                Event::End(ref e) if e.local_name().as_ref() == end_tag => break,
                Event::Eof => {
                    self.done = true;
                    return Err(ExcelError::UnexpectedEof(self.part_name.clone()));
                }
                _ => {}
            }
        }
        Ok(text)
    }

    fn skip_to_end_of(&mut self, tag: &[u8]) -> Result<()> {
        let mut buf = Vec::with_capacity(256);
        let mut depth: u32 = 1;
        loop {
            buf.clear();
            match self.reader.read_event_into(&mut buf).map_err(|e| self.xml_err(e))? {
                Event::Start(ref e) if e.local_name().as_ref() == tag => depth += 1,
                Event::End(ref e) if e.local_name().as_ref() == tag => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                Event::Eof => {
                    self.done = true;
                    return Err(ExcelError::UnexpectedEof(self.part_name.clone()));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl<'a, R: Read> Iterator for WorksheetStreamer<'a, R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Result<Row>> {
        if self.done {
            return None;
        }
        let mut buf = Vec::with_capacity(1024);
        loop {
            buf.clear();
            let event = match self.reader.read_event_into(&mut buf) {
                Ok(e) => e,
                Err(e) => {
                    self.done = true;
                    return Some(Err(self.xml_err(e)));
                }
            };
            match event {
                Event::Start(ref e) if e.local_name().as_ref() == b"sheetData" => {
                    self.in_sheet_data = true;
                }
                Event::End(ref e) if e.local_name().as_ref() == b"sheetData" => {
                    self.done = true;
                    return None;
                }
                Event::Start(ref e) if self.in_sheet_data && e.local_name().as_ref() == b"row" => {
                    let start = e.clone().into_owned();
                    return Some(self.parse_row(&start));
                }
                Event::Empty(ref e) if self.in_sheet_data && e.local_name().as_ref() == b"row" => {
                    let declared = match row_r_attribute(e, self.reader.decoder()) {
                        Ok(d) => d,
                        Err(err) => {
                            self.done = true;
                            return Some(Err(err));
                        }
                    };
                    let index = match declared {
                        Some(r) => {
                            self.next_row_ordinal = r + 1;
                            r.saturating_sub(1)
                        }
                        None => {
                            let idx = self.next_row_ordinal;
                            self.next_row_ordinal += 1;
                            idx
                        }
                    };
                    return Some(Ok(Row::new(index, Vec::new())));
                }
                Event::Eof => {
                    self.done = true;
                    if self.in_sheet_data {
                        return Some(Err(ExcelError::UnexpectedEof(self.part_name.clone())));
                    }
                    return None;
                }
                _ => {}
            }
        }
    }
}

fn place(cells: &mut Vec<Option<String>>, col: u32, value: String) {
    let col = col as usize;
    if cells.len() <= col {
        cells.resize(col + 1, None);
    }
    cells[col] = Some(value);
}

fn row_r_attribute(start: &BytesStart<'_>, decoder: quick_xml::Decoder) -> Result<Option<u32>> {
    for attr in start.attributes().flatten() {
        if attr.key == QName(b"r") {
            let raw = attr
                .decode_and_unescape_value(decoder)
                .map_err(|e| ExcelError::MalformedXml {
                    part: "worksheet".to_string(),
                    detail: e.to_string(),
                })?;
            return row_number_from_address(&format!("A{raw}"))
                .map(Some)
                .ok_or_else(|| ExcelError::BadCellAddress(raw.into_owned()));
        }
    }
    Ok(None)
}
