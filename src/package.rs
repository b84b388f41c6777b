//! Package Index: shared string table + worksheet directory, built from a
//! single forward pass over the archive.

use crate::error::{ExcelError, Result, Warning, WarningSink};
use crate::zip::StreamingZip;
use indexmap::IndexMap;
use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{BufReader, Read};

const WORKSHEET_RELATIONSHIP_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";

const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

/// The two artifacts recovered from pass 1: the shared string table and the
/// sheet-name-to-member-path directory, in workbook document order.
#[derive(Debug, Clone, Default)]
pub struct PackageIndex {
    pub shared_strings: Vec<String>,
    pub worksheets: IndexMap<String, String>,
}

impl PackageIndex {
    pub fn sheet_names(&self) -> Vec<String> {
        self.worksheets.keys().cloned().collect()
    }

    pub fn first_sheet_path(&self) -> Option<&str> {
        self.worksheets.values().next().map(String::as_str)
    }

    pub fn path_for_sheet(&self, name: &str) -> Result<&str> {
        self.worksheets.get(name).map(String::as_str).ok_or_else(|| {
            ExcelError::SheetNotFound {
                sheet: name.to_string(),
                available: self.sheet_names().join(", "),
            }
        })
    }
}

/// Runs pass 1: scans every member of the archive, extracting the three
/// parts this index needs and draining (but discarding) everything else so
/// CRC checks run to completion across the whole archive.
pub fn build<R: Read>(zip: &mut StreamingZip<R>, warnings: &mut dyn WarningSink) -> Result<PackageIndex> {
    let mut shared_strings = Vec::new();
    let mut sheet_decls: Vec<(String, String)> = Vec::new(); // (name, r:id), document order
    let mut relationships: HashMap<String, (String, String)> = HashMap::new(); // Id -> (target, type)
    let mut saw_workbook = false;
    let mut saw_rels = false;

    while let Some(member) = zip.next_member()? {
        match member.name.as_str() {
            SHARED_STRINGS_PART => {
                shared_strings = parse_shared_strings(zip)?;
            }
            WORKBOOK_PART => {
                sheet_decls = parse_workbook(zip)?;
                saw_workbook = true;
            }
            WORKBOOK_RELS_PART => {
                relationships = parse_relationships(zip)?;
                saw_rels = true;
            }
            _ => {}
        }
    }

    if !saw_workbook {
        return Err(ExcelError::MissingWorkbookPart);
    }
    if !saw_rels {
        return Err(ExcelError::MissingRelationshipsPart);
    }

    let mut worksheets = IndexMap::new();
    for (name, rid) in sheet_decls {
        let Some((target, rel_type)) = relationships.get(&rid) else {
            continue;
        };
        if rel_type != WORKSHEET_RELATIONSHIP_TYPE {
            continue;
        }
        if worksheets.contains_key(&name) {
            warnings.warn(Warning::DuplicateSheetName(name));
            continue;
        }
        worksheets.insert(name, resolve_target(target));
    }

    if worksheets.is_empty() {
        warnings.warn(Warning::EmptyWorkbook);
    }

    Ok(PackageIndex {
        shared_strings,
        worksheets,
    })
}

/// Resolves a relationship `Target` against the package root, per OPC rules:
/// targets are relative to the part that declares them (`xl/` for
/// `xl/_rels/workbook.xml.rels`) unless already absolute.
fn resolve_target(target: &str) -> String {
    if let Some(stripped) = target.strip_prefix('/') {
        stripped.to_string()
    } else {
        format!("xl/{target}")
    }
}

fn xml_reader<R: Read>(source: R) -> Reader<BufReader<R>> {
    let mut reader = Reader::from_reader(BufReader::new(source));
    reader.config_mut().trim_text(false);
    reader
}

fn xml_err(part: &str, e: quick_xml::Error) -> ExcelError {
    ExcelError::MalformedXml {
        part: part.to_string(),
        detail: e.to_string(),
    }
}

fn parse_shared_strings<R: Read>(source: &mut StreamingZip<R>) -> Result<Vec<String>> {
    let mut reader = xml_reader(source);
    let mut buf = Vec::with_capacity(4096);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;

    loop {
        buf.clear();
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_err(SHARED_STRINGS_PART, e))?
        {
            Event::Start(ref e) if e.name() == QName(b"si") => {
                in_si = true;
                current.clear();
            }
            Event::End(ref e) if e.name() == QName(b"si") => {
                in_si = false;
                strings.push(std::mem::take(&mut current));
            }
            Event::Start(ref e) if e.local_name().as_ref() == b"t" => {
                in_t = true;
            }
            Event::End(ref e) if e.local_name().as_ref() == b"t" => {
                in_t = false;
            }
            Event::Text(ref e) if in_si && in_t => {
                let text = e.unescape().map_err(|err| xml_err(SHARED_STRINGS_PART, err))?;
                current.push_str(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(strings)
}

fn parse_workbook<R: Read>(source: &mut StreamingZip<R>) -> Result<Vec<(String, String)>> {
    let mut reader = xml_reader(source);
    let mut buf = Vec::with_capacity(2048);
    let mut sheets = Vec::new();

    loop {
        buf.clear();
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_err(WORKBOOK_PART, e))?
        {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut rid = None;
                for attr in e.attributes().flatten() {
                    let key = attr.key;
                    if key == QName(b"name") {
                        name = Some(
                            attr.decode_and_unescape_value(reader.decoder())
                                .map_err(|err| xml_err(WORKBOOK_PART, err))?
                                .into_owned(),
                        );
                    } else if key.local_name().as_ref() == b"id" {
                        rid = Some(
                            attr.decode_and_unescape_value(reader.decoder())
                                .map_err(|err| xml_err(WORKBOOK_PART, err))?
                                .into_owned(),
                        );
                    }
                }
                if let (Some(name), Some(rid)) = (name, rid) {
                    sheets.push((name, rid));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(sheets)
}

fn parse_relationships<R: Read>(source: &mut StreamingZip<R>) -> Result<HashMap<String, (String, String)>> {
    let mut reader = xml_reader(source);
    let mut buf = Vec::with_capacity(2048);
    let mut rels = HashMap::new();

    loop {
        buf.clear();
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_err(WORKBOOK_RELS_PART, e))?
        {
            Event::Start(ref e) | Event::Empty(ref e)
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                let mut rel_type = None;
                for attr in e.attributes().flatten() {
                    match attr.key {
                        QName(b"Id") => {
                            id = Some(
                                attr.decode_and_unescape_value(reader.decoder())
                                    .map_err(|err| xml_err(WORKBOOK_RELS_PART, err))?
                                    .into_owned(),
                            );
                        }
                        QName(b"Target") => {
                            target = Some(
                                attr.decode_and_unescape_value(reader.decoder())
                                    .map_err(|err| xml_err(WORKBOOK_RELS_PART, err))?
                                    .into_owned(),
                            );
                        }
                        QName(b"Type") => {
                            rel_type = Some(
                                attr.decode_and_unescape_value(reader.decoder())
                                    .map_err(|err| xml_err(WORKBOOK_RELS_PART, err))?
                                    .into_owned(),
                            );
                        }
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    rels.insert(id, (target, rel_type.unwrap_or_default()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LogWarningSink;
    use std::io::Write;

    fn build_test_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated);
            for (name, data) in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
            writer.finish().unwrap();
        }
        buf
    }

    const WORKBOOK_XML: &[u8] = br#"<?xml version="1.0"?>
        <workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
          <sheets>
            <sheet name="Summary" sheetId="1" r:id="rId1" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"/>
            <sheet name="Data" sheetId="2" r:id="rId2" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"/>
          </sheets>
        </workbook>"#;

    const RELS_XML: &[u8] = br#"<?xml version="1.0"?>
        <Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
          <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
          <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/>
        </Relationships>"#;

    const SHARED_STRINGS_XML: &[u8] = br#"<?xml version="1.0"?>
        <sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="2" uniqueCount="2">
          <si><t>hello</t></si>
          <si><t>world</t></si>
        </sst>"#;

    #[test]
    fn builds_index_from_three_parts() {
        let archive = build_test_zip(&[
            (WORKBOOK_RELS_PART, RELS_XML),
            (WORKBOOK_PART, WORKBOOK_XML),
            (SHARED_STRINGS_PART, SHARED_STRINGS_XML),
        ]);
        let mut zip = StreamingZip::new(std::io::Cursor::new(archive));
        let mut sink = LogWarningSink;
        let index = build(&mut zip, &mut sink).unwrap();

        assert_eq!(index.shared_strings, vec!["hello", "world"]);
        assert_eq!(index.sheet_names(), vec!["Summary", "Data"]);
        assert_eq!(index.path_for_sheet("Data").unwrap(), "xl/worksheets/sheet2.xml");
        assert_eq!(index.first_sheet_path(), Some("xl/worksheets/sheet1.xml"));
    }

    #[test]
    fn missing_sheet_reports_available_names() {
        let archive = build_test_zip(&[(WORKBOOK_RELS_PART, RELS_XML), (WORKBOOK_PART, WORKBOOK_XML)]);
        let mut zip = StreamingZip::new(std::io::Cursor::new(archive));
        let mut sink = LogWarningSink;
        let index = build(&mut zip, &mut sink).unwrap();

        let err = index.path_for_sheet("Ghost").unwrap_err();
        match err {
            ExcelError::SheetNotFound { sheet, available } => {
                assert_eq!(sheet, "Ghost");
                assert_eq!(available, "Summary, Data");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_workbook_part_is_an_error() {
        let archive = build_test_zip(&[(WORKBOOK_RELS_PART, RELS_XML)]);
        let mut zip = StreamingZip::new(std::io::Cursor::new(archive));
        let mut sink = LogWarningSink;
        let err = build(&mut zip, &mut sink).unwrap_err();
        assert!(matches!(err, ExcelError::MissingWorkbookPart));
    }

    #[test]
    fn absent_shared_strings_yields_empty_table() {
        let archive = build_test_zip(&[(WORKBOOK_RELS_PART, RELS_XML), (WORKBOOK_PART, WORKBOOK_XML)]);
        let mut zip = StreamingZip::new(std::io::Cursor::new(archive));
        let mut sink = LogWarningSink;
        let index = build(&mut zip, &mut sink).unwrap();
        assert!(index.shared_strings.is_empty());
    }
}
