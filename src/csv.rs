//! CSV serialization: the format the reader facade's `to_csv` writes.
//!
//! Standard dialect per the spec: `,` delimiter, `\r\n` line terminator,
//! double-quote enclosing any field containing the delimiter, quote,
//! carriage return, or newline, with embedded quotes doubled.

use std::io::{self, Write};

const DELIMITER: u8 = b',';
const QUOTE: u8 = b'"';
const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Writes CSV rows to an underlying sink, one row per call to [`write_row`].
///
/// Tracks the widest row written so far in this writer's lifetime and pads
/// every row out to it with empty trailing cells — a CSV-specific
/// running-max width, distinct from a row's own dense cell count.
pub struct CsvWriter<W: Write> {
    sink: W,
    buffer: Vec<u8>,
    max_width: usize,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(sink: W) -> Self {
        CsvWriter {
            sink,
            buffer: Vec::with_capacity(4096),
            max_width: 0,
        }
    }

    pub fn write_row<S: AsRef<str>>(&mut self, fields: &[S]) -> io::Result<()> {
        self.max_width = self.max_width.max(fields.len());
        self.buffer.clear();
        for i in 0..self.max_width {
            if i > 0 {
                self.buffer.push(DELIMITER);
            }
            if let Some(field) = fields.get(i) {
                encode_field(field.as_ref(), &mut self.buffer);
            }
        }
        self.buffer.extend_from_slice(LINE_TERMINATOR);
        self.sink.write_all(&self.buffer)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

fn needs_quoting(field: &str) -> bool {
    field
        .bytes()
        .any(|b| b == DELIMITER || b == QUOTE || b == b'\n' || b == b'\r')
}

fn encode_field(field: &str, buffer: &mut Vec<u8>) {
    if !needs_quoting(field) {
        buffer.extend_from_slice(field.as_bytes());
        return;
    }
    buffer.push(QUOTE);
    for byte in field.bytes() {
        if byte == QUOTE {
            buffer.push(QUOTE);
            buffer.push(QUOTE);
        } else {
            buffer.push(byte);
        }
    }
    buffer.push(QUOTE);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_to_string(fields: &[&str]) -> String {
        let mut out = Vec::new();
        let mut writer = CsvWriter::new(&mut out);
        writer.write_row(fields).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn plain_fields_unquoted() {
        assert_eq!(row_to_string(&["name", "age"]), "name,age\r\n");
    }

    #[test]
    fn delimiter_triggers_quoting() {
        assert_eq!(row_to_string(&["a,b", "c"]), "\"a,b\",c\r\n");
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        assert_eq!(row_to_string(&[r#"Say "hi""#]), "\"Say \"\"hi\"\"\"\r\n");
    }

    #[test]
    fn newline_and_cr_trigger_quoting() {
        assert_eq!(row_to_string(&["line1\nline2"]), "\"line1\nline2\"\r\n");
        assert_eq!(row_to_string(&["a\rb"]), "\"a\rb\"\r\n");
    }

    #[test]
    fn empty_fields_round_trip() {
        assert_eq!(row_to_string(&["", "", ""]), ",,\r\n");
    }

    #[test]
    fn s1_two_column_two_row() {
        let mut out = Vec::new();
        {
            let mut writer = CsvWriter::new(&mut out);
            writer.write_row(&["name", "age"]).unwrap();
            writer.write_row(&["alice", "30"]).unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), "name,age\r\nalice,30\r\n");
    }

    #[test]
    fn narrower_rows_pad_to_the_widest_row_seen_so_far() {
        let mut out = Vec::new();
        {
            let mut writer = CsvWriter::new(&mut out);
            writer.write_row(&["a", "b", "c"]).unwrap();
            writer.write_row(&["x"]).unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), "a,b,c\r\nx,,\r\n");
    }

    #[test]
    fn a_later_wider_row_does_not_retroactively_pad_earlier_rows() {
        let mut out = Vec::new();
        {
            let mut writer = CsvWriter::new(&mut out);
            writer.write_row(&["a"]).unwrap();
            writer.write_row(&["b", "c", "d"]).unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), "a\r\nb,c,d\r\n");
    }
}
