/*!
 * Row codec for delimited text.
 *
 * Parses decoded text into rows of cells and serialises rows back into a
 * target encoding. Characters the target encoding cannot represent are
 * replaced with `?` instead of failing the file.
 */

use encoding_rs::{EncoderResult, Encoding};
use log::warn;
use std::io::Write;

use crate::encoding::EncodingName;
use crate::encoding::decoder::split_raw_lines;
use crate::encoding::script::contains_cjk;
use crate::errors::CodecError;

/// One parsed record: ordered cell strings
///
/// A blank source line is kept as an empty row and written back as a bare terminator.
pub type Row = Vec<String>;

/// Record terminator written on output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    /// CRLF if the raw content holds any CRLF pair, LF otherwise
    pub fn detect(content: &[u8]) -> Self {
        if content.windows(2).any(|window| window == b"\r\n") {
            Self::CrLf
        } else {
            Self::Lf
        }
    }

    fn terminator(self) -> csv::Terminator {
        match self {
            Self::Lf => csv::Terminator::Any(b'\n'),
            Self::CrLf => csv::Terminator::CRLF,
        }
    }

    /// Terminator text
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// Exact terminator of every physical line of a raw file
///
/// Lets decoded lines be written back with the bytes they were read with,
/// including a missing newline at the end of the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineLayout {
    terminators: Vec<String>,
}

impl LineLayout {
    /// Record the terminator of each line in `raw`
    pub fn scan(raw: &[u8]) -> Self {
        let terminators = split_raw_lines(raw)
            .into_iter()
            .map(|line| {
                let content = line
                    .iter()
                    .rposition(|&b| b != b'\n' && b != b'\r')
                    .map_or(0, |last| last + 1);
                // only CR and LF bytes remain
                String::from_utf8_lossy(&line[content..]).into_owned()
            })
            .collect();
        Self { terminators }
    }

    /// Number of physical lines
    pub fn len(&self) -> usize {
        self.terminators.len()
    }

    /// Whether the file had no lines
    pub fn is_empty(&self) -> bool {
        self.terminators.is_empty()
    }

    /// Whether the last line was terminated
    pub fn ends_with_newline(&self) -> bool {
        self.terminators.last().is_some_and(|t| !t.is_empty())
    }

    /// Terminator of line `index`
    pub fn terminator(&self, index: usize) -> Option<&str> {
        self.terminators.get(index).map(String::as_str)
    }
}

/// Rows serialised into a concrete encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRows {
    /// Encoded output bytes
    pub bytes: Vec<u8>,
    /// Number of characters replaced because the encoding could not represent them
    pub replaced: usize,
}

/// Parser and serialiser for comma-delimited rows
#[derive(Debug, Clone, Copy, Default)]
pub struct RowCodec {
    line_ending: LineEnding,
}

impl RowCodec {
    /// Create a codec writing records with `line_ending`
    pub fn new(line_ending: LineEnding) -> Self {
        Self { line_ending }
    }

    /// Terminator used when writing
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Parse decoded lines into rows
    ///
    /// Lines are grouped while a quoted cell is open, so a record may span
    /// several lines. A blank line outside a record becomes an empty row.
    pub fn parse_lines<S: AsRef<str>>(&self, lines: &[S]) -> Result<Vec<Row>, CodecError> {
        let mut rows = Vec::new();
        let mut pending = String::new();
        let mut open = false;

        for line in lines {
            let line: &str = line.as_ref();
            if !open && line.is_empty() {
                rows.push(Row::new());
                continue;
            }
            if open {
                pending.push('\n');
            }
            pending.push_str(line);
            open = pending.matches('"').count() % 2 == 1;
            if !open {
                rows.extend(self.parse_text(&pending)?);
                pending.clear();
            }
        }
        if open {
            rows.extend(self.parse_text(&pending)?);
        }
        Ok(rows)
    }

    /// Parse text into rows; rows may have different lengths
    ///
    /// Blank lines are dropped here; use `parse_lines` to keep them.
    pub fn parse_text(&self, text: &str) -> Result<Vec<Row>, CodecError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(String::from).collect());
        }
        Ok(rows)
    }

    /// A CSV writer over `sink` using this codec's terminator
    pub fn writer<W: Write>(&self, sink: W) -> csv::Writer<W> {
        csv::WriterBuilder::new()
            .flexible(true)
            .terminator(self.line_ending.terminator())
            .from_writer(sink)
    }

    /// Serialise one row, terminator included
    pub fn serialize_row(&self, row: &Row) -> Result<String, CodecError> {
        if row.is_empty() {
            return Ok(self.line_ending.as_str().to_string());
        }
        let mut writer = self.writer(Vec::new());
        writer.write_record(row)?;
        let buffer = writer
            .into_inner()
            .map_err(|e| CodecError::Flush(e.to_string()))?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Serialise rows to a UTF-8 string
    pub fn serialize(&self, rows: &[Row]) -> Result<String, CodecError> {
        let mut text = String::new();
        for row in rows {
            text.push_str(&self.serialize_row(row)?);
        }
        Ok(text)
    }

    /// Write decoded lines back into `target` with the terminators from `layout`
    ///
    /// Lines beyond the layout get this codec's terminator.
    pub fn encode_lines<S: AsRef<str>>(
        &self,
        lines: &[S],
        layout: &LineLayout,
        target: &EncodingName,
    ) -> EncodedRows {
        let mut text = String::new();
        for (index, line) in lines.iter().enumerate() {
            text.push_str(line.as_ref());
            text.push_str(
                layout
                    .terminator(index)
                    .unwrap_or(self.line_ending.as_str()),
            );
        }
        encode_text(&text, target)
    }

    /// Serialise rows into `target`, replacing unencodable characters
    pub fn encode_rows(
        &self,
        rows: &[Row],
        target: &EncodingName,
    ) -> Result<EncodedRows, CodecError> {
        let text = self.serialize(rows)?;
        Ok(encode_text(&text, target))
    }
}

/// Streams rows into a sink, one record at a time
pub struct RowWriter<W: Write> {
    codec: RowCodec,
    sink: W,
}

impl<W: Write> RowWriter<W> {
    /// Wrap `sink`
    pub fn new(codec: RowCodec, sink: W) -> Self {
        Self { codec, sink }
    }

    /// Append `row`
    pub fn write_row(&mut self, row: &Row) -> Result<(), CodecError> {
        let record = self.codec.serialize_row(row)?;
        self.sink
            .write_all(record.as_bytes())
            .map_err(|e| CodecError::Csv(e.into()))
    }

    /// Flush the sink
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.sink.flush()
    }

    /// The wrapped sink
    pub fn get_ref(&self) -> &W {
        &self.sink
    }
}

fn encode_text(text: &str, target: &EncodingName) -> EncodedRows {
    let encoding = target.codec().unwrap_or(encoding_rs::UTF_8);
    let (bytes, replaced) = encode_with_replacement(text, encoding);
    if replaced > 0 {
        warn!(
            "Encoding to {} replaced {} characters due to encoding errors.",
            target, replaced
        );
    }
    EncodedRows { bytes, replaced }
}

/// Encode `text`, writing `?` for every character `encoding` cannot represent
pub fn encode_with_replacement(text: &str, encoding: &'static Encoding) -> (Vec<u8>, usize) {
    let encoding = encoding.output_encoding();
    if encoding == encoding_rs::UTF_8 {
        return (text.as_bytes().to_vec(), 0);
    }

    let mut encoder = encoding.new_encoder();
    let mut output = Vec::with_capacity(text.len() + 16);
    let mut buffer = [0u8; 4096];
    let mut remaining = text;
    let mut replaced = 0;

    loop {
        let (result, read, written) =
            encoder.encode_from_utf8_without_replacement(remaining, &mut buffer, true);
        output.extend_from_slice(&buffer[..written]);
        remaining = &remaining[read..];

        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => {}
            EncoderResult::Unmappable(_) => {
                output.push(b'?');
                replaced += 1;
            }
        }
    }

    (output, replaced)
}

/// Re-derive a cell that was decoded as Latin-1 while holding GBK bytes
///
/// Accepted only when every character fits in one byte, at least one is
/// non-ASCII, the bytes decode strictly as GBK and the result contains CJK.
pub fn repair_cell(cell: &str) -> Option<String> {
    if cell.is_ascii() {
        return None;
    }

    let bytes = cell
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect::<Option<Vec<u8>>>()?;

    let decoded = encoding_rs::GBK.decode_without_bom_handling_and_without_replacement(&bytes)?;
    contains_cjk(&decoded).then(|| decoded.into_owned())
}

/// Apply `repair_cell`, keeping the original text when the heuristic does not apply
pub fn repair_or_keep(cell: String) -> String {
    repair_cell(&cell).unwrap_or(cell)
}
