/*!
 * Mixed-encoding file decoder.
 *
 * Source files may be naive concatenations of exports saved under different
 * encodings, so every line is classified and decoded on its own. Decoding
 * never fails: undecodable bytes become U+FFFD and the number of output
 * lines always equals the number of raw input lines.
 */

use encoding_rs::Encoding;
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::Path;

use super::sniffer::{LineClassifier, StatisticalSniffer};

/// Confidence under which a line falls back to UTF-8
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;

/// Decoder choosing an encoding independently for each line
#[derive(Debug, Clone)]
pub struct MixedEncodingDecoder<C = StatisticalSniffer> {
    /// Per-line classification strategy
    classifier: C,

    /// Minimum confidence for a detected encoding to be used
    min_confidence: f32,
}

impl MixedEncodingDecoder<StatisticalSniffer> {
    /// Create a decoder backed by the statistical sniffer
    pub fn new() -> Self {
        Self::with_classifier(StatisticalSniffer::new())
    }
}

impl Default for MixedEncodingDecoder<StatisticalSniffer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: LineClassifier> MixedEncodingDecoder<C> {
    /// Create a decoder with a custom line classifier
    pub fn with_classifier(classifier: C) -> Self {
        Self {
            classifier,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    /// Set the confidence threshold under which UTF-8 is assumed
    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// The classifier used for each line
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Read `path` and decode it line by line
    pub fn decode_file<P: AsRef<Path>>(&self, path: P) -> io::Result<Vec<String>> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let lines = self.decode_bytes(&bytes);
        info!("Total lines in file {}: {}", path.display(), lines.len());
        Ok(lines)
    }

    /// Decode raw bytes into one string per raw line, without terminators
    pub fn decode_bytes(&self, bytes: &[u8]) -> Vec<String> {
        split_raw_lines(bytes)
            .into_iter()
            .enumerate()
            .map(|(index, raw)| self.decode_line(index, raw))
            .collect()
    }

    fn decode_line(&self, index: usize, raw: &[u8]) -> String {
        let content = strip_line_terminator(raw);
        let encoding = self.line_encoding(content);

        let (text, had_errors) = encoding.decode_without_bom_handling(content);
        if had_errors {
            warn!(
                "Line {} contained bytes not decodable as {}, replaced",
                index + 1,
                encoding.name()
            );
        }

        let mut text = text.into_owned();
        if index == 0 && text.starts_with('\u{FEFF}') {
            text.remove(0);
        }
        text
    }

    fn line_encoding(&self, content: &[u8]) -> &'static Encoding {
        match self.classifier.classify(content) {
            Some(detection) if detection.confidence >= self.min_confidence => {
                let encoding = detection.codec().unwrap_or(encoding_rs::UTF_8);
                debug!(
                    "Line decoded as {} with confidence {:.2}",
                    encoding.name(),
                    detection.confidence
                );
                encoding
            }
            _ => encoding_rs::UTF_8,
        }
    }
}

/// Split bytes after every `\n`, keeping a final unterminated line
///
/// Empty input yields no lines; `b"a\n"` yields one line.
pub fn split_raw_lines(bytes: &[u8]) -> Vec<&[u8]> {
    if bytes.is_empty() {
        return Vec::new();
    }
    bytes.split_inclusive(|&b| b == b'\n').collect()
}

fn strip_line_terminator(raw: &[u8]) -> &[u8] {
    let mut end = raw.len();
    while end > 0 && matches!(raw[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    &raw[..end]
}
