/*!
 * Statistical encoding sniffer.
 *
 * Classifies a byte sample as ASCII, UTF-8, GBK (GB2312) or ISO-8859-9 and
 * reports a confidence between 0 and 1. The classifier is exposed through the
 * `LineClassifier` trait so the per-line decoder can run alternative heuristics.
 */

use encoding_rs::Encoding;
use log::{debug, error};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Default number of bytes read from the start of a file for whole-file detection
pub const DEFAULT_SAMPLE_BYTES: usize = 10_000;

/// Canonical encoding of a file as routed by the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EncodingName {
    /// UTF-8 (including pure ASCII)
    Utf8,
    /// GBK / GB2312 simplified Chinese
    Gbk,
    /// ISO-8859-9 Turkish Latin
    Iso8859_9,
    /// A detected encoding the pipeline does not route (uppercased label)
    Unsupported(String),
    /// Nothing could be detected (empty sample, read failure)
    Unknown,
}

impl EncodingName {
    /// Canonicalise a raw detector label
    ///
    /// `ascii`/`utf-8` map to UTF-8, `gbk`/`gb2312` to GBK, `iso-8859-9` to
    /// ISO-8859-9, anything else to its uppercased label. A missing label is
    /// `Unknown`.
    pub fn from_label(label: Option<&str>) -> Self {
        let Some(label) = label.map(str::trim).filter(|l| !l.is_empty()) else {
            return Self::Unknown;
        };

        match label.to_ascii_lowercase().as_str() {
            "ascii" | "utf-8" | "utf8" => Self::Utf8,
            "gbk" | "gb2312" => Self::Gbk,
            "iso-8859-9" => Self::Iso8859_9,
            _ => Self::Unsupported(label.to_uppercase()),
        }
    }

    /// Display name used in logs and progress lines
    pub fn as_str(&self) -> &str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Gbk => "GBK",
            Self::Iso8859_9 => "ISO-8859-9",
            Self::Unsupported(label) => label,
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Whether the pipeline knows how to route this encoding
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Utf8 | Self::Gbk | Self::Iso8859_9)
    }

    /// The codec used to read and write this encoding
    pub fn codec(&self) -> Option<&'static Encoding> {
        match self {
            Self::Utf8 => Some(encoding_rs::UTF_8),
            Self::Gbk => Some(encoding_rs::GBK),
            // WHATWG maps the iso-8859-9 label onto windows-1254
            Self::Iso8859_9 => Some(encoding_rs::WINDOWS_1254),
            Self::Unsupported(_) | Self::Unknown => None,
        }
    }
}

impl fmt::Display for EncodingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a byte sample
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Raw lowercase label (`ascii`, `utf-8`, `gb2312`, `gbk`, `iso-8859-9`, ...)
    pub label: String,
    /// Confidence in `[0, 1]`
    pub confidence: f32,
}

impl Detection {
    /// Create a detection result
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Codec able to decode bytes carrying this label, if the label is known
    pub fn codec(&self) -> Option<&'static Encoding> {
        // WHATWG treats "ascii" as windows-1252; ASCII bytes are valid UTF-8
        if self.label.eq_ignore_ascii_case("ascii") {
            return Some(encoding_rs::UTF_8);
        }
        Encoding::for_label(self.label.as_bytes())
    }
}

/// Strategy deciding which encoding a run of bytes is in
pub trait LineClassifier: Send + Sync {
    /// Classify `bytes`, returning `None` when nothing can be said about them
    fn classify(&self, bytes: &[u8]) -> Option<Detection>;
}

/// Byte-statistics classifier for the encodings found in the source data
///
/// Valid UTF-8 is recognised structurally. For anything else two scores are
/// computed: the share of double-byte pairs that fall in the GB2312 hanzi and
/// symbol rows, and the share of high bytes that look like isolated Latin-5
/// letters between ASCII. The larger score wins and becomes the confidence.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticalSniffer;

impl StatisticalSniffer {
    /// Create a new sniffer
    pub fn new() -> Self {
        Self
    }
}

impl LineClassifier for StatisticalSniffer {
    fn classify(&self, bytes: &[u8]) -> Option<Detection> {
        if bytes.is_empty() {
            return None;
        }

        if bytes.starts_with(&[0xFF, 0xFE]) || bytes.starts_with(&[0xFE, 0xFF]) {
            return Some(Detection::new("utf-16", 1.0));
        }

        if bytes.is_ascii() {
            return Some(Detection::new("ascii", 1.0));
        }

        if std::str::from_utf8(bytes).is_ok() {
            return Some(Detection::new("utf-8", 0.99));
        }

        let gbk = gbk_score(bytes);
        let latin = latin5_score(bytes);

        if gbk.score <= 0.0 && latin <= 0.0 {
            return None;
        }

        if gbk.score >= latin {
            let label = if gbk.outside_gb2312 { "gbk" } else { "gb2312" };
            Some(Detection::new(label, gbk.score))
        } else {
            Some(Detection::new("iso-8859-9", latin))
        }
    }
}

struct GbkScore {
    score: f32,
    outside_gb2312: bool,
}

fn is_gbk_lead(byte: u8) -> bool {
    (0x81..=0xFE).contains(&byte)
}

fn is_gbk_trail(byte: u8) -> bool {
    (0x40..=0x7E).contains(&byte) || (0x80..=0xFE).contains(&byte)
}

fn gbk_score(bytes: &[u8]) -> GbkScore {
    let mut common = 0usize;
    let mut total = 0usize;
    let mut outside_gb2312 = false;
    let mut i = 0;

    while i < bytes.len() {
        let lead = bytes[i];
        if lead < 0x80 {
            i += 1;
            continue;
        }

        total += 1;
        match bytes.get(i + 1) {
            Some(&trail) if is_gbk_lead(lead) && is_gbk_trail(trail) => {
                let hanzi = (0xB0..=0xF7).contains(&lead) && (0xA1..=0xFE).contains(&trail);
                let symbol = (0xA1..=0xA9).contains(&lead) && (0xA1..=0xFE).contains(&trail);
                if hanzi || symbol {
                    common += 1;
                } else {
                    outside_gb2312 = true;
                }
                i += 2;
            }
            _ => i += 1,
        }
    }

    let score = if total == 0 {
        0.0
    } else {
        common as f32 / total as f32
    };

    GbkScore {
        score,
        outside_gb2312,
    }
}

fn latin5_score(bytes: &[u8]) -> f32 {
    let mut weight = 0.0f32;
    let mut high = 0usize;

    for (i, &byte) in bytes.iter().enumerate() {
        if byte < 0x80 {
            continue;
        }
        high += 1;

        let before_ascii = i == 0 || bytes[i - 1] < 0x80;
        let after_ascii = bytes.get(i + 1).is_none_or(|&b| b < 0x80);
        let isolated = before_ascii && after_ascii;

        weight += match byte {
            0x80..=0x9F => 0.0,
            0xD7 | 0xF7 => 0.2,
            0xC0..=0xFF if isolated => 1.0,
            0xC0..=0xFF => 0.3,
            _ if isolated => 0.6,
            _ => 0.2,
        };
    }

    if high == 0 {
        0.0
    } else {
        weight / high as f32 * 0.95
    }
}

/// Classify a sample and canonicalise the result
pub fn detect_encoding(sample: &[u8], classifier: &dyn LineClassifier) -> (EncodingName, f32) {
    match classifier.classify(sample) {
        Some(detection) => (
            EncodingName::from_label(Some(&detection.label)),
            detection.confidence,
        ),
        None => (EncodingName::Unknown, 0.0),
    }
}

/// Detect the encoding of a file from its first `sample_bytes` bytes
///
/// I/O failures degrade to `Unknown`.
pub fn sniff_file<P: AsRef<Path>>(
    path: P,
    sample_bytes: usize,
    classifier: &dyn LineClassifier,
) -> EncodingName {
    let path = path.as_ref();
    let sample = match read_sample(path, sample_bytes) {
        Ok(sample) => sample,
        Err(e) => {
            error!("Error detecting encoding for file {}: {}", path.display(), e);
            return EncodingName::Unknown;
        }
    };

    let truncated = sample.len() == sample_bytes;
    let sample = if truncated {
        trim_incomplete_utf8_tail(&sample)
    } else {
        &sample[..]
    };

    let (name, confidence) = detect_encoding(sample, classifier);
    debug!(
        "Detected {} for {} (confidence {:.2})",
        name,
        path.display(),
        confidence
    );
    name
}

fn read_sample(path: &Path, sample_bytes: usize) -> std::io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut sample = Vec::with_capacity(sample_bytes.min(64 * 1024));
    file.take(sample_bytes as u64).read_to_end(&mut sample)?;
    Ok(sample)
}

/// Drop a multi-byte UTF-8 sequence cut in half by the sample boundary
fn trim_incomplete_utf8_tail(sample: &[u8]) -> &[u8] {
    match std::str::from_utf8(sample) {
        Err(e) if e.error_len().is_none() => &sample[..e.valid_up_to()],
        _ => sample,
    }
}
