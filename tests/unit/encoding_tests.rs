/*!
 * Tests for encoding detection and mixed-encoding decoding
 */

use anyhow::Result;
use csvbridge::encoding::sniffer::{detect_encoding, sniff_file};
use csvbridge::encoding::{
    contains_cjk, needs_translation, Detection, EncodingName, LineClassifier, MixedEncodingDecoder,
    StatisticalSniffer,
};
use crate::common;

#[test]
fn test_classify_withAscii_shouldReportAscii() {
    let detection = StatisticalSniffer::new().classify(b"id,name,city").unwrap();
    assert_eq!(detection.label, "ascii");
    assert_eq!(detection.confidence, 1.0);
}

#[test]
fn test_classify_withGbkHanzi_shouldReportGb2312() {
    let bytes = common::gbk("1,你好,世界");
    let detection = StatisticalSniffer::new().classify(&bytes).unwrap();
    assert_eq!(EncodingName::from_label(Some(&detection.label)), EncodingName::Gbk);
    assert!(detection.confidence > 0.9);
}

#[test]
fn test_classify_withTurkishLetters_shouldReportLatin5() {
    let bytes = common::latin5("2,Şehir,Çağrı");
    let detection = StatisticalSniffer::new().classify(&bytes).unwrap();
    assert_eq!(detection.label, "iso-8859-9");
    assert!(detection.confidence > 0.5);
}

#[test]
fn test_classify_withUtf16Bom_shouldBeUnsupported() {
    let (name, _) = detect_encoding(&[0xFF, 0xFE, b'a', 0x00], &StatisticalSniffer::new());
    assert_eq!(name, EncodingName::Unsupported("UTF-16".to_string()));
    assert!(!name.is_supported());
}

#[test]
fn test_sniffFile_withEmptyFile_shouldBeUnknown() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "empty.csv", b"")?;
    assert_eq!(
        sniff_file(&path, 10_000, &StatisticalSniffer::new()),
        EncodingName::Unknown
    );
    Ok(())
}

#[test]
fn test_sniffFile_withMissingFile_shouldBeUnknown() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("missing.csv");
    assert_eq!(
        sniff_file(&path, 10_000, &StatisticalSniffer::new()),
        EncodingName::Unknown
    );
    Ok(())
}

#[test]
fn test_sniffFile_withSampleCutInsideUtf8Char_shouldStayUtf8() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    // "ab" then a 3-byte character: a 4-byte sample cuts it in half
    let path = common::create_test_file(temp_dir.path(), "cut.csv", "ab你好".as_bytes())?;
    assert_eq!(
        sniff_file(&path, 4, &StatisticalSniffer::new()),
        EncodingName::Utf8
    );
    Ok(())
}

#[test]
fn test_decodeBytes_withMixedLines_shouldDecodeEachLineInItsOwnEncoding() {
    let mut bytes = b"id,name\n".to_vec();
    bytes.extend(common::gbk("1,你好\n"));
    bytes.extend("2,世界\n".as_bytes());
    bytes.extend(common::latin5("3,Şehir\n"));

    let lines = MixedEncodingDecoder::new().decode_bytes(&bytes);

    assert_eq!(lines, vec!["id,name", "1,你好", "2,世界", "3,Şehir"]);
}

#[test]
fn test_decodeBytes_withCrLfAndNoFinalNewline_shouldKeepLineCount() {
    let lines = MixedEncodingDecoder::new().decode_bytes(b"a,b\r\nc,d\r\ne,f");
    assert_eq!(lines, vec!["a,b", "c,d", "e,f"]);
}

#[test]
fn test_decodeBytes_withBom_shouldStripItFromFirstLine() {
    let lines = MixedEncodingDecoder::new().decode_bytes("\u{FEFF}id,名字\n".as_bytes());
    assert_eq!(lines, vec!["id,名字"]);
}

#[test]
fn test_decodeBytes_withGarbageBytes_shouldKeepOneStringPerLine() {
    let bytes = [0x80, 0x81, b'\n', 0xFF, b'\n', 0x00, b'\n', 0xA1];
    let lines = MixedEncodingDecoder::new().decode_bytes(&bytes);
    assert_eq!(lines.len(), 4);
}

#[test]
fn test_decodeBytes_withEmptyInput_shouldReturnNoLines() {
    assert!(MixedEncodingDecoder::new().decode_bytes(b"").is_empty());
}

/// Classifier that never recognises anything
struct Clueless;

impl LineClassifier for Clueless {
    fn classify(&self, _bytes: &[u8]) -> Option<Detection> {
        None
    }
}

#[test]
fn test_decodeBytes_withUndetectableLine_shouldFallBackToUtf8WithReplacement() {
    let decoder = MixedEncodingDecoder::with_classifier(Clueless);
    let lines = decoder.decode_bytes(&[b'a', 0xFF, b'b', b'\n']);
    assert_eq!(lines, vec!["a\u{FFFD}b"]);
}

/// Classifier that is never sure of itself
struct Unsure;

impl LineClassifier for Unsure {
    fn classify(&self, _bytes: &[u8]) -> Option<Detection> {
        Some(Detection::new("gbk", 0.1))
    }
}

#[test]
fn test_decodeBytes_withLowConfidence_shouldUseUtf8() {
    let decoder = MixedEncodingDecoder::with_classifier(Unsure).with_min_confidence(0.5);
    let lines = decoder.decode_bytes("1,世界\n".as_bytes());
    assert_eq!(lines, vec!["1,世界"]);
}

#[test]
fn test_decodeFile_shouldReadAndDecode() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut content = b"h\n".to_vec();
    content.extend(common::gbk("中文\n"));
    let path = common::create_test_file(temp_dir.path(), "mixed.csv", &content)?;

    let lines = MixedEncodingDecoder::new().decode_file(&path)?;
    assert_eq!(lines, vec!["h", "中文"]);
    Ok(())
}

#[test]
fn test_scriptChecks_shouldSeparateCjkFromLatin() {
    assert!(contains_cjk("Order 订单"));
    assert!(!contains_cjk("Şehir"));
    assert!(needs_translation(" 你好 "));
    assert!(!needs_translation("   "));
    assert!(!needs_translation("plain"));
}
