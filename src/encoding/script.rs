//! Detection of target-script (CJK Unified Ideographs) content.

/// Whether `c` lies in the CJK Unified Ideographs block (U+4E00..U+9FFF)
pub fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

/// Whether any character of `text` is a CJK unified ideograph
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk_ideograph)
}

/// Whether a cell has to be sent to translation: non-blank and containing CJK
pub fn needs_translation(text: &str) -> bool {
    !text.trim().is_empty() && contains_cjk(text)
}

/// Whether any of `lines` contains CJK text
pub fn lines_contain_cjk<S: AsRef<str>>(lines: &[S]) -> bool {
    lines.iter().any(|line| contains_cjk(line.as_ref()))
}
