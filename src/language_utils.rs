//! Language utilities for language tags such as `zh-CN` or `en`
//!
//! The primary subtag must be an ISO 639-1 (2-letter) or ISO 639-3 (3-letter)
//! code; an optional region or script subtag after `-` or `_` is accepted as is.

use anyhow::{anyhow, Result};
use isolang::Language;

/// Split a tag into its primary language subtag and the optional rest
pub fn split_language_tag(tag: &str) -> (&str, Option<&str>) {
    let tag = tag.trim();
    match tag.find(['-', '_']) {
        Some(index) => (&tag[..index], Some(&tag[index + 1..])),
        None => (tag, None),
    }
}

/// Resolve the primary subtag of `tag` to a language
pub fn primary_language(tag: &str) -> Result<Language> {
    let (primary, _) = split_language_tag(tag);
    let primary = primary.to_lowercase();

    let language = match primary.len() {
        2 => Language::from_639_1(&primary),
        3 => Language::from_639_3(&primary),
        _ => None,
    };

    language.ok_or_else(|| anyhow!("Invalid language code: {}", tag))
}

/// Validate a language tag, rejecting empty subtags
pub fn validate_language_tag(tag: &str) -> Result<()> {
    let (_, rest) = split_language_tag(tag);
    if rest.is_some_and(|r| r.is_empty() || !r.chars().all(|c| c.is_ascii_alphanumeric())) {
        return Err(anyhow!("Invalid language subtag in: {}", tag));
    }
    primary_language(tag).map(|_| ())
}

/// Get the language name from a tag
pub fn get_language_name(tag: &str) -> Result<String> {
    Ok(primary_language(tag)?.to_name().to_string())
}

/// Check if two tags name the same primary language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (primary_language(code1), primary_language(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
