/*!
 * Tests for language tag utilities
 */

use csvbridge::language_utils::{
    get_language_name, language_codes_match, split_language_tag, validate_language_tag,
};

#[test]
fn test_splitLanguageTag_shouldSeparateRegion() {
    assert_eq!(split_language_tag("zh-CN"), ("zh", Some("CN")));
    assert_eq!(split_language_tag("en"), ("en", None));
}

#[test]
fn test_validateLanguageTag_withThreeLetterCode_shouldAccept() {
    assert!(validate_language_tag("tur").is_ok());
    assert!(validate_language_tag("zho-Hans").is_ok());
}

#[test]
fn test_validateLanguageTag_withEmptySubtag_shouldReject() {
    assert!(validate_language_tag("zh-").is_err());
    assert!(validate_language_tag("").is_err());
}

#[test]
fn test_getLanguageName_shouldReturnEnglishName() {
    assert_eq!(get_language_name("tr").unwrap(), "Turkish");
    assert_eq!(get_language_name("en-US").unwrap(), "English");
}

#[test]
fn test_languageCodesMatch_acrossCodeSets() {
    assert!(language_codes_match("zh-CN", "zho"));
    assert!(language_codes_match("en", "en-GB"));
    assert!(!language_codes_match("en", "tr"));
    assert!(!language_codes_match("xx", "xx"));
}
