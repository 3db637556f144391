/*!
 * Tests for language code utilities
 */

use pagetrans::language_utils::{
    get_language_name, language_codes_match, langpair, normalize_to_part1, validate_language_code,
};

#[test]
fn test_normalizeToPart1_withEveryCodeForm_shouldReturnTwoLetterCode() {
    assert_eq!(normalize_to_part1("fr").unwrap(), "fr");
    assert_eq!(normalize_to_part1("fra").unwrap(), "fr");
    assert_eq!(normalize_to_part1("fre").unwrap(), "fr");
    assert_eq!(normalize_to_part1(" DE ").unwrap(), "de");
}

#[test]
fn test_normalizeToPart1_withUnknownCode_shouldFail() {
    assert!(normalize_to_part1("zz").is_err());
    assert!(normalize_to_part1("english").is_err());
    assert!(validate_language_code("").is_err());
}

#[test]
fn test_languageCodesMatch_acrossCodeForms_shouldMatch() {
    assert!(language_codes_match("nl", "dut"));
    assert!(language_codes_match("nld", "NL"));
    assert!(!language_codes_match("nl", "en"));
    assert!(!language_codes_match("xx", "xx"));
}

#[test]
fn test_getLanguageName_shouldReturnEnglishName() {
    assert_eq!(get_language_name("en").unwrap(), "English");
    assert_eq!(get_language_name("ger").unwrap(), "German");
}

#[test]
fn test_langpair_shouldJoinLowercaseCodes() {
    assert_eq!(langpair("EN", "nl"), "en-nl");
}
