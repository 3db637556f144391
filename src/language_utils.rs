use anyhow::{Result, anyhow};
use isolang::Language;

// Language utilities for ISO language code handling.
//
// The MT backend expects two-letter ISO 639-1 codes and the TM backend keys
// its units by a `source-target` language pair, so every code that enters a
// job is normalized here first. Three-letter ISO 639-2 codes (both the /T and
// the bibliographic /B variants) are accepted on input.

/// Map an ISO 639-2/B code to its ISO 639-2/T counterpart, if it differs
fn bibliographic_to_terminology(code: &str) -> Option<&'static str> {
    let mapped = match code {
        "fre" => "fra",
        "ger" => "deu",
        "dut" => "nld",
        "gre" => "ell",
        "chi" => "zho",
        "cze" => "ces",
        "ice" => "isl",
        "alb" => "sqi",
        "arm" => "hye",
        "baq" => "eus",
        "bur" => "mya",
        "per" => "fas",
        "geo" => "kat",
        "may" => "msa",
        "mac" => "mkd",
        "rum" => "ron",
        "slo" => "slk",
        "wel" => "cym",
        _ => return None,
    };
    Some(mapped)
}

/// Resolve any accepted code form to an isolang `Language`
fn lookup_language(code: &str) -> Option<Language> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 => Language::from_639_1(&normalized_code),
        3 => {
            let part2t = bibliographic_to_terminology(&normalized_code).unwrap_or(normalized_code.as_str());
            Language::from_639_3(part2t)
        }
        _ => None,
    }
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<()> {
    lookup_language(code)
        .map(|_| ())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to lowercase ISO 639-1 (2-letter) format
///
/// Languages without a two-letter code cannot be sent to the MT backend and
/// are rejected.
pub fn normalize_to_part1(code: &str) -> Result<String> {
    let lang = lookup_language(code).ok_or_else(|| anyhow!("Invalid language code: {}", code))?;

    lang.to_639_1()
        .map(|c| c.to_string())
        .ok_or_else(|| anyhow!("Language has no ISO 639-1 code: {}", code))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (lookup_language(code1), lookup_language(code2)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let lang = lookup_language(code).ok_or_else(|| anyhow!("Invalid language code: {}", code))?;
    Ok(lang.to_name().to_string())
}

/// Build the `source-target` pair the TM backend indexes translation units by
pub fn langpair(source_language: &str, target_language: &str) -> String {
    format!(
        "{}-{}",
        source_language.trim().to_lowercase(),
        target_language.trim().to_lowercase()
    )
}
