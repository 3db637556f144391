/*!
 * Sentence boundary detection for region text.
 *
 * Regions are segmented into sentences before translation because OCR lines
 * cut sentences at arbitrary points. The detector is rule based: a boundary
 * is a run of terminal punctuation, optional closing quotes or brackets,
 * whitespace, and then something that can open a sentence. A lone `.` after
 * a known abbreviation is not a boundary, and neither is one after an
 * initial that is part of a name ("J. Smith", "John F. Kennedy").
 *
 * Every sentence remembers the span it covers in the region text. Spans
 * partition the text (first span starts at 0, each span stops one character
 * short of the next span, the last one runs to the end), so sentence lengths
 * and line lengths always add up to the same total. The line reconstructor
 * depends on that.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::language_utils::normalize_to_part1;

/// Terminal punctuation run, trailing closers, then the separating whitespace
static BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([.!?…]+)["'”’»)\]]*(\s+)"#).expect("boundary pattern is valid")
});

/// Characters that may open a sentence besides uppercase letters and digits
const SENTENCE_OPENERS: &[char] = &['"', '\'', '“', '‘', '«', '(', '[', '¿', '¡', '„'];

/// Opening characters stripped before an abbreviation lookup
const LEADING_PUNCTUATION: &[char] = &['"', '\'', '“', '‘', '«', '(', '[', '„'];

const COMMON_ABBREVIATIONS: &[&str] = &["etc.", "vs.", "ca.", "cf.", "no.", "nr.", "st.", "dr.", "prof.", "vol.", "p.", "pp."];

const ENGLISH_ABBREVIATIONS: &[&str] = &[
    "mr.", "mrs.", "ms.", "sr.", "jr.", "mt.", "fig.", "approx.", "dept.", "gen.", "col.",
    "capt.", "lt.", "rev.", "hon.", "jan.", "feb.", "mar.", "apr.", "aug.", "sept.", "oct.",
    "nov.", "dec.",
];

const DUTCH_ABBREVIATIONS: &[&str] = &[
    "dhr.", "mevr.", "mej.", "mr.", "ir.", "ing.", "drs.", "bijv.", "blz.", "enz.", "jl.",
    "vlg.", "resp.", "pag.", "zg.", "wed.", "hr.", "afd.", "z.g.", "o.a.", "m.a.w.",
];

const FRENCH_ABBREVIATIONS: &[&str] = &["m.", "mme.", "mlle.", "mgr.", "pr.", "ste.", "env.", "av.", "bd."];

const GERMAN_ABBREVIATIONS: &[&str] = &[
    "hr.", "fr.", "bzw.", "str.", "usw.", "vgl.", "evtl.", "ggf.", "inkl.", "zb.", "dh.",
];

/// One sentence of a region, with the span it covers in the region text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// Sentence text without surrounding whitespace
    pub text: String,

    /// Character offset of the span in the region text
    pub start: usize,

    /// Length of the span in characters (Unicode scalar values)
    pub char_len: usize,

    /// Whitespace characters in front of `text` inside the span
    #[serde(default)]
    pub leading: usize,

    /// Exact translation-memory match, when one was found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_match: Option<String>,
}

impl Sentence {
    /// Whether a cached translation replaces machine translation for this sentence
    pub fn has_full_match(&self) -> bool {
        self.full_match.is_some()
    }
}

/// Language-aware sentence segmenter
#[derive(Debug, Clone)]
pub struct SentenceSegmenter {
    /// Language the abbreviation list was built for
    language: String,

    /// Lowercase abbreviations including the trailing dot
    abbreviations: HashSet<&'static str>,
}

impl SentenceSegmenter {
    /// Create a segmenter for the given language code.
    ///
    /// Unknown languages fall back to the language-independent abbreviations.
    pub fn new(language: &str) -> Self {
        let language = normalize_to_part1(language).unwrap_or_else(|_| language.trim().to_lowercase());

        let specific: &[&'static str] = match language.as_str() {
            "en" => ENGLISH_ABBREVIATIONS,
            "nl" => DUTCH_ABBREVIATIONS,
            "fr" => FRENCH_ABBREVIATIONS,
            "de" => GERMAN_ABBREVIATIONS,
            _ => &[],
        };

        let abbreviations = COMMON_ABBREVIATIONS
            .iter()
            .chain(specific.iter())
            .copied()
            .collect();

        Self {
            language,
            abbreviations,
        }
    }

    /// Language this segmenter was built for
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Lazily split `text` into sentences.
    ///
    /// The returned iterator is cheap to clone; a clone restarts from the
    /// position it was cloned at.
    pub fn segment<'a>(&'a self, text: &'a str) -> Sentences<'a> {
        Sentences {
            segmenter: self,
            text,
            byte_pos: 0,
            char_pos: 0,
        }
    }

    /// Byte offset where the sentence following `from` starts, if any
    fn next_boundary(&self, text: &str, from: usize) -> Option<usize> {
        let mut search = from;

        while let Some(caps) = BOUNDARY.captures_at(text, search) {
            let whole = caps.get(0)?;
            let terminators = caps.get(1)?;
            let next_start = whole.end();

            let next_char = text[next_start..].chars().next()?;

            if self.is_boundary(text, terminators.start(), terminators.as_str(), next_char) {
                return Some(next_start);
            }

            search = next_start;
        }

        None
    }

    fn is_boundary(&self, text: &str, terminator_start: usize, terminators: &str, next_char: char) -> bool {
        if !(next_char.is_uppercase() || next_char.is_numeric() || SENTENCE_OPENERS.contains(&next_char)) {
            return false;
        }

        if terminators != "." {
            return true;
        }

        let token = text[..terminator_start]
            .split_whitespace()
            .next_back()
            .unwrap_or("")
            .trim_start_matches(LEADING_PUNCTUATION);

        if token.is_empty() {
            return true;
        }

        // Dotted abbreviations ("U.S.", "o.a.")
        if token.contains('.') {
            return false;
        }

        if is_initial(token) && Self::starts_name(text, terminator_start, token) {
            return false;
        }

        !self.is_abbreviation(token)
    }

    fn is_abbreviation(&self, token: &str) -> bool {
        let candidate = format!("{}.", token.to_lowercase());
        self.abbreviations.contains(candidate.as_str())
    }

    /// Whether the initial `token` ending at `terminator_start` belongs to a name.
    ///
    /// "J. Smith", "John F. Kennedy", "Mr. J. Smith" and "J. R. R. Tolkien" do;
    /// "plan B. Then" and "It was I. Then" do not.
    fn starts_name(text: &str, terminator_start: usize, token: &str) -> bool {
        let before_initial = &text[..terminator_start - token.len()];
        let previous = before_initial
            .split_whitespace()
            .next_back()
            .map(|word| word.trim_start_matches(LEADING_PUNCTUATION));

        let previous = match previous {
            None => return true,
            Some(word) => word,
        };

        // Another initial, a title, or the end of the previous sentence
        if previous.ends_with(['.', '!', '?', ':', ';']) {
            return true;
        }

        let next_is_initial = text[terminator_start + 1..]
            .split_whitespace()
            .next()
            .and_then(|word| word.strip_suffix('.'))
            .is_some_and(is_initial);

        next_is_initial || is_capitalised_word(previous)
    }
}

/// A single uppercase letter
fn is_initial(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(first), None) if first.is_uppercase())
}

/// A word of two or more letters starting with an uppercase letter
fn is_capitalised_word(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => {
            let rest: Vec<char> = chars.collect();
            !rest.is_empty() && rest.iter().all(|c| c.is_alphabetic() || *c == '-')
        }
        _ => false,
    }
}

/// Iterator over the sentences of one region text
#[derive(Debug, Clone)]
pub struct Sentences<'a> {
    segmenter: &'a SentenceSegmenter,
    text: &'a str,
    byte_pos: usize,
    char_pos: usize,
}

impl Iterator for Sentences<'_> {
    type Item = Sentence;

    fn next(&mut self) -> Option<Sentence> {
        if self.byte_pos >= self.text.len() {
            return None;
        }

        if self.byte_pos == 0 && self.text.trim().is_empty() {
            self.byte_pos = self.text.len();
            return None;
        }

        let span_start = self.byte_pos;
        let (span_end, next_pos) = match self.segmenter.next_boundary(self.text, span_start) {
            Some(next_start) => {
                // The last separating whitespace character belongs to neither span
                let separator = self.text[..next_start]
                    .char_indices()
                    .next_back()
                    .map(|(i, _)| i)
                    .unwrap_or(next_start);
                (separator, next_start)
            }
            None => (self.text.len(), self.text.len()),
        };

        let span = &self.text[span_start..span_end];
        let char_len = span.chars().count();
        let leading = span.chars().take_while(|c| c.is_whitespace()).count();

        let sentence = Sentence {
            text: span.trim().to_string(),
            start: self.char_pos,
            char_len,
            leading,
            full_match: None,
        };

        self.char_pos += char_len + 1;
        self.byte_pos = next_pos;

        Some(sentence)
    }
}
