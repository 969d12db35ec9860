//! Stateless text heuristics shared by the extractor and the admission chain.
//!
//! - Keyword validity ([`is_valid_keyword`])
//! - Case-insensitive deduplication ([`dedup_case_insensitive`])
//! - Whole-word keyword matching ([`KeywordMatcher`])
//! - Best-text selection among language variants ([`select_text`])

use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Language tags accepted as English.
pub const ENGLISH_TAGS: &[&str] = &["en", "eng", "en-us", "en-gb"];

/// Minimum trimmed length for a title/abstract variant to be preferred.
pub const MIN_SELECTED_TEXT_CHARS: usize = 40;

/// Minimum trimmed length of a keyword.
pub const MIN_KEYWORD_CHARS: usize = 3;

/// Accented Latin letters that disqualify a keyword.
const DIACRITICS: &str = "äöüÄÖÜßñÑéáíóúÁÉÍÓÚçÇ";

static ASCII_TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 \-–/&%\.]*[A-Za-z0-9%]$")
        .expect("keyword pattern is valid")
});

/// Returns `true` if `tag` names an English variant (case-insensitive).
pub fn is_english_tag(tag: &str) -> bool {
    let tag = tag.trim().to_lowercase();
    ENGLISH_TAGS.contains(&tag.as_str())
}

// ============================================================================
// Keyword Validity
// ============================================================================

/// Tests whether a candidate keyword qualifies for the corpus.
///
/// After trimming, the keyword must be at least [`MIN_KEYWORD_CHARS`] long,
/// contain whitespace when `multiword_only` is set, carry none of the
/// [`DIACRITICS`], and match the permissive ASCII term pattern.
pub fn is_valid_keyword(candidate: &str, multiword_only: bool) -> bool {
    let s = candidate.trim();
    if s.chars().count() < MIN_KEYWORD_CHARS {
        return false;
    }
    if multiword_only && !s.contains(char::is_whitespace) {
        return false;
    }
    if s.chars().any(|c| DIACRITICS.contains(c)) {
        return false;
    }
    ASCII_TERM.is_match(s)
}

/// Keeps the valid keywords of `keywords`, deduplicated case-insensitively.
pub fn filter_valid_keywords<S: AsRef<str>>(keywords: &[S], multiword_only: bool) -> Vec<String> {
    dedup_case_insensitive(
        keywords
            .iter()
            .map(AsRef::as_ref)
            .filter(|k| is_valid_keyword(k, multiword_only)),
    )
}

/// Deduplicates by lower-cased trimmed form.
///
/// Keeps the first-seen spelling (trimmed) and the order of first occurrence.
pub fn dedup_case_insensitive<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let trimmed = item.as_ref().trim();
        if seen.insert(trimmed.to_lowercase()) {
            out.push(trimmed.to_string());
        }
    }
    out
}

// ============================================================================
// Boundary Matching
// ============================================================================

/// Case-insensitive whole-word matcher for one keyword.
///
/// Internal whitespace in the keyword matches one or more whitespace
/// characters in the text. A match must not be flanked by a word character.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    regex: Regex,
}

impl KeywordMatcher {
    /// Builds a matcher for `term`. Returns `None` for a blank term.
    pub fn new(term: &str) -> Option<Self> {
        let parts: Vec<String> = term.split_whitespace().map(regex::escape).collect();
        if parts.is_empty() {
            return None;
        }
        let regex = RegexBuilder::new(&parts.join(r"\s+"))
            .case_insensitive(true)
            .build()
            .ok()?;
        Some(Self { regex })
    }

    /// Returns `true` if the keyword occurs in `text` as a whole word.
    pub fn is_match(&self, text: &str) -> bool {
        let mut pos = 0;
        while let Some(m) = self.regex.find_at(text, pos) {
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            if !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char) {
                return true;
            }
            // Retry from the next character; a later start may sit on a boundary.
            match text[m.start()..].chars().next() {
                Some(c) => pos = m.start() + c.len_utf8(),
                None => break,
            }
        }
        false
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Returns `true` if `keyword` occurs in `text` as a whole word.
pub fn keyword_in_text(keyword: &str, text: &str) -> bool {
    KeywordMatcher::new(keyword).is_some_and(|m| m.is_match(text))
}

/// Keeps the keywords that occur in `text`, deduplicated case-insensitively.
pub fn filter_keywords_present_in_text<S: AsRef<str>>(keywords: &[S], text: &str) -> Vec<String> {
    dedup_case_insensitive(
        keywords
            .iter()
            .map(AsRef::as_ref)
            .filter(|k| keyword_in_text(k, text)),
    )
}

// ============================================================================
// Text Selection
// ============================================================================

/// One language-tagged text candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextCandidate<'a> {
    pub text: &'a str,
    pub lang: Option<&'a str>,
}

/// One rule of the ordered selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRule {
    /// First English-tagged candidate of at least [`MIN_SELECTED_TEXT_CHARS`]
    EnglishMinLength,

    /// Longest candidate of at least [`MIN_SELECTED_TEXT_CHARS`] (first wins ties)
    LongestMinLength,

    /// The first candidate, whatever its length
    First,
}

/// Policy used for titles.
pub const TITLE_POLICY: &[SelectionRule] = &[
    SelectionRule::EnglishMinLength,
    SelectionRule::LongestMinLength,
    SelectionRule::First,
];

/// Policy used for abstracts; there is no unconditional fallback.
pub const ABSTRACT_POLICY: &[SelectionRule] = &[
    SelectionRule::EnglishMinLength,
    SelectionRule::LongestMinLength,
];

impl SelectionRule {
    /// Applies this rule alone. Returned text is trimmed and never empty.
    pub fn apply(self, candidates: &[TextCandidate<'_>]) -> Option<String> {
        let long_enough = || {
            candidates
                .iter()
                .map(|c| (c.text.trim(), c.lang))
                .filter(|(t, _)| t.chars().count() >= MIN_SELECTED_TEXT_CHARS)
        };
        let picked = match self {
            SelectionRule::EnglishMinLength => long_enough()
                .find(|(_, lang)| lang.is_some_and(is_english_tag))
                .map(|(t, _)| t),
            SelectionRule::LongestMinLength => {
                long_enough().fold(None, |best: Option<&str>, (t, _)| match best {
                    Some(b) if b.chars().count() >= t.chars().count() => Some(b),
                    _ => Some(t),
                })
            }
            SelectionRule::First => candidates.first().map(|c| c.text.trim()),
        };
        picked.filter(|t| !t.is_empty()).map(str::to_string)
    }
}

/// Returns the value of the first rule in `policy` that produces one.
pub fn select_text(candidates: &[TextCandidate<'_>], policy: &[SelectionRule]) -> Option<String> {
    policy.iter().find_map(|rule| rule.apply(candidates))
}

// ============================================================================
// Tests
// ============================================================================
