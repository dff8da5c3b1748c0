//! Greedy word wrap with highlight-phrase attribution.

use crate::text::engine::MeasureText;
use crate::text::font::ResolvedFont;

/// Characters trimmed from both ends of a word before phrase comparison.
pub const PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ';', ':', '"', '\'', '(', ')', '-', '\u{2013}', '\u{2014}',
];

/// One wrapped line and the highlight phrases found on it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WrappedLine {
    pub text: String,
    pub highlights: Vec<String>,
}

impl WrappedLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlights: Vec::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Trim surrounding punctuation from a word.
pub fn strip_punct(word: &str) -> &str {
    word.trim_matches(PUNCTUATION)
}

/// Lowercased, punctuation-stripped tokens of `text`.
pub fn normalized_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| strip_punct(&w.to_lowercase()).to_owned())
        .collect()
}

/// Greedy wrap of `text` into lines no wider than `max_width_px`.
///
/// A word wider than the budget is placed alone on its own line; words are never split.
pub fn wrap_text(
    text: &str,
    highlights: &[String],
    max_width_px: f32,
    font: &ResolvedFont,
    measure: &mut dyn MeasureText,
) -> Vec<WrappedLine> {
    let space_w = measure.measure(" ", font);

    let mut lines = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_w = 0.0f32;

    for word in text.split_whitespace() {
        let word_w = measure.measure(word, font);
        let gap = if current.is_empty() { 0.0 } else { space_w };
        let test_w = current_w + word_w + gap;

        if test_w > max_width_px && !current.is_empty() {
            lines.push(finish_line(&current, highlights));
            current.clear();
            current.push(word);
            current_w = word_w;
        } else {
            current.push(word);
            current_w = test_w;
        }
    }

    if !current.is_empty() {
        lines.push(finish_line(&current, highlights));
    }
    lines
}

fn finish_line(words: &[&str], highlights: &[String]) -> WrappedLine {
    let text = words.join(" ");
    let highlights = highlights_in_line(&text, highlights);
    WrappedLine { text, highlights }
}

/// Highlight phrases that occur in `line`.
///
/// Single-word phrases match a whole token; multi-word phrases match as a substring of the
/// normalized line. Comparison ignores case and surrounding punctuation.
pub fn highlights_in_line(line: &str, highlights: &[String]) -> Vec<String> {
    let line_words = normalized_words(line);
    let line_joined = line_words.join(" ");

    highlights
        .iter()
        .filter(|phrase| {
            let phrase_words = normalized_words(phrase);
            match phrase_words.as_slice() {
                [] => false,
                [single] => line_words.iter().any(|w| w == single),
                many => line_joined.contains(&many.join(" ")),
            }
        })
        .cloned()
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/text/wrap.rs"]
mod tests;
