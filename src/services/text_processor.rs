// Text Processing Service
// Shared tokenizer/segmenter used by every analyzer

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\w+\b").expect("word regex"))
}

fn sentence_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+").expect("sentence regex"))
}

fn spaced_sentence_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+\s+").expect("spaced sentence regex"))
}

fn paragraph_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("paragraph regex"))
}

fn sequence_noise_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s.!?]").expect("sequence noise regex"))
}

pub fn word_count(text: &str) -> usize {
    word_re().find_iter(text).count()
}

/// Split on runs of terminal punctuation. A text without any terminator is one sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    sentence_end_re()
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split on terminal punctuation followed by whitespace, so decimals and
/// inline abbreviations do not break a sentence.
pub fn split_sentences_spaced(text: &str) -> Vec<&str> {
    spaced_sentence_end_re()
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Paragraphs separated by one or more blank lines.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    paragraph_re()
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Lowercased tokens for n-gram modeling: punctuation other than sentence
/// terminators becomes a separator, and terminators are stripped from tokens.
pub fn sequence_tokens(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned = sequence_noise_re().replace_all(&lowered, " ");
    cleaned
        .split_whitespace()
        .map(|w| w.trim_matches(|c| c == '.' || c == '!' || c == '?'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Vowel-group syllable estimate with a silent-e adjustment. Never below 1.
pub fn count_syllables(word: &str) -> usize {
    let lowered = word.to_lowercase();
    let mut count: i64 = 0;
    let mut previous_was_vowel = false;
    for ch in lowered.chars() {
        let is_vowel = matches!(ch, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if is_vowel && !previous_was_vowel {
            count += 1;
        }
        previous_was_vowel = is_vowel;
    }
    if lowered.ends_with('e') {
        count -= 1;
    }
    count.max(1) as usize
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    /// 1-based first line of the block.
    pub start_line: usize,
    /// 1-based last line of the block.
    pub end_line: usize,
    pub text: String,
}

/// Build paragraph blocks with line ranges. Lines containing only whitespace
/// separate paragraphs.
pub fn build_paragraph_blocks(text: &str) -> Vec<TextBlock> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_start = 0usize;
    let mut line_total = 0usize;

    for (i, line) in text.split('\n').enumerate() {
        line_total = i + 1;
        if !line.trim().is_empty() {
            current.push(line);
            continue;
        }
        if !current.is_empty() {
            blocks.push(TextBlock {
                start_line: current_start + 1,
                end_line: i,
                text: current.join("\n"),
            });
            current.clear();
        }
        current_start = i + 1;
    }

    if !current.is_empty() {
        blocks.push(TextBlock {
            start_line: current_start + 1,
            end_line: line_total,
            text: current.join("\n"),
        });
    }

    blocks
}

/// Truncate to at most `max_chars` characters, appending "..." when cut.
pub fn preview(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

// ============ Statistics helpers ============

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n - 1). Zero for fewer than two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Population variance (n).
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Coefficient of variation using the sample standard deviation. Zero when the mean is zero.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m <= 0.0 {
        return 0.0;
    }
    sample_variance(values).sqrt() / m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_splits_on_apostrophes() {
        assert_eq!(word_count("We don't know."), 4);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("One two. Three four! Five six?? Seven");
        assert_eq!(sentences, vec!["One two", "Three four", "Five six", "Seven"]);
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn test_spaced_split_keeps_decimals() {
        let sentences = split_sentences_spaced("The value was 2.5 units. It rose.");
        assert_eq!(sentences, vec!["The value was 2.5 units", "It rose."]);
    }

    #[test]
    fn test_split_paragraphs_handles_whitespace_lines() {
        let text = "First paragraph.\n \nSecond paragraph.\n\n\nThird.";
        assert_eq!(split_paragraphs(text).len(), 3);
    }

    #[test]
    fn test_sequence_tokens_strip_terminators() {
        let tokens = sequence_tokens("The study, in short. Results (shown) here!");
        assert_eq!(tokens, vec!["the", "study", "in", "short", "results", "shown", "here"]);
    }

    #[test]
    fn test_count_syllables() {
        assert_eq!(count_syllables("the"), 1);
        assert_eq!(count_syllables("table"), 1);
        assert_eq!(count_syllables("analysis"), 4);
        assert_eq!(count_syllables("rhythm"), 1);
        assert_eq!(count_syllables("comprehensive"), 4);
    }

    #[test]
    fn test_build_paragraph_blocks_line_ranges() {
        let text = "Line one\nline two\n\nLine four\n\n\nLine seven";
        let blocks = build_paragraph_blocks(text);
        assert_eq!(blocks.len(), 3);
        assert_eq!((blocks[0].start_line, blocks[0].end_line), (1, 2));
        assert_eq!((blocks[1].start_line, blocks[1].end_line), (4, 4));
        assert_eq!((blocks[2].start_line, blocks[2].end_line), (7, 7));
        assert_eq!(blocks[0].text, "Line one\nline two");
    }

    #[test]
    fn test_preview_is_char_safe() {
        let s = "中".repeat(10);
        assert_eq!(preview(&s, 3), "中中中...");
        assert_eq!(preview("short", 10), "short");
    }

    #[test]
    fn test_variances() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_variance(&values) - 4.0).abs() < 1e-12);
        assert!((sample_variance(&values) - 32.0 / 7.0).abs() < 1e-12);
        assert_eq!(sample_variance(&[3.0]), 0.0);
        assert_eq!(coefficient_of_variation(&[5.0, 5.0, 5.0]), 0.0);
    }
}
