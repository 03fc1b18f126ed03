// Segment Builder
// Re-scores each paragraph block on its own and keeps the ones that stand out

use crate::models::TextSegment;
use crate::services::text_processor::{build_paragraph_blocks, preview, TextBlock};
use super::lexical::{LexicalAnalyzer, LexicalReport};

const PREVIEW_CHARS: usize = 200;
const MAX_SEGMENT_WORDS: usize = 5;

/// Build a segment for one block if its own lexical confidence crosses the flag line.
pub fn make_segment(analyzer: &LexicalAnalyzer, block: &TextBlock) -> Option<TextSegment> {
    let tuning = analyzer.tuning();
    if block.text.trim().chars().count() < tuning.flag_min_chars {
        return None;
    }

    let report = analyzer.analyze(&block.text);
    if report.confidence <= tuning.flag_confidence {
        return None;
    }

    Some(TextSegment {
        start_line: block.start_line,
        end_line: block.end_line,
        content: preview(&block.text, PREVIEW_CHARS),
        confidence: report.confidence,
        patterns: segment_patterns(&report),
        ai_words: top_words(&report),
    })
}

pub fn build_flagged_sections(analyzer: &LexicalAnalyzer, text: &str) -> Vec<TextSegment> {
    build_paragraph_blocks(text)
        .iter()
        .filter_map(|block| make_segment(analyzer, block))
        .collect()
}

fn segment_patterns(report: &LexicalReport) -> Vec<String> {
    let mut patterns = Vec::new();
    if report.scores.sentence > 60.0 {
        patterns.push("Uniform sentence structure".to_string());
    }
    if report.scores.word_frequency > 60.0 {
        patterns.push("AI-typical words".to_string());
    }
    if report.scores.grammar > 60.0 {
        patterns.push("Excessive perfection".to_string());
    }
    patterns
}

/// Most frequent marker words first, only when the marker score is high.
fn top_words(report: &LexicalReport) -> Vec<String> {
    if report.scores.word_frequency <= 60.0 {
        return Vec::new();
    }
    let mut words: Vec<(&String, &usize)> = report.ai_words_found.iter().collect();
    words.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    words
        .into_iter()
        .take(MAX_SEGMENT_WORDS)
        .map(|(w, _)| w.clone())
        .collect()
}
