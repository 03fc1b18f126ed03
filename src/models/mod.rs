// AI-Check Data Models
// Records produced by the detection engine and consumed by its collaborators

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============ Decision Contract ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    ApproveWithWarning,
    Block,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::ApproveWithWarning => "approve_with_warning",
            Self::Block => "block",
        }
    }
}

// ============ Lexical Detection ============

/// The five lexical sub-scores, each in [0, 100].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LexicalScores {
    pub grammar: f64,
    pub sentence: f64,
    pub paragraph: f64,
    pub word_frequency: f64,
    pub punctuation: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextStatistics {
    pub total_words: usize,
    pub ai_words_per_1000: f64,
    pub avg_sentence_length: f64,
    pub sentence_length_variance: f64,
}

/// A paragraph-sized span that scored high on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextSegment {
    /// 1-based, inclusive.
    pub start_line: usize,
    pub end_line: usize,
    pub content: String,
    pub confidence: f64,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub ai_words: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub file_path: String,
    pub timestamp: DateTime<Utc>,
    pub overall_confidence: f64,
    pub decision: Decision,
    pub scores: LexicalScores,
    #[serde(default)]
    pub ai_words_found: BTreeMap<String, usize>,
    #[serde(default)]
    pub patterns_detected: Vec<String>,
    #[serde(default)]
    pub flagged_sections: Vec<TextSegment>,
    pub statistics: TextStatistics,
}

// ============ Sequence Model ============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnusualNgram {
    pub tokens: Vec<String>,
    /// Reference probability for rare sequences, observed share for over-repeated ones.
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepeatedPhrase {
    pub phrase: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SequenceModelResult {
    pub bigram_score: f64,
    pub trigram_score: f64,
    pub transition_anomaly_score: f64,
    pub repetition_score: f64,
    pub overall_score: f64,
    pub perplexity: f64,
    #[serde(default)]
    pub unusual_bigrams: Vec<UnusualNgram>,
    #[serde(default)]
    pub unusual_trigrams: Vec<UnusualNgram>,
    #[serde(default)]
    pub repetitive_phrases: Vec<RepeatedPhrase>,
}

// ============ Complexity ============

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityResult {
    pub flesch_kincaid_grade: f64,
    pub gunning_fog_index: f64,
    pub avg_sentence_length: f64,
    pub avg_word_length: f64,
    pub complexity_variance: f64,
    pub uniformity_score: f64,
    /// Flesch reading ease, clamped to [0, 100].
    pub readability_score: f64,
    pub overall_ai_score: f64,
    #[serde(default)]
    pub sentence_complexities: Vec<f64>,
}

// ============ Citations ============

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CitationResult {
    pub total_citations: usize,
    pub unique_citations: usize,
    pub citation_density: f64,
    pub front_loading_score: f64,
    pub generic_frame_score: f64,
    pub cluster_score: f64,
    pub citation_diversity: f64,
    pub overall_ai_score: f64,
    #[serde(default)]
    pub generic_frames_found: Vec<String>,
    #[serde(default)]
    pub citation_positions: Vec<usize>,
    #[serde(default)]
    pub citation_contexts: Vec<String>,
}

// ============ Enhanced Detection ============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedDetectionResult {
    pub base: DetectionResult,
    /// Final confidence after the optional author-profile adjustment.
    pub overall_confidence: f64,
    pub base_confidence: f64,
    pub enhanced_confidence: f64,
    pub adaptive_adjustment: f64,
    pub decision: Decision,
    pub assessment: String,
    pub sequence_model: SequenceModelResult,
    pub complexity: ComplexityResult,
    pub citations: CitationResult,
    pub profile_used: bool,
    #[serde(default)]
    pub persistence_warnings: Vec<String>,
    pub detection_version: String,
}

// ============ Suggestions ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCategory {
    WordChoice,
    SentenceStructure,
    ParagraphFlow,
    WritingStyle,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub category: SuggestionCategory,
    pub issue: String,
    pub suggestion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_after: Option<String>,
    /// Plainer replacements per flagged marker word.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub alternatives: BTreeMap<String, Vec<String>>,
    pub priority: Priority,
}

// ============ Author Profile ============

/// Rolling writing baseline for one author. Persisted with snake_case keys.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AuthorProfile {
    pub samples: u64,
    #[serde(default)]
    pub total_complexity_variance: f64,
    #[serde(default)]
    pub avg_complexity_variance: f64,
    #[serde(default)]
    pub total_perplexity: f64,
    #[serde(default)]
    pub avg_perplexity: f64,
}

impl AuthorProfile {
    /// Fold one analysis into the running totals. Averages are always recomputed
    /// from totals so they cannot drift.
    pub fn record(&mut self, complexity_variance: f64, perplexity: f64) {
        self.samples += 1;
        self.total_complexity_variance += complexity_variance;
        self.total_perplexity += perplexity;
        let n = self.samples as f64;
        self.avg_complexity_variance = self.total_complexity_variance / n;
        self.avg_perplexity = self.total_perplexity / n;
    }
}

// ============ History ============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub file_path: String,
    pub git_commit: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub overall_confidence: f64,
    pub grammar_score: f64,
    pub sentence_score: f64,
    pub paragraph_score: f64,
    pub word_frequency_score: f64,
    pub punctuation_score: f64,
    #[serde(default)]
    pub ai_words_found: BTreeMap<String, usize>,
    #[serde(default)]
    pub patterns_detected: Vec<String>,
    pub total_words: usize,
    pub ai_words_per_1000: f64,
    pub avg_sentence_length: f64,
    pub sentence_length_variance: f64,
    pub sequence_model_score: Option<f64>,
    pub complexity_score: Option<f64>,
    pub citation_score: Option<f64>,
}

impl HistoryRecord {
    pub fn from_result(result: &DetectionResult, git_commit: Option<&str>) -> Self {
        Self {
            id: None,
            file_path: result.file_path.clone(),
            git_commit: git_commit.map(str::to_string),
            timestamp: result.timestamp,
            overall_confidence: result.overall_confidence,
            grammar_score: result.scores.grammar,
            sentence_score: result.scores.sentence,
            paragraph_score: result.scores.paragraph,
            word_frequency_score: result.scores.word_frequency,
            punctuation_score: result.scores.punctuation,
            ai_words_found: result.ai_words_found.clone(),
            patterns_detected: result.patterns_detected.clone(),
            total_words: result.statistics.total_words,
            ai_words_per_1000: result.statistics.ai_words_per_1000,
            avg_sentence_length: result.statistics.avg_sentence_length,
            sentence_length_variance: result.statistics.sentence_length_variance,
            sequence_model_score: None,
            complexity_score: None,
            citation_score: None,
        }
    }

    /// Row for an enhanced analysis; `overall_confidence` is the adjusted value.
    pub fn from_enhanced(result: &EnhancedDetectionResult, git_commit: Option<&str>) -> Self {
        let mut record = Self::from_result(&result.base, git_commit);
        record.overall_confidence = result.overall_confidence;
        record.sequence_model_score = Some(result.sequence_model.overall_score);
        record.complexity_score = Some(result.complexity.overall_ai_score);
        record.citation_score = Some(result.citations.overall_ai_score);
        record
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Worsening,
    Stable,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub file_path: String,
    pub check_count: usize,
    pub current_confidence: f64,
    pub trend: Trend,
    pub history: Vec<HistoryRecord>,
}
