// Lexical Signal Analyzer
// Five surface-level sub-scores (grammar, sentence, paragraph, marker words, punctuation)
// fused into the base confidence

use crate::models::{LexicalScores, TextStatistics};
use crate::services::config_store::{
    DetectionConfig, LexicalTuning, LexicalWeights, MarkerLexicon, RiskTier, Thresholds,
};
use crate::services::text_processor::{
    coefficient_of_variation, mean, sample_variance, split_paragraphs, split_sentences,
    word_count,
};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;
use tracing::warn;

fn confusable_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:its|their|there|they're|your|you're)\s|,\s*which\s")
            .expect("confusable regex")
    })
}

fn informal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:ok|okay|yeah|yep|nope|gonna|wanna|gotta|kinda|sorta)\b|!!+|\?+|\b\w+n['’]t\b|\b\w+['’](?:re|ve|ll|m|d)\b",
        )
        .expect("informal regex")
    })
}

fn spacing_error_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+[,.:;!?]|[,.:;!?]\w").expect("spacing regex"))
}

/// Sub-scores plus the marker words that produced the frequency score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LexicalReport {
    pub scores: LexicalScores,
    pub ai_words_found: BTreeMap<String, usize>,
    pub confidence: f64,
}

pub struct LexicalAnalyzer {
    weights: LexicalWeights,
    lexicon: MarkerLexicon,
    thresholds: Thresholds,
    tuning: LexicalTuning,
    marker_re: Option<Regex>,
}

impl LexicalAnalyzer {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            weights: config.weights.clone(),
            lexicon: config.lexicon.clone(),
            thresholds: config.thresholds.clone(),
            tuning: config.tuning.lexical.clone(),
            marker_re: build_marker_regex(&config.lexicon),
        }
    }

    pub fn tuning(&self) -> &LexicalTuning {
        &self.tuning
    }

    pub fn analyze(&self, text: &str) -> LexicalReport {
        let (word_frequency, ai_words_found) = self.word_frequency(text);
        let scores = LexicalScores {
            grammar: self.grammar_score(text),
            sentence: self.sentence_score(text),
            paragraph: self.paragraph_score(text),
            word_frequency,
            punctuation: self.punctuation_score(text),
        };
        LexicalReport {
            confidence: self.base_confidence(&scores),
            scores,
            ai_words_found,
        }
    }

    /// Weighted sum of the sub-scores, scaled to [0, 1].
    pub fn base_confidence(&self, scores: &LexicalScores) -> f64 {
        let w = &self.weights;
        let overall = scores.grammar * w.grammar_perfection
            + scores.sentence * w.sentence_uniformity
            + scores.paragraph * w.paragraph_structure
            + scores.word_frequency * w.ai_word_frequency
            + scores.punctuation * w.punctuation_patterns;
        (overall / 100.0).clamp(0.0, 1.0)
    }

    /// Absence of the small irregularities long human text tends to carry.
    pub fn grammar_score(&self, text: &str) -> f64 {
        let words = word_count(text);
        if words < self.tuning.min_words_for_grammar {
            return 0.0;
        }

        let mut score = 0.0;

        let confusables = confusable_re().find_iter(text).count();
        if words > self.tuning.long_text_words {
            if confusables == 0 {
                score += 40.0;
            } else if (confusables as f64) < words as f64 * 0.001 {
                score += 25.0;
            }
        }

        let sentences = split_sentences(text).len();
        if sentences > 0 {
            let commas_per_sentence = text.matches(',').count() as f64 / sentences as f64;
            if (self.tuning.comma_ratio_min..=self.tuning.comma_ratio_max)
                .contains(&commas_per_sentence)
            {
                score += 15.0;
            }
        }

        if words > self.tuning.min_words_for_grammar && informal_re().find_iter(text).count() == 0 {
            score += 20.0;
        }

        f64::min(score, 100.0)
    }

    pub fn sentence_score(&self, text: &str) -> f64 {
        let sentences = split_sentences(text);
        if sentences.len() < 5 {
            return 0.0;
        }

        let lengths: Vec<f64> = sentences.iter().map(|s| word_count(s) as f64).collect();
        let mut score = 0.0;

        let lo = self.tuning.sweet_spot_min_words as f64;
        let hi = self.tuning.sweet_spot_max_words as f64;
        let sweet_ratio =
            lengths.iter().filter(|&&l| l >= lo && l <= hi).count() as f64 / lengths.len() as f64;
        if sweet_ratio > 0.6 {
            score += 40.0;
        } else if sweet_ratio > 0.4 {
            score += 25.0;
        }

        let cv = coefficient_of_variation(&lengths);
        if cv < 0.2 {
            score += 35.0;
        } else if cv < 0.3 {
            score += 20.0;
        }

        let mut starters: HashMap<String, usize> = HashMap::new();
        for sentence in &sentences {
            let opener: Vec<String> = sentence
                .split_whitespace()
                .take(2)
                .map(str::to_lowercase)
                .collect();
            if !opener.is_empty() {
                *starters.entry(opener.join(" ")).or_insert(0) += 1;
            }
        }
        let total_starters: usize = starters.values().sum();
        if let Some(most_common) = starters.values().max() {
            let ratio = *most_common as f64 / total_starters as f64;
            if ratio > self.tuning.starter_repetition_ratio {
                score += 25.0;
            }
        }

        f64::min(score, 100.0)
    }

    pub fn paragraph_score(&self, text: &str) -> f64 {
        let paragraphs = split_paragraphs(text);
        if paragraphs.len() < 3 {
            return 0.0;
        }

        let per_paragraph: Vec<Vec<&str>> = paragraphs.iter().map(|p| split_sentences(p)).collect();
        let counts: Vec<f64> = per_paragraph.iter().map(|s| s.len() as f64).collect();
        let mut score = 0.0;

        let lo = self.tuning.paragraph_band_min as f64;
        let hi = self.tuning.paragraph_band_max as f64;
        let uniform_ratio =
            counts.iter().filter(|&&c| c >= lo && c <= hi).count() as f64 / counts.len() as f64;
        if uniform_ratio > 0.7 {
            score += 40.0;
        } else if uniform_ratio > 0.5 {
            score += 25.0;
        }

        let cv = coefficient_of_variation(&counts);
        if cv < 0.3 {
            score += 30.0;
        } else if cv < 0.5 {
            score += 15.0;
        }

        // Topic sentences that run consistently longer than the rest
        let first_lengths: Vec<f64> = per_paragraph
            .iter()
            .filter_map(|s| s.first())
            .map(|s| word_count(s) as f64)
            .collect();
        if first_lengths.len() > 2 {
            let all_lengths: Vec<f64> = per_paragraph
                .iter()
                .flatten()
                .map(|s| word_count(s) as f64)
                .collect();
            if mean(&first_lengths) > mean(&all_lengths) * 1.2 {
                score += 20.0;
            }
        }

        f64::min(score, 100.0)
    }

    /// Marker-word rate mapped onto the baseline/threshold tiers, plus a bonus per
    /// high-risk hit. Returns the per-word counts alongside the score.
    pub fn word_frequency(&self, text: &str) -> (f64, BTreeMap<String, usize>) {
        let total_words = word_count(text);
        if total_words == 0 {
            return (0.0, BTreeMap::new());
        }

        let found = self.count_markers(text);
        let total_markers: usize = found.values().sum();
        let rate = total_markers as f64 / total_words as f64 * 1000.0;

        let baseline = self.thresholds.human_baseline_per_1000;
        let threshold = self.thresholds.ai_words_per_1000;
        let mut score = if rate >= threshold * 2.0 {
            100.0
        } else if rate >= threshold {
            70.0
        } else if rate >= baseline * 2.0 {
            50.0
        } else if rate >= baseline {
            30.0
        } else {
            10.0
        };

        let high_risk_hits: usize = found
            .iter()
            .filter(|(word, _)| self.lexicon.tier(word) == Some(RiskTier::High))
            .map(|(_, count)| *count)
            .sum();
        if high_risk_hits > 0 {
            score = f64::min(score + high_risk_hits as f64 * 10.0, 100.0);
        }

        (score, found)
    }

    pub fn count_markers(&self, text: &str) -> BTreeMap<String, usize> {
        let mut found = BTreeMap::new();
        let Some(re) = &self.marker_re else {
            return found;
        };
        let lowered = text.to_lowercase();
        for m in re.find_iter(&lowered) {
            *found.entry(m.as_str().to_string()).or_insert(0) += 1;
        }
        found
    }

    pub fn punctuation_score(&self, text: &str) -> f64 {
        let sentences = split_sentences(text).len();
        if sentences == 0 {
            return 0.0;
        }

        let semicolons = text.matches(';').count() as f64;
        let colons = text.matches(':').count() as f64;
        let em_dashes = text.matches('—').count();
        let ellipses = text.matches("...").count();
        let exclamations = text.matches('!').count();
        let words = word_count(text);
        let mut score = 0.0;

        let semicolons_per_sentence = semicolons / sentences as f64;
        if semicolons_per_sentence > 0.3 {
            score += 25.0;
        } else if semicolons_per_sentence > 0.15 {
            score += 15.0;
        }

        if colons > 0.0 && colons < sentences as f64 * 0.1 {
            score += 10.0;
        }

        if em_dashes > 3 {
            score += 15.0;
        }

        if words > self.tuning.min_words_for_grammar && ellipses == 0 && exclamations == 0 {
            score += 20.0;
        }

        if words > self.tuning.long_text_words && spacing_error_re().find_iter(text).count() == 0 {
            score += 20.0;
        }

        f64::min(score, 100.0)
    }

    /// Share of sentences whose first word is a transition-tier marker.
    pub fn transition_opener_ratio(&self, text: &str) -> f64 {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return 0.0;
        }
        let openers = sentences
            .iter()
            .filter_map(|s| s.split_whitespace().next())
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| self.lexicon.is_transition(w))
            .count();
        openers as f64 / sentences.len() as f64
    }

    /// Named patterns for every sub-score past 70, plus transition-opener overuse.
    pub fn detect_patterns(&self, text: &str, scores: &LexicalScores) -> Vec<String> {
        let mut patterns = Vec::new();
        if scores.grammar > 70.0 {
            patterns.push("Excessive grammatical perfection".to_string());
        }
        if scores.sentence > 70.0 {
            patterns.push("Uniform sentence lengths (AI sweet spot)".to_string());
        }
        if scores.paragraph > 70.0 {
            patterns.push("Mechanical paragraph structure".to_string());
        }
        if scores.word_frequency > 70.0 {
            patterns.push("High frequency of AI-typical words".to_string());
        }
        if scores.punctuation > 70.0 {
            patterns.push("Artificial punctuation patterns".to_string());
        }
        if self.transition_opener_ratio(text) > self.tuning.transition_opener_ratio {
            patterns.push(TRANSITION_PATTERN.to_string());
        }
        patterns
    }

    pub fn statistics(&self, text: &str, ai_words_found: &BTreeMap<String, usize>) -> TextStatistics {
        let total_words = word_count(text);
        let lengths: Vec<f64> = split_sentences(text)
            .iter()
            .map(|s| word_count(s) as f64)
            .collect();
        let markers: usize = ai_words_found.values().sum();
        TextStatistics {
            total_words,
            ai_words_per_1000: if total_words > 0 {
                markers as f64 / total_words as f64 * 1000.0
            } else {
                0.0
            },
            avg_sentence_length: mean(&lengths),
            sentence_length_variance: sample_variance(&lengths),
        }
    }
}

pub const TRANSITION_PATTERN: &str = "Excessive transition words at sentence starts";

fn build_marker_regex(lexicon: &MarkerLexicon) -> Option<Regex> {
    let mut words = lexicon.all_words();
    if words.is_empty() {
        return None;
    }
    // Longest first so inflected forms win over their stems
    words.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    match Regex::new(&format!(r"\b(?:{})\b", alternation)) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(error = %e, "lexicon.regex_failed");
            None
        }
    }
}
