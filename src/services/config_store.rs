// Configuration Storage Service
// Detection configuration record, documented defaults and lenient file loading

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("{group} weights sum to {sum:.4}, expected 1.0; using defaults")]
    InvalidWeights { group: &'static str, sum: f64 },
    #[error("warn threshold {warn} exceeds block threshold {block}; using defaults")]
    InvalidThresholds { warn: f64, block: f64 },
}

// ============ Weights ============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LexicalWeights {
    pub grammar_perfection: f64,
    pub sentence_uniformity: f64,
    pub paragraph_structure: f64,
    pub ai_word_frequency: f64,
    pub punctuation_patterns: f64,
}

impl Default for LexicalWeights {
    fn default() -> Self {
        Self {
            grammar_perfection: 0.20,
            sentence_uniformity: 0.25,
            paragraph_structure: 0.20,
            ai_word_frequency: 0.25,
            punctuation_patterns: 0.10,
        }
    }
}

impl LexicalWeights {
    pub fn sum(&self) -> f64 {
        self.grammar_perfection
            + self.sentence_uniformity
            + self.paragraph_structure
            + self.ai_word_frequency
            + self.punctuation_patterns
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnsembleWeights {
    pub base: f64,
    pub sequence_model: f64,
    pub complexity: f64,
    pub citation: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            base: 0.40,
            sequence_model: 0.25,
            complexity: 0.20,
            citation: 0.15,
        }
    }
}

impl EnsembleWeights {
    pub fn sum(&self) -> f64 {
        self.base + self.sequence_model + self.complexity + self.citation
    }
}

// ============ Marker Lexicon ============

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RiskTier {
    High,
    Medium,
    Transition,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

fn default_high_risk() -> Vec<String> {
    words(&[
        "delve", "delving", "delved",
        "leverage", "leveraging", "leveraged",
        "utilize", "utilizes", "utilizing", "utilized", "utilization",
    ])
}

fn default_medium_risk() -> Vec<String> {
    words(&[
        "robust", "robustly", "robustness",
        "comprehensive", "comprehensively",
        "facilitate", "facilitates", "facilitating", "facilitated",
        "substantial", "substantially",
        "considerable", "considerably",
        "innovative", "innovatively",
        "cutting-edge",
        "state-of-the-art",
        "demonstrate", "demonstrates", "demonstrating", "demonstrated",
        "implement", "implements", "implementing", "implemented",
        "enhance", "enhances", "enhancing", "enhanced",
    ])
}

fn default_transitions() -> Vec<String> {
    words(&[
        "furthermore",
        "moreover",
        "additionally",
        "consequently",
        "subsequently",
        "nevertheless",
        "nonetheless",
        "therefore",
        "thus",
        "hence",
    ])
}

/// Marker words partitioned by risk tier. Each tier falls back to its default
/// list independently when omitted from a config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarkerLexicon {
    #[serde(default = "default_high_risk")]
    pub high_risk: Vec<String>,
    #[serde(default = "default_medium_risk")]
    pub medium_risk: Vec<String>,
    #[serde(default = "default_transitions")]
    pub transitions: Vec<String>,
}

impl Default for MarkerLexicon {
    fn default() -> Self {
        Self {
            high_risk: default_high_risk(),
            medium_risk: default_medium_risk(),
            transitions: default_transitions(),
        }
    }
}

/// Words appended to the lexicon tiers rather than replacing them.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LexiconAdditions {
    pub high_risk: Vec<String>,
    pub medium_risk: Vec<String>,
    pub transitions: Vec<String>,
}

impl MarkerLexicon {
    /// Highest tier containing `word` (case-insensitive).
    pub fn tier(&self, word: &str) -> Option<RiskTier> {
        let lowered = word.to_lowercase();
        let contains = |list: &[String]| list.iter().any(|w| w.eq_ignore_ascii_case(&lowered));
        if contains(&self.high_risk) {
            Some(RiskTier::High)
        } else if contains(&self.medium_risk) {
            Some(RiskTier::Medium)
        } else if contains(&self.transitions) {
            Some(RiskTier::Transition)
        } else {
            None
        }
    }

    pub fn is_transition(&self, word: &str) -> bool {
        self.transitions.iter().any(|w| w.eq_ignore_ascii_case(word))
    }

    /// All marker words, lowercased, deduplicated and sorted.
    pub fn all_words(&self) -> Vec<String> {
        let mut all: Vec<String> = self
            .high_risk
            .iter()
            .chain(self.medium_risk.iter())
            .chain(self.transitions.iter())
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        all.sort();
        all.dedup();
        all
    }

    pub fn extend(&mut self, additions: &LexiconAdditions) {
        fn merge(target: &mut Vec<String>, extra: &[String]) {
            for word in extra {
                if !target.iter().any(|w| w.eq_ignore_ascii_case(word)) {
                    target.push(word.to_lowercase());
                }
            }
        }
        merge(&mut self.high_risk, &additions.high_risk);
        merge(&mut self.medium_risk, &additions.medium_risk);
        merge(&mut self.transitions, &additions.transitions);
    }
}

// ============ Thresholds ============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    pub ai_words_per_1000: f64,
    pub human_baseline_per_1000: f64,
    pub warn_threshold: f64,
    pub block_threshold: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            ai_words_per_1000: 3.0,
            human_baseline_per_1000: 1.5,
            warn_threshold: 0.30,
            block_threshold: 0.70,
        }
    }
}

// ============ Heuristic Tuning ============
// None of these bands come from a validated corpus; they are defaults, not truths.

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LexicalTuning {
    pub min_words_for_grammar: usize,
    pub long_text_words: usize,
    pub comma_ratio_min: f64,
    pub comma_ratio_max: f64,
    pub sweet_spot_min_words: usize,
    pub sweet_spot_max_words: usize,
    pub starter_repetition_ratio: f64,
    pub paragraph_band_min: usize,
    pub paragraph_band_max: usize,
    pub transition_opener_ratio: f64,
    pub flag_min_chars: usize,
    pub flag_confidence: f64,
}

impl Default for LexicalTuning {
    fn default() -> Self {
        Self {
            min_words_for_grammar: 500,
            long_text_words: 1000,
            comma_ratio_min: 0.8,
            comma_ratio_max: 2.2,
            sweet_spot_min_words: 15,
            sweet_spot_max_words: 25,
            starter_repetition_ratio: 0.3,
            paragraph_band_min: 4,
            paragraph_band_max: 6,
            transition_opener_ratio: 0.5,
            flag_min_chars: 50,
            flag_confidence: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SequenceTuning {
    pub unusual_bigram_probability: f64,
    pub unusual_trigram_probability: f64,
    pub default_bigram_probability: f64,
    pub default_trigram_probability: f64,
    pub over_repeat_factor: f64,
    pub unusual_scale: f64,
    pub repetition_min_count: usize,
    pub perplexity_low: f64,
    pub perplexity_high: f64,
}

impl Default for SequenceTuning {
    fn default() -> Self {
        Self {
            unusual_bigram_probability: 0.001,
            unusual_trigram_probability: 0.0001,
            default_bigram_probability: 0.01,
            default_trigram_probability: 0.001,
            over_repeat_factor: 3.0,
            unusual_scale: 10.0,
            repetition_min_count: 3,
            perplexity_low: 50.0,
            perplexity_high: 200.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ComplexityTuning {
    pub low_variance: f64,
    pub human_variance_min: f64,
    pub human_variance_max: f64,
    pub grade_min: f64,
    pub grade_max: f64,
    pub fog_gap: f64,
}

impl Default for ComplexityTuning {
    fn default() -> Self {
        Self {
            low_variance: 2.0,
            human_variance_min: 3.0,
            human_variance_max: 8.0,
            grade_min: 10.0,
            grade_max: 14.0,
            fog_gap: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CitationTuning {
    pub context_window: usize,
    pub front_loading_baseline: f64,
    pub cluster_low_cv: f64,
    pub cluster_high_cv: f64,
}

impl Default for CitationTuning {
    fn default() -> Self {
        Self {
            context_window: 10,
            front_loading_baseline: 0.5,
            cluster_low_cv: 0.3,
            cluster_high_cv: 1.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdaptiveTuning {
    pub match_deviation: f64,
    pub close_deviation: f64,
    pub far_deviation: f64,
    pub match_step: f64,
    pub close_step: f64,
    pub far_step: f64,
}

impl Default for AdaptiveTuning {
    fn default() -> Self {
        Self {
            match_deviation: 0.2,
            close_deviation: 0.4,
            far_deviation: 0.8,
            match_step: 0.15,
            close_step: 0.05,
            far_step: 0.15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Tuning {
    pub lexical: LexicalTuning,
    pub sequence: SequenceTuning,
    pub complexity: ComplexityTuning,
    pub citation: CitationTuning,
    pub adaptive: AdaptiveTuning,
}

// ============ Detection Config ============

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct DetectionConfig {
    pub weights: LexicalWeights,
    pub ensemble: EnsembleWeights,
    pub lexicon: MarkerLexicon,
    #[serde(skip_serializing_if = "is_empty_additions")]
    pub extra_words: LexiconAdditions,
    pub thresholds: Thresholds,
    pub tuning: Tuning,
}

fn is_empty_additions(additions: &LexiconAdditions) -> bool {
    additions.high_risk.is_empty() && additions.medium_risk.is_empty() && additions.transitions.is_empty()
}

impl DetectionConfig {
    /// Merge additions into the lexicon and replace invalid groups with their
    /// defaults. Every replaced group is reported.
    pub fn normalized(mut self) -> (Self, Vec<ConfigError>) {
        let mut problems = Vec::new();

        let additions = std::mem::take(&mut self.extra_words);
        self.lexicon.extend(&additions);

        let lexical_sum = self.weights.sum();
        if (lexical_sum - 1.0).abs() > WEIGHT_TOLERANCE {
            problems.push(ConfigError::InvalidWeights { group: "lexical", sum: lexical_sum });
            self.weights = LexicalWeights::default();
        }

        let ensemble_sum = self.ensemble.sum();
        if (ensemble_sum - 1.0).abs() > WEIGHT_TOLERANCE {
            problems.push(ConfigError::InvalidWeights { group: "ensemble", sum: ensemble_sum });
            self.ensemble = EnsembleWeights::default();
        }

        let t = &self.thresholds;
        if t.warn_threshold > t.block_threshold {
            problems.push(ConfigError::InvalidThresholds {
                warn: t.warn_threshold,
                block: t.block_threshold,
            });
            let defaults = Thresholds::default();
            self.thresholds.warn_threshold = defaults.warn_threshold;
            self.thresholds.block_threshold = defaults.block_threshold;
        }

        (self, problems)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum ConfigFormat {
    Json,
    Yaml,
}

fn format_for(path: &Path) -> ConfigFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => ConfigFormat::Yaml,
        _ => ConfigFormat::Json,
    }
}

pub struct ConfigStore {
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_file: PathBuf) -> Self {
        Self { config_file }
    }

    /// Strict load: missing file gives defaults, unreadable or malformed file is an error.
    pub fn load(&self) -> Result<DetectionConfig, ConfigError> {
        if !self.config_file.exists() {
            return Ok(DetectionConfig::default());
        }

        let content = fs::read_to_string(&self.config_file).map_err(|source| ConfigError::Read {
            path: self.config_file.clone(),
            source,
        })?;

        let parsed = match format_for(&self.config_file) {
            ConfigFormat::Json => serde_json::from_str(&content).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
        };

        parsed.map_err(|message| ConfigError::Parse {
            path: self.config_file.clone(),
            message,
        })
    }

    /// Lenient load used by the engine: never fails, reports every problem and
    /// proceeds on defaults for whatever could not be used.
    pub fn load_or_default(&self) -> (DetectionConfig, Vec<ConfigError>) {
        match self.load() {
            Ok(config) => {
                let (config, problems) = config.normalized();
                for problem in &problems {
                    warn!(path = %self.config_file.display(), error = %problem, "config.invalid_group");
                }
                (config, problems)
            }
            Err(e) => {
                warn!(path = %self.config_file.display(), error = %e, "config.load_failed");
                (DetectionConfig::default(), vec![e])
            }
        }
    }
}
