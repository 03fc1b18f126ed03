// Detection Engine
// Runs the analyzers over one text and assembles the result records

use crate::models::{
    CitationResult, ComplexityResult, DetectionResult, EnhancedDetectionResult, SequenceModelResult,
    Suggestion,
};
use crate::services::config_store::{ConfigError, ConfigStore, DetectionConfig};
use crate::services::profile_store::ProfileStore;
use crate::services::text_processor::word_count;
use super::citation::CitationAnalyzer;
use super::complexity::ComplexityAnalyzer;
use super::decision::decide;
use super::ensemble::{adjust, assessment, enhanced_confidence, Adjusted};
use super::lexical::LexicalAnalyzer;
use super::segment_builder::build_flagged_sections;
use super::sequence_model::{ReferenceModel, SequenceModelAnalyzer};
use super::suggestions::generate_suggestions;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const DETECTION_VERSION: &str = "1.1.0";

/// Immutable detector. Cheap to share across threads; every call is a single
/// deterministic pass apart from the optional profile read-modify-write.
pub struct Detector {
    config: DetectionConfig,
    lexical: LexicalAnalyzer,
    reference: Arc<ReferenceModel>,
}

impl Detector {
    pub fn new(config: DetectionConfig) -> Self {
        Self::with_reference(config, Arc::new(ReferenceModel::builtin()))
    }

    pub fn with_reference(config: DetectionConfig, reference: Arc<ReferenceModel>) -> Self {
        let lexical = LexicalAnalyzer::new(&config);
        Self {
            config,
            lexical,
            reference,
        }
    }

    /// Build from an optional config file. Problems are returned, never fatal.
    pub fn from_config_file(path: Option<&Path>) -> (Self, Vec<ConfigError>) {
        match path {
            Some(path) => {
                let (config, problems) = ConfigStore::new(path.to_path_buf()).load_or_default();
                (Self::new(config), problems)
            }
            None => (Self::new(DetectionConfig::default()), Vec::new()),
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn analyze(&self, text: &str, file_path: &str) -> DetectionResult {
        self.analyze_at(text, file_path, Utc::now())
    }

    /// Same as [`Detector::analyze`] with a caller-supplied timestamp.
    pub fn analyze_at(&self, text: &str, file_path: &str, timestamp: DateTime<Utc>) -> DetectionResult {
        let started = Instant::now();
        let report = self.lexical.analyze(text);
        let patterns_detected = self.lexical.detect_patterns(text, &report.scores);
        let flagged_sections = build_flagged_sections(&self.lexical, text);
        let statistics = self.lexical.statistics(text, &report.ai_words_found);

        let result = DetectionResult {
            file_path: file_path.to_string(),
            timestamp,
            overall_confidence: report.confidence,
            decision: decide(report.confidence, &self.config.thresholds),
            scores: report.scores,
            ai_words_found: report.ai_words_found,
            patterns_detected,
            flagged_sections,
            statistics,
        };

        info!(
            file = file_path,
            words = result.statistics.total_words,
            confidence = result.overall_confidence,
            decision = result.decision.as_str(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "detection.base_completed"
        );
        result
    }

    pub fn analyze_sequence(&self, text: &str) -> SequenceModelResult {
        SequenceModelAnalyzer::new(&self.reference, &self.config.tuning.sequence).analyze(text)
    }

    pub fn analyze_complexity(&self, text: &str) -> ComplexityResult {
        ComplexityAnalyzer::new(&self.config.tuning.complexity).analyze(text)
    }

    pub fn analyze_citations(&self, text: &str) -> CitationResult {
        CitationAnalyzer::new(&self.config.tuning.citation).analyze(text)
    }

    pub fn analyze_enhanced(
        &self,
        text: &str,
        file_path: &str,
        profile_path: Option<&Path>,
    ) -> EnhancedDetectionResult {
        self.analyze_enhanced_at(text, file_path, profile_path, Utc::now())
    }

    pub fn analyze_enhanced_at(
        &self,
        text: &str,
        file_path: &str,
        profile_path: Option<&Path>,
        timestamp: DateTime<Utc>,
    ) -> EnhancedDetectionResult {
        let started = Instant::now();
        let base = self.analyze_at(text, file_path, timestamp);
        let sequence_model = self.analyze_sequence(text);
        let complexity = self.analyze_complexity(text);
        let citations = self.analyze_citations(text);

        let enhanced = enhanced_confidence(
            base.overall_confidence,
            sequence_model.overall_score,
            complexity.overall_ai_score,
            citations.overall_ai_score,
            &self.config.ensemble,
        );

        let mut persistence_warnings = Vec::new();
        let mut profile_used = false;
        let mut adjusted = Adjusted {
            confidence: enhanced,
            adjustment: 0.0,
        };

        match profile_path {
            Some(path) if word_count(text) > 0 => {
                let store = ProfileStore::new(path.to_path_buf());
                let tuning = &self.config.tuning.adaptive;
                let ((outcome, used), problems) = store.update(|current| {
                    let outcome = adjust(enhanced, current, complexity.complexity_variance, tuning);
                    let used = current.map_or(false, |p| p.samples > 0);
                    let mut next = current.cloned().unwrap_or_default();
                    next.record(complexity.complexity_variance, sequence_model.perplexity);
                    ((outcome, used), next)
                });
                adjusted = outcome;
                profile_used = used;
                persistence_warnings.extend(problems.iter().map(|e| e.to_string()));
            }
            Some(path) => {
                debug!(path = %path.display(), "profile.skipped_empty_text");
            }
            None => {}
        }

        for w in &persistence_warnings {
            warn!(file = file_path, warning = %w, "detection.persistence_warning");
        }

        let decision = decide(adjusted.confidence, &self.config.thresholds);
        let assessment = assessment(
            adjusted.confidence,
            &self.config.thresholds,
            &base,
            &sequence_model,
            &complexity,
            &citations,
        );

        info!(
            file = file_path,
            base = base.overall_confidence,
            enhanced,
            confidence = adjusted.confidence,
            adjustment = adjusted.adjustment,
            profile_used,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "detection.enhanced_completed"
        );

        EnhancedDetectionResult {
            overall_confidence: adjusted.confidence,
            base_confidence: base.overall_confidence,
            enhanced_confidence: enhanced,
            adaptive_adjustment: adjusted.adjustment,
            decision,
            assessment,
            sequence_model,
            complexity,
            citations,
            profile_used,
            persistence_warnings,
            detection_version: DETECTION_VERSION.to_string(),
            base,
        }
    }

    pub fn suggestions(&self, result: &DetectionResult) -> Vec<Suggestion> {
        generate_suggestions(result)
    }
}

/// Anything that carries a final confidence worth logging.
pub trait Scored {
    fn confidence(&self) -> f64;
}

impl Scored for DetectionResult {
    fn confidence(&self) -> f64 {
        self.overall_confidence
    }
}

impl Scored for EnhancedDetectionResult {
    fn confidence(&self) -> f64 {
        self.overall_confidence
    }
}

/// Explicit call tracking: logs the label, duration and produced confidence.
pub fn traced<T, F>(label: &str, f: F) -> T
where
    T: Scored,
    F: FnOnce() -> T,
{
    let started = Instant::now();
    debug!(label, "tracked_call.started");
    let out = f();
    info!(
        label,
        confidence = out.confidence(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "tracked_call.finished"
    );
    out
}
