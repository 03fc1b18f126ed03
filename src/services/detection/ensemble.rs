// Ensemble Logic
// Fuses the four analyzer scores and applies the optional author-baseline adjustment

use crate::models::{AuthorProfile, CitationResult, ComplexityResult, DetectionResult, SequenceModelResult};
use crate::services::config_store::{AdaptiveTuning, EnsembleWeights, Thresholds};
use super::decision::confidence_level;

/// Weighted fusion of base, sequence-model, complexity and citation scores.
pub fn enhanced_confidence(
    base: f64,
    sequence_model: f64,
    complexity: f64,
    citation: f64,
    weights: &EnsembleWeights,
) -> f64 {
    let fused = weights.base * base
        + weights.sequence_model * sequence_model
        + weights.complexity * complexity
        + weights.citation * citation;
    fused.clamp(0.0, 1.0)
}

/// Relative distance of the current complexity variance from the author's average.
pub fn profile_deviation(profile: &AuthorProfile, complexity_variance: f64) -> f64 {
    let baseline = profile.avg_complexity_variance;
    (complexity_variance - baseline).abs() / baseline.max(1.0)
}

/// Step applied for a given deviation: close matches lower confidence, far
/// departures raise it, the middle band leaves it alone.
pub fn adjustment_for(deviation: f64, tuning: &AdaptiveTuning) -> f64 {
    if deviation < tuning.match_deviation {
        -tuning.match_step
    } else if deviation < tuning.close_deviation {
        -tuning.close_step
    } else if deviation > tuning.far_deviation {
        tuning.far_step
    } else {
        0.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Adjusted {
    pub confidence: f64,
    /// Nominal step chosen from the deviation bands; zero without a profile.
    pub adjustment: f64,
}

/// Personalize a confidence against an author profile. An absent or empty
/// profile leaves the confidence untouched.
pub fn adjust(
    confidence: f64,
    profile: Option<&AuthorProfile>,
    complexity_variance: f64,
    tuning: &AdaptiveTuning,
) -> Adjusted {
    let Some(profile) = profile.filter(|p| p.samples > 0) else {
        return Adjusted { confidence, adjustment: 0.0 };
    };
    let adjustment = adjustment_for(profile_deviation(profile, complexity_variance), tuning);
    Adjusted {
        confidence: (confidence + adjustment).clamp(0.0, 1.0),
        adjustment,
    }
}

/// Human-readable summary: level, verdict and the signals that drove it.
pub fn assessment(
    confidence: f64,
    thresholds: &Thresholds,
    base: &DetectionResult,
    sequence_model: &SequenceModelResult,
    complexity: &ComplexityResult,
    citations: &CitationResult,
) -> String {
    let level = confidence_level(confidence, thresholds);
    let mut findings = Vec::new();

    if base.scores.word_frequency > 60.0 {
        let count: usize = base.ai_words_found.values().sum();
        findings.push(format!("Contains {} AI-typical words", count));
    }
    if base.scores.sentence > 70.0 {
        findings.push("Excessive sentence uniformity detected".to_string());
    }
    if sequence_model.repetition_score > 0.5 {
        findings.push(format!(
            "Repetitive phrases detected ({} instances)",
            sequence_model.repetitive_phrases.len()
        ));
    }
    if sequence_model.transition_anomaly_score > 0.6 {
        findings.push("Unusual word transition patterns".to_string());
    }
    if complexity.uniformity_score > 0.7 {
        findings.push(format!(
            "Very uniform complexity (variance: {:.2})",
            complexity.complexity_variance
        ));
    }
    if citations.generic_frame_score > 0.5 {
        findings.push(format!(
            "Generic citation frames detected ({} types)",
            citations.generic_frames_found.len()
        ));
    }
    if citations.front_loading_score > 0.6 {
        findings.push("Citations front-loaded in text".to_string());
    }

    let mut text = format!(
        "{} confidence ({:.1}%): {}",
        level.as_str(),
        confidence * 100.0,
        level.verdict()
    );
    if !findings.is_empty() {
        text.push_str("\n\nKey findings:");
        for finding in findings {
            text.push_str("\n  - ");
            text.push_str(&finding);
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(avg: f64) -> AuthorProfile {
        let mut p = AuthorProfile::default();
        p.record(avg, 100.0);
        p
    }

    #[test]
    fn test_enhanced_confidence_weights() {
        let w = EnsembleWeights::default();
        let c = enhanced_confidence(1.0, 0.0, 0.0, 0.0, &w);
        assert!((c - 0.40).abs() < 1e-12);
        let c = enhanced_confidence(0.5, 0.4, 1.0, 0.0, &w);
        assert!((c - (0.2 + 0.1 + 0.2)).abs() < 1e-12);
        assert_eq!(enhanced_confidence(1.0, 1.0, 1.0, 1.0, &w), 1.0);
    }

    #[test]
    fn test_adjust_without_profile_is_identity() {
        let tuning = AdaptiveTuning::default();
        let out = adjust(0.42, None, 3.0, &tuning);
        assert_eq!(out, Adjusted { confidence: 0.42, adjustment: 0.0 });
        let empty = AuthorProfile::default();
        assert_eq!(adjust(0.42, Some(&empty), 3.0, &tuning).adjustment, 0.0);
    }

    #[test]
    fn test_adjust_bands() {
        let tuning = AdaptiveTuning::default();
        let p = profile(10.0);
        // deviation 0.1
        assert!((adjust(0.5, Some(&p), 11.0, &tuning).confidence - 0.35).abs() < 1e-12);
        // deviation 0.3
        assert!((adjust(0.5, Some(&p), 13.0, &tuning).confidence - 0.45).abs() < 1e-12);
        // deviation 0.6
        assert_eq!(adjust(0.5, Some(&p), 16.0, &tuning).adjustment, 0.0);
        // deviation 0.9
        assert!((adjust(0.5, Some(&p), 19.0, &tuning).confidence - 0.65).abs() < 1e-12);
    }

    #[test]
    fn test_adjust_clamps() {
        let tuning = AdaptiveTuning::default();
        let p = profile(4.0);
        assert_eq!(adjust(0.05, Some(&p), 4.0, &tuning).confidence, 0.0);
        assert_eq!(adjust(0.95, Some(&p), 40.0, &tuning).confidence, 1.0);
    }

    #[test]
    fn test_small_baseline_uses_unit_denominator() {
        let p = profile(0.5);
        assert!((profile_deviation(&p, 0.8) - 0.3).abs() < 1e-12);
    }
}
