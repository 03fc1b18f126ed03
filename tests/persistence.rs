mod common;

use ai_check::models::{HistoryRecord, Trend};
use ai_check::services::config_store::ConfigError;
use ai_check::services::detection::Detector;
use ai_check::services::{DetectionConfig, HistoryTracker, ProfileStore};
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use std::thread;

#[test]
fn test_profile_growth_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let profile = dir.path().join("author.json");
    let detector = Detector::new(DetectionConfig::default());
    let text = common::varied_human_text();
    let own_variance = detector.analyze_complexity(&text).complexity_variance;

    const RUNS: u64 = 5;
    for _ in 0..RUNS {
        let result = detector.analyze_enhanced(&text, "essay.md", Some(profile.as_path()));
        assert!(result.persistence_warnings.is_empty());
    }

    let stored = ProfileStore::new(profile).load().unwrap().unwrap();
    assert_eq!(stored.samples, RUNS);
    assert!((stored.avg_complexity_variance - own_variance).abs() <= own_variance.abs() * 1e-12 + 1e-12);
    assert!((stored.total_complexity_variance - own_variance * RUNS as f64).abs() < 1e-6);
}

#[test]
fn test_far_departure_raises_confidence() {
    let dir = tempfile::tempdir().unwrap();
    let profile = dir.path().join("author.json");
    let detector = Detector::new(DetectionConfig::default());

    // varied prose builds a high-variance baseline; uniform prose is far from it
    let baseline = detector.analyze_enhanced(&common::varied_human_text(), "a.md", Some(profile.as_path()));
    assert!(baseline.complexity.complexity_variance > 8.0);

    let uniform = detector.analyze_enhanced(&common::uniform_marker_text(), "b.md", Some(profile.as_path()));
    assert!(uniform.profile_used);
    assert!((uniform.adaptive_adjustment - 0.15).abs() < 1e-12);
    assert!(uniform.overall_confidence > uniform.enhanced_confidence);
}

fn record(file: &str, minutes: i64, confidence: f64) -> HistoryRecord {
    let detector = Detector::new(DetectionConfig::default());
    let start = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();
    let result = detector.analyze_at("Short note.", file, start + Duration::minutes(minutes));
    let mut row = HistoryRecord::from_result(&result, Some("abc123"));
    row.overall_confidence = confidence;
    row
}

#[test]
fn test_history_trend_improving() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = HistoryTracker::open(&dir.path().join("db").join("history.db")).unwrap();

    // oldest to newest
    for (i, c) in [0.9, 0.85, 0.8, 0.4, 0.35, 0.3].iter().enumerate() {
        tracker.log(&record("paper.md", i as i64, *c)).unwrap();
    }
    tracker.log(&record("other.md", 0, 0.1)).unwrap();

    let report = tracker.trend_report("paper.md").unwrap().unwrap();
    assert_eq!(report.check_count, 6);
    assert_eq!(report.current_confidence, 0.3);
    assert_eq!(report.trend, Trend::Improving);
    assert_eq!(report.history.len(), 5);
    assert_eq!(report.history[0].git_commit.as_deref(), Some("abc123"));

    assert!(tracker.trend_report("missing.md").unwrap().is_none());
}

#[test]
fn test_history_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("history.db");
    {
        let tracker = HistoryTracker::open(&db).unwrap();
        tracker.log(&record("paper.md", 0, 0.5)).unwrap();
    }
    let tracker = HistoryTracker::open(&db).unwrap();
    let rows = tracker.get_history("paper.md", 10).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].overall_confidence, 0.5);
}

#[test]
fn test_concurrent_history_appends() {
    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(dir.path().join("history.db"));
    HistoryTracker::open(&db).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                let tracker = HistoryTracker::open(&db).unwrap();
                for i in 0..5 {
                    tracker.log(&record("shared.md", t * 10 + i, 0.5)).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let tracker = HistoryTracker::open(&db).unwrap();
    assert_eq!(tracker.get_history("shared.md", 100).unwrap().len(), 20);
}

#[test]
fn test_enhanced_history_row_keeps_adjusted_confidence() {
    let tracker = HistoryTracker::open_in_memory().unwrap();
    let detector = Detector::new(DetectionConfig::default());
    let result = detector.analyze_enhanced(&common::uniform_marker_text(), "draft.md", None);
    tracker.log(&HistoryRecord::from_enhanced(&result, None)).unwrap();

    let rows = tracker.get_history("draft.md", 1).unwrap();
    assert_eq!(rows[0].overall_confidence, result.overall_confidence);
    assert_eq!(rows[0].sequence_model_score, Some(result.sequence_model.overall_score));
    assert_eq!(rows[0].ai_words_found, result.base.ai_words_found);
}

#[test]
fn test_yaml_config_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".ai-check-config.yaml");
    std::fs::write(
        &path,
        "thresholds:\n  block_threshold: 0.9\nextra_words:\n  high_risk:\n    - tapestry\n",
    )
    .unwrap();

    let (detector, problems) = Detector::from_config_file(Some(path.as_path()));
    assert!(problems.is_empty());
    assert_eq!(detector.config().thresholds.block_threshold, 0.9);
    assert_eq!(detector.config().thresholds.warn_threshold, 0.30);

    let result = detector.analyze("A rich tapestry of ideas.", "t.md");
    assert_eq!(result.ai_words_found.get("tapestry"), Some(&1));
}

#[test]
fn test_malformed_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    let (detector, problems) = Detector::from_config_file(Some(path.as_path()));
    assert_eq!(problems.len(), 1);
    assert!(matches!(problems[0], ConfigError::Parse { .. }));
    assert_eq!(detector.config(), &DetectionConfig::default());
}

#[test]
fn test_bad_weight_group_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"ensemble": {"base": 0.9, "sequence_model": 0.9}}"#).unwrap();

    let (detector, problems) = Detector::from_config_file(Some(path.as_path()));
    assert_eq!(problems.len(), 1);
    assert!(matches!(problems[0], ConfigError::InvalidWeights { group: "ensemble", .. }));
    assert_eq!(detector.config().ensemble.base, 0.40);
}

/// Every heuristic band is a tunable default. A re-tuning should fail here
/// and nowhere else.
#[test]
fn test_tunable_defaults() {
    let c = DetectionConfig::default();

    assert_eq!(c.weights.grammar_perfection, 0.20);
    assert_eq!(c.weights.sentence_uniformity, 0.25);
    assert_eq!(c.weights.paragraph_structure, 0.20);
    assert_eq!(c.weights.ai_word_frequency, 0.25);
    assert_eq!(c.weights.punctuation_patterns, 0.10);

    assert_eq!(c.ensemble.base, 0.40);
    assert_eq!(c.ensemble.sequence_model, 0.25);
    assert_eq!(c.ensemble.complexity, 0.20);
    assert_eq!(c.ensemble.citation, 0.15);

    assert_eq!(c.thresholds.ai_words_per_1000, 3.0);
    assert_eq!(c.thresholds.human_baseline_per_1000, 1.5);
    assert_eq!(c.thresholds.warn_threshold, 0.30);
    assert_eq!(c.thresholds.block_threshold, 0.70);

    let lex = &c.tuning.lexical;
    assert_eq!((lex.sweet_spot_min_words, lex.sweet_spot_max_words), (15, 25));
    assert_eq!((lex.comma_ratio_min, lex.comma_ratio_max), (0.8, 2.2));
    assert_eq!((lex.paragraph_band_min, lex.paragraph_band_max), (4, 6));
    assert_eq!(lex.flag_confidence, 0.6);

    let seq = &c.tuning.sequence;
    assert_eq!((seq.perplexity_low, seq.perplexity_high), (50.0, 200.0));
    assert_eq!((seq.unusual_bigram_probability, seq.unusual_trigram_probability), (0.001, 0.0001));
    assert_eq!((seq.default_bigram_probability, seq.default_trigram_probability), (0.01, 0.001));
    assert_eq!(seq.over_repeat_factor, 3.0);
    assert_eq!(seq.repetition_min_count, 3);

    let cx = &c.tuning.complexity;
    assert_eq!((cx.low_variance, cx.human_variance_min, cx.human_variance_max), (2.0, 3.0, 8.0));
    assert_eq!((cx.grade_min, cx.grade_max, cx.fog_gap), (10.0, 14.0, 2.0));

    let cit = &c.tuning.citation;
    assert_eq!((cit.cluster_low_cv, cit.cluster_high_cv), (0.3, 1.5));
    assert_eq!(cit.front_loading_baseline, 0.5);
    assert_eq!(cit.context_window, 10);

    let ad = &c.tuning.adaptive;
    assert_eq!((ad.match_deviation, ad.close_deviation, ad.far_deviation), (0.2, 0.4, 0.8));
    assert_eq!((ad.match_step, ad.close_step, ad.far_step), (0.15, 0.05, 0.15));
}
