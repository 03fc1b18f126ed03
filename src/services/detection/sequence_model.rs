// Sequence Model Analyzer
// Word bigram/trigram surprise against a reference probability table,
// plus repeated-phrase detection

use crate::models::{RepeatedPhrase, SequenceModelResult, UnusualNgram};
use crate::services::config_store::SequenceTuning;
use crate::services::text_processor::sequence_tokens;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const TOP_N: usize = 10;

#[derive(Error, Debug)]
pub enum ReferenceModelError {
    #[error("Failed to read reference model {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse reference model {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid probability {probability} for \"{ngram}\"")]
    InvalidProbability { ngram: String, probability: f64 },
}

/// Reference n-gram probabilities keyed by space-joined lowercase tokens.
///
/// The built-in table is a small academic sample. Real deployments should
/// supply a corpus-derived artifact through [`ReferenceModel::from_json_file`];
/// the detector shares one instance read-only across analyses.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ReferenceModel {
    #[serde(default)]
    pub bigrams: HashMap<String, f64>,
    #[serde(default)]
    pub trigrams: HashMap<String, f64>,
}

impl ReferenceModel {
    pub fn builtin() -> Self {
        let bigrams = [
            ("the study", 0.05),
            ("the results", 0.04),
            ("this study", 0.03),
            ("these results", 0.02),
            ("we found", 0.03),
            ("we observed", 0.02),
            ("our results", 0.03),
            ("our findings", 0.02),
            ("in this", 0.04),
            ("in the", 0.06),
            ("of the", 0.08),
            ("to the", 0.05),
            ("and the", 0.04),
            ("as shown", 0.02),
            ("as described", 0.01),
            // rare in human academic prose
            ("delve into", 0.0005),
            ("leverage the", 0.0003),
            ("utilize the", 0.0008),
            ("robust methodology", 0.0002),
            ("comprehensive analysis", 0.0004),
        ];
        let trigrams = [
            ("in this study", 0.02),
            ("the results show", 0.015),
            ("as shown in", 0.01),
            ("we found that", 0.02),
            ("these findings suggest", 0.01),
            ("our results demonstrate", 0.008),
            ("furthermore it is", 0.0001),
            ("moreover the results", 0.0001),
            ("additionally it should", 0.00008),
        ];
        Self {
            bigrams: bigrams.iter().map(|(k, p)| (k.to_string(), *p)).collect(),
            trigrams: trigrams.iter().map(|(k, p)| (k.to_string(), *p)).collect(),
        }
    }

    /// Load `{"bigrams": {"w1 w2": p}, "trigrams": {"w1 w2 w3": p}}`.
    pub fn from_json_file(path: &Path) -> Result<Self, ReferenceModelError> {
        let content = fs::read_to_string(path).map_err(|source| ReferenceModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: ReferenceModel =
            serde_json::from_str(&content).map_err(|source| ReferenceModelError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        raw.normalized()
    }

    /// Keys that collapse to the same normalized n-gram keep the highest probability.
    fn normalized(self) -> Result<Self, ReferenceModelError> {
        fn clean(table: HashMap<String, f64>) -> Result<HashMap<String, f64>, ReferenceModelError> {
            let mut entries: Vec<(String, f64)> = table.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            let mut cleaned = HashMap::with_capacity(entries.len());
            for (key, p) in entries {
                if !(p > 0.0 && p <= 1.0) {
                    return Err(ReferenceModelError::InvalidProbability { ngram: key, probability: p });
                }
                let key = key.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
                cleaned
                    .entry(key)
                    .and_modify(|existing: &mut f64| *existing = existing.max(p))
                    .or_insert(p);
            }
            Ok(cleaned)
        }
        Ok(Self {
            bigrams: clean(self.bigrams)?,
            trigrams: clean(self.trigrams)?,
        })
    }

    pub fn bigram(&self, a: &str, b: &str) -> Option<f64> {
        self.bigrams.get(&format!("{} {}", a, b)).copied()
    }

    pub fn trigram(&self, a: &str, b: &str, c: &str) -> Option<f64> {
        self.trigrams.get(&format!("{} {} {}", a, b, c)).copied()
    }
}

pub struct SequenceModelAnalyzer<'a> {
    reference: &'a ReferenceModel,
    tuning: &'a SequenceTuning,
}

impl<'a> SequenceModelAnalyzer<'a> {
    pub fn new(reference: &'a ReferenceModel, tuning: &'a SequenceTuning) -> Self {
        Self { reference, tuning }
    }

    pub fn analyze(&self, text: &str) -> SequenceModelResult {
        let tokens = sequence_tokens(text);
        if tokens.len() < 3 {
            return SequenceModelResult::default();
        }

        let bigrams: Vec<&[String]> = tokens.windows(2).collect();
        let trigrams: Vec<&[String]> = tokens.windows(3).collect();

        let (bigram_score, unusual_bigrams) = self.score_ngrams(
            &bigrams,
            |g| self.reference.bigram(&g[0], &g[1]),
            self.tuning.default_bigram_probability,
            self.tuning.unusual_bigram_probability,
        );
        let (trigram_score, unusual_trigrams) = self.score_ngrams(
            &trigrams,
            |g| self.reference.trigram(&g[0], &g[1], &g[2]),
            self.tuning.default_trigram_probability,
            self.tuning.unusual_trigram_probability,
        );
        let (repetition_score, repetitive_phrases) = self.repetition(&tokens);
        let perplexity = self.perplexity(&bigrams);
        let transition_anomaly_score = self.transition_anomaly(perplexity);

        let overall_score = 0.30 * bigram_score
            + 0.30 * trigram_score
            + 0.25 * transition_anomaly_score
            + 0.15 * repetition_score;

        SequenceModelResult {
            bigram_score,
            trigram_score,
            transition_anomaly_score,
            repetition_score,
            overall_score: overall_score.clamp(0.0, 1.0),
            perplexity,
            unusual_bigrams: unusual_bigrams.into_iter().take(TOP_N).collect(),
            unusual_trigrams: unusual_trigrams.into_iter().take(TOP_N).collect(),
            repetitive_phrases: repetitive_phrases.into_iter().take(TOP_N).collect(),
        }
    }

    /// Flags each occurrence that is rare in the reference or over-repeated in
    /// this text. The score counts occurrences; the returned list is distinct.
    fn score_ngrams<F>(
        &self,
        grams: &[&[String]],
        lookup: F,
        default_probability: f64,
        unusual_probability: f64,
    ) -> (f64, Vec<UnusualNgram>)
    where
        F: Fn(&[String]) -> Option<f64>,
    {
        if grams.is_empty() {
            return (0.0, Vec::new());
        }

        let mut counts: HashMap<&[String], usize> = HashMap::new();
        for g in grams {
            *counts.entry(*g).or_insert(0) += 1;
        }

        let total = grams.len() as f64;
        let mut flagged = 0usize;
        let mut seen: HashSet<&[String]> = HashSet::new();
        let mut unusual = Vec::new();

        for g in grams {
            let expected = lookup(*g).unwrap_or(default_probability);
            let observed = counts[*g] as f64 / total;
            let probability = if expected < unusual_probability {
                expected
            } else if observed > expected * self.tuning.over_repeat_factor {
                observed
            } else {
                continue;
            };
            flagged += 1;
            if seen.insert(*g) {
                unusual.push(UnusualNgram {
                    tokens: g.to_vec(),
                    probability,
                });
            }
        }

        unusual.sort_by(|a, b| {
            a.probability
                .partial_cmp(&b.probability)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.tokens.cmp(&b.tokens))
        });

        let score = f64::min(1.0, flagged as f64 / total * self.tuning.unusual_scale);
        (score, unusual)
    }

    /// 3-, 4- and 5-word phrases seen at least the configured number of times.
    fn repetition(&self, tokens: &[String]) -> (f64, Vec<RepeatedPhrase>) {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for n in 3..=5 {
            for window in tokens.windows(n) {
                *counts.entry(window.join(" ")).or_insert(0) += 1;
            }
        }

        let mut repeated: Vec<RepeatedPhrase> = counts
            .into_iter()
            .filter(|(_, count)| *count >= self.tuning.repetition_min_count)
            .map(|(phrase, count)| RepeatedPhrase { phrase, count })
            .collect();
        repeated.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.phrase.cmp(&b.phrase)));

        let covered: usize = repeated
            .iter()
            .map(|r| r.phrase.split(' ').count() * r.count)
            .sum();
        let score = f64::min(1.0, covered as f64 / tokens.len().max(1) as f64);
        (score, repeated)
    }

    /// exp(mean negative log probability) over bigrams, unseen pairs at the default.
    fn perplexity(&self, bigrams: &[&[String]]) -> f64 {
        if bigrams.is_empty() {
            return 0.0;
        }
        let total_neg_log: f64 = bigrams
            .iter()
            .map(|g| {
                let p = self
                    .reference
                    .bigram(&g[0], &g[1])
                    .unwrap_or(self.tuning.default_bigram_probability);
                -p.ln()
            })
            .sum();
        (total_neg_log / bigrams.len() as f64).exp()
    }

    fn transition_anomaly(&self, perplexity: f64) -> f64 {
        let low = self.tuning.perplexity_low;
        let high = self.tuning.perplexity_high;
        if perplexity < low {
            (low - perplexity) / low
        } else if perplexity > high {
            f64::min(1.0, (perplexity - high) / high)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(text: &str) -> SequenceModelResult {
        let reference = ReferenceModel::builtin();
        let tuning = SequenceTuning::default();
        SequenceModelAnalyzer::new(&reference, &tuning).analyze(text)
    }

    #[test]
    fn test_fewer_than_three_tokens() {
        assert_eq!(analyze("Two words."), SequenceModelResult::default());
        assert_eq!(analyze(""), SequenceModelResult::default());
    }

    #[test]
    fn test_rare_bigram_is_flagged() {
        let result = analyze("We delve into the archive.");
        let first = &result.unusual_bigrams[0];
        assert_eq!(first.tokens, vec!["delve".to_string(), "into".to_string()]);
        assert_eq!(first.probability, 0.0005);
        assert!(result.bigram_score > 0.0);
    }

    #[test]
    fn test_unseen_text_has_default_perplexity() {
        // every bigram falls back to 0.01, so perplexity is 100 and inside the band
        let result = analyze("Purple cats sleep quietly near warm stones");
        assert!((result.perplexity - 100.0).abs() < 1e-6);
        assert_eq!(result.transition_anomaly_score, 0.0);
    }

    #[test]
    fn test_predictable_text_raises_transition_anomaly() {
        let result = analyze("of the of the of the of the");
        // bigrams alternate between 0.08 and the 0.01 default
        assert!(result.perplexity < 50.0);
        assert!(result.transition_anomaly_score > 0.0);
    }

    #[test]
    fn test_repetition_detected() {
        let text = "the cat sat down. the cat sat down. the cat sat down.";
        let result = analyze(text);
        assert_eq!(result.repetitive_phrases[0].count, 3);
        assert_eq!(result.repetition_score, 1.0);
    }

    #[test]
    fn test_detail_lists_are_capped() {
        let words: Vec<String> = (0..200).map(|i| format!("w{}", i % 7)).collect();
        let result = analyze(&words.join(" "));
        assert!(result.unusual_bigrams.len() <= 10);
        assert!(result.repetitive_phrases.len() <= 10);
        assert!((0.0..=1.0).contains(&result.overall_score));
    }

    #[test]
    fn test_reference_model_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, r#"{"bigrams": {"Purple  Cats": 0.2}, "trigrams": {}}"#).unwrap();
        let model = ReferenceModel::from_json_file(&path).unwrap();
        assert_eq!(model.bigram("purple", "cats"), Some(0.2));
        assert!(model.trigrams.is_empty());
    }

    #[test]
    fn test_colliding_keys_keep_highest_probability() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(
            &path,
            r#"{"bigrams": {"Purple Cats": 0.1, "purple  cats": 0.4, "PURPLE cats": 0.2}, "trigrams": {}}"#,
        )
        .unwrap();
        for _ in 0..5 {
            let model = ReferenceModel::from_json_file(&path).unwrap();
            assert_eq!(model.bigrams.len(), 1);
            assert_eq!(model.bigram("purple", "cats"), Some(0.4));
        }
    }

    #[test]
    fn test_reference_model_rejects_bad_probability() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, r#"{"bigrams": {"a b": 0.0}}"#).unwrap();
        assert!(matches!(
            ReferenceModel::from_json_file(&path),
            Err(ReferenceModelError::InvalidProbability { .. })
        ));
    }
}
