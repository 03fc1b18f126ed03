// Complexity Analyzer
// Readability indices and how evenly complexity is spread across sentences

use crate::models::ComplexityResult;
use crate::services::config_store::ComplexityTuning;
use crate::services::text_processor::{count_syllables, mean, population_variance, split_sentences_spaced};

pub fn flesch_kincaid_grade(words: usize, sentences: usize, syllables: usize) -> f64 {
    if words == 0 || sentences == 0 {
        return 0.0;
    }
    let grade = 0.39 * (words as f64 / sentences as f64) + 11.8 * (syllables as f64 / words as f64) - 15.59;
    grade.max(0.0)
}

pub fn gunning_fog(words: usize, sentences: usize, complex_words: usize) -> f64 {
    if words == 0 || sentences == 0 {
        return 0.0;
    }
    0.4 * (words as f64 / sentences as f64 + 100.0 * complex_words as f64 / words as f64)
}

/// Flesch reading ease, clamped to [0, 100].
pub fn flesch_reading_ease(words: usize, sentences: usize, syllables: usize) -> f64 {
    if words == 0 || sentences == 0 {
        return 0.0;
    }
    let ease = 206.835 - 1.015 * (words as f64 / sentences as f64) - 84.6 * (syllables as f64 / words as f64);
    ease.clamp(0.0, 100.0)
}

/// Weighted blend of length, word length, syllable density and clause count.
pub fn sentence_complexity(sentence: &str) -> f64 {
    let words: Vec<&str> = sentence.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let n = words.len() as f64;
    let avg_word_len = words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / n;
    let syllables = words.iter().map(|w| count_syllables(w)).sum::<usize>() as f64;
    let clauses = (sentence.matches(',').count() + sentence.matches(';').count() + 1) as f64;

    0.4 * n + 0.3 * (avg_word_len * 2.0) + 0.2 * (syllables / n * 10.0) + 0.1 * (clauses * 5.0)
}

pub struct ComplexityAnalyzer<'a> {
    tuning: &'a ComplexityTuning,
}

impl<'a> ComplexityAnalyzer<'a> {
    pub fn new(tuning: &'a ComplexityTuning) -> Self {
        Self { tuning }
    }

    pub fn analyze(&self, text: &str) -> ComplexityResult {
        let sentences = split_sentences_spaced(text);
        let words: Vec<&str> = text.split_whitespace().collect();
        if sentences.is_empty() || words.is_empty() {
            return ComplexityResult::default();
        }

        let syllable_counts: Vec<usize> = words.iter().map(|w| count_syllables(w)).collect();
        let syllables: usize = syllable_counts.iter().sum();
        let complex_words = syllable_counts.iter().filter(|&&s| s >= 3).count();

        let sentence_complexities: Vec<f64> = sentences.iter().map(|s| sentence_complexity(s)).collect();
        let complexity_variance = population_variance(&sentence_complexities);
        let uniformity_score = self.uniformity(complexity_variance);

        let grade = flesch_kincaid_grade(words.len(), sentences.len(), syllables);
        let fog = gunning_fog(words.len(), sentences.len(), complex_words);
        let ease = flesch_reading_ease(words.len(), sentences.len(), syllables);

        let word_lengths: Vec<f64> = words.iter().map(|w| w.chars().count() as f64).collect();

        ComplexityResult {
            flesch_kincaid_grade: grade,
            gunning_fog_index: fog,
            avg_sentence_length: words.len() as f64 / sentences.len() as f64,
            avg_word_length: mean(&word_lengths),
            complexity_variance,
            uniformity_score,
            readability_score: ease,
            overall_ai_score: self.overall(grade, fog, uniformity_score),
            sentence_complexities,
        }
    }

    /// Low variance reads as machine-uniform; the human band scores zero.
    pub fn uniformity(&self, variance: f64) -> f64 {
        if variance < self.tuning.low_variance {
            1.0
        } else if variance < self.tuning.human_variance_min {
            0.7
        } else if variance <= self.tuning.human_variance_max {
            0.0
        } else {
            0.3
        }
    }

    fn overall(&self, grade: f64, fog: f64, uniformity: f64) -> f64 {
        let mut score = 0.6 * uniformity;
        if grade >= self.tuning.grade_min && grade <= self.tuning.grade_max {
            score += 0.2;
        }
        if (grade - fog).abs() < self.tuning.fog_gap {
            score += 0.2;
        }
        f64::min(score, 1.0)
    }
}
