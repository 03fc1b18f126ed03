// Citation Pattern Analyzer
// Where citations sit, how they are introduced, and how varied the sources are

use crate::models::CitationResult;
use crate::services::config_store::CitationTuning;
use crate::services::text_processor::population_variance;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const MAX_CONTEXTS: usize = 10;

pub const GENERIC_FRAMES: &[&str] = &[
    "as noted by",
    "as shown by",
    "as demonstrated by",
    "according to",
    "as stated by",
    "as mentioned by",
    "as discussed by",
    "as reported by",
    "as indicated by",
    "as suggested by",
    "as described by",
    "as explained by",
    "previous research has shown",
    "studies have shown",
    "research has demonstrated",
    "it has been shown",
    "it has been demonstrated",
];

fn citation_patterns() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        [
            // (Smith, 2020) / (Smith et al., 2020) / (Smith and Jones 2020)
            r"\([A-Z][a-z]+(?:\s+(?:et\s+al\.|and\s+[A-Z][a-z]+))?,?\s+\d{4}[a-z]?\)",
            // Smith (2020)
            r"[A-Z][a-z]+(?:\s+(?:et\s+al\.|and\s+[A-Z][a-z]+))?\s+\(\d{4}[a-z]?\)",
            // [12]
            r"\[\d+\]",
            // [Smith, 2020]
            r"\[[A-Z][a-z]+(?:\s+(?:et\s+al\.))?,?\s+\d{4}[a-z]?\]",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("citation regex"))
        .collect()
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct CitationMatch {
    pub text: String,
    /// Whitespace-delimited words preceding the match.
    pub word_position: usize,
    pub context: String,
}

/// Every citation occurrence, ordered by word position.
pub fn find_citations(text: &str, context_window: usize) -> Vec<CitationMatch> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut found = Vec::new();

    for re in citation_patterns() {
        for m in re.find_iter(text) {
            let word_position = text[..m.start()].split_whitespace().count();
            let start = word_position.saturating_sub(context_window);
            let end = (word_position + context_window).min(words.len());
            let context = if start < end { words[start..end].join(" ") } else { String::new() };
            found.push(CitationMatch {
                text: m.as_str().to_string(),
                word_position,
                context,
            });
        }
    }

    found.sort_by(|a, b| {
        a.word_position
            .cmp(&b.word_position)
            .then_with(|| a.text.cmp(&b.text))
            .then_with(|| a.context.cmp(&b.context))
    });
    found
}

pub struct CitationAnalyzer<'a> {
    tuning: &'a CitationTuning,
}

impl<'a> CitationAnalyzer<'a> {
    pub fn new(tuning: &'a CitationTuning) -> Self {
        Self { tuning }
    }

    pub fn analyze(&self, text: &str) -> CitationResult {
        let citations = find_citations(text, self.tuning.context_window);
        if citations.is_empty() {
            return CitationResult::default();
        }

        let total_words = text.split_whitespace().count();
        let total = citations.len();
        let unique = citations.iter().map(|c| c.text.as_str()).collect::<HashSet<_>>().len();
        let positions: Vec<usize> = citations.iter().map(|c| c.word_position).collect();
        let contexts: Vec<String> = citations.iter().map(|c| c.context.clone()).collect();

        let front_loading_score = self.front_loading(&positions, total_words);
        let (generic_frame_score, generic_frames_found) = generic_frames(text, &contexts);
        let cluster_score = self.clustering(&positions);
        let citation_diversity = unique as f64 / total as f64;

        let overall = 0.30 * front_loading_score
            + 0.40 * generic_frame_score
            + 0.20 * cluster_score
            + 0.10 * (1.0 - citation_diversity);

        CitationResult {
            total_citations: total,
            unique_citations: unique,
            citation_density: total as f64 / total_words.max(1) as f64 * 1000.0,
            front_loading_score,
            generic_frame_score,
            cluster_score,
            citation_diversity,
            overall_ai_score: overall.clamp(0.0, 1.0),
            generic_frames_found,
            citation_positions: positions,
            citation_contexts: contexts.into_iter().take(MAX_CONTEXTS).collect(),
        }
    }

    /// Share of citations in the first third, scored only above the baseline.
    pub fn front_loading(&self, positions: &[usize], total_words: usize) -> f64 {
        if positions.is_empty() || total_words == 0 {
            return 0.0;
        }
        let first_third = total_words as f64 / 3.0;
        let early = positions.iter().filter(|&&p| (p as f64) < first_third).count();
        let proportion = early as f64 / positions.len() as f64;
        let baseline = self.tuning.front_loading_baseline;
        if proportion > baseline {
            f64::min(1.0, (proportion - baseline) / (1.0 - baseline))
        } else {
            0.0
        }
    }

    /// Dispersion of gaps between consecutive citations. Both very irregular and
    /// very even spacing score above zero.
    pub fn clustering(&self, positions: &[usize]) -> f64 {
        if positions.len() < 2 {
            return 0.0;
        }
        let distances: Vec<f64> = positions.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
        let mean = distances.iter().sum::<f64>() / distances.len() as f64;
        if mean == 0.0 {
            return 1.0;
        }
        let cv = population_variance(&distances).sqrt() / mean;
        let low = self.tuning.cluster_low_cv;
        let high = self.tuning.cluster_high_cv;
        if cv > high {
            f64::min(1.0, (cv - high) / high)
        } else if cv < low {
            (low - cv) / low
        } else {
            0.0
        }
    }
}

/// Fraction of citation contexts containing a formulaic introducer, plus the
/// distinct frames present anywhere in the text.
pub fn generic_frames(text: &str, contexts: &[String]) -> (f64, Vec<String>) {
    let lowered = text.to_lowercase();
    let found: Vec<String> = GENERIC_FRAMES
        .iter()
        .filter(|f| lowered.contains(*f))
        .map(|f| f.to_string())
        .collect();

    if contexts.is_empty() {
        return (0.0, Vec::new());
    }
    let framed = contexts
        .iter()
        .filter(|c| {
            let c = c.to_lowercase();
            GENERIC_FRAMES.iter().any(|f| c.contains(f))
        })
        .count();
    (framed as f64 / contexts.len() as f64, found)
}
