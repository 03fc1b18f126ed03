// Suggestion Generator
// Maps triggered signals onto concrete rewrite guidance

use crate::models::{DetectionResult, Priority, Suggestion, SuggestionCategory};
use super::lexical::TRANSITION_PATTERN;
use std::collections::BTreeMap;

pub fn generate_suggestions(result: &DetectionResult) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    if result.scores.sentence > 60.0 {
        suggestions.push(Suggestion {
            category: SuggestionCategory::SentenceStructure,
            issue: "Sentences are too uniform in length".to_string(),
            suggestion: "Vary sentence lengths: mix short (5-10 words), medium (15-20), and long (25-35+) sentences"
                .to_string(),
            example_before: Some(
                "The results showed significant effects. The analysis demonstrated clear patterns. The findings support our hypothesis."
                    .to_string(),
            ),
            example_after: Some(
                "The results were significant. Our analysis showed clear patterns across all conditions, supporting the hypothesis."
                    .to_string(),
            ),
            alternatives: BTreeMap::new(),
            priority: Priority::High,
        });
    }

    if result.scores.word_frequency > 60.0 {
        let mut found: Vec<(&String, &usize)> = result.ai_words_found.iter().collect();
        found.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let listed: Vec<&str> = found.iter().take(3).map(|(w, _)| w.as_str()).collect();
        suggestions.push(Suggestion {
            category: SuggestionCategory::WordChoice,
            issue: format!("High frequency of AI-typical words: {}", listed.join(", ")),
            suggestion: "Replace AI-typical words with simpler alternatives or field-specific terminology".to_string(),
            example_before: Some("This study delves into leveraging robust methodologies".to_string()),
            example_after: Some("We examine how researchers use reliable methods".to_string()),
            alternatives: listed
                .iter()
                .filter_map(|w| suggest_alternatives(w).map(|alts| (w.to_string(), alts)))
                .collect(),
            priority: Priority::High,
        });
    }

    if result.scores.grammar > 70.0 {
        suggestions.push(Suggestion {
            category: SuggestionCategory::WritingStyle,
            issue: "Writing is excessively perfect with no natural variations".to_string(),
            suggestion: "Allow natural imperfections: use contractions where appropriate, vary formality slightly, include field-specific casual phrases"
                .to_string(),
            example_before: None,
            example_after: None,
            alternatives: BTreeMap::new(),
            priority: Priority::Medium,
        });
    }

    if result.scores.paragraph > 60.0 {
        suggestions.push(Suggestion {
            category: SuggestionCategory::ParagraphFlow,
            issue: "Paragraphs follow mechanical structure too consistently".to_string(),
            suggestion: "Vary paragraph lengths (2-8 sentences). Don't force topic-sentence pattern. Use single-sentence paragraphs for emphasis."
                .to_string(),
            example_before: None,
            example_after: None,
            alternatives: BTreeMap::new(),
            priority: Priority::Medium,
        });
    }

    if result.patterns_detected.iter().any(|p| p == TRANSITION_PATTERN) {
        suggestions.push(Suggestion {
            category: SuggestionCategory::WordChoice,
            issue: "Overuse of formal transition words".to_string(),
            suggestion: "Replace formal transitions ('furthermore', 'moreover') with simpler words ('also', 'next') or use dashes/punctuation"
                .to_string(),
            example_before: Some("Furthermore, the results show... Moreover, the analysis reveals...".to_string()),
            example_after: Some("The results also show... Looking closer, the analysis reveals...".to_string()),
            alternatives: BTreeMap::new(),
            priority: Priority::Medium,
        });
    }

    suggestions
}

/// Plainer replacements for a marker word, if any are known.
pub fn suggest_alternatives(word: &str) -> Option<Vec<String>> {
    let alternatives: &[&str] = match word.to_lowercase().as_str() {
        "delve" => &["examine", "explore", "investigate", "study", "analyze"],
        "leverage" => &["use", "apply", "employ"],
        "utilize" => &["use"],
        "robust" => &["strong", "reliable", "thorough", "solid"],
        "comprehensive" => &["complete", "thorough", "full", "detailed"],
        "facilitate" => &["enable", "help", "allow", "support"],
        "furthermore" => &["also", "next", "[remove]"],
        "moreover" => &["also", "[use dash instead]"],
        "consequently" => &["so", "as a result"],
        "subsequently" => &["then", "later", "next"],
        "demonstrate" => &["show", "reveal", "indicate"],
        "implement" => &["use", "apply", "create"],
        _ => return None,
    };
    Some(alternatives.iter().map(|s| s.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Decision, LexicalScores, TextStatistics};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn result(scores: LexicalScores, patterns: Vec<String>) -> DetectionResult {
        let mut words = BTreeMap::new();
        words.insert("delve".to_string(), 4);
        words.insert("robust".to_string(), 1);
        words.insert("leverage".to_string(), 2);
        words.insert("moreover".to_string(), 3);
        DetectionResult {
            file_path: "draft.md".to_string(),
            timestamp: Utc::now(),
            overall_confidence: 0.5,
            decision: Decision::ApproveWithWarning,
            scores,
            ai_words_found: words,
            patterns_detected: patterns,
            flagged_sections: Vec::new(),
            statistics: TextStatistics::default(),
        }
    }

    #[test]
    fn test_quiet_result_has_no_suggestions() {
        assert!(generate_suggestions(&result(LexicalScores::default(), Vec::new())).is_empty());
    }

    #[test]
    fn test_every_trigger() {
        let scores = LexicalScores {
            grammar: 75.0,
            sentence: 65.0,
            paragraph: 65.0,
            word_frequency: 100.0,
            punctuation: 0.0,
        };
        let out = generate_suggestions(&result(scores, vec![TRANSITION_PATTERN.to_string()]));
        let categories: Vec<SuggestionCategory> = out.iter().map(|s| s.category).collect();
        assert_eq!(
            categories,
            vec![
                SuggestionCategory::SentenceStructure,
                SuggestionCategory::WordChoice,
                SuggestionCategory::WritingStyle,
                SuggestionCategory::ParagraphFlow,
                SuggestionCategory::WordChoice,
            ]
        );
        assert_eq!(out[1].issue, "High frequency of AI-typical words: delve, moreover, leverage");
        assert_eq!(out[1].alternatives.len(), 3);
        assert_eq!(out[1].alternatives["leverage"], vec!["use", "apply", "employ"]);
        assert!(out[1].alternatives["delve"].contains(&"explore".to_string()));
        assert!(out[0].alternatives.is_empty());
        assert_eq!(out[0].priority, Priority::High);
        assert!(out[2].example_before.is_none());
    }

    #[test]
    fn test_thresholds_are_strict() {
        let scores = LexicalScores {
            grammar: 70.0,
            sentence: 60.0,
            paragraph: 60.0,
            word_frequency: 60.0,
            punctuation: 100.0,
        };
        assert!(generate_suggestions(&result(scores, Vec::new())).is_empty());
    }

    #[test]
    fn test_alternatives() {
        assert_eq!(suggest_alternatives("Utilize"), Some(vec!["use".to_string()]));
        assert!(suggest_alternatives("delve").unwrap().contains(&"explore".to_string()));
        assert_eq!(suggest_alternatives("table"), None);
    }
}
