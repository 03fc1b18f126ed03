// ai-check command line
// Commit-hook entry point: analyze files, print reports, exit 1 on any block

use ai_check::init_logging;
use ai_check::models::{Decision, DetectionResult, EnhancedDetectionResult, HistoryRecord, Suggestion};
use ai_check::services::detection::{exit_code, traced, Detector, ReferenceModel};
use ai_check::services::HistoryTracker;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::json;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable report (default)
    Text,
    /// One JSON document covering every file
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "ai-check")]
#[command(version)]
#[command(about = "Explainable detection of machine-generated prose", long_about = None)]
struct Cli {
    /// Files to analyze
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Detection config (.json, .yaml or .yml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Reference n-gram model artifact (JSON)
    #[arg(long, value_name = "PATH")]
    reference: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Record each result in the history database
    #[arg(long)]
    track: bool,

    /// History database path (defaults to .ai-check/history.db in the working directory)
    #[arg(long, value_name = "PATH", requires = "track")]
    db: Option<PathBuf>,

    /// Commit hash stored with tracked results
    #[arg(long, value_name = "SHA", requires = "track")]
    commit: Option<String>,

    /// Author profile for the adaptive adjustment (implies --enhanced)
    #[arg(long, value_name = "PATH")]
    profile: Option<PathBuf>,

    /// Run sequence-model, complexity and citation analyzers too
    #[arg(long)]
    enhanced: bool,
}

enum Outcome {
    Base(DetectionResult),
    Enhanced(EnhancedDetectionResult),
}

impl Outcome {
    fn base(&self) -> &DetectionResult {
        match self {
            Outcome::Base(r) => r,
            Outcome::Enhanced(r) => &r.base,
        }
    }

    fn decision(&self) -> Decision {
        match self {
            Outcome::Base(r) => r.decision,
            Outcome::Enhanced(r) => r.decision,
        }
    }

    fn confidence(&self) -> f64 {
        match self {
            Outcome::Base(r) => r.overall_confidence,
            Outcome::Enhanced(r) => r.overall_confidence,
        }
    }

    fn history_record(&self, commit: Option<&str>) -> HistoryRecord {
        match self {
            Outcome::Base(r) => HistoryRecord::from_result(r, commit),
            Outcome::Enhanced(r) => HistoryRecord::from_enhanced(r, commit),
        }
    }

    fn to_json(&self, suggestions: &[Suggestion]) -> serde_json::Value {
        let result = match self {
            Outcome::Base(r) => json!(r),
            Outcome::Enhanced(r) => json!(r),
        };
        json!({ "result": result, "suggestions": suggestions })
    }
}

fn build_detector(cli: &Cli) -> Result<Detector> {
    let (detector, problems) = Detector::from_config_file(cli.config.as_deref());
    for problem in &problems {
        warn!(error = %problem, "config.problem");
        eprintln!("warning: {}", problem);
    }
    match &cli.reference {
        Some(path) => {
            let model = ReferenceModel::from_json_file(path)
                .with_context(|| format!("loading reference model {}", path.display()))?;
            info!(path = %path.display(), bigrams = model.bigrams.len(), trigrams = model.trigrams.len(), "reference.loaded");
            Ok(Detector::with_reference(detector.config().clone(), Arc::new(model)))
        }
        None => Ok(detector),
    }
}

fn print_text(out: &mut impl Write, outcome: &Outcome, suggestions: &[Suggestion]) -> io::Result<()> {
    let base = outcome.base();
    writeln!(out, "== {} ==", base.file_path)?;
    writeln!(
        out,
        "Decision: {} ({:.1}% confidence)",
        outcome.decision().as_str(),
        outcome.confidence() * 100.0
    )?;
    let s = &base.scores;
    writeln!(
        out,
        "Scores: grammar {:.0} | sentence {:.0} | paragraph {:.0} | word frequency {:.0} | punctuation {:.0}",
        s.grammar, s.sentence, s.paragraph, s.word_frequency, s.punctuation
    )?;
    writeln!(
        out,
        "Words: {} ({:.2} AI-typical per 1000), avg sentence {:.1} words",
        base.statistics.total_words, base.statistics.ai_words_per_1000, base.statistics.avg_sentence_length
    )?;

    if !base.ai_words_found.is_empty() {
        let mut found: Vec<_> = base.ai_words_found.iter().collect();
        found.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let listed: Vec<String> = found.iter().map(|(w, c)| format!("{} ({})", w, c)).collect();
        writeln!(out, "AI-typical words: {}", listed.join(", "))?;
    }
    for pattern in &base.patterns_detected {
        writeln!(out, "Pattern: {}", pattern)?;
    }
    for section in &base.flagged_sections {
        writeln!(
            out,
            "Flagged lines {}-{} ({:.0}%): {}",
            section.start_line,
            section.end_line,
            section.confidence * 100.0,
            section.content
        )?;
    }

    if let Outcome::Enhanced(r) = outcome {
        writeln!(out)?;
        writeln!(out, "{}", r.assessment)?;
        for w in &r.persistence_warnings {
            writeln!(out, "Profile warning: {}", w)?;
        }
    }

    if !suggestions.is_empty() {
        writeln!(out)?;
        writeln!(out, "Suggestions:")?;
        for s in suggestions {
            writeln!(out, "  [{:?}] {}", s.priority, s.issue)?;
            writeln!(out, "      {}", s.suggestion)?;
            for (word, alternatives) in &s.alternatives {
                writeln!(out, "      {} -> {}", word, alternatives.join(", "))?;
            }
        }
    }
    writeln!(out)
}

fn analyze_file(cli: &Cli, detector: &Detector, path: &Path, enhanced: bool) -> Result<Outcome> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let label = path.display().to_string();

    let outcome = if enhanced {
        Outcome::Enhanced(traced(&label, || {
            detector.analyze_enhanced(&text, &label, cli.profile.as_deref())
        }))
    } else {
        Outcome::Base(traced(&label, || detector.analyze(&text, &label)))
    };
    Ok(outcome)
}

/// Analyze every file and write the report. An unreadable file is reported
/// and skipped; it raises the exit code to 2 without hiding the other results.
fn run(cli: &Cli, out: &mut impl Write) -> Result<i32> {
    let detector = build_detector(cli)?;
    let enhanced = cli.enhanced || cli.profile.is_some();

    let tracker = if cli.track {
        let db = cli.db.clone().unwrap_or_else(HistoryTracker::default_db_path);
        match HistoryTracker::open(&db) {
            Ok(t) => Some(t),
            Err(e) => {
                warn!(db = %db.display(), error = %e, "history.unavailable");
                eprintln!("warning: history disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    let mut code = 0;
    let mut documents = Vec::new();

    for path in &cli.files {
        let outcome = match analyze_file(cli, &detector, path, enhanced) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "cli.file_failed");
                eprintln!("error: {:#}", e);
                code = code.max(2);
                continue;
            }
        };

        if let Some(tracker) = &tracker {
            if let Err(e) = tracker.log(&outcome.history_record(cli.commit.as_deref())) {
                warn!(file = %path.display(), error = %e, "history.log_failed");
            }
        }

        let suggestions = detector.suggestions(outcome.base());
        code = code.max(exit_code(outcome.decision()));

        match cli.format {
            OutputFormat::Text => print_text(out, &outcome, &suggestions)?,
            OutputFormat::Json => documents.push(outcome.to_json(&suggestions)),
        }
    }

    if let OutputFormat::Json = cli.format {
        let doc = if documents.len() == 1 {
            documents.remove(0)
        } else {
            serde_json::Value::Array(documents)
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&doc)?)?;
    }

    Ok(code)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(&cli, &mut io::stdout().lock()) {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ai-check").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_unreadable_file_does_not_hide_other_results() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.md");
        std::fs::write(&good, "A plain note about the garden.").unwrap();
        let missing = dir.path().join("missing.md");

        let args = cli(&[
            "--format",
            "json",
            missing.to_str().unwrap(),
            good.to_str().unwrap(),
        ]);
        let mut out = Vec::new();
        let code = run(&args, &mut out).unwrap();
        assert_eq!(code, 2);

        let doc: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(doc["result"]["filePath"], good.display().to_string());
    }

    #[test]
    fn test_text_report_lists_decision() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.md");
        std::fs::write(&path, "A plain note about the garden.").unwrap();

        let mut out = Vec::new();
        let code = run(&cli(&[path.to_str().unwrap()]), &mut out).unwrap();
        assert_eq!(code, 0);
        let report = String::from_utf8(out).unwrap();
        assert!(report.contains("Decision: approve"));
    }
}
