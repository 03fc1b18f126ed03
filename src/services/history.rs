// Detection History Service
// Append-only SQLite log of analyses with per-file trend reporting

use crate::models::{HistoryRecord, Trend, TrendReport};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info};

const TREND_WINDOW: usize = 3;
const TREND_HISTORY_LIMIT: usize = 100;
const REPORT_ROWS: usize = 5;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("History database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("History serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("History I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("History connection lock poisoned")]
    Poisoned,
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS ai_check_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file_path TEXT NOT NULL,
        git_commit TEXT,
        timestamp TEXT NOT NULL, -- RFC 3339, fixed width so text order is time order
        overall_confidence REAL NOT NULL,
        grammar_score REAL NOT NULL,
        sentence_score REAL NOT NULL,
        paragraph_score REAL NOT NULL,
        word_frequency_score REAL NOT NULL,
        punctuation_score REAL NOT NULL,
        ai_words_found TEXT NOT NULL,
        patterns_detected TEXT NOT NULL,
        total_words INTEGER NOT NULL,
        ai_words_per_1000 REAL NOT NULL,
        avg_sentence_length REAL NOT NULL,
        sentence_length_variance REAL NOT NULL,
        sequence_model_score REAL,
        complexity_score REAL,
        citation_score REAL
    );
    CREATE INDEX IF NOT EXISTS idx_history_file_path ON ai_check_history(file_path);
    CREATE INDEX IF NOT EXISTS idx_history_timestamp ON ai_check_history(timestamp);
";

pub struct HistoryTracker {
    conn: Mutex<Connection>,
}

impl HistoryTracker {
    /// Default location inside the working tree.
    pub fn default_db_path() -> PathBuf {
        PathBuf::from(".ai-check").join("history.db")
    }

    pub fn open(db_path: &Path) -> Result<Self, HistoryError> {
        if let Some(dir) = db_path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(|source| HistoryError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
        }
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, HistoryError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, HistoryError> {
        conn.execute_batch(
            "
            PRAGMA busy_timeout = 5000;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Append one row. Existing rows are never touched.
    pub fn log(&self, record: &HistoryRecord) -> Result<i64, HistoryError> {
        let ai_words = serde_json::to_string(&record.ai_words_found)?;
        let patterns = serde_json::to_string(&record.patterns_detected)?;
        let conn = self.conn.lock().map_err(|_| HistoryError::Poisoned)?;
        conn.execute(
            "INSERT INTO ai_check_history (
                file_path, git_commit, timestamp, overall_confidence,
                grammar_score, sentence_score, paragraph_score, word_frequency_score, punctuation_score,
                ai_words_found, patterns_detected, total_words, ai_words_per_1000,
                avg_sentence_length, sentence_length_variance,
                sequence_model_score, complexity_score, citation_score
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            params![
                record.file_path,
                record.git_commit,
                record.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
                record.overall_confidence,
                record.grammar_score,
                record.sentence_score,
                record.paragraph_score,
                record.word_frequency_score,
                record.punctuation_score,
                ai_words,
                patterns,
                record.total_words as i64,
                record.ai_words_per_1000,
                record.avg_sentence_length,
                record.sentence_length_variance,
                record.sequence_model_score,
                record.complexity_score,
                record.citation_score,
            ],
        )?;
        let id = conn.last_insert_rowid();
        info!(file = %record.file_path, id, confidence = record.overall_confidence, "history.logged");
        Ok(id)
    }

    /// Most recent first.
    pub fn get_history(&self, file_path: &str, limit: usize) -> Result<Vec<HistoryRecord>, HistoryError> {
        let conn = self.conn.lock().map_err(|_| HistoryError::Poisoned)?;
        let mut stmt = conn.prepare(
            "SELECT id, file_path, git_commit, timestamp, overall_confidence,
                    grammar_score, sentence_score, paragraph_score, word_frequency_score, punctuation_score,
                    ai_words_found, patterns_detected, total_words, ai_words_per_1000,
                    avg_sentence_length, sentence_length_variance,
                    sequence_model_score, complexity_score, citation_score
             FROM ai_check_history
             WHERE file_path = ?1
             ORDER BY timestamp DESC, id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![file_path, limit as i64], read_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row??);
        }
        debug!(file = file_path, rows = records.len(), "history.read");
        Ok(records)
    }

    /// `None` when the file has never been checked.
    pub fn trend_report(&self, file_path: &str) -> Result<Option<TrendReport>, HistoryError> {
        let history = self.get_history(file_path, TREND_HISTORY_LIMIT)?;
        let Some(latest) = history.first() else {
            return Ok(None);
        };
        let confidences: Vec<f64> = history.iter().map(|r| r.overall_confidence).collect();
        Ok(Some(TrendReport {
            file_path: file_path.to_string(),
            check_count: history.len(),
            current_confidence: latest.overall_confidence,
            trend: compute_trend(&confidences),
            history: history.into_iter().take(REPORT_ROWS).collect(),
        }))
    }
}

/// Compare the mean of the newest three confidences with the three before them.
/// Input is newest first.
pub fn compute_trend(confidences: &[f64]) -> Trend {
    if confidences.len() <= TREND_WINDOW {
        return Trend::Stable;
    }
    let recent = &confidences[..TREND_WINDOW];
    let older_end = (TREND_WINDOW * 2).min(confidences.len());
    let older = &confidences[TREND_WINDOW..older_end];

    let recent_avg = recent.iter().sum::<f64>() / recent.len() as f64;
    let older_avg = older.iter().sum::<f64>() / older.len() as f64;

    if recent_avg < older_avg * 0.8 {
        Trend::Improving
    } else if recent_avg > older_avg * 1.2 {
        Trend::Worsening
    } else {
        Trend::Stable
    }
}

// Row decoding errors from JSON columns surface as the outer Result.
fn read_row(row: &Row<'_>) -> rusqlite::Result<Result<HistoryRecord, HistoryError>> {
    let timestamp: String = row.get(3)?;
    let ai_words: String = row.get(10)?;
    let patterns: String = row.get(11)?;
    let total_words: i64 = row.get(12)?;

    let timestamp = match DateTime::parse_from_rfc3339(&timestamp) {
        Ok(ts) => ts.with_timezone(&Utc),
        Err(e) => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                Box::new(e),
            ))
        }
    };
    let ai_words_found = match serde_json::from_str(&ai_words) {
        Ok(v) => v,
        Err(e) => return Ok(Err(e.into())),
    };
    let patterns_detected = match serde_json::from_str(&patterns) {
        Ok(v) => v,
        Err(e) => return Ok(Err(e.into())),
    };

    Ok(Ok(HistoryRecord {
        id: Some(row.get(0)?),
        file_path: row.get(1)?,
        git_commit: row.get(2)?,
        timestamp,
        overall_confidence: row.get(4)?,
        grammar_score: row.get(5)?,
        sentence_score: row.get(6)?,
        paragraph_score: row.get(7)?,
        word_frequency_score: row.get(8)?,
        punctuation_score: row.get(9)?,
        ai_words_found,
        patterns_detected,
        total_words: total_words.max(0) as usize,
        ai_words_per_1000: row.get(13)?,
        avg_sentence_length: row.get(14)?,
        sentence_length_variance: row.get(15)?,
        sequence_model_score: row.get(16)?,
        complexity_score: row.get(17)?,
        citation_score: row.get(18)?,
    }))
}
