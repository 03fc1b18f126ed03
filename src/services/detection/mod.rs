// Detection Module
// AI text detection core logic organized into specialized submodules:
// - lexical: five-signal lexical scoring, patterns and statistics
// - sequence_model: n-gram reference model perplexity and repetition
// - complexity: readability variance across sentences
// - citation: citation placement and framing
// - ensemble: weighted fusion and author-baseline adjustment
// - segment_builder: per-paragraph flagged sections
// - engine: orchestrates one detection pass

pub mod lexical;
pub mod sequence_model;
pub mod complexity;
pub mod citation;
pub mod decision;
pub mod ensemble;
pub mod segment_builder;
pub mod suggestions;
pub mod engine;

pub use lexical::{LexicalAnalyzer, LexicalReport, TRANSITION_PATTERN};
pub use sequence_model::{ReferenceModel, ReferenceModelError, SequenceModelAnalyzer};
pub use complexity::ComplexityAnalyzer;
pub use citation::{CitationAnalyzer, GENERIC_FRAMES};
pub use decision::{confidence_level, decide, exit_code, ConfidenceLevel};
pub use ensemble::{adjust, assessment, enhanced_confidence, Adjusted};
pub use segment_builder::{build_flagged_sections, make_segment};
pub use suggestions::{generate_suggestions, suggest_alternatives};
pub use engine::{traced, Detector, Scored, DETECTION_VERSION};
