// Decision utilities
// Thresholds map a confidence onto the approve / warn / block contract.

use crate::models::Decision;
use crate::services::config_store::Thresholds;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    pub fn verdict(&self) -> &'static str {
        match self {
            Self::Low => "Likely human-written",
            Self::Medium => "Possible AI assistance",
            Self::High => "Likely AI-generated",
        }
    }
}

pub fn confidence_level(confidence: f64, thresholds: &Thresholds) -> ConfidenceLevel {
    if confidence < thresholds.warn_threshold {
        ConfidenceLevel::Low
    } else if confidence < thresholds.block_threshold {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::High
    }
}

/// Below warn approves, below block warns, anything at or above block blocks.
pub fn decide(confidence: f64, thresholds: &Thresholds) -> Decision {
    match confidence_level(confidence, thresholds) {
        ConfidenceLevel::Low => Decision::Approve,
        ConfidenceLevel::Medium => Decision::ApproveWithWarning,
        ConfidenceLevel::High => Decision::Block,
    }
}

/// Process exit code for a decision; only a block fails the hook.
pub fn exit_code(decision: Decision) -> i32 {
    match decision {
        Decision::Block => 1,
        Decision::Approve | Decision::ApproveWithWarning => 0,
    }
}
