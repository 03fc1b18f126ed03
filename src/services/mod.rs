// Detection Services
// Text processing, configuration, analyzers and persistence

pub mod text_processor;
pub mod config_store;
pub mod detection;
pub mod profile_store;
pub mod history;

pub use config_store::{ConfigError, ConfigStore, DetectionConfig};
pub use history::{HistoryError, HistoryTracker};
pub use profile_store::{ProfileError, ProfileStore};
