pub mod alerts;
pub mod analytics;
pub mod config;
pub mod curriculum;
pub mod engine;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod notify;
pub mod quran;
pub mod readiness;
pub mod sessions;
pub mod state;
pub mod students;
pub mod tracking;

pub use config::EngineConfig;
pub use engine::ProgressionEngine;
pub use error::CoreError;
