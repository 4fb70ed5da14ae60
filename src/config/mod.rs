use serde::{Deserialize, Serialize};
use std::path::Path;

/// Grade thresholds for classifying a recitation into a qualitative rating.
/// Bands are total and non-overlapping: a grade lands in the highest band
/// whose threshold it meets (>=), else in the lowest band.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeBands {
    pub excellent: f32,
    pub very_good: f32,
    pub good: f32,
    pub acceptable: f32,
}

impl Default for GradeBands {
    fn default() -> Self {
        GradeBands {
            excellent: 90.0,
            very_good: 80.0,
            good: 70.0,
            acceptable: 60.0,
        }
    }
}

/// Parameters for the windowed performance analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Session history window in days
    pub window_days: i64,
    /// Minimum completed sessions before a trend is reported
    pub trend_min_sessions: usize,
    /// Half-window mean difference beyond which the trend is non-stable
    pub trend_delta: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            window_days: 14,
            trend_min_sessions: 4,
            trend_delta: 5.0,
        }
    }
}

/// Weights and cutoffs for the progression readiness rubric.
/// Sub-weights sum to 100; each sub-score is capped at its weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub completion_weight: f32,
    pub performance_weight: f32,
    pub consistency_weight: f32,
    pub mastery_weight: f32,
    pub tenure_weight: f32,
    /// Total score at or above which a student is considered ready
    pub ready_cutoff: f32,
    pub excellent_cutoff: f32,
    pub very_good_cutoff: f32,
    pub needs_improvement_cutoff: f32,
    /// Consistency decay per day of inactivity beyond the first
    pub inactivity_decay_per_day: f32,
    /// Days-in-curriculum sweet spot for the time-investment criterion
    pub tenure_sweet_spot_min: i64,
    pub tenure_sweet_spot_max: i64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        ReadinessConfig {
            completion_weight: 25.0,
            performance_weight: 25.0,
            consistency_weight: 20.0,
            mastery_weight: 20.0,
            tenure_weight: 10.0,
            ready_cutoff: 65.0,
            excellent_cutoff: 85.0,
            very_good_cutoff: 75.0,
            needs_improvement_cutoff: 50.0,
            inactivity_decay_per_day: 10.0,
            tenure_sweet_spot_min: 30,
            tenure_sweet_spot_max: 90,
        }
    }
}

/// Alert lifecycle parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Same-type alerts for one student are suppressed within this window
    pub cooldown_days: i64,
    /// Pending alerts drop out of pending queries after this many days
    pub expiry_days: i64,
    /// Readiness score at or above which a progression alert is high priority
    pub high_priority_score: f32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        AlertConfig {
            cooldown_days: 7,
            expiry_days: 30,
            high_priority_score: 85.0,
        }
    }
}

/// Default daily paging when an assignment does not override it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingDefaults {
    pub memorization_pages: u16,
    pub minor_review_pages: u16,
    pub major_review_pages: u16,
}

impl Default for PacingDefaults {
    fn default() -> Self {
        PacingDefaults {
            memorization_pages: 1,
            minor_review_pages: 4,
            major_review_pages: 10,
        }
    }
}

/// Every threshold the engine applies, grouped in one place so the scorer,
/// analyzer and alert manager cannot drift apart on a shared constant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub grades: GradeBands,
    pub analyzer: AnalyzerConfig,
    pub readiness: ReadinessConfig,
    pub alerts: AlertConfig,
    pub pacing: PacingDefaults,
}

impl EngineConfig {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file is missing or does not parse.
    pub fn load(path: &Path) -> EngineConfig {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<EngineConfig>(&content) {
                Ok(config) => {
                    tracing::info!(path = ?path, "Loaded engine config");
                    config
                }
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "Failed to parse engine config, using defaults");
                    EngineConfig::default()
                }
            },
            Err(e) => {
                tracing::debug!(path = ?path, error = %e, "No engine config file, using defaults");
                EngineConfig::default()
            }
        }
    }
}
