//! Windowed performance analysis over a student's recent sessions.
//!
//! Pure functions of the session slice they are given: "no history" is a
//! normal state answered with zero/insufficient-data sentinels, never an
//! error.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::AnalyzerConfig;
use crate::sessions::{RecitationSession, SessionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
    InsufficientData,
}

/// Aggregated view of one student's recent sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub window_days: i64,
    pub total_sessions: usize,
    pub completed_sessions: usize,
    /// completed / total × 100; 0 with no sessions
    pub completion_rate: f32,
    /// Mean grade over completed sessions; 0 with none
    pub average_score: f32,
    /// Total errors per session
    pub error_rate: f32,
    /// Distinct active days / window days × 100
    pub consistency_rate: f32,
    pub distinct_active_days: usize,
    pub trend: Trend,
}

impl PerformanceSummary {
    pub fn empty(window_days: i64) -> Self {
        PerformanceSummary {
            window_days,
            total_sessions: 0,
            completed_sessions: 0,
            completion_rate: 0.0,
            average_score: 0.0,
            error_rate: 0.0,
            consistency_rate: 0.0,
            distinct_active_days: 0,
            trend: Trend::InsufficientData,
        }
    }
}

/// Analyze the sessions recorded in the `window_days` ending at `today`.
/// Sessions outside the window are ignored; the slice does not need to be
/// pre-filtered or sorted.
pub fn analyze(
    sessions: &[RecitationSession],
    today: NaiveDate,
    config: &AnalyzerConfig,
) -> PerformanceSummary {
    let window_start = today - Duration::days(config.window_days - 1);
    let mut windowed: Vec<&RecitationSession> = sessions
        .iter()
        .filter(|s| {
            let day = s.recorded_at.date_naive();
            day >= window_start && day <= today
        })
        .collect();
    windowed.sort_by_key(|s| s.recorded_at);

    if windowed.is_empty() {
        return PerformanceSummary::empty(config.window_days);
    }

    let total_sessions = windowed.len();
    let completed: Vec<&&RecitationSession> = windowed
        .iter()
        .filter(|s| s.status == SessionStatus::Completed)
        .collect();
    let completed_sessions = completed.len();

    let completion_rate = completed_sessions as f32 / total_sessions as f32 * 100.0;
    let average_score = if completed_sessions > 0 {
        completed.iter().map(|s| s.grade).sum::<f32>() / completed_sessions as f32
    } else {
        0.0
    };
    let total_errors: u32 = windowed.iter().map(|s| s.total_errors).sum();
    let error_rate = total_errors as f32 / total_sessions as f32;

    let active_days: BTreeSet<NaiveDate> =
        windowed.iter().map(|s| s.recorded_at.date_naive()).collect();
    let distinct_active_days = active_days.len();
    let consistency_rate = distinct_active_days as f32 / config.window_days as f32 * 100.0;

    let grades: Vec<f32> = completed.iter().map(|s| s.grade).collect();
    let trend = compute_trend(&grades, config);

    PerformanceSummary {
        window_days: config.window_days,
        total_sessions,
        completed_sessions,
        completion_rate,
        average_score,
        error_rate,
        consistency_rate,
        distinct_active_days,
        trend,
    }
}

/// Compare the mean of the most recent half of grades against the earlier
/// half. `grades` must be in chronological order.
fn compute_trend(grades: &[f32], config: &AnalyzerConfig) -> Trend {
    if grades.len() < config.trend_min_sessions {
        return Trend::InsufficientData;
    }
    let midpoint = grades.len() / 2;
    let early = &grades[..midpoint];
    let recent = &grades[midpoint..];
    let early_mean = early.iter().sum::<f32>() / early.len() as f32;
    let recent_mean = recent.iter().sum::<f32>() / recent.len() as f32;
    let delta = recent_mean - early_mean;
    if delta > config.trend_delta {
        Trend::Improving
    } else if delta < -config.trend_delta {
        Trend::Declining
    } else {
        Trend::Stable
    }
}
