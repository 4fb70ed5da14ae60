//! Curriculum alerts: creation with cooldown de-duplication, the
//! pending → reviewed → applied/dismissed state machine, and expiry
//! filtering. Applied and dismissed are terminal.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::curriculum::{CurriculumId, LevelId};
use crate::error::CoreError;
use crate::students::{StudentId, TeacherId};

pub type AlertId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LevelProgression,
    CurriculumAdjustment,
    PerformanceAlert,
    CompletionMilestone,
    AttentionNeeded,
    Recommendation,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::LevelProgression => "level_progression",
            AlertType::CurriculumAdjustment => "curriculum_adjustment",
            AlertType::PerformanceAlert => "performance_alert",
            AlertType::CompletionMilestone => "completion_milestone",
            AlertType::AttentionNeeded => "attention_needed",
            AlertType::Recommendation => "recommendation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Pending,
    Reviewed,
    Applied,
    Dismissed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
    Defer,
}

/// Performance figures frozen at alert creation, for the reviewing teacher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub readiness_score: f32,
    pub sessions_in_window: usize,
    pub completion_percentage: f32,
    pub consecutive_days: u32,
}

/// Fields the evaluator supplies when raising an alert.
#[derive(Debug, Clone)]
pub struct AlertDraft {
    pub student_id: StudentId,
    pub teacher_id: TeacherId,
    pub current_curriculum: CurriculumId,
    pub current_level: Option<LevelId>,
    pub suggested_curriculum: Option<CurriculumId>,
    pub suggested_level: Option<LevelId>,
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    pub message: String,
    pub snapshot: PerformanceSnapshot,
    pub requires_teacher_approval: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumAlert {
    pub id: AlertId,
    pub student_id: StudentId,
    pub teacher_id: TeacherId,
    pub current_curriculum: CurriculumId,
    pub current_level: Option<LevelId>,
    pub suggested_curriculum: Option<CurriculumId>,
    pub suggested_level: Option<LevelId>,
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    pub message: String,
    pub snapshot: PerformanceSnapshot,
    pub status: AlertStatus,
    pub requires_teacher_approval: bool,
    pub triggered_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub applied_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<TeacherId>,
    pub review_notes: Option<String>,
    pub decision: Option<ReviewDecision>,
}

/// In-memory alert store. All transitions happen under one write lock, so a
/// status check-and-set is atomic: concurrent writers get exactly one winner.
pub struct AlertStore {
    alerts: RwLock<HashMap<AlertId, CurriculumAlert>>,
    next_id: AtomicU64,
}

impl AlertStore {
    pub fn new() -> Self {
        AlertStore {
            alerts: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn get(&self, id: AlertId) -> Option<CurriculumAlert> {
        self.alerts.read().get(&id).cloned()
    }

    /// Create an alert unless a pending one of the same (student, type) is
    /// younger than the cooldown. Returns None when suppressed.
    pub fn create(
        &self,
        draft: AlertDraft,
        now: DateTime<Utc>,
        cooldown: Duration,
        expiry: Duration,
    ) -> Option<CurriculumAlert> {
        let mut alerts = self.alerts.write();
        let duplicate = alerts.values().any(|a| {
            a.student_id == draft.student_id
                && a.alert_type == draft.alert_type
                && a.status == AlertStatus::Pending
                && a.triggered_at > now - cooldown
        });
        if duplicate {
            tracing::debug!(
                student_id = draft.student_id,
                alert_type = draft.alert_type.as_str(),
                "Alert suppressed by cooldown window"
            );
            return None;
        }

        let alert = CurriculumAlert {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            student_id: draft.student_id,
            teacher_id: draft.teacher_id,
            current_curriculum: draft.current_curriculum,
            current_level: draft.current_level,
            suggested_curriculum: draft.suggested_curriculum,
            suggested_level: draft.suggested_level,
            alert_type: draft.alert_type,
            priority: draft.priority,
            message: draft.message,
            snapshot: draft.snapshot,
            status: AlertStatus::Pending,
            requires_teacher_approval: draft.requires_teacher_approval,
            triggered_at: now,
            reviewed_at: None,
            applied_at: None,
            expires_at: Some(now + expiry),
            reviewed_by: None,
            review_notes: None,
            decision: None,
        };
        alerts.insert(alert.id, alert.clone());
        tracing::info!(
            alert_id = alert.id,
            student_id = alert.student_id,
            alert_type = alert.alert_type.as_str(),
            priority = ?alert.priority,
            "Created curriculum alert"
        );
        Some(alert)
    }

    /// Record a teacher decision: pending → reviewed. A deferred alert may be
    /// re-decided while it stays in reviewed.
    pub fn review(
        &self,
        id: AlertId,
        decision: ReviewDecision,
        reviewer: TeacherId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<CurriculumAlert, CoreError> {
        let mut alerts = self.alerts.write();
        let alert = alerts
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("alert", id))?;
        let re_decidable =
            alert.status == AlertStatus::Reviewed && alert.decision == Some(ReviewDecision::Defer);
        if alert.status != AlertStatus::Pending && !re_decidable {
            return Err(CoreError::conflict(format!(
                "alert {} is {:?}, not reviewable",
                id, alert.status
            )));
        }
        alert.status = AlertStatus::Reviewed;
        alert.decision = Some(decision);
        alert.reviewed_by = Some(reviewer);
        alert.review_notes = notes;
        alert.reviewed_at = Some(now);
        Ok(alert.clone())
    }

    /// Check-and-set reviewed + approved → applied. Exactly one concurrent
    /// caller wins; the rest get a conflict.
    pub fn mark_applied(&self, id: AlertId, now: DateTime<Utc>) -> Result<CurriculumAlert, CoreError> {
        let mut alerts = self.alerts.write();
        let alert = alerts
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("alert", id))?;
        if alert.status != AlertStatus::Reviewed || alert.decision != Some(ReviewDecision::Approve) {
            return Err(CoreError::conflict(format!(
                "alert {} is {:?} with decision {:?}, not applicable",
                id, alert.status, alert.decision
            )));
        }
        alert.status = AlertStatus::Applied;
        alert.applied_at = Some(now);
        Ok(alert.clone())
    }

    /// Roll an applied alert back to reviewed. Only used when the transition
    /// it gated could not be carried out.
    pub fn revert_to_reviewed(&self, id: AlertId) -> Result<CurriculumAlert, CoreError> {
        let mut alerts = self.alerts.write();
        let alert = alerts
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("alert", id))?;
        if alert.status != AlertStatus::Applied {
            return Err(CoreError::conflict(format!(
                "alert {} is {:?}, nothing to revert",
                id, alert.status
            )));
        }
        alert.status = AlertStatus::Reviewed;
        alert.applied_at = None;
        Ok(alert.clone())
    }

    /// Dismiss from pending or reviewed. No side effects beyond status and
    /// timestamp.
    pub fn dismiss(&self, id: AlertId, now: DateTime<Utc>) -> Result<CurriculumAlert, CoreError> {
        let mut alerts = self.alerts.write();
        let alert = alerts
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("alert", id))?;
        if !matches!(alert.status, AlertStatus::Pending | AlertStatus::Reviewed) {
            return Err(CoreError::conflict(format!(
                "alert {} is {:?}, not dismissible",
                id, alert.status
            )));
        }
        alert.status = AlertStatus::Dismissed;
        alert.reviewed_at = alert.reviewed_at.or(Some(now));
        Ok(alert.clone())
    }

    /// Pending alerts, excluding those past their expiry. Expired alerts are
    /// not auto-transitioned; they stay queryable by id for audit.
    pub fn pending(&self, student: Option<StudentId>, now: DateTime<Utc>) -> Vec<CurriculumAlert> {
        let mut result: Vec<CurriculumAlert> = self
            .alerts
            .read()
            .values()
            .filter(|a| a.status == AlertStatus::Pending)
            .filter(|a| a.expires_at.map(|e| e > now).unwrap_or(true))
            .filter(|a| student.map(|s| a.student_id == s).unwrap_or(true))
            .cloned()
            .collect();
        result.sort_by_key(|a| (a.triggered_at, a.id));
        result
    }

    /// Every alert ever raised for a student, newest first. Audit view.
    pub fn history(&self, student: StudentId) -> Vec<CurriculumAlert> {
        let mut result: Vec<CurriculumAlert> = self
            .alerts
            .read()
            .values()
            .filter(|a| a.student_id == student)
            .cloned()
            .collect();
        result.sort_by_key(|a| std::cmp::Reverse((a.triggered_at, a.id)));
        result
    }
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}
