//! Student-facing records: the directory read interface, the curriculum
//! assignment with its daily-tracking position, and per-plan progress rows.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::curriculum::{CurriculumId, LevelId, PlanId};
use crate::quran::TOTAL_PAGES;

pub type StudentId = u64;
pub type TeacherId = u64;
pub type AssignmentId = u64;

/// Minimal view of a student held by the external directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: StudentId,
    pub name: String,
    pub teacher_id: TeacherId,
    pub active: bool,
}

/// Read access to students, provided by an external collaborator.
pub trait StudentDirectory: Send + Sync {
    fn student(&self, id: StudentId) -> Option<StudentRecord>;
    fn active_students(&self) -> Vec<StudentId>;
}

/// In-memory directory used by tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryDirectory {
    students: RwLock<HashMap<StudentId, StudentRecord>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: StudentRecord) {
        self.students.write().insert(record.id, record);
    }
}

impl StudentDirectory for InMemoryDirectory {
    fn student(&self, id: StudentId) -> Option<StudentRecord> {
        self.students.read().get(&id).cloned()
    }

    fn active_students(&self) -> Vec<StudentId> {
        let mut ids: Vec<StudentId> = self
            .students
            .read()
            .values()
            .filter(|s| s.active)
            .map(|s| s.id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    InProgress,
    Completed,
    Suspended,
    Cancelled,
}

/// Daily paging configuration for one assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingConfig {
    pub memorization_pages: u16,
    pub minor_review_pages: u16,
    pub major_review_pages: u16,
}

/// Versioned audit record of the assignment state replaced by an applied
/// curriculum transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionSnapshot {
    pub version: u8,
    pub curriculum_id: CurriculumId,
    pub level_id: Option<LevelId>,
    pub current_page: u16,
    pub completion_percentage: f32,
    pub consecutive_days: u32,
    pub transitioned_at: DateTime<Utc>,
}

pub const TRANSITION_SNAPSHOT_VERSION: u8 = 1;

/// A student's active enrollment in a curriculum, including the page-level
/// position the daily content calculator advances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentCurriculum {
    pub id: AssignmentId,
    pub student_id: StudentId,
    pub curriculum_id: CurriculumId,
    pub level_id: Option<LevelId>,
    pub teacher_id: TeacherId,
    pub start_date: NaiveDate,
    pub completion_date: Option<NaiveDate>,
    pub status: AssignmentStatus,
    /// Pages memorized over the whole mushaf, as a percentage.
    pub completion_percentage: f32,
    pub pacing: PacingConfig,
    /// Next page to memorize (1-based; > 604 means the mushaf is finished).
    pub current_page: u16,
    pub current_surah: u16,
    pub current_ayah: u16,
    pub consecutive_days: u32,
    pub last_completed_date: Option<NaiveDate>,
    pub previous_assignment: Option<TransitionSnapshot>,
}

impl StudentCurriculum {
    /// Pages fully memorized so far under this assignment's tracking.
    pub fn pages_memorized(&self) -> u16 {
        self.current_page.saturating_sub(1).min(TOTAL_PAGES)
    }

    pub fn is_mushaf_finished(&self) -> bool {
        self.current_page > TOTAL_PAGES
    }

    pub fn snapshot(&self, transitioned_at: DateTime<Utc>) -> TransitionSnapshot {
        TransitionSnapshot {
            version: TRANSITION_SNAPSHOT_VERSION,
            curriculum_id: self.curriculum_id,
            level_id: self.level_id,
            current_page: self.current_page,
            completion_percentage: self.completion_percentage,
            consecutive_days: self.consecutive_days,
            transitioned_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    InProgress,
    Completed,
}

/// Lazily created row tracking one (assignment, plan) pair.
/// `completion_percentage` is derived: completed plans over total plans for
/// the owning assignment, recomputed on every write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentPlanProgress {
    pub id: u64,
    pub assignment_id: AssignmentId,
    pub plan_id: PlanId,
    pub start_date: NaiveDate,
    pub completion_date: Option<NaiveDate>,
    pub status: ProgressStatus,
    pub completion_percentage: f32,
    pub teacher_notes: Option<String>,
}
