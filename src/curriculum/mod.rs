//! Curricula, ordered levels, and the plans that make up a study program.

pub mod store;
pub mod templates;

use serde::{Deserialize, Serialize};

use crate::quran::VerseRange;

pub type CurriculumId = u64;
pub type LevelId = u64;
pub type PlanId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurriculumKind {
    TeacherLed,
    StudentLed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Lesson,
    MinorReview,
    MajorReview,
}

/// A strictly ordered step within a curriculum. `order` is unique per
/// curriculum and is the advancement key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumLevel {
    pub id: LevelId,
    pub curriculum_id: CurriculumId,
    pub order: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curriculum {
    pub id: CurriculumId,
    pub name: String,
    pub kind: CurriculumKind,
    /// Sorted by `order`, ascending.
    pub levels: Vec<CurriculumLevel>,
}

impl Curriculum {
    pub fn first_level(&self) -> Option<&CurriculumLevel> {
        self.levels.first()
    }

    /// The level after the given one in advancement order.
    pub fn next_level(&self, level_id: LevelId) -> Option<&CurriculumLevel> {
        let position = self.levels.iter().position(|l| l.id == level_id)?;
        self.levels.get(position + 1)
    }
}

/// One assignment unit of a curriculum: a verse range to memorize or review
/// over an expected number of days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumPlan {
    pub id: PlanId,
    pub curriculum_id: CurriculumId,
    pub level_id: Option<LevelId>,
    pub plan_type: PlanType,
    pub range: VerseRange,
    /// Human-readable rendering of `range`, precomputed at insert time.
    pub formatted_content: String,
    pub expected_days: u32,
}

/// A plan not yet validated or assigned an id.
#[derive(Debug, Clone)]
pub struct PlanDraft {
    pub level_id: Option<LevelId>,
    pub plan_type: PlanType,
    pub range: VerseRange,
    pub expected_days: u32,
}
