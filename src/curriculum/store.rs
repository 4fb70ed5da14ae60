use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::curriculum::{
    Curriculum, CurriculumId, CurriculumKind, CurriculumLevel, CurriculumPlan, LevelId, PlanDraft,
    PlanId, PlanType,
};
use crate::error::CoreError;
use crate::quran::{QuranReference, VerseRange};

/// Plans are inserted in batches of this size to bound peak memory on large
/// template generations.
pub const PLAN_INSERT_BATCH: usize = 100;

/// Outcome of a bulk plan insertion.
#[derive(Debug, Clone, Default)]
pub struct InsertReport {
    pub inserted: usize,
    pub skipped_invalid: usize,
}

/// In-memory store for curricula and their plans. Read-mostly reference data,
/// safely shared across concurrent evaluations without per-student locking.
pub struct CurriculumStore {
    curricula: RwLock<HashMap<CurriculumId, Curriculum>>,
    plans: RwLock<HashMap<CurriculumId, Vec<CurriculumPlan>>>,
    next_id: AtomicU64,
}

impl CurriculumStore {
    pub fn new() -> Self {
        CurriculumStore {
            curricula: RwLock::new(HashMap::new()),
            plans: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Create a curriculum with levels ordered as given (order 1..=n).
    pub fn create_curriculum(
        &self,
        name: &str,
        kind: CurriculumKind,
        level_names: &[&str],
    ) -> Curriculum {
        let curriculum_id = self.allocate_id();
        let levels = level_names
            .iter()
            .enumerate()
            .map(|(i, level_name)| CurriculumLevel {
                id: self.allocate_id(),
                curriculum_id,
                order: (i + 1) as u32,
                name: level_name.to_string(),
            })
            .collect();
        let curriculum = Curriculum {
            id: curriculum_id,
            name: name.to_string(),
            kind,
            levels,
        };
        self.curricula
            .write()
            .insert(curriculum_id, curriculum.clone());
        tracing::info!(
            curriculum_id = curriculum_id,
            name = name,
            levels = curriculum.levels.len(),
            "Created curriculum"
        );
        curriculum
    }

    pub fn curriculum(&self, id: CurriculumId) -> Option<Curriculum> {
        self.curricula.read().get(&id).cloned()
    }

    pub fn level(&self, curriculum_id: CurriculumId, level_id: LevelId) -> Option<CurriculumLevel> {
        self.curricula
            .read()
            .get(&curriculum_id)
            .and_then(|c| c.levels.iter().find(|l| l.id == level_id).cloned())
    }

    /// Insert plan drafts in chunks of [`PLAN_INSERT_BATCH`], validating each
    /// range. Malformed drafts are skipped and counted, never inserted.
    pub fn insert_plans_chunked(
        &self,
        curriculum_id: CurriculumId,
        drafts: Vec<PlanDraft>,
        quran: &dyn QuranReference,
    ) -> Result<InsertReport, CoreError> {
        if self.curricula.read().get(&curriculum_id).is_none() {
            return Err(CoreError::not_found("curriculum", curriculum_id));
        }

        let mut report = InsertReport::default();
        for chunk in drafts.chunks(PLAN_INSERT_BATCH) {
            let mut batch: Vec<CurriculumPlan> = Vec::with_capacity(chunk.len());
            for draft in chunk {
                if !quran.validate_range(&draft.range) {
                    tracing::warn!(
                        curriculum_id = curriculum_id,
                        range = ?draft.range,
                        "Skipping plan draft with invalid verse range"
                    );
                    report.skipped_invalid += 1;
                    continue;
                }
                batch.push(CurriculumPlan {
                    id: self.allocate_id(),
                    curriculum_id,
                    level_id: draft.level_id,
                    plan_type: draft.plan_type,
                    range: draft.range,
                    formatted_content: quran.format_range(&draft.range),
                    expected_days: draft.expected_days,
                });
            }
            report.inserted += batch.len();
            self.plans
                .write()
                .entry(curriculum_id)
                .or_default()
                .extend(batch);
            tracing::debug!(
                curriculum_id = curriculum_id,
                inserted = report.inserted,
                "Inserted plan batch"
            );
        }
        Ok(report)
    }

    /// All plans of a curriculum in insertion order.
    pub fn plans(&self, curriculum_id: CurriculumId) -> Vec<CurriculumPlan> {
        self.plans
            .read()
            .get(&curriculum_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn plan(&self, curriculum_id: CurriculumId, plan_id: PlanId) -> Option<CurriculumPlan> {
        self.plans
            .read()
            .get(&curriculum_id)
            .and_then(|plans| plans.iter().find(|p| p.id == plan_id).cloned())
    }

    pub fn plan_count(&self, curriculum_id: CurriculumId) -> usize {
        self.plans
            .read()
            .get(&curriculum_id)
            .map(|p| p.len())
            .unwrap_or(0)
    }

    /// First plan of the given type whose range overlaps `range`.
    /// Used to attach a recitation session to the plan it advances.
    pub fn plan_covering(
        &self,
        curriculum_id: CurriculumId,
        plan_type: PlanType,
        range: &VerseRange,
    ) -> Option<CurriculumPlan> {
        self.plans.read().get(&curriculum_id).and_then(|plans| {
            plans
                .iter()
                .find(|p| p.plan_type == plan_type && p.range.overlaps(range))
                .cloned()
        })
    }

    /// The curriculum's defined start point: the first verse of its first
    /// lesson plan, if any.
    pub fn start_point(&self, curriculum_id: CurriculumId) -> Option<(u16, u16)> {
        self.plans.read().get(&curriculum_id).and_then(|plans| {
            plans
                .iter()
                .find(|p| p.plan_type == PlanType::Lesson)
                .map(|p| p.range.start_key())
        })
    }
}

impl Default for CurriculumStore {
    fn default() -> Self {
        Self::new()
    }
}
