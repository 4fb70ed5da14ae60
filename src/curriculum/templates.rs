//! Bulk plan generation from named templates.
//!
//! A template expands into one plan per selected surah plus the review plans
//! the program calls for. Lesson `expected_days` are apportioned by verse
//! count using the largest-remainder method so they sum exactly to the
//! template's declared duration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::curriculum::{PlanDraft, PlanType};
use crate::error::CoreError;
use crate::quran::{QuranReference, VerseRange, SURAH_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTemplate {
    /// Whole selection in one year: lessons with accompanying minor review
    /// and a closing major review.
    CompleteInOneYear,
    /// Lessons only, compressed schedule.
    FastMemorization,
    /// Major review over already-memorized material.
    IntensiveReview,
}

impl PlanTemplate {
    /// Declared program duration in days.
    pub fn total_days(&self) -> u32 {
        match self {
            PlanTemplate::CompleteInOneYear => 365,
            PlanTemplate::FastMemorization => 180,
            PlanTemplate::IntensiveReview => 90,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlanTemplate::CompleteInOneYear => "complete_in_one_year",
            PlanTemplate::FastMemorization => "fast_memorization",
            PlanTemplate::IntensiveReview => "intensive_review",
        }
    }
}

/// Memorization order of the generated sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateDirection {
    /// Al-Fatihah forward.
    MushafOrder,
    /// Short surahs first, descending from An-Nas.
    JuzAmmaFirst,
}

#[derive(Debug, Clone)]
pub struct TemplateParams {
    pub template: PlanTemplate,
    pub start_date: NaiveDate,
    /// Surah numbers to include; None selects the whole mushaf.
    pub selected_surahs: Option<Vec<u16>>,
    pub direction: TemplateDirection,
}

/// Expand a template into plan drafts. Rejects empty or out-of-range
/// selections before producing anything.
pub fn generate_plans(
    params: &TemplateParams,
    quran: &dyn QuranReference,
) -> Result<Vec<PlanDraft>, CoreError> {
    let mut surahs: Vec<u16> = match &params.selected_surahs {
        Some(selection) => {
            if selection.is_empty() {
                return Err(CoreError::validation("template selection is empty"));
            }
            for &surah in selection {
                if surah < 1 || surah > SURAH_COUNT {
                    return Err(CoreError::validation(format!(
                        "surah {} is outside 1..={}",
                        surah, SURAH_COUNT
                    )));
                }
            }
            let mut sorted = selection.clone();
            sorted.sort_unstable();
            sorted.dedup();
            sorted
        }
        None => (1..=SURAH_COUNT).collect(),
    };
    if params.direction == TemplateDirection::JuzAmmaFirst {
        surahs.reverse();
    }

    let lesson_days = apportion_days(params.template.total_days(), &surahs, quran)?;

    let mut drafts = Vec::with_capacity(surahs.len() * 2 + 1);
    for (&surah, &days) in surahs.iter().zip(lesson_days.iter()) {
        let verse_total = quran
            .verse_count(surah)
            .ok_or_else(|| CoreError::validation(format!("unknown surah {}", surah)))?;
        let range = VerseRange::single(surah, 1, verse_total);
        match params.template {
            PlanTemplate::CompleteInOneYear => {
                drafts.push(PlanDraft {
                    level_id: None,
                    plan_type: PlanType::Lesson,
                    range,
                    expected_days: days,
                });
                // Minor review shadows the lesson at half its pace.
                drafts.push(PlanDraft {
                    level_id: None,
                    plan_type: PlanType::MinorReview,
                    range,
                    expected_days: days.div_ceil(2),
                });
            }
            PlanTemplate::FastMemorization => {
                drafts.push(PlanDraft {
                    level_id: None,
                    plan_type: PlanType::Lesson,
                    range,
                    expected_days: days,
                });
            }
            PlanTemplate::IntensiveReview => {
                drafts.push(PlanDraft {
                    level_id: None,
                    plan_type: PlanType::MajorReview,
                    range,
                    expected_days: days,
                });
            }
        }
    }

    if params.template == PlanTemplate::CompleteInOneYear {
        // Closing major review sweeps the whole selection in mushaf order.
        let first = *surahs.iter().min().unwrap_or(&1);
        let last = *surahs.iter().max().unwrap_or(&1);
        let last_total = quran
            .verse_count(last)
            .ok_or_else(|| CoreError::validation(format!("unknown surah {}", last)))?;
        drafts.push(PlanDraft {
            level_id: None,
            plan_type: PlanType::MajorReview,
            range: VerseRange::spanning(first, 1, last, last_total),
            expected_days: 30,
        });
    }

    tracing::info!(
        template = params.template.label(),
        start_date = %params.start_date,
        surahs = surahs.len(),
        drafts = drafts.len(),
        "Generated template plans"
    );
    Ok(drafts)
}

/// Split `total_days` across surahs proportionally to verse count.
/// Largest-remainder rounding keeps the sum exact; every surah gets at least
/// one day, which can stretch the sum when the selection outnumbers the days.
fn apportion_days(
    total_days: u32,
    surahs: &[u16],
    quran: &dyn QuranReference,
) -> Result<Vec<u32>, CoreError> {
    let verse_counts: Vec<u32> = surahs
        .iter()
        .map(|&s| {
            quran
                .verse_count(s)
                .map(|v| v as u32)
                .ok_or_else(|| CoreError::validation(format!("unknown surah {}", s)))
        })
        .collect::<Result<_, _>>()?;
    let total_verses: u32 = verse_counts.iter().sum();
    if total_verses == 0 {
        return Err(CoreError::validation("selection has no verses"));
    }

    let mut days: Vec<u32> = Vec::with_capacity(surahs.len());
    let mut remainders: Vec<(usize, f64)> = Vec::with_capacity(surahs.len());
    for (i, &verses) in verse_counts.iter().enumerate() {
        let raw = total_days as f64 * verses as f64 / total_verses as f64;
        let base = raw.floor();
        days.push(base as u32);
        remainders.push((i, raw - base));
    }

    let assigned: u32 = days.iter().sum();
    let deficit = total_days.saturating_sub(assigned) as usize;
    remainders.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    for &(index, _) in remainders.iter().take(deficit) {
        days[index] += 1;
    }

    let mut stretched = 0u32;
    for entry in days.iter_mut() {
        if *entry == 0 {
            *entry = 1;
            stretched += 1;
        }
    }
    if stretched > 0 {
        tracing::warn!(
            stretched = stretched,
            total_days = total_days,
            "Selection outnumbers schedule days; duration stretched to one day per surah"
        );
    }
    Ok(days)
}
