//! Daily content calculation.
//!
//! Deterministic page arithmetic over an assignment's current position and
//! paging config: today's memorization block, the minor-review block just
//! behind it, and the major-review block behind that. Past page 604 the
//! calculator reports curriculum completion instead of wrapping.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::quran::{QuranReference, TOTAL_PAGES};
use crate::students::{StudentCurriculum, StudentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u16,
    pub end: u16,
}

impl PageRange {
    pub fn page_count(&self) -> u16 {
        self.end - self.start + 1
    }
}

/// One portion of a day's assignment, with its Arabic description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPortion {
    pub pages: PageRange,
    pub description: String,
}

/// What one student should recite on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAssignment {
    pub student_id: StudentId,
    pub date: NaiveDate,
    pub memorization: Option<ContentPortion>,
    pub minor_review: Option<ContentPortion>,
    pub major_review: Option<ContentPortion>,
    pub curriculum_completed: bool,
}

/// Compute the day's content from the assignment position. Pure; the engine
/// layers the per-day cache on top.
pub fn compute_content(
    assignment: &StudentCurriculum,
    date: NaiveDate,
    quran: &dyn QuranReference,
) -> ContentAssignment {
    if assignment.is_mushaf_finished() {
        return ContentAssignment {
            student_id: assignment.student_id,
            date,
            memorization: None,
            minor_review: None,
            major_review: None,
            curriculum_completed: true,
        };
    }

    let current = assignment.current_page;
    let pacing = &assignment.pacing;

    let memorization = if pacing.memorization_pages > 0 {
        let end = (current + pacing.memorization_pages - 1).min(TOTAL_PAGES);
        Some(portion(PageRange { start: current, end }, quran))
    } else {
        None
    };

    // Minor review walks back over the most recently memorized pages.
    let minor_review = if pacing.minor_review_pages > 0 && current > 1 {
        let end = current - 1;
        let start = end.saturating_sub(pacing.minor_review_pages - 1).max(1);
        Some(portion(PageRange { start, end }, quran))
    } else {
        None
    };

    // Major review covers the block behind the minor-review window.
    let major_review = match (&minor_review, pacing.major_review_pages) {
        (Some(minor), pages) if pages > 0 && minor.pages.start > 1 => {
            let end = minor.pages.start - 1;
            let start = end.saturating_sub(pages - 1).max(1);
            Some(portion(PageRange { start, end }, quran))
        }
        _ => None,
    };

    ContentAssignment {
        student_id: assignment.student_id,
        date,
        memorization,
        minor_review,
        major_review,
        curriculum_completed: false,
    }
}

/// Move the assignment position forward after a completed memorization
/// session: advance by the configured daily pages, maintain the
/// consecutive-days counter and the mushaf completion percentage.
pub fn advance(assignment: &mut StudentCurriculum, date: NaiveDate, quran: &dyn QuranReference) {
    let next_page = (assignment.current_page + assignment.pacing.memorization_pages)
        .min(TOTAL_PAGES + 1);
    assignment.current_page = next_page;
    assignment.completion_percentage =
        assignment.pages_memorized() as f32 / TOTAL_PAGES as f32 * 100.0;

    let position_page = next_page.min(TOTAL_PAGES);
    if let Some(surah) = quran.surah_for_page(position_page) {
        if surah != assignment.current_surah {
            assignment.current_surah = surah;
            assignment.current_ayah = 1;
        }
    }

    match assignment.last_completed_date {
        Some(previous) if previous.succ_opt() == Some(date) => {
            assignment.consecutive_days += 1;
        }
        Some(previous) if previous == date => {
            // Second completion in one day leaves the streak untouched.
        }
        _ => {
            assignment.consecutive_days = 0;
        }
    }
    assignment.last_completed_date = Some(date);

    if assignment.is_mushaf_finished()
        && assignment.status == crate::students::AssignmentStatus::InProgress
    {
        assignment.status = crate::students::AssignmentStatus::Completed;
        assignment.completion_date = Some(date);
        tracing::info!(
            student_id = assignment.student_id,
            assignment_id = assignment.id,
            "Student finished the mushaf under this assignment"
        );
    }
}

fn portion(pages: PageRange, quran: &dyn QuranReference) -> ContentPortion {
    ContentPortion {
        description: describe_pages(&pages, quran),
        pages,
    }
}

/// Arabic rendering of a page block, naming the surah(s) it falls in.
fn describe_pages(pages: &PageRange, quran: &dyn QuranReference) -> String {
    let start_surah = quran.surah_for_page(pages.start);
    let end_surah = quran.surah_for_page(pages.end);
    let start_name = start_surah.and_then(|s| quran.surah_name(s)).unwrap_or("؟");
    let end_name = end_surah.and_then(|s| quran.surah_name(s)).unwrap_or("؟");

    if pages.start == pages.end {
        format!("الصفحة {} (سورة {})", pages.start, start_name)
    } else if start_name == end_name {
        format!(
            "الصفحات {}-{} (سورة {})",
            pages.start, pages.end, start_name
        )
    } else {
        format!(
            "الصفحات {}-{} (من سورة {} إلى سورة {})",
            pages.start, pages.end, start_name, end_name
        )
    }
}
