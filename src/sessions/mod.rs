//! Recitation sessions and their child error rows.
//!
//! A session may be opened `ongoing` and finalized later; evaluation and
//! daily-tracking advancement only fire on completion. Grades are canonical
//! 0–100; callers holding a 0–10 quality value convert at the boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::GradeBands;
use crate::curriculum::CurriculumId;
use crate::error::CoreError;
use crate::quran::{QuranReference, VerseRange};
use crate::students::{StudentId, TeacherId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecitationType {
    Memorization,
    MinorReview,
    MajorReview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Ongoing,
    Completed,
    Incomplete,
}

/// Qualitative rating derived from the numeric grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Weak,
    Acceptable,
    Good,
    VeryGood,
    Excellent,
}

impl Rating {
    /// Classify a 0–100 grade against the configured bands. Bands are
    /// inclusive at the lower edge: exactly 90 is excellent, exactly 60 is
    /// acceptable.
    pub fn from_grade(grade: f32, bands: &GradeBands) -> Rating {
        if grade >= bands.excellent {
            Rating::Excellent
        } else if grade >= bands.very_good {
            Rating::VeryGood
        } else if grade >= bands.good {
            Rating::Good
        } else if grade >= bands.acceptable {
            Rating::Acceptable
        } else {
            Rating::Weak
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Excellent => "excellent",
            Rating::VeryGood => "very_good",
            Rating::Good => "good",
            Rating::Acceptable => "acceptable",
            Rating::Weak => "weak",
        }
    }

    /// Arabic display label shown to teachers.
    pub fn arabic(&self) -> &'static str {
        match self {
            Rating::Excellent => "ممتاز",
            Rating::VeryGood => "جيد جداً",
            Rating::Good => "جيد",
            Rating::Acceptable => "مقبول",
            Rating::Weak => "ضعيف",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecitationErrorKind {
    Pronunciation,
    Tajweed,
    Memorization,
    Fluency,
    PauseStart,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Light,
    Medium,
    Severe,
}

/// One mistake observed during a session. Child of exactly one session;
/// removed with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecitationError {
    pub surah: u16,
    pub verse: u16,
    pub word: Option<String>,
    pub kind: RecitationErrorKind,
    pub severity: ErrorSeverity,
    pub is_repeated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecitationSession {
    pub session_id: String,
    pub student_id: StudentId,
    pub teacher_id: TeacherId,
    pub circle_id: Option<u64>,
    pub curriculum_id: Option<CurriculumId>,
    pub range: VerseRange,
    pub recitation_type: RecitationType,
    pub duration_minutes: u32,
    /// Canonical 0–100 scale.
    pub grade: f32,
    pub rating: Rating,
    pub status: SessionStatus,
    pub notes: Option<String>,
    pub total_errors: u32,
    pub errors: Vec<RecitationError>,
    pub recorded_at: DateTime<Utc>,
}

/// Caller-supplied fields for opening a session.
#[derive(Debug, Clone)]
pub struct SessionInput {
    pub student_id: StudentId,
    pub teacher_id: TeacherId,
    pub circle_id: Option<u64>,
    pub curriculum_id: Option<CurriculumId>,
    pub range: VerseRange,
    pub recitation_type: RecitationType,
    pub duration_minutes: u32,
    pub grade: f32,
    pub errors: Vec<RecitationError>,
    pub notes: Option<String>,
}

pub fn new_session_id(now: DateTime<Utc>) -> String {
    format!("rs_{}_{:08x}", now.timestamp_millis(), rand::random::<u32>())
}

/// Validate input and build an `ongoing` session. Rejected inputs write
/// nothing; the caller corrects and resubmits.
pub fn build_session(
    input: &SessionInput,
    quran: &dyn QuranReference,
    bands: &GradeBands,
    now: DateTime<Utc>,
) -> Result<RecitationSession, CoreError> {
    if !quran.validate_range(&input.range) {
        return Err(CoreError::validation(format!(
            "invalid verse range {:?}",
            input.range
        )));
    }
    if !(0.0..=100.0).contains(&input.grade) {
        return Err(CoreError::validation(format!(
            "grade {} outside 0..=100",
            input.grade
        )));
    }
    for error in &input.errors {
        if !input.range.contains(error.surah, error.verse) {
            return Err(CoreError::validation(format!(
                "error at {}:{} falls outside the recited range",
                error.surah, error.verse
            )));
        }
    }

    Ok(RecitationSession {
        session_id: new_session_id(now),
        student_id: input.student_id,
        teacher_id: input.teacher_id,
        circle_id: input.circle_id,
        curriculum_id: input.curriculum_id,
        range: input.range,
        recitation_type: input.recitation_type,
        duration_minutes: input.duration_minutes,
        grade: input.grade,
        rating: Rating::from_grade(input.grade, bands),
        status: SessionStatus::Ongoing,
        notes: input.notes.clone(),
        total_errors: input.errors.len() as u32,
        errors: input.errors.clone(),
        recorded_at: now,
    })
}
