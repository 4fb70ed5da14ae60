//! The public service surface of the progression engine.
//!
//! Wires the pipeline the rest of the crate implements: session completion →
//! performance analysis → readiness scoring → alert creation, plus the
//! teacher-decision path that applies curriculum transitions. Writes for one
//! student are serialized on a per-student mutex; reference data is shared
//! lock-free.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::alerts::{
    AlertDraft, AlertId, AlertPriority, AlertType, CurriculumAlert, PerformanceSnapshot,
    ReviewDecision,
};
use crate::analytics::{self, PerformanceSummary};
use crate::config::EngineConfig;
use crate::curriculum::store::CurriculumStore;
use crate::curriculum::{CurriculumId, PlanType};
use crate::error::CoreError;
use crate::metrics::Metrics;
use crate::notify::Notifier;
use crate::quran::QuranReference;
use crate::readiness::{self, ReadinessInputs, ReadinessReport, ReadinessTier};
use crate::sessions::{self, RecitationSession, RecitationType, SessionInput, SessionStatus};
use crate::state::app::EngineState;
use crate::students::{
    AssignmentStatus, PacingConfig, ProgressStatus, StudentCurriculum, StudentDirectory, StudentId,
    StudentPlanProgress, TeacherId,
};
use crate::tracking::{self, ContentAssignment};

/// Result of one per-student evaluation pass.
#[derive(Debug, Clone, Serialize)]
pub struct StudentEvaluation {
    pub student_id: StudentId,
    pub analysis: PerformanceSummary,
    pub readiness: ReadinessReport,
    /// Alerts created by this pass (post de-duplication).
    pub alerts: Vec<CurriculumAlert>,
}

/// Result of finalizing a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub session: RecitationSession,
    /// None when the evaluation pipeline failed; the session itself is
    /// recorded either way.
    pub evaluation: Option<StudentEvaluation>,
}

/// Summary of a batch evaluation sweep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepSummary {
    pub evaluated: usize,
    pub alerts_created: usize,
    pub errors: Vec<(StudentId, String)>,
}

pub struct ProgressionEngine {
    state: EngineState,
    curricula: Arc<CurriculumStore>,
    directory: Arc<dyn StudentDirectory>,
    quran: Arc<dyn QuranReference>,
    notifier: Arc<dyn Notifier>,
    config: EngineConfig,
    metrics: Metrics,
}

impl ProgressionEngine {
    pub fn new(
        curricula: Arc<CurriculumStore>,
        directory: Arc<dyn StudentDirectory>,
        quran: Arc<dyn QuranReference>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
    ) -> Self {
        ProgressionEngine {
            state: EngineState::new(),
            curricula,
            directory,
            quran,
            notifier,
            config,
            metrics: Metrics::new(),
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn curricula(&self) -> &CurriculumStore {
        self.curricula.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Enroll a student into a curriculum, positioned at its start point.
    /// One active assignment per student.
    pub fn enroll_student(
        &self,
        student_id: StudentId,
        curriculum_id: CurriculumId,
        teacher_id: TeacherId,
        start_date: NaiveDate,
        pacing: Option<PacingConfig>,
    ) -> Result<StudentCurriculum, CoreError> {
        if self.directory.student(student_id).is_none() {
            return Err(CoreError::not_found("student", student_id));
        }
        let curriculum = self
            .curricula
            .curriculum(curriculum_id)
            .ok_or_else(|| CoreError::not_found("curriculum", curriculum_id))?;

        let lock = self.state.student_lock(student_id);
        let _guard = lock.lock();

        if let Some(existing) = self.state.assignment(student_id) {
            if existing.status == AssignmentStatus::InProgress {
                return Err(CoreError::conflict(format!(
                    "student {} already has an active assignment",
                    student_id
                )));
            }
        }

        let (start_surah, start_ayah) = self
            .curricula
            .start_point(curriculum_id)
            .unwrap_or((1, 1));
        let current_page = self.quran.first_page(start_surah).unwrap_or(1);
        let pacing = pacing.unwrap_or(PacingConfig {
            memorization_pages: self.config.pacing.memorization_pages,
            minor_review_pages: self.config.pacing.minor_review_pages,
            major_review_pages: self.config.pacing.major_review_pages,
        });

        let assignment = StudentCurriculum {
            id: self.state.allocate_assignment_id(),
            student_id,
            curriculum_id,
            level_id: curriculum.first_level().map(|l| l.id),
            teacher_id,
            start_date,
            completion_date: None,
            status: AssignmentStatus::InProgress,
            completion_percentage: 0.0,
            pacing,
            current_page,
            current_surah: start_surah,
            current_ayah: start_ayah,
            consecutive_days: 0,
            last_completed_date: None,
            previous_assignment: None,
        };
        self.state.put_assignment(assignment.clone());
        tracing::info!(
            student_id = student_id,
            curriculum_id = curriculum_id,
            assignment_id = assignment.id,
            "Enrolled student"
        );
        Ok(assignment)
    }

    /// Open a session in `ongoing` state. Validation failures are returned
    /// before anything is written.
    pub fn record_session(&self, input: SessionInput) -> Result<RecitationSession, CoreError> {
        if self.directory.student(input.student_id).is_none() {
            return Err(CoreError::not_found("student", input.student_id));
        }
        let session =
            sessions::build_session(&input, self.quran.as_ref(), &self.config.grades, Utc::now())?;

        let lock = self.state.student_lock(input.student_id);
        let _guard = lock.lock();
        self.state.push_session(session.clone());
        Ok(session)
    }

    /// Finalize a session: mark it completed, advance daily tracking, touch
    /// the covered plan's progress row, then run the evaluation pipeline.
    /// A pipeline failure is logged and counted, never unwinds the session.
    pub fn complete_session(
        &self,
        student_id: StudentId,
        session_id: &str,
        final_grade: Option<f32>,
    ) -> Result<SessionOutcome, CoreError> {
        if let Some(grade) = final_grade {
            if !(0.0..=100.0).contains(&grade) {
                return Err(CoreError::validation(format!(
                    "grade {} outside 0..=100",
                    grade
                )));
            }
        }

        let lock = self.state.student_lock(student_id);
        let _guard = lock.lock();

        let bands = self.config.grades.clone();
        let session = self
            .state
            .update_session(student_id, session_id, |session| {
                if session.status != SessionStatus::Ongoing {
                    return Err(CoreError::conflict(format!(
                        "session {} is {:?}, only ongoing sessions can be finalized",
                        session.session_id, session.status
                    )));
                }
                if let Some(grade) = final_grade {
                    session.grade = grade;
                    session.rating = sessions::Rating::from_grade(grade, &bands);
                }
                session.status = SessionStatus::Completed;
                Ok(())
            })?;
        self.metrics.record_session();

        let today = Utc::now().date_naive();
        if session.recitation_type == RecitationType::Memorization {
            if let Ok(assignment) = self.state.active_assignment(student_id) {
                if session.curriculum_id == Some(assignment.curriculum_id) {
                    self.state.update_assignment(student_id, |a| {
                        tracking::advance(a, today, self.quran.as_ref());
                    })?;
                }
            }
        }
        if let Ok(assignment) = self.state.active_assignment(student_id) {
            self.touch_progress(&assignment, &session, today);
        }

        let evaluation = match self.evaluate_locked(student_id) {
            Ok(evaluation) => Some(evaluation),
            Err(e) => {
                tracing::warn!(
                    student_id = student_id,
                    error = %e,
                    "Evaluation pipeline failed after session completion"
                );
                self.metrics.record_sweep_error();
                None
            }
        };

        Ok(SessionOutcome {
            session,
            evaluation,
        })
    }

    /// Close an ongoing session without crediting it: no advancement, no
    /// evaluation. The session stays queryable for the analyzer's
    /// completion-rate denominator.
    pub fn mark_session_incomplete(
        &self,
        student_id: StudentId,
        session_id: &str,
    ) -> Result<RecitationSession, CoreError> {
        let lock = self.state.student_lock(student_id);
        let _guard = lock.lock();
        self.state.update_session(student_id, session_id, |session| {
            if session.status != SessionStatus::Ongoing {
                return Err(CoreError::conflict(format!(
                    "session {} is {:?}, only ongoing sessions can be abandoned",
                    session.session_id, session.status
                )));
            }
            session.status = SessionStatus::Incomplete;
            Ok(())
        })
    }

    /// Today's content for a student. Idempotent per (student, day): the
    /// first call computes and caches, repeated calls return the same
    /// content without advancing anything.
    pub fn today_content(&self, student_id: StudentId) -> Result<ContentAssignment, CoreError> {
        let lock = self.state.student_lock(student_id);
        let _guard = lock.lock();

        let today = Utc::now().date_naive();
        if let Some(cached) = self.state.cached_content(student_id, today) {
            self.metrics.record_content_cache_hit();
            return Ok(cached);
        }
        self.metrics.record_content_cache_miss();

        let assignment = self.usable_assignment(student_id)?;
        let content = tracking::compute_content(&assignment, today, self.quran.as_ref());
        self.state.cache_content(content.clone());
        Ok(content)
    }

    /// Tomorrow's content, computed from the live position — strictly after
    /// the last completed session, or the curriculum start point for a
    /// student who has not recited yet.
    pub fn next_day_content(&self, student_id: StudentId) -> Result<ContentAssignment, CoreError> {
        let lock = self.state.student_lock(student_id);
        let _guard = lock.lock();

        let assignment = self.usable_assignment(student_id)?;
        let tomorrow = Utc::now()
            .date_naive()
            .succ_opt()
            .ok_or_else(|| CoreError::transient("calendar overflow"))?;
        Ok(tracking::compute_content(
            &assignment,
            tomorrow,
            self.quran.as_ref(),
        ))
    }

    /// Clear the daily caches and streak counters without touching
    /// historical progress rows. Used on curriculum transition.
    pub fn reset_daily_tracking(&self, student_id: StudentId) -> Result<(), CoreError> {
        let lock = self.state.student_lock(student_id);
        let _guard = lock.lock();
        self.reset_daily_tracking_locked(student_id)
    }

    /// Run the full evaluation pipeline for one student.
    pub fn evaluate_student(&self, student_id: StudentId) -> Result<StudentEvaluation, CoreError> {
        let lock = self.state.student_lock(student_id);
        let _guard = lock.lock();
        self.evaluate_locked(student_id)
    }

    /// Evaluate every active student. One student's failure is collected and
    /// the sweep continues; different students run on the blocking pool.
    pub async fn evaluate_all_active_students(self: Arc<Self>) -> SweepSummary {
        let students = self.directory.active_students();
        let mut join_set = JoinSet::new();
        for student_id in students {
            let engine = Arc::clone(&self);
            join_set.spawn_blocking(move || (student_id, engine.evaluate_student(student_id)));
        }

        let mut summary = SweepSummary::default();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((_, Ok(evaluation))) => {
                    summary.evaluated += 1;
                    summary.alerts_created += evaluation.alerts.len();
                }
                Ok((student_id, Err(e))) => {
                    tracing::warn!(
                        student_id = student_id,
                        error = %e,
                        "Student evaluation failed during sweep"
                    );
                    self.metrics.record_sweep_error();
                    summary.errors.push((student_id, e.to_string()));
                }
                Err(e) => {
                    tracing::error!(error = %e, "Sweep task failed to join");
                    self.metrics.record_sweep_error();
                }
            }
        }
        tracing::info!(
            evaluated = summary.evaluated,
            alerts_created = summary.alerts_created,
            errors = summary.errors.len(),
            "Evaluation sweep finished"
        );
        summary
    }

    /// Record a teacher decision on an alert. Approve applies the suggested
    /// (or explicitly targeted) transition atomically; reject dismisses;
    /// defer leaves the alert reviewed for a later decision.
    pub fn decide_alert(
        &self,
        alert_id: AlertId,
        decision: ReviewDecision,
        reviewer: TeacherId,
        notes: Option<String>,
        target_curriculum: Option<CurriculumId>,
    ) -> Result<CurriculumAlert, CoreError> {
        let now = Utc::now();
        let alert = self
            .state
            .alerts
            .review(alert_id, decision, reviewer, notes, now)?;

        match decision {
            ReviewDecision::Defer => Ok(alert),
            ReviewDecision::Reject => self.state.alerts.dismiss(alert_id, now),
            ReviewDecision::Approve => self.apply_transition(&alert, target_curriculum),
        }
    }

    pub fn pending_alerts(&self, student: Option<StudentId>) -> Vec<CurriculumAlert> {
        self.state.alerts.pending(student, Utc::now())
    }

    pub fn alert_history(&self, student: StudentId) -> Vec<CurriculumAlert> {
        self.state.alerts.history(student)
    }

    pub fn assignment(&self, student_id: StudentId) -> Option<StudentCurriculum> {
        self.state.assignment(student_id)
    }

    pub fn progress_rows(&self, assignment_id: u64) -> Vec<StudentPlanProgress> {
        self.state.progress_rows(assignment_id)
    }

    pub fn sessions_for(&self, student_id: StudentId) -> Vec<RecitationSession> {
        self.state.sessions_for(student_id)
    }

    // ---- internals ----

    fn usable_assignment(&self, student_id: StudentId) -> Result<StudentCurriculum, CoreError> {
        let assignment = self.state.active_assignment(student_id)?;
        match assignment.status {
            AssignmentStatus::InProgress | AssignmentStatus::Completed => Ok(assignment),
            status => Err(CoreError::conflict(format!(
                "assignment for student {} is {:?}",
                student_id, status
            ))),
        }
    }

    fn reset_daily_tracking_locked(&self, student_id: StudentId) -> Result<(), CoreError> {
        let today = Utc::now().date_naive();
        let mut dates = vec![today];
        if let Some(tomorrow) = today.succ_opt() {
            dates.push(tomorrow);
        }
        self.state.invalidate_content(student_id, &dates);
        self.state.update_assignment(student_id, |a| {
            a.consecutive_days = 0;
            a.last_completed_date = None;
        })?;
        Ok(())
    }

    /// Caller holds the student lock.
    fn evaluate_locked(&self, student_id: StudentId) -> Result<StudentEvaluation, CoreError> {
        let assignment = self.state.active_assignment(student_id)?;
        let sessions = self.state.sessions_for(student_id);
        let today = Utc::now().date_naive();

        let analysis = analytics::analyze(&sessions, today, &self.config.analyzer);

        let days_since_last_session = sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Completed)
            .map(|s| s.recorded_at.date_naive())
            .max()
            .map(|last| (today - last).num_days());
        let days_in_curriculum = (today - assignment.start_date).num_days();
        let completion_percentage = self
            .plan_completion_pct(&assignment)
            .unwrap_or(assignment.completion_percentage);
        let retention_rate = self.retention_rate(&sessions, today);

        let inputs = ReadinessInputs {
            completion_percentage,
            performance: analysis.clone(),
            days_since_last_session,
            days_in_curriculum,
            retention_rate,
        };
        let report = readiness::score_readiness(&inputs, &self.config.readiness, &self.config.grades);
        self.metrics.record_evaluation();

        let alerts = self.maybe_raise_alerts(&assignment, &analysis, &report, completion_percentage);

        Ok(StudentEvaluation {
            student_id,
            analysis,
            readiness: report,
            alerts,
        })
    }

    /// Share of completed review sessions in the analyzer window graded at
    /// the good band or above. 0 with no review sessions.
    fn retention_rate(&self, sessions: &[RecitationSession], today: NaiveDate) -> f32 {
        let window_start = today - Duration::days(self.config.analyzer.window_days - 1);
        let reviews: Vec<&RecitationSession> = sessions
            .iter()
            .filter(|s| {
                matches!(
                    s.recitation_type,
                    RecitationType::MinorReview | RecitationType::MajorReview
                ) && s.status == SessionStatus::Completed
            })
            .filter(|s| {
                let day = s.recorded_at.date_naive();
                day >= window_start && day <= today
            })
            .collect();
        if reviews.is_empty() {
            return 0.0;
        }
        let retained = reviews
            .iter()
            .filter(|s| s.grade >= self.config.grades.good)
            .count();
        retained as f32 / reviews.len() as f32 * 100.0
    }

    /// Derived plan completion for the owning assignment, recomputed from
    /// the progress rows. None when the curriculum defines no plans.
    fn plan_completion_pct(&self, assignment: &StudentCurriculum) -> Option<f32> {
        let total = self.curricula.plan_count(assignment.curriculum_id);
        if total == 0 {
            return None;
        }
        let completed = self
            .state
            .progress_rows(assignment.id)
            .iter()
            .filter(|r| r.status == ProgressStatus::Completed)
            .count();
        Some(completed as f32 / total as f32 * 100.0)
    }

    /// Lazily create the progress row for the plan a session advanced, mark
    /// it completed when the session reached the plan's end, and recompute
    /// the derived percentage on every write.
    fn touch_progress(
        &self,
        assignment: &StudentCurriculum,
        session: &RecitationSession,
        today: NaiveDate,
    ) {
        let Some(curriculum_id) = session.curriculum_id else {
            return;
        };
        if curriculum_id != assignment.curriculum_id {
            return;
        }
        let plan_type = match session.recitation_type {
            RecitationType::Memorization => PlanType::Lesson,
            RecitationType::MinorReview => PlanType::MinorReview,
            RecitationType::MajorReview => PlanType::MajorReview,
        };
        let Some(plan) = self
            .curricula
            .plan_covering(curriculum_id, plan_type, &session.range)
        else {
            return;
        };
        let total_plans = self.curricula.plan_count(curriculum_id);

        let mut progress = self.state.progress.write();
        let rows = progress.entry(assignment.id).or_default();
        if !rows.iter().any(|r| r.plan_id == plan.id) {
            rows.push(StudentPlanProgress {
                id: self.state.allocate_progress_id(),
                assignment_id: assignment.id,
                plan_id: plan.id,
                start_date: today,
                completion_date: None,
                status: ProgressStatus::InProgress,
                completion_percentage: 0.0,
                teacher_notes: None,
            });
        }
        if session.range.end_key() >= plan.range.end_key() {
            if let Some(row) = rows.iter_mut().find(|r| r.plan_id == plan.id) {
                if row.status != ProgressStatus::Completed {
                    row.status = ProgressStatus::Completed;
                    row.completion_date = Some(today);
                }
            }
        }
        let completed = rows
            .iter()
            .filter(|r| r.status == ProgressStatus::Completed)
            .count();
        let pct = if total_plans > 0 {
            completed as f32 / total_plans as f32 * 100.0
        } else {
            0.0
        };
        for row in rows.iter_mut() {
            row.completion_percentage = pct;
        }
    }

    /// Turn an evaluation into alert drafts and run them through the
    /// cooldown-deduplicating store.
    fn maybe_raise_alerts(
        &self,
        assignment: &StudentCurriculum,
        analysis: &PerformanceSummary,
        report: &ReadinessReport,
        completion_percentage: f32,
    ) -> Vec<CurriculumAlert> {
        let now = Utc::now();
        let cooldown = Duration::days(self.config.alerts.cooldown_days);
        let expiry = Duration::days(self.config.alerts.expiry_days);
        let snapshot = PerformanceSnapshot {
            readiness_score: report.score,
            sessions_in_window: analysis.total_sessions,
            completion_percentage,
            consecutive_days: assignment.consecutive_days,
        };

        let mut drafts: Vec<AlertDraft> = Vec::new();

        if assignment.is_mushaf_finished() || completion_percentage >= 100.0 {
            drafts.push(AlertDraft {
                student_id: assignment.student_id,
                teacher_id: assignment.teacher_id,
                current_curriculum: assignment.curriculum_id,
                current_level: assignment.level_id,
                suggested_curriculum: None,
                suggested_level: None,
                alert_type: AlertType::CompletionMilestone,
                priority: AlertPriority::Medium,
                message: "أتم الطالب منهجه الحالي".to_string(),
                snapshot: snapshot.clone(),
                requires_teacher_approval: false,
            });
        }

        if report.ready {
            let next_level = assignment.level_id.and_then(|level| {
                self.curricula
                    .curriculum(assignment.curriculum_id)
                    .and_then(|c| c.next_level(level).cloned())
            });
            match next_level {
                Some(level) => {
                    let priority = if report.score >= self.config.alerts.high_priority_score {
                        AlertPriority::High
                    } else {
                        AlertPriority::Medium
                    };
                    drafts.push(AlertDraft {
                        student_id: assignment.student_id,
                        teacher_id: assignment.teacher_id,
                        current_curriculum: assignment.curriculum_id,
                        current_level: assignment.level_id,
                        suggested_curriculum: Some(assignment.curriculum_id),
                        suggested_level: Some(level.id),
                        alert_type: AlertType::LevelProgression,
                        priority,
                        message: format!(
                            "الطالب جاهز للانتقال إلى المستوى التالي ({})",
                            level.name
                        ),
                        snapshot: snapshot.clone(),
                        requires_teacher_approval: true,
                    });
                }
                None => {
                    // Already at the last level: nothing to apply, just
                    // surface the standing.
                    drafts.push(AlertDraft {
                        student_id: assignment.student_id,
                        teacher_id: assignment.teacher_id,
                        current_curriculum: assignment.curriculum_id,
                        current_level: assignment.level_id,
                        suggested_curriculum: None,
                        suggested_level: None,
                        alert_type: AlertType::Recommendation,
                        priority: AlertPriority::Low,
                        message: "أداء ممتاز، لا إجراء مطلوب".to_string(),
                        snapshot: snapshot.clone(),
                        requires_teacher_approval: false,
                    });
                }
            }
        } else if report.tier == ReadinessTier::NeedsImprovement {
            drafts.push(AlertDraft {
                student_id: assignment.student_id,
                teacher_id: assignment.teacher_id,
                current_curriculum: assignment.curriculum_id,
                current_level: assignment.level_id,
                suggested_curriculum: None,
                suggested_level: None,
                alert_type: AlertType::PerformanceAlert,
                priority: AlertPriority::Medium,
                message: "مستوى الطالب يحتاج إلى تحسين قبل الانتقال".to_string(),
                snapshot: snapshot.clone(),
                requires_teacher_approval: false,
            });
        } else if report.tier == ReadinessTier::NotReady {
            let inactive = analysis.total_sessions == 0;
            drafts.push(AlertDraft {
                student_id: assignment.student_id,
                teacher_id: assignment.teacher_id,
                current_curriculum: assignment.curriculum_id,
                current_level: assignment.level_id,
                suggested_curriculum: None,
                suggested_level: None,
                alert_type: AlertType::AttentionNeeded,
                priority: if inactive {
                    AlertPriority::High
                } else {
                    AlertPriority::Medium
                },
                message: "الطالب بحاجة إلى متابعة عاجلة من المعلم".to_string(),
                snapshot: snapshot.clone(),
                requires_teacher_approval: false,
            });
        }

        let mut created = Vec::new();
        for draft in drafts {
            let teacher_id = draft.teacher_id;
            let alert_type = draft.alert_type;
            match self.state.alerts.create(draft, now, cooldown, expiry) {
                Some(alert) => {
                    self.metrics.record_alert_created();
                    self.dispatch_notification(
                        teacher_id,
                        "curriculum_alert",
                        &[
                            ("student_id", alert.student_id.to_string()),
                            ("alert_type", alert_type.as_str().to_string()),
                            ("score", format!("{:.1}", report.score)),
                        ],
                    );
                    created.push(alert);
                }
                None => self.metrics.record_alert_suppressed(),
            }
        }
        created
    }

    /// Apply an approved transition. The alert's reviewed → applied
    /// check-and-set is the serialization point: concurrent apply attempts
    /// get exactly one winner. All fallible lookups happen before the CAS,
    /// so a failure leaves the alert reviewed and the assignment untouched.
    fn apply_transition(
        &self,
        alert: &CurriculumAlert,
        target_curriculum: Option<CurriculumId>,
    ) -> Result<CurriculumAlert, CoreError> {
        let student_id = alert.student_id;
        let lock = self.state.student_lock(student_id);
        let _guard = lock.lock();

        let target_id = target_curriculum
            .or(alert.suggested_curriculum)
            .ok_or_else(|| CoreError::validation("approve requires a target curriculum"))?;
        let target = self
            .curricula
            .curriculum(target_id)
            .ok_or_else(|| CoreError::not_found("curriculum", target_id))?;
        self.state.active_assignment(student_id)?;

        let target_level = if target_id == alert.current_curriculum {
            alert
                .suggested_level
                .and_then(|id| self.curricula.level(target_id, id))
        } else {
            target.first_level().cloned()
        };

        let now = Utc::now();
        let applied = self.state.alerts.mark_applied(alert.id, now)?;

        let (start_surah, start_ayah) = self.curricula.start_point(target_id).unwrap_or((1, 1));
        let start_page = self.quran.first_page(start_surah).unwrap_or(1);
        let today = now.date_naive();

        let update = self.state.update_assignment(student_id, |a| {
            a.previous_assignment = Some(a.snapshot(now));
            a.curriculum_id = target_id;
            a.level_id = target_level.as_ref().map(|l| l.id);
            a.status = AssignmentStatus::InProgress;
            a.start_date = today;
            a.completion_date = None;
            a.completion_percentage = 0.0;
            a.current_page = start_page;
            a.current_surah = start_surah;
            a.current_ayah = start_ayah;
            a.consecutive_days = 0;
            a.last_completed_date = None;
        });
        if let Err(e) = update {
            // Roll the alert back so the decision can be retried; the
            // assignment was not touched.
            let _ = self.state.alerts.revert_to_reviewed(alert.id);
            return Err(e);
        }
        self.reset_daily_tracking_locked(student_id)?;

        self.metrics.record_transition();
        tracing::info!(
            student_id = student_id,
            alert_id = alert.id,
            from_curriculum = alert.current_curriculum,
            to_curriculum = target_id,
            "Applied curriculum transition"
        );
        self.dispatch_notification(
            alert.teacher_id,
            "curriculum_transition_applied",
            &[
                ("student_id", student_id.to_string()),
                ("curriculum_id", target_id.to_string()),
            ],
        );
        Ok(applied)
    }

    /// Fire-and-forget dispatch: failures are logged and counted, never
    /// returned.
    fn dispatch_notification(&self, teacher: TeacherId, template_key: &str, vars: &[(&str, String)]) {
        let recipient = format!("teacher:{}", teacher);
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        if !self.notifier.notify(&recipient, template_key, &vars) {
            tracing::warn!(
                recipient = recipient,
                template = template_key,
                "Notification dispatch failed"
            );
            self.metrics.record_notification_failure();
        }
    }
}
