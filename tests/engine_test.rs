use std::sync::Arc;
use std::thread;

use chrono::{Duration, Utc};
use tahfiz::alerts::{AlertStatus, AlertType, ReviewDecision};
use tahfiz::config::EngineConfig;
use tahfiz::curriculum::store::CurriculumStore;
use tahfiz::curriculum::{CurriculumKind, PlanDraft, PlanType};
use tahfiz::engine::ProgressionEngine;
use tahfiz::notify::LogNotifier;
use tahfiz::quran::{Mushaf, VerseRange};
use tahfiz::readiness::ReadinessTier;
use tahfiz::sessions::{RecitationType, SessionInput};
use tahfiz::students::{InMemoryDirectory, StudentRecord};

const STUDENT: u64 = 1;
const TEACHER: u64 = 10;

fn engine_with_curriculum() -> (Arc<ProgressionEngine>, u64) {
    let quran = Arc::new(Mushaf::new());
    let curricula = Arc::new(CurriculumStore::new());
    let curriculum = curricula.create_curriculum(
        "منهج جزء عم",
        CurriculumKind::TeacherLed,
        &["المستوى الأول", "المستوى الثاني"],
    );
    let drafts = vec![
        PlanDraft {
            level_id: curriculum.levels.first().map(|l| l.id),
            plan_type: PlanType::Lesson,
            range: VerseRange::single(114, 1, 6),
            expected_days: 3,
        },
        PlanDraft {
            level_id: curriculum.levels.first().map(|l| l.id),
            plan_type: PlanType::Lesson,
            range: VerseRange::single(113, 1, 5),
            expected_days: 3,
        },
        PlanDraft {
            level_id: curriculum.levels.first().map(|l| l.id),
            plan_type: PlanType::MinorReview,
            range: VerseRange::single(114, 1, 6),
            expected_days: 2,
        },
    ];
    curricula
        .insert_plans_chunked(curriculum.id, drafts, quran.as_ref())
        .expect("plans insert");

    let directory = Arc::new(InMemoryDirectory::new());
    directory.insert(StudentRecord {
        id: STUDENT,
        name: "أحمد".to_string(),
        teacher_id: TEACHER,
        active: true,
    });

    let engine = ProgressionEngine::new(
        curricula,
        directory,
        quran,
        Arc::new(LogNotifier),
        EngineConfig::default(),
    );
    (Arc::new(engine), curriculum.id)
}

fn memorization_input(grade: f32) -> SessionInput {
    SessionInput {
        student_id: STUDENT,
        teacher_id: TEACHER,
        circle_id: None,
        curriculum_id: Some(1),
        range: VerseRange::single(114, 1, 6),
        recitation_type: RecitationType::Memorization,
        duration_minutes: 20,
        grade,
        errors: Vec::new(),
        notes: None,
    }
}

#[test]
fn test_enroll_positions_student_at_curriculum_start() {
    let (engine, curriculum_id) = engine_with_curriculum();
    let start = Utc::now().date_naive() - Duration::days(45);
    let assignment = engine
        .enroll_student(STUDENT, curriculum_id, TEACHER, start, None)
        .expect("enroll");

    assert_eq!(assignment.current_surah, 114, "first lesson plan starts at An-Nas");
    assert_eq!(assignment.current_page, 604);
    assert_eq!(assignment.consecutive_days, 0);

    // A second active enrollment is a conflict.
    let err = engine
        .enroll_student(STUDENT, curriculum_id, TEACHER, start, None)
        .unwrap_err();
    assert!(err.is_conflict());
}

#[test]
fn test_unknown_student_and_curriculum_are_not_found() {
    let (engine, curriculum_id) = engine_with_curriculum();
    let today = Utc::now().date_naive();
    assert!(engine
        .enroll_student(999, curriculum_id, TEACHER, today, None)
        .unwrap_err()
        .is_not_found());
    assert!(engine
        .enroll_student(STUDENT, 999, TEACHER, today, None)
        .unwrap_err()
        .is_not_found());
    assert!(engine.today_content(STUDENT).unwrap_err().is_not_found());
}

#[test]
fn test_session_validation_rejects_before_write() {
    let (engine, curriculum_id) = engine_with_curriculum();
    let today = Utc::now().date_naive();
    engine
        .enroll_student(STUDENT, curriculum_id, TEACHER, today, None)
        .expect("enroll");

    let mut bad_range = memorization_input(90.0);
    bad_range.range = VerseRange::single(114, 5, 2);
    assert!(engine.record_session(bad_range).unwrap_err().is_validation());

    let mut bad_grade = memorization_input(140.0);
    bad_grade.curriculum_id = Some(curriculum_id);
    assert!(engine.record_session(bad_grade).unwrap_err().is_validation());

    assert!(engine.sessions_for(STUDENT).is_empty(), "nothing was written");
}

#[test]
fn test_today_content_is_idempotent() {
    let (engine, curriculum_id) = engine_with_curriculum();
    let today = Utc::now().date_naive();
    engine
        .enroll_student(STUDENT, curriculum_id, TEACHER, today, None)
        .expect("enroll");

    let first = engine.today_content(STUDENT).expect("content");
    let second = engine.today_content(STUDENT).expect("content");
    assert_eq!(first, second, "same day, same content");

    // Completing a session advances the live position but does not rewrite
    // the day's assignment.
    let mut input = memorization_input(95.0);
    input.curriculum_id = Some(curriculum_id);
    let session = engine.record_session(input).expect("record");
    engine
        .complete_session(STUDENT, &session.session_id, None)
        .expect("complete");

    let third = engine.today_content(STUDENT).expect("content");
    assert_eq!(first, third, "today stays frozen once computed");

    let tomorrow = engine.next_day_content(STUDENT).expect("content");
    assert_ne!(
        first.memorization, tomorrow.memorization,
        "next day reflects the completed session"
    );
}

#[test]
fn test_completing_a_session_advances_and_evaluates() {
    let (engine, curriculum_id) = engine_with_curriculum();
    let start = Utc::now().date_naive() - Duration::days(45);
    let before = engine
        .enroll_student(STUDENT, curriculum_id, TEACHER, start, None)
        .expect("enroll");

    let mut input = memorization_input(95.0);
    input.curriculum_id = Some(curriculum_id);
    let session = engine.record_session(input).expect("record");
    let outcome = engine
        .complete_session(STUDENT, &session.session_id, Some(96.0))
        .expect("complete");

    assert_eq!(outcome.session.grade, 96.0);
    let evaluation = outcome.evaluation.expect("pipeline ran");
    assert_eq!(evaluation.analysis.total_sessions, 1);

    let after = engine.assignment(STUDENT).expect("assignment");
    assert!(after.current_page > before.current_page || after.is_mushaf_finished());

    // Completing the same session twice is a conflict.
    assert!(engine
        .complete_session(STUDENT, &session.session_id, None)
        .unwrap_err()
        .is_conflict());

    // The lesson plan covering An-Nas is now completed and the derived
    // percentage reflects one of three plans.
    let rows = engine.progress_rows(after.id);
    assert_eq!(rows.len(), 1);
    assert!((rows[0].completion_percentage - 100.0 / 3.0).abs() < 0.01);
}

#[test]
fn test_abandoned_session_is_not_credited() {
    let (engine, curriculum_id) = engine_with_curriculum();
    let today = Utc::now().date_naive();
    let before = engine
        .enroll_student(STUDENT, curriculum_id, TEACHER, today, None)
        .expect("enroll");

    let mut input = memorization_input(50.0);
    input.curriculum_id = Some(curriculum_id);
    let session = engine.record_session(input).expect("record");
    let abandoned = engine
        .mark_session_incomplete(STUDENT, &session.session_id)
        .expect("abandon");
    assert_eq!(abandoned.status, tahfiz::sessions::SessionStatus::Incomplete);

    let after = engine.assignment(STUDENT).expect("assignment");
    assert_eq!(after.current_page, before.current_page, "no advancement");
    assert!(engine
        .complete_session(STUDENT, &session.session_id, None)
        .unwrap_err()
        .is_conflict());
}

#[test]
fn test_fresh_student_evaluates_not_ready() {
    let (engine, curriculum_id) = engine_with_curriculum();
    let today = Utc::now().date_naive();
    engine
        .enroll_student(STUDENT, curriculum_id, TEACHER, today, None)
        .expect("enroll");

    let evaluation = engine.evaluate_student(STUDENT).expect("evaluate");
    assert_eq!(evaluation.readiness.tier, ReadinessTier::NotReady);
    assert!(evaluation.readiness.score < 50.0);
    assert!(!evaluation.readiness.areas_for_improvement.is_empty());
    // A not-ready student with no sessions draws an attention alert.
    assert!(evaluation
        .alerts
        .iter()
        .any(|a| a.alert_type == AlertType::AttentionNeeded));
}

fn drive_student_to_ready(engine: &Arc<ProgressionEngine>, curriculum_id: u64) -> u64 {
    let start = Utc::now().date_naive() - Duration::days(45);
    engine
        .enroll_student(STUDENT, curriculum_id, TEACHER, start, None)
        .expect("enroll");

    for _ in 0..5 {
        let mut input = memorization_input(95.0);
        input.curriculum_id = Some(curriculum_id);
        let session = engine.record_session(input).expect("record");
        engine
            .complete_session(STUDENT, &session.session_id, None)
            .expect("complete");
    }
    let mut review = memorization_input(92.0);
    review.curriculum_id = Some(curriculum_id);
    review.recitation_type = RecitationType::MinorReview;
    let session = engine.record_session(review).expect("record");
    engine
        .complete_session(STUDENT, &session.session_id, None)
        .expect("complete");

    let pending = engine.pending_alerts(Some(STUDENT));
    pending
        .iter()
        .find(|a| a.alert_type == AlertType::LevelProgression)
        .expect("a strong student earns a progression alert")
        .id
}

#[test]
fn test_approving_an_alert_applies_the_transition() {
    let (engine, curriculum_id) = engine_with_curriculum();
    let alert_id = drive_student_to_ready(&engine, curriculum_id);
    let before = engine.assignment(STUDENT).expect("assignment");

    let applied = engine
        .decide_alert(alert_id, ReviewDecision::Approve, TEACHER, Some("موافق".into()), None)
        .expect("approve");
    assert_eq!(applied.status, AlertStatus::Applied);

    let after = engine.assignment(STUDENT).expect("assignment");
    let snapshot = after.previous_assignment.expect("snapshot archived");
    assert_eq!(snapshot.curriculum_id, before.curriculum_id);
    assert_eq!(snapshot.current_page, before.current_page);
    assert_ne!(after.level_id, before.level_id, "advanced to the next level");
    assert_eq!(after.consecutive_days, 0);
    assert_eq!(after.completion_percentage, 0.0);
    assert_eq!(after.current_surah, 114, "reset to the curriculum start point");
}

#[test]
fn test_rejecting_an_alert_dismisses_it() {
    let (engine, curriculum_id) = engine_with_curriculum();
    let alert_id = drive_student_to_ready(&engine, curriculum_id);
    let before = engine.assignment(STUDENT).expect("assignment");

    let dismissed = engine
        .decide_alert(alert_id, ReviewDecision::Reject, TEACHER, None, None)
        .expect("reject");
    assert_eq!(dismissed.status, AlertStatus::Dismissed);

    let after = engine.assignment(STUDENT).expect("assignment");
    assert_eq!(after.level_id, before.level_id, "no side effects on the assignment");
}

#[test]
fn test_concurrent_approvals_apply_exactly_once() {
    let (engine, curriculum_id) = engine_with_curriculum();
    let alert_id = drive_student_to_ready(&engine, curriculum_id);

    let mut handles = Vec::new();
    for _ in 0..2 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            engine.decide_alert(alert_id, ReviewDecision::Approve, TEACHER, None, None)
        }));
    }
    let results: Vec<_> = handles.into_iter().map(|h| h.join().expect("join")).collect();

    let wins = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(e) if e.is_conflict()))
        .count();
    assert_eq!(wins, 1, "exactly one approval may apply");
    assert_eq!(conflicts, 1);

    let after = engine.assignment(STUDENT).expect("assignment");
    assert!(
        after.previous_assignment.is_some(),
        "exactly one transition was recorded"
    );
}

#[tokio::test]
async fn test_sweep_collects_failures_and_continues() {
    // Two active students; only the first is enrolled. The second fails
    // evaluation but must not abort the sweep.
    let directory = Arc::new(InMemoryDirectory::new());
    directory.insert(StudentRecord {
        id: STUDENT,
        name: "أحمد".to_string(),
        teacher_id: TEACHER,
        active: true,
    });
    directory.insert(StudentRecord {
        id: 2,
        name: "خالد".to_string(),
        teacher_id: TEACHER,
        active: true,
    });
    let quran = Arc::new(Mushaf::new());
    let curricula = Arc::new(CurriculumStore::new());
    let curriculum = curricula.create_curriculum("منهج", CurriculumKind::TeacherLed, &["الأول"]);
    let engine = Arc::new(ProgressionEngine::new(
        curricula,
        directory,
        quran,
        Arc::new(LogNotifier),
        EngineConfig::default(),
    ));
    let today = Utc::now().date_naive();
    engine
        .enroll_student(STUDENT, curriculum.id, TEACHER, today, None)
        .expect("enroll");

    let summary = Arc::clone(&engine).evaluate_all_active_students().await;
    assert_eq!(summary.evaluated, 1);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].0, 2, "the unassigned student is reported");
}
