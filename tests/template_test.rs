use chrono::NaiveDate;
use tahfiz::curriculum::store::CurriculumStore;
use tahfiz::curriculum::templates::{
    generate_plans, PlanTemplate, TemplateDirection, TemplateParams,
};
use tahfiz::curriculum::{CurriculumKind, PlanDraft, PlanType};
use tahfiz::quran::{Mushaf, QuranReference, VerseRange};

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date")
}

#[test]
fn test_one_year_template_days_sum_to_declared_duration() {
    let quran = Mushaf::new();
    let params = TemplateParams {
        template: PlanTemplate::CompleteInOneYear,
        start_date: start_date(),
        selected_surahs: Some(vec![112, 113, 114]),
        direction: TemplateDirection::JuzAmmaFirst,
    };
    let drafts = generate_plans(&params, &quran).expect("template should generate");

    let lessons: Vec<&PlanDraft> = drafts
        .iter()
        .filter(|d| d.plan_type == PlanType::Lesson)
        .collect();
    assert_eq!(lessons.len(), 3, "one lesson per selected surah");
    let lesson_days: u32 = lessons.iter().map(|d| d.expected_days).sum();
    assert_eq!(
        lesson_days, 365,
        "lesson days must sum to the template duration"
    );

    // Minor review shadows each lesson; one closing major review.
    assert_eq!(
        drafts
            .iter()
            .filter(|d| d.plan_type == PlanType::MinorReview)
            .count(),
        3
    );
    assert_eq!(
        drafts
            .iter()
            .filter(|d| d.plan_type == PlanType::MajorReview)
            .count(),
        1
    );

    for draft in &drafts {
        assert!(
            quran.validate_range(&draft.range),
            "template must never produce an invalid range: {:?}",
            draft.range
        );
    }
}

#[test]
fn test_juz_amma_first_orders_descending() {
    let quran = Mushaf::new();
    let params = TemplateParams {
        template: PlanTemplate::FastMemorization,
        start_date: start_date(),
        selected_surahs: Some(vec![110, 112, 114]),
        direction: TemplateDirection::JuzAmmaFirst,
    };
    let drafts = generate_plans(&params, &quran).expect("template should generate");
    let order: Vec<u16> = drafts.iter().map(|d| d.range.start_surah).collect();
    assert_eq!(order, vec![114, 112, 110]);
}

#[test]
fn test_template_rejects_bad_selection() {
    let quran = Mushaf::new();
    let mut params = TemplateParams {
        template: PlanTemplate::IntensiveReview,
        start_date: start_date(),
        selected_surahs: Some(vec![]),
        direction: TemplateDirection::MushafOrder,
    };
    assert!(generate_plans(&params, &quran).is_err(), "empty selection");

    params.selected_surahs = Some(vec![1, 200]);
    assert!(generate_plans(&params, &quran).is_err(), "surah out of range");
}

#[test]
fn test_round_trip_through_the_store() {
    let quran = Mushaf::new();
    let store = CurriculumStore::new();
    let curriculum = store.create_curriculum(
        "منهج الحفظ السريع",
        CurriculumKind::TeacherLed,
        &["التمهيدي"],
    );

    let params = TemplateParams {
        template: PlanTemplate::FastMemorization,
        start_date: start_date(),
        selected_surahs: Some(vec![112, 113, 114]),
        direction: TemplateDirection::MushafOrder,
    };
    let drafts = generate_plans(&params, &quran).expect("template should generate");
    let expected_ranges: Vec<VerseRange> = drafts.iter().map(|d| d.range).collect();
    let expected_days: u32 = drafts.iter().map(|d| d.expected_days).sum();

    let report = store
        .insert_plans_chunked(curriculum.id, drafts, &quran)
        .expect("insert should succeed");
    assert_eq!(report.inserted, 3);
    assert_eq!(report.skipped_invalid, 0);

    let plans = store.plans(curriculum.id);
    assert_eq!(plans.len(), 3);
    let stored_ranges: Vec<VerseRange> = plans.iter().map(|p| p.range).collect();
    assert_eq!(stored_ranges, expected_ranges, "ranges survive the round trip");
    let stored_days: u32 = plans.iter().map(|p| p.expected_days).sum();
    assert_eq!(stored_days, expected_days);
    assert!(plans.iter().all(|p| !p.formatted_content.is_empty()));
}

#[test]
fn test_chunked_insert_handles_whole_mushaf() {
    let quran = Mushaf::new();
    let store = CurriculumStore::new();
    let curriculum =
        store.create_curriculum("ختمة كاملة", CurriculumKind::TeacherLed, &["الأول"]);

    let params = TemplateParams {
        template: PlanTemplate::CompleteInOneYear,
        start_date: start_date(),
        selected_surahs: None,
        direction: TemplateDirection::MushafOrder,
    };
    let drafts = generate_plans(&params, &quran).expect("template should generate");
    // 114 lessons + 114 minor reviews + 1 closing major review
    assert_eq!(drafts.len(), 229);

    let report = store
        .insert_plans_chunked(curriculum.id, drafts, &quran)
        .expect("insert should succeed");
    assert_eq!(report.inserted, 229, "all batches must land");
    assert_eq!(store.plans(curriculum.id).len(), 229);
}

#[test]
fn test_invalid_drafts_are_skipped_not_inserted() {
    let quran = Mushaf::new();
    let store = CurriculumStore::new();
    let curriculum = store.create_curriculum("منهج", CurriculumKind::StudentLed, &["الأول"]);

    let drafts = vec![
        PlanDraft {
            level_id: None,
            plan_type: PlanType::Lesson,
            range: VerseRange::single(114, 1, 6),
            expected_days: 3,
        },
        PlanDraft {
            level_id: None,
            plan_type: PlanType::Lesson,
            range: VerseRange::single(2, 50, 40),
            expected_days: 3,
        },
    ];
    let report = store
        .insert_plans_chunked(curriculum.id, drafts, &quran)
        .expect("insert should succeed");
    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped_invalid, 1);
    assert_eq!(store.plans(curriculum.id).len(), 1);
}
