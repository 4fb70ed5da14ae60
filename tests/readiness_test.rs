use tahfiz::analytics::{PerformanceSummary, Trend};
use tahfiz::config::{GradeBands, ReadinessConfig};
use tahfiz::readiness::{score_readiness, ReadinessInputs, ReadinessTier};

fn strong_performance() -> PerformanceSummary {
    PerformanceSummary {
        window_days: 14,
        total_sessions: 12,
        completed_sessions: 12,
        completion_rate: 100.0,
        average_score: 95.0,
        error_rate: 0.2,
        consistency_rate: 85.7,
        distinct_active_days: 12,
        trend: Trend::Improving,
    }
}

fn baseline_inputs() -> ReadinessInputs {
    ReadinessInputs {
        completion_percentage: 70.0,
        performance: strong_performance(),
        days_since_last_session: Some(1),
        days_in_curriculum: 45,
        retention_rate: 95.0,
    }
}

#[test]
fn test_fresh_student_is_not_ready() {
    let inputs = ReadinessInputs {
        completion_percentage: 0.0,
        performance: PerformanceSummary::empty(14),
        days_since_last_session: None,
        days_in_curriculum: 3,
        retention_rate: 0.0,
    };
    let report = score_readiness(&inputs, &ReadinessConfig::default(), &GradeBands::default());

    assert!(report.score < 50.0, "score {} should be below 50", report.score);
    assert_eq!(report.tier, ReadinessTier::NotReady);
    assert!(!report.ready);
    assert_eq!(report.confidence, "low");
    assert!(
        !report.areas_for_improvement.is_empty(),
        "a student with no history must have named improvement areas"
    );
    assert!(!report.recommendations.is_empty());
    assert!(!report.next_steps.is_empty());
}

#[test]
fn test_perfect_inputs_reach_the_theoretical_maximum() {
    let mut inputs = baseline_inputs();
    inputs.completion_percentage = 100.0;
    let report = score_readiness(&inputs, &ReadinessConfig::default(), &GradeBands::default());

    assert!(
        (report.score - 100.0).abs() < 0.01,
        "weights 25+25+20+20+10 must be achievable, got {}",
        report.score
    );
    assert_eq!(report.tier, ReadinessTier::Excellent);
    assert_eq!(report.confidence, "very_high");
    assert!(report.areas_for_improvement.is_empty());
}

#[test]
fn test_score_is_monotone_in_completion() {
    let config = ReadinessConfig::default();
    let bands = GradeBands::default();

    let mut low = baseline_inputs();
    low.completion_percentage = 70.0;
    let mut high = baseline_inputs();
    high.completion_percentage = 95.0;

    let low_score = score_readiness(&low, &config, &bands).score;
    let high_score = score_readiness(&high, &config, &bands).score;
    assert!(
        high_score >= low_score,
        "raising completion 70 -> 95 lowered the score: {} -> {}",
        low_score,
        high_score
    );
}

#[test]
fn test_strong_recent_performance_scores_ready() {
    // 10 sessions over 10 distinct days, average 92, one error per session,
    // moderate completion.
    let inputs = ReadinessInputs {
        completion_percentage: 50.0,
        performance: PerformanceSummary {
            window_days: 14,
            total_sessions: 10,
            completed_sessions: 10,
            completion_rate: 100.0,
            average_score: 92.0,
            error_rate: 1.0,
            consistency_rate: 1000.0 / 14.0,
            distinct_active_days: 10,
            trend: Trend::Stable,
        },
        days_since_last_session: Some(0),
        days_in_curriculum: 60,
        retention_rate: 0.0,
    };
    let report = score_readiness(&inputs, &ReadinessConfig::default(), &GradeBands::default());
    assert!(
        report.score >= 65.0,
        "expected at least the good tier, got {}",
        report.score
    );
    assert!(report.ready);
}

#[test]
fn test_inactivity_decays_consistency() {
    let config = ReadinessConfig::default();
    let bands = GradeBands::default();

    let mut active = baseline_inputs();
    active.days_since_last_session = Some(1);
    let mut idle = baseline_inputs();
    idle.days_since_last_session = Some(9);

    let active_score = score_readiness(&active, &config, &bands).score;
    let idle_score = score_readiness(&idle, &config, &bands).score;
    assert!(
        active_score > idle_score,
        "eight extra idle days must cost points: {} vs {}",
        active_score,
        idle_score
    );
}

#[test]
fn test_tier_cutoffs() {
    let config = ReadinessConfig::default();
    let bands = GradeBands::default();

    // Dial completion down until the total crosses each tier boundary.
    let mut inputs = baseline_inputs();
    inputs.performance.average_score = 75.0;
    inputs.performance.trend = Trend::Stable;
    inputs.retention_rate = 60.0;
    inputs.days_since_last_session = Some(4);
    let report = score_readiness(&inputs, &config, &bands);
    assert!(report.score < config.excellent_cutoff);
    assert!(report.score >= config.needs_improvement_cutoff);

    inputs.completion_percentage = 0.0;
    inputs.performance.average_score = 40.0;
    inputs.performance.completion_rate = 30.0;
    inputs.performance.error_rate = 5.0;
    inputs.retention_rate = 0.0;
    inputs.days_since_last_session = Some(15);
    inputs.days_in_curriculum = 5;
    let report = score_readiness(&inputs, &config, &bands);
    assert_eq!(report.tier, ReadinessTier::NotReady);
}

#[test]
fn test_sub_scores_never_exceed_their_weight() {
    let inputs = baseline_inputs();
    let config = ReadinessConfig::default();
    let report = score_readiness(&inputs, &config, &GradeBands::default());
    for criterion in &report.criteria {
        assert!(
            criterion.points <= criterion.max + 0.001,
            "{} exceeded its weight: {} > {}",
            criterion.criterion,
            criterion.points,
            criterion.max
        );
    }
    assert_eq!(report.criteria.len(), 5);
}
