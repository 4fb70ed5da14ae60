//! Progression readiness scoring.
//!
//! A pure weighted rubric over five criteria: curriculum completion (25),
//! recent session performance (25), daily-tracking consistency (20),
//! quality/mastery (20) and time investment (10). Sub-scores are capped at
//! their weight, so the achieved maximum equals the theoretical 100.

use serde::{Deserialize, Serialize};

use crate::analytics::{PerformanceSummary, Trend};
use crate::config::{GradeBands, ReadinessConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessTier {
    Excellent,
    VeryGood,
    Good,
    NeedsImprovement,
    NotReady,
}

impl ReadinessTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessTier::Excellent => "excellent",
            ReadinessTier::VeryGood => "very_good",
            ReadinessTier::Good => "good",
            ReadinessTier::NeedsImprovement => "needs_improvement",
            ReadinessTier::NotReady => "not_ready",
        }
    }

    pub fn confidence(&self) -> &'static str {
        match self {
            ReadinessTier::Excellent => "very_high",
            ReadinessTier::VeryGood => "high",
            ReadinessTier::Good => "medium_high",
            ReadinessTier::NeedsImprovement => "medium",
            ReadinessTier::NotReady => "low",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(
            self,
            ReadinessTier::Excellent | ReadinessTier::VeryGood | ReadinessTier::Good
        )
    }
}

/// Everything the scorer looks at. No hidden I/O: assembling these is the
/// engine's job, scoring them is deterministic.
#[derive(Debug, Clone)]
pub struct ReadinessInputs {
    /// Assignment completion over the whole program, 0–100.
    pub completion_percentage: f32,
    pub performance: PerformanceSummary,
    /// Days since the last completed session; None for a student who has
    /// never recited.
    pub days_since_last_session: Option<i64>,
    pub days_in_curriculum: i64,
    /// Share (0–100) of review sessions graded at the good band or above.
    pub retention_rate: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CriterionScore {
    pub criterion: &'static str,
    pub points: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadinessReport {
    /// Total 0–100.
    pub score: f32,
    pub tier: ReadinessTier,
    pub ready: bool,
    pub confidence: &'static str,
    pub criteria: Vec<CriterionScore>,
    pub recommendations: Vec<String>,
    pub next_steps: Vec<String>,
    pub areas_for_improvement: Vec<String>,
}

/// Score a student's readiness to advance. Pure function of its inputs.
pub fn score_readiness(
    inputs: &ReadinessInputs,
    config: &ReadinessConfig,
    bands: &GradeBands,
) -> ReadinessReport {
    let criteria = vec![
        CriterionScore {
            criterion: "curriculum_completion",
            points: completion_score(inputs.completion_percentage, config),
            max: config.completion_weight,
        },
        CriterionScore {
            criterion: "session_performance",
            points: performance_score(&inputs.performance, config, bands),
            max: config.performance_weight,
        },
        CriterionScore {
            criterion: "daily_consistency",
            points: consistency_score(inputs.days_since_last_session, config),
            max: config.consistency_weight,
        },
        CriterionScore {
            criterion: "quality_mastery",
            points: mastery_score(inputs, config, bands),
            max: config.mastery_weight,
        },
        CriterionScore {
            criterion: "time_investment",
            points: tenure_score(inputs.days_in_curriculum, config),
            max: config.tenure_weight,
        },
    ];

    let score: f32 = criteria.iter().map(|c| c.points).sum();
    let tier = tier_for(score, config);

    ReadinessReport {
        score,
        tier,
        ready: tier.is_ready(),
        confidence: tier.confidence(),
        recommendations: recommendations_for(tier),
        next_steps: next_steps_for(tier),
        areas_for_improvement: improvement_areas(&criteria),
        criteria,
    }
}

fn tier_for(score: f32, config: &ReadinessConfig) -> ReadinessTier {
    if score >= config.excellent_cutoff {
        ReadinessTier::Excellent
    } else if score >= config.very_good_cutoff {
        ReadinessTier::VeryGood
    } else if score >= config.ready_cutoff {
        ReadinessTier::Good
    } else if score >= config.needs_improvement_cutoff {
        ReadinessTier::NeedsImprovement
    } else {
        ReadinessTier::NotReady
    }
}

/// Linear in completion percentage, capped at the criterion weight.
fn completion_score(completion_percentage: f32, config: &ReadinessConfig) -> f32 {
    let pct = completion_percentage.clamp(0.0, 100.0);
    (pct / 100.0 * config.completion_weight).min(config.completion_weight)
}

/// Score band + session-completion band + trend bonus, capped at the weight.
fn performance_score(
    performance: &PerformanceSummary,
    config: &ReadinessConfig,
    bands: &GradeBands,
) -> f32 {
    if performance.completed_sessions == 0 {
        return 0.0;
    }

    let score_points: f32 = if performance.average_score >= bands.excellent {
        15.0
    } else if performance.average_score >= bands.very_good {
        12.0
    } else if performance.average_score >= bands.good {
        9.0
    } else if performance.average_score >= bands.acceptable {
        6.0
    } else {
        3.0
    };

    let completion_points = if performance.completion_rate >= 90.0 {
        6.0
    } else if performance.completion_rate >= 75.0 {
        4.0
    } else if performance.completion_rate >= 50.0 {
        2.0
    } else {
        0.0
    };

    let trend_points = match performance.trend {
        Trend::Improving => 4.0,
        Trend::Stable => 2.0,
        Trend::Declining | Trend::InsufficientData => 0.0,
    };

    (score_points + completion_points + trend_points).min(config.performance_weight)
}

/// Starts at 100 and decays per day of inactivity beyond the first, floored
/// at 0, then banded into the criterion weight.
fn consistency_score(days_since_last_session: Option<i64>, config: &ReadinessConfig) -> f32 {
    let days_inactive = match days_since_last_session {
        Some(days) => days,
        None => return 0.0,
    };
    let idle_beyond_first = (days_inactive - 1).max(0) as f32;
    let base = (100.0 - config.inactivity_decay_per_day * idle_beyond_first).max(0.0);

    let points = if base >= 90.0 {
        config.consistency_weight
    } else if base >= 75.0 {
        16.0
    } else if base >= 60.0 {
        12.0
    } else if base >= 40.0 {
        8.0
    } else if base >= 20.0 {
        4.0
    } else {
        0.0
    };
    points.min(config.consistency_weight)
}

/// Error-rate band + mastery band + retention band, capped at the weight.
fn mastery_score(inputs: &ReadinessInputs, config: &ReadinessConfig, bands: &GradeBands) -> f32 {
    let performance = &inputs.performance;
    if performance.total_sessions == 0 {
        return 0.0;
    }

    let error_points: f32 = if performance.error_rate <= 0.5 {
        8.0
    } else if performance.error_rate <= 1.0 {
        6.0
    } else if performance.error_rate <= 2.0 {
        4.0
    } else if performance.error_rate <= 3.0 {
        2.0
    } else {
        0.0
    };

    let mastery_points = if performance.completed_sessions == 0 {
        0.0
    } else if performance.average_score >= bands.excellent {
        7.0
    } else if performance.average_score >= bands.very_good {
        5.0
    } else if performance.average_score >= bands.good {
        3.0
    } else if performance.average_score >= bands.acceptable {
        1.0
    } else {
        0.0
    };

    let retention_points = if inputs.retention_rate >= 90.0 {
        5.0
    } else if inputs.retention_rate >= 75.0 {
        4.0
    } else if inputs.retention_rate >= 50.0 {
        2.0
    } else {
        0.0
    };

    (error_points + mastery_points + retention_points).min(config.mastery_weight)
}

/// Banded by days in the current curriculum, with a sweet spot between the
/// configured bounds.
fn tenure_score(days_in_curriculum: i64, config: &ReadinessConfig) -> f32 {
    let days = days_in_curriculum.max(0);
    if days >= config.tenure_sweet_spot_min && days <= config.tenure_sweet_spot_max {
        config.tenure_weight
    } else if days < 15 {
        2.0_f32.min(config.tenure_weight)
    } else if days < config.tenure_sweet_spot_min {
        6.0_f32.min(config.tenure_weight)
    } else if days <= 180 {
        7.0_f32.min(config.tenure_weight)
    } else {
        4.0_f32.min(config.tenure_weight)
    }
}

/// Criteria scoring under 60% of their weight are called out by name.
fn improvement_areas(criteria: &[CriterionScore]) -> Vec<String> {
    criteria
        .iter()
        .filter(|c| c.points < c.max * 0.6)
        .map(|c| match c.criterion {
            "curriculum_completion" => "إكمال المنهج الحالي".to_string(),
            "session_performance" => "مستوى التسميع في الجلسات الأخيرة".to_string(),
            "daily_consistency" => "الانتظام اليومي في الحفظ".to_string(),
            "quality_mastery" => "إتقان الحفظ وتقليل الأخطاء".to_string(),
            "time_investment" => "المدة الكافية في المنهج الحالي".to_string(),
            other => other.to_string(),
        })
        .collect()
}

fn recommendations_for(tier: ReadinessTier) -> Vec<String> {
    match tier {
        ReadinessTier::Excellent => vec![
            "الطالب جاهز للانتقال إلى المستوى التالي".to_string(),
            "أداء ممتاز ومستقر خلال الفترة الأخيرة".to_string(),
        ],
        ReadinessTier::VeryGood => vec![
            "الطالب جاهز للانتقال مع متابعة المراجعة الكبرى".to_string(),
            "يُنصح بجلسة تقييم شاملة قبل الانتقال".to_string(),
        ],
        ReadinessTier::Good => vec![
            "الطالب مؤهل للانتقال بعد موافقة المعلم".to_string(),
            "تثبيت المقاطع الأخيرة قبل بدء مستوى جديد".to_string(),
        ],
        ReadinessTier::NeedsImprovement => vec![
            "يحتاج الطالب إلى فترة إضافية قبل الانتقال".to_string(),
            "زيادة جلسات المراجعة الصغرى خلال الأسبوعين القادمين".to_string(),
        ],
        ReadinessTier::NotReady => vec![
            "الطالب غير جاهز للانتقال حالياً".to_string(),
            "وضع خطة متابعة يومية مع المعلم".to_string(),
        ],
    }
}

fn next_steps_for(tier: ReadinessTier) -> Vec<String> {
    if tier.is_ready() {
        vec![
            "عرض التوصية على المعلم المشرف للاعتماد".to_string(),
            "جدولة اختبار انتقال للمقرر الحالي".to_string(),
            "تحديد المستوى التالي وخطة البداية".to_string(),
        ]
    } else {
        vec![
            "مراجعة جدول الحفظ اليومي مع الطالب".to_string(),
            "تكثيف المراجعة على مواضع الأخطاء المتكررة".to_string(),
            "إعادة التقييم بعد أسبوعين".to_string(),
        ]
    }
}
