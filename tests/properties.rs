//! Property tests for the impulse scorer
//!
//! Each factor is checked against its ceiling and guards over arbitrary
//! finite inputs, and the composite result is checked for internal
//! consistency.

use nudge_engine::scoring::factors::{
    behavioral_deviation, financial_pressure, habit_escalation, temporal_vulnerability,
    BEHAVIORAL_DEVIATION_MAX, FINANCIAL_PRESSURE_MAX, HABIT_ESCALATION_MAX,
    TEMPORAL_VULNERABILITY_MAX,
};
use nudge_engine::{analyze_transaction, LowControlWindow, RiskLevel, ScoringInput};
use proptest::prelude::*;

fn amount() -> impl Strategy<Value = f64> {
    0.0f64..1_000_000.0
}

fn scoring_input() -> impl Strategy<Value = ScoringInput> {
    (
        amount(),
        amount(),
        -10.0f64..50_000.0,
        any::<bool>(),
        -5_000.0f64..50_000.0,
        0u32..20,
    )
        .prop_map(
            |(amount, mean, std_dev, late, allowance, alerts)| ScoringInput {
                amount,
                historical_mean: mean,
                historical_std_dev: std_dev,
                is_low_control_hour: late,
                sustainable_daily_allowance: allowance,
                recent_impulse_alerts: alerts,
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn factors_stay_within_ceilings(input in scoring_input()) {
        let result = analyze_transaction(&input);
        let b = &result.explanation_breakdown;

        prop_assert!((0.0..=BEHAVIORAL_DEVIATION_MAX).contains(&b.behavioral_deviation.score));
        prop_assert!((0.0..=TEMPORAL_VULNERABILITY_MAX).contains(&b.temporal_vulnerability.score));
        prop_assert!((0.0..=FINANCIAL_PRESSURE_MAX).contains(&b.financial_pressure.score));
        prop_assert!((0.0..=HABIT_ESCALATION_MAX).contains(&b.habit_escalation.score));
        prop_assert!(
            (0.0..=100.0).contains(&result.impulse_index),
            "index {} out of range for {:?}", result.impulse_index, input
        );
    }

    #[test]
    fn level_classifies_unrounded_sum(input in scoring_input()) {
        let raw = behavioral_deviation(input.amount, input.historical_mean, input.historical_std_dev)
            + temporal_vulnerability(input.is_low_control_hour)
            + financial_pressure(input.amount, input.sustainable_daily_allowance)
            + habit_escalation(input.recent_impulse_alerts);
        let result = analyze_transaction(&input);
        prop_assert_eq!(result.risk_level, RiskLevel::from_index(raw));
        prop_assert!((result.impulse_index - raw).abs() <= 0.05 + 1e-9);
    }

    #[test]
    fn scoring_is_idempotent(input in scoring_input()) {
        prop_assert_eq!(analyze_transaction(&input), analyze_transaction(&input));
    }

    #[test]
    fn deviation_monotonic_in_amount(
        a in amount(),
        b in amount(),
        mean in amount(),
        std_dev in 0.01f64..50_000.0,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(behavioral_deviation(lo, mean, std_dev) <= behavioral_deviation(hi, mean, std_dev));
    }

    #[test]
    fn pressure_monotonic_in_amount(
        a in amount(),
        b in amount(),
        allowance in -1_000.0f64..50_000.0,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(financial_pressure(lo, allowance) <= financial_pressure(hi, allowance));
    }

    #[test]
    fn no_deviation_at_or_below_mean(
        mean in amount(),
        below in 0.0f64..1.0,
        std_dev in 0.01f64..50_000.0,
    ) {
        let spent = mean * below;
        prop_assert_eq!(behavioral_deviation(spent, mean, std_dev), 0.0);
        prop_assert_eq!(behavioral_deviation(mean, mean, std_dev), 0.0);
    }

    #[test]
    fn non_positive_std_dev_scores_zero(
        spent in amount(),
        mean in amount(),
        std_dev in -1_000.0f64..=0.0,
    ) {
        prop_assert_eq!(behavioral_deviation(spent, mean, std_dev), 0.0);
    }

    #[test]
    fn exhausted_allowance_is_maximal(spent in amount(), allowance in -10_000.0f64..=0.0) {
        prop_assert_eq!(financial_pressure(spent, allowance), FINANCIAL_PRESSURE_MAX);
    }

    #[test]
    fn habit_saturates_at_five_alerts(alerts in 5u32..10_000) {
        prop_assert_eq!(habit_escalation(alerts), HABIT_ESCALATION_MAX);
    }

    #[test]
    fn window_membership_matches_wrapped_range(hour in 0u32..24) {
        let window = LowControlWindow::default();
        prop_assert_eq!(window.contains(hour), hour >= 23 || hour < 4);
    }
}

#[test]
fn habit_floor_and_temporal_values() {
    assert_eq!(habit_escalation(0), 0.0);
    assert_eq!(temporal_vulnerability(true), TEMPORAL_VULNERABILITY_MAX);
    assert_eq!(temporal_vulnerability(false), 0.0);
}

#[test]
fn level_thresholds() {
    assert_eq!(RiskLevel::from_index(19.9), RiskLevel::Low);
    assert_eq!(RiskLevel::from_index(20.0), RiskLevel::Moderate);
    assert_eq!(RiskLevel::from_index(44.9), RiskLevel::Moderate);
    assert_eq!(RiskLevel::from_index(45.0), RiskLevel::High);
    assert_eq!(RiskLevel::from_index(69.9), RiskLevel::High);
    assert_eq!(RiskLevel::from_index(70.0), RiskLevel::Critical);
}

#[test]
fn nan_inputs_do_not_escape() {
    let input = ScoringInput {
        amount: f64::NAN,
        historical_mean: f64::NAN,
        historical_std_dev: f64::NAN,
        is_low_control_hour: false,
        sustainable_daily_allowance: f64::NAN,
        recent_impulse_alerts: 0,
    };
    let result = analyze_transaction(&input);
    assert!((0.0..=100.0).contains(&result.impulse_index));
}

#[test]
fn end_to_end_critical_example() {
    let input = ScoringInput {
        amount: 5000.0,
        historical_mean: 1000.0,
        historical_std_dev: 500.0,
        is_low_control_hour: true,
        sustainable_daily_allowance: 2000.0,
        recent_impulse_alerts: 2,
    };
    let result = analyze_transaction(&input);

    assert_eq!(result.impulse_index, 85.0);
    assert_eq!(result.risk_level, RiskLevel::Critical);
    assert_eq!(result.projected_monthly_impact, 32000.0);
    assert_eq!(result.explanation_breakdown.behavioral_deviation.score, 30.0);
    assert_eq!(result.explanation_breakdown.temporal_vulnerability.score, 20.0);
    assert_eq!(result.explanation_breakdown.financial_pressure.score, 25.0);
    assert_eq!(result.explanation_breakdown.habit_escalation.score, 10.0);
}
