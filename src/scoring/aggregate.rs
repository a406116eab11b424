//! Composite impulse index
//!
//! Sums the four factor scores into the impulse index, classifies it and
//! builds the explanation shown to the user before a payment is committed.

use tracing::debug;

use crate::scoring::factors::{
    behavioral_deviation, financial_pressure, habit_escalation, temporal_vulnerability,
    BEHAVIORAL_DEVIATION_MAX, FINANCIAL_PRESSURE_MAX, HABIT_ESCALATION_MAX,
    TEMPORAL_VULNERABILITY_MAX,
};
use crate::types::{
    ExplanationBreakdown, FactorExplanation, RiskLevel, ScoringInput, ScoringResult,
};

/// Weeks per month used when projecting a recurring impulse
const WEEKS_PER_MONTH: f64 = 4.0;

/// Score a candidate transaction.
///
/// Total over every numeric input: each factor guards its own denominator
/// and is clamped, so the index is always within 0..=100.
pub fn analyze_transaction(input: &ScoringInput) -> ScoringResult {
    let behavior = behavioral_deviation(
        input.amount,
        input.historical_mean,
        input.historical_std_dev,
    );
    let temporal = temporal_vulnerability(input.is_low_control_hour);
    let pressure = financial_pressure(input.amount, input.sustainable_daily_allowance);
    let habit = habit_escalation(input.recent_impulse_alerts);

    let raw_index = behavior + temporal + pressure + habit;
    // Classified before rounding; only the reported index is rounded
    let risk_level = RiskLevel::from_index(raw_index);
    let impulse_index = round_to(raw_index, 1);

    let explanation_breakdown = ExplanationBreakdown {
        behavioral_deviation: FactorExplanation {
            score: round_to(behavior, 1),
            max: BEHAVIORAL_DEVIATION_MAX,
            reason: format!(
                "Transaction deviates from historical avg by ${:.2}.",
                (input.amount - input.historical_mean).max(0.0)
            ),
        },
        temporal_vulnerability: FactorExplanation {
            score: round_to(temporal, 1),
            max: TEMPORAL_VULNERABILITY_MAX,
            reason: if input.is_low_control_hour {
                "Occurred during identified low-control hours.".to_string()
            } else {
                "Standard transaction hours.".to_string()
            },
        },
        financial_pressure: FactorExplanation {
            score: round_to(pressure, 1),
            max: FINANCIAL_PRESSURE_MAX,
            reason: format!(
                "Consumes {:.1}% of sustainable daily allowance.",
                allowance_share_pct(input.amount, input.sustainable_daily_allowance)
            ),
        },
        habit_escalation: FactorExplanation {
            score: round_to(habit, 1),
            max: HABIT_ESCALATION_MAX,
            reason: format!(
                "Detected {} recent impulse alerts.",
                input.recent_impulse_alerts
            ),
        },
    };

    let projected_monthly_impact = projected_monthly_impact(
        input.amount,
        input.historical_mean,
        input.recent_impulse_alerts,
    );

    debug!(
        impulse_index,
        %risk_level,
        behavior,
        temporal,
        pressure,
        habit,
        "scored transaction"
    );

    ScoringResult {
        impulse_index,
        risk_level,
        explanation_breakdown,
        projected_monthly_impact,
    }
}

/// Monthly cost if this behavior repeats at the recent alert rate
///
/// Formula: `excess * max(alerts, 1) * 4`, where `excess` is the amount above
/// the mean, or the whole amount when it does not exceed the mean.
pub fn projected_monthly_impact(amount: f64, historical_mean: f64, recent_impulse_alerts: u32) -> f64 {
    let excess = if amount > historical_mean {
        amount - historical_mean
    } else {
        amount
    };
    let events_per_month = recent_impulse_alerts.max(1) as f64 * WEEKS_PER_MONTH;
    round_to(excess * events_per_month, 2)
}

/// Share of the daily allowance consumed, in percent.
///
/// Only an allowance of exactly zero is substituted; negative allowances are
/// reported as-is.
fn allowance_share_pct(amount: f64, sustainable_daily_allowance: f64) -> f64 {
    let denominator = if sustainable_daily_allowance == 0.0 || sustainable_daily_allowance.is_nan() {
        1.0
    } else {
        sustainable_daily_allowance
    };
    (amount / denominator) * 100.0
}

/// Round half away from zero to `decimals` places
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
