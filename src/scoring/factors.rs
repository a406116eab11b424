//! Impulse factor scorers
//!
//! Each factor is a pure function of caller-supplied inputs, clamped to its own
//! ceiling so the four of them always sum to at most 100.
//!
//! Clamping uses `max(0).min(ceiling)` rather than `clamp` so a NaN
//! intermediate collapses to the floor instead of propagating.

/// Ceiling of the behavioral deviation factor
pub const BEHAVIORAL_DEVIATION_MAX: f64 = 30.0;

/// Ceiling of the temporal vulnerability factor
pub const TEMPORAL_VULNERABILITY_MAX: f64 = 20.0;

/// Ceiling of the financial pressure factor
pub const FINANCIAL_PRESSURE_MAX: f64 = 25.0;

/// Ceiling of the habit escalation factor
pub const HABIT_ESCALATION_MAX: f64 = 25.0;

/// z-score at which the deviation factor saturates
const DEVIATION_SATURATION_Z: f64 = 3.0;

/// Pressure points awarded for spending exactly one day's allowance
const PRESSURE_PER_ALLOWANCE: f64 = 20.0;

/// Habit points per recent impulse alert
const PENALTY_PER_ALERT: f64 = 5.0;

/// Score how far the amount sits above the user's category average
///
/// Formula: `min(max((z / 3) * 30, 0), 30)` where `z = (amount - mean) / std_dev`
///
/// Only above-average spending is penalized; a non-positive std-dev carries no
/// signal and scores zero.
pub fn behavioral_deviation(amount: f64, historical_mean: f64, historical_std_dev: f64) -> f64 {
    if !(historical_std_dev > 0.0) {
        return 0.0;
    }

    let z_score = (amount - historical_mean) / historical_std_dev;
    if !(z_score > 0.0) {
        return 0.0;
    }

    let score = (z_score / DEVIATION_SATURATION_Z) * BEHAVIORAL_DEVIATION_MAX;
    bounded(score, BEHAVIORAL_DEVIATION_MAX)
}

/// Score the time-of-day vulnerability
///
/// Binary for now: the full 20 points inside the low-control window, zero
/// otherwise.
pub fn temporal_vulnerability(is_low_control_hour: bool) -> f64 {
    if is_low_control_hour {
        TEMPORAL_VULNERABILITY_MAX
    } else {
        0.0
    }
}

/// Score how much of the sustainable daily allowance the amount consumes
///
/// Formula: `min(max((amount / allowance) * 20, 0), 25)`
///
/// Spending the whole allowance scores 20; saturation needs 125% of it. An
/// exhausted (non-positive) allowance is maximal pressure.
pub fn financial_pressure(amount: f64, sustainable_daily_allowance: f64) -> f64 {
    if !(sustainable_daily_allowance > 0.0) {
        return FINANCIAL_PRESSURE_MAX;
    }

    let ratio = amount / sustainable_daily_allowance;
    bounded(ratio * PRESSURE_PER_ALLOWANCE, FINANCIAL_PRESSURE_MAX)
}

/// Score the recent frequency of impulsive transactions
///
/// Formula: `min(alerts * 5, 25)`; five alerts saturate.
pub fn habit_escalation(recent_impulse_alerts: u32) -> f64 {
    bounded(
        recent_impulse_alerts as f64 * PENALTY_PER_ALERT,
        HABIT_ESCALATION_MAX,
    )
}

fn bounded(score: f64, ceiling: f64) -> f64 {
    score.max(0.0).min(ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deviation_linear_region() {
        // z = 1.5 -> half of 30
        let score = behavioral_deviation(250.0, 100.0, 100.0);
        assert!((score - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_deviation_saturates_at_three_sigma() {
        assert_eq!(behavioral_deviation(400.0, 100.0, 100.0), 30.0);
        assert_eq!(behavioral_deviation(5000.0, 1000.0, 500.0), 30.0);
    }

    #[test]
    fn test_deviation_below_mean_is_zero() {
        assert_eq!(behavioral_deviation(50.0, 100.0, 20.0), 0.0);
        assert_eq!(behavioral_deviation(100.0, 100.0, 20.0), 0.0);
    }

    #[test]
    fn test_deviation_std_dev_guard() {
        assert_eq!(behavioral_deviation(10_000.0, 10.0, 0.0), 0.0);
        assert_eq!(behavioral_deviation(10_000.0, 10.0, -3.0), 0.0);
        assert_eq!(behavioral_deviation(10_000.0, 10.0, f64::NAN), 0.0);
    }

    #[test]
    fn test_deviation_nan_amount() {
        assert_eq!(behavioral_deviation(f64::NAN, 10.0, 5.0), 0.0);
    }

    #[test]
    fn test_temporal_is_binary() {
        assert_eq!(temporal_vulnerability(true), 20.0);
        assert_eq!(temporal_vulnerability(false), 0.0);
    }

    #[test]
    fn test_pressure_full_allowance_scores_twenty() {
        assert_eq!(financial_pressure(200.0, 200.0), 20.0);
    }

    #[test]
    fn test_pressure_saturation() {
        assert_eq!(financial_pressure(250.0, 200.0), 25.0);
        assert_eq!(financial_pressure(5000.0, 2000.0), 25.0);
    }

    #[test]
    fn test_pressure_allowance_guard() {
        assert_eq!(financial_pressure(1.0, 0.0), 25.0);
        assert_eq!(financial_pressure(0.0, -50.0), 25.0);
        assert_eq!(financial_pressure(10.0, f64::NAN), 25.0);
    }

    #[test]
    fn test_pressure_negative_amount_floors() {
        assert_eq!(financial_pressure(-100.0, 200.0), 0.0);
    }

    #[test]
    fn test_habit_scaling() {
        assert_eq!(habit_escalation(0), 0.0);
        assert_eq!(habit_escalation(2), 10.0);
        assert_eq!(habit_escalation(5), 25.0);
        assert_eq!(habit_escalation(u32::MAX), 25.0);
    }

    #[test]
    fn test_ceilings_sum_to_hundred() {
        let total = BEHAVIORAL_DEVIATION_MAX
            + TEMPORAL_VULNERABILITY_MAX
            + FINANCIAL_PRESSURE_MAX
            + HABIT_ESCALATION_MAX;
        assert_eq!(total, 100.0);
    }
}
