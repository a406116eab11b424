//! Harmful spending pattern detection
//!
//! Inspects the most recent transactions relative to the latest one and flags
//! patterns that warrant a nudge.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};

use crate::config::EngineConfig;
use crate::types::{Category, HarmfulPattern, Transaction, UserProfile};

/// Number of most recent transactions inspected
pub const PATTERN_HISTORY_LIMIT: usize = 100;

/// Same-category purchases within the binge window that count as a binge
const BINGE_MIN_COUNT: usize = 3;

/// Look-back from the latest transaction for binge detection
const BINGE_WINDOW_HOURS: i64 = 2;

/// Share of monthly income above which the month's spend is a breach
const BUDGET_BREACH_RATIO: f64 = 0.8;

/// Detect harmful patterns anchored on the latest transaction in `history`.
///
/// Returns patterns in a fixed order; an empty history yields none.
pub fn detect_patterns(
    profile: &UserProfile,
    history: &[Transaction],
    config: &EngineConfig,
) -> Vec<HarmfulPattern> {
    let recent = most_recent(history, PATTERN_HISTORY_LIMIT);
    let Some(latest) = recent.first().copied() else {
        return Vec::new();
    };

    let mut patterns = Vec::new();

    let binge_start = latest.timestamp - Duration::hours(BINGE_WINDOW_HOURS);
    let same_category = recent
        .iter()
        .filter(|tx| tx.category == latest.category && tx.timestamp >= binge_start)
        .count();
    if same_category >= BINGE_MIN_COUNT {
        patterns.push(HarmfulPattern::BingeSpending);
    }

    let hour = config.to_local(latest.timestamp).hour();
    if config.low_control_window.contains(hour) && latest.category != Category::Bills {
        patterns.push(HarmfulPattern::LateNightImpulse);
    }

    let monthly_spend = month_spend(&recent, latest.timestamp, config);
    if monthly_spend > profile.monthly_income * BUDGET_BREACH_RATIO {
        patterns.push(HarmfulPattern::BudgetBreach);
    }

    if profile.monthly_income - monthly_spend < profile.savings_goal {
        patterns.push(HarmfulPattern::SavingDerail);
    }

    if latest.category == Category::Gambling {
        patterns.push(HarmfulPattern::GamblingAlert);
    }

    patterns
}

/// The `limit` most recent transactions, newest first
pub(crate) fn most_recent(history: &[Transaction], limit: usize) -> Vec<&Transaction> {
    let mut sorted: Vec<&Transaction> = history.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    sorted.truncate(limit);
    sorted
}

/// Spend in the local calendar month containing `anchor`
fn month_spend(recent: &[&Transaction], anchor: DateTime<Utc>, config: &EngineConfig) -> f64 {
    let anchor = config.to_local(anchor);
    recent
        .iter()
        .filter(|tx| {
            let local = config.to_local(tx.timestamp);
            local.month() == anchor.month() && local.year() == anchor.year()
        })
        .map(|tx| tx.amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::{at, tx};
    use pretty_assertions::assert_eq;

    fn profile() -> UserProfile {
        UserProfile {
            user_id: "user-1".to_string(),
            monthly_income: 50_000.0,
            savings_goal: 10_000.0,
            risk_score: 0,
            total_spent: 0.0,
        }
    }

    #[test]
    fn test_empty_history() {
        assert!(detect_patterns(&profile(), &[], &EngineConfig::default()).is_empty());
    }

    #[test]
    fn test_binge_within_two_hours() {
        let history = vec![
            tx(300.0, Category::Shopping, at(2024, 3, 12, 15, 0)),
            tx(400.0, Category::Shopping, at(2024, 3, 12, 14, 0)),
            tx(250.0, Category::Shopping, at(2024, 3, 12, 13, 0)),
        ];
        let patterns = detect_patterns(&profile(), &history, &EngineConfig::default());
        assert_eq!(patterns, vec![HarmfulPattern::BingeSpending]);
    }

    #[test]
    fn test_binge_outside_window() {
        let history = vec![
            tx(300.0, Category::Shopping, at(2024, 3, 12, 15, 0)),
            tx(400.0, Category::Shopping, at(2024, 3, 12, 14, 0)),
            tx(250.0, Category::Shopping, at(2024, 3, 12, 12, 59)),
        ];
        let patterns = detect_patterns(&profile(), &history, &EngineConfig::default());
        assert!(patterns.is_empty());
    }

    #[test]
    fn test_latest_is_newest_regardless_of_order() {
        // Unsorted input: the gambling transaction is the latest
        let history = vec![
            tx(100.0, Category::Food, at(2024, 3, 12, 10, 0)),
            tx(2000.0, Category::Gambling, at(2024, 3, 12, 23, 45)),
            tx(80.0, Category::Transport, at(2024, 3, 11, 9, 0)),
        ];
        let patterns = detect_patterns(&profile(), &history, &EngineConfig::default());
        assert_eq!(
            patterns,
            vec![
                HarmfulPattern::LateNightImpulse,
                HarmfulPattern::GamblingAlert
            ]
        );
    }

    #[test]
    fn test_late_night_bills_exempt() {
        let history = vec![tx(1200.0, Category::Bills, at(2024, 3, 12, 23, 30))];
        assert!(detect_patterns(&profile(), &history, &EngineConfig::default()).is_empty());
    }

    #[test]
    fn test_budget_breach_and_saving_derail() {
        let history = vec![
            tx(30_000.0, Category::Luxury, at(2024, 3, 2, 12, 0)),
            tx(11_000.0, Category::Shopping, at(2024, 3, 20, 12, 0)),
            // Previous month does not count
            tx(40_000.0, Category::Luxury, at(2024, 2, 25, 12, 0)),
        ];
        let patterns = detect_patterns(&profile(), &history, &EngineConfig::default());
        assert_eq!(
            patterns,
            vec![HarmfulPattern::BudgetBreach, HarmfulPattern::SavingDerail]
        );
    }

    #[test]
    fn test_saving_derail_without_breach() {
        let ambitious = UserProfile {
            savings_goal: 20_000.0,
            ..profile()
        };
        // 35k is under 80% of income but leaves only 15k toward a 20k goal
        let history = vec![tx(35_000.0, Category::Luxury, at(2024, 3, 20, 12, 0))];
        let patterns = detect_patterns(&ambitious, &history, &EngineConfig::default());
        assert_eq!(patterns, vec![HarmfulPattern::SavingDerail]);
    }

    #[test]
    fn test_history_limit() {
        let mut history: Vec<Transaction> = (0..150)
            .map(|i| tx(10.0, Category::Food, at(2024, 3, 1, 0, 0) + Duration::hours(i)))
            .collect();
        history.push(tx(0.0, Category::Food, at(2024, 1, 1, 0, 0)));
        let recent = most_recent(&history, PATTERN_HISTORY_LIMIT);
        assert_eq!(recent.len(), PATTERN_HISTORY_LIMIT);
        assert_eq!(recent[0].timestamp, at(2024, 3, 1, 0, 0) + Duration::hours(149));
    }
}
