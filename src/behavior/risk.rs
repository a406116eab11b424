//! Account-level risk score
//!
//! Rule-based score (0-100) over the trailing risk window of a user's
//! transactions. Each rule adds a fixed number of points and the total is
//! capped at 100.

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::types::{Category, Transaction, UserProfile};

/// Share of monthly income above which spending counts as overspending
const OVERSPEND_INCOME_RATIO: f64 = 0.6;

/// Same-day discretionary purchases that count as a binge
const SAME_DAY_BINGE_COUNT: usize = 3;

/// Week-over-week growth that counts as acceleration
const ACCELERATION_RATIO: f64 = 1.3;

const MAX_ACCOUNT_RISK: u32 = 100;

/// A rule that contributed to the account risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskRule {
    /// Any gambling transaction in the window
    GamblingActivity,
    /// Total spend above 60% of monthly income
    Overspending,
    /// Three or more entertainment/shopping purchases on one day
    SameDayBinge,
    /// Entertainment, gambling or shopping during low-control hours
    LateNightImpulse,
    /// Income left after spending falls short of the savings goal
    SavingsShortfall,
    /// Last week's spend exceeds the week before by more than 30%
    SpendingAcceleration,
}

impl RiskRule {
    pub fn points(&self) -> u32 {
        match self {
            Self::GamblingActivity => 30,
            Self::Overspending => 20,
            Self::SameDayBinge => 15,
            Self::LateNightImpulse => 15,
            Self::SavingsShortfall => 10,
            Self::SpendingAcceleration => 10,
        }
    }
}

/// Result of scoring an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRisk {
    pub score: u32,
    pub total_spent: f64,
    pub triggered: Vec<RiskRule>,
}

impl AccountRisk {
    /// Store the score and window spend on the profile
    pub fn apply_to(&self, profile: &mut UserProfile) {
        profile.risk_score = self.score;
        profile.total_spent = self.total_spent;
    }
}

/// Score a user's recent spending behavior
pub fn account_risk(
    profile: &UserProfile,
    history: &[Transaction],
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> AccountRisk {
    let window_start = now - Duration::days(config.risk_window_days);
    let window: Vec<&Transaction> = history
        .iter()
        .filter(|tx| tx.timestamp >= window_start)
        .collect();

    let total_spent: f64 = window.iter().map(|tx| tx.amount).sum();
    let mut triggered = Vec::new();

    if window.iter().any(|tx| tx.category == Category::Gambling) {
        triggered.push(RiskRule::GamblingActivity);
    }

    if total_spent > profile.monthly_income * OVERSPEND_INCOME_RATIO {
        triggered.push(RiskRule::Overspending);
    }

    if has_same_day_binge(&window, config) {
        triggered.push(RiskRule::SameDayBinge);
    }

    let late_night_impulse = window.iter().any(|tx| {
        let hour = config.to_local(tx.timestamp).hour();
        config.low_control_window.contains(hour)
            && matches!(
                tx.category,
                Category::Entertainment | Category::Gambling | Category::Shopping
            )
    });
    if late_night_impulse {
        triggered.push(RiskRule::LateNightImpulse);
    }

    if profile.monthly_income - total_spent < profile.savings_goal {
        triggered.push(RiskRule::SavingsShortfall);
    }

    if is_accelerating(&window, now) {
        triggered.push(RiskRule::SpendingAcceleration);
    }

    let score = triggered
        .iter()
        .map(RiskRule::points)
        .sum::<u32>()
        .min(MAX_ACCOUNT_RISK);

    AccountRisk {
        score,
        total_spent,
        triggered,
    }
}

fn has_same_day_binge(window: &[&Transaction], config: &EngineConfig) -> bool {
    let mut per_day: HashMap<NaiveDate, usize> = HashMap::new();
    for tx in window {
        if matches!(tx.category, Category::Entertainment | Category::Shopping) {
            *per_day
                .entry(config.to_local(tx.timestamp).date_naive())
                .or_insert(0) += 1;
        }
    }
    per_day.values().any(|&count| count >= SAME_DAY_BINGE_COUNT)
}

fn is_accelerating(window: &[&Transaction], now: DateTime<Utc>) -> bool {
    let week_ago = now - Duration::days(7);
    let two_weeks_ago = now - Duration::days(14);

    let last_week: f64 = window
        .iter()
        .filter(|tx| tx.timestamp > week_ago)
        .map(|tx| tx.amount)
        .sum();
    let previous_week: f64 = window
        .iter()
        .filter(|tx| tx.timestamp <= week_ago && tx.timestamp > two_weeks_ago)
        .map(|tx| tx.amount)
        .sum();

    previous_week > 0.0 && last_week > previous_week * ACCELERATION_RATIO
}
