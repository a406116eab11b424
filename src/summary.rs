//! Spending summary
//!
//! Aggregates a user's history into the figures behind the dashboard: spend by
//! category, the last week's daily trend, a 30-day projection and a six month
//! savings trajectory.

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::behavior::patterns::most_recent;
use crate::config::EngineConfig;
use crate::types::{Category, HarmfulPattern, Transaction, UserProfile};

/// Days in the trailing projection window
const PROJECTION_DAYS: i64 = 30;

/// Days shown in the weekly trend
const TREND_DAYS: i64 = 7;

/// Months in the savings trajectory
const TRAJECTORY_MONTHS: u32 = 6;

/// Recent transactions scanned for dashboard patterns
const DASHBOARD_PATTERN_LIMIT: usize = 50;

/// Share of income above which 30-day spend is a budget breach
const BUDGET_BREACH_RATIO: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpend {
    pub category: Category,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySpend {
    pub date: NaiveDate,
    /// Short weekday name, e.g. "Mon"
    pub day: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FutureProjection {
    pub projected_spend: f64,
    pub remaining_for_savings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsPoint {
    /// Months from now, starting at 1
    pub month_offset: u32,
    pub projected: f64,
    pub goal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingSummary {
    pub risk_score: u32,
    pub category_breakdown: Vec<CategorySpend>,
    pub weekly_spending: Vec<DailySpend>,
    pub monthly_spend: f64,
    pub future_projection: FutureProjection,
    pub savings_trajectory: Vec<SavingsPoint>,
    pub detected_patterns: Vec<HarmfulPattern>,
}

/// Build the spending summary for `profile` as of `now`
pub fn spending_summary(
    profile: &UserProfile,
    history: &[Transaction],
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> SpendingSummary {
    let category_breakdown = category_breakdown(history);
    let weekly_spending = weekly_spending(history, now, config);

    let window_start = now - Duration::days(PROJECTION_DAYS);
    let monthly_spend: f64 = history
        .iter()
        .filter(|tx| tx.timestamp >= window_start)
        .map(|tx| tx.amount)
        .sum();

    let daily_average = monthly_spend / PROJECTION_DAYS as f64;
    let projected_spend = daily_average * PROJECTION_DAYS as f64;
    let future_projection = FutureProjection {
        projected_spend,
        remaining_for_savings: profile.monthly_income - projected_spend,
    };

    let savings_trajectory = (1..=TRAJECTORY_MONTHS)
        .map(|month_offset| SavingsPoint {
            month_offset,
            projected: future_projection.remaining_for_savings * month_offset as f64,
            goal: profile.savings_goal * month_offset as f64,
        })
        .collect();

    let detected_patterns = dashboard_patterns(profile, history, monthly_spend, config);

    SpendingSummary {
        risk_score: profile.risk_score,
        category_breakdown,
        weekly_spending,
        monthly_spend,
        future_projection,
        savings_trajectory,
        detected_patterns,
    }
}

/// Total spend per category, largest first
fn category_breakdown(history: &[Transaction]) -> Vec<CategorySpend> {
    let mut totals: BTreeMap<Category, f64> = BTreeMap::new();
    for tx in history {
        *totals.entry(tx.category).or_insert(0.0) += tx.amount;
    }

    let mut breakdown: Vec<CategorySpend> = totals
        .into_iter()
        .map(|(category, amount)| CategorySpend { category, amount })
        .collect();
    breakdown.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    breakdown
}

/// Spend for each of the last seven local days, oldest first
fn weekly_spending(
    history: &[Transaction],
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Vec<DailySpend> {
    let today = config.to_local(now).date_naive();
    (0..TREND_DAYS)
        .rev()
        .map(|days_back| {
            let date = today - Duration::days(days_back);
            let amount = history
                .iter()
                .filter(|tx| config.to_local(tx.timestamp).date_naive() == date)
                .map(|tx| tx.amount)
                .sum();
            DailySpend {
                date,
                day: date.format("%a").to_string(),
                amount,
            }
        })
        .collect()
}

fn dashboard_patterns(
    profile: &UserProfile,
    history: &[Transaction],
    monthly_spend: f64,
    config: &EngineConfig,
) -> Vec<HarmfulPattern> {
    let recent = most_recent(history, DASHBOARD_PATTERN_LIMIT);
    let mut patterns = BTreeSet::new();

    if recent.iter().any(|tx| tx.category == Category::Gambling) {
        patterns.insert(HarmfulPattern::GamblingAlert);
    }

    let late_night = recent.iter().any(|tx| {
        let hour = config.to_local(tx.timestamp).hour();
        config.low_control_window.contains(hour)
            && !matches!(tx.category, Category::Bills | Category::Food)
    });
    if late_night {
        patterns.insert(HarmfulPattern::LateNightImpulse);
    }

    if monthly_spend > profile.monthly_income * BUDGET_BREACH_RATIO {
        patterns.insert(HarmfulPattern::BudgetBreach);
    }

    patterns.into_iter().collect()
}
