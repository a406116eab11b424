//! Scoring context assembly
//!
//! Derives the four caller-supplied `ScoringInput` fields from a payment
//! request: category statistics, the low-control flag, the sustainable daily
//! allowance and the recent impulse alert count.
//!
//! Everything here is relative to an explicit `now` so results are
//! reproducible; local time is `now` shifted by the configured UTC offset.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::NudgeError;
use crate::types::{Category, ScoringInput, Transaction};

/// A payment the user is about to make, with the context needed to score it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: f64,
    pub category: Category,
    #[serde(default)]
    pub history: Vec<Transaction>,
    pub current_balance: f64,
}

impl PaymentRequest {
    /// Parse a request document.
    ///
    /// Category names are matched case-insensitively; an unrecognized name on
    /// the request or any history entry is `UnknownCategory`.
    pub fn from_json(json: &str) -> Result<Self, NudgeError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| NudgeError::ParseError(format!("Failed to parse payment request: {}", e)))?;

        let history = value.get("history").and_then(|h| h.as_array());
        let categories = std::iter::once(&value)
            .chain(history.into_iter().flatten())
            .filter_map(|entry| entry.get("category").and_then(|c| c.as_str()));
        for raw in categories {
            raw.parse::<Category>()?;
        }

        serde_json::from_value(value)
            .map_err(|e| NudgeError::ParseError(format!("Failed to parse payment request: {}", e)))
    }
}

/// Mean and population standard deviation of same-category amounts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalStats {
    pub mean: f64,
    pub std_dev: f64,
    pub sample_count: usize,
}

impl Default for HistoricalStats {
    fn default() -> Self {
        Self {
            mean: 0.0,
            std_dev: 1.0,
            sample_count: 0,
        }
    }
}

impl HistoricalStats {
    /// Compute statistics over the transactions in `category`.
    ///
    /// Without history the mean is 0; a zero spread is replaced by 1 so the
    /// deviation factor never divides by zero.
    pub fn for_category(history: &[Transaction], category: Category) -> Self {
        let amounts: Vec<f64> = history
            .iter()
            .filter(|tx| tx.category == category)
            .map(|tx| tx.amount)
            .collect();

        if amounts.is_empty() {
            return Self::default();
        }

        let n = amounts.len() as f64;
        let mean = amounts.iter().sum::<f64>() / n;
        let variance = amounts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        Self {
            mean,
            std_dev: if std_dev > 0.0 { std_dev } else { 1.0 },
            sample_count: amounts.len(),
        }
    }
}

/// Remaining balance spread over the days left in the budgeting period
///
/// Formula: `balance / max(1, period_days - day_of_period)`
pub fn sustainable_daily_allowance(current_balance: f64, day_of_period: u32, period_days: u32) -> f64 {
    let days_left = (period_days as i64 - day_of_period as i64).max(1);
    current_balance / days_left as f64
}

/// Count transactions after `now - lookback` whose amount exceeds
/// `multiplier x mean`.
///
/// All categories are counted against the candidate category's mean.
pub fn count_recent_impulse_alerts(
    history: &[Transaction],
    historical_mean: f64,
    now: DateTime<Utc>,
    lookback: Duration,
    multiplier: f64,
) -> u32 {
    let cutoff = now - lookback;
    let threshold = historical_mean * multiplier;
    history
        .iter()
        .filter(|tx| tx.timestamp > cutoff && tx.amount > threshold)
        .count() as u32
}

/// Assemble scoring inputs for a payment request at `now`
pub fn build_scoring_input(
    request: &PaymentRequest,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> ScoringInput {
    let stats = HistoricalStats::for_category(&request.history, request.category);

    let local_now = config.to_local(now);
    let is_low_control_hour = config.low_control_window.contains(local_now.hour());

    let sustainable_daily_allowance = sustainable_daily_allowance(
        request.current_balance,
        local_now.day(),
        config.period_days,
    );

    let recent_impulse_alerts = count_recent_impulse_alerts(
        &request.history,
        stats.mean,
        now,
        Duration::days(config.alert_lookback_days),
        config.impulse_multiplier,
    );

    ScoringInput {
        amount: request.amount,
        historical_mean: stats.mean,
        historical_std_dev: stats.std_dev,
        is_low_control_hour,
        sustainable_daily_allowance,
        recent_impulse_alerts,
    }
}
