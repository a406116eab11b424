//! Core domain types for the nudge engine
//!
//! This module defines the transaction and profile records handed to the engine
//! by the surrounding application, and the scoring input/result contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::NudgeError;

/// Spending category of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum Category {
    Food,
    Entertainment,
    Shopping,
    Bills,
    Transport,
    Gambling,
    Luxury,
}

impl Category {
    /// All categories in declaration order
    pub const ALL: [Category; 7] = [
        Category::Food,
        Category::Entertainment,
        Category::Shopping,
        Category::Bills,
        Category::Transport,
        Category::Gambling,
        Category::Luxury,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "FOOD",
            Self::Entertainment => "ENTERTAINMENT",
            Self::Shopping => "SHOPPING",
            Self::Bills => "BILLS",
            Self::Transport => "TRANSPORT",
            Self::Gambling => "GAMBLING",
            Self::Luxury => "LUXURY",
        }
    }

    /// Discretionary categories where spending tends to be impulse-driven
    pub fn is_impulsive(&self) -> bool {
        matches!(
            self,
            Self::Entertainment | Self::Shopping | Self::Gambling | Self::Luxury
        )
    }

    /// Necessities never receive an intervention
    pub fn is_necessity(&self) -> bool {
        matches!(self, Self::Bills)
    }
}

impl FromStr for Category {
    type Err = NudgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FOOD" => Ok(Self::Food),
            "ENTERTAINMENT" => Ok(Self::Entertainment),
            "SHOPPING" => Ok(Self::Shopping),
            "BILLS" => Ok(Self::Bills),
            "TRANSPORT" => Ok(Self::Transport),
            "GAMBLING" => Ok(Self::Gambling),
            "LUXURY" => Ok(Self::Luxury),
            _ => Err(NudgeError::UnknownCategory(s.to_string())),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = NudgeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed payment from the user's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub user_id: String,
    pub amount: f64,
    pub category: Category,
    #[serde(default)]
    pub merchant: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_impulsive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
}

/// Financial profile of the user making a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub monthly_income: f64,
    #[serde(default)]
    pub savings_goal: f64,
    /// Last account risk score (0-100)
    #[serde(default)]
    pub risk_score: u32,
    #[serde(default)]
    pub total_spent: f64,
}

/// Inputs to the impulse scorer, all supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringInput {
    /// Candidate transaction value
    pub amount: f64,
    /// Mean amount of prior transactions in the same category (0 if none)
    pub historical_mean: f64,
    /// Population std-dev of same-category amounts (1 if undefined)
    pub historical_std_dev: f64,
    /// Whether the local hour falls in the low-control window
    pub is_low_control_hour: bool,
    /// Remaining balance spread over remaining days; may be <= 0
    pub sustainable_daily_allowance: f64,
    /// Flagged impulsive transactions in the trailing lookback window
    pub recent_impulse_alerts: u32,
}

impl Default for ScoringInput {
    fn default() -> Self {
        Self {
            amount: 0.0,
            historical_mean: 0.0,
            historical_std_dev: 1.0,
            is_low_control_hour: false,
            sustainable_daily_allowance: 100.0,
            recent_impulse_alerts: 0,
        }
    }
}

/// Discrete risk classification of an impulse index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    /// Classify an impulse index using half-open thresholds at 20, 45 and 70
    pub fn from_index(impulse_index: f64) -> Self {
        if impulse_index < 20.0 {
            Self::Low
        } else if impulse_index < 45.0 {
            Self::Moderate
        } else if impulse_index < 70.0 {
            Self::High
        } else {
            Self::Critical
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::Critical => "Critical",
        };
        f.write_str(s)
    }
}

/// Score of a single factor together with its ceiling and a readable reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorExplanation {
    pub score: f64,
    pub max: f64,
    pub reason: String,
}

/// Per-factor breakdown of an impulse index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationBreakdown {
    pub behavioral_deviation: FactorExplanation,
    pub temporal_vulnerability: FactorExplanation,
    pub financial_pressure: FactorExplanation,
    pub habit_escalation: FactorExplanation,
}

/// Output of the impulse scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringResult {
    /// Composite index (0-100), rounded to one decimal
    pub impulse_index: f64,
    pub risk_level: RiskLevel,
    pub explanation_breakdown: ExplanationBreakdown,
    /// Projected monthly cost if this behavior repeats, rounded to cents
    pub projected_monthly_impact: f64,
}

/// Harmful spending patterns detected on the latest transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmfulPattern {
    BingeSpending,
    LateNightImpulse,
    BudgetBreach,
    SavingDerail,
    GamblingAlert,
}

impl HarmfulPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BingeSpending => "BINGE_SPENDING",
            Self::LateNightImpulse => "LATE_NIGHT_IMPULSE",
            Self::BudgetBreach => "BUDGET_BREACH",
            Self::SavingDerail => "SAVING_DERAIL",
            Self::GamblingAlert => "GAMBLING_ALERT",
        }
    }
}

impl fmt::Display for HarmfulPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of an intervention
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A nudge surfaced to the user after a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intervention {
    pub id: Uuid,
    pub user_id: String,
    pub pattern: HarmfulPattern,
    pub severity: Severity,
    pub message: String,
    pub triggered_at: DateTime<Utc>,
    pub was_acknowledged: bool,
}
