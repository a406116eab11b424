//! Engine configuration
//!
//! All tunables used while assembling scoring inputs and analyzing behavior.
//! The defaults reproduce the thresholds the payment app ships with; a JSON
//! file can override any subset of them.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NudgeError;

/// Default budgeting period length in days
pub const DEFAULT_PERIOD_DAYS: u32 = 30;

/// Default lookback for counting recent impulse alerts
pub const DEFAULT_ALERT_LOOKBACK_DAYS: i64 = 7;

/// An amount above `multiplier x mean` counts as an impulse alert
pub const DEFAULT_IMPULSE_MULTIPLIER: f64 = 1.5;

/// Window of history considered for the account risk score
pub const DEFAULT_RISK_WINDOW_DAYS: i64 = 30;

/// Account risk above which non-gambling interventions may fire
pub const DEFAULT_INTERVENTION_SCORE_THRESHOLD: u32 = 40;

/// Probability draw that must be exceeded for a gated intervention to fire
pub const DEFAULT_INTERVENTION_SKIP_THRESHOLD: f64 = 0.7;

/// Late-night window of reduced self-control, in local hours.
///
/// `start_hour` is inclusive and `end_hour` exclusive. A window with
/// `start_hour > end_hour` wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowControlWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for LowControlWindow {
    fn default() -> Self {
        Self {
            start_hour: 23,
            end_hour: 4,
        }
    }
}

impl LowControlWindow {
    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// Configuration shared by the analyzer, pattern detection and summaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub low_control_window: LowControlWindow,
    /// Offset of the user's local time from UTC
    pub utc_offset_minutes: i32,
    pub period_days: u32,
    pub alert_lookback_days: i64,
    pub impulse_multiplier: f64,
    pub risk_window_days: i64,
    pub intervention_score_threshold: u32,
    pub intervention_skip_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            low_control_window: LowControlWindow::default(),
            utc_offset_minutes: 0,
            period_days: DEFAULT_PERIOD_DAYS,
            alert_lookback_days: DEFAULT_ALERT_LOOKBACK_DAYS,
            impulse_multiplier: DEFAULT_IMPULSE_MULTIPLIER,
            risk_window_days: DEFAULT_RISK_WINDOW_DAYS,
            intervention_score_threshold: DEFAULT_INTERVENTION_SCORE_THRESHOLD,
            intervention_skip_threshold: DEFAULT_INTERVENTION_SKIP_THRESHOLD,
        }
    }
}

impl EngineConfig {
    /// Load configuration from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, NudgeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, NudgeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every field is within its usable range
    pub fn validate(&self) -> Result<(), NudgeError> {
        let window = &self.low_control_window;
        if window.start_hour > 23 || window.end_hour > 24 {
            return Err(NudgeError::InvalidConfig(format!(
                "low_control_window hours out of range: {}..{}",
                window.start_hour, window.end_hour
            )));
        }
        if self.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(NudgeError::InvalidConfig(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            )));
        }
        if self.period_days == 0 {
            return Err(NudgeError::InvalidConfig(
                "period_days must be at least 1".to_string(),
            ));
        }
        if self.alert_lookback_days <= 0 || self.risk_window_days <= 0 {
            return Err(NudgeError::InvalidConfig(
                "lookback windows must be positive".to_string(),
            ));
        }
        if !self.impulse_multiplier.is_finite() || self.impulse_multiplier < 0.0 {
            return Err(NudgeError::InvalidConfig(format!(
                "impulse_multiplier must be a non-negative number, got {}",
                self.impulse_multiplier
            )));
        }
        if !(0.0..=1.0).contains(&self.intervention_skip_threshold) {
            return Err(NudgeError::InvalidConfig(format!(
                "intervention_skip_threshold must be within 0..=1, got {}",
                self.intervention_skip_threshold
            )));
        }
        Ok(())
    }

    /// Fixed offset for the user's local time, falling back to UTC
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or(Utc.fix())
    }

    /// Convert a UTC instant to the user's local time
    pub fn to_local(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset())
    }
}
