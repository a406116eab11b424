//! Scoring pipeline orchestration
//!
//! This module provides the public API for scoring payments. A `RiskAnalyzer`
//! is constructed once with its configuration and handed to whatever serves
//! requests; it holds no mutable state and can be shared across threads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::context::{build_scoring_input, PaymentRequest};
use crate::error::NudgeError;
use crate::scoring::analyze_transaction;
use crate::types::{ScoringInput, ScoringResult};
use crate::{ENGINE_VERSION, PRODUCER_NAME};

/// Score a `ScoringInput` JSON document and return `ScoringResult` JSON
/// (stateless, one-shot).
///
/// # Example
/// ```
/// let result = nudge_engine::score_to_json(r#"{"amount": 5000, "historicalMean": 1000,
///     "historicalStdDev": 500, "isLowControlHour": true,
///     "sustainableDailyAllowance": 2000, "recentImpulseAlerts": 2}"#).unwrap();
/// assert!(result.contains("\"Critical\""));
/// ```
pub fn score_to_json(input_json: &str) -> Result<String, NudgeError> {
    let input: ScoringInput = serde_json::from_str(input_json)
        .map_err(|e| NudgeError::ParseError(format!("Failed to parse scoring input: {}", e)))?;
    let result = analyze_transaction(&input);
    serde_json::to_string(&result).map_err(NudgeError::JsonError)
}

/// Provenance attached to an assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Scored payment together with the inputs derived for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAssessment {
    pub input: ScoringInput,
    pub result: ScoringResult,
    pub assessed_at: DateTime<Utc>,
    pub producer: AssessmentProducer,
}

/// Configured scorer for payment requests
#[derive(Debug, Clone)]
pub struct RiskAnalyzer {
    config: EngineConfig,
    instance_id: String,
}

impl Default for RiskAnalyzer {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl RiskAnalyzer {
    /// Create an analyzer with a unique instance ID
    pub fn new(config: EngineConfig) -> Self {
        Self::with_instance_id(config, Uuid::new_v4().to_string())
    }

    /// Create an analyzer with a specific instance ID
    pub fn with_instance_id(config: EngineConfig, instance_id: String) -> Self {
        Self {
            config,
            instance_id,
        }
    }

    /// Create an analyzer from a JSON configuration document
    pub fn from_config_json(json: &str) -> Result<Self, NudgeError> {
        Ok(Self::new(EngineConfig::from_json(json)?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Score pre-assembled inputs
    pub fn score(&self, input: &ScoringInput) -> ScoringResult {
        analyze_transaction(input)
    }

    /// Validate a payment request, derive its scoring inputs at `now` and score it
    pub fn assess_payment(
        &self,
        request: &PaymentRequest,
        now: DateTime<Utc>,
    ) -> Result<PaymentAssessment, NudgeError> {
        validate_amount(request.amount)?;
        if !request.current_balance.is_finite() {
            return Err(NudgeError::ParseError(format!(
                "current balance must be finite, got {}",
                request.current_balance
            )));
        }

        let input = build_scoring_input(request, now, &self.config);
        let result = analyze_transaction(&input);

        debug!(
            category = %request.category,
            history = request.history.len(),
            impulse_index = result.impulse_index,
            "assessed payment"
        );

        Ok(PaymentAssessment {
            input,
            result,
            assessed_at: now,
            producer: AssessmentProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
        })
    }

    /// Score a `ScoringInput` JSON document
    pub fn score_json(&self, input_json: &str) -> Result<String, NudgeError> {
        score_to_json(input_json)
    }

    /// Assess a `PaymentRequest` JSON document and return `PaymentAssessment` JSON
    pub fn assess_json(&self, request_json: &str, now: DateTime<Utc>) -> Result<String, NudgeError> {
        let request = PaymentRequest::from_json(request_json)?;
        let assessment = self.assess_payment(&request, now)?;
        serde_json::to_string(&assessment).map_err(NudgeError::JsonError)
    }
}

/// Amounts must be finite and non-negative before they reach the scorer
fn validate_amount(amount: f64) -> Result<(), NudgeError> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        Err(NudgeError::InvalidAmount(amount))
    }
}
