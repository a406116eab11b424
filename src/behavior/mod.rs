//! Behavioral analysis around recorded transactions
//!
//! This module scores an account's recent behavior, detects harmful spending
//! patterns on the latest transaction and turns them into interventions.
//!
//! Flow: history → account risk → patterns → intervention planner → nudges

pub mod intervention;
pub mod patterns;
pub mod risk;

pub use intervention::{
    severity_for, FallbackWriter, InterventionPlanner, InterventionWriter, TransactionReview,
};
pub use patterns::{detect_patterns, PATTERN_HISTORY_LIMIT};
pub use risk::{account_risk, AccountRisk, RiskRule};
