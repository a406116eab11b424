//! Nudge Engine - Impulse risk scoring for payments
//!
//! Scores a pending payment against the user's own history and returns a
//! 0-100 Impulse Index with a per-factor explanation. Around the scorer sit
//! the behavioral tools that feed the nudging flow: account risk, harmful
//! pattern detection, interventions and a spending summary.
//!
//! ## Modules
//!
//! - **Scoring**: The four clamped factors and their aggregation into an index
//! - **Context**: Derive scoring inputs from a payment request and its history
//! - **Behavior**: Account risk, pattern detection and intervention planning
//! - **Summary**: Dashboard figures and projections

pub mod behavior;
pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod scoring;
pub mod summary;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{EngineConfig, LowControlWindow};
pub use context::{build_scoring_input, HistoricalStats, PaymentRequest};
pub use error::NudgeError;
pub use pipeline::{score_to_json, PaymentAssessment, RiskAnalyzer};
pub use scoring::analyze_transaction;
pub use summary::{spending_summary, SpendingSummary};
pub use types::{
    Category, ExplanationBreakdown, FactorExplanation, HarmfulPattern, Intervention, RiskLevel,
    ScoringInput, ScoringResult, Severity, Transaction, UserProfile,
};

// Behavioral exports
pub use behavior::{account_risk, detect_patterns, InterventionPlanner, TransactionReview};

/// Engine version reported with every assessment
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported with every assessment
pub const PRODUCER_NAME: &str = "nudge-engine";
