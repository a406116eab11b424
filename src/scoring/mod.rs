//! Impulse scoring engine
//!
//! Converts a candidate transaction plus historical context into a composite
//! Impulse Index (0-100), a discrete risk level and a per-factor explanation.
//!
//! Factors (each clamped to its own ceiling):
//! - Behavioral deviation (0-30): z-score of the amount against category history
//! - Temporal vulnerability (0-20): late-night low-control window
//! - Financial pressure (0-25): share of the sustainable daily allowance
//! - Habit escalation (0-25): recent impulse alerts

pub mod aggregate;
pub mod factors;

pub use aggregate::{analyze_transaction, projected_monthly_impact};
pub use factors::{
    behavioral_deviation, financial_pressure, habit_escalation, temporal_vulnerability,
};
