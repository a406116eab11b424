//! Intervention planning
//!
//! Turns detected patterns into nudges. Which gated patterns fire is decided by
//! an injected random source so a seeded planner replays exactly; the message
//! text comes from a pluggable [`InterventionWriter`].

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Builder;

use crate::behavior::patterns::{detect_patterns, most_recent};
use crate::behavior::risk::{account_risk, AccountRisk};
use crate::config::EngineConfig;
use crate::summary::SpendingSummary;
use crate::types::{Category, HarmfulPattern, Intervention, Severity, Transaction, UserProfile};

/// Account risk above which severity escalates to medium
const MEDIUM_SEVERITY_SCORE: u32 = 60;

/// Produces the text of a nudge.
///
/// Implementations backed by a text-generation service should fall back to
/// [`FallbackWriter`] when the service is unavailable.
pub trait InterventionWriter {
    /// Message for an intervention triggered by `pattern` on `tx`
    fn intervention(
        &self,
        pattern: HarmfulPattern,
        tx: &Transaction,
        profile: &UserProfile,
        rng: &mut dyn RngCore,
    ) -> String;

    /// Reflection shown before paying, based on earlier purchases in the category
    fn pre_payment_reflection(&self, category: Category, previous: &[Transaction]) -> String;

    /// Suggestion shown after paying, tied to the user's savings goal
    fn post_payment_suggestion(&self, category: Category, amount: f64, goal: &str) -> String;

    /// Short reading of the user's overall spending behavior
    fn behavior_insight(&self, summary: &SpendingSummary) -> String;
}

/// Fixed-text writer used when no text-generation backend is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackWriter;

impl InterventionWriter for FallbackWriter {
    fn intervention(
        &self,
        pattern: HarmfulPattern,
        tx: &Transaction,
        _profile: &UserProfile,
        rng: &mut dyn RngCore,
    ) -> String {
        let category = tx.category.as_str();
        let merchant = tx.merchant.as_str();
        let options = match pattern {
            HarmfulPattern::BingeSpending => [
                format!("That's your 3rd {category} purchase recently! Taking a small pause can help you stay on track."),
                format!("You're spending fast on {category}. Consider waiting 24 hours before your next purchase."),
            ],
            HarmfulPattern::LateNightImpulse => [
                format!("Late night purchases at {merchant} are often impulsive. Maybe sleep on it next time?"),
                "Shopping after 11pm? Your future self might appreciate skipping this one.".to_string(),
            ],
            HarmfulPattern::BudgetBreach => [
                "You've spent over 80% of this month's income. Slowing down now keeps the rest of the month comfortable.".to_string(),
                format!("This {category} purchase pushes you past your monthly budget. Could the next one wait?"),
            ],
            HarmfulPattern::SavingDerail => [
                "This month's spending is eating into your savings goal. A few skipped extras can close the gap.".to_string(),
                format!("Your savings goal is slipping after this {category} purchase. Small cutbacks add up quickly."),
            ],
            HarmfulPattern::GamblingAlert => [
                format!("Gambling transactions like this one at {merchant} carry high risk. Please be careful."),
                "We noticed a gambling transaction. Remember, the house always wins in the long run.".to_string(),
            ],
        };
        // A single bit keeps the pick total for any random source
        let [first, second] = options;
        if rng.gen::<bool>() {
            second
        } else {
            first
        }
    }

    fn pre_payment_reflection(&self, category: Category, previous: &[Transaction]) -> String {
        format!(
            "You've made {} {} purchases recently. Was each one worth it? 🤔",
            previous.len(),
            category
        )
    }

    fn post_payment_suggestion(&self, _category: Category, _amount: f64, goal: &str) -> String {
        format!("Enjoy your purchase! Remember your goal: {goal}.")
    }

    fn behavior_insight(&self, _summary: &SpendingSummary) -> String {
        "Your spending patterns show a mix of planned and spontaneous decisions. \
         Keeping an eye on impulse buys could help improve your financial health."
            .to_string()
    }
}

/// Everything learned from reviewing a newly recorded transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReview {
    pub account_risk: AccountRisk,
    pub patterns: Vec<HarmfulPattern>,
    pub interventions: Vec<Intervention>,
}

/// Severity of an intervention for `pattern` at the given account risk
pub fn severity_for(pattern: HarmfulPattern, risk_score: u32) -> Severity {
    match pattern {
        HarmfulPattern::GamblingAlert | HarmfulPattern::BudgetBreach => Severity::High,
        _ if risk_score > MEDIUM_SEVERITY_SCORE => Severity::Medium,
        _ => Severity::Low,
    }
}

/// Decides which patterns become interventions and writes them
pub struct InterventionPlanner<R: Rng, W: InterventionWriter = FallbackWriter> {
    rng: R,
    writer: W,
    score_threshold: u32,
    skip_threshold: f64,
}

impl InterventionPlanner<StdRng, FallbackWriter> {
    /// Planner with a deterministic random source
    pub fn seeded(seed: u64, config: &EngineConfig) -> Self {
        Self::new(StdRng::seed_from_u64(seed), config)
    }

    /// Planner seeded from operating system entropy
    pub fn from_entropy(config: &EngineConfig) -> Self {
        Self::new(StdRng::from_entropy(), config)
    }
}

impl<R: Rng> InterventionPlanner<R, FallbackWriter> {
    pub fn new(rng: R, config: &EngineConfig) -> Self {
        Self::with_writer(rng, FallbackWriter, config)
    }
}

impl<R: Rng, W: InterventionWriter> InterventionPlanner<R, W> {
    pub fn with_writer(rng: R, writer: W, config: &EngineConfig) -> Self {
        Self {
            rng,
            writer,
            score_threshold: config.intervention_score_threshold,
            skip_threshold: config.intervention_skip_threshold,
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Plan interventions for `tx` given its detected patterns.
    ///
    /// Gambling alerts always fire. Other patterns fire only when the account
    /// risk exceeds the score threshold and a uniform draw exceeds the skip
    /// threshold; the draw is skipped entirely at or below the score threshold.
    /// Necessity categories never receive an intervention.
    pub fn plan(
        &mut self,
        profile: &UserProfile,
        tx: &Transaction,
        risk_score: u32,
        patterns: &[HarmfulPattern],
        now: DateTime<Utc>,
    ) -> Vec<Intervention> {
        if tx.category.is_necessity() {
            debug!(category = %tx.category, "skipping interventions for necessity");
            return Vec::new();
        }

        let mut interventions = Vec::new();
        for &pattern in patterns {
            let gated = risk_score > self.score_threshold
                && self.rng.gen::<f64>() > self.skip_threshold;
            if !(gated || pattern == HarmfulPattern::GamblingAlert) {
                continue;
            }

            let message = self
                .writer
                .intervention(pattern, tx, profile, &mut self.rng);
            let severity = severity_for(pattern, risk_score);
            let id = Builder::from_random_bytes(self.rng.gen()).into_uuid();

            info!(
                user_id = %profile.user_id,
                %pattern,
                ?severity,
                "planned intervention"
            );

            interventions.push(Intervention {
                id,
                user_id: profile.user_id.clone(),
                pattern,
                severity,
                message,
                triggered_at: now,
                was_acknowledged: false,
            });
        }
        interventions
    }

    /// Review a newly recorded transaction.
    ///
    /// `history` must already contain `tx`. The profile's risk score and spend
    /// are refreshed before interventions are planned.
    pub fn review_transaction(
        &mut self,
        profile: &mut UserProfile,
        history: &[Transaction],
        tx: &Transaction,
        now: DateTime<Utc>,
        config: &EngineConfig,
    ) -> TransactionReview {
        let risk = account_risk(profile, history, now, config);
        risk.apply_to(profile);

        let patterns = detect_patterns(profile, history, config);
        let interventions = self.plan(profile, tx, risk.score, &patterns, now);

        TransactionReview {
            account_risk: risk,
            patterns,
            interventions,
        }
    }

    /// Insight text to show alongside a spending summary
    pub fn describe_behavior(&self, summary: &SpendingSummary) -> String {
        self.writer.behavior_insight(summary)
    }

    /// Pre-payment reflection using the user's latest purchases in `category`
    pub fn reflect_before_payment(
        &self,
        category: Category,
        history: &[Transaction],
        limit: usize,
    ) -> String {
        let previous: Vec<Transaction> = most_recent(history, usize::MAX)
            .into_iter()
            .filter(|tx| tx.category == category)
            .take(limit)
            .cloned()
            .collect();
        self.writer.pre_payment_reflection(category, &previous)
    }
}
