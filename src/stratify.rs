//! Risk Normalizer & Tier Classifier.
//!
//! Maps adjusted confidence to an integer 0–100 score and one of four
//! tiers, each carrying a response deadline, recommended action, and the
//! prompt-template category the presentation layer keys off of. The tier
//! table is ordered data, not nested branching, so thresholds stay tunable
//! independently of control flow.

use crate::types::{PromptCategory, RecommendedAction, RiskTier};

#[derive(Debug, Clone, Copy)]
pub struct TierRow {
    /// Inclusive lower bound. Ranges are closed-open against the next row
    /// up; the top row is closed at 100.
    pub min_score: u8,
    pub tier: RiskTier,
    pub deadline_hours: u32,
    pub action: RecommendedAction,
    pub prompt_category: PromptCategory,
}

/// Ordered highest tier first; the first row whose bound the score reaches
/// wins.
pub static TIER_TABLE: [TierRow; 4] = [
    TierRow {
        min_score: 90,
        tier: RiskTier::Critical,
        deadline_hours: 1,
        action: RecommendedAction::ImmediateIntervention,
        prompt_category: PromptCategory::CrisisResourcesProminent,
    },
    TierRow {
        min_score: 70,
        tier: RiskTier::High,
        deadline_hours: 4,
        action: RecommendedAction::Escalate,
        prompt_category: PromptCategory::SafetyCheckWithResources,
    },
    TierRow {
        min_score: 50,
        tier: RiskTier::Elevated,
        deadline_hours: 24,
        action: RecommendedAction::Review,
        prompt_category: PromptCategory::WellnessCheck,
    },
    TierRow {
        min_score: 0,
        tier: RiskTier::Baseline,
        deadline_hours: 168,
        action: RecommendedAction::Monitor,
        prompt_category: PromptCategory::ContinueNormal,
    },
];

#[derive(Debug, Clone, Copy)]
pub struct RiskVerdict {
    pub risk_score: u8,
    pub tier: RiskTier,
    pub deadline_hours: u32,
    pub action: RecommendedAction,
    pub prompt_category: PromptCategory,
}

/// Normalize adjusted confidence to the 0–100 scale and classify it.
pub fn normalize(adjusted_confidence: f64) -> RiskVerdict {
    let risk_score = (adjusted_confidence.clamp(0.0, 1.0) * 100.0).round() as u8;
    let row = tier_for(risk_score);
    RiskVerdict {
        risk_score,
        tier: row.tier,
        deadline_hours: row.deadline_hours,
        action: row.action,
        prompt_category: row.prompt_category,
    }
}

/// Tier lookup is total over 0–100: every score lands on exactly one row.
pub fn tier_for(risk_score: u8) -> &'static TierRow {
    TIER_TABLE
        .iter()
        .find(|row| risk_score >= row.min_score)
        .unwrap_or(&TIER_TABLE[3])
}
