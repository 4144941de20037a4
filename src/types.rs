//! Shared types for the companion-guard detection pipeline.

use chrono::{DateTime, Utc};
use std::time::Duration;

// ── Messages ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self { role: Role::User, content: content.into(), timestamp }
    }

    pub fn assistant(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self { role: Role::Assistant, content: content.into(), timestamp }
    }
}

// ── Detection context ───────────────────────────────────────────────────────

/// Caller-supplied session context. Absent fields disable only the
/// multiplier that depends on them; the rest of the pipeline runs normally.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct DetectionContext {
    /// Hour in the user's local time, 0–23.
    pub hour_of_day: Option<u8>,
    /// Cumulative session count for this user.
    pub session_count: u32,
    pub user_age: Option<u8>,
    /// Alert count over the retention window, from the temporal tracker.
    pub prior_alert_count: u32,
}

// ── Risk categories ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RiskCategory {
    Crisis,
    Grooming,
    Violence,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 3] =
        [RiskCategory::Crisis, RiskCategory::Grooming, RiskCategory::Violence];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Crisis => "crisis",
            RiskCategory::Grooming => "grooming",
            RiskCategory::Violence => "violence",
        }
    }
}

/// Per-category scoring outcome, before context multipliers.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CategoryScore {
    pub category: RiskCategory,
    pub raw_confidence: f64,
    pub lexical_hit: bool,
    pub matched_patterns: Vec<String>,
}

// ── Tiers and actions ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum RiskTier {
    Baseline,
    Elevated,
    High,
    Critical,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Baseline => "BASELINE",
            RiskTier::Elevated => "ELEVATED",
            RiskTier::High => "HIGH",
            RiskTier::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RecommendedAction {
    Monitor,
    Review,
    Escalate,
    ImmediateIntervention,
}

/// Which tier-aligned message template the presentation layer should key
/// off of. Template content itself lives outside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PromptCategory {
    CrisisResourcesProminent,
    SafetyCheckWithResources,
    WellnessCheck,
    ContinueNormal,
}

// ── Boundary violations ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ViolationKind {
    DelusionReinforcement,
    RoleConfusion,
    DualRelationship,
    MedicalAdvice,
    IsolationCultivation,
    SycophanticPattern,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::DelusionReinforcement => "delusion_reinforcement",
            ViolationKind::RoleConfusion => "role_confusion",
            ViolationKind::DualRelationship => "dual_relationship",
            ViolationKind::MedicalAdvice => "medical_advice",
            ViolationKind::IsolationCultivation => "isolation_cultivation",
            ViolationKind::SycophanticPattern => "sycophantic_pattern",
        }
    }
}

/// A rule-matched boundary violation. Violations are flags, not scores:
/// there is no severity ranking among them.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BoundaryViolation {
    pub kind: ViolationKind,
    /// The text span that triggered the rule.
    pub evidence: String,
}

// ── Temporal tracking ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Trajectory {
    Escalating,
    Stable,
    DeEscalating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AlertPattern {
    IsolatedEvent,
    RepeatAlerts72h,
    MultipleAlerts14d,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TemporalSummary {
    pub alerts_72h: u32,
    pub alerts_14d: u32,
    pub pattern: AlertPattern,
    pub trajectory: Trajectory,
}

// ── Context multipliers ─────────────────────────────────────────────────────

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AppliedMultiplier {
    pub name: String,
    pub factor: f64,
}

// ── Final result ────────────────────────────────────────────────────────────

/// Immutable outcome of one detection call. Downstream systems persist it;
/// the engine never mutates it after creation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DetectionResult {
    pub risk_score: u8,
    pub risk_tier: RiskTier,
    pub response_deadline_hours: u32,
    pub crisis_detected: bool,
    pub grooming_detected: bool,
    pub violence_detected: bool,
    pub recommended_action: RecommendedAction,
    pub prompt_category: PromptCategory,
    pub explanation: String,
    pub category_scores: Vec<CategoryScore>,
    pub applied_multipliers: Vec<AppliedMultiplier>,
    pub boundary_violations: Vec<BoundaryViolation>,
    pub temporal: Option<TemporalSummary>,
}

impl DetectionResult {
    pub fn response_deadline(&self) -> Duration {
        Duration::from_secs(self.response_deadline_hours as u64 * 3600)
    }
}
