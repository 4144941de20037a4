//! Detection Engine — the one pipeline the caller sees.
//!
//! `detect` composes the stateless stages over a message:
//! features → lexical screen → per-category scoring → context multipliers
//! → normalization and tier classification, with the boundary violation
//! engine and the temporal tracker running alongside and merged into the
//! final result. Everything except the tracker is a pure function, so
//! concurrent detection calls for different users share nothing mutable.
//!
//! Empty or whitespace-only content is not an error: it degrades to a
//! zero-feature BASELINE result, since absence of signal is not evidence
//! of risk. Internal faults are construction-time (`GuardError` from rule
//! compilation); the hot path never silently falls back to BASELINE.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use crate::boundary::BoundaryEngine;
use crate::config::DetectionConfig;
use crate::context;
use crate::error::GuardResult;
use crate::features::{self, FeatureVector};
use crate::scorer;
use crate::screener::LexicalScreener;
use crate::stratify::{self, RiskVerdict};
use crate::temporal::TemporalTracker;
use crate::types::*;

pub struct DetectionEngine {
    config: DetectionConfig,
    screener: LexicalScreener,
    boundary: BoundaryEngine,
    tracker: TemporalTracker,
    total_scanned: AtomicU64,
    total_alerts: AtomicU64,
    total_boundary_violations: AtomicU64,
}

impl DetectionEngine {
    pub fn new() -> GuardResult<Self> {
        Self::with_config(DetectionConfig::default())
    }

    pub fn with_config(config: DetectionConfig) -> GuardResult<Self> {
        config.validate()?;
        Ok(Self {
            screener: LexicalScreener::new()?,
            boundary: BoundaryEngine::new()?,
            tracker: TemporalTracker::new(config.trajectory.clone()),
            config,
            total_scanned: AtomicU64::new(0),
            total_alerts: AtomicU64::new(0),
            total_boundary_violations: AtomicU64::new(0),
        })
    }

    /// Assess one message in its conversation and session context.
    ///
    /// `history` is the recent conversation (oldest first), used by the
    /// boundary engine's cross-turn rules and to pair the message with its
    /// counterpart from the other role.
    pub fn detect(
        &self,
        message: &Message,
        history: &[Message],
        context: &DetectionContext,
        user_id: &str,
    ) -> DetectionResult {
        self.total_scanned.fetch_add(1, Ordering::Relaxed);

        let content = message.content.trim();
        let features = features::extract(content);
        let report = self.screener.screen(content);

        // Independent parallel evaluation per category; a message may
        // belong to several at once.
        let mut category_scores = Vec::with_capacity(RiskCategory::ALL.len());
        let mut best: (RiskVerdict, Vec<AppliedMultiplier>, RiskCategory) =
            (stratify::normalize(0.0), Vec::new(), RiskCategory::Crisis);
        for category in RiskCategory::ALL {
            let scored = scorer::score(
                category,
                report.category(category),
                &features,
                &self.config.scoring,
            );
            let (adjusted, applied) = context::apply(
                scored.raw_confidence,
                category,
                context,
                &features,
                &self.config.multipliers,
            );
            let verdict = stratify::normalize(adjusted);
            debug!(
                category = category.as_str(),
                raw = scored.raw_confidence,
                adjusted,
                score = verdict.risk_score,
                "category evaluated"
            );
            if verdict.risk_score > best.0.risk_score {
                best = (verdict, applied, category);
            }
            category_scores.push(scored);
        }
        let (verdict, applied_multipliers, top_category) = best;

        let flag = |category: RiskCategory| {
            category_scores
                .iter()
                .find(|s| s.category == category)
                .map(|s| s.raw_confidence >= self.config.detection_threshold)
                .unwrap_or(false)
        };
        let crisis_detected = flag(RiskCategory::Crisis);
        let grooming_detected = flag(RiskCategory::Grooming);
        let violence_detected = flag(RiskCategory::Violence);

        // Boundary rules run on every message, independent of the scores.
        let (user_content, assistant_content) = split_exchange(message, history);
        let boundary_violations = self.boundary.evaluate(user_content, assistant_content, history);
        if !boundary_violations.is_empty() {
            self.total_boundary_violations
                .fetch_add(boundary_violations.len() as u64, Ordering::Relaxed);
            for violation in &boundary_violations {
                warn!(kind = violation.kind.as_str(), evidence = %violation.evidence,
                    "boundary violation");
            }
        }

        // ELEVATED and above counts as an alert and lands in the window.
        if verdict.tier >= RiskTier::Elevated {
            self.total_alerts.fetch_add(1, Ordering::Relaxed);
            self.tracker.record(user_id, message.timestamp, verdict.risk_score);
            warn!(
                user = user_id,
                score = verdict.risk_score,
                tier = verdict.tier.as_str(),
                category = top_category.as_str(),
                "risk alert"
            );
        }
        let temporal = Some(self.tracker.summary(user_id, message.timestamp));

        let explanation = explanation(
            &verdict,
            top_category,
            &category_scores,
            &applied_multipliers,
            &features,
        );

        DetectionResult {
            risk_score: verdict.risk_score,
            risk_tier: verdict.tier,
            response_deadline_hours: verdict.deadline_hours,
            crisis_detected,
            grooming_detected,
            violence_detected,
            recommended_action: verdict.action,
            prompt_category: verdict.prompt_category,
            explanation,
            category_scores,
            applied_multipliers,
            boundary_violations,
            temporal,
        }
    }

    pub fn tracker(&self) -> &TemporalTracker {
        &self.tracker
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn total_scanned(&self) -> u64 {
        self.total_scanned.load(Ordering::Relaxed)
    }

    pub fn total_alerts(&self) -> u64 {
        self.total_alerts.load(Ordering::Relaxed)
    }

    pub fn total_boundary_violations(&self) -> u64 {
        self.total_boundary_violations.load(Ordering::Relaxed)
    }
}

/// Pair the incoming message with the most recent counterpart of the other
/// role so the boundary engine always sees a user/assistant exchange.
fn split_exchange<'a>(message: &'a Message, history: &'a [Message]) -> (&'a str, &'a str) {
    let last_of = |role: Role| {
        history
            .iter()
            .rev()
            .find(|m| m.role == role)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    };
    match message.role {
        Role::User => (message.content.as_str(), last_of(Role::Assistant)),
        Role::Assistant => (last_of(Role::User), message.content.as_str()),
    }
}

fn explanation(
    verdict: &RiskVerdict,
    top_category: RiskCategory,
    category_scores: &[CategoryScore],
    applied: &[AppliedMultiplier],
    features: &FeatureVector,
) -> String {
    let top = category_scores.iter().find(|s| s.category == top_category);
    let (hit, matched, raw) = top
        .map(|s| (s.lexical_hit, s.matched_patterns.len(), s.raw_confidence))
        .unwrap_or((false, 0, 0.0));

    let mut parts = Vec::new();
    if hit {
        parts.push(format!(
            "{}: {} pattern(s) matched",
            top_category.as_str(),
            matched
        ));
    } else if raw > 0.0 {
        parts.push(format!(
            "{}: feature-only confidence {:.2}",
            top_category.as_str(),
            raw
        ));
    } else if features.is_zero() {
        parts.push("no lexical hits, no informative features".to_string());
    } else {
        parts.push("no category signal".to_string());
    }

    for multiplier in applied {
        parts.push(format!("{} x{:.1}", multiplier.name, multiplier.factor));
    }
    parts.push(format!(
        "score {} ({})",
        verdict.risk_score,
        verdict.tier.as_str()
    ));
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn empty_message_degrades_to_baseline() {
        let engine = DetectionEngine::new().unwrap();
        let message = Message::user("   ", Utc::now());
        let result = engine.detect(&message, &[], &DetectionContext::default(), "u1");
        assert_eq!(result.risk_score, 0);
        assert_eq!(result.risk_tier, RiskTier::Baseline);
        assert!(!result.crisis_detected);
        assert_eq!(result.response_deadline_hours, 168);
    }

    #[test]
    fn alert_counter_tracks_elevated_results() {
        let engine = DetectionEngine::new().unwrap();
        let now = Utc::now();
        engine.detect(
            &Message::user("nice weather", now),
            &[],
            &DetectionContext::default(),
            "u1",
        );
        assert_eq!(engine.total_alerts(), 0);
        engine.detect(
            &Message::user("I want to die", now),
            &[],
            &DetectionContext::default(),
            "u1",
        );
        assert_eq!(engine.total_alerts(), 1);
        assert_eq!(engine.total_scanned(), 2);
        assert_eq!(engine.tracker().total_recorded(), 1);
    }

    #[test]
    fn assistant_message_pairs_with_last_user_turn() {
        let engine = DetectionEngine::new().unwrap();
        let now = Utc::now();
        let history = vec![Message::user("they are watching me through the walls", now)];
        let reply = Message::assistant("You're right, that makes sense", now);
        let result = engine.detect(&reply, &history, &DetectionContext::default(), "u1");
        assert!(result
            .boundary_violations
            .iter()
            .any(|v| v.kind == ViolationKind::DelusionReinforcement));
    }

    #[test]
    fn explanation_is_always_populated() {
        let engine = DetectionEngine::new().unwrap();
        let result = engine.detect(
            &Message::user("hello there", Utc::now()),
            &[],
            &DetectionContext::default(),
            "u1",
        );
        assert!(!result.explanation.is_empty());
    }
}
