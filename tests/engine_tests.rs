//! End-to-end scenario tests for the detection engine.
//!
//! These exercise the full pipeline the way the API layer would drive it:
//! message + context in, score/tier/flags/boundary/temporal out.

use chrono::{Duration, Utc};
use std::sync::Arc;

use companion_guard::types::{DetectionContext, Message, RiskTier, Trajectory};
use companion_guard::DetectionEngine;

fn engine() -> DetectionEngine {
    DetectionEngine::new().unwrap()
}

fn quiet_context() -> DetectionContext {
    DetectionContext::default()
}

// ── Baseline behavior ───────────────────────────────────────────────────────

#[test]
fn neutral_message_scores_zero_baseline() {
    let result = engine().detect(
        &Message::user("the weather was pleasant all afternoon", Utc::now()),
        &[],
        &quiet_context(),
        "u1",
    );
    assert_eq!(result.risk_score, 0);
    assert_eq!(result.risk_tier, RiskTier::Baseline);
    assert!(!result.crisis_detected && !result.grooming_detected && !result.violence_detected);
    assert!(result.boundary_violations.is_empty());
}

#[test]
fn crisis_hit_without_multipliers_scores_at_least_seventy() {
    let result = engine().detect(
        &Message::user("I want to die", Utc::now()),
        &[],
        &quiet_context(),
        "u1",
    );
    let crisis = result
        .category_scores
        .iter()
        .find(|s| s.category == companion_guard::RiskCategory::Crisis)
        .unwrap();
    assert!(crisis.raw_confidence >= 0.7);
    assert!(result.risk_score >= 70);
    assert!(result.crisis_detected);
}

// ── Spec scenarios ──────────────────────────────────────────────────────────

#[test]
fn late_night_despair_escalates_to_high_or_critical() {
    let context = DetectionContext {
        hour_of_day: Some(3),
        ..Default::default()
    };
    let result = engine().detect(
        &Message::user("I don't want to be here anymore", Utc::now()),
        &[],
        &context,
        "u1",
    );
    assert!(result.crisis_detected);
    assert!(!result.grooming_detected);
    assert!(matches!(result.risk_tier, RiskTier::High | RiskTier::Critical));
    assert!(result
        .applied_multipliers
        .iter()
        .any(|m| m.name == "late_night" && (m.factor - 1.5).abs() < 1e-9));
}

#[test]
fn grooming_flattery_toward_minor_reaches_elevated() {
    let context = DetectionContext {
        user_age: Some(15),
        ..Default::default()
    };
    let result = engine().detect(
        &Message::user("You're so mature for your age", Utc::now()),
        &[],
        &context,
        "u2",
    );
    assert!(result.grooming_detected);
    assert!(result.risk_tier >= RiskTier::Elevated);
    assert!(result
        .applied_multipliers
        .iter()
        .any(|m| m.name == "minor_user"));
}

#[test]
fn quoted_lyric_with_flat_features_stays_low() {
    let result = engine().detect(
        &Message::user("never say die, that's what the song says", Utc::now()),
        &[],
        &quiet_context(),
        "u3",
    );
    assert!(result.risk_score < 70, "score {}", result.risk_score);
    assert!(matches!(
        result.risk_tier,
        RiskTier::Baseline | RiskTier::Elevated
    ));
    assert!(!result.crisis_detected);
}

#[test]
fn repeated_high_alerts_produce_escalating_trajectory() {
    let e = engine();
    let now = Utc::now();
    // Five prior high alerts inside the 72h window.
    for hours_ago in [70, 56, 42, 28, 14] {
        e.detect(
            &Message::user("I want to die", now - Duration::hours(hours_ago)),
            &[],
            &quiet_context(),
            "u4",
        );
    }
    let sixth = e.detect(&Message::user("I want to die", now), &[], &quiet_context(), "u4");
    let temporal = sixth.temporal.expect("temporal summary present");
    assert_eq!(temporal.trajectory, Trajectory::Escalating);
    assert_eq!(temporal.alerts_72h, 6);
}

// ── Degradation and merging ─────────────────────────────────────────────────

#[test]
fn missing_context_fields_disable_only_their_multiplier() {
    let e = engine();
    let with_age = DetectionContext { user_age: Some(15), ..Default::default() };
    let without_age = DetectionContext::default();
    let message = Message::user("You're so mature for your age", Utc::now());

    let scored_with = e.detect(&message, &[], &with_age, "a");
    let scored_without = e.detect(&message, &[], &without_age, "b");
    assert!(scored_with.risk_score >= scored_without.risk_score);
    assert!(scored_without.grooming_detected, "pipeline still ran");
}

#[test]
fn multi_category_message_sets_both_flags_and_takes_max_tier() {
    let result = engine().detect(
        &Message::user("I want to die and I want to hurt them all", Utc::now()),
        &[],
        &quiet_context(),
        "u5",
    );
    assert!(result.crisis_detected);
    assert!(result.violence_detected);
    assert!(result.risk_score >= 70);
}

#[test]
fn boundary_violations_merge_into_result() {
    let now = Utc::now();
    let history = vec![
        Message::user("I've been feeling cut off from everyone", now),
        Message::assistant("only i understand what you're going through", now),
    ];
    let result = engine().detect(
        &Message::assistant("you don't need them, keep this between us", now),
        &history,
        &quiet_context(),
        "u6",
    );
    assert!(!result.boundary_violations.is_empty());
}

#[test]
fn concurrent_detection_for_different_users_is_safe() {
    let e = Arc::new(engine());
    let now = Utc::now();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let e = e.clone();
            std::thread::spawn(move || {
                let user = format!("user-{i}");
                for _ in 0..25 {
                    e.detect(
                        &Message::user("I want to die", now),
                        &[],
                        &DetectionContext::default(),
                        &user,
                    );
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(e.total_scanned(), 100);
    assert_eq!(e.tracker().total_recorded(), 100);
    for i in 0..4 {
        assert_eq!(e.tracker().alert_count(&format!("user-{i}"), now), 25);
    }
}
