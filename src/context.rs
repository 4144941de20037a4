//! Context Multiplier — adjusts raw confidence using session, time, and
//! age context.
//!
//! Multipliers compose multiplicatively in a fixed order so results are
//! reproducible:
//!  1. late-night window (02:00–06:00 local to the user): ×1.5
//!  2. session-count escalation: >10 ×1.3, >20 ×1.5 (larger wins, not both)
//!  3. hopeless timing — late night with no future-tense markers: ×1.2
//!  4. minor user (<18), grooming category only: ×1.4
//!
//! The result is clamped to [0,1] and never falls below the pre-multiplier
//! raw value. A missing context field disables only its own row.

use crate::config::MultiplierConfig;
use crate::features::FeatureVector;
use crate::types::{AppliedMultiplier, DetectionContext, RiskCategory};

pub fn apply(
    raw_confidence: f64,
    category: RiskCategory,
    context: &DetectionContext,
    features: &FeatureVector,
    config: &MultiplierConfig,
) -> (f64, Vec<AppliedMultiplier>) {
    let mut applied = Vec::new();
    let late_night = context
        .hour_of_day
        .map(|h| h >= config.late_night_start && h < config.late_night_end)
        .unwrap_or(false);

    if late_night {
        applied.push(AppliedMultiplier { name: "late_night".into(), factor: config.late_night });
    }

    if context.session_count > config.excessive_usage_sessions {
        applied.push(AppliedMultiplier {
            name: "excessive_usage".into(),
            factor: config.excessive_usage,
        });
    } else if context.session_count > config.high_usage_sessions {
        applied.push(AppliedMultiplier { name: "high_usage".into(), factor: config.high_usage });
    }

    if late_night && !features.future_tense {
        applied.push(AppliedMultiplier {
            name: "hopeless_timing".into(),
            factor: config.hopeless_timing,
        });
    }

    if category == RiskCategory::Grooming {
        if let Some(age) = context.user_age {
            if age < config.adult_age {
                applied.push(AppliedMultiplier {
                    name: "minor_user".into(),
                    factor: config.minor_grooming,
                });
            }
        }
    }

    let product: f64 = applied.iter().map(|m| m.factor).product();
    let adjusted = (raw_confidence * product).clamp(0.0, 1.0).max(raw_confidence.min(1.0));
    (adjusted, applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MultiplierConfig {
        MultiplierConfig::default()
    }

    fn ctx(hour: Option<u8>, sessions: u32, age: Option<u8>) -> DetectionContext {
        DetectionContext {
            hour_of_day: hour,
            session_count: sessions,
            user_age: age,
            prior_alert_count: 0,
        }
    }

    #[test]
    fn no_context_leaves_confidence_unchanged() {
        let (adjusted, applied) = apply(
            0.7,
            RiskCategory::Crisis,
            &ctx(None, 0, None),
            &FeatureVector::default(),
            &config(),
        );
        assert_eq!(adjusted, 0.7);
        // No future tense but also no late-night flag, so hopeless timing
        // must not fire on its own.
        assert!(applied.is_empty());
    }

    #[test]
    fn late_night_compounds_with_hopeless_timing() {
        let (adjusted, applied) = apply(
            0.5,
            RiskCategory::Crisis,
            &ctx(Some(3), 0, None),
            &FeatureVector::default(),
            &config(),
        );
        let names: Vec<&str> = applied.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["late_night", "hopeless_timing"]);
        assert!((adjusted - 0.5 * 1.5 * 1.2).abs() < 1e-9);
    }

    #[test]
    fn larger_session_threshold_wins_not_both() {
        let (_, applied) = apply(
            0.5,
            RiskCategory::Crisis,
            &ctx(None, 25, None),
            &FeatureVector { future_tense: true, ..Default::default() },
            &config(),
        );
        let names: Vec<&str> = applied.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["excessive_usage"]);
    }

    #[test]
    fn minor_multiplier_only_for_grooming() {
        let features = FeatureVector { future_tense: true, ..Default::default() };
        let (grooming, _) =
            apply(0.6, RiskCategory::Grooming, &ctx(None, 0, Some(15)), &features, &config());
        let (crisis, _) =
            apply(0.6, RiskCategory::Crisis, &ctx(None, 0, Some(15)), &features, &config());
        assert!((grooming - 0.6 * 1.4).abs() < 1e-9);
        assert_eq!(crisis, 0.6);
    }

    #[test]
    fn adjusted_confidence_is_monotone_and_clamped() {
        let features = FeatureVector::default();
        let contexts = [
            ctx(None, 0, None),
            ctx(Some(3), 0, None),
            ctx(Some(3), 15, None),
            ctx(Some(3), 25, Some(15)),
        ];
        let mut previous = 0.0;
        for context in &contexts {
            let (adjusted, _) =
                apply(0.7, RiskCategory::Grooming, context, &features, &config());
            assert!(adjusted >= previous, "multipliers must be non-decreasing");
            assert!(adjusted <= 1.0);
            previous = adjusted;
        }
        assert_eq!(previous, 1.0);
    }

    #[test]
    fn unknown_age_disables_only_minor_row() {
        let (adjusted, applied) = apply(
            0.5,
            RiskCategory::Grooming,
            &ctx(Some(4), 0, None),
            &FeatureVector { future_tense: true, ..Default::default() },
            &config(),
        );
        let names: Vec<&str> = applied.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["late_night"]);
        assert!((adjusted - 0.75).abs() < 1e-9);
    }
}
