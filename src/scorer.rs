//! Category Scorer — turns lexical hits plus the feature vector into a raw
//! confidence in [0,1] per category.
//!
//! A lexical hit pins confidence to the hit floor (0.7) plus a small bonus
//! per additional matched pattern, then feature adjustments push it upward,
//! clamped to [floor, 1.0]. With no hit, confidence comes from features
//! alone and is capped strictly below the floor: confirmed keyword hits
//! always outrank feature-only inference.

use crate::config::ScoringConfig;
use crate::features::FeatureVector;
use crate::screener::CategoryHits;
use crate::types::{CategoryScore, RiskCategory};

pub fn score(
    category: RiskCategory,
    hits: &CategoryHits,
    features: &FeatureVector,
    config: &ScoringConfig,
) -> CategoryScore {
    let raw_confidence = if hits.hit {
        let extra = hits.matched_patterns.len().saturating_sub(1) as f64;
        let base = config.hit_floor + extra * config.extra_match_bonus;
        let adjusted = base + hit_adjustment(category, features);
        adjusted.clamp(config.hit_floor, 1.0)
    } else {
        feature_only(category, features).min(config.feature_only_cap)
    };

    CategoryScore {
        category,
        raw_confidence,
        lexical_hit: hits.hit,
        matched_patterns: hits.matched_patterns.clone(),
    }
}

/// Feature adjustments on top of a confirmed lexical hit. Small additive
/// bumps; the floor and ceiling clamp bounds the result.
fn hit_adjustment(category: RiskCategory, f: &FeatureVector) -> f64 {
    match category {
        RiskCategory::Crisis => {
            let mut adj = 0.0;
            if f.first_person_ratio > 0.1 {
                adj += 0.05;
            }
            if f.negative_marker_count > 0 {
                adj += 0.05;
            }
            adj += (f.hopelessness_count as f64 * 0.05).min(0.10);
            adj
        }
        RiskCategory::Grooming => {
            let mut adj = 0.0;
            if f.question_ratio > 0.2 {
                adj += 0.05;
            }
            if f.imperative_present {
                adj += 0.05;
            }
            adj
        }
        RiskCategory::Violence => {
            let mut adj = 0.0;
            if f.future_tense {
                adj += 0.05;
            }
            if f.negative_marker_count > 1 {
                adj += 0.05;
            }
            adj
        }
    }
}

/// Confidence from the feature vector alone, for paraphrased risk the
/// keyword families miss. Weighted sums mirror the per-category hit
/// adjustments but reach further since there is no floor underneath.
fn feature_only(category: RiskCategory, f: &FeatureVector) -> f64 {
    match category {
        RiskCategory::Crisis => {
            let mut score = 0.0;
            score += (f.hopelessness_count as f64 * 0.12).min(0.24);
            score += (f.negative_marker_count as f64 * 0.06).min(0.18);
            score += (f.keyword_density * 1.5).min(0.20);
            if f.first_person_ratio > 0.1 {
                score += 0.05;
            }
            if f.future_tense && f.hopelessness_count > 0 {
                score += 0.05;
            }
            score
        }
        RiskCategory::Grooming => {
            let mut score = 0.0;
            score += (f.question_ratio * 0.5).min(0.15);
            if f.imperative_present {
                score += 0.10;
            }
            if f.question_ratio > 0.5 && f.imperative_present {
                score += 0.10;
            }
            score
        }
        RiskCategory::Violence => {
            let mut score = 0.0;
            score += (f.keyword_density * 1.2).min(0.20);
            score += (f.negative_marker_count as f64 * 0.05).min(0.15);
            if f.future_tense {
                score += 0.05;
            }
            score
        }
    }
}
