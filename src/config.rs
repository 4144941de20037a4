use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GuardError, GuardResult};

/// Global configuration for the detection engine. Every threshold the
/// pipeline branches on lives here so it can be tuned without touching
/// control flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub scoring: ScoringConfig,
    pub multipliers: MultiplierConfig,
    pub trajectory: TrajectoryConfig,
    /// Raw confidence at or above which a category flag is set.
    pub detection_threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            multipliers: MultiplierConfig::default(),
            trajectory: TrajectoryConfig::default(),
            detection_threshold: 0.5,
        }
    }
}

impl DetectionConfig {
    /// Load configuration from a JSON file. A malformed file is a hard
    /// error, never a silent fallback to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> GuardResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GuardResult<()> {
        if !(0.0..=1.0).contains(&self.detection_threshold) {
            return Err(GuardError::Config(format!(
                "detection_threshold {} outside [0,1]",
                self.detection_threshold
            )));
        }
        if self.scoring.feature_only_cap >= self.scoring.hit_floor {
            return Err(GuardError::Config(format!(
                "feature_only_cap {} must stay below hit_floor {}",
                self.scoring.feature_only_cap, self.scoring.hit_floor
            )));
        }
        if self.trajectory.escalation_ratio < 1.0 || self.trajectory.deescalation_ratio > 1.0 {
            return Err(GuardError::Config(
                "trajectory ratios must straddle 1.0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Base confidence for any lexical hit ("keyword-confirmed risk").
    pub hit_floor: f64,
    /// Added per matched pattern beyond the first.
    pub extra_match_bonus: f64,
    /// Ceiling for confidence derived from features alone. Kept strictly
    /// below `hit_floor` so confirmed keyword hits always outrank
    /// feature-only inference.
    pub feature_only_cap: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            hit_floor: 0.7,
            extra_match_bonus: 0.05,
            feature_only_cap: 0.65,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiplierConfig {
    /// First hour (inclusive) of the late-night window, local to the user.
    pub late_night_start: u8,
    /// End hour (exclusive) of the late-night window.
    pub late_night_end: u8,
    pub late_night: f64,
    /// Session count above which the high-usage multiplier applies.
    pub high_usage_sessions: u32,
    pub high_usage: f64,
    /// Session count above which the excessive-usage multiplier replaces
    /// the high-usage one. The larger threshold wins; they never stack.
    pub excessive_usage_sessions: u32,
    pub excessive_usage: f64,
    /// Late night with no future-tense markers in the message.
    pub hopeless_timing: f64,
    /// Age below which the minor-user multiplier applies (grooming only).
    pub adult_age: u8,
    pub minor_grooming: f64,
}

impl Default for MultiplierConfig {
    fn default() -> Self {
        Self {
            late_night_start: 2,
            late_night_end: 6,
            late_night: 1.5,
            high_usage_sessions: 10,
            high_usage: 1.3,
            excessive_usage_sessions: 20,
            excessive_usage: 1.5,
            hopeless_timing: 1.2,
            adult_age: 18,
            minor_grooming: 1.4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryConfig {
    /// Hours covered by the recent sub-window.
    pub recent_window_hours: i64,
    /// Days of alert history retained per user; older entries are evicted
    /// on every record call.
    pub retention_days: i64,
    /// Recent mean must exceed the older mean by this ratio to count as
    /// escalating.
    pub escalation_ratio: f64,
    /// Recent mean below the older mean by this ratio counts as
    /// de-escalating.
    pub deescalation_ratio: f64,
    /// Fewer recent alerts than this is an isolated event, never a trend.
    pub min_recent_alerts: usize,
    /// With no older alerts to compare against, a recent mean at or above
    /// this score is still treated as escalating.
    pub escalation_floor: f64,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            recent_window_hours: 72,
            retention_days: 14,
            escalation_ratio: 1.1,
            deescalation_ratio: 0.9,
            min_recent_alerts: 2,
            escalation_floor: 50.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        DetectionConfig::default().validate().unwrap();
    }

    #[test]
    fn feature_cap_above_floor_rejected() {
        let mut config = DetectionConfig::default();
        config.scoring.feature_only_cap = 0.8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = DetectionConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: DetectionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.multipliers.late_night, config.multipliers.late_night);
        assert_eq!(back.trajectory.retention_days, 14);
    }
}
