//! Temporal Tracker — per-user sliding windows of past alerts and the
//! escalation trajectory derived from them.
//!
//! The tracker owns the only mutable state in the engine: a keyed store of
//! per-user append-only alert logs. Entries older than the retention
//! window (14 days) are evicted inside `record`, as a maintenance step
//! rather than a query-time filter, so query cost stays bounded by the
//! window and never grows with total historical alert volume.
//!
//! Concurrency: the map is behind an `RwLock`, each user's window behind
//! its own `Mutex`. Updates for the same user serialize; different users
//! never block each other.

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::TrajectoryConfig;
use crate::types::{AlertPattern, TemporalSummary, Trajectory};

#[derive(Debug, Clone, Copy)]
struct AlertEntry {
    timestamp: DateTime<Utc>,
    risk_score: u8,
}

#[derive(Debug, Default)]
struct UserWindow {
    entries: VecDeque<AlertEntry>,
}

pub struct TemporalTracker {
    windows: RwLock<HashMap<String, Arc<Mutex<UserWindow>>>>,
    config: TrajectoryConfig,
    total_recorded: AtomicU64,
    total_evicted: AtomicU64,
}

impl TemporalTracker {
    pub fn new(config: TrajectoryConfig) -> Self {
        Self {
            windows: RwLock::new(HashMap::new()),
            config,
            total_recorded: AtomicU64::new(0),
            total_evicted: AtomicU64::new(0),
        }
    }

    /// Append an alert to the user's window, evicting entries that have
    /// aged out of the retention window.
    pub fn record(&self, user_id: &str, timestamp: DateTime<Utc>, risk_score: u8) {
        let window = self.window_for(user_id);
        let mut guard = window.lock();

        guard.entries.push_back(AlertEntry { timestamp, risk_score });
        let cutoff = timestamp - Duration::days(self.config.retention_days);
        let before = guard.entries.len();
        guard.entries.retain(|e| e.timestamp > cutoff);
        let evicted = before - guard.entries.len();

        self.total_recorded.fetch_add(1, Ordering::Relaxed);
        self.total_evicted.fetch_add(evicted as u64, Ordering::Relaxed);
    }

    /// Escalation trajectory as of now.
    pub fn trajectory(&self, user_id: &str) -> Trajectory {
        self.trajectory_at(user_id, Utc::now())
    }

    /// Escalation trajectory at an explicit reference time: mean of scores
    /// within the recent 72h sub-window versus the mean of the rest of the
    /// retained 14-day window.
    pub fn trajectory_at(&self, user_id: &str, now: DateTime<Utc>) -> Trajectory {
        let Some(window) = self.existing_window(user_id) else {
            return Trajectory::Stable;
        };
        let guard = window.lock();

        let retention_cutoff = now - Duration::days(self.config.retention_days);
        let recent_cutoff = now - Duration::hours(self.config.recent_window_hours);

        let mut recent = MeanAcc::default();
        let mut older = MeanAcc::default();
        for entry in guard.entries.iter().filter(|e| e.timestamp > retention_cutoff) {
            if entry.timestamp > recent_cutoff {
                recent.add(entry.risk_score);
            } else {
                older.add(entry.risk_score);
            }
        }

        if recent.count < self.config.min_recent_alerts {
            // A lone alert is an isolated event, not a trend.
            return Trajectory::Stable;
        }

        match older.mean() {
            None => {
                if recent.mean().unwrap_or(0.0) >= self.config.escalation_floor {
                    Trajectory::Escalating
                } else {
                    Trajectory::Stable
                }
            }
            Some(older_mean) => {
                let recent_mean = recent.mean().unwrap_or(0.0);
                if recent_mean > older_mean * self.config.escalation_ratio {
                    Trajectory::Escalating
                } else if recent_mean < older_mean * self.config.deescalation_ratio {
                    Trajectory::DeEscalating
                } else {
                    Trajectory::Stable
                }
            }
        }
    }

    /// Window counts, alert pattern, and trajectory in one snapshot.
    pub fn summary(&self, user_id: &str, now: DateTime<Utc>) -> TemporalSummary {
        let (alerts_72h, alerts_14d) = self.counts_at(user_id, now);
        let pattern = if alerts_72h >= 2 {
            AlertPattern::RepeatAlerts72h
        } else if alerts_14d >= 3 {
            AlertPattern::MultipleAlerts14d
        } else {
            AlertPattern::IsolatedEvent
        };
        TemporalSummary {
            alerts_72h,
            alerts_14d,
            pattern,
            trajectory: self.trajectory_at(user_id, now),
        }
    }

    /// Alert count over the retained window, for the caller to feed back
    /// in as `prior_alert_count`.
    pub fn alert_count(&self, user_id: &str, now: DateTime<Utc>) -> u32 {
        self.counts_at(user_id, now).1
    }

    fn counts_at(&self, user_id: &str, now: DateTime<Utc>) -> (u32, u32) {
        let Some(window) = self.existing_window(user_id) else {
            return (0, 0);
        };
        let guard = window.lock();
        let retention_cutoff = now - Duration::days(self.config.retention_days);
        let recent_cutoff = now - Duration::hours(self.config.recent_window_hours);
        let mut recent = 0;
        let mut total = 0;
        for entry in guard.entries.iter().filter(|e| e.timestamp > retention_cutoff) {
            total += 1;
            if entry.timestamp > recent_cutoff {
                recent += 1;
            }
        }
        (recent, total)
    }

    fn window_for(&self, user_id: &str) -> Arc<Mutex<UserWindow>> {
        if let Some(window) = self.windows.read().get(user_id) {
            return window.clone();
        }
        self.windows
            .write()
            .entry(user_id.to_string())
            .or_default()
            .clone()
    }

    fn existing_window(&self, user_id: &str) -> Option<Arc<Mutex<UserWindow>>> {
        self.windows.read().get(user_id).cloned()
    }

    pub fn total_recorded(&self) -> u64 {
        self.total_recorded.load(Ordering::Relaxed)
    }

    pub fn total_evicted(&self) -> u64 {
        self.total_evicted.load(Ordering::Relaxed)
    }

    pub fn tracked_users(&self) -> usize {
        self.windows.read().len()
    }
}

#[derive(Default)]
struct MeanAcc {
    sum: f64,
    count: usize,
}

impl MeanAcc {
    fn add(&mut self, score: u8) {
        self.sum += score as f64;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> TemporalTracker {
        TemporalTracker::new(TrajectoryConfig::default())
    }

    #[test]
    fn stale_entries_are_evicted_on_record() {
        let t = tracker();
        let now = Utc::now();
        t.record("u1", now - Duration::days(20), 80);
        t.record("u1", now, 40);
        // The 20-day-old alert must be gone from both counts and trajectory.
        assert_eq!(t.alert_count("u1", now), 1);
        assert_eq!(t.total_evicted(), 1);
        assert_eq!(t.trajectory_at("u1", now), Trajectory::Stable);
    }

    #[test]
    fn unknown_user_is_stable_with_empty_counts() {
        let t = tracker();
        assert_eq!(t.trajectory("nobody"), Trajectory::Stable);
        assert_eq!(t.alert_count("nobody", Utc::now()), 0);
    }

    #[test]
    fn repeated_high_alerts_in_recent_window_escalate() {
        let t = tracker();
        let now = Utc::now();
        for hours_ago in [60, 48, 36, 24, 12] {
            t.record("u1", now - Duration::hours(hours_ago), 75);
        }
        t.record("u1", now, 80);
        assert_eq!(t.trajectory_at("u1", now), Trajectory::Escalating);
        let summary = t.summary("u1", now);
        assert_eq!(summary.alerts_72h, 6);
        assert_eq!(summary.pattern, AlertPattern::RepeatAlerts72h);
    }

    #[test]
    fn recent_drop_reads_as_deescalating() {
        let t = tracker();
        let now = Utc::now();
        for days_ago in [10, 8, 6] {
            t.record("u1", now - Duration::days(days_ago), 85);
        }
        t.record("u1", now - Duration::hours(30), 40);
        t.record("u1", now - Duration::hours(2), 35);
        assert_eq!(t.trajectory_at("u1", now), Trajectory::DeEscalating);
    }

    #[test]
    fn single_recent_alert_is_isolated_not_escalating() {
        let t = tracker();
        let now = Utc::now();
        t.record("u1", now, 95);
        assert_eq!(t.trajectory_at("u1", now), Trajectory::Stable);
        assert_eq!(t.summary("u1", now).pattern, AlertPattern::IsolatedEvent);
    }

    #[test]
    fn concurrent_same_user_records_both_land() {
        let t = Arc::new(tracker());
        let now = Utc::now();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let t = t.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        t.record("shared", now, 60 + i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(t.alert_count("shared", now), 8 * 50);
        assert_eq!(t.total_recorded(), 8 * 50);
    }

    #[test]
    fn different_users_do_not_interfere() {
        let t = Arc::new(tracker());
        let now = Utc::now();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let t = t.clone();
                std::thread::spawn(move || {
                    let user = format!("user-{i}");
                    for _ in 0..100 {
                        t.record(&user, now, 55);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(t.tracked_users(), 4);
        for i in 0..4 {
            assert_eq!(t.alert_count(&format!("user-{i}"), now), 100);
        }
    }
}
