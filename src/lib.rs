//! # companion-guard — chat-safety detection engine
//!
//! Assesses short user/companion-AI chat messages for crisis, grooming,
//! and violence risk, producing a 0–100 score, a response tier, and a
//! recommended action for a downstream safety workflow.
//!
//! Pipeline, leaves first:
//! - **Feature Extractor** (`features`) — message → fixed linguistic
//!   feature vector
//! - **Lexical Screener** (`screener`) — three independent keyword rule
//!   families (crisis, grooming, violence)
//! - **Category Scorer** (`scorer`) — hits + features → raw confidence
//! - **Context Multiplier** (`context`) — session/time/age adjustments
//! - **Risk Normalizer & Tier Classifier** (`stratify`) — 0–100 score,
//!   tier table, deadlines, actions
//! - **Boundary Violation Engine** (`boundary`) — six relational-dynamics
//!   rules, independent of category scoring
//! - **Temporal Tracker** (`temporal`) — per-user 72h/14d alert windows
//!   and escalation trajectory; the only mutable state in the crate
//!
//! `engine::DetectionEngine::detect` composes all of the above into one
//! call. All stages except the tracker are pure functions and safe to run
//! concurrently; tracker updates serialize per user, never globally.

pub mod boundary;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod features;
pub mod scorer;
pub mod screener;
pub mod stratify;
pub mod temporal;
pub mod types;

pub use config::DetectionConfig;
pub use engine::DetectionEngine;
pub use error::{GuardError, GuardResult};
pub use types::{
    BoundaryViolation, DetectionContext, DetectionResult, Message, RiskCategory, RiskTier, Role,
    Trajectory, ViolationKind,
};
