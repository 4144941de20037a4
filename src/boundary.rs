//! Boundary Violation Engine — rule matcher over six relational-dynamics
//! patterns.
//!
//! Runs on every message regardless of category scores and is fully
//! independent of the crisis/grooming/violence pipeline. Each violation is
//! reported as a flag with the matched text span as evidence; there is no
//! severity ranking among violations. Deterministic for identical input.
//!
//! Two rules look beyond the current exchange:
//! - isolation cultivation needs ≥2 isolation phrases across the
//!   assistant's last 10 turns plus the current reply
//! - sycophantic pattern needs ≥2 flattery phrases across the last 5

use regex::{Regex, RegexBuilder};

use crate::error::GuardResult;
use crate::types::{BoundaryViolation, Message, Role, ViolationKind};

// ── Pattern families ────────────────────────────────────────────────────────

const DELUSION_MARKERS: &[&str] = &[
    r"\b(hearing voices|seeing things|people following)\b",
    r"\b(special powers|chosen one|mind reading)\b",
    r"\b(conspiracy|tracking me|implanted)\b",
    r"\b(they are watching|government is|aliens)\b",
];

const VALIDATION_PHRASES: &[&str] = &[
    r"\b(makes sense|you'?re right|i agree)\b",
    r"\b(exactly|absolutely|totally understand)\b",
    r"\b(of course|definitely|that'?s true)\b",
];

const ROLE_CONFUSION: &[&str] = &[
    r"\b(i am your therapist|as your doctor)\b",
    r"\b(i can diagnose|i prescribe)\b",
    r"\b(my professional opinion|clinical assessment)\b",
    r"\b(as a licensed|as a certified)\b",
];

const DUAL_RELATIONSHIP: &[&str] = &[
    r"\b(meet you in person|come over to my|my address is)\b",
    r"\b(i love you|we could be together|go on a date)\b",
    r"\b(in real life|outside of here)\b",
    r"\b(physical relationship|romantic relationship)\b",
];

const MEDICAL_ADVICE: &[&str] = &[
    r"\b(stop your medication|increase your dose)\b",
    r"\b(you don'?t need therapy|skip therapy)\b",
    r"\b(you have depression|you have anxiety|you have bipolar)\b",
    r"\b(take this medication|try this drug)\b",
];

const ISOLATION_PATTERNS: &[&str] = &[
    r"\b(they don'?t understand you|you don'?t need them)\b",
    r"\b(i'?m the only one|better off without them)\b",
    r"\b(don'?t tell anyone|keep this between us)\b",
    r"\b(no one else cares|only i understand)\b",
];

const SYCOPHANTIC_PATTERNS: &[&str] = &[
    r"\b(you'?re so special|you'?re amazing)\b",
    r"\b(only you understand me|you'?re perfect)\b",
    r"\b(i need you|you complete me)\b",
    r"\b(always here for you|never leave you)\b",
];

/// How far back the history scans reach.
const ISOLATION_LOOKBACK: usize = 10;
const SYCOPHANCY_LOOKBACK: usize = 5;
const REPEAT_THRESHOLD: usize = 2;

// ── Engine ──────────────────────────────────────────────────────────────────

pub struct BoundaryEngine {
    delusion: Vec<Regex>,
    validation: Vec<Regex>,
    role_confusion: Vec<Regex>,
    dual_relationship: Vec<Regex>,
    medical_advice: Vec<Regex>,
    isolation: Vec<Regex>,
    sycophantic: Vec<Regex>,
}

impl BoundaryEngine {
    pub fn new() -> GuardResult<Self> {
        Ok(Self {
            delusion: compile(DELUSION_MARKERS)?,
            validation: compile(VALIDATION_PHRASES)?,
            role_confusion: compile(ROLE_CONFUSION)?,
            dual_relationship: compile(DUAL_RELATIONSHIP)?,
            medical_advice: compile(MEDICAL_ADVICE)?,
            isolation: compile(ISOLATION_PATTERNS)?,
            sycophantic: compile(SYCOPHANTIC_PATTERNS)?,
        })
    }

    /// Evaluate the current user/assistant exchange plus recent history.
    pub fn evaluate(
        &self,
        user_content: &str,
        assistant_content: &str,
        history: &[Message],
    ) -> Vec<BoundaryViolation> {
        let mut violations = Vec::new();

        // Delusion reinforcement needs both sides: the user voicing a
        // delusional frame and the assistant validating it.
        if first_match(&self.delusion, user_content).is_some() {
            if let Some(evidence) = first_match(&self.validation, assistant_content) {
                violations.push(BoundaryViolation {
                    kind: ViolationKind::DelusionReinforcement,
                    evidence,
                });
            }
        }

        for (family, kind) in [
            (&self.role_confusion, ViolationKind::RoleConfusion),
            (&self.dual_relationship, ViolationKind::DualRelationship),
            (&self.medical_advice, ViolationKind::MedicalAdvice),
        ] {
            if let Some(evidence) = first_match(family, assistant_content) {
                violations.push(BoundaryViolation { kind, evidence });
            }
        }

        if let Some(evidence) = self.repeated_pattern(
            &self.isolation,
            assistant_content,
            history,
            ISOLATION_LOOKBACK,
        ) {
            violations.push(BoundaryViolation {
                kind: ViolationKind::IsolationCultivation,
                evidence,
            });
        }

        if let Some(evidence) = self.repeated_pattern(
            &self.sycophantic,
            assistant_content,
            history,
            SYCOPHANCY_LOOKBACK,
        ) {
            violations.push(BoundaryViolation {
                kind: ViolationKind::SycophanticPattern,
                evidence,
            });
        }

        violations
    }

    /// Count matches across the current reply and the assistant's recent
    /// history turns; fires once the repeat threshold is reached.
    fn repeated_pattern(
        &self,
        family: &[Regex],
        assistant_content: &str,
        history: &[Message],
        lookback: usize,
    ) -> Option<String> {
        let mut count = 0;
        let mut evidence = None;

        if let Some(span) = first_match(family, assistant_content) {
            count += 1;
            evidence = Some(span);
        }

        for message in history
            .iter()
            .rev()
            .filter(|m| m.role == Role::Assistant)
            .take(lookback)
        {
            if let Some(span) = first_match(family, &message.content) {
                count += 1;
                evidence.get_or_insert(span);
            }
        }

        if count >= REPEAT_THRESHOLD {
            evidence
        } else {
            None
        }
    }
}

fn compile(patterns: &[&str]) -> GuardResult<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Ok(RegexBuilder::new(p).case_insensitive(true).build()?))
        .collect()
}

fn first_match(family: &[Regex], content: &str) -> Option<String> {
    family
        .iter()
        .find_map(|regex| regex.find(content).map(|m| m.as_str().to_string()))
}
