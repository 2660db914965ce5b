// src/verifier/report.rs — Verification report types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::fast::MovementPattern;
use crate::core::types::StopReason;
use crate::edits::Edit;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeFitReport {
    pub ok: bool,
    /// Estimated minutes per day, in plan order.
    pub per_day_minutes: Vec<f64>,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub ok: bool,
    /// Number of days on which each pattern appears.
    pub weekly_presence_days: BTreeMap<MovementPattern, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvoidanceReport {
    pub ok: bool,
    pub violations: Vec<String>,
    pub expanded_terms: Vec<String>,
}

/// Conjunction of the deterministic checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastReport {
    pub ok: bool,
    pub time_fit: TimeFitReport,
    pub balance: BalanceReport,
    pub avoidance: AvoidanceReport,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
}

impl FastReport {
    /// Stand-in used when the previous pass left nothing for the fast checks to find.
    pub fn skipped(limit: u32) -> Self {
        Self {
            ok: true,
            time_fit: TimeFitReport {
                ok: true,
                per_day_minutes: Vec::new(),
                limit,
            },
            balance: BalanceReport {
                ok: true,
                weekly_presence_days: BTreeMap::new(),
            },
            avoidance: AvoidanceReport {
                ok: true,
                violations: Vec::new(),
                expanded_terms: Vec::new(),
            },
            skipped: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionReport {
    #[serde(default = "default_true")]
    pub ok: bool,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

fn default_true() -> bool {
    true
}

impl Default for ProgressionReport {
    fn default() -> Self {
        Self::passing("")
    }
}

impl ProgressionReport {
    /// Passing judgment with an explanatory note.
    pub fn passing(notes: impl Into<String>) -> Self {
        Self {
            ok: true,
            issues: Vec::new(),
            notes: notes.into(),
        }
    }
}

/// Merged fast + semantic verdict for one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub ok: bool,
    pub time_fit: TimeFitReport,
    pub balance: BalanceReport,
    pub avoidance: AvoidanceReport,
    pub progression: ProgressionReport,
    pub suggested_edits: Vec<Edit>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fast_check_failed: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fast_checks_skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_reason: Option<StopReason>,
}

impl VerificationReport {
    pub fn from_parts(
        fast: FastReport,
        progression: ProgressionReport,
        suggested_edits: Vec<Edit>,
    ) -> Self {
        Self {
            ok: fast.ok && progression.ok,
            fast_check_failed: !fast.ok,
            fast_checks_skipped: fast.skipped,
            time_fit: fast.time_fit,
            balance: fast.balance,
            avoidance: fast.avoidance,
            progression,
            suggested_edits,
            stopped_reason: None,
        }
    }
}
