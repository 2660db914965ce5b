// src/verifier/fingerprint.rs — Issue fingerprints for convergence detection
//
// A fingerprint is the set of short tokens naming what failed in one pass.
// Two passes with equal fingerprints made no progress.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::report::VerificationReport;
use crate::util::take_chars;

const AVOID_TOKEN_CHARS: usize = 20;
const PROGRESSION_TOKEN_CHARS: usize = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueFingerprint(BTreeSet<String>);

impl IssueFingerprint {
    pub fn from_report(report: &VerificationReport) -> Self {
        let mut tokens = BTreeSet::new();

        let limit = report.time_fit.limit as f64 * super::fast::TIME_TOLERANCE;
        for (idx, minutes) in report.time_fit.per_day_minutes.iter().enumerate() {
            if *minutes > limit {
                tokens.insert(format!("time_day_{idx}_over"));
            }
        }

        for (pattern, count) in &report.balance.weekly_presence_days {
            if *count == 0 {
                tokens.insert(format!("balance_{pattern}_missing"));
            }
        }

        for violation in &report.avoidance.violations {
            tokens.insert(format!("avoid_{}", take_chars(violation, AVOID_TOKEN_CHARS)));
        }

        for issue in &report.progression.issues {
            tokens.insert(format!("prog_{}", take_chars(issue, PROGRESSION_TOKEN_CHARS)));
        }

        Self(tokens)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    /// Same issue set as the previous pass.
    pub fn is_stagnant(&self, previous: &IssueFingerprint) -> bool {
        self == previous
    }

    /// Any issue the first pass did not have.
    pub fn regressed_from(&self, first: &IssueFingerprint) -> bool {
        self.0.iter().any(|token| !first.0.contains(token))
    }

    /// Tokens absent from `baseline`.
    pub fn new_since<'a>(&'a self, baseline: &'a IssueFingerprint) -> impl Iterator<Item = &'a String> {
        self.0.difference(&baseline.0)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for IssueFingerprint {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::fast::MovementPattern;
    use crate::verifier::report::{FastReport, ProgressionReport};

    fn report_with(fast: FastReport, issues: &[&str]) -> VerificationReport {
        let progression = ProgressionReport {
            ok: issues.is_empty(),
            issues: issues.iter().map(|s| s.to_string()).collect(),
            notes: String::new(),
        };
        VerificationReport::from_parts(fast, progression, vec![])
    }

    #[test]
    fn test_skipped_fast_report_yields_no_fast_tokens() {
        let fp = IssueFingerprint::from_report(&report_with(FastReport::skipped(60), &[]));
        assert!(fp.is_empty());
    }

    #[test]
    fn test_tokens_cover_each_check() {
        let mut fast = FastReport::skipped(60);
        fast.time_fit.per_day_minutes = vec![40.0, 75.5];
        fast.balance.weekly_presence_days =
            MovementPattern::ALL.iter().map(|p| (*p, 1)).collect();
        fast.balance
            .weekly_presence_days
            .insert(MovementPattern::HingeLike, 0);
        fast.avoidance.violations = vec!["Barbell Back Squat (contains 'squat')".into()];

        let fp = IssueFingerprint::from_report(&report_with(
            fast,
            &["Volume jumps too quickly between weeks two and three"],
        ));

        assert_eq!(
            fp.to_vec(),
            vec![
                "avoid_Barbell Back Squat (".to_string(),
                "balance_hinge_like_missing".to_string(),
                "prog_Volume jumps too quickly betwe".to_string(),
                "time_day_1_over".to_string(),
            ]
        );
    }

    #[test]
    fn test_stagnation_is_set_equality() {
        let a: IssueFingerprint = ["prog_x"].into_iter().collect();
        let b: IssueFingerprint = ["prog_x"].into_iter().collect();
        assert!(a.is_stagnant(&b));

        let c: IssueFingerprint = ["prog_y"].into_iter().collect();
        assert!(!a.is_stagnant(&c));
    }

    #[test]
    fn test_regression_means_new_token_vs_first() {
        let first: IssueFingerprint = ["a", "b"].into_iter().collect();
        let subset: IssueFingerprint = ["b"].into_iter().collect();
        let churned: IssueFingerprint = ["b", "c"].into_iter().collect();
        assert!(!subset.regressed_from(&first));
        assert!(churned.regressed_from(&first));
        assert_eq!(churned.new_since(&first).collect::<Vec<_>>(), vec!["c"]);
    }
}
