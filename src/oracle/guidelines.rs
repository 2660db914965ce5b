// src/oracle/guidelines.rs — Constraint guideline table
//
// A JSON list of `{term_or_constraint, clarify_options,
// recommended_alternatives}` rows. Lookup ignores case and a trailing "s".

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::ConstraintResolver;
use crate::infra::errors::LiftError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Guideline {
    pub term_or_constraint: String,
    #[serde(default)]
    pub clarify_options: Vec<String>,
    #[serde(default)]
    pub recommended_alternatives: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GuidelineTable {
    entries: Vec<Guideline>,
}

/// Lowercase, trimmed, one trailing "s" removed.
fn singular_key(term: &str) -> String {
    let key = term.trim().to_lowercase();
    match key.strip_suffix('s') {
        Some(base) => base.to_string(),
        None => key,
    }
}

impl GuidelineTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<Guideline>) -> Self {
        Self { entries }
    }

    pub fn from_json(json: &str) -> Result<Self, LiftError> {
        let entries: Vec<Guideline> = serde_json::from_str(json)?;
        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self, LiftError> {
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_json(&content)?;
        tracing::debug!(path = %path.display(), entries = table.len(), "loaded guideline table");
        Ok(table)
    }

    /// Load from `path`, or an empty table when the file is absent.
    pub fn load_or_empty(path: &Path) -> Result<Self, LiftError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::warn!(path = %path.display(), "guideline table not found, avoid terms will not be expanded");
            Ok(Self::empty())
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConstraintResolver for GuidelineTable {
    fn lookup(&self, term: &str) -> Option<&Guideline> {
        let wanted = singular_key(term);
        if wanted.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|g| singular_key(&g.term_or_constraint) == wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"term_or_constraint": "Squats", "clarify_options": ["back squat", "front squat", "Goblet Squat"],
         "recommended_alternatives": ["leg press", "box squat"]},
        {"term_or_constraint": "overhead pressing", "clarify_options": ["overhead press", "push press"]}
    ]"#;

    #[test]
    fn test_lookup_is_plural_insensitive() {
        let table = GuidelineTable::from_json(SAMPLE).unwrap();
        let g = table.lookup("squat").unwrap();
        assert_eq!(g.recommended_alternatives, vec!["leg press", "box squat"]);
        assert!(table.lookup("SQUATS").is_some());
        assert!(table.lookup("  squats ").is_some());
    }

    #[test]
    fn test_lookup_unknown_and_blank() {
        let table = GuidelineTable::from_json(SAMPLE).unwrap();
        assert!(table.lookup("burpees").is_none());
        assert!(table.lookup("   ").is_none());
    }

    #[test]
    fn test_expand_terms_dedups_and_lowercases() {
        let table = GuidelineTable::from_json(SAMPLE).unwrap();
        let expanded = table.expand_terms(&[
            "Squats".to_string(),
            "back squat".to_string(),
            "burpees".to_string(),
        ]);
        assert_eq!(
            expanded,
            vec!["squats", "back squat", "front squat", "goblet squat", "burpees"]
        );
    }

    #[test]
    fn test_expand_terms_empty_table_passes_through() {
        let expanded = GuidelineTable::empty().expand_terms(&["Dips".to_string(), "".to_string()]);
        assert_eq!(expanded, vec!["dips"]);
    }

    #[test]
    fn test_load_or_empty_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let table = GuidelineTable::load_or_empty(&dir.path().join("nope.json")).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guidelines.json");
        std::fs::write(&path, SAMPLE).unwrap();
        assert_eq!(GuidelineTable::load(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_file_is_error() {
        assert!(GuidelineTable::from_json("{not a list}").is_err());
    }
}
