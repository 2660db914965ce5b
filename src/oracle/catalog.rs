// src/oracle/catalog.rs — Local exercise catalog for substitution candidates
//
// Keyword filtering over a JSON exercise list. Names are compared after
// lowercasing and turning underscores into spaces.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::infra::errors::LiftError;
use crate::verifier::fast::MovementPattern;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogExercise {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub equipment: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "primaryMuscles", alias = "primary_muscles")]
    pub primary_muscles: Vec<String>,
}

/// Conjunctive filter; empty lists do not constrain.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    pub include_keywords: Vec<String>,
    pub exclude_keywords: Vec<String>,
    pub primary_muscles: Vec<String>,
    pub equipment_any_of: Vec<String>,
    pub category_any_of: Vec<String>,
}

fn normalize(s: &str) -> String {
    s.to_lowercase().replace('_', " ")
}

impl CatalogFilter {
    pub fn matches(&self, ex: &CatalogExercise) -> bool {
        let name = normalize(&ex.name);

        if !self.include_keywords.is_empty()
            && !self
                .include_keywords
                .iter()
                .any(|k| name.contains(&normalize(k)))
        {
            return false;
        }
        if self
            .exclude_keywords
            .iter()
            .any(|k| name.contains(&normalize(k)))
        {
            return false;
        }
        if !self.primary_muscles.is_empty()
            && !self.primary_muscles.iter().any(|m| {
                ex.primary_muscles
                    .iter()
                    .any(|pm| pm.eq_ignore_ascii_case(m))
            })
        {
            return false;
        }
        if !self.equipment_any_of.is_empty() {
            let Some(equipment) = ex.equipment.as_deref().map(str::to_lowercase) else {
                return false;
            };
            if !self
                .equipment_any_of
                .iter()
                .any(|eq| equipment.contains(&eq.to_lowercase()))
            {
                return false;
            }
        }
        if !self.category_any_of.is_empty() {
            let Some(category) = ex.category.as_deref() else {
                return false;
            };
            if !self
                .category_any_of
                .iter()
                .any(|c| c.eq_ignore_ascii_case(category))
            {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseCatalog {
    exercises: Vec<CatalogExercise>,
}

impl ExerciseCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_exercises(exercises: Vec<CatalogExercise>) -> Self {
        Self { exercises }
    }

    pub fn from_json(json: &str) -> Result<Self, LiftError> {
        Ok(Self {
            exercises: serde_json::from_str(json)?,
        })
    }

    pub fn load(path: &Path) -> Result<Self, LiftError> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&content)?;
        tracing::debug!(path = %path.display(), exercises = catalog.len(), "loaded exercise catalog");
        Ok(catalog)
    }

    /// Load from `path`, or an empty catalog when the file is absent.
    pub fn load_or_empty(path: &Path) -> Result<Self, LiftError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::warn!(path = %path.display(), "exercise catalog not found, substitutions will have no candidates");
            Ok(Self::empty())
        }
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn search_by_keywords(&self, keywords: &[String]) -> Vec<&CatalogExercise> {
        self.filter(&CatalogFilter {
            include_keywords: keywords.to_vec(),
            ..Default::default()
        })
    }

    pub fn filter(&self, filter: &CatalogFilter) -> Vec<&CatalogExercise> {
        self.exercises.iter().filter(|ex| filter.matches(ex)).collect()
    }

    /// Keyword search for browsing the catalog. Every query word of two or
    /// more characters that appears in the name scores two points, one that
    /// appears in a primary muscle or the equipment scores one. Exercises
    /// scoring zero are dropped unless the query is blank. `pattern`, when
    /// given, keeps only names of that movement pattern. Ties keep catalog
    /// order.
    pub fn search(
        &self,
        query: &str,
        pattern: Option<MovementPattern>,
        k: usize,
    ) -> Vec<&CatalogExercise> {
        let words: Vec<String> = normalize(query)
            .split_whitespace()
            .filter(|w| w.len() >= 2)
            .map(str::to_string)
            .collect();

        let mut scored: Vec<(usize, &CatalogExercise)> = self
            .exercises
            .iter()
            .filter(|ex| pattern.map_or(true, |p| p.matches(&normalize(&ex.name))))
            .map(|ex| {
                let name = normalize(&ex.name);
                let muscles = normalize(&ex.primary_muscles.join(" "));
                let equipment = normalize(ex.equipment.as_deref().unwrap_or(""));
                let score = words
                    .iter()
                    .map(|w| {
                        if name.contains(w.as_str()) {
                            2
                        } else if muscles.contains(w.as_str()) || equipment.contains(w.as_str()) {
                            1
                        } else {
                            0
                        }
                    })
                    .sum::<usize>();
                (score, ex)
            })
            .filter(|(score, _)| words.is_empty() || *score > 0)
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().take(k).map(|(_, ex)| ex).collect()
    }

    /// First match, preferring the earliest listed equipment that any match uses.
    pub fn best_candidate(
        &self,
        filter: &CatalogFilter,
        equipment_preference: &[String],
    ) -> Option<&CatalogExercise> {
        let candidates = self.filter(filter);
        for pref in equipment_preference {
            let pref = pref.to_lowercase();
            if let Some(hit) = candidates.iter().copied().find(|ex| {
                ex.equipment
                    .as_deref()
                    .is_some_and(|e| e.to_lowercase().contains(&pref))
            }) {
                return Some(hit);
            }
        }
        candidates.first().copied()
    }

    /// Replacement names for `original`: same movement pattern when known
    /// (otherwise sharing a word with the original), no avoid-term matches,
    /// no duplicates, preferred equipment first, at most `top_k`.
    pub fn substitution_candidates(
        &self,
        original: &str,
        pattern: Option<MovementPattern>,
        avoid_terms: &[String],
        equipment_preference: &[String],
        top_k: usize,
    ) -> Vec<String> {
        let include_keywords: Vec<String> = match pattern {
            Some(p) => p.keywords().iter().map(|k| k.to_string()).collect(),
            None => normalize(original)
                .split_whitespace()
                .filter(|w| w.len() >= 3)
                .map(str::to_string)
                .collect(),
        };
        let filter = CatalogFilter {
            include_keywords,
            exclude_keywords: avoid_terms.to_vec(),
            ..Default::default()
        };

        let original_lc = original.trim().to_lowercase();
        let mut seen: HashSet<String> = HashSet::new();
        let mut hits: Vec<&CatalogExercise> = self
            .filter(&filter)
            .into_iter()
            .filter(|ex| {
                let key = ex.name.trim().to_lowercase();
                !key.is_empty() && key != original_lc && seen.insert(key)
            })
            .collect();

        let preferred: Vec<String> = equipment_preference.iter().map(|e| e.to_lowercase()).collect();
        hits.sort_by_key(|ex| {
            let equipment = ex.equipment.as_deref().unwrap_or("").to_lowercase();
            !preferred.iter().any(|p| !equipment.is_empty() && equipment.contains(p))
        });

        hits.into_iter()
            .take(top_k)
            .map(|ex| ex.name.trim().to_string())
            .collect()
    }
}
