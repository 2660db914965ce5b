// src/oracle/templates.rs — Local plan templates for bootstrapping a run
//
// A directory of JSON program templates. Selection is keyword and day-count
// matching; a selected template maps onto a `WorkoutPlan` sized to the
// profile's training days.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::infra::errors::LiftError;
use crate::plan::{UserProfile, WorkoutBlock, WorkoutDay, WorkoutExercise, WorkoutPlan};

const DEFAULT_REST_SECONDS: u32 = 90;
const DEFAULT_SETS: u32 = 3;
const DEFAULT_REPS: &str = "8-12";
const TEMPLATE_BLOCK: &str = "Workout";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateExercise {
    #[serde(default)]
    pub name: Option<String>,
    /// Number or range string such as "3-4".
    #[serde(default)]
    pub sets: Option<Value>,
    #[serde(default)]
    pub reps: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDay {
    pub name: String,
    #[serde(default)]
    pub muscle_groups: Option<String>,
    #[serde(default)]
    pub exercises: Vec<TemplateExercise>,
}

impl TemplateDay {
    fn is_rest_day(&self) -> bool {
        self.muscle_groups
            .as_deref()
            .is_some_and(|m| m.to_lowercase().contains("rest"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTemplate {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub days_per_week: Option<u32>,
    #[serde(default)]
    pub equipment_required: Vec<String>,
    /// Free text such as "2-3 minutes between sets".
    #[serde(default)]
    pub rest_periods: Option<String>,
    #[serde(default)]
    pub schedule: Vec<TemplateDay>,
}

impl PlanTemplate {
    /// Lowercased text used for keyword matching.
    fn search_text(&self) -> String {
        let mut parts: Vec<&str> = vec![self.title.as_str()];
        parts.extend(self.goal.as_deref());
        parts.extend(self.description.as_deref());
        for day in &self.schedule {
            parts.extend(day.muscle_groups.as_deref());
            parts.extend(day.exercises.iter().filter_map(|e| e.name.as_deref()));
        }
        parts.join(" ").to_lowercase()
    }

    fn keyword_score(&self, words: &[String]) -> usize {
        let text = self.search_text();
        words.iter().filter(|w| text.contains(w.as_str())).count()
    }

    /// True when the athlete owns at least one listed item, or nothing is listed.
    fn equipment_fits(&self, available: &BTreeSet<String>) -> bool {
        if available.is_empty() || self.equipment_required.is_empty() {
            return true;
        }
        let have: BTreeSet<String> = available.iter().flat_map(|e| plural_forms(e)).collect();
        self.equipment_required
            .iter()
            .any(|e| plural_forms(e).iter().any(|f| have.contains(f)))
    }

    /// Map onto a plan with `profile.days_per_week` days. Rest days and days
    /// without exercises are skipped; the remaining days are trimmed, or
    /// cycled with a " (2)", " (3)" suffix when the template has too few.
    pub fn to_plan(&self, profile: &UserProfile) -> WorkoutPlan {
        let rest = parse_rest_seconds(self.rest_periods.as_deref());

        let training: Vec<Arc<WorkoutDay>> = self
            .schedule
            .iter()
            .filter(|d| !d.is_rest_day() && !d.exercises.is_empty())
            .map(|d| {
                let exercises = d
                    .exercises
                    .iter()
                    .map(|e| {
                        WorkoutExercise::new(
                            e.name
                                .as_deref()
                                .filter(|n| !n.trim().is_empty())
                                .unwrap_or("Exercise"),
                            parse_sets(e.sets.as_ref()),
                            parse_reps(e.reps.as_ref()),
                        )
                        .with_rest(rest)
                    })
                    .collect();
                Arc::new(WorkoutDay::new(
                    d.name.clone(),
                    d.muscle_groups.as_deref(),
                    vec![WorkoutBlock::new(TEMPLATE_BLOCK, exercises)],
                ))
            })
            .collect();

        let desired = profile.days_per_week.max(1) as usize;
        let days: Vec<Arc<WorkoutDay>> = if training.is_empty() {
            Vec::new()
        } else {
            (0..desired)
                .map(|i| {
                    let src = &training[i % training.len()];
                    let round = i / training.len() + 1;
                    if round == 1 {
                        src.clone()
                    } else {
                        let mut copy = WorkoutDay::clone(src);
                        copy.name = format!("{} ({round})", src.name);
                        Arc::new(copy)
                    }
                })
                .collect()
        };

        let mut plan = WorkoutPlan {
            days,
            ..Default::default()
        };
        plan.metadata
            .append_note("notes", &format!("Derived from template: {}", self.title));
        if let Some(ref url) = self.url {
            plan.metadata.set("source_url", url.clone());
        }
        plan.metadata.set("template_days", training.len());
        plan.metadata.set("from_template", true);
        plan
    }
}

fn plural_forms(item: &str) -> Vec<String> {
    let item = item.trim().to_lowercase();
    let other = match item.strip_suffix('s') {
        Some(singular) => singular.to_string(),
        None => format!("{item}s"),
    };
    vec![item, other]
}

/// Mean of the numbers in `text`, in seconds. Values are minutes when the
/// text mentions minutes. Blank or number-free text gives the default.
pub fn parse_rest_seconds(text: Option<&str>) -> u32 {
    let text = text.unwrap_or("").to_lowercase();
    let numbers: Vec<f64> = text
        .split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .filter_map(|t| t.trim_matches('.').parse::<f64>().ok())
        .collect();
    if numbers.is_empty() {
        return DEFAULT_REST_SECONDS;
    }
    let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
    let seconds = if text.contains("minute") { mean * 60.0 } else { mean };
    seconds as u32
}

/// Lower bound of a set count or range, never below one.
fn parse_sets(value: Option<&Value>) -> u32 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_u64().map(|n| n as u32),
        Some(Value::String(s)) => s.split('-').next().and_then(|s| s.trim().parse().ok()),
        _ => None,
    };
    parsed.unwrap_or(DEFAULT_SETS).max(1)
}

fn parse_reps(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => DEFAULT_REPS.to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: Vec<PlanTemplate>,
}

impl TemplateLibrary {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_templates(templates: Vec<PlanTemplate>) -> Self {
        Self { templates }
    }

    /// Load every `*.json` file in `dir`, in file name order. Files that do
    /// not parse as a template are skipped with a warning.
    pub fn load_dir(dir: &Path) -> Result<Self, LiftError> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut templates = Vec::with_capacity(paths.len());
        for path in paths {
            let content = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<PlanTemplate>(&content) {
                Ok(t) => templates.push(t),
                Err(e) => tracing::warn!(path = %path.display(), "skipping template: {e}"),
            }
        }
        tracing::debug!(dir = %dir.display(), templates = templates.len(), "loaded plan templates");
        Ok(Self { templates })
    }

    /// Load from `dir`, or an empty library when the directory is absent.
    pub fn load_or_empty(dir: &Path) -> Result<Self, LiftError> {
        if dir.is_dir() {
            Self::load_dir(dir)
        } else {
            tracing::warn!(dir = %dir.display(), "template directory not found, bootstrap disabled");
            Ok(Self::empty())
        }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Templates that fit the equipment and sit within one day of `days`,
    /// closest day count first, then most query words matched.
    pub fn search(
        &self,
        query: &str,
        days: Option<u32>,
        equipment: &BTreeSet<String>,
        top_k: usize,
    ) -> Vec<&PlanTemplate> {
        let words: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .filter(|w| w.len() >= 3)
            .map(str::to_string)
            .collect();

        let mut hits: Vec<(u32, usize, &PlanTemplate)> = self
            .templates
            .iter()
            .filter(|t| t.equipment_fits(equipment))
            .filter_map(|t| {
                let gap = match (days, t.days_per_week) {
                    (None, _) => 0,
                    (Some(want), Some(have)) => want.abs_diff(have),
                    (Some(_), None) => return None,
                };
                (gap <= 1).then(|| (gap, t.keyword_score(&words), t))
            })
            .collect();

        hits.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
        hits.into_iter().take(top_k).map(|(_, _, t)| t).collect()
    }

    /// Best template for `profile`, matched on its goal and training days.
    pub fn best_for(&self, profile: &UserProfile) -> Option<&PlanTemplate> {
        self.search(
            &profile.goal,
            Some(profile.days_per_week),
            &profile.equipment_available,
            1,
        )
        .into_iter()
        .next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template(value: Value) -> PlanTemplate {
        serde_json::from_value(value).unwrap()
    }

    fn upper_lower() -> PlanTemplate {
        template(json!({
            "title": "Upper Lower Strength",
            "url": "https://example.org/upper-lower",
            "goal": "build strength",
            "days_per_week": 4,
            "equipment_required": ["barbell", "bench"],
            "rest_periods": "2-3 minutes",
            "schedule": [
                {"name": "Monday", "muscle_groups": "Lower", "exercises": [
                    {"name": "Back Squat", "sets": "3-4", "reps": "5"},
                    {"name": "Romanian Deadlift", "sets": 3, "reps": 8}
                ]},
                {"name": "Tuesday", "muscle_groups": "Rest", "exercises": []},
                {"name": "Wednesday", "muscle_groups": "Upper", "exercises": [
                    {"name": "Bench Press", "sets": "4"},
                    {"sets": 3, "reps": "10"}
                ]}
            ]
        }))
    }

    fn full_body() -> PlanTemplate {
        template(json!({
            "title": "Full Body Hypertrophy",
            "goal": "build muscle",
            "days_per_week": 3,
            "equipment_required": ["dumbbells"],
            "schedule": [
                {"name": "Day A", "exercises": [{"name": "Goblet Squat", "sets": 3, "reps": "12"}]}
            ]
        }))
    }

    #[test]
    fn test_to_plan_skips_rest_and_cycles_days() {
        let profile = UserProfile {
            days_per_week: 3,
            ..Default::default()
        };
        let plan = upper_lower().to_plan(&profile);

        let names: Vec<&str> = plan.days.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Monday", "Wednesday", "Monday (2)"]);
        assert_eq!(plan.days[0].focus.as_deref(), Some("Lower"));
        assert_eq!(plan.days[2].blocks, plan.days[0].blocks);

        let squat = plan.exercise(0, 0, 0).unwrap();
        assert_eq!((squat.sets, squat.reps.as_str()), (3, "5"));
        assert_eq!(squat.rest_seconds, Some(150));
        assert_eq!(plan.exercise(0, 0, 1).unwrap().reps, "8");
        let unnamed = plan.exercise(1, 0, 1).unwrap();
        assert_eq!(unnamed.name, "Exercise");
        assert_eq!(plan.exercise(1, 0, 0).unwrap().reps, DEFAULT_REPS);

        assert_eq!(plan.metadata.get_u64("template_days"), Some(2));
        assert!(plan.metadata.flag("from_template"));
        assert_eq!(
            plan.metadata.get_str("notes"),
            Some("Derived from template: Upper Lower Strength")
        );
        assert_eq!(
            plan.metadata.get_str("source_url"),
            Some("https://example.org/upper-lower")
        );
    }

    #[test]
    fn test_to_plan_trims_extra_days() {
        let profile = UserProfile {
            days_per_week: 1,
            ..Default::default()
        };
        let plan = upper_lower().to_plan(&profile);
        assert_eq!(plan.day_count(), 1);
        assert_eq!(plan.days[0].name, "Monday");
    }

    #[test]
    fn test_rest_parsing() {
        assert_eq!(parse_rest_seconds(None), 90);
        assert_eq!(parse_rest_seconds(Some("as needed")), 90);
        assert_eq!(parse_rest_seconds(Some("60-120 seconds")), 90);
        assert_eq!(parse_rest_seconds(Some("1.5 minutes")), 90);
        assert_eq!(parse_rest_seconds(Some("2-3 minutes")), 150);
    }

    #[test]
    fn test_sets_never_below_one() {
        assert_eq!(parse_sets(Some(&json!(0))), 1);
        assert_eq!(parse_sets(Some(&json!("many"))), DEFAULT_SETS);
        assert_eq!(parse_sets(None), DEFAULT_SETS);
    }

    #[test]
    fn test_search_filters_equipment_and_days() {
        let lib = TemplateLibrary::from_templates(vec![upper_lower(), full_body()]);
        let barbell: BTreeSet<String> = ["barbells".to_string()].into_iter().collect();
        let dumbbell: BTreeSet<String> = ["dumbbell".to_string()].into_iter().collect();

        let hits = lib.search("strength", Some(4), &barbell, 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Upper Lower Strength");

        let hits = lib.search("strength", Some(3), &dumbbell, 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Full Body Hypertrophy");

        assert!(lib.search("strength", Some(6), &BTreeSet::new(), 5).is_empty());
    }

    #[test]
    fn test_search_orders_by_day_gap_then_keywords() {
        let lib = TemplateLibrary::from_templates(vec![upper_lower(), full_body()]);
        let titles = |hits: Vec<&PlanTemplate>| {
            hits.iter().map(|t| t.title.clone()).collect::<Vec<_>>()
        };

        // Both sit within one day of 3; the exact match wins despite fewer keyword hits.
        let hits = lib.search("strength squat", Some(3), &BTreeSet::new(), 5);
        assert_eq!(titles(hits), vec!["Full Body Hypertrophy", "Upper Lower Strength"]);

        let hits = lib.search("strength", None, &BTreeSet::new(), 5);
        assert_eq!(titles(hits), vec!["Upper Lower Strength", "Full Body Hypertrophy"]);
    }

    #[test]
    fn test_best_for_profile() {
        let lib = TemplateLibrary::from_templates(vec![upper_lower(), full_body()]);
        let profile = UserProfile {
            goal: "build strength".into(),
            days_per_week: 4,
            ..Default::default()
        };
        assert_eq!(lib.best_for(&profile).unwrap().title, "Upper Lower Strength");
        assert!(TemplateLibrary::empty().best_for(&profile).is_none());
    }

    #[test]
    fn test_load_dir_skips_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("b_full_body.json"),
            serde_json::to_string(&full_body()).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("a_upper_lower.json"),
            serde_json::to_string(&upper_lower()).unwrap(),
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.json"), "{\"title\": ").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a template").unwrap();

        let lib = TemplateLibrary::load_dir(dir.path()).unwrap();
        assert_eq!(lib.len(), 2);
        assert_eq!(lib.templates[0].title, "Upper Lower Strength");

        let missing = TemplateLibrary::load_or_empty(&dir.path().join("nope")).unwrap();
        assert!(missing.is_empty());
    }
}
