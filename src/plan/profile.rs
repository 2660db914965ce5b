// src/plan/profile.rs — User constraint profile and incremental patches

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::infra::errors::LiftError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingHistory {
    Beginner,
    Intermediate,
    Advanced,
}

/// Everything the planner knows about the athlete. Read-only for the
/// duration of one orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default = "default_goal")]
    pub goal: String,
    #[serde(default = "default_days_per_week")]
    pub days_per_week: u32,
    #[serde(default = "default_minutes_per_day")]
    pub minutes_per_day: u32,
    #[serde(default)]
    pub equipment_available: BTreeSet<String>,
    /// Raw user terms, e.g. "squats" or "overhead pressing".
    #[serde(default)]
    pub avoid_exercises: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_history: Option<TrainingHistory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_age_years: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f32>,
    /// Lift name to estimated one-rep max in kg.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub estimated_1rm: BTreeMap<String, f32>,
}

fn default_goal() -> String {
    "strength - squat focus".into()
}

fn default_days_per_week() -> u32 {
    4
}

fn default_minutes_per_day() -> u32 {
    60
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            goal: default_goal(),
            days_per_week: default_days_per_week(),
            minutes_per_day: default_minutes_per_day(),
            equipment_available: BTreeSet::new(),
            avoid_exercises: Vec::new(),
            training_history: None,
            training_age_years: None,
            sex: None,
            age: None,
            height_cm: None,
            weight_kg: None,
            estimated_1rm: BTreeMap::new(),
        }
    }
}

impl UserProfile {
    /// Reject budgets no plan can satisfy.
    pub fn validate(&self) -> Result<(), LiftError> {
        if self.days_per_week == 0 {
            return Err(LiftError::InvalidProfile(
                "days_per_week must be at least 1".into(),
            ));
        }
        if self.minutes_per_day == 0 {
            return Err(LiftError::InvalidProfile(
                "minutes_per_day must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Avoid terms trimmed and lowercased, blanks dropped.
    pub fn normalized_avoid_terms(&self) -> Vec<String> {
        self.avoid_exercises
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Partial profile produced by a conversational front end. Present fields
/// overwrite the base profile; absent fields leave it untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub days_per_week: Option<u32>,
    #[serde(default)]
    pub minutes_per_day: Option<u32>,
    #[serde(default)]
    pub equipment_available: Option<BTreeSet<String>>,
    #[serde(default)]
    pub avoid_exercises: Option<Vec<String>>,
    #[serde(default)]
    pub training_history: Option<TrainingHistory>,
    #[serde(default)]
    pub training_age_years: Option<f32>,
}

impl ProfilePatch {
    pub fn merge_into(&self, base: &UserProfile) -> UserProfile {
        let mut merged = base.clone();
        if let Some(goal) = self.goal.as_ref().filter(|g| !g.trim().is_empty()) {
            merged.goal = goal.trim().to_string();
        }
        if let Some(days) = self.days_per_week {
            merged.days_per_week = days;
        }
        if let Some(minutes) = self.minutes_per_day {
            merged.minutes_per_day = minutes;
        }
        if let Some(ref equipment) = self.equipment_available {
            merged.equipment_available = equipment.clone();
        }
        if let Some(ref avoid) = self.avoid_exercises {
            merged.avoid_exercises = avoid.clone();
        }
        if self.training_history.is_some() {
            merged.training_history = self.training_history;
        }
        if self.training_age_years.is_some() {
            merged.training_age_years = self.training_age_years;
        }
        merged
    }

    /// Overlay on the default profile and validate the result.
    pub fn resolve(&self) -> Result<UserProfile, LiftError> {
        let profile = self.merge_into(&UserProfile::default());
        profile.validate()?;
        Ok(profile)
    }
}

const MAX_FOLLOWUPS: usize = 3;

/// Clarifying questions worth asking before generating a plan.
pub fn followup_questions(profile: &UserProfile, patch: &ProfilePatch) -> Vec<String> {
    let mut questions = Vec::new();
    if profile.equipment_available.is_empty() && patch.equipment_available.is_none() {
        questions.push(
            "What equipment do you have access to (barbell, dumbbells, machines, bodyweight only)?"
                .to_string(),
        );
    }
    if profile.training_history.is_none() && patch.training_history.is_none() {
        questions.push(
            "How would you describe your training experience: beginner, intermediate or advanced?"
                .to_string(),
        );
    }
    if patch.days_per_week.is_none() {
        questions.push(format!(
            "How many days per week can you train? (assuming {})",
            profile.days_per_week
        ));
    }
    if patch.minutes_per_day.is_none() {
        questions.push(format!(
            "How long can each session be? (assuming {} minutes)",
            profile.minutes_per_day
        ));
    }
    questions.truncate(MAX_FOLLOWUPS);
    questions
}
