// src/plan/mod.rs — Plan data model: profile, plan tree, lenient parsing

pub mod parser;
pub mod profile;
pub mod types;

pub use profile::{followup_questions, ProfilePatch, TrainingHistory, UserProfile};
pub use types::{PlanMetadata, WorkoutBlock, WorkoutDay, WorkoutExercise, WorkoutPlan};
