// src/core/mod.rs — Refinement loop

pub mod orchestrator;
pub mod types;

pub use orchestrator::{Oracles, Orchestrator};
pub use types::{OrchestrationConfig, PlanEnvelope, ProgressEvent, StopReason};
