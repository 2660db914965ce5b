// src/cli/exercises.rs — `liftloop exercises`: browse the local exercise catalog

use crate::infra::config::Config;
use crate::infra::paths;
use crate::oracle::{CatalogExercise, ExerciseCatalog};
use crate::verifier::MovementPattern;

/// Catalog search with a pattern name as typed by a user.
pub fn search_catalog(
    catalog: &ExerciseCatalog,
    query: &str,
    pattern: Option<&str>,
    k: usize,
) -> anyhow::Result<Vec<CatalogExercise>> {
    let pattern = match pattern {
        Some(name) => Some(MovementPattern::parse(name).ok_or_else(|| {
            anyhow::anyhow!("unknown movement pattern '{name}' (expected squat, hinge, push or pull)")
        })?),
        None => None,
    };
    Ok(catalog
        .search(query, pattern, k)
        .into_iter()
        .cloned()
        .collect())
}

pub fn run_exercises(
    config: &Config,
    query: &str,
    pattern: Option<&str>,
    k: usize,
) -> anyhow::Result<()> {
    let catalog = ExerciseCatalog::load_or_empty(&paths::resolve_data_file(&config.data.exercises))?;
    let results = search_catalog(&catalog, query, pattern, k)?;
    tracing::debug!(query, results = results.len(), "catalog search");
    super::write_json(&serde_json::json!({ "results": results }), None)
}
