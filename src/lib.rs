// src/lib.rs — Library root for liftloop

pub mod api;
pub mod cli;
pub mod core;
pub mod edits;
pub mod infra;
pub mod oracle;
pub mod plan;
pub mod provider;
pub mod util;
pub mod verifier;
