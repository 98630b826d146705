//! Elimination module - the recursive feature elimination loop

mod orchestrator;

use thiserror::Error;

pub use orchestrator::RecursiveEliminator;

/// Failures raised by the elimination loop itself.
///
/// Collaborator failures (a cross-validation engine or model builder
/// erroring out) are not wrapped here; they propagate to the caller with
/// their originating cause attached and abort the run. Partial progress
/// from earlier rounds is never rolled back.
#[derive(Debug, Error)]
pub enum EliminationError {
    /// Invalid `iterations` or `removal_fraction`; rejected before the
    /// loop starts.
    #[error("invalid elimination configuration: {0}")]
    Configuration(String),

    /// The primary loss name is missing from the registry or from a
    /// returned loss record. Fatal: ranking is impossible without the key.
    #[error("primary loss function '{0}' not found in cross-validation results")]
    LossFunctionNotFound(String),
}
