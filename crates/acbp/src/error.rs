//! Errors raised while building a policy from a model document.

use acbp_config::ConfigError;
use acbp_core::CompileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    /// The document could not be read or parsed
    #[error("Model document error: {0}")]
    Document(#[from] ConfigError),

    /// The parsed model was rejected
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),
}
