use thiserror::Error;

#[derive(Debug, Error)]
pub enum TsgError {
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    Dimension { expected: usize, got: usize },

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("No convergence after {iterations} iterations: {message}")]
    Convergence { iterations: usize, message: String },

    #[error("Unsupported combination: {0}")]
    Unsupported(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl TsgError {
    /// Shorthand for a length check on a flat dof or sample vector.
    pub fn check_len(expected: usize, got: usize) -> Result<()> {
        if expected == got {
            Ok(())
        } else {
            Err(TsgError::Dimension { expected, got })
        }
    }
}

pub type Result<T> = std::result::Result<T, TsgError>;
