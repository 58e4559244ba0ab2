//! Error module for the presynaptic sequence library.
use std::error::Error;
use std::fmt;

/// Error types for the library.
#[derive(Debug, PartialEq)]
pub enum SeqError {
    /// Error for invalid parameters, e.g., negative rates or a mixing coefficient outside [0, 1].
    InvalidParameter(String),
    /// Error for invalid spike times, e.g., NaN values or rows violating the padding layout.
    InvalidSpikeTimes(String),
    /// Error for incompatible ensembles, e.g., different number of synapses.
    IncompatibleEnsembles(String),
    /// Error for synapse pools that cannot be split into the requested number of groups.
    GroupMismatch {
        num_synapses: usize,
        num_groups: usize,
        remainder: usize,
    },
    /// Error for a rejection sampling envelope that does not dominate the rate function.
    AcceptanceViolation { time: f64, ratio: f64 },
}

impl fmt::Display for SeqError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SeqError::InvalidParameter(e) => write!(f, "Invalid parameters: {}", e),
            SeqError::InvalidSpikeTimes(e) => write!(f, "Invalid spike times: {}", e),
            SeqError::IncompatibleEnsembles(e) => write!(f, "Incompatible ensembles: {}", e),
            SeqError::GroupMismatch {
                num_synapses,
                num_groups,
                remainder,
            } => write!(
                f,
                "Cannot split {} synapses into {} groups: {} remaining synapses exceed the number of groups",
                num_synapses, num_groups, remainder
            ),
            SeqError::AcceptanceViolation { time, ratio } => write!(
                f,
                "Rejection sampling envelope violated at t={}: acceptance ratio {} exceeds 1",
                time, ratio
            ),
        }
    }
}

impl Error for SeqError {}
