//! Error types for clustering operations.

use thiserror::Error;

use crate::types::{Timestamp, Uid};

/// Result alias for clustering operations.
pub type ClusteringResult<T> = Result<T, ClusteringError>;

/// Errors that can occur during clustering operations.
#[derive(Debug, Error)]
pub enum ClusteringError {
    /// An update message referenced an encounter that no cluster ever
    /// observed, while the manager runs under the strict orphan policy.
    ///
    /// This is fatal to the caller: the surrounding simulation guarantees
    /// that every update follows a previously sent encounter, so an orphan
    /// means that guarantee was broken upstream. There is no local recovery.
    #[error("no cluster match for update: uid {uid}, encounter_time {encounter_time}")]
    OrphanUpdate {
        /// Anonymized uid carried by the orphaned update
        uid: Uid,
        /// Encounter time carried by the orphaned update
        encounter_time: Timestamp,
    },

    /// Invalid parameter provided.
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of what's wrong with the parameter
        message: String,
    },
}

impl ClusteringError {
    /// Create an OrphanUpdate error.
    pub fn orphan_update(uid: Uid, encounter_time: Timestamp) -> Self {
        Self::OrphanUpdate {
            uid,
            encounter_time,
        }
    }

    /// Create an InvalidParameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }
}
