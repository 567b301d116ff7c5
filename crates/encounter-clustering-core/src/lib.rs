//! Encounter Clustering Core Library
//!
//! In-memory clustering engine for a contact-tracing simulation. A stream of
//! anonymized encounter and risk-update messages is grouped into clusters,
//! each hypothesizing one real counterpart, and each carrying an aggregated
//! risk estimate consumed by downstream risk inference.
//!
//! The engine is deliberately simplistic: messages join a cluster only on an
//! exact signature match (uid, risk level, encounter tick), attribution is
//! best-effort, and the per-message cost is a linear scan over the cluster
//! set. Evaluation-only diagnostics (homogeneity, cluster count error)
//! measure how badly the naive signature confuses distinct counterparts.
//!
//! # Architecture
//!
//! This crate defines:
//! - Message types and the kind-resolved [`message::GenericMessage`] enum
//! - The [`clustering::SimpleCluster`] entity and its fit operations
//! - The [`clustering::SimplisticClusterManager`] routing, export and
//!   diagnostics layer
//! - Error types and result aliases
//!
//! # Example
//!
//! ```
//! use encounter_clustering_core::clustering::SimplisticClusterManager;
//! use encounter_clustering_core::message::{EncounterMessage, UpdateMessage};
//!
//! let mut manager = SimplisticClusterManager::with_defaults().unwrap();
//!
//! manager.add_encounter(EncounterMessage::new(5, 2, 100)).unwrap();
//! manager.add_update(UpdateMessage::new(5, 2, 4, 100, 130)).unwrap();
//!
//! assert_eq!(manager.cluster_count(), 1);
//! assert_eq!(manager.clusters()[0].risk_level, 4);
//! ```

pub mod clustering;
pub mod error;
pub mod message;
pub mod types;

// Re-exports for convenience
pub use clustering::{
    manager_defaults, ManagerParams, SimpleCluster, SimplisticClusterManager, TieBreakStrategy,
};
pub use error::{ClusteringError, ClusteringResult};
pub use message::{EncounterMessage, GenericMessage, UpdateMessage};
