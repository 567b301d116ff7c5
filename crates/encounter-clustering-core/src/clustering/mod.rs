//! Clustering of anonymized contact-tracing messages.
//!
//! Groups encounter and update messages into clusters, each hypothesizing
//! one real counterpart, using exact-signature matching with configurable
//! tie-breaking.
//!
//! # Key Types
//!
//! - [`SimpleCluster`]: an ordered bag of encounters sharing one hypothesized
//!   counterpart, with a rounded-mean aggregate risk
//! - [`SimplisticClusterManager`]: match-or-create routing, exports and
//!   offline diagnostics
//! - [`ManagerParams`]: retention window, orphan policy and export mode
//! - [`TieBreakStrategy`]: deterministic first-match or seeded uniform choice

pub mod cluster;
pub mod manager;
pub mod tie_break;

pub use cluster::SimpleCluster;
pub use manager::{
    manager_defaults, ManagerParams, SimplisticClusterManager, DEFAULT_MAX_HISTORY_TICKS_OFFSET,
};
pub use tie_break::TieBreakStrategy;
