//! SimplisticClusterManager: match-or-create routing of encounter and update
//! messages into clusters.
//!
//! This manager implements a deliberately naive clustering strategy: an
//! incoming message joins a cluster only on an exact signature match
//! (uid, risk level, encounter tick), otherwise it seeds a new cluster.
//! Updates can make a cluster's signature drift into another cluster's, so
//! several clusters may match one message; a [`TieBreakStrategy`] decides
//! which one wins. There is no global assignment optimization of any kind.
//!
//! Every ingestion call is an atomic match-or-create step over a linear scan
//! of the current cluster set, an explicit O(cluster count) cost per message.
//!
//! # Thread Safety
//!
//! This type is NOT thread-safe. For concurrent access, wrap in
//! `Arc<RwLock<SimplisticClusterManager>>`.
//!
//! # Usage
//!
//! ```
//! use encounter_clustering_core::clustering::{manager_defaults, SimplisticClusterManager};
//! use encounter_clustering_core::message::EncounterMessage;
//!
//! let mut manager = SimplisticClusterManager::with_defaults().unwrap();
//! manager.add_encounter(EncounterMessage::new(5, 2, 100)).unwrap();
//! assert_eq!(manager.cluster_count(), 1);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{ClusteringError, ClusteringResult};
use crate::message::{EncounterMessage, GenericMessage, UpdateMessage};
use crate::types::{RealUserId, TimeOffset, Timestamp};

use super::cluster::SimpleCluster;
use super::tie_break::TieBreakStrategy;

// =============================================================================
// Constants
// =============================================================================

/// Default retention window: one tick per second, 14 days.
pub const DEFAULT_MAX_HISTORY_TICKS_OFFSET: TimeOffset = 24 * 60 * 60 * 14;

// =============================================================================
// ManagerParams
// =============================================================================

/// Configuration parameters for [`SimplisticClusterManager`].
///
/// # Example
///
/// ```
/// use encounter_clustering_core::clustering::manager_defaults;
///
/// let params = manager_defaults().with_orphan_updates_as_clusters(true);
/// assert!(params.add_orphan_updates_as_clusters);
/// ```
#[derive(Debug, Clone)]
pub struct ManagerParams {
    /// Retention window in ticks; messages older than this relative to the
    /// most recent tick seen are silently dropped.
    pub max_history_ticks_offset: TimeOffset,

    /// Whether an update matching no cluster seeds a new singleton cluster
    /// (permissive) or surfaces a fatal error (strict).
    pub add_orphan_updates_as_clusters: bool,

    /// Whether exports produce one row per message grouped by encounter tick
    /// (timestamp-aligned) or one row per cluster in creation order.
    pub generate_embeddings_by_timestamp: bool,
}

impl Default for ManagerParams {
    fn default() -> Self {
        Self {
            max_history_ticks_offset: DEFAULT_MAX_HISTORY_TICKS_OFFSET,
            add_orphan_updates_as_clusters: false,
            generate_embeddings_by_timestamp: true,
        }
    }
}

impl ManagerParams {
    /// Validate parameters.
    ///
    /// # Errors
    ///
    /// Returns `ClusteringError::InvalidParameter` if any parameters are invalid.
    pub fn validate(&self) -> Result<(), ClusteringError> {
        if self.max_history_ticks_offset <= 0 {
            return Err(ClusteringError::invalid_parameter(
                "max_history_ticks_offset must be > 0; the retention window needs a positive span",
            ));
        }
        Ok(())
    }

    /// Set the retention window in ticks.
    #[must_use]
    pub fn with_max_history_ticks_offset(mut self, offset: TimeOffset) -> Self {
        self.max_history_ticks_offset = offset;
        self
    }

    /// Set the orphan-update policy.
    #[must_use]
    pub fn with_orphan_updates_as_clusters(mut self, enabled: bool) -> Self {
        self.add_orphan_updates_as_clusters = enabled;
        self
    }

    /// Set the export mode.
    #[must_use]
    pub fn with_embeddings_by_timestamp(mut self, enabled: bool) -> Self {
        self.generate_embeddings_by_timestamp = enabled;
        self
    }
}

/// Get default manager parameters.
pub fn manager_defaults() -> ManagerParams {
    ManagerParams::default()
}

// =============================================================================
// SimplisticClusterManager
// =============================================================================

/// Manages message cluster creation and updates.
///
/// Encounters are only combined on exact signature matches, so clusters never
/// hold messages with different encounter ticks, and update messages can
/// never split a cluster apart. The manager exclusively owns its clusters;
/// match correctness depends on exact field equality at comparison time, so
/// nothing else may mutate a cluster's message list.
#[derive(Debug)]
pub struct SimplisticClusterManager {
    /// Configuration parameters.
    params: ManagerParams,

    /// All live clusters, in creation order.
    clusters: Vec<SimpleCluster>,

    /// Most recent encounter tick seen; anchors the retention window and the
    /// export-time offsets.
    latest_refresh_timestamp: Timestamp,

    /// Tie-breaking policy among signature-equal clusters.
    tie_break: TieBreakStrategy,
}

impl SimplisticClusterManager {
    /// Create a new manager with specified parameters and tie-break strategy.
    ///
    /// # Errors
    ///
    /// Returns `ClusteringError::InvalidParameter` if parameters are invalid.
    ///
    /// # Example
    ///
    /// ```
    /// use encounter_clustering_core::clustering::{
    ///     manager_defaults, SimplisticClusterManager, TieBreakStrategy,
    /// };
    ///
    /// let manager =
    ///     SimplisticClusterManager::new(manager_defaults(), TieBreakStrategy::seeded(42)).unwrap();
    /// assert_eq!(manager.cluster_count(), 0);
    /// ```
    pub fn new(params: ManagerParams, tie_break: TieBreakStrategy) -> ClusteringResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            clusters: Vec::new(),
            latest_refresh_timestamp: 0,
            tie_break,
        })
    }

    /// Create a manager with default parameters and deterministic tie-breaking.
    ///
    /// # Errors
    ///
    /// Returns error if default parameter initialization fails.
    pub fn with_defaults() -> ClusteringResult<Self> {
        Self::new(manager_defaults(), TieBreakStrategy::default())
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Route a kind-resolved message to the matching ingestion entry point.
    ///
    /// # Errors
    ///
    /// Propagates `ClusteringError::OrphanUpdate` from [`Self::add_update`].
    pub fn add_message(&mut self, message: GenericMessage) -> ClusteringResult<()> {
        match message {
            GenericMessage::Encounter(m) => self.add_encounter(m),
            GenericMessage::Update(m) => self.add_update(m),
        }
    }

    /// Fit an encounter message to an existing cluster or create a new
    /// cluster to own it.
    ///
    /// Messages older than the retention window are dropped silently. The
    /// signature compared is `(cluster_id, risk_level, first_update_time)`
    /// against `(uid, risk_level, encounter_time)`.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` keeps the signature symmetric with
    /// [`Self::add_update`] so dispatchers handle both uniformly.
    pub fn add_encounter(&mut self, message: EncounterMessage) -> ClusteringResult<()> {
        if self.message_outdated(message.encounter_time, true) {
            tracing::trace!(uid = message.uid, "dropping outdated encounter");
            return Ok(());
        }
        // exact signature match or nothing; the deterministic strategy stops
        // at the first hit, the random one collects every collision
        let mut matched: Vec<usize> = Vec::new();
        for (idx, cluster) in self.clusters.iter().enumerate() {
            if cluster.cluster_id == message.uid
                && cluster.risk_level == message.risk_level
                && cluster.first_update_time == message.encounter_time
            {
                matched.push(idx);
                if !self.tie_break.is_exhaustive() {
                    break;
                }
            }
        }
        if matched.is_empty() {
            tracing::debug!(
                uid = message.uid,
                encounter_time = message.encounter_time,
                "creating cluster for unmatched encounter"
            );
            self.clusters
                .push(SimpleCluster::from_message(&GenericMessage::Encounter(message)));
        } else {
            // several matches happen when updates made one cluster's
            // signature drift into another's; the winner is picked blindly
            let chosen = matched[self.tie_break.choose(matched.len())];
            self.clusters[chosen].fit_encounter(message);
        }
        Ok(())
    }

    /// Fit an update message to an existing cluster.
    ///
    /// A cluster is a candidate when its `(cluster_id, first_update_time)`
    /// equals the update's `(uid, encounter_time)` and it holds at least one
    /// encounter at the update's old risk level. Ties break per the
    /// configured strategy.
    ///
    /// # Errors
    ///
    /// Returns `ClusteringError::OrphanUpdate` when no cluster matches and
    /// the strict orphan policy is active.
    pub fn add_update(&mut self, message: UpdateMessage) -> ClusteringResult<()> {
        if self.message_outdated(message.encounter_time, true) {
            tracing::trace!(uid = message.uid, "dropping outdated update");
            return Ok(());
        }
        let mut matched: Vec<usize> = Vec::new();
        for (idx, cluster) in self.clusters.iter().enumerate() {
            if cluster.cluster_id == message.uid
                && cluster.first_update_time == message.encounter_time
                && cluster
                    .messages
                    .iter()
                    .any(|m| m.risk_level == message.old_risk_level)
            {
                matched.push(idx);
                if !self.tie_break.is_exhaustive() {
                    break;
                }
            }
        }
        if matched.is_empty() {
            if self.params.add_orphan_updates_as_clusters {
                tracing::debug!(
                    uid = message.uid,
                    encounter_time = message.encounter_time,
                    "seeding cluster from orphan update"
                );
                self.clusters
                    .push(SimpleCluster::from_message(&GenericMessage::Update(message)));
                return Ok(());
            }
            return Err(ClusteringError::orphan_update(
                message.uid,
                message.encounter_time,
            ));
        }
        let chosen = matched[self.tie_break.choose(matched.len())];
        // the candidate check above guarantees an applicable encounter, so
        // the update is always consumed here
        self.clusters[chosen].fit_update(message);
        Ok(())
    }

    /// Retention predicate over the window anchored at the most recent tick.
    ///
    /// When the message survives the check and `cleanup` is set, the anchor
    /// advances to the message's tick if newer.
    fn message_outdated(&mut self, encounter_time: Timestamp, cleanup: bool) -> bool {
        let horizon = self
            .latest_refresh_timestamp
            .saturating_sub(self.params.max_history_ticks_offset);
        if encounter_time < horizon {
            return true;
        }
        if cleanup {
            self.latest_refresh_timestamp = self.latest_refresh_timestamp.max(encounter_time);
        }
        false
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Returns the embeddings array for all clusters managed by this object.
    ///
    /// In timestamp-aligned mode (the default), each cluster's embedding is
    /// computed once (with its cluster id, at the most recent tick seen) and
    /// emitted once *per member message*, grouped by the message's own
    /// encounter tick in ascending order, preserving insertion order within a
    /// group. This yields one row per message, alignable with parallel
    /// per-tick feature streams.
    ///
    /// In cluster mode, there is exactly one row per cluster (without the
    /// cluster id), in creation order.
    pub fn export_embeddings(&self) -> Vec<Vec<i64>> {
        if self.params.generate_embeddings_by_timestamp {
            let mut by_timestamp: BTreeMap<Timestamp, Vec<Vec<i64>>> = BTreeMap::new();
            for cluster in &self.clusters {
                let embed = cluster.embedding(self.latest_refresh_timestamp, true);
                for message in &cluster.messages {
                    by_timestamp
                        .entry(message.encounter_time)
                        .or_default()
                        .push(embed.clone());
                }
            }
            by_timestamp.into_values().flatten().collect()
        } else {
            self.clusters
                .iter()
                .map(|c| c.embedding(self.latest_refresh_timestamp, false))
                .collect()
        }
    }

    /// Returns the expositions array for all clusters managed by this object.
    ///
    /// Mirrors the mode branching of [`Self::export_embeddings`] with the
    /// cluster exposure flag as payload. Evaluation only; the flag derives
    /// from hidden ground truth.
    pub fn export_expositions(&self) -> Vec<bool> {
        if self.params.generate_embeddings_by_timestamp {
            let mut by_timestamp: BTreeMap<Timestamp, Vec<bool>> = BTreeMap::new();
            for cluster in &self.clusters {
                let flag = cluster.exposure_flag();
                for message in &cluster.messages {
                    by_timestamp
                        .entry(message.encounter_time)
                        .or_default()
                        .push(flag);
                }
            }
            by_timestamp.into_values().flatten().collect()
        } else {
            self.clusters.iter().map(SimpleCluster::exposure_flag).collect()
        }
    }

    // =========================================================================
    // Offline diagnostics
    // =========================================================================

    /// Returns the homogeneity score for each real user seen in the clusters.
    ///
    /// The score for a user is the number of true encounters involving that
    /// user divided by the total number of encounters attributed to that user
    /// via clustering, i.e. the summed size of every cluster holding at least
    /// one of their messages. A score of 1.0 means the user only ever landed
    /// in clusters containing exclusively their own encounters; it says
    /// nothing about how many extra clusters were created.
    ///
    /// Requires ground-truth sender ids, so this is only meaningful with
    /// simulator data.
    pub fn homogeneity_scores(&self) -> HashMap<RealUserId, f64> {
        let mut true_counts: HashMap<RealUserId, usize> = HashMap::new();
        let mut total_counts: HashMap<RealUserId, usize> = HashMap::new();
        for cluster in &self.clusters {
            let mut cluster_users: HashSet<RealUserId> = HashSet::new();
            for message in &cluster.messages {
                *true_counts.entry(message.real_sender_id).or_insert(0) += 1;
                cluster_users.insert(message.real_sender_id);
            }
            for user in cluster_users {
                *total_counts.entry(user).or_insert(0) += cluster.messages.len();
            }
        }
        true_counts
            .into_iter()
            .map(|(user, true_count)| {
                let total = total_counts.get(&user).copied().unwrap_or(true_count);
                (user, true_count as f64 / total as f64)
            })
            .collect()
    }

    /// Returns the absolute difference between the number of clusters and the
    /// number of unique real users seen.
    ///
    /// An error of 0 only means the clustering produced the right number of
    /// counterparts, not that messages were attributed to the right ones.
    /// Requires ground-truth sender ids (simulator data).
    pub fn cluster_count_error(&self) -> usize {
        let mut users: HashSet<RealUserId> = HashSet::new();
        for cluster in &self.clusters {
            for message in &cluster.messages {
                users.insert(message.real_sender_id);
            }
        }
        users.len().abs_diff(self.clusters.len())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// All live clusters, in creation order.
    pub fn clusters(&self) -> &[SimpleCluster] {
        &self.clusters
    }

    /// Number of live clusters.
    #[inline]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Total number of member messages across all clusters.
    pub fn message_count(&self) -> usize {
        self.clusters.iter().map(SimpleCluster::message_count).sum()
    }

    /// Most recent encounter tick seen by the manager.
    #[inline]
    pub fn latest_refresh_timestamp(&self) -> Timestamp {
        self.latest_refresh_timestamp
    }

    /// Get manager parameters.
    pub fn params(&self) -> &ManagerParams {
        &self.params
    }
}
