//! SimpleCluster entity: an ordered bag of encounter messages believed to
//! share one real counterpart, with a derived aggregate risk level.

use serde::{Deserialize, Serialize};

use crate::message::{EncounterMessage, GenericMessage, UpdateMessage};
use crate::types::{ClusterId, RealUserId, RiskLevel, Timestamp};

/// A simple encounter message cluster.
///
/// The cluster aggregates the encounter messages attributed to one
/// hypothesized counterpart and keeps its `risk_level` equal to the rounded
/// mean of its members' risk levels after every mutation. Messages are kept
/// in arrival order; applying an update replaces one entry in place but
/// never removes one.
///
/// # Example
///
/// ```
/// use encounter_clustering_core::clustering::SimpleCluster;
/// use encounter_clustering_core::message::EncounterMessage;
///
/// let seed = EncounterMessage::new(5, 2, 100);
/// let mut cluster = SimpleCluster::from_message(&seed.clone().into());
///
/// cluster.fit_encounter(EncounterMessage::new(5, 4, 100));
/// assert_eq!(cluster.risk_level, 3); // round(mean([2, 4]))
/// assert_eq!(cluster.message_count(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleCluster {
    /// Cluster identifier: the uid of the message that seeded the cluster.
    pub cluster_id: ClusterId,

    /// Aggregate risk level, the rounded mean over all member messages.
    pub risk_level: RiskLevel,

    /// Tick of the seeding message's encounter. Set once, never changes.
    pub first_update_time: Timestamp,

    /// Tick of the most recent encounter fitted into the cluster.
    /// Non-decreasing over the cluster's lifetime.
    pub latest_update_time: Timestamp,

    /// Member encounter messages, in arrival order.
    /// Entries may get replaced in place when an update is applied.
    pub messages: Vec<EncounterMessage>,

    /// Ground-truth sender ids, one per fitted message (simulator data only).
    pub real_sender_ids: Vec<RealUserId>,

    /// Ground-truth encounter ticks, one per fitted message (simulator data only).
    pub real_encounter_times: Vec<Timestamp>,

    /// Every raw message ever fitted into this cluster, unmerged.
    /// Append-only; entries here are NEVER updated or removed.
    pub unclustered_messages: Vec<GenericMessage>,
}

impl SimpleCluster {
    /// Create a new cluster seeded from a single message.
    ///
    /// An encounter seeds the cluster directly. An update seeds it through a
    /// synthesized encounter carrying the update's new risk level; the
    /// cluster's `latest_update_time` then starts from the update's
    /// `update_time` rather than the encounter tick.
    pub fn from_message(message: &GenericMessage) -> Self {
        let (risk_level, latest_update_time, seed) = match message {
            GenericMessage::Encounter(m) => (m.risk_level, m.encounter_time, m.clone()),
            GenericMessage::Update(m) => (
                m.new_risk_level,
                m.update_time,
                EncounterMessage::from_update(m),
            ),
        };
        Self {
            cluster_id: message.uid(),
            risk_level,
            first_update_time: message.encounter_time(),
            latest_update_time,
            messages: vec![seed],
            real_sender_ids: vec![message.real_sender_id()],
            real_encounter_times: vec![message.real_encounter_time()],
            unclustered_messages: vec![message.clone()],
        }
    }

    /// Fit a new encounter message into this cluster.
    ///
    /// The caller is expected to have already established that the message's
    /// signature matches this cluster; given that, fitting always succeeds.
    pub fn fit_encounter(&mut self, message: EncounterMessage) {
        self.latest_update_time = self.latest_update_time.max(message.encounter_time);
        self.real_sender_ids.push(message.real_sender_id);
        self.real_encounter_times.push(message.real_encounter_time);
        self.unclustered_messages
            .push(GenericMessage::Encounter(message.clone()));
        self.messages.push(message);
        self.refresh_risk_level();
    }

    /// Apply an update message to one encounter in this cluster.
    ///
    /// Scans the members in arrival order for the first encounter whose
    /// `(risk_level, uid, encounter_time)` equals the update's
    /// `(old_risk_level, uid, encounter_time)` and replaces it with the
    /// merged encounter.
    ///
    /// Returns `None` when the update was applied, or hands the update back
    /// as `Some` when no member matches. Under normal manager-mediated flow
    /// the miss path is unreachable (the manager pre-filters candidates),
    /// but the contract holds for direct callers.
    // TODO: see if the exact-match scan stays valid once update messages are
    //       no longer systematically sent for every encounter
    pub fn fit_update(&mut self, update: UpdateMessage) -> Option<UpdateMessage> {
        let found = self.messages.iter().position(|m| {
            m.risk_level == update.old_risk_level
                && m.uid == update.uid
                && m.encounter_time == update.encounter_time
        });
        let Some(idx) = found else {
            return Some(update);
        };
        tracing::trace!(
            cluster_id = self.cluster_id,
            old_risk = update.old_risk_level,
            new_risk = update.new_risk_level,
            "merging update into encounter"
        );
        self.messages[idx] = self.messages[idx].merged_with(&update);
        // the cluster update time stays encounter-time-based, never
        // update-time-based
        self.latest_update_time = self.latest_update_time.max(update.encounter_time);
        self.real_sender_ids.push(update.real_sender_id);
        self.real_encounter_times.push(update.real_encounter_time);
        self.unclustered_messages
            .push(GenericMessage::Update(update));
        self.refresh_risk_level();
        None
    }

    /// Fixed-length integer summary of the cluster's state.
    ///
    /// Layout: `[cluster_id, risk_level, message_count, current_timestamp -
    /// first_update_time]`, with the leading id omitted when
    /// `include_cluster_id` is false. Values are `i64` so message counts and
    /// time offsets never lose precision.
    pub fn embedding(&self, current_timestamp: Timestamp, include_cluster_id: bool) -> Vec<i64> {
        let tail = [
            i64::from(self.risk_level),
            self.messages.len() as i64,
            current_timestamp - self.first_update_time,
        ];
        if include_cluster_id {
            let mut out = Vec::with_capacity(4);
            out.push(i64::from(self.cluster_id));
            out.extend_from_slice(&tail);
            out
        } else {
            tail.to_vec()
        }
    }

    /// Whether this cluster contains an exposure encounter.
    ///
    /// Relies on the hidden ground-truth flag of the member messages, so the
    /// answer is only meaningful with simulator data; online inference code
    /// must never consult it.
    pub fn exposure_flag(&self) -> bool {
        self.messages.iter().any(|m| m.exposed)
    }

    /// Number of member messages currently in the cluster.
    #[inline]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Recompute the aggregate risk as the rounded mean over all members.
    ///
    /// Ties round to even, matching the rounding the downstream risk
    /// inference was trained against.
    fn refresh_risk_level(&mut self) {
        let sum: u32 = self.messages.iter().map(|m| u32::from(m.risk_level)).sum();
        let mean = f64::from(sum) / self.messages.len() as f64;
        self.risk_level = mean.round_ties_even() as RiskLevel;
    }
}
