//! Message types exchanged by the contact-tracing protocol.
//!
//! Two kinds of messages reach the clustering engine: an [`EncounterMessage`]
//! reporting a pairwise contact, and an [`UpdateMessage`] correcting the risk
//! level of a previously reported encounter. Both carry ground-truth fields
//! (`real_sender_id`, `real_encounter_time`, `exposed`) that only exist with
//! simulator data; the online matching logic never reads them.
//!
//! Message kind is resolved exactly once at the ingestion boundary via the
//! [`GenericMessage`] enum; everything downstream operates on the resolved
//! variant.

use serde::{Deserialize, Serialize};

use crate::types::{RealUserId, RiskLevel, Timestamp, Uid};

/// Anonymized report of a pairwise contact with an associated risk level.
///
/// Immutable as received. A cluster may however hold a *derived* encounter
/// produced by [`EncounterMessage::merged_with`] after applying an update.
///
/// # Example
///
/// ```
/// use encounter_clustering_core::message::EncounterMessage;
///
/// let msg = EncounterMessage::new(5, 2, 100);
/// assert_eq!(msg.uid, 5);
/// assert_eq!(msg.risk_level, 2);
/// assert!(!msg.exposed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterMessage {
    /// Rotating anonymized identifier of the sender at encounter time.
    pub uid: Uid,

    /// Quantized risk level reported for this encounter.
    pub risk_level: RiskLevel,

    /// Tick at which the encounter took place.
    pub encounter_time: Timestamp,

    /// Ground-truth sender identity (simulator data only).
    pub real_sender_id: RealUserId,

    /// Ground-truth encounter tick (simulator data only).
    pub real_encounter_time: Timestamp,

    /// Whether the receiver was exposed during this encounter.
    /// Hidden ground truth; only evaluation code may read it.
    pub exposed: bool,
}

impl EncounterMessage {
    /// Create an encounter message without ground-truth annotations.
    ///
    /// The debug fields default to a zero sender, a real encounter time equal
    /// to the observed one, and no exposure.
    pub fn new(uid: Uid, risk_level: RiskLevel, encounter_time: Timestamp) -> Self {
        Self {
            uid,
            risk_level,
            encounter_time,
            real_sender_id: 0,
            real_encounter_time: encounter_time,
            exposed: false,
        }
    }

    /// Attach simulator ground truth to this message.
    #[must_use]
    pub fn with_ground_truth(
        mut self,
        real_sender_id: RealUserId,
        real_encounter_time: Timestamp,
        exposed: bool,
    ) -> Self {
        self.real_sender_id = real_sender_id;
        self.real_encounter_time = real_encounter_time;
        self.exposed = exposed;
        self
    }

    /// Synthesize an encounter from an update that matched no prior encounter.
    ///
    /// The result carries the update's *new* risk level and its provenance.
    /// Exposure is unknowable from an update alone and defaults to false.
    pub fn from_update(update: &UpdateMessage) -> Self {
        Self {
            uid: update.uid,
            risk_level: update.new_risk_level,
            encounter_time: update.encounter_time,
            real_sender_id: update.real_sender_id,
            real_encounter_time: update.real_encounter_time,
            exposed: false,
        }
    }

    /// Produce the encounter that results from applying `update` to this one.
    ///
    /// Only the risk level changes; identity, timing and ground truth carry
    /// over unchanged.
    #[must_use]
    pub fn merged_with(&self, update: &UpdateMessage) -> Self {
        Self {
            risk_level: update.new_risk_level,
            ..self.clone()
        }
    }
}

/// Correction to the risk level of a previously reported encounter.
///
/// Semantically: "I previously reported `old_risk_level` for an encounter at
/// `encounter_time`; it is now `new_risk_level`."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMessage {
    /// Rotating anonymized identifier of the sender at encounter time.
    pub uid: Uid,

    /// Risk level originally reported for the referenced encounter.
    pub old_risk_level: RiskLevel,

    /// Corrected risk level.
    pub new_risk_level: RiskLevel,

    /// Tick of the referenced encounter.
    pub encounter_time: Timestamp,

    /// Tick at which this correction was emitted.
    pub update_time: Timestamp,

    /// Ground-truth sender identity (simulator data only).
    pub real_sender_id: RealUserId,

    /// Ground-truth encounter tick (simulator data only).
    pub real_encounter_time: Timestamp,
}

impl UpdateMessage {
    /// Create an update message without ground-truth annotations.
    pub fn new(
        uid: Uid,
        old_risk_level: RiskLevel,
        new_risk_level: RiskLevel,
        encounter_time: Timestamp,
        update_time: Timestamp,
    ) -> Self {
        Self {
            uid,
            old_risk_level,
            new_risk_level,
            encounter_time,
            update_time,
            real_sender_id: 0,
            real_encounter_time: encounter_time,
        }
    }

    /// Attach simulator ground truth to this message.
    #[must_use]
    pub fn with_ground_truth(
        mut self,
        real_sender_id: RealUserId,
        real_encounter_time: Timestamp,
    ) -> Self {
        self.real_sender_id = real_sender_id;
        self.real_encounter_time = real_encounter_time;
        self
    }
}

/// A message whose kind has been resolved at the ingestion boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenericMessage {
    /// A pairwise contact report.
    Encounter(EncounterMessage),
    /// A risk-level correction for a prior contact report.
    Update(UpdateMessage),
}

impl GenericMessage {
    /// Anonymized uid carried by the message.
    #[inline]
    pub fn uid(&self) -> Uid {
        match self {
            Self::Encounter(m) => m.uid,
            Self::Update(m) => m.uid,
        }
    }

    /// Encounter tick referenced by the message.
    #[inline]
    pub fn encounter_time(&self) -> Timestamp {
        match self {
            Self::Encounter(m) => m.encounter_time,
            Self::Update(m) => m.encounter_time,
        }
    }

    /// Ground-truth sender identity (simulator data only).
    #[inline]
    pub fn real_sender_id(&self) -> RealUserId {
        match self {
            Self::Encounter(m) => m.real_sender_id,
            Self::Update(m) => m.real_sender_id,
        }
    }

    /// Ground-truth encounter tick (simulator data only).
    #[inline]
    pub fn real_encounter_time(&self) -> Timestamp {
        match self {
            Self::Encounter(m) => m.real_encounter_time,
            Self::Update(m) => m.real_encounter_time,
        }
    }

    /// Whether this is an encounter message.
    #[inline]
    pub fn is_encounter(&self) -> bool {
        matches!(self, Self::Encounter(_))
    }
}

impl From<EncounterMessage> for GenericMessage {
    fn from(message: EncounterMessage) -> Self {
        Self::Encounter(message)
    }
}

impl From<UpdateMessage> for GenericMessage {
    fn from(message: UpdateMessage) -> Self {
        Self::Update(message)
    }
}
