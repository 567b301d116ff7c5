//! Scalar type aliases shared across the clustering engine.
//!
//! The protocol exchanges small anonymized integers rather than stable
//! identities: a rotating 4-bit uid, a 4-bit risk level, and integer
//! simulation ticks. Real user identifiers exist only as simulator ground
//! truth and never feed the online matching logic.

/// Rotating anonymized identifier carried by a message (4-bit space).
pub type Uid = u8;

/// Quantized risk level carried by a message (4-bit space).
pub type RiskLevel = u8;

/// Simulation tick. One tick per second in the surrounding simulation.
pub type Timestamp = i64;

/// Offset between two timestamps, in ticks.
pub type TimeOffset = i64;

/// Ground-truth simulator identity of a message sender (debug/evaluation only).
pub type RealUserId = u64;

/// Identifier of a cluster. Shares the uid space, since a cluster is keyed
/// by the uid of the message that seeded it.
pub type ClusterId = u8;

/// Highest encodable risk level (inclusive).
pub const MAX_RISK_LEVEL: RiskLevel = 15;

/// Highest encodable uid (inclusive).
pub const MAX_UID: Uid = 15;
