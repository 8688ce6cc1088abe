/// A couple is the unit of shared ownership: exactly two participants.
pub type CoupleId = uuid::Uuid;

/// One member of a couple.
pub type ParticipantId = uuid::Uuid;

/// A draw session; each couple has at most one active session.
pub type SessionId = uuid::Uuid;

/// Catalog slug identifying a card (e.g. `"l2-017"`).
pub type CardId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
