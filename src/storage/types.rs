//! Storage record types.

/// A contest participants can register for. Contests are authored through
/// the admin interface; the bot only reads them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contest {
    /// Row id; 0 means "not saved yet"
    pub id: i64,
    pub name: String,
    pub description: String,
    /// When the contest takes place, free text
    pub when: String,
    /// Where the contest takes place, free text
    pub venue: String,
    /// Registration disabled
    pub closed: bool,
    /// Invisible to participants
    pub hidden: bool,
}

/// One registration of one participant for one contest.
///
/// At most one row may exist per (participant_id, contest_id) pair; the
/// registration dialog enforces that, not the schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContestParticipant {
    /// Row id; 0 means "not saved yet"
    pub id: i64,
    /// Opaque chat identifier of the participant
    pub participant_id: String,
    pub contest_id: i64,
    pub name: String,
    pub school: String,
    pub contacts: String,
    pub languages: String,
    /// Generated once at first save, never regenerated
    pub login: String,
    /// Generated once at first save, never regenerated
    pub password: String,
}

/// A broadcast message authored for a contest through the admin interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContestNotification {
    /// Row id; 0 means "not saved yet"
    pub id: i64,
    pub contest_id: i64,
    pub message: String,
}
