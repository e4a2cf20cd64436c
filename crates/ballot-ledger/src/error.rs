use serde::{Deserialize, Serialize};

/// Failures of ledger operations.
///
/// Every variant maps to a stable numeric code ([`VotingError::code`]) and a
/// stable string name ([`VotingError::as_str`]) that clients pattern-match on.
/// A failed operation never leaves a partial mutation behind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum VotingError {
    #[error("caller is not the contract owner")]
    OwnerOnly,

    #[error("record not found")]
    NotFound,

    #[error("caller is not authorized for this operation")]
    Unauthorized,

    #[error("record already exists")]
    AlreadyExists,

    #[error("voter has already voted on this ballot")]
    AlreadyVoted,

    #[error("ballot has been deactivated")]
    BallotInactive,

    #[error("option index is out of range")]
    InvalidOption,

    #[error("ballot voting period has ended")]
    BallotEnded,

    #[error("ballot title must not be empty")]
    EmptyTitle,

    #[error("ballot needs at least two options")]
    TooFewOptions,

    #[error("ballot has too many options")]
    TooManyOptions,

    #[error("ballot duration must be positive")]
    InvalidDuration,

    #[error("vote already records this option")]
    SameOption,
}

impl VotingError {
    /// Every error kind, in code order.
    pub const ALL: [VotingError; 13] = [
        Self::OwnerOnly,
        Self::NotFound,
        Self::Unauthorized,
        Self::AlreadyExists,
        Self::AlreadyVoted,
        Self::BallotInactive,
        Self::InvalidOption,
        Self::BallotEnded,
        Self::EmptyTitle,
        Self::TooFewOptions,
        Self::TooManyOptions,
        Self::InvalidDuration,
        Self::SameOption,
    ];

    /// Stable numeric code.
    pub const fn code(self) -> u32 {
        match self {
            Self::OwnerOnly => 100,
            Self::NotFound => 101,
            Self::Unauthorized => 102,
            Self::AlreadyExists => 103,
            Self::AlreadyVoted => 104,
            Self::BallotInactive => 105,
            Self::InvalidOption => 106,
            Self::BallotEnded => 107,
            Self::EmptyTitle => 108,
            Self::TooFewOptions => 109,
            Self::TooManyOptions => 110,
            Self::InvalidDuration => 111,
            Self::SameOption => 112,
        }
    }

    /// Stable string name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OwnerOnly => "ERR_OWNER_ONLY",
            Self::NotFound => "ERR_NOT_FOUND",
            Self::Unauthorized => "ERR_UNAUTHORIZED",
            Self::AlreadyExists => "ERR_ALREADY_EXISTS",
            Self::AlreadyVoted => "ERR_ALREADY_VOTED",
            Self::BallotInactive => "ERR_BALLOT_INACTIVE",
            Self::InvalidOption => "ERR_INVALID_OPTION",
            Self::BallotEnded => "ERR_BALLOT_ENDED",
            Self::EmptyTitle => "ERR_EMPTY_TITLE",
            Self::TooFewOptions => "ERR_TOO_FEW_OPTIONS",
            Self::TooManyOptions => "ERR_TOO_MANY_OPTIONS",
            Self::InvalidDuration => "ERR_INVALID_DURATION",
            Self::SameOption => "ERR_SAME_OPTION",
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.code() == code)
    }
}

/// Errors from journal verification, replay, and configuration loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("integrity violation at receipt {index}: {reason}")]
    IntegrityViolation { index: u64, reason: String },

    #[error("replay of receipt {index} was rejected: {error}")]
    ReplayRejected { index: u64, error: VotingError },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(String),
}
