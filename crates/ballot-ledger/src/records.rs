use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use ballot_types::{
    BallotId, Description, Identity, OptionIndex, OptionList, OptionText, Seq, Title,
};

/// Authenticated caller and the sequence value at which a call executes.
///
/// Both halves are supplied by the hosting environment. The ledger never
/// generates or adjusts sequence values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: Identity,
    pub seq: Seq,
}

impl CallContext {
    pub fn new(caller: Identity, seq: Seq) -> Self {
        Self { caller, seq }
    }
}

/// Registry entry for a voter. Presence in the registry means registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
    pub registered: bool,
    pub registration_seq: Seq,
}

/// Input to ballot creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotDraft {
    pub title: Title,
    pub description: Description,
    pub options: OptionList,
    /// Voting window length in sequence units; must be positive.
    pub duration: u64,
}

/// A stored ballot.
///
/// Only `active` (via deactivation) and `total_votes` (via new votes) change
/// after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub id: BallotId,
    pub title: Title,
    pub description: Description,
    pub options: OptionList,
    pub creator: Identity,
    pub start_seq: Seq,
    pub end_seq: Seq,
    pub active: bool,
    pub total_votes: u64,
}

impl Ballot {
    /// Status derived from the stored fields at sequence `now`.
    pub fn status_at(&self, now: Seq) -> BallotStatus {
        if !self.active {
            BallotStatus::Deactivated
        } else if now > self.end_seq {
            BallotStatus::Ended
        } else {
            BallotStatus::Active
        }
    }

    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    /// Whether `index` addresses one of this ballot's options.
    pub fn has_option(&self, index: OptionIndex) -> bool {
        (index as usize) < self.options.len()
    }
}

/// A voter's recorded choice on one ballot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub option_index: OptionIndex,
    pub vote_seq: Seq,
}

/// Observable ballot status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BallotStatus {
    /// Open for votes.
    Active,
    /// Voting window elapsed without explicit deactivation.
    Ended,
    /// Explicitly terminated; terminal regardless of time.
    Deactivated,
    NotFound,
}

impl BallotStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Ended => "ended",
            Self::Deactivated => "deactivated",
            Self::NotFound => "not-found",
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for BallotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text and running count for one option.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionResult {
    pub index: OptionIndex,
    pub text: OptionText,
    pub count: u64,
}

/// Assembled result view of a ballot at a given sequence value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotResults {
    pub ballot_id: BallotId,
    pub title: Title,
    pub total_votes: u64,
    pub options: OptionList,
    pub status: BallotStatus,
    pub creator: Identity,
    pub start_seq: Seq,
    pub end_seq: Seq,
    /// Per-option tallies in option order.
    pub tallies: Vec<OptionResult>,
}

impl BallotResults {
    /// The option(s) holding the highest count. Empty when no votes exist.
    pub fn leaders(&self) -> Vec<&OptionResult> {
        let Some(max) = self.tallies.iter().map(|t| t.count).max() else {
            return vec![];
        };
        if max == 0 {
            return vec![];
        }
        self.tallies.iter().filter(|t| t.count == max).collect()
    }
}

/// Deterministic, ordered copy of the full ledger state.
///
/// Two ledgers that went through the same committed operations produce equal
/// snapshots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub admin: Identity,
    pub next_ballot_id: BallotId,
    pub voters: BTreeMap<Identity, VoterRecord>,
    pub ballots: BTreeMap<BallotId, Ballot>,
    pub votes: BTreeMap<BallotId, BTreeMap<Identity, VoteRecord>>,
    pub vote_counts: BTreeMap<BallotId, BTreeMap<OptionIndex, u64>>,
}
