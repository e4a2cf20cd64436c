//! The external call envelope.
//!
//! [`Operation`] names one mutating call and its arguments; [`apply`] routes
//! it to a [`VotingCommands`] implementation and produces the literal success
//! payload clients expect. The receipt journal records committed operations
//! in this same form.

use serde::{Deserialize, Serialize};

use ballot_types::{BallotId, Identity, OptionIndex};

use crate::error::VotingError;
use crate::records::{BallotDraft, CallContext};
use crate::traits::VotingCommands;

pub const VOTER_REGISTERED: &str = "Voter registered successfully";
pub const VOTER_UNREGISTERED: &str = "Voter unregistered successfully";
pub const ADMIN_UPDATED: &str = "Admin updated successfully";
pub const BALLOT_DEACTIVATED: &str = "Ballot deactivated successfully";
pub const VOTE_CAST: &str = "Vote cast successfully";
pub const VOTE_CHANGED: &str = "Vote changed successfully";

/// One mutating call on the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    RegisterVoter,
    UnregisterVoter { target: Identity },
    UpdateAdmin { new_admin: Identity },
    CreateBallot(BallotDraft),
    DeactivateBallot { ballot: BallotId },
    CastVote { ballot: BallotId, option: OptionIndex },
    ChangeVote { ballot: BallotId, option: OptionIndex },
}

impl Operation {
    /// Stable snake_case name, matching the serialized tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterVoter => "register_voter",
            Self::UnregisterVoter { .. } => "unregister_voter",
            Self::UpdateAdmin { .. } => "update_admin",
            Self::CreateBallot(_) => "create_ballot",
            Self::DeactivateBallot { .. } => "deactivate_ballot",
            Self::CastVote { .. } => "cast_vote",
            Self::ChangeVote { .. } => "change_vote",
        }
    }

    /// Feed a canonical byte encoding of this operation into `hasher`.
    ///
    /// Variable-length fields are length-prefixed so distinct operations can
    /// never encode to the same bytes.
    pub(crate) fn write_canonical(&self, hasher: &mut blake3::Hasher) {
        fn text(hasher: &mut blake3::Hasher, s: &str) {
            hasher.update(&(s.len() as u64).to_le_bytes());
            hasher.update(s.as_bytes());
        }

        match self {
            Self::RegisterVoter => {
                hasher.update(&[0]);
            }
            Self::UnregisterVoter { target } => {
                hasher.update(&[1]);
                hasher.update(target.as_bytes());
            }
            Self::UpdateAdmin { new_admin } => {
                hasher.update(&[2]);
                hasher.update(new_admin.as_bytes());
            }
            Self::CreateBallot(draft) => {
                hasher.update(&[3]);
                text(hasher, &draft.title);
                text(hasher, &draft.description);
                hasher.update(&(draft.options.len() as u64).to_le_bytes());
                for option in &draft.options {
                    text(hasher, option);
                }
                hasher.update(&draft.duration.to_le_bytes());
            }
            Self::DeactivateBallot { ballot } => {
                hasher.update(&[4]);
                hasher.update(&ballot.get().to_le_bytes());
            }
            Self::CastVote { ballot, option } => {
                hasher.update(&[5]);
                hasher.update(&ballot.get().to_le_bytes());
                hasher.update(&option.to_le_bytes());
            }
            Self::ChangeVote { ballot, option } => {
                hasher.update(&[6]);
                hasher.update(&ballot.get().to_le_bytes());
                hasher.update(&option.to_le_bytes());
            }
        }
    }
}

/// Success payload of a mutating call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    /// Human-readable confirmation.
    Message(&'static str),
    /// Identifier assigned by `create_ballot`.
    BallotCreated(BallotId),
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(msg) => f.write_str(msg),
            Self::BallotCreated(id) => write!(f, "{}", id.get()),
        }
    }
}

/// Dispatch `op` against `ledger` on behalf of `ctx.caller`.
pub fn apply<L>(ledger: &L, ctx: &CallContext, op: &Operation) -> Result<Outcome, VotingError>
where
    L: VotingCommands + ?Sized,
{
    match op {
        Operation::RegisterVoter => ledger
            .register_voter(ctx)
            .map(|()| Outcome::Message(VOTER_REGISTERED)),
        Operation::UnregisterVoter { target } => ledger
            .unregister_voter(ctx, target)
            .map(|()| Outcome::Message(VOTER_UNREGISTERED)),
        Operation::UpdateAdmin { new_admin } => ledger
            .update_admin(ctx, *new_admin)
            .map(|()| Outcome::Message(ADMIN_UPDATED)),
        Operation::CreateBallot(draft) => ledger
            .create_ballot(ctx, draft)
            .map(Outcome::BallotCreated),
        Operation::DeactivateBallot { ballot } => ledger
            .deactivate_ballot(ctx, *ballot)
            .map(|()| Outcome::Message(BALLOT_DEACTIVATED)),
        Operation::CastVote { ballot, option } => ledger
            .cast_vote(ctx, *ballot, *option)
            .map(|()| Outcome::Message(VOTE_CAST)),
        Operation::ChangeVote { ballot, option } => ledger
            .change_vote(ctx, *ballot, *option)
            .map(|()| Outcome::Message(VOTE_CHANGED)),
    }
}
