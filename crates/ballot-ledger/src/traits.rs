use ballot_types::{BallotId, Identity, OptionIndex, OptionList, Seq};

use crate::error::VotingError;
use crate::records::{
    Ballot, BallotDraft, BallotResults, BallotStatus, CallContext, OptionResult, VoteRecord,
    VoterRecord,
};

/// Mutating boundary of the voting ledger.
///
/// Each call is atomic: it either applies every mutation it implies or fails
/// with a [`VotingError`] and leaves the ledger untouched.
pub trait VotingCommands: Send + Sync {
    fn register_voter(&self, ctx: &CallContext) -> Result<(), VotingError>;

    fn unregister_voter(&self, ctx: &CallContext, target: &Identity) -> Result<(), VotingError>;

    fn update_admin(&self, ctx: &CallContext, new_admin: Identity) -> Result<(), VotingError>;

    fn create_ballot(&self, ctx: &CallContext, draft: &BallotDraft)
        -> Result<BallotId, VotingError>;

    fn deactivate_ballot(&self, ctx: &CallContext, ballot: BallotId) -> Result<(), VotingError>;

    fn cast_vote(
        &self,
        ctx: &CallContext,
        ballot: BallotId,
        option: OptionIndex,
    ) -> Result<(), VotingError>;

    fn change_vote(
        &self,
        ctx: &CallContext,
        ballot: BallotId,
        new_option: OptionIndex,
    ) -> Result<(), VotingError>;
}

/// Read-only boundary of the voting ledger. Results never depend on who asks.
pub trait VotingQueries: Send + Sync {
    fn contract_admin(&self) -> Identity;

    fn next_ballot_id(&self) -> BallotId;

    fn is_voter_registered(&self, identity: &Identity) -> bool;

    fn voter_info(&self, identity: &Identity) -> Option<VoterRecord>;

    fn voter_registration_seq(&self, identity: &Identity) -> Option<Seq>;

    fn is_admin(&self, identity: &Identity) -> bool;

    fn ballot_info(&self, ballot: BallotId) -> Option<Ballot>;

    fn ballot_options(&self, ballot: BallotId) -> Option<OptionList>;

    /// `false` for ended, deactivated, and unknown ballots alike.
    fn is_ballot_active(&self, ballot: BallotId, now: Seq) -> bool;

    fn ballot_status(&self, ballot: BallotId, now: Seq) -> BallotStatus;

    /// Running count for one option; `0` for unknown ballots or options.
    fn vote_count(&self, ballot: BallotId, option: OptionIndex) -> u64;

    fn voter_choice(&self, ballot: BallotId, voter: &Identity) -> Option<VoteRecord>;

    fn has_voter_voted(&self, ballot: BallotId, voter: &Identity) -> bool;

    fn ballot_results(&self, ballot: BallotId, now: Seq) -> Result<BallotResults, VotingError>;

    fn option_result(
        &self,
        ballot: BallotId,
        option: OptionIndex,
    ) -> Result<OptionResult, VotingError>;
}
