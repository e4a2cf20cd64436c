use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use ballot_types::limits::{FIRST_BALLOT_ID, MAX_OPTIONS, MIN_OPTIONS};
use ballot_types::{BallotId, Identity, OptionIndex, OptionList, Seq};

use crate::config::LedgerConfig;
use crate::error::VotingError;
use crate::journal::{Journal, Receipt};
use crate::operation::Operation;
use crate::records::{
    Ballot, BallotDraft, BallotResults, BallotStatus, CallContext, LedgerSnapshot, OptionResult,
    VoteRecord, VoterRecord,
};
use crate::traits::{VotingCommands, VotingQueries};

/// In-memory voting ledger.
///
/// All state sits behind a single `RwLock`, so exactly one mutating call
/// observes and changes the ledger at a time. Every command validates fully
/// before its first write, which makes each call all-or-nothing and lets a
/// poisoned lock be recovered without exposing partial state.
pub struct InMemoryLedger {
    config: LedgerConfig,
    inner: RwLock<LedgerState>,
}

struct LedgerState {
    admin: Identity,
    next_ballot_id: BallotId,
    voters: HashMap<Identity, VoterRecord>,
    ballots: HashMap<BallotId, Ballot>,
    votes: HashMap<(BallotId, Identity), VoteRecord>,
    vote_counts: HashMap<(BallotId, OptionIndex), u64>,
    journal: Journal,
    high_water_seq: Option<Seq>,
}

impl LedgerState {
    fn new(admin: Identity) -> Self {
        Self {
            admin,
            next_ballot_id: BallotId::new(FIRST_BALLOT_ID),
            voters: HashMap::new(),
            ballots: HashMap::new(),
            votes: HashMap::new(),
            vote_counts: HashMap::new(),
            journal: Journal::new(),
            high_water_seq: None,
        }
    }

    fn ensure_registered(&self, identity: &Identity) -> Result<(), VotingError> {
        if self.voters.contains_key(identity) {
            Ok(())
        } else {
            Err(VotingError::Unauthorized)
        }
    }

    fn ensure_admin(&self, identity: &Identity) -> Result<(), VotingError> {
        if self.admin == *identity {
            Ok(())
        } else {
            Err(VotingError::Unauthorized)
        }
    }

    fn count(&self, ballot: BallotId, option: OptionIndex) -> u64 {
        self.vote_counts.get(&(ballot, option)).copied().unwrap_or(0)
    }
}

impl InMemoryLedger {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            inner: RwLock::new(LedgerState::new(config.admin)),
            config,
        }
    }

    /// A ledger with default configuration administered by `admin`.
    pub fn with_admin(admin: Identity) -> Self {
        Self::new(LedgerConfig::with_admin(admin))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Ordered copy of the full ledger state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.read();

        let mut votes: BTreeMap<BallotId, BTreeMap<Identity, VoteRecord>> = BTreeMap::new();
        for ((ballot, voter), record) in &state.votes {
            votes.entry(*ballot).or_default().insert(*voter, *record);
        }

        let mut vote_counts: BTreeMap<BallotId, BTreeMap<OptionIndex, u64>> = BTreeMap::new();
        for ((ballot, option), count) in &state.vote_counts {
            vote_counts.entry(*ballot).or_default().insert(*option, *count);
        }

        LedgerSnapshot {
            admin: state.admin,
            next_ballot_id: state.next_ballot_id,
            voters: state.voters.iter().map(|(k, v)| (*k, *v)).collect(),
            ballots: state
                .ballots
                .iter()
                .map(|(k, v)| (*k, v.clone()))
                .collect(),
            votes,
            vote_counts,
        }
    }

    /// Copy of every receipt recorded so far.
    pub fn journal(&self) -> Vec<Receipt> {
        self.read().journal.receipts().to_vec()
    }

    pub fn journal_len(&self) -> usize {
        self.read().journal.len()
    }

    pub fn journal_head(&self) -> Option<Receipt> {
        self.read().journal.head().cloned()
    }

    /// Identifiers of every stored ballot, ascending.
    pub fn ballot_ids(&self) -> Vec<BallotId> {
        let mut ids: Vec<_> = self.read().ballots.keys().copied().collect();
        ids.sort();
        ids
    }

    // Commands validate before writing, so a poisoned guard never holds partial state.
    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bookkeeping shared by every committed command: sequence tracking and
    /// the receipt journal.
    fn commit(&self, state: &mut LedgerState, ctx: &CallContext, operation: Operation) {
        match state.high_water_seq {
            Some(high) if ctx.seq < high => {
                if self.config.warn_on_seq_regression {
                    warn!(
                        seq = ctx.seq,
                        high_water = high,
                        op = operation.name(),
                        "sequence value regressed"
                    );
                }
            }
            _ => state.high_water_seq = Some(ctx.seq),
        }

        if self.config.journal {
            let receipt = state.journal.append(ctx, operation);
            debug!(index = receipt.index, hash = %receipt.short_hash(), "receipt recorded");
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl VotingCommands for InMemoryLedger {
    fn register_voter(&self, ctx: &CallContext) -> Result<(), VotingError> {
        let mut guard = self.write();
        let state = &mut *guard;

        if state.voters.contains_key(&ctx.caller) {
            return Err(VotingError::AlreadyExists);
        }

        state.voters.insert(
            ctx.caller,
            VoterRecord {
                registered: true,
                registration_seq: ctx.seq,
            },
        );
        debug!(voter = %ctx.caller, seq = ctx.seq, "voter registered");

        self.commit(state, ctx, Operation::RegisterVoter);
        Ok(())
    }

    fn unregister_voter(&self, ctx: &CallContext, target: &Identity) -> Result<(), VotingError> {
        let mut guard = self.write();
        let state = &mut *guard;

        state.ensure_admin(&ctx.caller)?;
        if state.voters.remove(target).is_none() {
            return Err(VotingError::NotFound);
        }
        // Votes already cast by `target` stay counted.
        debug!(voter = %target, "voter unregistered");

        self.commit(state, ctx, Operation::UnregisterVoter { target: *target });
        Ok(())
    }

    fn update_admin(&self, ctx: &CallContext, new_admin: Identity) -> Result<(), VotingError> {
        let mut guard = self.write();
        let state = &mut *guard;

        state.ensure_admin(&ctx.caller)?;
        let previous = std::mem::replace(&mut state.admin, new_admin);
        info!(%previous, admin = %new_admin, "admin updated");

        self.commit(state, ctx, Operation::UpdateAdmin { new_admin });
        Ok(())
    }

    fn create_ballot(
        &self,
        ctx: &CallContext,
        draft: &BallotDraft,
    ) -> Result<BallotId, VotingError> {
        if draft.title.is_empty() {
            return Err(VotingError::EmptyTitle);
        }
        let option_count = draft.options.len();
        if option_count < MIN_OPTIONS {
            return Err(VotingError::TooFewOptions);
        }
        if option_count > MAX_OPTIONS {
            return Err(VotingError::TooManyOptions);
        }
        if draft.duration == 0 {
            return Err(VotingError::InvalidDuration);
        }
        let end_seq = ctx
            .seq
            .checked_add(draft.duration)
            .ok_or(VotingError::InvalidDuration)?;

        let mut guard = self.write();
        let state = &mut *guard;

        let id = state.next_ballot_id;
        state.ballots.insert(
            id,
            Ballot {
                id,
                title: draft.title.clone(),
                description: draft.description.clone(),
                options: draft.options.clone(),
                creator: ctx.caller,
                start_seq: ctx.seq,
                end_seq,
                active: true,
                total_votes: 0,
            },
        );
        for index in 0..option_count as OptionIndex {
            state.vote_counts.insert((id, index), 0);
        }
        state.next_ballot_id = id.next();
        info!(
            ballot = %id,
            creator = %ctx.caller,
            options = option_count,
            start_seq = ctx.seq,
            end_seq,
            "ballot created"
        );

        self.commit(state, ctx, Operation::CreateBallot(draft.clone()));
        Ok(id)
    }

    fn deactivate_ballot(&self, ctx: &CallContext, ballot: BallotId) -> Result<(), VotingError> {
        let mut guard = self.write();
        let state = &mut *guard;

        let stored = state.ballots.get_mut(&ballot).ok_or(VotingError::NotFound)?;
        if stored.creator != ctx.caller && state.admin != ctx.caller {
            return Err(VotingError::Unauthorized);
        }
        stored.active = false;
        info!(%ballot, by = %ctx.caller, "ballot deactivated");

        self.commit(state, ctx, Operation::DeactivateBallot { ballot });
        Ok(())
    }

    fn cast_vote(
        &self,
        ctx: &CallContext,
        ballot: BallotId,
        option: OptionIndex,
    ) -> Result<(), VotingError> {
        let mut guard = self.write();
        let state = &mut *guard;

        let stored = state.ballots.get_mut(&ballot).ok_or(VotingError::NotFound)?;
        if !state.voters.contains_key(&ctx.caller) {
            return Err(VotingError::Unauthorized);
        }
        if !stored.active {
            return Err(VotingError::BallotInactive);
        }
        if ctx.seq > stored.end_seq {
            return Err(VotingError::BallotEnded);
        }
        if state.votes.contains_key(&(ballot, ctx.caller)) {
            return Err(VotingError::AlreadyVoted);
        }
        if !stored.has_option(option) {
            return Err(VotingError::InvalidOption);
        }

        stored.total_votes += 1;
        state.votes.insert(
            (ballot, ctx.caller),
            VoteRecord {
                option_index: option,
                vote_seq: ctx.seq,
            },
        );
        *state.vote_counts.entry((ballot, option)).or_insert(0) += 1;
        debug!(%ballot, voter = %ctx.caller, option, "vote cast");

        self.commit(state, ctx, Operation::CastVote { ballot, option });
        Ok(())
    }

    fn change_vote(
        &self,
        ctx: &CallContext,
        ballot: BallotId,
        new_option: OptionIndex,
    ) -> Result<(), VotingError> {
        let mut guard = self.write();
        let state = &mut *guard;

        let stored = state.ballots.get(&ballot).ok_or(VotingError::NotFound)?;
        state.ensure_registered(&ctx.caller)?;
        let previous = state
            .votes
            .get(&(ballot, ctx.caller))
            .copied()
            .ok_or(VotingError::NotFound)?;
        if !stored.active {
            return Err(VotingError::BallotInactive);
        }
        if ctx.seq > stored.end_seq {
            return Err(VotingError::BallotEnded);
        }
        if !stored.has_option(new_option) {
            return Err(VotingError::InvalidOption);
        }
        if previous.option_index == new_option {
            return Err(VotingError::SameOption);
        }

        if let Some(count) = state.vote_counts.get_mut(&(ballot, previous.option_index)) {
            *count = count.saturating_sub(1);
        }
        *state.vote_counts.entry((ballot, new_option)).or_insert(0) += 1;
        state.votes.insert(
            (ballot, ctx.caller),
            VoteRecord {
                option_index: new_option,
                vote_seq: ctx.seq,
            },
        );
        debug!(
            %ballot,
            voter = %ctx.caller,
            from = previous.option_index,
            to = new_option,
            "vote changed"
        );

        self.commit(
            state,
            ctx,
            Operation::ChangeVote {
                ballot,
                option: new_option,
            },
        );
        Ok(())
    }
}

impl VotingQueries for InMemoryLedger {
    fn contract_admin(&self) -> Identity {
        self.read().admin
    }

    fn next_ballot_id(&self) -> BallotId {
        self.read().next_ballot_id
    }

    fn is_voter_registered(&self, identity: &Identity) -> bool {
        self.read().voters.contains_key(identity)
    }

    fn voter_info(&self, identity: &Identity) -> Option<VoterRecord> {
        self.read().voters.get(identity).copied()
    }

    fn voter_registration_seq(&self, identity: &Identity) -> Option<Seq> {
        self.voter_info(identity).map(|r| r.registration_seq)
    }

    fn is_admin(&self, identity: &Identity) -> bool {
        self.read().admin == *identity
    }

    fn ballot_info(&self, ballot: BallotId) -> Option<Ballot> {
        self.read().ballots.get(&ballot).cloned()
    }

    fn ballot_options(&self, ballot: BallotId) -> Option<OptionList> {
        self.read().ballots.get(&ballot).map(|b| b.options.clone())
    }

    fn is_ballot_active(&self, ballot: BallotId, now: Seq) -> bool {
        self.ballot_status(ballot, now).is_active()
    }

    fn ballot_status(&self, ballot: BallotId, now: Seq) -> BallotStatus {
        self.read()
            .ballots
            .get(&ballot)
            .map_or(BallotStatus::NotFound, |b| b.status_at(now))
    }

    fn vote_count(&self, ballot: BallotId, option: OptionIndex) -> u64 {
        self.read().count(ballot, option)
    }

    fn voter_choice(&self, ballot: BallotId, voter: &Identity) -> Option<VoteRecord> {
        self.read().votes.get(&(ballot, *voter)).copied()
    }

    fn has_voter_voted(&self, ballot: BallotId, voter: &Identity) -> bool {
        self.read().votes.contains_key(&(ballot, *voter))
    }

    fn ballot_results(&self, ballot: BallotId, now: Seq) -> Result<BallotResults, VotingError> {
        let state = self.read();
        let stored = state.ballots.get(&ballot).ok_or(VotingError::NotFound)?;

        let tallies = stored
            .options
            .iter()
            .zip(0..)
            .map(|(text, index)| OptionResult {
                index,
                text: text.clone(),
                count: state.count(ballot, index),
            })
            .collect();

        Ok(BallotResults {
            ballot_id: stored.id,
            title: stored.title.clone(),
            total_votes: stored.total_votes,
            options: stored.options.clone(),
            status: stored.status_at(now),
            creator: stored.creator,
            start_seq: stored.start_seq,
            end_seq: stored.end_seq,
            tallies,
        })
    }

    fn option_result(
        &self,
        ballot: BallotId,
        option: OptionIndex,
    ) -> Result<OptionResult, VotingError> {
        let state = self.read();
        let stored = state.ballots.get(&ballot).ok_or(VotingError::NotFound)?;
        let text = stored
            .options
            .get(option as usize)
            .ok_or(VotingError::InvalidOption)?;

        Ok(OptionResult {
            index: option,
            text: text.clone(),
            count: state.count(ballot, option),
        })
    }
}

#[cfg(test)]
mod tests {
    use ballot_types::{Description, Title};

    use super::*;
    use crate::validation::LedgerValidator;

    fn id(label: &str) -> Identity {
        Identity::from_label(label)
    }

    fn ctx(label: &str, seq: Seq) -> CallContext {
        CallContext::new(id(label), seq)
    }

    fn draft(options: &[&str], duration: u64) -> BallotDraft {
        BallotDraft {
            title: Title::new("Board election").unwrap(),
            description: Description::new("Pick one").unwrap(),
            options: OptionList::from_texts(options.iter().copied()).unwrap(),
            duration,
        }
    }

    /// Ledger with alice and bob registered and one open ballot created by
    /// carol at seq 10 with a 100-unit window.
    fn setup() -> (InMemoryLedger, BallotId) {
        let ledger = InMemoryLedger::default();
        ledger.register_voter(&ctx("alice", 1)).unwrap();
        ledger.register_voter(&ctx("bob", 2)).unwrap();
        let ballot = ledger
            .create_ballot(&ctx("carol", 10), &draft(&["yes", "no", "abstain"], 100))
            .unwrap();
        (ledger, ballot)
    }

    #[test]
    fn register_twice_fails_and_keeps_first_record() {
        let ledger = InMemoryLedger::default();
        ledger.register_voter(&ctx("alice", 5)).unwrap();
        let err = ledger.register_voter(&ctx("alice", 9)).unwrap_err();

        assert_eq!(err, VotingError::AlreadyExists);
        assert!(ledger.is_voter_registered(&id("alice")));
        assert_eq!(ledger.voter_registration_seq(&id("alice")), Some(5));
        assert_eq!(
            ledger.voter_info(&id("alice")),
            Some(VoterRecord {
                registered: true,
                registration_seq: 5
            })
        );
    }

    #[test]
    fn unknown_identity_is_not_registered() {
        let ledger = InMemoryLedger::default();
        assert!(!ledger.is_voter_registered(&id("nobody")));
        assert_eq!(ledger.voter_info(&id("nobody")), None);
        assert_eq!(ledger.voter_registration_seq(&id("nobody")), None);
    }

    #[test]
    fn unregister_requires_admin_and_existing_record() {
        let (ledger, _) = setup();

        let err = ledger
            .unregister_voter(&ctx("alice", 20), &id("bob"))
            .unwrap_err();
        assert_eq!(err, VotingError::Unauthorized);

        let err = ledger
            .unregister_voter(&ctx("admin", 20), &id("zed"))
            .unwrap_err();
        assert_eq!(err, VotingError::NotFound);

        ledger.unregister_voter(&ctx("admin", 20), &id("bob")).unwrap();
        assert!(!ledger.is_voter_registered(&id("bob")));
        assert_eq!(ledger.voter_info(&id("bob")), None);
    }

    #[test]
    fn unregistering_keeps_prior_votes() {
        let (ledger, ballot) = setup();
        ledger.cast_vote(&ctx("bob", 11), ballot, 1).unwrap();
        ledger.unregister_voter(&ctx("admin", 12), &id("bob")).unwrap();

        assert!(ledger.has_voter_voted(ballot, &id("bob")));
        assert_eq!(ledger.vote_count(ballot, 1), 1);
        assert_eq!(ledger.ballot_info(ballot).unwrap().total_votes, 1);

        let err = ledger.change_vote(&ctx("bob", 13), ballot, 0).unwrap_err();
        assert_eq!(err, VotingError::Unauthorized);
    }

    #[test]
    fn update_admin_hands_over_authority() {
        let ledger = InMemoryLedger::default();
        assert!(ledger.is_admin(&id("admin")));

        let err = ledger
            .update_admin(&ctx("alice", 1), id("alice"))
            .unwrap_err();
        assert_eq!(err, VotingError::Unauthorized);

        ledger.update_admin(&ctx("admin", 2), id("alice")).unwrap();
        assert_eq!(ledger.contract_admin(), id("alice"));
        assert!(!ledger.is_admin(&id("admin")));

        let err = ledger.update_admin(&ctx("admin", 3), id("admin")).unwrap_err();
        assert_eq!(err, VotingError::Unauthorized);
    }

    #[test]
    fn create_ballot_assigns_sequential_ids_and_zeroed_counts() {
        let ledger = InMemoryLedger::default();
        assert_eq!(ledger.next_ballot_id(), BallotId::new(1));

        let first = ledger
            .create_ballot(&ctx("anyone", 7), &draft(&["a", "b"], 3))
            .unwrap();
        let second = ledger
            .create_ballot(&ctx("anyone", 8), &draft(&["a", "b", "c"], 3))
            .unwrap();

        assert_eq!(first, BallotId::new(1));
        assert_eq!(second, BallotId::new(2));
        assert_eq!(ledger.next_ballot_id(), BallotId::new(3));

        let info = ledger.ballot_info(first).unwrap();
        assert_eq!(info.start_seq, 7);
        assert_eq!(info.end_seq, 10);
        assert!(info.active);
        assert_eq!(info.total_votes, 0);
        assert_eq!(info.creator, id("anyone"));

        let counts = &ledger.snapshot().vote_counts[&second];
        assert_eq!(counts.len(), 3);
        assert!(counts.values().all(|c| *c == 0));
    }

    #[test]
    fn create_ballot_validation_order() {
        let ledger = InMemoryLedger::default();
        let caller = ctx("alice", 1);

        let mut bad = draft(&["only"], 0);
        bad.title = Title::default();
        assert_eq!(
            ledger.create_ballot(&caller, &bad).unwrap_err(),
            VotingError::EmptyTitle
        );

        assert_eq!(
            ledger.create_ballot(&caller, &draft(&["only"], 0)).unwrap_err(),
            VotingError::TooFewOptions
        );
        assert_eq!(
            ledger.create_ballot(&caller, &draft(&[], 5)).unwrap_err(),
            VotingError::TooFewOptions
        );
        assert_eq!(
            ledger.create_ballot(&caller, &draft(&["a", "b"], 0)).unwrap_err(),
            VotingError::InvalidDuration
        );

        let ten: Vec<String> = (0..10).map(|i| format!("o{i}")).collect();
        let refs: Vec<&str> = ten.iter().map(String::as_str).collect();
        ledger.create_ballot(&caller, &draft(&refs, 1)).unwrap();
    }

    #[test]
    fn end_seq_overflow_is_an_invalid_duration() {
        let ledger = InMemoryLedger::default();
        let err = ledger
            .create_ballot(&ctx("alice", u64::MAX), &draft(&["a", "b"], 1))
            .unwrap_err();
        assert_eq!(err, VotingError::InvalidDuration);
        assert_eq!(ledger.next_ballot_id(), BallotId::new(1));
    }

    #[test]
    fn ballot_queries_for_missing_ballot() {
        let ledger = InMemoryLedger::default();
        let missing = BallotId::new(42);

        assert_eq!(ledger.ballot_info(missing), None);
        assert_eq!(ledger.ballot_options(missing), None);
        assert!(!ledger.is_ballot_active(missing, 0));
        assert_eq!(ledger.ballot_status(missing, 0), BallotStatus::NotFound);
        assert_eq!(ledger.vote_count(missing, 0), 0);
        assert_eq!(
            ledger.ballot_results(missing, 0).unwrap_err(),
            VotingError::NotFound
        );
        assert_eq!(
            ledger.option_result(missing, 0).unwrap_err(),
            VotingError::NotFound
        );
    }

    #[test]
    fn options_keep_insertion_order() {
        let ledger = InMemoryLedger::default();
        let ballot = ledger
            .create_ballot(&ctx("carol", 1), &draft(&["z", "a", "m"], 10))
            .unwrap();

        let options = ledger.ballot_options(ballot).unwrap();
        let texts: Vec<&str> = options.iter().map(|o| o.as_str()).collect();
        assert_eq!(texts, vec!["z", "a", "m"]);

        let info = ledger.ballot_info(ballot).unwrap();
        assert_eq!(info.options, options);

        for (index, expected) in (0..).zip(["z", "a", "m"]) {
            let option = ledger.option_result(ballot, index).unwrap();
            assert_eq!(option.index, index);
            assert_eq!(option.text.as_str(), expected);
        }
    }

    #[test]
    fn status_follows_time_and_deactivation() {
        let (ledger, ballot) = setup();

        assert_eq!(ledger.ballot_status(ballot, 10), BallotStatus::Active);
        assert_eq!(ledger.ballot_status(ballot, 110), BallotStatus::Active);
        assert_eq!(ledger.ballot_status(ballot, 111), BallotStatus::Ended);
        assert!(!ledger.is_ballot_active(ballot, 111));

        ledger.deactivate_ballot(&ctx("carol", 50), ballot).unwrap();
        assert_eq!(ledger.ballot_status(ballot, 50), BallotStatus::Deactivated);
        assert_eq!(ledger.ballot_status(ballot, 500), BallotStatus::Deactivated);
    }

    #[test]
    fn deactivate_authorization() {
        let (ledger, ballot) = setup();

        assert_eq!(
            ledger
                .deactivate_ballot(&ctx("alice", 11), ballot)
                .unwrap_err(),
            VotingError::Unauthorized
        );
        assert_eq!(
            ledger
                .deactivate_ballot(&ctx("alice", 11), BallotId::new(9))
                .unwrap_err(),
            VotingError::NotFound
        );

        ledger.deactivate_ballot(&ctx("carol", 12), ballot).unwrap();
        // Repeat deactivation succeeds again, including by the admin.
        ledger.deactivate_ballot(&ctx("admin", 13), ballot).unwrap();
        assert!(!ledger.ballot_info(ballot).unwrap().active);

        assert_eq!(
            ledger
                .deactivate_ballot(&ctx("alice", 14), ballot)
                .unwrap_err(),
            VotingError::Unauthorized
        );
    }

    #[test]
    fn cast_vote_records_choice_and_counts() {
        let (ledger, ballot) = setup();
        ledger.cast_vote(&ctx("alice", 15), ballot, 2).unwrap();

        assert!(ledger.has_voter_voted(ballot, &id("alice")));
        assert!(!ledger.has_voter_voted(ballot, &id("bob")));
        assert_eq!(
            ledger.voter_choice(ballot, &id("alice")),
            Some(VoteRecord {
                option_index: 2,
                vote_seq: 15
            })
        );
        assert_eq!(ledger.vote_count(ballot, 2), 1);
        assert_eq!(ledger.vote_count(ballot, 7), 0);
        assert_eq!(ledger.ballot_info(ballot).unwrap().total_votes, 1);
    }

    #[test]
    fn cast_vote_error_precedence() {
        let (ledger, ballot) = setup();

        // Missing ballot wins over an unregistered caller.
        assert_eq!(
            ledger
                .cast_vote(&ctx("mallory", 11), BallotId::new(9), 0)
                .unwrap_err(),
            VotingError::NotFound
        );
        // Unregistered wins over an invalid option.
        assert_eq!(
            ledger.cast_vote(&ctx("mallory", 11), ballot, 99).unwrap_err(),
            VotingError::Unauthorized
        );
        // Ended wins over an invalid option.
        assert_eq!(
            ledger.cast_vote(&ctx("alice", 111), ballot, 99).unwrap_err(),
            VotingError::BallotEnded
        );
        // Out-of-range option on an open ballot.
        assert_eq!(
            ledger.cast_vote(&ctx("alice", 20), ballot, 3).unwrap_err(),
            VotingError::InvalidOption
        );

        ledger.cast_vote(&ctx("alice", 21), ballot, 0).unwrap();
        // Already voted wins over an invalid option.
        assert_eq!(
            ledger.cast_vote(&ctx("alice", 22), ballot, 99).unwrap_err(),
            VotingError::AlreadyVoted
        );

        ledger.deactivate_ballot(&ctx("admin", 23), ballot).unwrap();
        // Inactive wins over ended and already voted.
        assert_eq!(
            ledger.cast_vote(&ctx("alice", 500), ballot, 0).unwrap_err(),
            VotingError::BallotInactive
        );
        assert_eq!(
            ledger.cast_vote(&ctx("bob", 24), ballot, 0).unwrap_err(),
            VotingError::BallotInactive
        );
    }

    #[test]
    fn change_vote_moves_one_unit_and_keeps_total() {
        let (ledger, ballot) = setup();
        ledger.cast_vote(&ctx("alice", 11), ballot, 0).unwrap();
        ledger.change_vote(&ctx("alice", 12), ballot, 2).unwrap();

        assert_eq!(ledger.vote_count(ballot, 0), 0);
        assert_eq!(ledger.vote_count(ballot, 2), 1);
        assert_eq!(ledger.ballot_info(ballot).unwrap().total_votes, 1);
        assert_eq!(
            ledger.voter_choice(ballot, &id("alice")),
            Some(VoteRecord {
                option_index: 2,
                vote_seq: 12
            })
        );
    }

    #[test]
    fn change_vote_error_precedence() {
        let (ledger, ballot) = setup();

        assert_eq!(
            ledger
                .change_vote(&ctx("alice", 11), BallotId::new(9), 0)
                .unwrap_err(),
            VotingError::NotFound
        );
        assert_eq!(
            ledger.change_vote(&ctx("mallory", 11), ballot, 0).unwrap_err(),
            VotingError::Unauthorized
        );
        // No prior vote is reported before the ballot's state.
        assert_eq!(
            ledger.change_vote(&ctx("alice", 500), ballot, 0).unwrap_err(),
            VotingError::NotFound
        );

        ledger.cast_vote(&ctx("alice", 20), ballot, 1).unwrap();
        assert_eq!(
            ledger.change_vote(&ctx("alice", 21), ballot, 3).unwrap_err(),
            VotingError::InvalidOption
        );
        assert_eq!(
            ledger.change_vote(&ctx("alice", 21), ballot, 1).unwrap_err(),
            VotingError::SameOption
        );
        assert_eq!(
            ledger.change_vote(&ctx("alice", 111), ballot, 1).unwrap_err(),
            VotingError::BallotEnded
        );

        ledger.deactivate_ballot(&ctx("carol", 22), ballot).unwrap();
        assert_eq!(
            ledger.change_vote(&ctx("alice", 23), ballot, 3).unwrap_err(),
            VotingError::BallotInactive
        );
    }

    #[test]
    fn results_and_option_result() {
        let (ledger, ballot) = setup();
        ledger.cast_vote(&ctx("alice", 11), ballot, 1).unwrap();
        ledger.cast_vote(&ctx("bob", 12), ballot, 1).unwrap();

        let results = ledger.ballot_results(ballot, 12).unwrap();
        assert_eq!(results.ballot_id, ballot);
        assert_eq!(results.title.as_str(), "Board election");
        assert_eq!(results.total_votes, 2);
        assert_eq!(results.status, BallotStatus::Active);
        assert_eq!(results.creator, id("carol"));
        assert_eq!((results.start_seq, results.end_seq), (10, 110));
        let counts: Vec<u64> = results.tallies.iter().map(|t| t.count).collect();
        assert_eq!(counts, vec![0, 2, 0]);
        let leaders = results.leaders();
        let names: Vec<&str> = leaders.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(names, vec!["no"]);

        let later = ledger.ballot_results(ballot, 200).unwrap();
        assert_eq!(later.status, BallotStatus::Ended);

        let option = ledger.option_result(ballot, 1).unwrap();
        assert_eq!(option.text.as_str(), "no");
        assert_eq!(option.count, 2);
        assert_eq!(
            ledger.option_result(ballot, 3).unwrap_err(),
            VotingError::InvalidOption
        );
    }

    #[test]
    fn failed_calls_leave_state_and_journal_untouched() {
        let (ledger, ballot) = setup();
        ledger.cast_vote(&ctx("alice", 11), ballot, 0).unwrap();
        let before = ledger.snapshot();
        let journal_before = ledger.journal_len();

        let failures = [
            ledger.register_voter(&ctx("alice", 12)),
            ledger.unregister_voter(&ctx("bob", 12), &id("alice")),
            ledger.update_admin(&ctx("bob", 12), id("bob")),
            ledger.create_ballot(&ctx("bob", 12), &draft(&["x"], 5)).map(|_| ()),
            ledger.deactivate_ballot(&ctx("bob", 12), ballot),
            ledger.cast_vote(&ctx("alice", 12), ballot, 1),
            ledger.change_vote(&ctx("alice", 12), ballot, 0),
        ];

        assert!(failures.iter().all(Result::is_err));
        assert_eq!(ledger.snapshot(), before);
        assert_eq!(ledger.journal_len(), journal_before);
    }

    #[test]
    fn journal_records_each_committed_call() {
        let (ledger, ballot) = setup();
        ledger.cast_vote(&ctx("alice", 11), ballot, 0).unwrap();

        let journal = ledger.journal();
        let names: Vec<&str> = journal.iter().map(|r| r.operation.name()).collect();
        assert_eq!(
            names,
            vec!["register_voter", "register_voter", "create_ballot", "cast_vote"]
        );
        assert_eq!(journal[3].caller, id("alice"));
        assert_eq!(journal[3].seq, 11);
        assert_eq!(ledger.journal_head(), journal.last().cloned());
        crate::journal::verify_chain(&journal).unwrap();
    }

    #[test]
    fn sequence_regression_is_still_applied() {
        let ledger = InMemoryLedger::default();
        ledger.register_voter(&ctx("alice", 50)).unwrap();
        ledger.register_voter(&ctx("bob", 10)).unwrap();

        assert_eq!(ledger.voter_registration_seq(&id("bob")), Some(10));
        let report = LedgerValidator::validate(&ledger);
        assert!(report.tallies_consistent);
        assert!(!report.journal_valid);
    }

    #[test]
    fn tampered_counts_are_detected() {
        let (ledger, ballot) = setup();
        ledger.cast_vote(&ctx("alice", 11), ballot, 0).unwrap();
        assert!(LedgerValidator::validate(&ledger).is_valid());

        {
            let mut guard = ledger.inner.write().unwrap();
            *guard.vote_counts.get_mut(&(ballot, 2)).unwrap() = 5;
        }

        let report = LedgerValidator::validate(&ledger);
        assert!(report.journal_valid);
        assert!(!report.tallies_consistent);
    }

    #[test]
    fn independent_instances_do_not_share_state() {
        let a = InMemoryLedger::with_admin(id("admin-a"));
        let b = InMemoryLedger::with_admin(id("admin-b"));
        a.register_voter(&ctx("alice", 1)).unwrap();

        assert!(a.is_voter_registered(&id("alice")));
        assert!(!b.is_voter_registered(&id("alice")));
        assert!(b.is_admin(&id("admin-b")));
        assert!(!a.is_admin(&id("admin-b")));
    }
}
