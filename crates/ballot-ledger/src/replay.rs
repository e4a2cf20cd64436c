use tracing::debug;

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::journal::{self, Receipt};
use crate::memory::InMemoryLedger;
use crate::operation;

/// Deterministic replay of receipt journals into fresh ledgers.
pub struct ReplayEngine;

impl ReplayEngine {
    /// Rebuild a ledger by re-applying every receipt under `config`.
    ///
    /// The chain is verified first. Every receipt records a committed call,
    /// so any call the fresh ledger rejects means the journal does not belong
    /// to this configuration.
    pub fn replay(
        config: &LedgerConfig,
        receipts: &[Receipt],
    ) -> Result<InMemoryLedger, LedgerError> {
        Self::replay_until(config, receipts, u64::MAX)
    }

    /// Rebuild the ledger as it stood right after receipt `last_index`.
    pub fn replay_until(
        config: &LedgerConfig,
        receipts: &[Receipt],
        last_index: u64,
    ) -> Result<InMemoryLedger, LedgerError> {
        journal::verify_chain(receipts)?;

        let ledger = InMemoryLedger::new(config.clone());
        let mut applied = 0u64;
        for receipt in receipts.iter().take_while(|r| r.index <= last_index) {
            operation::apply(&ledger, &receipt.context(), &receipt.operation).map_err(|error| {
                LedgerError::ReplayRejected {
                    index: receipt.index,
                    error,
                }
            })?;
            applied += 1;
        }
        debug!(applied, "journal replayed");

        Ok(ledger)
    }

    /// Replay `ledger`'s own journal and compare the rebuilt state with the
    /// live state. A ledger running without a journal only converges while
    /// it is still empty.
    pub fn verify_convergence(ledger: &InMemoryLedger) -> Result<bool, LedgerError> {
        let replayed = Self::replay(ledger.config(), &ledger.journal())?;
        Ok(replayed.snapshot() == ledger.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use ballot_types::{BallotId, Description, Identity, OptionList, Title};

    use super::*;
    use crate::error::VotingError;
    use crate::records::{BallotDraft, CallContext};
    use crate::traits::{VotingCommands, VotingQueries};

    fn ctx(label: &str, seq: u64) -> CallContext {
        CallContext::new(Identity::from_label(label), seq)
    }

    fn draft() -> BallotDraft {
        BallotDraft {
            title: Title::new("Venue").unwrap(),
            description: Description::new("Where should we meet?").unwrap(),
            options: OptionList::from_texts(["park", "library", "cafe"]).unwrap(),
            duration: 20,
        }
    }

    fn busy_ledger() -> InMemoryLedger {
        let ledger = InMemoryLedger::default();
        ledger.register_voter(&ctx("alice", 1)).unwrap();
        ledger.register_voter(&ctx("bob", 2)).unwrap();
        let id = ledger.create_ballot(&ctx("bob", 3), &draft()).unwrap();
        ledger.cast_vote(&ctx("alice", 4), id, 2).unwrap();
        ledger.cast_vote(&ctx("bob", 5), id, 1).unwrap();
        ledger.change_vote(&ctx("alice", 6), id, 1).unwrap();
        ledger
            .unregister_voter(&ctx("admin", 7), &Identity::from_label("bob"))
            .unwrap();
        ledger.deactivate_ballot(&ctx("admin", 8), id).unwrap();
        ledger
    }

    #[test]
    fn replay_converges_with_live_ledger() {
        let ledger = busy_ledger();
        assert!(ReplayEngine::verify_convergence(&ledger).unwrap());

        let replayed = ReplayEngine::replay(ledger.config(), &ledger.journal()).unwrap();
        assert_eq!(replayed.journal(), ledger.journal());
    }

    #[test]
    fn replay_until_reconstructs_history() {
        let ledger = busy_ledger();
        let earlier = ReplayEngine::replay_until(ledger.config(), &ledger.journal(), 5).unwrap();

        let id = BallotId::new(1);
        assert_eq!(earlier.vote_count(id, 2), 1);
        assert_eq!(earlier.vote_count(id, 1), 1);
        assert!(earlier.is_voter_registered(&Identity::from_label("bob")));
        assert!(earlier.is_ballot_active(id, 10));
    }

    #[test]
    fn replay_under_foreign_admin_is_rejected() {
        let ledger = busy_ledger();
        let foreign = LedgerConfig::with_admin(Identity::from_label("mallory"));
        let Err(err) = ReplayEngine::replay(&foreign, &ledger.journal()) else {
            panic!("replay under a foreign admin should fail");
        };
        assert_eq!(
            err,
            LedgerError::ReplayRejected {
                index: 7,
                error: VotingError::Unauthorized
            }
        );
    }

    #[test]
    fn replay_refuses_broken_chain() {
        let ledger = busy_ledger();
        let mut receipts = ledger.journal();
        receipts.swap(0, 1);
        let Err(err) = ReplayEngine::replay(ledger.config(), &receipts) else {
            panic!("replay of a reordered journal should fail");
        };
        assert!(matches!(err, LedgerError::IntegrityViolation { .. }));
    }

    #[test]
    fn ledger_without_journal_does_not_converge() {
        let config = LedgerConfig {
            journal: false,
            ..Default::default()
        };
        let ledger = InMemoryLedger::new(config);
        assert!(ReplayEngine::verify_convergence(&ledger).unwrap());

        ledger.register_voter(&ctx("alice", 1)).unwrap();
        assert_eq!(ledger.journal_len(), 0);
        assert!(!ReplayEngine::verify_convergence(&ledger).unwrap());
    }
}
