use ballot_types::BallotId;

use crate::journal::Receipt;
use crate::memory::InMemoryLedger;
use crate::records::LedgerSnapshot;

/// Result of auditing a ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub receipt_count: u64,
    pub ballot_count: u64,
    pub journal_valid: bool,
    pub tallies_consistent: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific problem found during validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Journal index of the offending receipt, for journal violations.
    pub receipt: Option<u64>,
    /// Offending ballot, for tally violations.
    pub ballot: Option<BallotId>,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    IndexGap,
    HashChainBreak,
    HashMismatch,
    SeqRegression,
    /// Sum of option counts differs from the number of vote records.
    CountMismatch,
    /// `total_votes` differs from the number of vote records.
    TotalMismatch,
    /// Count rows do not line up one-to-one with the ballot's options.
    CountRowMismatch,
    /// A vote record points past the ballot's option list.
    VoteOutOfRange,
    /// Votes or counts exist for a ballot that does not.
    OrphanedRows,
}

/// Journal and tally auditor.
pub struct LedgerValidator;

impl LedgerValidator {
    /// Audit the journal and every ballot's tallies.
    pub fn validate(ledger: &InMemoryLedger) -> ValidationReport {
        let receipts = ledger.journal();
        let snapshot = ledger.snapshot();

        let journal_violations = Self::validate_journal(&receipts);
        let tally_violations = Self::validate_tallies(&snapshot);
        let journal_valid = journal_violations.is_empty();
        let tallies_consistent = tally_violations.is_empty();

        let mut violations = journal_violations;
        violations.extend(tally_violations);

        ValidationReport {
            receipt_count: receipts.len() as u64,
            ballot_count: snapshot.ballots.len() as u64,
            journal_valid,
            tallies_consistent,
            violations,
        }
    }

    /// Check index continuity, hash links, recomputed hashes, and sequence
    /// ordering for every receipt, collecting all violations.
    pub fn validate_journal(receipts: &[Receipt]) -> Vec<Violation> {
        let mut violations = Vec::new();
        let journal_violation = |kind, receipt: &Receipt, description: String| Violation {
            kind,
            receipt: Some(receipt.index),
            ballot: None,
            description,
        };

        for (position, receipt) in receipts.iter().enumerate() {
            let expected_index = position as u64 + 1;
            if receipt.index != expected_index {
                violations.push(journal_violation(
                    ViolationKind::IndexGap,
                    receipt,
                    format!("expected index {expected_index}, got {}", receipt.index),
                ));
            }

            let previous = position.checked_sub(1).map(|p| &receipts[p]);
            if receipt.prev_hash != previous.map(|p| p.receipt_hash) {
                violations.push(journal_violation(
                    ViolationKind::HashChainBreak,
                    receipt,
                    "previous hash link mismatch".into(),
                ));
            }

            if receipt.compute_hash() != receipt.receipt_hash {
                violations.push(journal_violation(
                    ViolationKind::HashMismatch,
                    receipt,
                    "receipt hash does not match computed".into(),
                ));
            }

            if let Some(prev) = previous {
                if receipt.seq < prev.seq {
                    violations.push(journal_violation(
                        ViolationKind::SeqRegression,
                        receipt,
                        format!("seq {} follows seq {}", receipt.seq, prev.seq),
                    ));
                }
            }
        }

        violations
    }

    /// For every ballot: `sum(counts) == vote records == total_votes`, one
    /// count row per option, and every vote inside the option range.
    pub fn validate_tallies(snapshot: &LedgerSnapshot) -> Vec<Violation> {
        let mut violations = Vec::new();
        let tally_violation = |kind, ballot: BallotId, description: String| Violation {
            kind,
            receipt: None,
            ballot: Some(ballot),
            description,
        };

        for (id, ballot) in &snapshot.ballots {
            let votes = snapshot.votes.get(id);
            let counts = snapshot.vote_counts.get(id);
            let vote_records = votes.map_or(0, |v| v.len() as u64);
            let count_sum: u64 = counts.map_or(0, |c| c.values().sum());

            if count_sum != vote_records {
                violations.push(tally_violation(
                    ViolationKind::CountMismatch,
                    *id,
                    format!("option counts sum to {count_sum}, {vote_records} vote record(s)"),
                ));
            }

            if ballot.total_votes != vote_records {
                violations.push(tally_violation(
                    ViolationKind::TotalMismatch,
                    *id,
                    format!(
                        "total_votes is {}, {vote_records} vote record(s)",
                        ballot.total_votes
                    ),
                ));
            }

            let rows_match = counts.is_some_and(|c| {
                c.len() == ballot.option_count()
                    && c.keys().all(|option| ballot.has_option(*option))
            });
            if !rows_match {
                violations.push(tally_violation(
                    ViolationKind::CountRowMismatch,
                    *id,
                    format!("expected {} count row(s)", ballot.option_count()),
                ));
            }

            for (voter, record) in votes.into_iter().flatten() {
                if !ballot.has_option(record.option_index) {
                    violations.push(tally_violation(
                        ViolationKind::VoteOutOfRange,
                        *id,
                        format!("{voter} voted for option {}", record.option_index),
                    ));
                }
            }
        }

        let orphans = snapshot
            .votes
            .keys()
            .chain(snapshot.vote_counts.keys())
            .filter(|id| !snapshot.ballots.contains_key(*id));
        for id in orphans {
            violations.push(tally_violation(
                ViolationKind::OrphanedRows,
                *id,
                "rows reference a missing ballot".into(),
            ));
        }

        violations
    }
}
