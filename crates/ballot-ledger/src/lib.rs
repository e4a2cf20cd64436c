//! Transactional voting ledger.
//!
//! This crate holds the whole state machine. It provides:
//! - Voter registry, ballot lifecycle, vote casting and vote changes
//! - `VotingCommands` / `VotingQueries` trait boundaries
//! - `InMemoryLedger`, a single-lock implementation with all-or-nothing calls
//! - The `Operation` call envelope and its literal success payloads
//! - A hash-linked receipt journal of committed calls
//! - Journal and tally validation, and deterministic replay

pub mod config;
pub mod error;
pub mod journal;
pub mod memory;
pub mod operation;
pub mod records;
pub mod replay;
pub mod traits;
pub mod validation;

pub use config::LedgerConfig;
pub use error::{LedgerError, VotingError};
pub use journal::{Journal, Receipt};
pub use memory::InMemoryLedger;
pub use operation::{apply, Operation, Outcome};
pub use records::{
    Ballot, BallotDraft, BallotResults, BallotStatus, CallContext, LedgerSnapshot, OptionResult,
    VoteRecord, VoterRecord,
};
pub use replay::ReplayEngine;
pub use traits::{VotingCommands, VotingQueries};
pub use validation::{LedgerValidator, ValidationReport, Violation, ViolationKind};
