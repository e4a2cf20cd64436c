//! JSON call scripts.
//!
//! A script names callers by account label instead of raw identity, so it
//! can be written by hand:
//!
//! ```json
//! {
//!   "admin": "admin",
//!   "steps": [
//!     { "caller": "alice", "seq": 1, "op": "register_voter" },
//!     { "caller": "alice", "seq": 2, "op": "create_ballot", "title": "Lunch",
//!       "description": "", "options": ["pizza", "tacos"], "duration": 10 },
//!     { "caller": "alice", "seq": 3, "op": "cast_vote", "ballot": 1, "option": 0 }
//!   ]
//! }
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ballot_ledger::{apply, BallotDraft, CallContext, InMemoryLedger, Operation};
use ballot_types::{BallotId, Identity, OptionIndex, Seq};

#[derive(Clone, Debug, Deserialize)]
pub struct Script {
    /// Account label of the initial admin.
    #[serde(default)]
    pub admin: Option<String>,
    pub steps: Vec<ScriptStep>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ScriptStep {
    pub caller: String,
    pub seq: Seq,
    #[serde(flatten)]
    pub call: ScriptCall,
}

/// [`Operation`] with identities given as account labels.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptCall {
    RegisterVoter,
    UnregisterVoter { target: String },
    UpdateAdmin { new_admin: String },
    CreateBallot(BallotDraft),
    DeactivateBallot { ballot: BallotId },
    CastVote { ballot: BallotId, option: OptionIndex },
    ChangeVote { ballot: BallotId, option: OptionIndex },
}

impl ScriptCall {
    pub fn to_operation(&self) -> Operation {
        match self {
            Self::RegisterVoter => Operation::RegisterVoter,
            Self::UnregisterVoter { target } => Operation::UnregisterVoter {
                target: Identity::from_label(target),
            },
            Self::UpdateAdmin { new_admin } => Operation::UpdateAdmin {
                new_admin: Identity::from_label(new_admin),
            },
            Self::CreateBallot(draft) => Operation::CreateBallot(draft.clone()),
            Self::DeactivateBallot { ballot } => Operation::DeactivateBallot { ballot: *ballot },
            Self::CastVote { ballot, option } => Operation::CastVote {
                ballot: *ballot,
                option: *option,
            },
            Self::ChangeVote { ballot, option } => Operation::ChangeVote {
                ballot: *ballot,
                option: *option,
            },
        }
    }
}

impl Script {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("invalid script")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        Self::from_json(&text)
    }

    /// Highest sequence value any step executes at.
    pub fn last_seq(&self) -> Seq {
        self.steps.iter().map(|s| s.seq).max().unwrap_or(0)
    }

    /// Apply every step in order, collecting one report per step.
    pub fn execute(&self, ledger: &InMemoryLedger) -> Vec<StepReport> {
        self.steps
            .iter()
            .enumerate()
            .map(|(position, step)| {
                let operation = step.call.to_operation();
                let ctx = CallContext::new(Identity::from_label(&step.caller), step.seq);
                let result = apply(ledger, &ctx, &operation);
                debug!(
                    step = position + 1,
                    caller = %step.caller,
                    seq = step.seq,
                    op = operation.name(),
                    ok = result.is_ok(),
                    "script step"
                );
                StepReport {
                    step: position + 1,
                    caller: step.caller.clone(),
                    seq: step.seq,
                    op: operation.name(),
                    outcome: result.as_ref().ok().map(ToString::to_string),
                    error: result.err().map(|e| StepError {
                        code: e.code(),
                        name: e.as_str(),
                        message: e.to_string(),
                    }),
                }
            })
            .collect()
    }
}

/// What happened to one script step.
#[derive(Clone, Debug, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub caller: String,
    pub seq: Seq,
    pub op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StepError>,
}

impl StepReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StepError {
    pub code: u32,
    pub name: &'static str,
    pub message: String,
}
