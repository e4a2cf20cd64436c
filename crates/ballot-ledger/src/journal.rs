//! Hash-linked receipt journal of committed operations.
//!
//! Every committed mutating call appends one [`Receipt`]. Each receipt hashes
//! its own content together with the previous receipt's hash, so editing,
//! dropping, or reordering any past receipt breaks the chain.

use serde::{Deserialize, Serialize};

use ballot_types::{Identity, Seq};

use crate::error::LedgerError;
use crate::operation::Operation;
use crate::records::CallContext;

const RECEIPT_DOMAIN: &[u8] = b"ballot-receipt-v1:";

/// Journal entry for one committed operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Position in the journal, starting at 1.
    pub index: u64,
    /// Sequence value the operation executed at.
    pub seq: Seq,
    pub caller: Identity,
    pub operation: Operation,
    pub prev_hash: Option<[u8; 32]>,
    pub receipt_hash: [u8; 32],
}

impl Receipt {
    pub fn context(&self) -> CallContext {
        CallContext::new(self.caller, self.seq)
    }

    /// Recompute this receipt's hash from its content.
    pub fn compute_hash(&self) -> [u8; 32] {
        compute_hash(
            self.index,
            self.seq,
            &self.caller,
            &self.operation,
            self.prev_hash,
        )
    }

    pub fn short_hash(&self) -> String {
        hex::encode(&self.receipt_hash[..4])
    }
}

fn compute_hash(
    index: u64,
    seq: Seq,
    caller: &Identity,
    operation: &Operation,
    prev_hash: Option<[u8; 32]>,
) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(RECEIPT_DOMAIN);
    hasher.update(&index.to_le_bytes());
    hasher.update(&seq.to_le_bytes());
    hasher.update(caller.as_bytes());
    match prev_hash {
        Some(prev) => {
            hasher.update(&[1]);
            hasher.update(&prev);
        }
        None => {
            hasher.update(&[0]);
        }
    }
    operation.write_canonical(&mut hasher);
    *hasher.finalize().as_bytes()
}

/// Append-only sequence of receipts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Journal {
    receipts: Vec<Receipt>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a receipt for `operation` executed under `ctx`.
    pub fn append(&mut self, ctx: &CallContext, operation: Operation) -> &Receipt {
        let index = self.receipts.len() as u64 + 1;
        let prev_hash = self.receipts.last().map(|r| r.receipt_hash);
        let receipt_hash = compute_hash(index, ctx.seq, &ctx.caller, &operation, prev_hash);
        self.receipts.push(Receipt {
            index,
            seq: ctx.seq,
            caller: ctx.caller,
            operation,
            prev_hash,
            receipt_hash,
        });
        &self.receipts[self.receipts.len() - 1]
    }

    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    pub fn head(&self) -> Option<&Receipt> {
        self.receipts.last()
    }

    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn receipts_mut(&mut self) -> &mut Vec<Receipt> {
        &mut self.receipts
    }
}

/// Check index continuity, hash links, and recomputed hashes, stopping at the
/// first broken receipt.
pub fn verify_chain(receipts: &[Receipt]) -> Result<(), LedgerError> {
    for (position, receipt) in receipts.iter().enumerate() {
        let expected_index = position as u64 + 1;
        if receipt.index != expected_index {
            return Err(LedgerError::IntegrityViolation {
                index: receipt.index,
                reason: format!("expected index {expected_index}, found {}", receipt.index),
            });
        }

        let expected_prev = position
            .checked_sub(1)
            .map(|prev| receipts[prev].receipt_hash);
        if receipt.prev_hash != expected_prev {
            return Err(LedgerError::IntegrityViolation {
                index: receipt.index,
                reason: "previous hash link mismatch".into(),
            });
        }

        if receipt.compute_hash() != receipt.receipt_hash {
            return Err(LedgerError::IntegrityViolation {
                index: receipt.index,
                reason: "receipt hash mismatch".into(),
            });
        }
    }
    Ok(())
}
