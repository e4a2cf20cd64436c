use std::fmt;

use serde::{Deserialize, Serialize};

/// Value of the externally supplied, non-decreasing sequence counter.
pub type Seq = u64;

/// Zero-based position of an option within a ballot's option list.
pub type OptionIndex = u32;

/// Sequentially assigned ballot identifier. The first ballot is `#1`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BallotId(u64);

impl BallotId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// The identifier that follows this one.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl From<u64> for BallotId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Debug for BallotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BallotId({})", self.0)
    }
}

impl fmt::Display for BallotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
