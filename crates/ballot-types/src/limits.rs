//! Protocol limits enforced at the call boundary and during validation.

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 100;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Maximum length of a single option's text in characters.
pub const MAX_OPTION_LEN: usize = 50;

/// Fewest options a ballot may carry.
pub const MIN_OPTIONS: usize = 2;

/// Most options a ballot may carry.
pub const MAX_OPTIONS: usize = 10;

/// First ballot identifier handed out by a fresh ledger.
pub const FIRST_BALLOT_ID: u64 = 1;
