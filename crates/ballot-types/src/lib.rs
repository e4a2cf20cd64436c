//! Foundation types for the ballot ledger.
//!
//! This crate provides the identity, identifier, and boundary types shared by
//! the ledger and its front ends. Every other ballot crate depends on
//! `ballot-types`.
//!
//! # Key Types
//!
//! - [`Identity`] - Opaque authenticated principal derived from identity material
//! - [`BallotId`] - Sequentially assigned ballot identifier (starting at 1)
//! - [`Seq`] - Externally supplied, non-decreasing sequence counter value
//! - [`BoundedText`] - Length-capped text used for titles, descriptions, options
//! - [`OptionList`] - Ordered option texts, capped at [`limits::MAX_OPTIONS`]

pub mod bounded;
pub mod error;
pub mod identity;
pub mod ids;
pub mod limits;

pub use bounded::{BoundedText, Description, OptionList, OptionText, Title};
pub use error::TypeError;
pub use identity::{Identity, IdentityMaterial};
pub use ids::{BallotId, OptionIndex, Seq};
