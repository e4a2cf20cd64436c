//! Length-capped containers for ballot text.
//!
//! These types form the call boundary: a title longer than
//! [`MAX_TITLE_LEN`] or an option list with more than [`MAX_OPTIONS`] entries
//! cannot be constructed, so oversized input is rejected before any ledger
//! validation runs. Lengths are counted in characters, not bytes.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;
use crate::limits::{MAX_DESCRIPTION_LEN, MAX_OPTIONS, MAX_OPTION_LEN, MAX_TITLE_LEN};

/// UTF-8 text holding at most `MAX` characters.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BoundedText<const MAX: usize>(String);

/// Ballot title.
pub type Title = BoundedText<MAX_TITLE_LEN>;
/// Ballot description.
pub type Description = BoundedText<MAX_DESCRIPTION_LEN>;
/// Text of a single ballot option.
pub type OptionText = BoundedText<MAX_OPTION_LEN>;

impl<const MAX: usize> BoundedText<MAX> {
    pub fn new(text: impl Into<String>) -> Result<Self, TypeError> {
        let text = text.into();
        let actual = text.chars().count();
        if actual > MAX {
            return Err(TypeError::TooLong { max: MAX, actual });
        }
        Ok(Self(text))
    }

    pub const fn max_len() -> usize {
        MAX
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<const MAX: usize> Deref for BoundedText<MAX> {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl<const MAX: usize> TryFrom<String> for BoundedText<MAX> {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<const MAX: usize> TryFrom<&str> for BoundedText<MAX> {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<const MAX: usize> fmt::Debug for BoundedText<MAX> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl<const MAX: usize> fmt::Display for BoundedText<MAX> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<const MAX: usize> Serialize for BoundedText<MAX> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de, const MAX: usize> Deserialize<'de> for BoundedText<MAX> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

/// Ordered option texts; insertion order is the display and index order.
///
/// Holds at most [`MAX_OPTIONS`] entries. The lower bound is a ledger rule
/// (`TooFewOptions`), not a construction rule.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct OptionList(Vec<OptionText>);

impl OptionList {
    pub fn new(options: Vec<OptionText>) -> Result<Self, TypeError> {
        if options.len() > MAX_OPTIONS {
            return Err(TypeError::TooManyItems {
                max: MAX_OPTIONS,
                actual: options.len(),
            });
        }
        Ok(Self(options))
    }

    /// Build from raw strings, checking every text bound and the list bound.
    pub fn from_texts<I, S>(texts: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options = texts
            .into_iter()
            .map(OptionText::new)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(options)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&OptionText> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OptionText> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[OptionText] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a OptionList {
    type Item = &'a OptionText;
    type IntoIter = std::slice::Iter<'a, OptionText>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for OptionList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let options = Vec::<OptionText>::deserialize(deserializer)?;
        Self::new(options).map_err(serde::de::Error::custom)
    }
}
