//! Collection name type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A validated logical collection name.
///
/// Collection names are short lowercase identifiers such as `banners` or
/// `magazines`. They name the logical collection, not the store holding it;
/// the [`SchemaRegistry`](crate::schema::SchemaRegistry) maps one to the other.
///
/// # Example
///
/// ```
/// use curator_core::CollectionName;
///
/// let name = CollectionName::new("news").unwrap();
/// assert_eq!(name.as_str(), "news");
/// assert!(CollectionName::new("News Items").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionName(String);

impl CollectionName {
    /// Create a new collection name, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty, longer than 64 characters,
    /// or contains anything other than `a-z`, `0-9`, `-` and `_`.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Returns the collection name string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        if s.is_empty() {
            return Err(InvalidInputError::Collection {
                value: s.to_string(),
                reason: "cannot be empty".to_string(),
            }
            .into());
        }

        if s.len() > 64 {
            return Err(InvalidInputError::Collection {
                value: s.to_string(),
                reason: "exceeds maximum length of 64 characters".to_string(),
            }
            .into());
        }

        if !s.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Err(InvalidInputError::Collection {
                value: s.to_string(),
                reason: "must start with a lowercase letter".to_string(),
            }
            .into());
        }

        for c in s.chars() {
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' && c != '_' {
                return Err(InvalidInputError::Collection {
                    value: s.to_string(),
                    reason: format!("contains invalid character '{}'", c),
                }
                .into());
            }
        }

        Ok(())
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CollectionName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CollectionName {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<CollectionName> for String {
    fn from(name: CollectionName) -> Self {
        name.0
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
