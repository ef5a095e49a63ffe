//! Record key type.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, InvalidInputError};
use crate::schema::KeyPolicy;

/// A stable record identifier.
///
/// Keys are either assigned by the store (`Auto`, a monotonically increasing
/// integer that is never reused) or supplied by the caller (`External`, a
/// string such as a locally generated UUID). A key never changes once
/// assigned.
///
/// Keys order numerically for `Auto` and lexically for `External`, which is
/// the iteration order of a store.
///
/// # Example
///
/// ```
/// use curator_core::RecordKey;
/// use curator_core::schema::KeyPolicy;
///
/// let key = RecordKey::parse("42", KeyPolicy::Auto).unwrap();
/// assert_eq!(key, RecordKey::Auto(42));
///
/// let key = RecordKey::parse("42", KeyPolicy::External).unwrap();
/// assert_eq!(key.to_string(), "42");
/// assert!(key.is_external());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawKey", into = "RawKey")]
pub enum RecordKey {
    /// Store-assigned integer key.
    Auto(u64),
    /// Caller-assigned string key.
    External(String),
}

/// Wire form of a key: integers for auto keys, strings for external keys.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawKey {
    Int(u64),
    Text(String),
}

impl RecordKey {
    /// Create a validated external key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty, longer than 512 characters,
    /// `.` or `..`, or contains characters outside `A-Z a-z 0-9 . - _ ~ :`.
    pub fn external(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(RecordKey::External(s))
    }

    /// Parse a key typed by a user, interpreting it per the store's policy.
    pub fn parse(s: &str, policy: KeyPolicy) -> Result<Self, Error> {
        match policy {
            KeyPolicy::Auto => s.parse::<u64>().map(RecordKey::Auto).map_err(|_| {
                InvalidInputError::RecordKey {
                    value: s.to_string(),
                    reason: "auto keys are unsigned integers".to_string(),
                }
                .into()
            }),
            KeyPolicy::External => Self::external(s),
        }
    }

    /// Returns true for store-assigned keys.
    pub fn is_auto(&self) -> bool {
        matches!(self, RecordKey::Auto(_))
    }

    /// Returns true for caller-assigned keys.
    pub fn is_external(&self) -> bool {
        matches!(self, RecordKey::External(_))
    }

    /// The key policy this key belongs to.
    pub fn policy(&self) -> KeyPolicy {
        match self {
            RecordKey::Auto(_) => KeyPolicy::Auto,
            RecordKey::External(_) => KeyPolicy::External,
        }
    }

    fn validate(s: &str) -> Result<(), Error> {
        if s.is_empty() {
            return Err(InvalidInputError::RecordKey {
                value: s.to_string(),
                reason: "cannot be empty".to_string(),
            }
            .into());
        }

        if s.len() > 512 {
            return Err(InvalidInputError::RecordKey {
                value: s.to_string(),
                reason: "exceeds maximum length of 512 characters".to_string(),
            }
            .into());
        }

        if s == "." || s == ".." {
            return Err(InvalidInputError::RecordKey {
                value: s.to_string(),
                reason: "cannot be '.' or '..'".to_string(),
            }
            .into());
        }

        for c in s.chars() {
            if !c.is_ascii_alphanumeric() && !matches!(c, '.' | '-' | '_' | '~' | ':') {
                return Err(InvalidInputError::RecordKey {
                    value: s.to_string(),
                    reason: format!("contains invalid character '{}'", c),
                }
                .into());
            }
        }

        Ok(())
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Auto(n) => write!(f, "{}", n),
            RecordKey::External(s) => write!(f, "{}", s),
        }
    }
}

impl TryFrom<RawKey> for RecordKey {
    type Error = Error;

    fn try_from(raw: RawKey) -> Result<Self, Self::Error> {
        match raw {
            RawKey::Int(n) => Ok(RecordKey::Auto(n)),
            RawKey::Text(s) => Self::external(s),
        }
    }
}

impl From<RecordKey> for RawKey {
    fn from(key: RecordKey) -> Self {
        match key {
            RecordKey::Auto(n) => RawKey::Int(n),
            RecordKey::External(s) => RawKey::Text(s),
        }
    }
}

impl From<u64> for RecordKey {
    fn from(n: u64) -> Self {
        RecordKey::Auto(n)
    }
}
