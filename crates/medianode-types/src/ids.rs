//! Identifiers used throughout medianode.
//!
//! Both identifiers are validated once, at construction, and carried
//! internally without re-parsing. Deserialization goes through the same
//! validation (`serde(try_from)`), so a genesis file or store value can
//! never smuggle in a malformed id.

use std::{fmt, str::FromStr};

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{MedianodeError, Result, constants};

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// A validated account address of the form `<hrp>1<data>`.
///
/// `hrp` is 1–16 lowercase ASCII letters, `data` is 8–90 lowercase ASCII
/// alphanumerics. Since `hrp` contains no digits, the first `1` is always
/// the separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Parse and validate an address string.
    ///
    /// # Errors
    /// Returns `InvalidAddress` if the string is not a well-formed address.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = |reason: &str| MedianodeError::InvalidAddress {
            reason: format!("{s:?}: {reason}"),
        };

        let (hrp, data) = s.split_once('1').ok_or_else(|| invalid("missing separator"))?;
        if hrp.is_empty() || hrp.len() > 16 || !hrp.bytes().all(|b| b.is_ascii_lowercase()) {
            return Err(invalid("prefix must be 1-16 lowercase letters"));
        }
        if data.len() < 8 || data.len() > 90 {
            return Err(invalid("data part must be 8-90 characters"));
        }
        if !data
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        {
            return Err(invalid("data part must be lowercase alphanumeric"));
        }
        Ok(Self(s.to_string()))
    }

    /// Deterministic address of a module account (escrow, fee collector, ...).
    #[must_use]
    pub fn module(name: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"module:");
        hasher.update(name.as_bytes());
        Self::from_digest(&hasher.finalize())
    }

    /// Address of a user account controlled by an ed25519 key.
    #[must_use]
    pub fn from_public_key(key: &VerifyingKey) -> Self {
        Self::from_digest(&Sha256::digest(key.as_bytes()))
    }

    fn from_digest(digest: &[u8]) -> Self {
        Self(format!(
            "{}1{}",
            constants::ADDRESS_PREFIX,
            hex::encode(&digest[..constants::ADDRESS_BYTES])
        ))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for log lines (`mnode1abcd…`).
    #[must_use]
    pub fn short(&self) -> &str {
        let end = self.0.len().min(constants::ADDRESS_PREFIX.len() + 9);
        &self.0[..end]
    }
}

impl TryFrom<String> for AccountId {
    type Error = MedianodeError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl FromStr for AccountId {
    type Err = MedianodeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account fixtures for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl AccountId {
    /// Deterministic address derived from a fixed-seed ed25519 key.
    #[must_use]
    pub fn from_seed(seed: u8) -> Self {
        let key = ed25519_dalek::SigningKey::from_bytes(&[seed; 32]);
        Self::from_public_key(&key.verifying_key())
    }

    /// Address of a freshly generated random key.
    #[cfg(feature = "test-helpers")]
    #[must_use]
    pub fn random() -> Self {
        let key = ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng);
        Self::from_public_key(&key.verifying_key())
    }
}

// ---------------------------------------------------------------------------
// ResourceId
// ---------------------------------------------------------------------------

/// Unique identifier of a registered medianode.
///
/// 3–64 ASCII alphanumerics starting with a letter. Either chosen by the
/// registering client or generated from the module counter (`mn<n>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId(String);

impl ResourceId {
    /// Parse and validate a resource id.
    ///
    /// # Errors
    /// Returns `InvalidResource` if the id is malformed.
    pub fn parse(s: &str) -> Result<Self> {
        let len_ok = (constants::MIN_RESOURCE_ID_LEN..=constants::MAX_RESOURCE_ID_LEN)
            .contains(&s.len());
        let starts_alpha = s.bytes().next().is_some_and(|b| b.is_ascii_alphabetic());
        if !len_ok || !starts_alpha || !s.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(MedianodeError::InvalidResource {
                reason: format!(
                    "invalid resource id {s:?}: expected {}-{} alphanumerics starting with a letter",
                    constants::MIN_RESOURCE_ID_LEN,
                    constants::MAX_RESOURCE_ID_LEN,
                ),
            });
        }
        Ok(Self(s.to_string()))
    }

    /// Id generated from the module's monotonic counter.
    #[must_use]
    pub fn from_counter(n: u64) -> Self {
        Self(format!("{}{n}", constants::RESOURCE_ID_PREFIX))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl TryFrom<String> for ResourceId {
    type Error = MedianodeError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

impl FromStr for ResourceId {
    type Err = MedianodeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
