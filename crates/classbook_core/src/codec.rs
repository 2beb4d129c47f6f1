//! Identifier codec between store keys and API identifiers.
//!
//! # Responsibility
//! - Define the store-native record key (`DocumentKey`).
//! - Define the opaque API-facing scalar (`Identifier`).
//! - Convert between the two in both directions.
//!
//! # Invariants
//! - `decode(encode(key)) == key` for every key the store assigns.
//! - `decode` accepts exactly one textual form: 32 lowercase hex characters.
//! - The nil UUID is never a valid identifier.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ENCODED_LEN: usize = 32;

/// Store-native record key. Assigned once at insert, never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKey(Uuid);

impl DocumentKey {
    /// Generates a fresh random key. Only the repository insert path calls this.
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub(crate) fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Display for DocumentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier exposed to API callers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Wraps caller-supplied text. No validation happens until `decode`.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Raised when an identifier is not a valid encoding of a store key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierError {
    input: String,
}

impl IdentifierError {
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl Display for IdentifierError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed identifier `{}`", self.input)
    }
}

impl Error for IdentifierError {}

/// Produces the API identifier for a store key.
pub fn encode(key: DocumentKey) -> Identifier {
    Identifier(key.0.simple().to_string())
}

/// Recovers the store key from an API identifier.
///
/// # Errors
/// - Returns `IdentifierError` for any text other than 32 lowercase hex
///   characters, and for the nil key.
pub fn decode(id: &Identifier) -> Result<DocumentKey, IdentifierError> {
    let text = id.as_str();
    let well_formed = text.len() == ENCODED_LEN
        && text
            .bytes()
            .all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte));
    if !well_formed {
        return Err(malformed(text));
    }

    let uuid = Uuid::try_parse(text).map_err(|_| malformed(text))?;
    if uuid.is_nil() {
        return Err(malformed(text));
    }
    Ok(DocumentKey(uuid))
}

fn malformed(text: &str) -> IdentifierError {
    // Capped: the input is caller-controlled and ends up in error messages.
    IdentifierError {
        input: text.chars().take(64).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_produces_simple_lowercase_hex() {
        let key = DocumentKey::generate();
        let id = encode(key);
        assert_eq!(id.as_str().len(), 32);
        assert!(!id.as_str().contains('-'));
        assert_eq!(id.as_str(), id.as_str().to_ascii_lowercase());
    }

    #[test]
    fn decode_reverses_encode() {
        let key = DocumentKey::generate();
        assert_eq!(decode(&encode(key)).unwrap(), key);
    }

    #[test]
    fn decode_rejects_hyphenated_and_uppercase_forms() {
        let key = DocumentKey::generate();
        let hyphenated = Identifier::new(key.as_uuid().to_string());
        let upper = Identifier::new(encode(key).as_str().to_ascii_uppercase());
        assert!(decode(&hyphenated).is_err());
        assert!(decode(&upper).is_err());
    }

    #[test]
    fn decode_rejects_nil_and_garbage() {
        let nil = Identifier::new("0".repeat(32));
        assert!(decode(&nil).is_err());
        assert!(decode(&Identifier::new("")).is_err());
        assert!(decode(&Identifier::new("rogue")).is_err());
        assert!(decode(&Identifier::new("g".repeat(32))).is_err());
    }

    #[test]
    fn error_message_truncates_long_input() {
        let err = decode(&Identifier::new("x".repeat(500))).unwrap_err();
        assert_eq!(err.input().len(), 64);
    }
}
