//! # Key state interface
//!
//! The control core polls the keyboard, it never receives key events. A key source only has to
//! answer whether a key is held down right now.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Identifier of a key, for example `"w"`, `"space"` or `"shift"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct KeyId(String);

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A snapshot of the keyboard.
pub trait KeyState {
    /// Returns true if the given key is currently held.
    fn is_held(&self, key: &KeyId) -> bool;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl KeyId {
    /// Create a key identifier. Identifiers are case insensitive.
    pub fn new(name: &str) -> Self {
        Self(name.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for KeyId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for KeyId {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl From<KeyId> for String {
    fn from(key: KeyId) -> Self {
        key.0
    }
}

impl std::fmt::Display for KeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl KeyState for HashSet<KeyId> {
    fn is_held(&self, key: &KeyId) -> bool {
        self.contains(key)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_key_set() {
        let held: HashSet<KeyId> = ["W", "shift"].iter().map(|k| KeyId::new(k)).collect();

        assert!(held.is_held(&KeyId::new("w")));
        assert!(held.is_held(&"Shift".into()));
        assert!(!held.is_held(&KeyId::new("s")));

        let parsed: KeyId = serde_json::from_str("\"SPACE\"").unwrap();
        assert_eq!(parsed, KeyId::new("space"));
    }
}
