//! Task key generation
//!
//! All keys use the format: `task-{16 random digits}`
//! Example: `task-0482913375021864`

use rand::Rng;

/// Fixed human-readable prefix for every key
pub const KEY_PREFIX: &str = "task";

/// Number of random decimal digits after the prefix
pub const KEY_DIGITS: usize = 16;

/// Generate a fresh task key
///
/// Uniqueness against live keys is enforced by the registry, which retries on
/// the (vanishingly rare) collision.
pub fn generate_key() -> TaskKey {
    let mut rng = rand::rng();
    let digits: String = (0..KEY_DIGITS)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect();
    TaskKey(format!("{}-{}", KEY_PREFIX, digits))
}

/// Opaque identifier of a registered task
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskKey(String);

impl TaskKey {
    /// Wrap an existing key string (as received from a caller)
    pub fn from_string(key: String) -> Self {
        Self(key)
    }

    /// Get the full key string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key has the shape produced by [`generate_key`]
    pub fn is_well_formed(&self) -> bool {
        match self.0.split_once('-') {
            Some((prefix, digits)) => {
                prefix == KEY_PREFIX && digits.len() == KEY_DIGITS && digits.bytes().all(|b| b.is_ascii_digit())
            }
            None => false,
        }
    }
}

impl std::fmt::Display for TaskKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for TaskKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for TaskKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for TaskKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_key_format() {
        let key = generate_key();
        assert!(key.as_str().starts_with("task-"));
        assert_eq!(key.as_str().len(), KEY_PREFIX.len() + 1 + KEY_DIGITS);
        assert!(key.is_well_formed());
    }

    #[test]
    fn test_generate_key_no_collisions() {
        let mut seen = HashSet::new();
        for _ in 0..100_000 {
            assert!(seen.insert(generate_key()), "duplicate key generated");
        }
        assert_eq!(seen.len(), 100_000);
    }

    #[test]
    fn test_is_well_formed_rejects_foreign_keys() {
        assert!(!TaskKey::from("task-123").is_well_formed());
        assert!(!TaskKey::from("job-0000000000000000").is_well_formed());
        assert!(!TaskKey::from("task-00000000000000ab").is_well_formed());
        assert!(!TaskKey::from("nodash").is_well_formed());
    }

    #[test]
    fn test_key_serializes_as_plain_string() {
        let key = TaskKey::from("task-0000000000000001");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#""task-0000000000000001""#);

        let parsed: TaskKey = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, key);
    }
}
