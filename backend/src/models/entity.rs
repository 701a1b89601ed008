//! Entity identifiers
//!
//! Processes in a trace are identified by opaque ids. Trace producers emit
//! them as integers, floats (`3.0`) or strings, so loaders normalise every
//! raw id through [`EntityId::parse`] before it reaches the replay.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Opaque identifier of a tracked process
///
/// Ordering is numeric when both ids are integers and lexicographic
/// otherwise, with numeric ids first. Colour assignment and every
/// per-entity query iterate in this order.
///
/// # Example
///
/// ```rust
/// use scheduler_replay_core_rs::EntityId;
///
/// let mut ids = vec![EntityId::new("10"), EntityId::new("2"), EntityId::new("idle")];
/// ids.sort();
/// assert_eq!(ids, vec![EntityId::new("2"), EntityId::new("10"), EntityId::new("idle")]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

/// Integral floats in `[I64_MIN_F, I64_MAX_F)` convert to `i64` exactly
const I64_MIN_F: f64 = -9_223_372_036_854_775_808.0;
const I64_MAX_F: f64 = 9_223_372_036_854_775_808.0;

impl EntityId {
    /// Wrap an already-normalised id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Normalise a raw textual id
    ///
    /// Returns `None` for the empty string and for `None`/`none`, which
    /// traces use to mark an idle slot. Integral numbers such as `"3.0"`
    /// collapse to `"3"`.
    ///
    /// ```rust
    /// use scheduler_replay_core_rs::EntityId;
    ///
    /// assert_eq!(EntityId::parse("3.0"), Some(EntityId::new("3")));
    /// assert_eq!(EntityId::parse(" 7 "), Some(EntityId::new("7")));
    /// assert_eq!(EntityId::parse("None"), None);
    /// assert_eq!(EntityId::parse(""), None);
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return None;
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return Some(Self(n.to_string()));
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.fract() == 0.0 && (I64_MIN_F..I64_MAX_F).contains(&f) => {
                Some(Self((f as i64).to_string()))
            }
            _ => Some(Self(trimmed.to_string())),
        }
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ============================================================================
// Deserialization
// ============================================================================

/// Raw id as it appears in a JSON trace
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawId {
    fn normalise(self) -> Option<EntityId> {
        match self {
            RawId::Int(n) => Some(EntityId(n.to_string())),
            RawId::Float(f) => EntityId::parse(&f.to_string()),
            RawId::Text(s) => EntityId::parse(&s),
        }
    }
}

/// Deserialize an optional id (`null`, `"None"` and `""` are empty)
pub(crate) fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<EntityId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawId> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(RawId::normalise))
}

/// Deserialize a queue list; empty entries are dropped
pub(crate) fn deserialize_queue<'de, D>(deserializer: D) -> Result<Vec<EntityId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Option<RawId>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|id| id.and_then(RawId::normalise))
        .collect())
}

/// Deserialize a fixed-width slot list; empty entries stay as `None`
pub(crate) fn deserialize_slots<'de, D>(deserializer: D) -> Result<Vec<Option<EntityId>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Option<RawId>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|id| id.and_then(RawId::normalise))
        .collect())
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawId::deserialize(deserializer)?
            .normalise()
            .ok_or_else(|| de::Error::custom("entity id must not be empty"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ordering() {
        assert!(EntityId::new("2") < EntityId::new("10"));
        assert!(EntityId::new("10") < EntityId::new("a"));
        assert!(EntityId::new("a") < EntityId::new("b"));
    }

    #[test]
    fn test_parse_float_id() {
        assert_eq!(EntityId::parse("12.0"), Some(EntityId::new("12")));
        assert_eq!(EntityId::parse("1.5"), Some(EntityId::new("1.5")));
    }

    #[test]
    fn test_parse_float_beyond_i64_keeps_text() {
        assert_eq!(EntityId::parse("1e20"), Some(EntityId::new("1e20")));
        assert_eq!(EntityId::parse("2e20"), Some(EntityId::new("2e20")));
        assert_ne!(EntityId::parse("1e20"), EntityId::parse("2e20"));
        assert_eq!(EntityId::parse("-1e30"), Some(EntityId::new("-1e30")));
        assert_eq!(EntityId::parse("inf"), Some(EntityId::new("inf")));
    }

    #[test]
    fn test_deserialize_large_float_ids_stay_distinct() {
        let ids: Vec<EntityId> = serde_json::from_str("[1e20, 2e20]").unwrap();
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_deserialize_mixed_ids() {
        let ids: Vec<EntityId> = serde_json::from_str(r#"[1, "2", 3.0]"#).unwrap();
        assert_eq!(ids, vec![EntityId::new("1"), EntityId::new("2"), EntityId::new("3")]);
    }

    #[test]
    fn test_deserialize_rejects_empty_id() {
        let result: Result<EntityId, _> = serde_json::from_str(r#""None""#);
        assert!(result.is_err());
    }
}
