//! Destination identity.
//!
//! A `DestinationUid` is immutable and cheap to clone: clones share one
//! allocation, which is also what the registry interns. Identity (equality,
//! hashing, serde) is the unique key `"Q:<name>"` / `"T:<name>"`.

use super::pattern::{is_wildcard_name, WildcardPattern};
use crate::error::{DestinationError, DestinationResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

const QUEUE_TAG: &str = "Q:";
const TOPIC_TAG: &str = "T:";

#[derive(Debug)]
pub(crate) struct Inner {
    name: String,
    is_queue: bool,
    unique: String,
    pattern: Option<WildcardPattern>,
}

impl Inner {
    fn build(name: &str, is_queue: bool) -> DestinationResult<Self> {
        let pattern = if is_wildcard_name(name) {
            if is_queue {
                return Err(DestinationError::UnsupportedAddressing {
                    name: name.to_string(),
                });
            }
            Some(WildcardPattern::compile(name)?)
        } else {
            None
        };

        let tag = if is_queue { QUEUE_TAG } else { TOPIC_TAG };
        Ok(Self {
            name: name.to_string(),
            is_queue,
            unique: format!("{}{}", tag, name.replace('/', "_")),
            pattern,
        })
    }
}

/// Identity of a queue or topic.
#[derive(Clone)]
pub struct DestinationUid(Arc<Inner>);

impl DestinationUid {
    /// Build an identity outside any registry.
    ///
    /// Fails with `UnsupportedAddressing` for a wildcard queue name and
    /// `MalformedWildcard` for a topic whose wildcard syntax is invalid.
    pub fn new(name: &str, is_queue: bool) -> DestinationResult<Self> {
        Ok(Self(Arc::new(Inner::build(name, is_queue)?)))
    }

    pub fn queue(name: &str) -> DestinationResult<Self> {
        Self::new(name, true)
    }

    pub fn topic(name: &str) -> DestinationResult<Self> {
        Self::new(name, false)
    }

    /// Rebuild an identity from its unique key.
    pub fn parse(unique: &str) -> DestinationResult<Self> {
        if let Some(name) = unique.strip_prefix(QUEUE_TAG) {
            Self::new(name, true)
        } else if let Some(name) = unique.strip_prefix(TOPIC_TAG) {
            Self::new(name, false)
        } else {
            Err(DestinationError::InvalidKey(unique.to_string()))
        }
    }

    pub(crate) fn from_inner(inner: Arc<Inner>) -> Self {
        Self(inner)
    }

    pub(crate) fn inner(&self) -> &Arc<Inner> {
        &self.0
    }

    pub(crate) fn build_inner(name: &str, is_queue: bool) -> DestinationResult<Arc<Inner>> {
        Ok(Arc::new(Inner::build(name, is_queue)?))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn is_queue(&self) -> bool {
        self.0.is_queue
    }

    pub fn is_wildcard(&self) -> bool {
        self.0.pattern.is_some()
    }

    pub fn pattern(&self) -> Option<&WildcardPattern> {
        self.0.pattern.as_ref()
    }

    /// Identity key.
    pub fn unique_string(&self) -> &str {
        &self.0.unique
    }

    /// `queue:<name>` or `topic:<name>`.
    pub fn long_string(&self) -> String {
        format!("{}:{}", self.dest_type(), self.0.name)
    }

    pub fn dest_type(&self) -> &'static str {
        if self.0.is_queue {
            "queue"
        } else {
            "topic"
        }
    }

    /// See [`match_destinations`].
    pub fn matches(&self, other: &DestinationUid) -> DestinationResult<bool> {
        match_destinations(self, other)
    }
}

/// Match two identities where at most one is a wildcard.
///
/// Two concrete identities match when they are equal. A wildcard identity
/// matches a concrete one of the same kind whose name satisfies its
/// pattern. Two wildcards cannot be compared.
pub fn match_destinations(a: &DestinationUid, b: &DestinationUid) -> DestinationResult<bool> {
    let pattern = match (a.pattern(), b.pattern()) {
        (Some(_), Some(_)) => {
            return Err(DestinationError::InvalidComparison {
                left: a.unique_string().to_string(),
                right: b.unique_string().to_string(),
            })
        }
        (None, None) => return Ok(a == b),
        (Some(pattern), None) | (None, Some(pattern)) => pattern,
    };

    if a.is_queue() != b.is_queue() {
        return Ok(false);
    }

    let concrete = if a.is_wildcard() { b } else { a };
    Ok(pattern.matches(concrete.name()))
}

impl PartialEq for DestinationUid {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.unique == other.0.unique
    }
}

impl Eq for DestinationUid {}

impl Hash for DestinationUid {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.unique.hash(state);
    }
}

impl fmt::Debug for DestinationUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DestinationUid({})", self.0.unique)
    }
}

impl fmt::Display for DestinationUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.unique)
    }
}

impl Serialize for DestinationUid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.unique)
    }
}

impl<'de> Deserialize<'de> for DestinationUid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let unique = String::deserialize(deserializer)?;
        DestinationUid::parse(&unique).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concrete_identities_match_by_equality() {
        let a = DestinationUid::topic("orders.eu").unwrap();
        let a2 = DestinationUid::topic("orders.eu").unwrap();
        let b = DestinationUid::topic("orders.us").unwrap();

        assert!(match_destinations(&a, &a).unwrap());
        assert!(match_destinations(&a, &a2).unwrap());
        assert!(!match_destinations(&a, &b).unwrap());
    }

    #[test]
    fn test_queue_and_topic_with_same_name_differ() {
        let q = DestinationUid::queue("orders").unwrap();
        let t = DestinationUid::topic("orders").unwrap();
        assert_ne!(q, t);
        assert!(!match_destinations(&q, &t).unwrap());
    }

    #[test]
    fn test_wildcard_queue_is_rejected() {
        for name in ["a.*", "a.>", ">"] {
            let err = DestinationUid::queue(name).unwrap_err();
            assert!(matches!(err, DestinationError::UnsupportedAddressing { .. }));
        }
    }

    #[test]
    fn test_is_wildcard_follows_name() {
        for name in ["a.*", "a.>", "a.**.b", "plain", "a.b"] {
            let uid = DestinationUid::topic(name).unwrap();
            assert_eq!(uid.is_wildcard(), name.contains('*') || name.contains('>'));
        }
    }

    #[test]
    fn test_wildcard_matches_either_side() {
        let wild = DestinationUid::topic("a.*.c").unwrap();
        let hit = DestinationUid::topic("a.b.c").unwrap();
        let miss = DestinationUid::topic("a.b.d").unwrap();

        assert!(match_destinations(&wild, &hit).unwrap());
        assert!(match_destinations(&hit, &wild).unwrap());
        assert!(!match_destinations(&wild, &miss).unwrap());
    }

    #[test]
    fn test_wildcard_does_not_match_queue() {
        let wild = DestinationUid::topic("a.>").unwrap();
        let queue = DestinationUid::queue("a.b").unwrap();
        assert!(!match_destinations(&wild, &queue).unwrap());
    }

    #[test]
    fn test_two_wildcards_cannot_be_compared() {
        let a = DestinationUid::topic("a.*").unwrap();
        let b = DestinationUid::topic("a.>").unwrap();
        let err = match_destinations(&a, &b).unwrap_err();
        assert!(matches!(err, DestinationError::InvalidComparison { .. }));
        assert!(a.matches(&a).is_err());
    }

    #[test]
    fn test_unique_and_long_strings() {
        let q = DestinationUid::queue("jobs/high").unwrap();
        assert_eq!(q.unique_string(), "Q:jobs_high");
        assert_eq!(q.long_string(), "queue:jobs/high");

        let t = DestinationUid::topic("news").unwrap();
        assert_eq!(t.unique_string(), "T:news");
        assert_eq!(t.dest_type(), "topic");
    }

    #[test]
    fn test_parse_unique_string() {
        let t = DestinationUid::topic("a.*").unwrap();
        let back = DestinationUid::parse(t.unique_string()).unwrap();
        assert_eq!(back, t);
        assert!(back.is_wildcard());

        assert!(matches!(
            DestinationUid::parse("X:nope"),
            Err(DestinationError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_serde_uses_unique_string() {
        let q = DestinationUid::queue("jobs").unwrap();
        let json = serde_json::to_string(&q).unwrap();
        assert_eq!(json, "\"Q:jobs\"");

        let back: DestinationUid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, q);
        assert!(serde_json::from_str::<DestinationUid>("\"Q:a.*\"").is_err());
    }
}
