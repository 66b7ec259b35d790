//! Queue-name codec.
//!
//! A queue is identified in-process by a [`QueueTag`]: a short symbolic name
//! with no namespace component. `encode`/`decode` map between that and the
//! text actually stored in the `queue` column.

use crate::error::{Error, Result};
use std::fmt;

/// The on-disk value written for the default queue.
pub const DEFAULT_QUEUE: &str = "default";

/// Separator that is forbidden inside a [`QueueTag`].
const NAMESPACE_SEPARATOR: char = '/';

/// A symbolic queue identifier without a namespace component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueTag(String);

impl QueueTag {
    /// Construct a tag, rejecting empty strings and namespaced identifiers.
    pub fn new(tag: impl Into<String>) -> Result<Self> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(Error::EmptyQueue);
        }
        if tag.contains(NAMESPACE_SEPARATOR) {
            return Err(Error::NamespacedQueue(tag));
        }
        Ok(Self(tag))
    }

    /// The tag naming the default queue (`"default"`).
    pub fn default_queue() -> Self {
        Self(DEFAULT_QUEUE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Map an in-process tag to the text stored in the `queue` column.
///
/// This function has no special case for "no tag"; callers resolve an
/// absent queue to [`QueueTag::default_queue`] before calling it.
pub fn encode(tag: &QueueTag) -> String {
    tag.0.clone()
}

/// Map on-disk text back to an in-process tag.
///
/// Any text in the `queue` column was written by [`encode`] (or is the
/// literal [`DEFAULT_QUEUE`]), so this never fails.
pub fn decode(raw: &str) -> QueueTag {
    QueueTag(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_namespaced_tags() {
        assert!(matches!(
            QueueTag::new("billing/charges"),
            Err(Error::NamespacedQueue(_))
        ));
    }

    #[test]
    fn rejects_empty_tags() {
        assert!(matches!(QueueTag::new(""), Err(Error::EmptyQueue)));
    }

    #[test]
    fn round_trips_through_encode_decode() {
        let tag = QueueTag::new("mailers").unwrap();
        assert_eq!(decode(&encode(&tag)), tag);
    }

    #[test]
    fn default_queue_encodes_to_literal_default() {
        assert_eq!(encode(&QueueTag::default_queue()), DEFAULT_QUEUE);
    }
}
