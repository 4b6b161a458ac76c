//! Key addressing for container slots
//!
//! A [`Segment`] names one slot of a recognized container: a string key of a
//! record, or a position of an ordered sequence. Traversal reports the route
//! from a root to a facade as a slice of segments.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step into a container: a record key or a sequence index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    /// String key of a record container
    Key(String),
    /// Position of an ordered-sequence container
    Index(usize),
}

impl Segment {
    /// Create a key segment
    pub fn key(key: impl Into<String>) -> Self {
        Segment::Key(key.into())
    }

    /// Create an index segment
    pub fn index(index: usize) -> Self {
        Segment::Index(index)
    }

    /// Get the key if this is a key segment
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(k) => Some(k),
            Segment::Index(_) => None,
        }
    }

    /// Get the index if this is an index segment
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Key(_) => None,
            Segment::Index(i) => Some(*i),
        }
    }

    /// Check if this is a key segment
    pub fn is_key(&self) -> bool {
        matches!(self, Segment::Key(_))
    }

    /// Check if this is an index segment
    pub fn is_index(&self) -> bool {
        matches!(self, Segment::Index(_))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => write!(f, "{}", k),
            Segment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

impl From<&Segment> for Segment {
    fn from(seg: &Segment) -> Self {
        seg.clone()
    }
}
