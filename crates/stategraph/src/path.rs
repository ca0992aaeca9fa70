//! Slash-joined attribute paths addressing leaf slots relative to one root.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub(crate) const SEPARATOR: char = '/';

/// Returns whether `segment` is usable as an attribute name and path segment.
pub(crate) fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.is_ascii() && !segment.contains(SEPARATOR)
}

/// Ordered sequence of attribute names locating a leaf or sub-node from some
/// root. A path is canonical only relative to the descriptor produced by the
/// same traversal; the wire form is the slash-joined rendering
/// (e.g. `"linear/kernel"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: SmallVec<[String; 4]>,
}

impl Path {
    /// Returns the empty path addressing the root node itself.
    pub fn root() -> Self {
        Path::default()
    }

    /// Parses a slash-joined rendering; returns `None` if any segment is
    /// empty, non-ASCII, or otherwise invalid. The empty string parses to the
    /// root path.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return Some(Path::root());
        }
        let mut path = Path::root();
        for segment in raw.split(SEPARATOR) {
            if !is_valid_segment(segment) {
                return None;
            }
            path.push(segment);
        }
        Some(path)
    }

    pub(crate) fn push(&mut self, segment: &str) {
        debug_assert!(
            is_valid_segment(segment),
            "invalid path segment '{segment}'"
        );
        self.segments.push(segment.to_string());
    }

    pub(crate) fn pop(&mut self) {
        let _ = self.segments.pop();
    }

    /// Returns a new path with `segment` appended.
    pub fn child(&self, segment: &str) -> Path {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

/// Panics if `raw` is not a valid slash-joined path; use [`Path::parse`] for
/// untrusted input.
impl From<&str> for Path {
    fn from(raw: &str) -> Self {
        match Path::parse(raw) {
            Some(path) => path,
            None => panic!("invalid path '{raw}'"),
        }
    }
}

impl Serialize for Path {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Path::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid path '{raw}'")))
    }
}
