//! Tag predicates used to partition leaves during flattening and extraction.

use serde::{Deserialize, Serialize};

use crate::value::Tag;

/// Predicate over leaf tags.
///
/// Filters are applied as an explicit ordered list: a leaf is routed to the
/// first filter that matches it, and `split` appends a guaranteed remainder
/// bucket for leaves matched by none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// Matches leaves carrying exactly this tag.
    Tag(Tag),
    /// Matches when any inner filter matches.
    Any(Vec<Filter>),
    /// Inverts the inner filter.
    Not(Box<Filter>),
    /// Matches every leaf.
    Everything,
    /// Matches no leaf.
    Nothing,
}

impl Filter {
    /// Convenience constructor for the common tag-equality case.
    pub fn tag(name: impl Into<Tag>) -> Self {
        Filter::Tag(name.into())
    }

    pub fn matches(&self, tag: &Tag) -> bool {
        match self {
            Filter::Tag(expected) => expected == tag,
            Filter::Any(inner) => inner.iter().any(|filter| filter.matches(tag)),
            Filter::Not(inner) => !inner.matches(tag),
            Filter::Everything => true,
            Filter::Nothing => false,
        }
    }
}

impl From<&str> for Filter {
    fn from(name: &str) -> Self {
        Filter::tag(name)
    }
}

impl From<Tag> for Filter {
    fn from(tag: Tag) -> Self {
        Filter::Tag(tag)
    }
}
