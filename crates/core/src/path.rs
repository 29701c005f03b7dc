//! Paths into a value tree
//!
//! - [`PathSegment`]: one step from a parent to a child (object key or array index)
//! - [`ValuePath`]: the full path from the root to the current node
//! - [`PathPattern`]: a path with optional `*` wildcard segments, used to
//!   register codecs against a location in a document or row

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single path step
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// Object key or column name: `.foo`
    Key(String),
    /// Array index: `[0]`
    Index(usize),
}

impl PathSegment {
    /// Get the key if this is a key segment
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(k) => Some(k),
            PathSegment::Index(_) => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, ".{}", k),
            PathSegment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(k: &str) -> Self {
        PathSegment::Key(k.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(k: String) -> Self {
        PathSegment::Key(k)
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        PathSegment::Index(i)
    }
}

/// Path from the root of a value tree to the node being visited.
///
/// The root path is empty. The serialization engine pushes a segment before
/// visiting a child and pops it afterwards, so the path always describes
/// the current node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValuePath {
    segments: Vec<PathSegment>,
}

impl ValuePath {
    /// Create the root path (empty path)
    pub fn root() -> Self {
        Self::default()
    }

    /// Create a path from a vector of segments
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Get the path segments
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments (0 for the root)
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Check if this is the root path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Push a segment (mutating)
    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    /// Pop the last segment (mutating)
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.segments.pop()
    }

    /// Get the last segment (None if root)
    pub fn last_segment(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Key of the last segment, if it is a key
    pub fn last_key(&self) -> Option<&str> {
        self.segments.last().and_then(PathSegment::as_key)
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// One segment of a [`PathPattern`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternSegment {
    /// Matches exactly this key
    Key(String),
    /// Matches exactly this index
    Index(usize),
    /// Matches any single segment
    Wildcard,
}

impl PatternSegment {
    fn matches(&self, segment: &PathSegment) -> bool {
        match (self, segment) {
            (PatternSegment::Wildcard, _) => true,
            (PatternSegment::Key(a), PathSegment::Key(b)) => a == b,
            (PatternSegment::Index(a), PathSegment::Index(b)) => a == b,
            _ => false,
        }
    }
}

/// A path pattern matched against the *entire* current path.
///
/// `"*"` matches any single segment; numeric strings match array indices.
///
/// ```
/// use dataapi_core::{PathPattern, PathSegment, ValuePath};
///
/// let pattern = PathPattern::parse(["items", "*", "price"]);
/// let path = ValuePath::from_segments(vec![
///     PathSegment::from("items"),
///     PathSegment::from(3usize),
///     PathSegment::from("price"),
/// ]);
/// assert!(pattern.matches(&path));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPattern {
    segments: Vec<PatternSegment>,
}

impl PathPattern {
    /// Create a pattern from explicit segments
    pub fn new(segments: Vec<PatternSegment>) -> Self {
        Self { segments }
    }

    /// Build a pattern from string segments (`"*"` is a wildcard, digits are indices)
    pub fn parse<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments = segments
            .into_iter()
            .map(|s| {
                let s = s.as_ref();
                if s == "*" {
                    PatternSegment::Wildcard
                } else if let Ok(i) = s.parse::<usize>() {
                    PatternSegment::Index(i)
                } else {
                    PatternSegment::Key(s.to_string())
                }
            })
            .collect();
        Self { segments }
    }

    /// Pattern segments
    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    /// Check if the pattern matches the full path
    pub fn matches(&self, path: &ValuePath) -> bool {
        self.segments.len() == path.depth()
            && self
                .segments
                .iter()
                .zip(path.segments())
                .all(|(p, s)| p.matches(s))
    }
}
