//! Type definitions for Forma paths.

use std::fmt;

/// A single segment of a dot-notation path.
///
/// Segments are produced by [`parse_path`](crate::parse_path): plain tokens
/// become [`Seg::Key`], decimal tokens become [`Seg::Index`], and the
/// reserved final token `length` becomes [`Seg::Length`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Seg {
    /// Object key access: `user.name`.
    Key(String),
    /// Array index access: `todos.0`.
    Index(usize),
    /// The synthetic array-count suffix: `todos.length`.
    ///
    /// Addresses the element count of the array at the path prefix rather
    /// than a real tree node. Only valid as the final segment.
    Length,
}

impl Seg {
    /// Create a key segment.
    #[inline]
    pub fn key(k: impl Into<String>) -> Self {
        Seg::Key(k.into())
    }

    /// Create an index segment.
    #[inline]
    pub fn index(i: usize) -> Self {
        Seg::Index(i)
    }

    /// Returns true if this is a key segment.
    #[inline]
    pub fn is_key(&self) -> bool {
        matches!(self, Seg::Key(_))
    }

    /// Returns true if this is an index segment.
    #[inline]
    pub fn is_index(&self) -> bool {
        matches!(self, Seg::Index(_))
    }

    /// Returns true if this is the synthetic length segment.
    #[inline]
    pub fn is_length(&self) -> bool {
        matches!(self, Seg::Length)
    }

    /// Get the key if this is a key segment.
    #[inline]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Seg::Key(k) => Some(k),
            _ => None,
        }
    }

    /// Get the index if this is an index segment.
    #[inline]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Seg::Index(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Seg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seg::Key(k) => write!(f, "{}", k),
            Seg::Index(i) => write!(f, "{}", i),
            Seg::Length => write!(f, "length"),
        }
    }
}

impl From<String> for Seg {
    fn from(s: String) -> Self {
        Seg::Key(s)
    }
}

impl From<&str> for Seg {
    fn from(s: &str) -> Self {
        Seg::Key(s.to_owned())
    }
}

impl From<usize> for Seg {
    fn from(i: usize) -> Self {
        Seg::Index(i)
    }
}

/// A validated dot-notation path.
///
/// Paths are immutable sequences of [`Seg`]s. They are normally produced by
/// [`parse_path`](crate::parse_path), which guarantees that [`Seg::Length`]
/// only ever appears in final position; the builder methods preserve that
/// property by construction as long as [`Path::length`] is called last.
///
/// # Examples
///
/// ```
/// use forma_path::Path;
///
/// let path = Path::root().key("todos").index(0).key("title");
/// assert_eq!(path.to_string(), "todos.0.title");
/// assert_eq!(path.len(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(Vec<Seg>);

impl Path {
    /// Create an empty path (the tree root).
    #[inline]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Create a path from a vector of segments.
    #[inline]
    pub fn from_segments(segments: Vec<Seg>) -> Self {
        Self(segments)
    }

    /// Append a key segment and return self (builder pattern).
    #[inline]
    pub fn key(mut self, k: impl Into<String>) -> Self {
        self.0.push(Seg::Key(k.into()));
        self
    }

    /// Append an index segment and return self (builder pattern).
    #[inline]
    pub fn index(mut self, i: usize) -> Self {
        self.0.push(Seg::Index(i));
        self
    }

    /// Append the synthetic length segment and return self.
    #[inline]
    pub fn length(mut self) -> Self {
        self.0.push(Seg::Length);
        self
    }

    /// Push a segment onto the path (mutating).
    #[inline]
    pub fn push(&mut self, seg: Seg) {
        self.0.push(seg);
    }

    /// Pop the last segment from the path.
    #[inline]
    pub fn pop(&mut self) -> Option<Seg> {
        self.0.pop()
    }

    /// Get the segments of this path.
    #[inline]
    pub fn segments(&self) -> &[Seg] {
        &self.0
    }

    /// Check if this path is empty (root).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of segments in this path.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Get the last segment.
    #[inline]
    pub fn last(&self) -> Option<&Seg> {
        self.0.last()
    }

    /// Returns true if this path ends in the synthetic length segment.
    #[inline]
    pub fn is_length(&self) -> bool {
        matches!(self.0.last(), Some(Seg::Length))
    }

    /// The path with a trailing [`Seg::Length`] stripped.
    ///
    /// For a synthetic length path this is the array the segment counts;
    /// for a plain path it is the path itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use forma_path::parse_path;
    ///
    /// let p = parse_path("todos.length").unwrap();
    /// assert_eq!(p.data_prefix().to_string(), "todos");
    ///
    /// let q = parse_path("todos.0").unwrap();
    /// assert_eq!(q.data_prefix(), q);
    /// ```
    pub fn data_prefix(&self) -> Path {
        match self.0.last() {
            Some(Seg::Length) => Path(self.0[..self.0.len() - 1].to_vec()),
            _ => self.clone(),
        }
    }

    /// Get the parent path (path without the last segment).
    #[inline]
    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            None
        } else {
            Some(Path(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Check if this path is a prefix of another path.
    ///
    /// A path is a prefix of itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use forma_path::parse_path;
    ///
    /// let parent = parse_path("user").unwrap();
    /// let child = parse_path("user.name").unwrap();
    ///
    /// assert!(parent.is_prefix_of(&child));
    /// assert!(parent.is_prefix_of(&parent));
    /// assert!(!child.is_prefix_of(&parent));
    /// ```
    #[inline]
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Check if this path starts with another path.
    #[inline]
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Iterate over the segments.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Seg> {
        self.0.iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

impl FromIterator<Seg> for Path {
    fn from_iter<I: IntoIterator<Item = Seg>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl IntoIterator for Path {
    type Item = Seg;
    type IntoIter = std::vec::IntoIter<Seg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Seg;
    type IntoIter = std::slice::Iter<'a, Seg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::ops::Index<usize> for Path {
    type Output = Seg;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl TryFrom<&str> for Path {
    type Error = crate::PathError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        crate::parse_path(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_display() {
        let path = Path::root().key("todos").index(2).key("title");
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], Seg::Key("todos".into()));
        assert_eq!(path[1], Seg::Index(2));
        assert_eq!(path.to_string(), "todos.2.title");
    }

    #[test]
    fn test_length_display() {
        let path = Path::root().key("todos").length();
        assert_eq!(path.to_string(), "todos.length");
        assert!(path.is_length());
    }

    #[test]
    fn test_parent() {
        let path = Path::root().key("a").key("b");
        assert_eq!(path.parent().unwrap().to_string(), "a");
        assert!(Path::root().parent().is_none());
    }

    #[test]
    fn test_prefix_algebra() {
        let user = Path::root().key("user");
        let name = Path::root().key("user").key("name");
        let other = Path::root().key("users");

        assert!(user.is_prefix_of(&name));
        assert!(user.is_prefix_of(&user));
        assert!(!name.is_prefix_of(&user));
        assert!(!user.is_prefix_of(&other));
        assert!(name.starts_with(&user));
    }

    #[test]
    fn test_index_vs_key_segments_are_distinct() {
        let by_index = Path::from_segments(vec![Seg::key("items"), Seg::index(0)]);
        let by_key = Path::from_segments(vec![Seg::key("items"), Seg::key("0")]);
        assert_ne!(by_index, by_key);
        assert!(!by_index.is_prefix_of(&by_key));
    }

    #[test]
    fn test_data_prefix() {
        let p = Path::root().key("todos").length();
        assert_eq!(p.data_prefix(), Path::root().key("todos"));
        let q = Path::root().key("todos").index(1);
        assert_eq!(q.data_prefix(), q);
    }
}
