//! Dot-notation paths for Forma stores.
//!
//! A path addresses a node in a JSON-shaped value tree: `user.profile.name`
//! walks object keys, `todos.0.completed` walks an array index, and the
//! reserved suffix `todos.length` addresses the element count of the array
//! at `todos` rather than a real node.
//!
//! Parsing is strict and fails fast: malformed input is rejected with a
//! [`PathError`] before any traversal happens, so downstream code only ever
//! sees validated segment sequences.
//!
//! # Example
//!
//! ```
//! use forma_path::{parse_path, Seg};
//!
//! let path = parse_path("todos.0.completed").unwrap();
//! assert_eq!(path.segments().len(), 3);
//! assert_eq!(path[1], Seg::Index(0));
//! assert_eq!(path.to_string(), "todos.0.completed");
//!
//! assert!(parse_path("").is_err());
//! assert!(parse_path("user..name").is_err());
//! ```

use thiserror::Error;

mod types;
pub use types::{Path, Seg};

/// The reserved token for the synthetic array-count suffix.
pub const LENGTH_TOKEN: &str = "length";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path string was empty.
    #[error("empty path")]
    Empty,
    /// A segment between dots was empty (leading dot, trailing dot, `a..b`).
    #[error("empty segment at position {position}")]
    EmptySegment { position: usize },
    /// The reserved `length` token appeared before the final segment.
    #[error("`length` is reserved and only valid as the final segment")]
    LengthNotLast,
}

/// Check if a string represents a valid non-negative decimal array index.
///
/// Leading zeros are not allowed except for `"0"` itself; such tokens stay
/// object keys.
///
/// # Example
///
/// ```
/// use forma_path::is_valid_index;
///
/// assert!(is_valid_index("0"));
/// assert!(is_valid_index("123"));
/// assert!(!is_valid_index("01"));
/// assert!(!is_valid_index("-1"));
/// assert!(!is_valid_index("abc"));
/// assert!(!is_valid_index(""));
/// ```
pub fn is_valid_index(token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    let bytes = token.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|&b| b.is_ascii_digit())
}

/// Parse a dot-notation path string into a validated [`Path`].
///
/// Each token is classified: decimal tokens become [`Seg::Index`], the
/// reserved final token `length` becomes [`Seg::Length`], everything else
/// becomes [`Seg::Key`]. Tokens that look numeric but overflow `usize`
/// remain keys.
///
/// # Errors
///
/// - [`PathError::Empty`] for the empty string
/// - [`PathError::EmptySegment`] for leading/trailing/double dots
/// - [`PathError::LengthNotLast`] when `length` is not the final segment
///
/// # Example
///
/// ```
/// use forma_path::{parse_path, Seg};
///
/// let path = parse_path("todos.length").unwrap();
/// assert_eq!(path.last(), Some(&Seg::Length));
///
/// assert!(parse_path("todos.length.count").is_err());
/// ```
pub fn parse_path(path: &str) -> Result<Path, PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }
    let tokens: Vec<&str> = path.split('.').collect();
    let last = tokens.len() - 1;
    let mut segments = Vec::with_capacity(tokens.len());
    for (position, token) in tokens.iter().enumerate() {
        if token.is_empty() {
            return Err(PathError::EmptySegment { position });
        }
        if *token == LENGTH_TOKEN {
            if position != last {
                return Err(PathError::LengthNotLast);
            }
            segments.push(Seg::Length);
        } else if is_valid_index(token) {
            match token.parse::<usize>() {
                Ok(index) => segments.push(Seg::Index(index)),
                Err(_) => segments.push(Seg::Key((*token).to_owned())),
            }
        } else {
            segments.push(Seg::Key((*token).to_owned()));
        }
    }
    Ok(Path::from_segments(segments))
}

/// Format a path back to its dot-notation string.
///
/// Inverse of [`parse_path`] for every accepted input.
pub fn format_path(path: &Path) -> String {
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let path = parse_path("user.profile.name").unwrap();
        assert_eq!(
            path.segments(),
            &[Seg::key("user"), Seg::key("profile"), Seg::key("name")]
        );
    }

    #[test]
    fn test_parse_index_classification() {
        let path = parse_path("todos.0.completed").unwrap();
        assert_eq!(path[1], Seg::Index(0));

        // Leading zero stays a key.
        let path = parse_path("todos.01").unwrap();
        assert_eq!(path[1], Seg::key("01"));

        // Signed and fractional tokens stay keys.
        let path = parse_path("a.-1").unwrap();
        assert_eq!(path[1], Seg::key("-1"));
    }

    #[test]
    fn test_parse_overflowing_index_stays_key() {
        let big = "9".repeat(40);
        let path = parse_path(&format!("a.{}", big)).unwrap();
        assert_eq!(path[1], Seg::key(big));
    }

    #[test]
    fn test_parse_length_suffix() {
        let path = parse_path("todos.length").unwrap();
        assert_eq!(path.last(), Some(&Seg::Length));
        assert_eq!(path.data_prefix().to_string(), "todos");
    }

    #[test]
    fn test_parse_length_alone() {
        let path = parse_path("length").unwrap();
        assert_eq!(path.segments(), &[Seg::Length]);
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(parse_path(""), Err(PathError::Empty));
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert_eq!(
            parse_path(".user"),
            Err(PathError::EmptySegment { position: 0 })
        );
        assert_eq!(
            parse_path("user."),
            Err(PathError::EmptySegment { position: 1 })
        );
        assert_eq!(
            parse_path("user..name"),
            Err(PathError::EmptySegment { position: 1 })
        );
    }

    #[test]
    fn test_parse_rejects_interior_length() {
        assert_eq!(parse_path("todos.length.0"), Err(PathError::LengthNotLast));
    }

    #[test]
    fn test_roundtrip() {
        let inputs = [
            "user",
            "user.profile.name",
            "todos.0.completed",
            "todos.length",
            "a.01.b",
        ];
        for input in inputs {
            let path = parse_path(input).unwrap();
            assert_eq!(format_path(&path), input, "failed roundtrip for {input:?}");
        }
    }

    #[test]
    fn test_try_from() {
        let path = Path::try_from("user.name").unwrap();
        assert_eq!(path.len(), 2);
        assert!(Path::try_from("").is_err());
    }
}
