//! Virtual path codec.
//!
//! A file's display name doubles as a slash-delimited virtual path
//! (`"photos/2024/beach.jpg"`). This module splits such names into segments
//! and joins segments back into the canonical form. No I/O happens here.

use crate::{DriveError, Result};

/// Segment separator in virtual paths.
pub const SEPARATOR: char = '/';

/// Split a virtual path into its ordered segments.
///
/// Empty segments (leading, trailing, or doubled separators) are dropped, so
/// `"/a//b/"` yields `["a", "b"]`.
pub fn split(path: &str) -> Vec<&str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty()).collect()
}

/// Join segments into a virtual path.
pub fn join<S: AsRef<str>>(segments: &[S]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        out.push_str(segment.as_ref());
    }
    out
}

/// Canonical form of a virtual path: its segments re-joined.
pub fn normalize(path: &str) -> String {
    join(&split(path))
}

/// Last segment of a virtual path, if any.
pub fn file_name(path: &str) -> Option<&str> {
    split(path).pop()
}

/// Validate a virtual path and return its canonical form.
///
/// Rejects paths without segments and the relative segments `.` and `..`.
pub fn validate(path: &str) -> Result<String> {
    let segments = split(path);
    if segments.is_empty() {
        return Err(DriveError::Validation(
            "file name must contain at least one path segment".to_string(),
        ));
    }
    if let Some(bad) = segments.iter().find(|s| **s == "." || **s == "..") {
        return Err(DriveError::Validation(format!(
            "path segment '{bad}' is not allowed"
        )));
    }
    Ok(join(&segments))
}
