//! Validation of caller-supplied names used as storage paths.
//!
//! Tags, client identifiers and uploaded file names all end up as path
//! components below a storage root. Nothing here touches the filesystem; a
//! value that passes validation cannot name anything outside its root.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::errors::WebError;

/// Maximum length of a single segment
pub const MAX_SEGMENT_LEN: usize = 64;

/// Maximum number of components in a relative upload name
pub const MAX_RELATIVE_DEPTH: usize = 8;

/// A single validated path component: `[A-Za-z0-9_.-]`, no leading dot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment(String);

impl Segment {
    pub fn parse(value: &str) -> Result<Self, WebError> {
        if value.is_empty() || value.len() > MAX_SEGMENT_LEN {
            return Err(WebError::ValidationError(format!(
                "segment length must be 1..={}",
                MAX_SEGMENT_LEN
            )));
        }
        if value.starts_with('.') {
            return Err(WebError::ValidationError(
                "segment must not start with '.'".to_string(),
            ));
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(WebError::ValidationError(format!(
                "invalid characters in segment: {:?}",
                value
            )));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A relative path made only of valid segments, e.g. `data/bdjconfig.txt`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeName {
    path: PathBuf,
}

impl RelativeName {
    pub fn parse(value: &str) -> Result<Self, WebError> {
        // Windows clients send backslash separated names
        let normalized = value.replace('\\', "/");
        let path = Path::new(&normalized);

        let mut clean = PathBuf::new();
        let mut depth = 0;
        for component in path.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| {
                        WebError::ValidationError("file name is not valid UTF-8".to_string())
                    })?;
                    clean.push(Segment::parse(part)?.as_str());
                    depth += 1;
                }
                Component::CurDir => {}
                _ => {
                    return Err(WebError::ValidationError(format!(
                        "file name must be relative without '..': {:?}",
                        value
                    )))
                }
            }
        }

        if depth == 0 {
            return Err(WebError::ValidationError("empty file name".to_string()));
        }
        if depth > MAX_RELATIVE_DEPTH {
            return Err(WebError::ValidationError(format!(
                "file name nests deeper than {}",
                MAX_RELATIVE_DEPTH
            )));
        }
        Ok(Self { path: clean })
    }

    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Final component
    pub fn base_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

impl fmt::Display for RelativeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_accepts_plain_names() {
        assert!(Segment::parse("ballroom-1").is_ok());
        assert!(Segment::parse("Studio_B.main").is_ok());
    }

    #[test]
    fn test_segment_rejects_traversal() {
        assert!(Segment::parse("").is_err());
        assert!(Segment::parse("..").is_err());
        assert!(Segment::parse(".hidden").is_err());
        assert!(Segment::parse("a/b").is_err());
        assert!(Segment::parse("a\\b").is_err());
        assert!(Segment::parse("/etc").is_err());
        assert!(Segment::parse("sp ace").is_err());
        assert!(Segment::parse(&"x".repeat(MAX_SEGMENT_LEN + 1)).is_err());
    }

    #[test]
    fn test_relative_name() {
        let name = RelativeName::parse("data/bdjconfig.txt").unwrap();
        assert_eq!(name.as_path(), Path::new("data/bdjconfig.txt"));
        assert_eq!(name.base_name(), "bdjconfig.txt");

        let name = RelativeName::parse("data\\profile00\\bdjconfig.txt").unwrap();
        assert_eq!(name.as_path(), Path::new("data/profile00/bdjconfig.txt"));

        assert_eq!(
            RelativeName::parse("./support.txt").unwrap().base_name(),
            "support.txt"
        );
    }

    #[test]
    fn test_relative_name_rejects_escape() {
        assert!(RelativeName::parse("../x.txt").is_err());
        assert!(RelativeName::parse("a/../../x.txt").is_err());
        assert!(RelativeName::parse("/etc/passwd").is_err());
        assert!(RelativeName::parse("").is_err());
        assert!(RelativeName::parse("a/.ssh/x").is_err());
    }
}
