//! Upload file-name allow-list
//!
//! File names become storage key suffixes, so only a conservative set of
//! characters is accepted and nothing that could form a path segment.

use std::fmt;

/// Longest accepted file name in bytes
pub const MAX_FILE_NAME_LEN: usize = 255;

/// A file name that passed the allow-list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileName(String);

/// Why a file name was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileNameError {
    Empty,
    TooLong,
    LeadingDot,
    ForbiddenChar(char),
}

impl FileName {
    /// Check `raw` against the allow-list
    ///
    /// Accepts 1..=255 bytes of ASCII letters, digits, `.`, `_` and `-`,
    /// not starting with a dot.
    pub fn parse(raw: &str) -> Result<Self, FileNameError> {
        if raw.is_empty() {
            return Err(FileNameError::Empty);
        }
        if raw.len() > MAX_FILE_NAME_LEN {
            return Err(FileNameError::TooLong);
        }
        if raw.starts_with('.') {
            return Err(FileNameError::LeadingDot);
        }
        if let Some(c) = raw.chars().find(|c| !is_allowed(*c)) {
            return Err(FileNameError::ForbiddenChar(c));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for FileNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileNameError::Empty => write!(f, "file name is empty"),
            FileNameError::TooLong => write!(f, "file name exceeds {} bytes", MAX_FILE_NAME_LEN),
            FileNameError::LeadingDot => write!(f, "file name starts with a dot"),
            FileNameError::ForbiddenChar(c) => write!(f, "file name contains {:?}", c),
        }
    }
}
