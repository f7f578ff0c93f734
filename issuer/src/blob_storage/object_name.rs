//! Validated object names

use std::fmt;

use thiserror::Error;

/// Longest object name accepted, in bytes
pub const MAX_OBJECT_NAME_BYTES: usize = 1024;

/// Reasons a caller-supplied file name cannot be used as an object name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObjectNameError {
    /// No name, or an empty one
    #[error("object name is empty")]
    Missing,

    /// Name exceeds [`MAX_OBJECT_NAME_BYTES`]
    #[error("object name is {0} bytes long, limit is {MAX_OBJECT_NAME_BYTES}")]
    TooLong(usize),

    /// Name contains a control character or a backslash
    #[error("object name contains forbidden character {0:?}")]
    ForbiddenCharacter(char),

    /// Name has an empty, `.` or `..` path segment
    #[error("object name has invalid path segment {0:?}")]
    InvalidSegment(String),
}

/// An object name that is safe to sign for and to place in a URL path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectName(String);

impl ObjectName {
    /// Validates `raw` as an object name.
    ///
    /// `/` separates virtual directories. Every segment must be non-empty and
    /// neither `.` nor `..`, so absolute paths, trailing slashes and
    /// traversal are rejected.
    ///
    /// # Errors
    ///
    /// Returns an [`ObjectNameError`] describing the first rule the name breaks
    pub fn parse(raw: &str) -> Result<Self, ObjectNameError> {
        if raw.is_empty() {
            return Err(ObjectNameError::Missing);
        }
        if raw.len() > MAX_OBJECT_NAME_BYTES {
            return Err(ObjectNameError::TooLong(raw.len()));
        }
        if let Some(c) = raw.chars().find(|c| c.is_control() || *c == '\\') {
            return Err(ObjectNameError::ForbiddenCharacter(c));
        }
        if let Some(segment) = raw
            .split('/')
            .find(|segment| segment.is_empty() || *segment == "." || *segment == "..")
        {
            return Err(ObjectNameError::InvalidSegment(segment.to_string()));
        }

        Ok(Self(raw.to_string()))
    }

    /// The name as given
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments of the name, split on `/`
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ObjectName> for String {
    fn from(name: ObjectName) -> Self {
        name.0
    }
}
