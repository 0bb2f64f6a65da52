use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdError {
    #[error("owner handle cannot be empty")]
    EmptyOwner,
    #[error("video id cannot be empty")]
    EmptyVideo,
}

/// Stable handle of the creator whose progress and metrics are aggregated.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerHandle(String);

impl OwnerHandle {
    /// Parses a handle, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `IdError::EmptyOwner` when nothing is left after trimming.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, IdError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdError::EmptyOwner);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a course video.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// # Errors
    ///
    /// Returns `IdError::EmptyVideo` when the id is blank.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, IdError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdError::EmptyVideo);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OwnerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerHandle({})", self.0)
    }
}

impl fmt::Display for OwnerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VideoId({})", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_trimmed() {
        let owner = OwnerHandle::parse("  @nova ").unwrap();
        assert_eq!(owner.as_str(), "@nova");
        assert_eq!(owner.to_string(), "@nova");
    }

    #[test]
    fn blank_ids_are_rejected() {
        assert_eq!(OwnerHandle::parse("   "), Err(IdError::EmptyOwner));
        assert_eq!(VideoId::parse(""), Err(IdError::EmptyVideo));
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = VideoId::parse("intro-1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"intro-1\"");
    }
}
