//! Parsing of user-supplied repository references.
//!
//! Users paste whatever they have at hand: a browser URL, an SSH remote, or
//! just `owner/name`. All of them reduce to a [`RepoRef`] before any request
//! is made.

use crate::error::AnalysisError;
use reqwest::Url;
use std::fmt;
use std::str::FromStr;

/// An owner and repository name pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse a repository reference.
    ///
    /// Accepts `https://host/owner/name[/...]`, `git@host:owner/name[.git]`
    /// and bare `owner/name`. Segments after the name are ignored.
    pub fn parse(input: &str) -> Result<Self, AnalysisError> {
        let invalid = || AnalysisError::Validation {
            input: input.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let path = if trimmed.contains("://") {
            let url = Url::parse(trimmed).map_err(|_| invalid())?;
            url.path().to_string()
        } else if let Some(rest) = trimmed.strip_prefix("git@") {
            // git@github.com:owner/repo
            match rest.split_once(':') {
                Some((_, path)) => path.to_string(),
                None => return Err(invalid()),
            }
        } else {
            // A host without a scheme would otherwise be taken as the owner.
            let first = trimmed.split('/').find(|s| !s.is_empty()).unwrap_or_default();
            if first.contains('.') || first.contains(':') {
                return Err(invalid());
            }
            trimmed.to_string()
        };

        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let owner = segments.next().ok_or_else(invalid)?;
        let name = segments.next().ok_or_else(invalid)?;
        let name = name.strip_suffix(".git").unwrap_or(name);

        if name.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(owner, name))
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoRef {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
