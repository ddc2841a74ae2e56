//! Input validation for host, user and repository URL fields.
//!
//! Validation has no side effects and runs before any directory is created
//! or any process is started.

use std::fmt;

use thiserror::Error;
use url::Url;

use crate::target::SshTarget;

/// Why a single field was rejected.
#[derive(Debug, Error)]
pub enum InvalidValue {
    #[error("empty string")]
    Empty,

    #[error("malformed URL")]
    Malformed(#[source] url::ParseError),

    #[error("value may not start with '-'")]
    LeadingDash,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("--host is not a valid value; omit the flag to use the default value")]
    InvalidHost(#[source] InvalidValue),

    #[error("--user is not a valid value")]
    InvalidUser(#[source] InvalidValue),

    #[error("--url is not a valid value")]
    InvalidUrl(#[source] InvalidValue),
}

/// A repository location accepted by `git clone`.
///
/// Absolute URLs (`https://`, `ssh://`, `git://`, `file://`) are parsed with
/// [`url::Url`]; scp-like remotes (`git@host:org/repo.git`) and local paths
/// are kept verbatim since they are not URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoUrl {
    Url(Url),
    Other(String),
}

impl RepoUrl {
    pub fn parse(raw: &str) -> Result<Self, InvalidValue> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(InvalidValue::Empty);
        }
        if raw.starts_with('-') {
            return Err(InvalidValue::LeadingDash);
        }

        match Url::parse(raw) {
            Ok(url) => Ok(Self::Url(url)),
            // Anything spelled like `scheme://...` must parse as a URL.
            Err(err) if raw.contains("://") => Err(InvalidValue::Malformed(err)),
            Err(_) => Ok(Self::Other(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Url(url) => url.as_str(),
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for RepoUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Host and user end up as `ssh`/`scp` arguments and must not read as options.
fn plain_value(value: &str) -> Result<(), InvalidValue> {
    let value = value.trim();
    if value.is_empty() {
        return Err(InvalidValue::Empty);
    }
    if value.starts_with('-') {
        return Err(InvalidValue::LeadingDash);
    }
    Ok(())
}

pub fn validate_host(host: &str) -> Result<(), ValidationError> {
    plain_value(host).map_err(ValidationError::InvalidHost)
}

pub fn validate_user(user: &str) -> Result<(), ValidationError> {
    plain_value(user).map_err(ValidationError::InvalidUser)
}

pub fn validate_url(url: &str) -> Result<RepoUrl, ValidationError> {
    RepoUrl::parse(url).map_err(ValidationError::InvalidUrl)
}

/// Validate the host and, when set, the user of an SSH target.
pub fn validate_target(target: &SshTarget) -> Result<(), ValidationError> {
    validate_host(&target.host)?;
    if let Some(user) = &target.user {
        validate_user(user)?;
    }
    Ok(())
}
