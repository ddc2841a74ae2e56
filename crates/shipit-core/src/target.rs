//! SSH destination addressing.

use std::fmt;

/// Host used when neither a flag nor the config file names one.
///
/// Expected to be an alias from `~/.ssh/config`.
pub const DEFAULT_HOST: &str = "test";

/// A remote host, optionally qualified by a login user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub user: Option<String>,
}

impl SshTarget {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: None,
        }
    }

    /// Set the login user. An empty user leaves the target unqualified.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        let user = user.into();
        self.user = if user.is_empty() { None } else { Some(user) };
        self
    }

    /// The `user@host` (or bare `host`) address handed to `ssh` and `scp`.
    pub fn address(&self) -> String {
        self.to_string()
    }

    /// `scp` destination for the remote home directory.
    pub fn scp_home(&self) -> String {
        format!("{self}:~")
    }
}

impl fmt::Display for SshTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.user {
            Some(user) => write!(f, "{}@{}", user, self.host),
            None => f.write_str(&self.host),
        }
    }
}
