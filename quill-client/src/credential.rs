//! User credentials for administrative operations.

use std::fmt;

use quill_core::{QuillError, Result};

/// A user's credentials: the principal name, a password, and the source
/// database the user is defined in.
///
/// Password shaping (hashing, digesting) is the caller's concern; the value
/// here is carried as given into the server command.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    username: String,
    password: String,
    source: String,
}

impl Credential {
    /// Creates a credential, validating the principal and source names.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Self> {
        let username = username.into();
        let password = password.into();
        let source = source.into();

        if username.is_empty() {
            return Err(QuillError::Configuration(
                "username must not be empty".to_string(),
            ));
        }
        if source.is_empty() {
            return Err(QuillError::Configuration(
                "credential source database must not be empty".to_string(),
            ));
        }

        Ok(Self {
            username,
            password,
            source,
        })
    }

    /// The principal name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password as given.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// The database the user is defined in.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}
