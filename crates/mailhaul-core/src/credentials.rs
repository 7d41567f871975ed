//! Login credentials loaded from an external file.
//!
//! The file holds `username = <value>` and `password = <value>` lines.
//! The value is everything after the first `=`, with surrounding
//! whitespace trimmed. Both keys must be present.

use std::path::Path;

use crate::{Error, Result};

/// A `(username, password)` pair for LOGIN.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
}

// Never include the password in debug output.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Loads credentials from the given file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credentials`] when the file cannot be read or one
    /// of the keys is missing.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Credentials {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&contents).map_err(|message| Error::Credentials {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parses credentials from file contents.
    fn parse(contents: &str) -> std::result::Result<Self, String> {
        let mut username = None;
        let mut password = None;

        for line in contents.lines() {
            let Some(eq) = line.find('=') else {
                continue;
            };
            let key = line[..eq].trim();
            let value = line[eq + 1..].trim();
            match key {
                "username" => username = Some(value.to_string()),
                "password" => password = Some(value.to_string()),
                _ => {}
            }
        }

        let username = username.ok_or_else(|| "missing username".to_string())?;
        let password = password.ok_or_else(|| "missing password".to_string())?;
        Ok(Self { username, password })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_keys() {
        let creds = Credentials::parse("username = alice\npassword = secret\n").unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn whitespace_around_equals_is_dropped() {
        let creds = Credentials::parse("username=alice\npassword   =   s3cret  \n").unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "s3cret");
    }

    #[test]
    fn value_may_contain_equals() {
        let creds = Credentials::parse("username = alice\npassword = a=b=c\n").unwrap();
        assert_eq!(creds.password, "a=b=c");
    }

    #[test]
    fn missing_password_is_an_error() {
        assert!(Credentials::parse("username = alice\n").is_err());
    }

    #[test]
    fn missing_username_is_an_error() {
        assert!(Credentials::parse("password = secret\n").is_err());
    }

    #[test]
    fn unknown_lines_are_ignored() {
        let creds =
            Credentials::parse("# imap account\nusername = alice\nhost = x\npassword = pw\n")
                .unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "pw");
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Credentials::load(Path::new("/nonexistent/auth")).unwrap_err();
        assert!(matches!(err, Error::Credentials { .. }));
    }

    #[test]
    fn debug_redacts_password() {
        let creds = Credentials {
            username: "alice".into(),
            password: "secret".into(),
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("secret"));
    }
}
