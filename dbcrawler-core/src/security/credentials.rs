//! Secure credential container with automatic memory zeroing.
//!
//! # Security
//! - Credentials are stored in `Zeroizing` containers
//! - Memory is automatically cleared when credentials go out of scope
//! - Passwords are never exposed in debug output or logs
//! - Single-use credentials give their password out once, then zeroize it

use zeroize::{Zeroize, Zeroizing};

/// Secure credential container that automatically zeros memory on drop.
///
/// # Example
///
/// ```rust
/// use dbcrawler_core::security::Credentials;
///
/// let mut creds = Credentials::single_use("admin".to_string(), Some("secret".to_string()));
/// assert!(creds.has_password());
/// assert!(creds.password_for_connect().is_some());
/// assert!(!creds.has_password());
/// ```
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Credentials {
    username: Zeroizing<String>,
    password: Zeroizing<Option<String>>,
    #[zeroize(skip)]
    single_use: bool,
}

impl Credentials {
    /// Creates reusable credentials.
    pub fn new(username: String, password: Option<String>) -> Self {
        Self {
            username: Zeroizing::new(username),
            password: Zeroizing::new(password),
            single_use: false,
        }
    }

    /// Creates credentials whose password is cleared after the first
    /// connection attempt.
    pub fn single_use(username: String, password: Option<String>) -> Self {
        Self {
            username: Zeroizing::new(username),
            password: Zeroizing::new(password),
            single_use: true,
        }
    }

    /// Gets the username (still protected by Zeroizing).
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Checks if password is present without exposing it.
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// Whether the password is handed out only once
    pub fn is_single_use(&self) -> bool {
        self.single_use
    }

    /// Password to pass to the driver.
    ///
    /// Single-use credentials move the password out and keep none behind;
    /// reusable credentials return a zeroizing clone.
    pub fn password_for_connect(&mut self) -> Option<Zeroizing<String>> {
        if self.single_use {
            self.password.take().map(Zeroizing::new)
        } else {
            self.password.as_deref().map(|p| Zeroizing::new(p.to_string()))
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username.as_str())
            .field("password", &self.has_password().then_some("*****"))
            .field("single_use", &self.single_use)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_new() {
        let creds = Credentials::new("testuser".to_string(), Some("testpass".to_string()));
        assert_eq!(creds.username(), "testuser");
        assert!(creds.has_password());
        assert!(!creds.is_single_use());
    }

    #[test]
    fn test_single_use_credentials_constructor() {
        let creds = Credentials::single_use("reader".to_string(), Some("pw".to_string()));
        assert!(creds.is_single_use());
        assert_eq!(creds.username(), "reader");
        assert!(creds.has_password());
    }

    #[test]
    fn test_credentials_no_password() {
        let creds = Credentials::new("testuser".to_string(), None);
        assert!(!creds.has_password());
    }

    #[test]
    fn test_reusable_password_survives_connect() {
        let mut creds = Credentials::new("user".to_string(), Some("pass".to_string()));
        assert_eq!(creds.password_for_connect().as_deref().map(String::as_str), Some("pass"));
        assert_eq!(creds.password_for_connect().as_deref().map(String::as_str), Some("pass"));
        assert!(creds.has_password());
    }

    #[test]
    fn test_single_use_password_cleared() {
        let mut creds = Credentials::single_use("user".to_string(), Some("pass".to_string()));
        assert_eq!(creds.password_for_connect().as_deref().map(String::as_str), Some("pass"));
        assert!(creds.password_for_connect().is_none());
        assert!(!creds.has_password());
        assert_eq!(creds.username(), "user");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("user".to_string(), Some("hunter2".to_string()));
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("*****"));
    }
}
