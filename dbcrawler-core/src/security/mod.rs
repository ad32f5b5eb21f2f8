//! Security utilities for credential protection.
//!
//! # Security Guarantees
//! - Credentials are stored in `Zeroizing` containers for automatic memory clearing
//! - Connection strings are split so that passwords travel separately
//! - All sensitive data is redacted from logs and error messages
//!
//! # Module Structure
//! - `credentials`: Secure credential container with automatic memory zeroing
//! - `connection`: Credential extraction and masked property rendering

mod connection;
mod credentials;

pub use connection::{
    PASSWORD_MASK, PASSWORD_PROPERTY, USER_PROPERTY, safe_properties, split_credentials,
};
pub use credentials::Credentials;
