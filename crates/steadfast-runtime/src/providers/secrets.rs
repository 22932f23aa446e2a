//! Secure credential handling for content providers.
//!
//! Using this module ensures:
//!
//! - **No accidental logging**: Credentials cannot appear in Debug/Display output
//! - **Memory safety**: Credentials are zeroed on drop
//! - **Explicit exposure**: the raw value is only reachable through `.expose()`
//!
//! ## Usage
//!
//! ```ignore
//! use crate::providers::secrets::ApiCredential;
//!
//! let cred = ApiCredential::new(key, CredentialSource::Environment, "content provider API key");
//!
//! // Use in HTTP header (explicit exposure)
//! request.bearer_auth(cred.expose());
//! ```

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from environment variable
    Environment,
    /// Provided programmatically
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
///
/// - `Debug` and `Display` show `[REDACTED]`
/// - Memory is zeroed on drop via the `secrecy` crate
/// - The source is tracked for debugging configuration issues
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    /// Wrap a credential value.
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Expose the credential value for use in API calls.
    ///
    /// Only call this at the point where the credential is actually needed
    /// (e.g., setting an HTTP header). Never store the exposed value.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().trim().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_redacted_in_debug() {
        let secret = "sk-super-secret-key-12345";
        let cred = ApiCredential::new(secret, CredentialSource::Programmatic, "Test API key");

        let debug = format!("{:?}", cred);
        assert!(!debug.contains(secret), "Secret exposed in Debug!");
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_credential_redacted_in_display() {
        let secret = "sk-super-secret-key-12345";
        let cred = ApiCredential::new(secret, CredentialSource::Environment, "Test API key");

        let display = format!("{}", cred);
        assert!(!display.contains(secret), "Secret exposed in Display!");
        assert!(display.contains("[REDACTED]"));
        assert!(display.contains("Test API key"));
        assert!(display.contains("environment"));
    }

    #[test]
    fn test_credential_expose() {
        let secret = "sk-super-secret-key-12345";
        let cred = ApiCredential::new(secret, CredentialSource::Programmatic, "Test API key");
        assert_eq!(cred.expose(), secret);
        assert!(!cred.is_empty());
    }

    #[test]
    fn test_blank_credential_is_empty() {
        let cred = ApiCredential::new("  ", CredentialSource::Programmatic, "Test API key");
        assert!(cred.is_empty());
    }
}
