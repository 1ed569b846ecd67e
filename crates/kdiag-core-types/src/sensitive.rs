//! Sensitive data marker for configuration dumps
//!
//! The `conf` diagnostic command prints the effective configuration over a
//! plain socket. Values that look like credentials are wrapped in
//! `Sensitive<T>` so they render as a fixed placeholder instead.

use std::fmt;

/// Placeholder printed instead of a sensitive value
pub const REDACTED: &str = "***REDACTED***";

/// Key fragments that mark a configuration entry as sensitive
const SENSITIVE_KEY_FRAGMENTS: &[&str] = &["password", "secret", "token", "private_key", "credential"];

/// Wrapper for sensitive data that redacts itself in Debug and Display
///
/// # Example
///
/// ```
/// use kdiag_core_types::Sensitive;
///
/// let digest = Sensitive::new("auth-digest");
/// assert_eq!(digest.to_string(), "***REDACTED***");
/// assert_eq!(digest.expose(), &"auth-digest");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the underlying value
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

/// Whether a configuration key names a credential-like value
///
/// Matching is case-insensitive on the key fragments above.
pub fn is_sensitive_key(key: &str) -> bool {
    let lowered = key.to_ascii_lowercase();
    SENSITIVE_KEY_FRAGMENTS
        .iter()
        .any(|fragment| lowered.contains(fragment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_debug_and_display_redaction() {
        let secret = Sensitive::new("digest-password");
        assert_eq!(format!("{:?}", secret), REDACTED);
        assert_eq!(format!("{}", secret), REDACTED);
    }

    #[test]
    fn test_sensitive_expose() {
        let secret = Sensitive::new(42u32);
        assert_eq!(*secret.expose(), 42);
        assert_eq!(secret.into_inner(), 42);
    }

    #[test]
    fn test_sensitive_key_classification() {
        assert!(is_sensitive_key("raft.tls_private_key"));
        assert!(is_sensitive_key("auth.Digest_Password"));
        assert!(!is_sensitive_key("server_id"));
        assert!(!is_sensitive_key("log_storage_path"));
    }
}
