//! Opaque provider credentials.

use std::fmt;

/// An opaque secret scoped to one provider.
///
/// API key, session token, or composite secret. Loaded once at startup and
/// immutable afterwards. `Debug` and `Display` only ever show the masked id.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the raw secret for use in a request.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true if the secret is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Returns the last `n` characters of the secret.
    ///
    /// Used to match a key against redacted values that only reveal a suffix.
    pub fn suffix(&self, n: usize) -> &str {
        let start = self
            .0
            .char_indices()
            .rev()
            .nth(n.saturating_sub(1))
            .map_or(0, |(i, _)| i);
        &self.0[start..]
    }

    /// Returns the masked identifier safe for logs and metric labels.
    ///
    /// - longer than 14 chars: first 10 + `...` + last 4
    /// - 9 to 14 chars: first 4 + `...`
    /// - shorter: `***`
    pub fn masked_id(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        match chars.len() {
            n if n > 14 => {
                let head: String = chars[..10].iter().collect();
                let tail: String = chars[n - 4..].iter().collect();
                format!("{head}...{tail}")
            }
            n if n > 8 => {
                let head: String = chars[..4].iter().collect();
                format!("{head}...")
            }
            _ => "***".to_string(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked_id()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked_id())
    }
}
