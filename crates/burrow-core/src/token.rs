use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Number of characters in every short token.
pub const TOKEN_LENGTH: usize = 6;

/// Characters a short token is drawn from: `a-z`, `A-Z` and `=`.
pub const TOKEN_ALPHABET: &[u8; 53] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ=";

/// The short identifier used as the path segment of a shortened URL.
///
/// Tokens are exactly [`TOKEN_LENGTH`] characters long and contain only
/// characters from [`TOKEN_ALPHABET`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortToken(String);

impl ShortToken {
    /// Creates a new `ShortToken` after validating the input.
    pub fn parse(token: impl Into<String>) -> Result<Self, CoreError> {
        let token = token.into();
        Self::validate(&token)?;
        Ok(Self(token))
    }

    /// Creates a `ShortToken` without validation.
    ///
    /// Use this only for tokens produced by trusted internal sources
    /// (the token generator, or rows read back from a backend).
    pub fn new_unchecked(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    fn validate(token: &str) -> Result<(), CoreError> {
        if token.len() != TOKEN_LENGTH {
            return Err(CoreError::InvalidShortToken(format!(
                "length must be {}, got {}",
                TOKEN_LENGTH,
                token.len()
            )));
        }

        if let Some(c) = token.bytes().find(|b| !TOKEN_ALPHABET.contains(b)) {
            return Err(CoreError::InvalidShortToken(format!(
                "unexpected character '{}' in '{}'",
                char::from(c),
                token
            )));
        }

        Ok(())
    }
}

impl Display for ShortToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShortToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
