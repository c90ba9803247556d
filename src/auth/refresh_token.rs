/// Refresh Token Generation
///
/// Refresh tokens are opaque: 32 bytes from the operating system's CSPRNG,
/// hex-encoded to 64 lowercase characters. Their lifecycle lives in the
/// store, not in the token itself.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::AuthError;

const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate a new refresh token
///
/// # Errors
/// Returns `EntropyFailure` if the OS random source is unavailable. There is
/// no fallback to a weaker generator.
pub fn generate_refresh_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::EntropyFailure(e.to_string()))?;

    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_refresh_token() {
        let token = generate_refresh_token().expect("Failed to generate token");

        assert_eq!(token.len(), 64);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_tokens_are_unique() {
        let tokens: HashSet<String> = (0..1000)
            .map(|_| generate_refresh_token().expect("Failed to generate token"))
            .collect();

        assert_eq!(tokens.len(), 1000);
    }
}
