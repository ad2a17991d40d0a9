use base64::{Engine as _, engine::general_purpose};
use rand::RngCore;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;

/// Bytes of entropy in an API key token.
pub const APIKEY_TOKEN_SIZE: usize = 32;

/// Generates a new random API key token.
///
/// # Returns
///
/// A URL-safe base64-encoded token carrying `APIKEY_TOKEN_SIZE` random bytes.
pub fn generate_apikey_token() -> String {
    let mut token = [0u8; APIKEY_TOKEN_SIZE];
    OsRng.fill_bytes(&mut token);

    general_purpose::URL_SAFE_NO_PAD.encode(token)
}

/// Compares two tokens without short-circuiting on the first differing byte.
pub fn tokens_match(presented: &str, stored: &str) -> bool {
    presented.as_bytes().ct_eq(stored.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_url_safe_and_full_length() {
        let token = generate_apikey_token();
        // 32 bytes -> 43 unpadded base64 chars
        assert_eq!(token.len(), 43);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn tokens_differ() {
        assert_ne!(generate_apikey_token(), generate_apikey_token());
    }

    #[test]
    fn match_is_exact() {
        let token = generate_apikey_token();
        assert!(tokens_match(&token, &token));
        assert!(!tokens_match(&token[..42], &token));
        assert!(!tokens_match("", &token));
    }
}
