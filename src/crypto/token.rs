use rand::{rngs::OsRng, RngCore};

/// 32 bytes = 256 bits of entropy.
pub const TOKEN_BYTES: usize = 32;

/// Generate an opaque session token: OS randomness, base64url without padding.
pub fn generate_token() -> String {
    let mut buffer = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut buffer);
    base64_simd::URL_SAFE_NO_PAD.encode_to_string(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tokens_are_url_safe() {
        let token = generate_token();
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn ten_thousand_tokens_do_not_collide() {
        let tokens: HashSet<String> = (0..10_000).map(|_| generate_token()).collect();
        assert_eq!(tokens.len(), 10_000);
    }
}
