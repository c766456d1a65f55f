use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::rand_core::RngCore;
use base64::engine::general_purpose::STANDARD;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::Digest;
use sha2::Sha256;

/// Number of random bytes in an opaque token (256 bits).
pub const TOKEN_LENGTH: usize = 32;

/// Generate a random opaque token.
///
/// # Returns
/// Base64 encoded string of 32 bytes drawn from the operating system RNG
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_LENGTH];
    OsRng.fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

/// Digest an opaque token for storage and lookup.
///
/// Stores keep this digest instead of the raw token so a leaked store
/// cannot be replayed against the service.
///
/// # Returns
/// URL-safe base64 (no padding) SHA-256 digest of the token
pub fn digest(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}
