use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::rand_core::RngCore;
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::Version;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use subtle::ConstantTimeEq;

use super::errors::PasswordError;

/// Salt length in bytes (128 bits).
pub const SALT_LENGTH: usize = 16;

/// Derived key length in bytes (256 bits).
pub const HASH_LENGTH: usize = 32;

/// Argon2id cost parameters.
///
/// Defaults follow the Argon2 crate's recommended settings
/// (19 MiB memory, 2 passes, 1 lane).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes over memory
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Password hash and the salt it was derived with, both base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedPassword {
    pub hash: String,
    pub salt: String,
}

/// Password hashing implementation.
///
/// Derives a 256-bit key with Argon2id from the password and a random 128-bit salt.
/// Hash and salt are stored separately so the cost parameters stay a deployment
/// concern instead of being embedded in every stored credential.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Create a password hasher with default Argon2id parameters.
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Create a password hasher with explicit cost parameters.
    ///
    /// # Arguments
    /// * `params` - Memory, iteration and parallelism costs
    ///
    /// # Errors
    /// * `InvalidParameters` - Parameters are outside Argon2's accepted ranges
    pub fn with_params(params: PasswordParams) -> Result<Self, PasswordError> {
        let params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            Some(HASH_LENGTH),
        )
        .map_err(|e| PasswordError::InvalidParameters(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a plaintext password with a freshly generated salt.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// Base64 encoded hash and salt
    ///
    /// # Errors
    /// * `HashingFailed` - Key derivation failed
    pub fn hash(&self, password: &str) -> Result<HashedPassword, PasswordError> {
        let mut salt = [0u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut salt);

        let derived = self
            .derive(password, &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: STANDARD.encode(derived),
            salt: STANDARD.encode(salt),
        })
    }

    /// Verify a password against a stored hash and salt.
    ///
    /// The comparison runs in constant time. A stored hash or salt that cannot be
    /// decoded, or that Argon2 rejects, is a verification failure.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `hash` - Stored base64 hash
    /// * `salt` - Stored base64 salt
    ///
    /// # Returns
    /// True if password matches, false otherwise
    pub fn verify(&self, password: &str, hash: &str, salt: &str) -> bool {
        let (Ok(expected), Ok(salt)) = (STANDARD.decode(hash), STANDARD.decode(salt)) else {
            return false;
        };

        match self.derive(password, &salt) {
            Ok(derived) => derived.as_slice().ct_eq(expected.as_slice()).into(),
            Err(_) => false,
        }
    }

    fn derive(&self, password: &str, salt: &[u8]) -> Result<[u8; HASH_LENGTH], argon2::Error> {
        let mut output = [0u8; HASH_LENGTH];
        self.argon2
            .hash_password_into(password.as_bytes(), salt, &mut output)?;
        Ok(output)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
