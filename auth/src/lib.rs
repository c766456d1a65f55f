//! Authentication utilities library
//!
//! Provides reusable authentication infrastructure for services:
//! - Password hashing (Argon2id, separate hash and salt)
//! - JWT token generation and validation
//! - Opaque token generation and digesting
//!
//! Each service defines its own authentication traits and adapts these implementations.
//! This avoids coupling services through shared domain logic while reducing code duplication.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hashed = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hashed.hash, &hashed.salt));
//! ```
//!
//! ## JWT Tokens
//! ```
//! use auth::{Claims, JwtHandler};
//! use chrono::{Duration, Utc};
//!
//! let handler = JwtHandler::new(b"secret_key_at_least_32_bytes_long!")
//!     .unwrap()
//!     .with_issuer("identity")
//!     .with_audience("clients");
//! let claims = Claims::for_subject("user123", Utc::now(), Duration::minutes(15))
//!     .with_issuer("identity".to_string())
//!     .with_audience("clients".to_string());
//! let token = handler.encode(&claims).unwrap();
//! let decoded: Claims = handler.decode(&token).unwrap();
//! assert_eq!(decoded.sub.as_deref(), Some("user123"));
//! ```
//!
//! ## Opaque Tokens
//! ```
//! let token = auth::opaque::generate_token();
//! let key = auth::opaque::digest(&token);
//! assert_ne!(token, key);
//! ```

pub mod jwt;
pub mod opaque;
pub mod password;

// Re-export commonly used items
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use password::HashedPassword;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use password::PasswordParams;
