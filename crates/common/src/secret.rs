//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports the [`secrecy`] types used for the token signing secret, the
//! payment provider key and payment client secrets.
//!
//! `SecretString` implements `Debug` with redaction, so any struct deriving
//! `Debug` that holds one is safe to log. Secrets are zeroized on drop.
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! let key = SecretString::from("sk_test_123");
//! assert!(!format!("{key:?}").contains("sk_test_123"));
//! assert_eq!(key.expose_secret(), "sk_test_123");
//! ```

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
