//! Cryptographic functions for restore-util
//!
//! Provides Fernet token decryption (AES-128-CBC with HMAC-SHA256) and the
//! zeroizing key type that carries the configured secret.

pub mod encryption;
pub mod key;

pub use encryption::{decrypt, encrypt, FORMAT_VERSION};
pub use key::{DecryptionKey, KEY_SIZE};
