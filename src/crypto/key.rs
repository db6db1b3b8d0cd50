//! Key material handling
//!
//! The decryption key is read once per run and passed by reference to the
//! decryptor. Its bytes are zeroed on drop and never appear in Debug output.

use std::fmt;

use base64::{
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD},
    Engine,
};
use zeroize::Zeroizing;

use crate::error::DecryptFailure;

/// Length of a decoded Fernet key in bytes: signing half plus encryption half
pub const KEY_SIZE: usize = 32;

/// The configured decryption key, exactly as it appeared in configuration
///
/// The value is opaque until [`DecryptionKey::cipher_key`] decodes it, so a
/// malformed key surfaces as a decryption failure rather than a lookup one.
pub struct DecryptionKey {
    material: Zeroizing<Vec<u8>>,
}

impl DecryptionKey {
    /// Wrap raw key material
    pub fn new(material: impl Into<Vec<u8>>) -> Self {
        Self {
            material: Zeroizing::new(material.into()),
        }
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.material
    }

    /// Decode the material into the 32 raw key bytes
    ///
    /// Accepts the URL-safe alphabet (what `Fernet.generate_key()` emits) as
    /// well as the standard one, with or without padding.
    pub fn cipher_key(&self) -> Result<Zeroizing<[u8; KEY_SIZE]>, DecryptFailure> {
        let text = std::str::from_utf8(&self.material)
            .map_err(|_| DecryptFailure::InvalidKey("key is not valid UTF-8".to_string()))?
            .trim();

        let decoded = [URL_SAFE, URL_SAFE_NO_PAD, STANDARD, STANDARD_NO_PAD]
            .iter()
            .find_map(|engine| engine.decode(text).ok())
            .map(Zeroizing::new)
            .ok_or_else(|| DecryptFailure::InvalidKey("key is not valid base64".to_string()))?;

        if decoded.len() != KEY_SIZE {
            return Err(DecryptFailure::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_SIZE,
                decoded.len()
            )));
        }

        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        key.copy_from_slice(&decoded);
        Ok(key)
    }
}

impl From<String> for DecryptionKey {
    fn from(s: String) -> Self {
        Self::new(s.into_bytes())
    }
}

impl From<&str> for DecryptionKey {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes().to_vec())
    }
}

// Don't print the contents in Debug output
impl fmt::Debug for DecryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptionKey")
            .field("len", &self.material.len())
            .finish()
    }
}
