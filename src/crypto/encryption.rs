//! Fernet backup decryption
//!
//! The backup job writes each dump as a Fernet token: URL-safe base64 of
//!
//! ```text
//! [version: 0x80][timestamp: u64 BE][iv: 16 bytes][AES-128-CBC ciphertext][HMAC-SHA256: 32 bytes]
//! ```
//!
//! The 32-byte key splits into a 16-byte signing key (first half) and a
//! 16-byte encryption key (second half). The HMAC covers everything before it
//! and is verified before any block is decrypted, so a wrong key and a
//! tampered file both fail with [`DecryptFailure::Authentication`].
//! Token age is not checked.

use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Block};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::DecryptFailure;

use super::DecryptionKey;

type HmacSha256 = Hmac<Sha256>;

/// Version byte at the start of every Fernet token
pub const FORMAT_VERSION: u8 = 0x80;

const BLOCK_SIZE: usize = 16;
const TIMESTAMP_SIZE: usize = 8;
const HMAC_SIZE: usize = 32;
const HEADER_SIZE: usize = 1 + TIMESTAMP_SIZE + BLOCK_SIZE;

/// Smallest possible token: header, one padding block and the HMAC
const MIN_TOKEN_SIZE: usize = HEADER_SIZE + BLOCK_SIZE + HMAC_SIZE;

/// URL-safe alphabet that accepts tokens with or without trailing `=`
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

struct TokenKeys {
    signing: Zeroizing<[u8; BLOCK_SIZE]>,
    encryption: Zeroizing<[u8; BLOCK_SIZE]>,
}

impl TokenKeys {
    fn split(key: &DecryptionKey) -> Result<Self, DecryptFailure> {
        let bytes = key.cipher_key()?;
        let mut signing = Zeroizing::new([0u8; BLOCK_SIZE]);
        let mut encryption = Zeroizing::new([0u8; BLOCK_SIZE]);
        signing.copy_from_slice(&bytes[..BLOCK_SIZE]);
        encryption.copy_from_slice(&bytes[BLOCK_SIZE..]);
        Ok(Self {
            signing,
            encryption,
        })
    }

    fn mac(&self) -> Result<HmacSha256, DecryptFailure> {
        <HmacSha256 as Mac>::new_from_slice(self.signing.as_slice())
            .map_err(|e| DecryptFailure::InvalidKey(e.to_string()))
    }

    fn cipher(&self) -> Result<Aes128, DecryptFailure> {
        Aes128::new_from_slice(self.encryption.as_slice())
            .map_err(|e| DecryptFailure::InvalidKey(e.to_string()))
    }
}

/// Encrypt plaintext into a Fernet token, stamped with the current time
///
/// The restore tool itself never encrypts; this exists so backups can be
/// produced for tests and fixtures.
pub fn encrypt(plaintext: &[u8], key: &DecryptionKey) -> Result<Vec<u8>, DecryptFailure> {
    let mut iv = [0u8; BLOCK_SIZE];
    OsRng.fill_bytes(&mut iv);
    let timestamp = chrono::Utc::now().timestamp().max(0) as u64;
    encrypt_with(plaintext, key, timestamp, iv)
}

/// Encrypt with an explicit timestamp and IV
pub fn encrypt_with(
    plaintext: &[u8],
    key: &DecryptionKey,
    timestamp: u64,
    iv: [u8; BLOCK_SIZE],
) -> Result<Vec<u8>, DecryptFailure> {
    let keys = TokenKeys::split(key)?;
    let cipher = keys.cipher()?;

    let mut token = Vec::with_capacity(MIN_TOKEN_SIZE + plaintext.len());
    token.push(FORMAT_VERSION);
    token.extend_from_slice(&timestamp.to_be_bytes());
    token.extend_from_slice(&iv);

    // PKCS#7: always at least one byte of padding
    let pad = BLOCK_SIZE - plaintext.len() % BLOCK_SIZE;
    let mut padded = Zeroizing::new(Vec::with_capacity(plaintext.len() + pad));
    padded.extend_from_slice(plaintext);
    padded.resize(plaintext.len() + pad, pad as u8);

    let mut previous = iv;
    for chunk in padded.chunks_exact(BLOCK_SIZE) {
        let mut block = Block::default();
        for (out, (p, c)) in block.iter_mut().zip(chunk.iter().zip(previous.iter())) {
            *out = p ^ c;
        }
        cipher.encrypt_block(&mut block);
        previous.copy_from_slice(&block);
        token.extend_from_slice(&block);
    }

    let mut mac = keys.mac()?;
    mac.update(&token);
    token.extend_from_slice(&mac.finalize().into_bytes());

    Ok(TOKEN_ENGINE.encode(token).into_bytes())
}

/// Decrypt a Fernet token
///
/// Whitespace in the token is ignored. Never returns partially decrypted data:
/// either the HMAC verifies and the full plaintext comes back, or nothing does.
pub fn decrypt(token: &[u8], key: &DecryptionKey) -> Result<Vec<u8>, DecryptFailure> {
    let keys = TokenKeys::split(key)?;

    let text: Vec<u8> = token
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let data = TOKEN_ENGINE
        .decode(text)
        .map_err(|_| DecryptFailure::Malformed)?;

    let &version = data.first().ok_or(DecryptFailure::Malformed)?;
    if version != FORMAT_VERSION {
        return Err(DecryptFailure::UnsupportedVersion(version));
    }
    if data.len() < MIN_TOKEN_SIZE {
        return Err(DecryptFailure::Malformed);
    }

    let (signed, tag) = data.split_at(data.len() - HMAC_SIZE);
    let mut mac = keys.mac()?;
    mac.update(signed);
    mac.verify_slice(tag)
        .map_err(|_| DecryptFailure::Authentication)?;

    let (iv, ciphertext) = signed[1 + TIMESTAMP_SIZE..].split_at(BLOCK_SIZE);
    if ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(DecryptFailure::Malformed);
    }

    let cipher = keys.cipher()?;
    let mut plaintext = Zeroizing::new(Vec::with_capacity(ciphertext.len()));
    let mut previous = iv;
    for chunk in ciphertext.chunks_exact(BLOCK_SIZE) {
        let mut block = Block::clone_from_slice(chunk);
        cipher.decrypt_block(&mut block);
        plaintext.extend(block.iter().zip(previous.iter()).map(|(b, p)| b ^ p));
        previous = chunk;
    }

    let pad = usize::from(*plaintext.last().ok_or(DecryptFailure::Malformed)?);
    if pad == 0
        || pad > BLOCK_SIZE
        || !plaintext[plaintext.len() - pad..]
            .iter()
            .all(|&b| usize::from(b) == pad)
    {
        return Err(DecryptFailure::Malformed);
    }

    let len = plaintext.len() - pad;
    Ok(plaintext[..len].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE;

    // Produced by Python's cryptography.fernet
    const PY_KEY: &str = "WIqf2lZruyIfeyGijbqLKw6gvnN93MmqjBiBrXtqTfQ=";
    const PY_TOKEN: &str = "gAAAAABq1hf1oGBBVSbfWFSXSBjTlZA_ImEgj9g-0cKLOGYKyluSoHSitq8m4F92GjdOJXXbemastSEuxotR6LpHBwWW8v1JDABq_ZYLcXTXJmbmhC9ncW8=";

    // Published Fernet "generate" vector
    const VECTOR_KEY: &str = "cw_0x689RpI-jtRR7oE8h_eQsKImvJapLeSbXpwF4e4=";
    const VECTOR_TOKEN: &str = "gAAAAAAdwJ6wAAECAwQFBgcICQoLDA0ODy021cpGVWKZ_eEwCGM4BLLF_5CV9dOPmrhuVUPgJobwOz7JcbmrR64jVmpU4IwqDA==";

    fn test_key(byte: u8) -> DecryptionKey {
        DecryptionKey::from(URL_SAFE.encode([byte; 32]))
    }

    /// Decode a token, flip one byte of the raw data, re-encode it
    fn tamper(token: &[u8], index: usize) -> Vec<u8> {
        let mut data = TOKEN_ENGINE.decode(token).unwrap();
        data[index] ^= 0x01;
        TOKEN_ENGINE.encode(data).into_bytes()
    }

    #[test]
    fn test_decrypts_python_token() {
        let plaintext = decrypt(PY_TOKEN.as_bytes(), &DecryptionKey::from(PY_KEY)).unwrap();
        assert_eq!(plaintext, b"INSERT INTO t VALUES (1);\n");
    }

    #[test]
    fn test_python_token_with_trailing_newline() {
        let token = format!("{}\n", PY_TOKEN);
        assert!(decrypt(token.as_bytes(), &DecryptionKey::from(PY_KEY)).is_ok());
    }

    #[test]
    fn test_matches_published_vector() {
        let key = DecryptionKey::from(VECTOR_KEY);
        let iv: [u8; 16] = std::array::from_fn(|i| i as u8);

        let token = encrypt_with(b"hello", &key, 499_162_800, iv).unwrap();

        assert_eq!(token, VECTOR_TOKEN.as_bytes());
        assert_eq!(decrypt(VECTOR_TOKEN.as_bytes(), &key).unwrap(), b"hello");
    }

    #[test]
    fn test_encrypt_decrypt() {
        let key = test_key(1);
        let plaintext = b"INSERT INTO users VALUES (1, 'alice');";

        let token = encrypt(plaintext, &key).unwrap();
        let decrypted = decrypt(&token, &key).unwrap();

        assert_eq!(plaintext, decrypted.as_slice());
    }

    #[test]
    fn test_token_layout() {
        let key = test_key(1);
        let token = encrypt(b"abc", &key).unwrap();

        assert!(token.starts_with(b"gAAAAA"));
        let data = TOKEN_ENGINE.decode(&token).unwrap();
        assert_eq!(data[0], FORMAT_VERSION);
        assert_eq!(data.len(), MIN_TOKEN_SIZE);
    }

    #[test]
    fn test_different_ivs() {
        let key = test_key(1);

        let first = encrypt(b"same", &key).unwrap();
        let second = encrypt(b"same", &key).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_wrong_key_fails() {
        let token = encrypt(b"secret rows", &test_key(1)).unwrap();

        let result = decrypt(&token, &test_key(2));
        assert_eq!(result, Err(DecryptFailure::Authentication));
    }

    #[test]
    fn test_wrong_key_on_python_token() {
        let result = decrypt(PY_TOKEN.as_bytes(), &test_key(9));
        assert_eq!(result, Err(DecryptFailure::Authentication));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = test_key(1);
        let token = encrypt(b"secret rows", &key).unwrap();

        assert_eq!(
            decrypt(&tamper(&token, HEADER_SIZE + 2), &key),
            Err(DecryptFailure::Authentication)
        );
    }

    #[test]
    fn test_tampered_timestamp_fails() {
        let key = DecryptionKey::from(PY_KEY);
        assert_eq!(
            decrypt(&tamper(PY_TOKEN.as_bytes(), 3), &key),
            Err(DecryptFailure::Authentication)
        );
    }

    #[test]
    fn test_truncated_token_fails() {
        let key = test_key(1);
        let data = TOKEN_ENGINE.decode(encrypt(b"", &key).unwrap()).unwrap();
        let short = TOKEN_ENGINE.encode(&data[..MIN_TOKEN_SIZE - 1]);

        assert_eq!(decrypt(short.as_bytes(), &key), Err(DecryptFailure::Malformed));
        assert_eq!(decrypt(b"", &key), Err(DecryptFailure::Malformed));
    }

    #[test]
    fn test_not_base64_fails() {
        let key = test_key(1);
        assert_eq!(
            decrypt(b"\x01not really encrypted at all", &key),
            Err(DecryptFailure::Malformed)
        );
    }

    #[test]
    fn test_unknown_version_fails() {
        let key = test_key(1);
        let mut data = TOKEN_ENGINE.decode(encrypt(b"data", &key).unwrap()).unwrap();
        data[0] = 0x01;

        assert_eq!(
            decrypt(TOKEN_ENGINE.encode(data).as_bytes(), &key),
            Err(DecryptFailure::UnsupportedVersion(0x01))
        );
    }

    #[test]
    fn test_invalid_key_fails_before_reading_data() {
        let key = DecryptionKey::from("short");
        assert!(matches!(
            decrypt(PY_TOKEN.as_bytes(), &key),
            Err(DecryptFailure::InvalidKey(_))
        ));
    }

    #[test]
    fn test_empty_plaintext() {
        let key = test_key(3);
        let token = encrypt(b"", &key).unwrap();
        assert!(decrypt(&token, &key).unwrap().is_empty());
    }

    #[test]
    fn test_block_aligned_plaintext() {
        let key = test_key(3);
        let plaintext = [b'x'; 32];
        let token = encrypt(&plaintext, &key).unwrap();

        let data = TOKEN_ENGINE.decode(&token).unwrap();
        assert_eq!(data.len(), HEADER_SIZE + 48 + HMAC_SIZE);
        assert_eq!(decrypt(&token, &key).unwrap(), plaintext);
    }

    #[test]
    fn test_large_plaintext() {
        let key = test_key(4);
        let plaintext: Vec<u8> = (0..100_000).map(|i| (i % 256) as u8).collect();

        let token = encrypt(&plaintext, &key).unwrap();
        assert_eq!(decrypt(&token, &key).unwrap(), plaintext);
    }
}
