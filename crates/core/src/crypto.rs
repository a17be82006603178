//! AES-256-GCM encryption for protecting the stored refresh token at rest.

use std::path::Path;

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    AeadCore, Aes256Gcm, Key, Nonce,
};

use crate::error::{PortalError, Result};

/// Generate a new random 256-bit encryption key.
pub fn generate_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    use rand::RngCore;
    rand::thread_rng().fill_bytes(&mut key);
    key
}

/// Encrypt plaintext using AES-256-GCM.
///
/// Returns nonce (12 bytes) || ciphertext.
pub fn encrypt(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher_key = Key::<Aes256Gcm>::from_slice(key);
    let cipher = Aes256Gcm::new(cipher_key);
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| PortalError::Crypto(format!("encryption failed: {e}")))?;

    let mut result = Vec::with_capacity(12 + ciphertext.len());
    result.extend_from_slice(&nonce);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Decrypt ciphertext produced by [`encrypt`].
///
/// Expects input format: nonce (12 bytes) || ciphertext.
pub fn decrypt(key: &[u8; 32], data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 12 {
        return Err(PortalError::Crypto(
            "ciphertext too short: missing nonce".to_string(),
        ));
    }

    let (nonce_bytes, ciphertext) = data.split_at(12);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher_key = Key::<Aes256Gcm>::from_slice(key);
    let cipher = Aes256Gcm::new(cipher_key);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| PortalError::Crypto(format!("decryption failed: {e}")))
}

/// Encrypt a secret string to a hex-encoded blob suitable for a TEXT column.
pub fn encrypt_to_hex(key: &[u8; 32], secret: &str) -> Result<String> {
    Ok(hex_encode(&encrypt(key, secret.as_bytes())?))
}

/// Decrypt a hex-encoded blob produced by [`encrypt_to_hex`].
pub fn decrypt_from_hex(key: &[u8; 32], blob: &str) -> Result<String> {
    let data = hex_decode(blob)?;
    let plaintext = decrypt(key, &data)?;
    String::from_utf8(plaintext)
        .map_err(|_| PortalError::Crypto("decrypted secret is not valid UTF-8".to_string()))
}

/// Write a freshly generated key to `path` and return it.
pub fn create_key_file(path: &Path) -> Result<[u8; 32]> {
    let key = generate_key();
    std::fs::write(path, hex_encode(&key))?;
    Ok(key)
}

/// Load the hex-encoded key file written by [`create_key_file`].
pub fn load_key_file(path: &Path) -> Result<[u8; 32]> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| PortalError::Config(format!("cannot read key file {}: {e}", path.display())))?;
    let bytes = hex_decode(contents.trim())?;
    let key: [u8; 32] = bytes
        .try_into()
        .map_err(|_| PortalError::Crypto("key file must contain 32 bytes".to_string()))?;
    Ok(key)
}

pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(s: &str) -> Result<Vec<u8>> {
    if s.len() % 2 != 0 {
        return Err(PortalError::Crypto("invalid hex: odd length".to_string()));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|_| PortalError::Crypto("invalid hex digit".to_string()))
        })
        .collect()
}
