//! Password encryption keyed on the machine identifier
//!
//! AMT and VNC passwords can be stored in `config.yaml` as
//! `encrypted:BASE64`. The AES-256 key is derived from the hardware /
//! OS machine id, so an encrypted value only decrypts on the machine that
//! produced it.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Result};
use base64::Engine;
use sha2::{Digest, Sha256};

/// Prefix marking an encrypted value
const ENCRYPTED_PREFIX: &str = "encrypted:";

const NONCE_LEN: usize = 12;

/// Reads the machine identifier
///
/// macOS: `ioreg -d2 -c IOPlatformExpertDevice`
/// Linux: `/etc/machine-id`, then `/var/lib/dbus/machine-id`
/// Windows: `wmic csproduct get UUID`
fn get_machine_uuid() -> Result<String> {
    #[cfg(target_os = "macos")]
    {
        use std::process::Command;

        let output = Command::new("ioreg")
            .args(["-d2", "-c", "IOPlatformExpertDevice"])
            .output()?;

        let output_str = String::from_utf8_lossy(&output.stdout);

        // "IOPlatformUUID" = "XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX"
        for line in output_str.lines() {
            if line.contains("IOPlatformUUID") {
                if let Some(uuid) = line.split('"').nth(3) {
                    return Ok(uuid.to_string());
                }
            }
        }

        Err(anyhow!("Failed to extract IOPlatformUUID from ioreg"))
    }

    #[cfg(target_os = "linux")]
    {
        use std::fs;

        if let Ok(uuid) = fs::read_to_string("/etc/machine-id") {
            return Ok(uuid.trim().to_string());
        }

        if let Ok(uuid) = fs::read_to_string("/var/lib/dbus/machine-id") {
            return Ok(uuid.trim().to_string());
        }

        Err(anyhow!("Failed to read machine-id"))
    }

    #[cfg(target_os = "windows")]
    {
        use std::process::Command;

        let output = Command::new("wmic")
            .args(["csproduct", "get", "UUID"])
            .output()?;

        let output_str = String::from_utf8_lossy(&output.stdout);

        if let Some(uuid) = output_str.lines().nth(1) {
            return Ok(uuid.trim().to_string());
        }

        Err(anyhow!("Failed to extract UUID from wmic"))
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        Err(anyhow!("Unsupported platform for machine UUID extraction"))
    }
}

/// Derives the AES-256 key from the machine identifier
fn derive_key() -> Result<[u8; 32]> {
    let machine_uuid = get_machine_uuid()?;
    Ok(key_from_secret(machine_uuid.as_bytes()))
}

fn key_from_secret(secret: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(secret);
    hasher.update(b"amtctl-config-encryption-v1");

    let result = hasher.finalize();
    let mut key = [0u8; 32];
    key.copy_from_slice(&result);
    key
}

fn encrypt_with_key(key: &[u8; 32], password: &str) -> Result<String> {
    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|e| anyhow!("Failed to create cipher: {}", e))?;

    // Nonce derived from the password: a password always encrypts to the
    // same value.
    let mut nonce_bytes = [0u8; NONCE_LEN];
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(b"amtctl-nonce-v1");
    let nonce_hash = hasher.finalize();
    nonce_bytes.copy_from_slice(&nonce_hash[..NONCE_LEN]);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, password.as_bytes())
        .map_err(|e| anyhow!("Encryption failed: {}", e))?;

    // nonce(12 bytes) + ciphertext
    let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);

    Ok(format!(
        "{}{}",
        ENCRYPTED_PREFIX,
        base64::engine::general_purpose::STANDARD.encode(&combined)
    ))
}

fn decrypt_with_key(key: &[u8; 32], encrypted: &str) -> Result<String> {
    let base64_data = encrypted
        .strip_prefix(ENCRYPTED_PREFIX)
        .ok_or_else(|| anyhow!("Invalid encrypted password format (missing prefix)"))?;

    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|e| anyhow!("Failed to create cipher: {}", e))?;

    let combined = base64::engine::general_purpose::STANDARD
        .decode(base64_data)
        .map_err(|e| anyhow!("Invalid base64: {}", e))?;

    if combined.len() < NONCE_LEN {
        return Err(anyhow!("Invalid ciphertext (too short)"));
    }

    let nonce = Nonce::from_slice(&combined[..NONCE_LEN]);
    let plaintext = cipher
        .decrypt(nonce, &combined[NONCE_LEN..])
        .map_err(|e| anyhow!("Decryption failed (wrong machine or corrupted data): {}", e))?;

    String::from_utf8(plaintext).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
}

/// Encrypts a password with the machine key
///
/// Returns `encrypted:BASE64`, the payload being nonce + ciphertext.
pub fn encrypt_password(password: &str) -> Result<String> {
    encrypt_with_key(&derive_key()?, password)
}

/// Decrypts an `encrypted:BASE64` value with the machine key
///
/// # Errors
///
/// Fails when the prefix is missing, the payload is not valid base64, or the
/// value was encrypted on another machine.
pub fn decrypt_password(encrypted: &str) -> Result<String> {
    decrypt_with_key(&derive_key()?, encrypted)
}

/// `true` if the value starts with `encrypted:`
pub fn is_encrypted(value: &str) -> bool {
    value.starts_with(ENCRYPTED_PREFIX)
}

/// Returns the clear-text password, decrypting it when needed
pub fn get_password(value: &str) -> Result<String> {
    if is_encrypted(value) {
        decrypt_password(value)
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> [u8; 32] {
        key_from_secret(b"0123456789abcdef0123456789abcdef")
    }

    #[test]
    fn test_encrypt_decrypt() {
        let key = test_key();
        let password = "Ab3!xy@9";

        let encrypted = encrypt_with_key(&key, password).unwrap();
        assert!(encrypted.starts_with(ENCRYPTED_PREFIX));
        assert!(!encrypted.contains(password));

        let decrypted = decrypt_with_key(&key, &encrypted).unwrap();
        assert_eq!(decrypted, password);
    }

    #[test]
    fn test_encryption_is_deterministic() {
        let key = test_key();
        assert_eq!(
            encrypt_with_key(&key, "secret").unwrap(),
            encrypt_with_key(&key, "secret").unwrap()
        );
    }

    #[test]
    fn test_other_key_cannot_decrypt() {
        let encrypted = encrypt_with_key(&test_key(), "secret").unwrap();
        let other = key_from_secret(b"another machine");
        assert!(decrypt_with_key(&other, &encrypted).is_err());
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        let key = test_key();
        assert!(decrypt_with_key(&key, "plaintext").is_err());
        assert!(decrypt_with_key(&key, "encrypted:!!!").is_err());
        assert!(decrypt_with_key(&key, "encrypted:AAAA").is_err());
    }

    #[test]
    fn test_is_encrypted() {
        assert!(is_encrypted("encrypted:SGVsbG8="));
        assert!(!is_encrypted("plaintext"));
        assert!(!is_encrypted(""));
    }

    #[test]
    fn test_get_password_plaintext() {
        assert_eq!(get_password("plaintext").unwrap(), "plaintext");
    }
}
