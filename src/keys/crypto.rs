use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Context, Result};
use rand::RngCore;
use sha2::{Digest, Sha256};

const KEY_LENGTH: usize = 32;
const NONCE_LENGTH: usize = 12;

/// AES-256-GCM cipher for API keys at rest. Ciphertext and nonce are stored
/// hex-encoded in separate columns; an empty IV column marks a row that was
/// written without encryption.
///
/// When no key material is configured the cipher passes values through
/// unchanged instead of inventing a random key that would orphan previously
/// encrypted rows after a restart.
#[derive(Clone)]
pub struct KeyCipher {
    key: Option<[u8; KEY_LENGTH]>,
}

impl KeyCipher {
    pub fn from_config(secret: Option<&str>) -> Self {
        Self {
            key: secret.map(derive_key),
        }
    }

    pub fn disabled() -> Self {
        Self { key: None }
    }

    /// Returns (stored material, hex IV). Empty IV means plaintext storage.
    pub fn encrypt(&self, plaintext: &str) -> Result<(String, String)> {
        let Some(key) = &self.key else {
            return Ok((plaintext.to_string(), String::new()));
        };

        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

        let cipher = Aes256Gcm::new_from_slice(key).context("create cipher")?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|e| anyhow!("encryption failed: {e}"))?;

        Ok((hex::encode(ciphertext), hex::encode(nonce_bytes)))
    }

    /// Reverses `encrypt`. Rows written without encryption pass through.
    pub fn decrypt(&self, material: &str, iv: &str) -> Result<String> {
        if iv.is_empty() {
            return Ok(material.to_string());
        }
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| anyhow!("stored key is encrypted but no encryption key is configured"))?;

        let nonce_bytes = hex::decode(iv).context("decode IV")?;
        if nonce_bytes.len() != NONCE_LENGTH {
            anyhow::bail!("invalid IV length: {}", nonce_bytes.len());
        }
        let ciphertext = hex::decode(material).context("decode ciphertext")?;

        let cipher = Aes256Gcm::new_from_slice(key).context("create cipher")?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
            .map_err(|e| anyhow!("decryption failed (wrong key or corrupted data): {e}"))?;

        String::from_utf8(plaintext).context("decrypted data is not valid UTF-8")
    }
}

/// A 64-char hex string decodes directly; anything else is hashed to a
/// consistent 32-byte key.
fn derive_key(secret: &str) -> [u8; KEY_LENGTH] {
    if secret.len() == 64 {
        if let Ok(bytes) = hex::decode(secret) {
            let mut key = [0u8; KEY_LENGTH];
            key.copy_from_slice(&bytes);
            return key;
        }
    }
    Sha256::digest(secret.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_round_trip() {
        let cipher = KeyCipher::from_config(Some("my-encryption-secret"));
        let (material, iv) = cipher.encrypt("AIzaSyTestKey123").unwrap();
        assert_ne!(material, "AIzaSyTestKey123");
        assert_eq!(iv.len(), NONCE_LENGTH * 2);
        assert_eq!(cipher.decrypt(&material, &iv).unwrap(), "AIzaSyTestKey123");
    }

    #[test]
    fn random_nonce_varies_ciphertext() {
        let cipher = KeyCipher::from_config(Some("secret"));
        let (a, iv_a) = cipher.encrypt("same-key").unwrap();
        let (b, iv_b) = cipher.encrypt("same-key").unwrap();
        assert_ne!((a.clone(), iv_a.clone()), (b.clone(), iv_b.clone()));
        assert_eq!(cipher.decrypt(&a, &iv_a).unwrap(), "same-key");
        assert_eq!(cipher.decrypt(&b, &iv_b).unwrap(), "same-key");
    }

    #[test]
    fn wrong_key_fails() {
        let cipher = KeyCipher::from_config(Some("correct"));
        let (material, iv) = cipher.encrypt("secret-value").unwrap();
        let other = KeyCipher::from_config(Some("wrong"));
        assert!(other.decrypt(&material, &iv).is_err());
    }

    #[test]
    fn disabled_cipher_stores_plaintext() {
        let cipher = KeyCipher::disabled();
        let (material, iv) = cipher.encrypt("plain-key").unwrap();
        assert_eq!(material, "plain-key");
        assert_eq!(iv, "");
        assert_eq!(cipher.decrypt(&material, &iv).unwrap(), "plain-key");
    }

    #[test]
    fn plaintext_rows_survive_enabling_encryption() {
        // Rows written before a key was configured keep an empty IV and must
        // still decrypt.
        let cipher = KeyCipher::from_config(Some("now-configured"));
        assert_eq!(cipher.decrypt("legacy-plain", "").unwrap(), "legacy-plain");
    }

    #[test]
    fn encrypted_row_without_configured_key_errors() {
        let cipher = KeyCipher::from_config(Some("secret"));
        let (material, iv) = cipher.encrypt("value").unwrap();
        assert!(KeyCipher::disabled().decrypt(&material, &iv).is_err());
    }

    #[test]
    fn hex_key_material_is_decoded_not_hashed() {
        let hex_secret = "ab".repeat(32); // 64 hex chars
        let from_hex = KeyCipher::from_config(Some(&hex_secret));
        let hashed = KeyCipher::from_config(Some("ab"));
        let (material, iv) = from_hex.encrypt("v").unwrap();
        assert!(hashed.decrypt(&material, &iv).is_err());
        assert_eq!(from_hex.decrypt(&material, &iv).unwrap(), "v");
    }

    #[test]
    fn bad_iv_is_rejected() {
        let cipher = KeyCipher::from_config(Some("secret"));
        assert!(cipher.decrypt("deadbeef", "not-hex").is_err());
        assert!(cipher.decrypt("deadbeef", "abcd").is_err()); // wrong length
    }
}
