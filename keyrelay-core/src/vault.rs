use crate::env::Environment;
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

const KEY_LENGTH: usize = 32;
const NONCE_LENGTH: usize = 12;
const TAG_LENGTH: usize = 16;
const PBKDF2_ITERATIONS: u32 = 100_000;
const KEY_SALT: &[u8] = b"keyrelay-credential-vault";

/// Development-only key material. Never used when `Environment::production`
/// is set; `Environment::new` rejects that combination up front.
const DEV_FALLBACK_KEY: &str = "dev-key-not-secure-change-in-production";

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("ciphertext is not valid base64 or is truncated")]
    InvalidCiphertext,

    #[error("authentication failed, ciphertext was tampered with or the key is wrong")]
    AuthenticationFailed,

    #[error("cipher operation failed")]
    Cipher,
}

/// Symmetric vault for supplier and SMS-provider secrets at rest.
///
/// Ciphertext layout: random 12-byte nonce ‖ AES-256-GCM payload ‖ 16-byte
/// tag, base64-encoded as a single value. Decryption fails closed: a
/// truncated value or a tag mismatch never yields partial plaintext.
pub struct CredentialVault {
    key: [u8; KEY_LENGTH],
}

impl CredentialVault {
    pub fn new(env: &Environment) -> Self {
        let material = match &env.master_key {
            Some(key) => key.clone(),
            None => {
                tracing::warn!(
                    "no master encryption key configured, using the insecure \
                     development fallback key; DO NOT run this in production"
                );
                DEV_FALLBACK_KEY.to_string()
            }
        };

        let mut key = [0u8; KEY_LENGTH];
        pbkdf2_hmac::<Sha256>(material.as_bytes(), KEY_SALT, PBKDF2_ITERATIONS, &mut key);
        Self { key }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(|_| VaultError::Cipher)?;

        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let sealed = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| VaultError::Cipher)?;

        let mut combined = Vec::with_capacity(NONCE_LENGTH + sealed.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&sealed);
        Ok(BASE64.encode(combined))
    }

    pub fn decrypt(&self, ciphertext: &str) -> Result<String, VaultError> {
        let combined = BASE64
            .decode(ciphertext)
            .map_err(|_| VaultError::InvalidCiphertext)?;

        if combined.len() < NONCE_LENGTH + TAG_LENGTH {
            return Err(VaultError::InvalidCiphertext);
        }

        let (nonce_bytes, sealed) = combined.split_at(NONCE_LENGTH);
        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(|_| VaultError::Cipher)?;

        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| VaultError::AuthenticationFailed)?;

        String::from_utf8(plaintext).map_err(|_| VaultError::InvalidCiphertext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_vault() -> CredentialVault {
        let env = Environment::new(false, Some("unit-test-master-key".into())).unwrap();
        CredentialVault::new(&env)
    }

    #[test]
    fn test_round_trip() {
        let vault = dev_vault();
        for plaintext in ["", "k", "api-key-1234567890", "ünïcødé £ секрет"] {
            let ciphertext = vault.encrypt(plaintext).unwrap();
            assert_eq!(vault.decrypt(&ciphertext).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_nonce_is_random() {
        let vault = dev_vault();
        let a = vault.encrypt("same input").unwrap();
        let b = vault.encrypt("same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_corrupting_any_byte_fails_closed() {
        let vault = dev_vault();
        let ciphertext = vault.encrypt("sensitive-value").unwrap();
        let mut raw = BASE64.decode(&ciphertext).unwrap();

        for i in 0..raw.len() {
            raw[i] ^= 0x01;
            let tampered = BASE64.encode(&raw);
            assert!(
                vault.decrypt(&tampered).is_err(),
                "byte {} flipped but decrypt succeeded",
                i
            );
            raw[i] ^= 0x01;
        }
    }

    #[test]
    fn test_truncated_input_fails_closed() {
        let vault = dev_vault();
        assert!(matches!(
            vault.decrypt("AAAA"),
            Err(VaultError::InvalidCiphertext)
        ));
        assert!(vault.decrypt("not base64 at all!!!").is_err());
    }

    #[test]
    fn test_wrong_key_fails_authentication() {
        let vault = dev_vault();
        let other = {
            let env = Environment::new(false, Some("a-different-master-key".into())).unwrap();
            CredentialVault::new(&env)
        };
        let ciphertext = vault.encrypt("secret").unwrap();
        assert!(matches!(
            other.decrypt(&ciphertext),
            Err(VaultError::AuthenticationFailed)
        ));
    }
}
