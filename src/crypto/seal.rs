use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, OsRng},
};
use aes_gcm::aead::rand_core::RngCore;
use base64::{Engine as _, engine::general_purpose};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{AppError, Result};
use crate::models::apikey::ApiKeyClaims;

/// The size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// The size of the AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Encrypts and authenticates claim sets at the system boundary.
pub trait TokenSealer: Send + Sync {
    fn seal(&self, claims: &ApiKeyClaims) -> Result<String>;
    fn unseal(&self, sealed: &str) -> Result<ApiKeyClaims>;
}

/// A sealing key that is zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SealKey([u8; KEY_SIZE]);

impl SealKey {
    /// Builds a key from raw bytes, which must be exactly `KEY_SIZE` long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let key: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| AppError::Encryption("Invalid seal key size".to_string()))?;
        Ok(Self(key))
    }

    /// Generates a new random key.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self(key)
    }
}

/// Seals claims as `base64url(nonce || AES-256-GCM(json(claims)))`.
pub struct AesGcmSealer {
    key: SealKey,
}

impl AesGcmSealer {
    pub fn new(key: SealKey) -> Self {
        Self { key }
    }
}

impl TokenSealer for AesGcmSealer {
    fn seal(&self, claims: &ApiKeyClaims) -> Result<String> {
        let plaintext = sonic_rs::to_vec(claims)
            .map_err(|e| AppError::Encryption(format!("Claim serialization failed: {}", e)))?;

        let cipher = Aes256Gcm::new((&self.key.0).into());

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from(nonce_bytes);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|e| AppError::Encryption(format!("Encryption failed: {}", e)))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        Ok(general_purpose::URL_SAFE_NO_PAD.encode(sealed))
    }

    fn unseal(&self, sealed: &str) -> Result<ApiKeyClaims> {
        let bytes = general_purpose::URL_SAFE_NO_PAD
            .decode(sealed.trim())
            .map_err(|e| AppError::Encryption(format!("Sealed payload is not base64: {}", e)))?;

        if bytes.len() <= NONCE_SIZE {
            return Err(AppError::Encryption("Sealed payload too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_SIZE);
        let nonce_arr: [u8; NONCE_SIZE] = nonce_bytes
            .try_into()
            .map_err(|_| AppError::Encryption("Invalid nonce size".to_string()))?;

        let cipher = Aes256Gcm::new((&self.key.0).into());
        let plaintext = cipher
            .decrypt(&Nonce::from(nonce_arr), ciphertext)
            .map_err(|e| AppError::Encryption(format!("Decryption failed: {}", e)))?;

        sonic_rs::from_slice(&plaintext)
            .map_err(|e| AppError::Encryption(format!("Claim parse failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::Role;
    use chrono::{Duration, Utc};

    fn claims() -> ApiKeyClaims {
        let now = Utc::now();
        ApiKeyClaims {
            version: 1,
            user_id: 10,
            role: Role::Staff,
            client_agent: "Mozzarella Killerwhale".into(),
            audience: "lcc-server".into(),
            subject: "/api/query".into(),
            ip_address: "1.1.1.1".into(),
            token: "abc".into(),
            issued_at: now,
            not_before: now,
            expires_at: now + Duration::days(30),
        }
    }

    #[test]
    fn unseal_recovers_claims() {
        let sealer = AesGcmSealer::new(SealKey::generate());
        let original = claims();
        let sealed = sealer.seal(&original).unwrap();
        assert_eq!(sealer.unseal(&sealed).unwrap(), original);
    }

    #[test]
    fn unseal_with_other_key_fails() {
        let sealed = AesGcmSealer::new(SealKey::generate()).seal(&claims()).unwrap();
        let other = AesGcmSealer::new(SealKey::generate());
        assert!(matches!(other.unseal(&sealed), Err(AppError::Encryption(_))));
    }

    #[test]
    fn tampered_payload_fails() {
        let sealer = AesGcmSealer::new(SealKey::generate());
        let sealed = sealer.seal(&claims()).unwrap();
        let mut bytes = general_purpose::URL_SAFE_NO_PAD.decode(&sealed).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = general_purpose::URL_SAFE_NO_PAD.encode(bytes);
        assert!(sealer.unseal(&tampered).is_err());
        assert!(sealer.unseal("not base64 at all!").is_err());
        assert!(sealer.unseal("").is_err());
    }

    #[test]
    fn key_size_is_enforced() {
        assert!(SealKey::from_slice(&[0u8; 16]).is_err());
        assert!(SealKey::from_slice(&[0u8; 32]).is_ok());
    }
}
