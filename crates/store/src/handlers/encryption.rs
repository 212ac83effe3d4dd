//! Encryption transform tier.
//!
//! Holds no store of its own: writes are encrypted and forwarded, reads are
//! delegated and decrypted on the way back up.  Everything below this tier
//! only ever sees hex-encoded AES-256-GCM ciphertext.  Data that fails to
//! decrypt — corrupted rows, entries written before encryption was enabled,
//! a rotated key — is treated as a miss, never an error.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use sha2::{Digest, Sha256};
use stratum_domain::{Error, Result};

use crate::handler::{CleanNext, DeleteNext, Handler, ReadNext, WriteNext};

/// Bytes of nonce prepended to each ciphertext.
const NONCE_LEN: usize = 12;

pub struct EncryptionHandler {
    cipher: Aes256Gcm,
}

impl EncryptionHandler {
    /// Derive the AES-256 key from the configured passphrase via SHA-256.
    pub fn new(passphrase: &str) -> Result<Self> {
        let key = Sha256::digest(passphrase.as_bytes());
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|_| Error::Crypto("invalid derived key length".into()))?;
        Ok(Self { cipher })
    }

    /// Encrypt to `hex(nonce ‖ ciphertext)` with a fresh random nonce.
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| Error::Crypto("session payload encryption failed".into()))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(hex::encode(blob))
    }

    /// Decrypt, or `None` when the blob is not ours: bad hex, truncated
    /// buffer, tag mismatch, or non-UTF-8 plaintext.
    fn decrypt(&self, blob: &str) -> Option<String> {
        let raw = hex::decode(blob).ok()?;
        if raw.len() < NONCE_LEN {
            return None;
        }
        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .ok()?;
        String::from_utf8(plaintext).ok()
    }
}

impl Handler for EncryptionHandler {
    fn read(&self, key: &str, next: ReadNext<'_>) -> Option<String> {
        let blob = next.call(key)?;
        match self.decrypt(&blob) {
            Some(plaintext) => Some(plaintext),
            None => {
                // Foreign or corrupted data below us: a miss, not an error.
                tracing::debug!(key, "stored session data failed to decrypt");
                None
            }
        }
    }

    fn write(&self, key: &str, data: &str, next: WriteNext<'_>) -> Result<()> {
        let ciphertext = self.encrypt(data)?;
        next.call(key, &ciphertext)
    }

    fn delete(&self, key: &str, next: DeleteNext<'_>) -> Result<()> {
        next.call(key)
    }

    fn clean(&self, max_lifetime: u64, next: CleanNext<'_>) -> Result<usize> {
        next.call(max_lifetime)
    }

    fn name(&self) -> &'static str {
        "encryption"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainBuilder;
    use crate::handlers::cache::{CacheHandler, InProcessCache, ObjectCache};
    use crate::handlers::memory::MemoryHandler;
    use std::sync::Arc;

    #[test]
    fn encrypt_decrypt_round_trip() {
        let handler = EncryptionHandler::new("key K").unwrap();
        let blob = handler.encrypt("secret").unwrap();
        assert_ne!(blob, "secret");
        assert_eq!(handler.decrypt(&blob).as_deref(), Some("secret"));
    }

    #[test]
    fn nonces_differ_across_writes() {
        let handler = EncryptionHandler::new("key K").unwrap();
        let a = handler.encrypt("same plaintext").unwrap();
        let b = handler.encrypt("same plaintext").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_decrypts_to_miss() {
        let handler = EncryptionHandler::new("key K").unwrap();
        assert_eq!(handler.decrypt("not hex at all"), None);
        assert_eq!(handler.decrypt("deadbeef"), None); // shorter than a nonce
        assert_eq!(handler.decrypt(&hex::encode([0u8; 40])), None); // bad tag
    }

    #[test]
    fn wrong_key_reads_as_miss() {
        let writer = EncryptionHandler::new("key A").unwrap();
        let reader = EncryptionHandler::new("key B").unwrap();
        let blob = writer.encrypt("secret").unwrap();
        assert_eq!(reader.decrypt(&blob), None);
    }

    #[test]
    fn inner_tier_only_sees_ciphertext() {
        let inner = Arc::new(InProcessCache::new());
        let chain = ChainBuilder::new()
            .add_handler(Box::new(EncryptionHandler::new("key K").unwrap()))
            .add_handler(Box::new(CacheHandler::new(inner.clone(), "sessions", 1800)))
            .build();

        chain.write("xyz", "secret").unwrap();

        // Round trip through the chain yields plaintext...
        assert_eq!(chain.read("xyz").as_deref(), Some("secret"));
        // ...but the raw stored value never equals it.
        let raw = inner.get("sessions", "session_xyz").unwrap();
        assert_ne!(raw, "secret");
        assert!(!raw.contains("secret"));
    }

    #[test]
    fn memory_tier_in_front_caches_plaintext_not_ciphertext() {
        let chain = ChainBuilder::new()
            .add_handler(Box::new(MemoryHandler::new()))
            .add_handler(Box::new(EncryptionHandler::new("key K").unwrap()))
            .add_handler(Box::new(MemoryHandler::new()))
            .build();

        chain.write("xyz", "secret").unwrap();
        assert_eq!(chain.read("xyz").as_deref(), Some("secret"));
    }
}
