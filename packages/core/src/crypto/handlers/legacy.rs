//! Legacy classical-only handler, kept for backward compatibility.
//!
//! The pre-hybrid format has no self-describing header:
//!
//! ```text
//! ephemeral_pub   32 bytes
//! nonce           12 bytes
//! sealed box      remainder (ciphertext || 16-byte tag)
//! ```
//!
//! Decrypt-only: new data is always written through the hybrid path.

use crate::config::{SuiteDefinition, SuiteFlavor};
use crate::crypto::bundle;
use crate::crypto::handlers::CryptoHandler;
use crate::crypto::keys::KeyMaterial;
use crate::crypto::provider::{AeadCipher, AlgorithmProvider, Kem, KeyDerivation};
use crate::error::{CryptoError, Result};
use std::sync::Arc;
use zeroize::Zeroizing;

const INFO_LEGACY_DATA_KEY: &[u8] = b"legacy-data-key";

const EPHEMERAL_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const MIN_LEN: usize = EPHEMERAL_LEN + NONCE_LEN + TAG_LEN;

pub struct LegacyHandler {
    suite_id: String,
    classical: Arc<dyn Kem>,
    aead: Arc<dyn AeadCipher>,
    kdf: Arc<dyn KeyDerivation>,
}

impl LegacyHandler {
    pub fn new(suite: &SuiteDefinition, provider: &AlgorithmProvider) -> Result<Self> {
        if suite.flavor != SuiteFlavor::LegacyClassical {
            return Err(CryptoError::Config(format!(
                "suite {} is not a legacy classical suite",
                suite.id
            )));
        }
        Ok(Self {
            suite_id: suite.id.clone(),
            classical: provider.classical_kem(&suite.classical_kem)?,
            aead: provider.aead(&suite.aead)?,
            kdf: provider.kdf(&suite.hybrid_kdf)?,
        })
    }

    /// Test fixture producer: writes the legacy format so decrypt paths
    /// can be exercised without archived data. Not reachable through
    /// [`CryptoHandler::encrypt`], which refuses by design.
    #[cfg(test)]
    pub fn seal_for_tests(&self, plaintext: &[u8], keys: &KeyMaterial) -> Result<Vec<u8>> {
        use rand::rngs::OsRng;
        use rand_core::RngCore;

        let (ephemeral, secret) = self.classical.encapsulate(keys.classical_public())?;
        let secret = Zeroizing::new(secret);
        let key = Zeroizing::new(self.kdf.derive(
            &secret,
            None,
            INFO_LEGACY_DATA_KEY,
            self.aead.key_len(),
        )?);

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        let (ciphertext, tag) = self.aead.seal(&key, &nonce, &[], plaintext)?;

        let mut out = Vec::with_capacity(EPHEMERAL_LEN + NONCE_LEN + ciphertext.len() + TAG_LEN);
        out.extend_from_slice(&ephemeral);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        out.extend_from_slice(&tag);
        Ok(out)
    }
}

impl CryptoHandler for LegacyHandler {
    fn suite_id(&self) -> &str {
        &self.suite_id
    }

    fn can_handle(&self, raw: &[u8]) -> bool {
        // Anything long enough that is not a self-describing bundle might
        // be legacy data; only decryption can tell.
        raw.len() >= MIN_LEN && bundle::peek_suite_id(raw).is_none()
    }

    fn encrypt(&self, _plaintext: &[u8], _keys: &KeyMaterial) -> Result<Vec<u8>> {
        Err(CryptoError::UnsupportedOperation(format!(
            "suite {} is decrypt-only; new data must use a hybrid suite",
            self.suite_id
        )))
    }

    fn decrypt(&self, raw: &[u8], keys: &KeyMaterial) -> Result<Vec<u8>> {
        if raw.len() < MIN_LEN {
            return Err(CryptoError::FormatMismatch(
                "input too short for the legacy format".to_string(),
            ));
        }
        if bundle::peek_suite_id(raw).is_some() {
            return Err(CryptoError::FormatMismatch(
                "input is a self-describing bundle, not legacy data".to_string(),
            ));
        }

        let ephemeral = &raw[..EPHEMERAL_LEN];
        let nonce = &raw[EPHEMERAL_LEN..EPHEMERAL_LEN + NONCE_LEN];
        let sealed = &raw[EPHEMERAL_LEN + NONCE_LEN..];
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

        let secret = Zeroizing::new(self.classical.decapsulate(keys.classical_private(), ephemeral)?);
        let key = Zeroizing::new(self.kdf.derive(
            &secret,
            None,
            INFO_LEGACY_DATA_KEY,
            self.aead.key_len(),
        )?);

        self.aead.open(&key, nonce, &[], ciphertext, tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin_catalog, find_suite, PbkdfParams, SUITE_LEGACY};
    use crate::crypto::keys::KeyManager;

    fn setup() -> (LegacyHandler, KeyMaterial) {
        let provider = Arc::new(AlgorithmProvider::with_default_algorithms());
        let mut suite = find_suite(&builtin_catalog(), SUITE_LEGACY).unwrap().clone();
        suite.pbkdf_params = PbkdfParams {
            memory_kib: 0,
            iterations: 10,
            parallelism: 1,
        };
        let handler = LegacyHandler::new(&suite, &provider).unwrap();
        let keys = KeyManager::new(provider)
            .derive_keys_from_passphrase("old passphrase", &[3u8; 16], &suite)
            .unwrap();
        (handler, keys)
    }

    #[test]
    fn test_decrypts_legacy_format() {
        let (handler, keys) = setup();
        let blob = handler.seal_for_tests(b"archived ledger entry", &keys).unwrap();

        assert!(handler.can_handle(&blob));
        assert_eq!(handler.decrypt(&blob, &keys).unwrap(), b"archived ledger entry");
    }

    #[test]
    fn test_encrypt_is_unsupported() {
        let (handler, keys) = setup();
        assert!(matches!(
            handler.encrypt(b"new data", &keys),
            Err(CryptoError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_rejects_v1_bundles() {
        let (handler, keys) = setup();
        let mut fake = bundle::EncryptedBundle {
            suite_id: "HYBRID-A".to_string(),
            classical_ct: Some(vec![0u8; 32]),
            pqc_ct: vec![0u8; 64],
            nonce: vec![0u8; 12],
            ciphertext: vec![0u8; 32],
            tag: vec![0u8; 16],
            pbkdf_salt: None,
            hybrid_salt: None,
        }
        .encode();
        assert!(!handler.can_handle(&fake));
        assert!(matches!(
            handler.decrypt(&fake, &keys),
            Err(CryptoError::FormatMismatch(_))
        ));
        fake.truncate(10);
        assert!(!handler.can_handle(&fake));
    }

    #[test]
    fn test_tampered_legacy_blob_fails_authentication() {
        let (handler, keys) = setup();
        let mut blob = handler.seal_for_tests(b"archived", &keys).unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 1;
        assert!(matches!(
            handler.decrypt(&blob, &keys),
            Err(CryptoError::Authentication)
        ));
    }

    #[test]
    fn test_wrong_keys_fail_authentication() {
        let (handler, keys) = setup();
        let blob = handler.seal_for_tests(b"archived", &keys).unwrap();

        let provider = Arc::new(AlgorithmProvider::with_default_algorithms());
        let mut suite = find_suite(&builtin_catalog(), SUITE_LEGACY).unwrap().clone();
        suite.pbkdf_params.iterations = 10;
        let other = KeyManager::new(provider)
            .derive_keys_from_passphrase("different passphrase", &[3u8; 16], &suite)
            .unwrap();

        assert!(matches!(
            handler.decrypt(&blob, &other),
            Err(CryptoError::Authentication)
        ));
    }
}
