//! Hybrid KEM + AEAD handler.
//!
//! Encryption encapsulates against both the classical and the PQC public
//! key, concatenates the two shared secrets, and derives the data key via
//! the suite's KDF with a fresh salt. An attacker must break both KEMs to
//! recover the key.

use crate::config::{SuiteDefinition, SuiteFlavor};
use crate::crypto::bundle::{header_aad, EncryptedBundle};
use crate::crypto::handlers::CryptoHandler;
use crate::crypto::keys::KeyMaterial;
use crate::crypto::provider::{AeadCipher, AlgorithmProvider, Kem, KeyDerivation};
use crate::crypto::bundle;
use crate::error::{CryptoError, Result};
use rand::rngs::OsRng;
use rand_core::RngCore;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Domain-separation label for the hybrid data key derivation.
const INFO_HYBRID_DATA_KEY: &[u8] = b"ledgerlock-hybrid-data-key";

/// Salt length for the hybrid KDF step.
const HYBRID_SALT_LEN: usize = 32;

pub struct HybridHandler {
    suite_id: String,
    classical: Arc<dyn Kem>,
    pqc: Arc<dyn Kem>,
    aead: Arc<dyn AeadCipher>,
    kdf: Arc<dyn KeyDerivation>,
}

impl HybridHandler {
    /// Resolve every algorithm the suite names. A missing algorithm fails
    /// here, at registration time, not mid-operation.
    pub fn new(suite: &SuiteDefinition, provider: &AlgorithmProvider) -> Result<Self> {
        if suite.flavor != SuiteFlavor::Hybrid {
            return Err(CryptoError::Config(format!(
                "suite {} is not a hybrid suite",
                suite.id
            )));
        }
        let pqc_name = suite.pqc_kem.as_deref().ok_or_else(|| {
            CryptoError::Config(format!("hybrid suite {} names no PQC KEM", suite.id))
        })?;

        Ok(Self {
            suite_id: suite.id.clone(),
            classical: provider.classical_kem(&suite.classical_kem)?,
            pqc: provider.pqc_kem(pqc_name)?,
            aead: provider.aead(&suite.aead)?,
            kdf: provider.kdf(&suite.hybrid_kdf)?,
        })
    }

    fn derive_data_key(
        &self,
        secret_c: &[u8],
        secret_p: &[u8],
        salt: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        let mut combined = Zeroizing::new(Vec::with_capacity(secret_c.len() + secret_p.len()));
        combined.extend_from_slice(secret_c);
        combined.extend_from_slice(secret_p);
        Ok(Zeroizing::new(self.kdf.derive(
            &combined,
            Some(salt),
            INFO_HYBRID_DATA_KEY,
            self.aead.key_len(),
        )?))
    }

    fn pqc_public<'a>(&self, keys: &'a KeyMaterial) -> Result<&'a [u8]> {
        keys.pqc_public().ok_or_else(|| {
            CryptoError::InvalidKey(format!(
                "key material carries no PQC keypair required by suite {}",
                self.suite_id
            ))
        })
    }

    fn pqc_private<'a>(&self, keys: &'a KeyMaterial) -> Result<&'a [u8]> {
        keys.pqc_private().ok_or_else(|| {
            CryptoError::InvalidKey(format!(
                "key material carries no PQC keypair required by suite {}",
                self.suite_id
            ))
        })
    }
}

impl CryptoHandler for HybridHandler {
    fn suite_id(&self) -> &str {
        &self.suite_id
    }

    fn can_handle(&self, raw: &[u8]) -> bool {
        bundle::peek_suite_id(raw).as_deref() == Some(self.suite_id.as_str())
    }

    fn encrypt(&self, plaintext: &[u8], keys: &KeyMaterial) -> Result<Vec<u8>> {
        let (classical_ct, secret_c) = self.classical.encapsulate(keys.classical_public())?;
        let secret_c = Zeroizing::new(secret_c);
        let (pqc_ct, secret_p) = self.pqc.encapsulate(self.pqc_public(keys)?)?;
        let secret_p = Zeroizing::new(secret_p);

        let mut hybrid_salt = vec![0u8; HYBRID_SALT_LEN];
        OsRng.fill_bytes(&mut hybrid_salt);

        let data_key = self.derive_data_key(&secret_c, &secret_p, &hybrid_salt)?;

        let mut nonce = vec![0u8; self.aead.nonce_len()];
        OsRng.fill_bytes(&mut nonce);

        let aad = header_aad(&self.suite_id);
        let (ciphertext, tag) = self.aead.seal(&data_key, &nonce, &aad, plaintext)?;

        let bundle = EncryptedBundle {
            suite_id: self.suite_id.clone(),
            classical_ct: Some(classical_ct),
            pqc_ct,
            nonce,
            ciphertext,
            tag,
            pbkdf_salt: keys.passphrase_salt().map(<[u8]>::to_vec),
            hybrid_salt: Some(hybrid_salt),
        };
        Ok(bundle.encode())
    }

    fn decrypt(&self, raw: &[u8], keys: &KeyMaterial) -> Result<Vec<u8>> {
        let bundle = EncryptedBundle::decode(raw)?;
        if bundle.suite_id != self.suite_id {
            return Err(CryptoError::FormatMismatch(format!(
                "bundle was produced by suite {}, handler serves {}",
                bundle.suite_id, self.suite_id
            )));
        }

        let classical_ct = bundle.classical_ct.as_deref().ok_or_else(|| {
            CryptoError::FormatMismatch("bundle carries no classical KEM ciphertext".to_string())
        })?;
        let hybrid_salt = bundle.hybrid_salt.as_deref().ok_or_else(|| {
            CryptoError::FormatMismatch("bundle carries no hybrid KDF salt".to_string())
        })?;

        let secret_c = Zeroizing::new(
            self.classical
                .decapsulate(keys.classical_private(), classical_ct)?,
        );
        let secret_p = Zeroizing::new(
            self.pqc
                .decapsulate(self.pqc_private(keys)?, &bundle.pqc_ct)?,
        );

        let data_key = self.derive_data_key(&secret_c, &secret_p, hybrid_salt)?;

        let aad = header_aad(&bundle.suite_id);
        self.aead.open(
            &data_key,
            &bundle.nonce,
            &aad,
            &bundle.ciphertext,
            &bundle.tag,
        )
    }
}
