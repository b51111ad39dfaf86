//! Key material and the key manager.
//!
//! Two ways in: stretch a passphrase into deterministic keypairs, or load
//! raw private key bytes from external files. One guarded way out: an
//! authenticated, passphrase-encrypted export container. Unencrypted
//! private key bytes never leave this module.

use crate::config::{PbkdfParams, SuiteDefinition, ALG_ARGON2ID, ALG_CHACHA20_POLY1305};
use crate::crypto::provider::AlgorithmProvider;
use crate::error::{CryptoError, Result};
use rand::rngs::OsRng;
use rand_core::RngCore;
use std::path::PathBuf;
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Salt length for passphrase stretching.
pub const PBKDF_SALT_LEN: usize = 16;

/// Length of the stretched secret fanned out into keypair seeds.
const STRETCHED_SECRET_LEN: usize = 64;

/// Domain-separation labels for the seed fan-out. Two independent info
/// strings keep the classical and PQC seeds unrelated even though they
/// share one stretched secret.
const INFO_CLASSICAL_SEED: &[u8] = b"classical-kem-seed";
const INFO_PQC_SEED: &[u8] = b"pqc-kem-seed";

/// Export container framing.
const EXPORT_MAGIC: &[u8; 4] = b"LLKX";
const EXPORT_KEY_LEN: usize = 32;
const EXPORT_NONCE_LEN: usize = 12;

/// Fixed Argon2id cost for the export container, independent of any suite.
const EXPORT_PBKDF_PARAMS: PbkdfParams = PbkdfParams {
    memory_kib: 19_456,
    iterations: 2,
    parallelism: 1,
};

/// Explicit, separate confirmation for private key export. The caller must
/// pass `Confirmed`; anything else refuses to proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportConfirmation {
    Confirmed,
    NotConfirmed,
}

/// Paths to raw private key files.
#[derive(Debug, Clone)]
pub struct KeyFilePaths {
    pub classical_private: PathBuf,
    /// Absent for legacy classical-only key material.
    pub pqc_private: Option<PathBuf>,
}

/// Keypairs for one operation. Owned exclusively by the caller for the
/// duration of that operation; zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    classical_private: Vec<u8>,
    classical_public: Vec<u8>,
    pqc_private: Option<Vec<u8>>,
    pqc_public: Option<Vec<u8>>,
    passphrase_salt: Option<Vec<u8>>,
}

impl KeyMaterial {
    pub fn classical_private(&self) -> &[u8] {
        &self.classical_private
    }

    pub fn classical_public(&self) -> &[u8] {
        &self.classical_public
    }

    pub fn pqc_private(&self) -> Option<&[u8]> {
        self.pqc_private.as_deref()
    }

    pub fn pqc_public(&self) -> Option<&[u8]> {
        self.pqc_public.as_deref()
    }

    /// Salt the passphrase was stretched with, when derived from one.
    pub fn passphrase_salt(&self) -> Option<&[u8]> {
        self.passphrase_salt.as_deref()
    }
}

impl std::fmt::Debug for KeyMaterial {
    // Never print key bytes.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("classical_public_len", &self.classical_public.len())
            .field("pqc_public_len", &self.pqc_public.as_ref().map(Vec::len))
            .field("has_passphrase_salt", &self.passphrase_salt.is_some())
            .finish()
    }
}

/// Derives, loads, exports and imports key material for one suite at a
/// time. Holds only the algorithm provider; key material is created fresh
/// per call and handed to the caller.
pub struct KeyManager {
    provider: Arc<AlgorithmProvider>,
}

impl KeyManager {
    pub fn new(provider: Arc<AlgorithmProvider>) -> Self {
        Self { provider }
    }

    /// Fresh random salt for a new passphrase derivation. Decryption never
    /// calls this; it reuses the salt embedded in the bundle.
    pub fn generate_salt() -> [u8; PBKDF_SALT_LEN] {
        let mut salt = [0u8; PBKDF_SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        salt
    }

    /// Derive the suite's keypairs from a passphrase.
    ///
    /// Pipeline: memory-hard stretch of the passphrase, then two KDF
    /// expansions with distinct info strings, then the seeded keypair
    /// generators. Fully deterministic for a given passphrase and salt.
    pub fn derive_keys_from_passphrase(
        &self,
        passphrase: &str,
        salt: &[u8],
        suite: &SuiteDefinition,
    ) -> Result<KeyMaterial> {
        if passphrase.is_empty() {
            return Err(CryptoError::KeyDerivation(
                "passphrase must not be empty".to_string(),
            ));
        }
        if salt.is_empty() {
            return Err(CryptoError::KeyDerivation(
                "salt must not be empty".to_string(),
            ));
        }

        let pbkdf = self.provider.pbkdf(&suite.pbkdf)?;
        let kdf = self.provider.kdf(&suite.passphrase_kdf)?;
        let classical_kem = self.provider.classical_kem(&suite.classical_kem)?;

        let stretched = Zeroizing::new(pbkdf.stretch(
            passphrase.as_bytes(),
            salt,
            &suite.pbkdf_params,
            STRETCHED_SECRET_LEN,
        )?);

        let classical_seed = Zeroizing::new(kdf.derive(
            &stretched,
            None,
            INFO_CLASSICAL_SEED,
            classical_kem.seed_len(),
        )?);
        let (classical_private, classical_public) =
            classical_kem.keypair_from_seed(&classical_seed)?;

        let (pqc_private, pqc_public) = match &suite.pqc_kem {
            Some(name) => {
                let pqc_kem = self.provider.pqc_kem(name)?;
                let pqc_seed =
                    Zeroizing::new(kdf.derive(&stretched, None, INFO_PQC_SEED, pqc_kem.seed_len())?);
                let (private, public) = pqc_kem.keypair_from_seed(&pqc_seed)?;
                (Some(private), Some(public))
            }
            None => (None, None),
        };

        Ok(KeyMaterial {
            classical_private,
            classical_public,
            pqc_private,
            pqc_public,
            passphrase_salt: Some(salt.to_vec()),
        })
    }

    /// Reconstruct keypairs from raw private key bytes on disk.
    pub fn load_keys_from_external_file(
        &self,
        paths: &KeyFilePaths,
        suite: &SuiteDefinition,
    ) -> Result<KeyMaterial> {
        let classical_kem = self.provider.classical_kem(&suite.classical_kem)?;

        let classical_private = std::fs::read(&paths.classical_private)?;
        if classical_private.len() != classical_kem.private_key_len() {
            return Err(CryptoError::InvalidKey(format!(
                "classical key file has wrong length: expected {}, got {}",
                classical_kem.private_key_len(),
                classical_private.len()
            )));
        }
        let classical_public = classical_kem.public_from_private(&classical_private)?;

        let (pqc_private, pqc_public) = match (&suite.pqc_kem, &paths.pqc_private) {
            (Some(name), Some(path)) => {
                let pqc_kem = self.provider.pqc_kem(name)?;
                let private = std::fs::read(path)?;
                if private.len() != pqc_kem.private_key_len() {
                    return Err(CryptoError::InvalidKey(format!(
                        "PQC key file has wrong length: expected {}, got {}",
                        pqc_kem.private_key_len(),
                        private.len()
                    )));
                }
                let public = pqc_kem.public_from_private(&private)?;
                (Some(private), Some(public))
            }
            (Some(_), None) => {
                return Err(CryptoError::InvalidKey(
                    "suite requires a PQC key file but none was given".to_string(),
                ))
            }
            (None, _) => (None, None),
        };

        Ok(KeyMaterial {
            classical_private,
            classical_public,
            pqc_private,
            pqc_public,
            passphrase_salt: None,
        })
    }

    /// Wrap private key bytes in an authenticated, passphrase-encrypted
    /// container. Refuses without explicit confirmation; generates a fresh
    /// salt and nonce on every call.
    pub fn export_private_keys(
        &self,
        keys: &KeyMaterial,
        export_passphrase: &str,
        confirmation: ExportConfirmation,
    ) -> Result<Vec<u8>> {
        if confirmation != ExportConfirmation::Confirmed {
            return Err(CryptoError::ExportConfirmation);
        }
        if export_passphrase.is_empty() {
            return Err(CryptoError::KeyDerivation(
                "export passphrase must not be empty".to_string(),
            ));
        }

        let pbkdf = self.provider.pbkdf(ALG_ARGON2ID)?;
        let aead = self.provider.aead(ALG_CHACHA20_POLY1305)?;

        let mut salt = [0u8; PBKDF_SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let mut nonce = [0u8; EXPORT_NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let key = Zeroizing::new(pbkdf.stretch(
            export_passphrase.as_bytes(),
            &salt,
            &EXPORT_PBKDF_PARAMS,
            EXPORT_KEY_LEN,
        )?);

        let pqc_private = keys.pqc_private().unwrap_or(&[]);
        let mut inner = Zeroizing::new(Vec::with_capacity(
            8 + keys.classical_private.len() + pqc_private.len(),
        ));
        inner.extend_from_slice(&(keys.classical_private.len() as u32).to_be_bytes());
        inner.extend_from_slice(&keys.classical_private);
        inner.extend_from_slice(&(pqc_private.len() as u32).to_be_bytes());
        inner.extend_from_slice(pqc_private);

        let (ciphertext, tag) = aead.seal(&key, &nonce, EXPORT_MAGIC, &inner)?;

        let mut out = Vec::with_capacity(
            EXPORT_MAGIC.len() + 16 + salt.len() + nonce.len() + ciphertext.len() + tag.len(),
        );
        out.extend_from_slice(EXPORT_MAGIC);
        for field in [&salt[..], &nonce[..], &ciphertext, &tag] {
            out.extend_from_slice(&(field.len() as u32).to_be_bytes());
            out.extend_from_slice(field);
        }
        Ok(out)
    }

    /// Restore key material from an export container.
    pub fn import_private_keys(
        &self,
        blob: &[u8],
        export_passphrase: &str,
        suite: &SuiteDefinition,
    ) -> Result<KeyMaterial> {
        let pbkdf = self.provider.pbkdf(ALG_ARGON2ID)?;
        let aead = self.provider.aead(ALG_CHACHA20_POLY1305)?;

        let (salt, nonce, ciphertext, tag) = parse_export_container(blob)?;

        let key = Zeroizing::new(pbkdf.stretch(
            export_passphrase.as_bytes(),
            salt,
            &EXPORT_PBKDF_PARAMS,
            EXPORT_KEY_LEN,
        )?);

        let inner = Zeroizing::new(aead.open(&key, nonce, EXPORT_MAGIC, ciphertext, tag)?);
        let (classical_private, pqc_private) = parse_export_payload(&inner)?;

        let classical_kem = self.provider.classical_kem(&suite.classical_kem)?;
        if classical_private.len() != classical_kem.private_key_len() {
            return Err(CryptoError::InvalidKey(format!(
                "exported classical key has wrong length: expected {}, got {}",
                classical_kem.private_key_len(),
                classical_private.len()
            )));
        }
        let classical_public = classical_kem.public_from_private(classical_private)?;

        let (pqc_private, pqc_public) = match &suite.pqc_kem {
            Some(name) => {
                let pqc_kem = self.provider.pqc_kem(name)?;
                if pqc_private.len() != pqc_kem.private_key_len() {
                    return Err(CryptoError::InvalidKey(format!(
                        "exported PQC key has wrong length: expected {}, got {}",
                        pqc_kem.private_key_len(),
                        pqc_private.len()
                    )));
                }
                let public = pqc_kem.public_from_private(pqc_private)?;
                (Some(pqc_private.to_vec()), Some(public))
            }
            None => (None, None),
        };

        Ok(KeyMaterial {
            classical_private: classical_private.to_vec(),
            classical_public,
            pqc_private,
            pqc_public,
            passphrase_salt: None,
        })
    }
}

fn parse_export_container(blob: &[u8]) -> Result<(&[u8], &[u8], &[u8], &[u8])> {
    let truncated = || CryptoError::Encoding("export container truncated".to_string());

    if blob.len() < EXPORT_MAGIC.len() || &blob[..EXPORT_MAGIC.len()] != EXPORT_MAGIC {
        return Err(CryptoError::FormatMismatch(
            "input is not a key export container".to_string(),
        ));
    }

    let mut pos = EXPORT_MAGIC.len();
    let mut fields: Vec<&[u8]> = Vec::with_capacity(4);
    for _ in 0..4 {
        if blob.len() < pos + 4 {
            return Err(truncated());
        }
        let len =
            u32::from_be_bytes([blob[pos], blob[pos + 1], blob[pos + 2], blob[pos + 3]]) as usize;
        pos += 4;
        if blob.len() < pos + len {
            return Err(truncated());
        }
        fields.push(&blob[pos..pos + len]);
        pos += len;
    }
    if pos != blob.len() {
        return Err(CryptoError::Encoding(
            "unexpected trailing data after export container".to_string(),
        ));
    }
    Ok((fields[0], fields[1], fields[2], fields[3]))
}

fn parse_export_payload(inner: &[u8]) -> Result<(&[u8], &[u8])> {
    let malformed = || CryptoError::Encoding("export payload malformed".to_string());

    if inner.len() < 4 {
        return Err(malformed());
    }
    let classical_len = u32::from_be_bytes([inner[0], inner[1], inner[2], inner[3]]) as usize;
    let mut pos = 4;
    if inner.len() < pos + classical_len + 4 {
        return Err(malformed());
    }
    let classical = &inner[pos..pos + classical_len];
    pos += classical_len;
    let pqc_len =
        u32::from_be_bytes([inner[pos], inner[pos + 1], inner[pos + 2], inner[pos + 3]]) as usize;
    pos += 4;
    if inner.len() != pos + pqc_len {
        return Err(malformed());
    }
    let pqc = &inner[pos..pos + pqc_len];
    Ok((classical, pqc))
}
