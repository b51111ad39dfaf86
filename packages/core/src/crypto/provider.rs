//! Algorithm provider: uniform, named access to the underlying primitives.
//!
//! Handlers and the key manager never talk to a cryptography crate
//! directly; they resolve algorithms by name through an
//! [`AlgorithmProvider`] built once at startup. Requesting a name that was
//! never registered fails with `AlgorithmUnavailable`; nothing is ever
//! silently substituted.

use crate::config::PbkdfParams;
use crate::error::{AlgorithmKind, CryptoError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Key encapsulation mechanism. Implemented by both the classical and the
/// post-quantum backends; the provider keeps the two categories in separate
/// namespaces.
pub trait Kem: Send + Sync {
    fn name(&self) -> &'static str;
    fn public_key_len(&self) -> usize;
    fn private_key_len(&self) -> usize;
    fn ciphertext_len(&self) -> usize;
    /// Seed length accepted by [`Kem::keypair_from_seed`].
    fn seed_len(&self) -> usize;

    /// Generate a fresh random keypair. Returns `(private, public)`.
    fn generate_keypair(&self) -> Result<(Vec<u8>, Vec<u8>)>;

    /// Deterministically build a keypair from a seed: the same seed always
    /// yields the same keypair. Required so passphrase-derived keys are
    /// reproducible across sessions.
    fn keypair_from_seed(&self, seed: &[u8]) -> Result<(Vec<u8>, Vec<u8>)>;

    /// Recover the public key from raw private key bytes.
    fn public_from_private(&self, private: &[u8]) -> Result<Vec<u8>>;

    /// Encapsulate against a public key. Returns `(ciphertext, secret)`.
    fn encapsulate(&self, public: &[u8]) -> Result<(Vec<u8>, Vec<u8>)>;

    /// Recover the shared secret from the encapsulated ciphertext.
    fn decapsulate(&self, private: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>;
}

/// Authenticated symmetric cipher. `seal` and `open` keep ciphertext and
/// tag separate so the bundle codec can frame them as distinct fields.
pub trait AeadCipher: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;
    fn key_len(&self) -> usize;
    fn nonce_len(&self) -> usize;
    fn tag_len(&self) -> usize;

    /// Returns `(ciphertext, tag)`.
    fn seal(
        &self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>)>;

    /// Fails with `Authentication` on any tag mismatch; the underlying AEAD
    /// crates compare tags in constant time.
    fn open(
        &self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Result<Vec<u8>>;
}

/// Key derivation function expanding input key material and a context
/// label into uniformly distributed output.
pub trait KeyDerivation: Send + Sync {
    fn name(&self) -> &'static str;
    fn derive(&self, ikm: &[u8], salt: Option<&[u8]>, info: &[u8], len: usize) -> Result<Vec<u8>>;
}

/// Passphrase-stretching function, intentionally expensive.
pub trait PasswordHash: Send + Sync {
    fn name(&self) -> &'static str;
    fn stretch(
        &self,
        passphrase: &[u8],
        salt: &[u8],
        params: &PbkdfParams,
        out_len: usize,
    ) -> Result<Vec<u8>>;
}

/// Registry of primitives keyed by algorithm name.
///
/// Populated once at startup (builder style), read-only afterwards, so
/// concurrent lookups need no synchronization.
#[derive(Default)]
pub struct AlgorithmProvider {
    classical_kems: HashMap<String, Arc<dyn Kem>>,
    pqc_kems: HashMap<String, Arc<dyn Kem>>,
    aeads: HashMap<String, Arc<dyn AeadCipher>>,
    kdfs: HashMap<String, Arc<dyn KeyDerivation>>,
    pbkdfs: HashMap<String, Arc<dyn PasswordHash>>,
}

impl AlgorithmProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classical_kem(mut self, kem: Arc<dyn Kem>) -> Self {
        self.classical_kems.insert(kem.name().to_string(), kem);
        self
    }

    pub fn with_pqc_kem(mut self, kem: Arc<dyn Kem>) -> Self {
        self.pqc_kems.insert(kem.name().to_string(), kem);
        self
    }

    pub fn with_aead(mut self, aead: Arc<dyn AeadCipher>) -> Self {
        self.aeads.insert(aead.name().to_string(), aead);
        self
    }

    pub fn with_kdf(mut self, kdf: Arc<dyn KeyDerivation>) -> Self {
        self.kdfs.insert(kdf.name().to_string(), kdf);
        self
    }

    pub fn with_pbkdf(mut self, pbkdf: Arc<dyn PasswordHash>) -> Self {
        self.pbkdfs.insert(pbkdf.name().to_string(), pbkdf);
        self
    }

    pub fn classical_kem(&self, name: &str) -> Result<Arc<dyn Kem>> {
        self.classical_kems
            .get(name)
            .cloned()
            .ok_or_else(|| CryptoError::AlgorithmUnavailable {
                kind: AlgorithmKind::ClassicalKem,
                name: name.to_string(),
            })
    }

    pub fn pqc_kem(&self, name: &str) -> Result<Arc<dyn Kem>> {
        self.pqc_kems
            .get(name)
            .cloned()
            .ok_or_else(|| CryptoError::AlgorithmUnavailable {
                kind: AlgorithmKind::PqcKem,
                name: name.to_string(),
            })
    }

    pub fn aead(&self, name: &str) -> Result<Arc<dyn AeadCipher>> {
        self.aeads
            .get(name)
            .cloned()
            .ok_or_else(|| CryptoError::AlgorithmUnavailable {
                kind: AlgorithmKind::Aead,
                name: name.to_string(),
            })
    }

    pub fn kdf(&self, name: &str) -> Result<Arc<dyn KeyDerivation>> {
        self.kdfs
            .get(name)
            .cloned()
            .ok_or_else(|| CryptoError::AlgorithmUnavailable {
                kind: AlgorithmKind::Kdf,
                name: name.to_string(),
            })
    }

    pub fn pbkdf(&self, name: &str) -> Result<Arc<dyn PasswordHash>> {
        self.pbkdfs
            .get(name)
            .cloned()
            .ok_or_else(|| CryptoError::AlgorithmUnavailable {
                kind: AlgorithmKind::Pbkdf,
                name: name.to_string(),
            })
    }

    /// Provider with every built-in primitive registered.
    pub fn with_default_algorithms() -> Self {
        use crate::crypto::primitives::{
            aead::{Aes256GcmCipher, ChaCha20Poly1305Cipher},
            kdf::HkdfSha256,
            ml_kem::MlKem768,
            pbkdf::{Argon2idHash, Pbkdf2Sha256Hash},
            x25519::X25519Kem,
        };

        Self::new()
            .with_classical_kem(Arc::new(X25519Kem))
            .with_pqc_kem(Arc::new(MlKem768))
            .with_aead(Arc::new(ChaCha20Poly1305Cipher))
            .with_aead(Arc::new(Aes256GcmCipher))
            .with_kdf(Arc::new(HkdfSha256))
            .with_pbkdf(Arc::new(Argon2idHash))
            .with_pbkdf(Arc::new(Pbkdf2Sha256Hash))
    }
}
