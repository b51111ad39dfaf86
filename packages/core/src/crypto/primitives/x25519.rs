//! X25519 classical KEM backend (DH-based encapsulation).
//!
//! Encapsulation is an ephemeral Diffie-Hellman: the "ciphertext" is the
//! ephemeral public key, the shared secret is the DH output.

use crate::config::ALG_X25519;
use crate::crypto::provider::Kem;
use crate::error::{CryptoError, Result};
use rand::rngs::OsRng;
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};

pub const X25519_KEY_SIZE: usize = 32;

fn to_array_32(bytes: &[u8], what: &str) -> Result<[u8; X25519_KEY_SIZE]> {
    bytes.try_into().map_err(|_| {
        CryptoError::InvalidKey(format!(
            "invalid {} length: expected {}, got {}",
            what,
            X25519_KEY_SIZE,
            bytes.len()
        ))
    })
}

pub struct X25519Kem;

impl Kem for X25519Kem {
    fn name(&self) -> &'static str {
        ALG_X25519
    }

    fn public_key_len(&self) -> usize {
        X25519_KEY_SIZE
    }

    fn private_key_len(&self) -> usize {
        X25519_KEY_SIZE
    }

    fn ciphertext_len(&self) -> usize {
        X25519_KEY_SIZE
    }

    fn seed_len(&self) -> usize {
        X25519_KEY_SIZE
    }

    fn generate_keypair(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Ok((secret.to_bytes().to_vec(), public.to_bytes().to_vec()))
    }

    fn keypair_from_seed(&self, seed: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        let seed = to_array_32(seed, "X25519 seed")?;
        // StaticSecret clamps the seed per RFC 7748; same seed, same keypair.
        let secret = StaticSecret::from(seed);
        let public = PublicKey::from(&secret);
        Ok((secret.to_bytes().to_vec(), public.to_bytes().to_vec()))
    }

    fn public_from_private(&self, private: &[u8]) -> Result<Vec<u8>> {
        let bytes = to_array_32(private, "X25519 private key")?;
        let secret = StaticSecret::from(bytes);
        Ok(PublicKey::from(&secret).to_bytes().to_vec())
    }

    fn encapsulate(&self, public: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        let pk_bytes = to_array_32(public, "X25519 public key")?;
        let recipient = PublicKey::from(pk_bytes);

        let ephemeral = EphemeralSecret::random_from_rng(OsRng);
        let ephemeral_public = PublicKey::from(&ephemeral);
        let shared = ephemeral.diffie_hellman(&recipient);

        Ok((
            ephemeral_public.to_bytes().to_vec(),
            shared.to_bytes().to_vec(),
        ))
    }

    fn decapsulate(&self, private: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let sk_bytes = to_array_32(private, "X25519 private key")?;
        let secret = StaticSecret::from(sk_bytes);

        let ct_bytes = to_array_32(ciphertext, "X25519 ciphertext")?;
        let ephemeral_public = PublicKey::from(ct_bytes);

        let shared = secret.diffie_hellman(&ephemeral_public);
        Ok(shared.to_bytes().to_vec())
    }
}
