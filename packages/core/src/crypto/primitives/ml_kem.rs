//! ML-KEM-768 post-quantum KEM backend (FIPS 203).
//!
//! Uses the `fips203` crate. The seeded generation path
//! (`keygen_from_seed`) is what makes passphrase-derived PQC keypairs
//! reproducible across sessions; a freshly randomized keypair here would
//! break round-trip decryption.
//!
//! Key sizes per FIPS 203: public key 1184 bytes, secret key 2400 bytes,
//! ciphertext 1088 bytes, shared secret 32 bytes.

use crate::config::ALG_ML_KEM_768;
use crate::crypto::provider::Kem;
use crate::error::{CryptoError, Result};
use fips203::ml_kem_768;
use fips203::traits::{Decaps, Encaps, KeyGen, SerDes};

pub const ML_KEM_768_PUBLIC_KEY_SIZE: usize = 1184;
pub const ML_KEM_768_SECRET_KEY_SIZE: usize = 2400;
pub const ML_KEM_768_CIPHERTEXT_SIZE: usize = 1088;
pub const ML_KEM_768_SHARED_SECRET_SIZE: usize = 32;

/// Seed is the FIPS 203 (d, z) pair, 32 bytes each.
pub const ML_KEM_768_SEED_SIZE: usize = 64;

// Offset of the embedded encapsulation key inside a decapsulation key:
// dk = dk_pke (1152) || ek (1184) || H(ek) (32) || z (32).
const EK_OFFSET_IN_DK: usize = 1152;

pub struct MlKem768;

impl Kem for MlKem768 {
    fn name(&self) -> &'static str {
        ALG_ML_KEM_768
    }

    fn public_key_len(&self) -> usize {
        ML_KEM_768_PUBLIC_KEY_SIZE
    }

    fn private_key_len(&self) -> usize {
        ML_KEM_768_SECRET_KEY_SIZE
    }

    fn ciphertext_len(&self) -> usize {
        ML_KEM_768_CIPHERTEXT_SIZE
    }

    fn seed_len(&self) -> usize {
        ML_KEM_768_SEED_SIZE
    }

    fn generate_keypair(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        let (ek, dk) = ml_kem_768::KG::try_keygen()
            .map_err(|_| CryptoError::KeyDerivation("ML-KEM-768 keygen failed".to_string()))?;
        Ok((dk.into_bytes().to_vec(), ek.into_bytes().to_vec()))
    }

    fn keypair_from_seed(&self, seed: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        if seed.len() != ML_KEM_768_SEED_SIZE {
            return Err(CryptoError::InvalidKey(format!(
                "invalid ML-KEM-768 seed length: expected {}, got {}",
                ML_KEM_768_SEED_SIZE,
                seed.len()
            )));
        }
        let mut d = [0u8; 32];
        let mut z = [0u8; 32];
        d.copy_from_slice(&seed[..32]);
        z.copy_from_slice(&seed[32..]);

        let (ek, dk) = ml_kem_768::KG::keygen_from_seed(d, z);
        Ok((dk.into_bytes().to_vec(), ek.into_bytes().to_vec()))
    }

    fn public_from_private(&self, private: &[u8]) -> Result<Vec<u8>> {
        if private.len() != ML_KEM_768_SECRET_KEY_SIZE {
            return Err(CryptoError::InvalidKey(format!(
                "invalid ML-KEM-768 secret key length: expected {}, got {}",
                ML_KEM_768_SECRET_KEY_SIZE,
                private.len()
            )));
        }
        // The decapsulation key embeds the encapsulation key (FIPS 203 §6.1).
        Ok(private[EK_OFFSET_IN_DK..EK_OFFSET_IN_DK + ML_KEM_768_PUBLIC_KEY_SIZE].to_vec())
    }

    fn encapsulate(&self, public: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        let pk_array: [u8; ML_KEM_768_PUBLIC_KEY_SIZE] = public.try_into().map_err(|_| {
            CryptoError::InvalidKey(format!(
                "invalid ML-KEM-768 public key length: expected {}, got {}",
                ML_KEM_768_PUBLIC_KEY_SIZE,
                public.len()
            ))
        })?;

        let ek = ml_kem_768::EncapsKey::try_from_bytes(pk_array)
            .map_err(|_| CryptoError::InvalidKey("malformed ML-KEM-768 public key".to_string()))?;

        let (ss, ct) = ek
            .try_encaps()
            .map_err(|_| CryptoError::KeyDerivation("ML-KEM-768 encapsulation failed".to_string()))?;

        Ok((ct.into_bytes().to_vec(), ss.into_bytes().to_vec()))
    }

    fn decapsulate(&self, private: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let sk_array: [u8; ML_KEM_768_SECRET_KEY_SIZE] = private.try_into().map_err(|_| {
            CryptoError::InvalidKey(format!(
                "invalid ML-KEM-768 secret key length: expected {}, got {}",
                ML_KEM_768_SECRET_KEY_SIZE,
                private.len()
            ))
        })?;

        let ct_array: [u8; ML_KEM_768_CIPHERTEXT_SIZE] = ciphertext.try_into().map_err(|_| {
            CryptoError::FormatMismatch(format!(
                "invalid ML-KEM-768 ciphertext length: expected {}, got {}",
                ML_KEM_768_CIPHERTEXT_SIZE,
                ciphertext.len()
            ))
        })?;

        let dk = ml_kem_768::DecapsKey::try_from_bytes(sk_array)
            .map_err(|_| CryptoError::InvalidKey("malformed ML-KEM-768 secret key".to_string()))?;
        let ct = ml_kem_768::CipherText::try_from_bytes(ct_array).map_err(|_| {
            CryptoError::FormatMismatch("malformed ML-KEM-768 ciphertext".to_string())
        })?;

        let ss = dk
            .try_decaps(&ct)
            .map_err(|_| CryptoError::Authentication)?;

        Ok(ss.into_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keygen_produces_correct_sizes() {
        let kem = MlKem768;
        let (sk, pk) = kem.generate_keypair().unwrap();
        assert_eq!(pk.len(), ML_KEM_768_PUBLIC_KEY_SIZE);
        assert_eq!(sk.len(), ML_KEM_768_SECRET_KEY_SIZE);
    }

    #[test]
    fn test_encaps_decaps_round_trip() {
        let kem = MlKem768;
        let (sk, pk) = kem.generate_keypair().unwrap();

        let (ct, ss_enc) = kem.encapsulate(&pk).unwrap();
        assert_eq!(ct.len(), ML_KEM_768_CIPHERTEXT_SIZE);
        assert_eq!(ss_enc.len(), ML_KEM_768_SHARED_SECRET_SIZE);

        let ss_dec = kem.decapsulate(&sk, &ct).unwrap();
        assert_eq!(ss_enc, ss_dec, "shared secrets must match");
    }

    #[test]
    fn test_keypair_from_seed_is_deterministic() {
        let kem = MlKem768;
        let seed = [0x42u8; ML_KEM_768_SEED_SIZE];

        let (sk1, pk1) = kem.keypair_from_seed(&seed).unwrap();
        let (sk2, pk2) = kem.keypair_from_seed(&seed).unwrap();
        assert_eq!(sk1, sk2, "same seed must yield the same secret key");
        assert_eq!(pk1, pk2, "same seed must yield the same public key");

        let mut other = seed;
        other[0] ^= 1;
        let (_, pk3) = kem.keypair_from_seed(&other).unwrap();
        assert_ne!(pk1, pk3, "different seed must yield a different keypair");
    }

    #[test]
    fn test_public_from_private_matches_keygen() {
        let kem = MlKem768;
        let (sk, pk) = kem.keypair_from_seed(&[9u8; ML_KEM_768_SEED_SIZE]).unwrap();
        assert_eq!(kem.public_from_private(&sk).unwrap(), pk);
    }

    #[test]
    fn test_corrupted_ciphertext_yields_different_secret() {
        // ML-KEM uses implicit rejection: decapsulation of a corrupted
        // ciphertext succeeds but yields an unrelated secret.
        let kem = MlKem768;
        let (sk, pk) = kem.generate_keypair().unwrap();
        let (mut ct, ss) = kem.encapsulate(&pk).unwrap();
        ct[0] ^= 0xff;
        let ss_corrupted = kem.decapsulate(&sk, &ct).unwrap();
        assert_ne!(ss, ss_corrupted);
    }

    #[test]
    fn test_malformed_lengths_rejected() {
        let kem = MlKem768;
        assert!(matches!(
            kem.encapsulate(&[0u8; 100]),
            Err(CryptoError::InvalidKey(_))
        ));
        assert!(matches!(
            kem.keypair_from_seed(&[0u8; 32]),
            Err(CryptoError::InvalidKey(_))
        ));
        let (sk, pk) = kem.generate_keypair().unwrap();
        let (ct, _) = kem.encapsulate(&pk).unwrap();
        assert!(kem.decapsulate(&sk[..100], &ct).is_err());
        assert!(matches!(
            kem.decapsulate(&sk, &ct[..100]),
            Err(CryptoError::FormatMismatch(_))
        ));
    }
}
