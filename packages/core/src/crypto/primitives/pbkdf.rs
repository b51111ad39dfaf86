//! Passphrase-stretching backends.
//!
//! Argon2id is the memory-hard stretcher used by the hybrid suites.
//! PBKDF2-HMAC-SHA256 exists only for the legacy suite's key schedule and
//! is not memory-hard; new suites must not use it.

use crate::config::{PbkdfParams, ALG_ARGON2ID, ALG_PBKDF2_SHA256};
use crate::crypto::provider::PasswordHash;
use crate::error::{CryptoError, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

pub struct Argon2idHash;

impl PasswordHash for Argon2idHash {
    fn name(&self) -> &'static str {
        ALG_ARGON2ID
    }

    fn stretch(
        &self,
        passphrase: &[u8],
        salt: &[u8],
        params: &PbkdfParams,
        out_len: usize,
    ) -> Result<Vec<u8>> {
        let argon_params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            Some(out_len),
        )
        .map_err(|e| CryptoError::KeyDerivation(format!("invalid Argon2 parameters: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);
        let mut out = vec![0u8; out_len];
        argon2
            .hash_password_into(passphrase, salt, &mut out)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        Ok(out)
    }
}

pub struct Pbkdf2Sha256Hash;

impl PasswordHash for Pbkdf2Sha256Hash {
    fn name(&self) -> &'static str {
        ALG_PBKDF2_SHA256
    }

    fn stretch(
        &self,
        passphrase: &[u8],
        salt: &[u8],
        params: &PbkdfParams,
        out_len: usize,
    ) -> Result<Vec<u8>> {
        if params.iterations == 0 {
            return Err(CryptoError::KeyDerivation(
                "PBKDF2 iteration count must be non-zero".to_string(),
            ));
        }
        let mut out = vec![0u8; out_len];
        pbkdf2_hmac::<Sha256>(passphrase, salt, params.iterations, &mut out);
        Ok(out)
    }
}
