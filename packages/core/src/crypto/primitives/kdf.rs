//! HKDF-SHA256 key derivation backend.

use crate::config::ALG_HKDF_SHA256;
use crate::crypto::provider::KeyDerivation;
use crate::error::{CryptoError, Result};
use hkdf::Hkdf;
use sha2::Sha256;

pub struct HkdfSha256;

impl KeyDerivation for HkdfSha256 {
    fn name(&self) -> &'static str {
        ALG_HKDF_SHA256
    }

    fn derive(&self, ikm: &[u8], salt: Option<&[u8]>, info: &[u8], len: usize) -> Result<Vec<u8>> {
        let hkdf = Hkdf::<Sha256>::new(salt, ikm);
        let mut okm = vec![0u8; len];
        hkdf.expand(info, &mut okm)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        Ok(okm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_deterministic() {
        let kdf = HkdfSha256;
        let a = kdf.derive(b"ikm", Some(b"salt"), b"info", 32).unwrap();
        let b = kdf.derive(b"ikm", Some(b"salt"), b"info", 32).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_info_strings_domain_separate() {
        let kdf = HkdfSha256;
        let a = kdf.derive(b"ikm", None, b"classical-kem-seed", 32).unwrap();
        let b = kdf.derive(b"ikm", None, b"pqc-kem-seed", 32).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_salt_changes_output() {
        let kdf = HkdfSha256;
        let a = kdf.derive(b"ikm", Some(b"salt-1"), b"info", 32).unwrap();
        let b = kdf.derive(b"ikm", Some(b"salt-2"), b"info", 32).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_overlong_output_rejected() {
        let kdf = HkdfSha256;
        // HKDF-SHA256 caps output at 255 * 32 bytes.
        assert!(matches!(
            kdf.derive(b"ikm", None, b"info", 256 * 32),
            Err(CryptoError::KeyDerivation(_))
        ));
    }
}
