//! AEAD cipher backends: ChaCha20-Poly1305 and AES-256-GCM.
//!
//! The RustCrypto AEAD crates return `ciphertext || tag` and verify tags in
//! constant time internally; this module splits and rejoins the tag so the
//! bundle codec can carry it as its own field.

use crate::config::{ALG_AES_256_GCM, ALG_CHACHA20_POLY1305};
use crate::crypto::provider::AeadCipher;
use crate::error::{CryptoError, Result};
use aes_gcm::Aes256Gcm;
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305,
};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

fn check_lens(key: &[u8], nonce: &[u8], name: &str) -> Result<()> {
    if key.len() != KEY_LEN {
        return Err(CryptoError::InvalidKey(format!(
            "invalid {} key length: expected {}, got {}",
            name,
            KEY_LEN,
            key.len()
        )));
    }
    if nonce.len() != NONCE_LEN {
        return Err(CryptoError::Encoding(format!(
            "invalid {} nonce length: expected {}, got {}",
            name,
            NONCE_LEN,
            nonce.len()
        )));
    }
    Ok(())
}

fn split_tag(mut sealed: Vec<u8>) -> (Vec<u8>, Vec<u8>) {
    let tag = sealed.split_off(sealed.len() - TAG_LEN);
    (sealed, tag)
}

#[derive(Debug)]
pub struct ChaCha20Poly1305Cipher;

impl AeadCipher for ChaCha20Poly1305Cipher {
    fn name(&self) -> &'static str {
        ALG_CHACHA20_POLY1305
    }

    fn key_len(&self) -> usize {
        KEY_LEN
    }

    fn nonce_len(&self) -> usize {
        NONCE_LEN
    }

    fn tag_len(&self) -> usize {
        TAG_LEN
    }

    fn seal(
        &self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>)> {
        check_lens(key, nonce, self.name())?;
        let cipher = ChaCha20Poly1305::new(key.into());
        let sealed = cipher
            .encrypt(nonce.into(), Payload { msg: plaintext, aad })
            .map_err(|_| CryptoError::KeyDerivation("AEAD seal failed".to_string()))?;
        Ok(split_tag(sealed))
    }

    fn open(
        &self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Result<Vec<u8>> {
        check_lens(key, nonce, self.name())?;
        if tag.len() != TAG_LEN {
            return Err(CryptoError::Authentication);
        }
        let cipher = ChaCha20Poly1305::new(key.into());
        let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_LEN);
        sealed.extend_from_slice(ciphertext);
        sealed.extend_from_slice(tag);
        cipher
            .decrypt(nonce.into(), Payload { msg: &sealed, aad })
            .map_err(|_| CryptoError::Authentication)
    }
}

#[derive(Debug)]
pub struct Aes256GcmCipher;

impl AeadCipher for Aes256GcmCipher {
    fn name(&self) -> &'static str {
        ALG_AES_256_GCM
    }

    fn key_len(&self) -> usize {
        KEY_LEN
    }

    fn nonce_len(&self) -> usize {
        NONCE_LEN
    }

    fn tag_len(&self) -> usize {
        TAG_LEN
    }

    fn seal(
        &self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>)> {
        check_lens(key, nonce, self.name())?;
        let cipher = Aes256Gcm::new(key.into());
        let sealed = cipher
            .encrypt(nonce.into(), Payload { msg: plaintext, aad })
            .map_err(|_| CryptoError::KeyDerivation("AEAD seal failed".to_string()))?;
        Ok(split_tag(sealed))
    }

    fn open(
        &self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Result<Vec<u8>> {
        check_lens(key, nonce, self.name())?;
        if tag.len() != TAG_LEN {
            return Err(CryptoError::Authentication);
        }
        let cipher = Aes256Gcm::new(key.into());
        let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_LEN);
        sealed.extend_from_slice(ciphertext);
        sealed.extend_from_slice(tag);
        cipher
            .decrypt(nonce.into(), Payload { msg: &sealed, aad })
            .map_err(|_| CryptoError::Authentication)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ciphers() -> Vec<Box<dyn AeadCipher>> {
        vec![Box::new(ChaCha20Poly1305Cipher), Box::new(Aes256GcmCipher)]
    }

    #[test]
    fn test_seal_open_round_trip() {
        for cipher in ciphers() {
            let key = [1u8; 32];
            let nonce = [2u8; 12];
            let aad = b"header";
            let plaintext = b"the quick brown fox";

            let (ct, tag) = cipher.seal(&key, &nonce, aad, plaintext).unwrap();
            assert_eq!(ct.len(), plaintext.len());
            assert_eq!(tag.len(), 16);

            let opened = cipher.open(&key, &nonce, aad, &ct, &tag).unwrap();
            assert_eq!(opened, plaintext);
        }
    }

    #[test]
    fn test_tampered_ciphertext_fails_authentication() {
        for cipher in ciphers() {
            let key = [1u8; 32];
            let nonce = [2u8; 12];
            let (mut ct, tag) = cipher.seal(&key, &nonce, b"", b"payload").unwrap();
            ct[0] ^= 1;
            assert!(matches!(
                cipher.open(&key, &nonce, b"", &ct, &tag),
                Err(CryptoError::Authentication)
            ));
        }
    }

    #[test]
    fn test_tampered_tag_fails_authentication() {
        for cipher in ciphers() {
            let key = [1u8; 32];
            let nonce = [2u8; 12];
            let (ct, mut tag) = cipher.seal(&key, &nonce, b"", b"payload").unwrap();
            tag[15] ^= 0x80;
            assert!(matches!(
                cipher.open(&key, &nonce, b"", &ct, &tag),
                Err(CryptoError::Authentication)
            ));
        }
    }

    #[test]
    fn test_wrong_aad_fails_authentication() {
        for cipher in ciphers() {
            let key = [1u8; 32];
            let nonce = [2u8; 12];
            let (ct, tag) = cipher.seal(&key, &nonce, b"aad-1", b"payload").unwrap();
            assert!(matches!(
                cipher.open(&key, &nonce, b"aad-2", &ct, &tag),
                Err(CryptoError::Authentication)
            ));
        }
    }

    #[test]
    fn test_wrong_key_length_rejected() {
        for cipher in ciphers() {
            assert!(matches!(
                cipher.seal(&[0u8; 16], &[0u8; 12], b"", b"x"),
                Err(CryptoError::InvalidKey(_))
            ));
        }
    }

    #[test]
    fn test_ciphers_produce_different_ciphertexts() {
        let key = [1u8; 32];
        let nonce = [2u8; 12];
        let (ct_chacha, _) = ChaCha20Poly1305Cipher.seal(&key, &nonce, b"", b"data").unwrap();
        let (ct_gcm, _) = Aes256GcmCipher.seal(&key, &nonce, b"", b"data").unwrap();
        assert_ne!(ct_chacha, ct_gcm);
    }
}
