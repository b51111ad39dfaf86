//! Self-describing encrypted container format.
//!
//! Version 1 wire layout, all integers big-endian:
//!
//! ```text
//! magic          4 bytes  b"LLK1"
//! suite_id       u16 length + UTF-8 bytes
//! classical_ct   u32 length + bytes   (0 = absent)
//! pqc_ct         u32 length + bytes
//! nonce          u32 length + bytes
//! ciphertext     u32 length + bytes
//! tag            u32 length + bytes
//! pbkdf_salt     u32 length + bytes   (0 = absent)
//! hybrid_salt    u32 length + bytes   (0 = absent)
//! ```
//!
//! The format identifier and suite id double as AEAD associated data (see
//! [`header_aad`]), so renaming the suite inside a bundle breaks
//! authentication instead of silently decrypting under another label.
//!
//! Created once at encryption, immutable thereafter, parsed once per
//! decryption attempt. The storage collaborator treats the encoded bytes
//! as an opaque blob.

use crate::error::{CryptoError, Result};

/// Format identifier for version 1 bundles.
pub const MAGIC_V1: &[u8; 4] = b"LLK1";

/// Shared prefix of every bundle magic, used to recognize bundles from a
/// newer format version that this build cannot parse.
const MAGIC_PREFIX: &[u8; 3] = b"LLK";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBundle {
    pub suite_id: String,
    /// Classical KEM ciphertext (the ephemeral public key for DH-based
    /// KEMs). Absent in PQC-only suites.
    pub classical_ct: Option<Vec<u8>>,
    /// PQC KEM encapsulated ciphertext.
    pub pqc_ct: Vec<u8>,
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
    /// Salt the passphrase was stretched with, if key material came from a
    /// passphrase. Embedded so decryption reuses it instead of regenerating.
    pub pbkdf_salt: Option<Vec<u8>>,
    /// Salt for the KDF combining the hybrid shared secrets.
    pub hybrid_salt: Option<Vec<u8>>,
}

/// Associated data binding a v1 bundle's ciphertext to its header.
pub fn header_aad(suite_id: &str) -> Vec<u8> {
    let id = suite_id.as_bytes();
    let mut aad = Vec::with_capacity(MAGIC_V1.len() + 2 + id.len());
    aad.extend_from_slice(MAGIC_V1);
    aad.extend_from_slice(&(id.len() as u16).to_be_bytes());
    aad.extend_from_slice(id);
    aad
}

fn put_field(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
}

fn put_opt_field(out: &mut Vec<u8>, bytes: Option<&[u8]>) {
    put_field(out, bytes.unwrap_or(&[]));
}

/// Sequential reader with truncation checks.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        if self.buf.len() < self.pos + n {
            return Err(CryptoError::Encoding(format!(
                "input truncated while reading {}",
                what
            )));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn take_u16(&mut self, what: &str) -> Result<u16> {
        let bytes = self.take(2, what)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn take_u32(&mut self, what: &str) -> Result<u32> {
        let bytes = self.take(4, what)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn take_field(&mut self, what: &str) -> Result<&'a [u8]> {
        let len = self.take_u32(what)? as usize;
        if len > self.buf.len() {
            // Claimed length cannot possibly fit; corrupt or hostile input.
            return Err(CryptoError::Encoding(format!(
                "claimed {} length greater than available input",
                what
            )));
        }
        self.take(len, what)
    }

    fn finish(&self) -> Result<()> {
        if self.pos < self.buf.len() {
            return Err(CryptoError::Encoding(
                "unexpected trailing data after bundle".to_string(),
            ));
        }
        Ok(())
    }
}

fn read_suite_id(reader: &mut Reader<'_>) -> Result<String> {
    let len = reader.take_u16("suite id length")? as usize;
    let bytes = reader.take(len, "suite id")?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| CryptoError::Encoding("suite id is not valid UTF-8".to_string()))
}

fn check_magic(reader: &mut Reader<'_>) -> Result<()> {
    let magic = reader.take(MAGIC_V1.len(), "format identifier")?;
    if magic == MAGIC_V1 {
        Ok(())
    } else if magic.starts_with(MAGIC_PREFIX) {
        Err(CryptoError::FormatMismatch(
            "bundle format version not supported by this build".to_string(),
        ))
    } else {
        Err(CryptoError::FormatMismatch(
            "input does not carry the bundle format identifier".to_string(),
        ))
    }
}

impl EncryptedBundle {
    /// Serialize to the v1 wire format.
    pub fn encode(&self) -> Vec<u8> {
        let id = self.suite_id.as_bytes();
        let mut out = Vec::with_capacity(
            MAGIC_V1.len()
                + 2
                + id.len()
                + 7 * 4
                + self.classical_ct.as_ref().map_or(0, Vec::len)
                + self.pqc_ct.len()
                + self.nonce.len()
                + self.ciphertext.len()
                + self.tag.len()
                + self.pbkdf_salt.as_ref().map_or(0, Vec::len)
                + self.hybrid_salt.as_ref().map_or(0, Vec::len),
        );
        out.extend_from_slice(MAGIC_V1);
        out.extend_from_slice(&(id.len() as u16).to_be_bytes());
        out.extend_from_slice(id);
        put_opt_field(&mut out, self.classical_ct.as_deref());
        put_field(&mut out, &self.pqc_ct);
        put_field(&mut out, &self.nonce);
        put_field(&mut out, &self.ciphertext);
        put_field(&mut out, &self.tag);
        put_opt_field(&mut out, self.pbkdf_salt.as_deref());
        put_opt_field(&mut out, self.hybrid_salt.as_deref());
        out
    }

    /// Parse a v1 bundle. A wrong or missing format identifier is a
    /// recoverable `FormatMismatch`; anything structurally broken past the
    /// header is `Encoding`.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(raw);
        check_magic(&mut reader)?;
        let suite_id = read_suite_id(&mut reader)?;

        let classical_ct = reader.take_field("classical KEM ciphertext")?.to_vec();
        let pqc_ct = reader.take_field("PQC KEM ciphertext")?.to_vec();
        let nonce = reader.take_field("nonce")?.to_vec();
        let ciphertext = reader.take_field("ciphertext")?.to_vec();
        let tag = reader.take_field("tag")?.to_vec();
        let pbkdf_salt = reader.take_field("PBKDF salt")?.to_vec();
        let hybrid_salt = reader.take_field("hybrid KDF salt")?.to_vec();
        reader.finish()?;

        let optional = |v: Vec<u8>| if v.is_empty() { None } else { Some(v) };
        Ok(Self {
            suite_id,
            classical_ct: optional(classical_ct),
            pqc_ct,
            nonce,
            ciphertext,
            tag,
            pbkdf_salt: optional(pbkdf_salt),
            hybrid_salt: optional(hybrid_salt),
        })
    }
}

/// Extract the suite id from a bundle header without a full parse.
///
/// Returns `None` for anything that does not start with a readable v1
/// header, letting the caller fall back to the legacy handler.
pub fn peek_suite_id(raw: &[u8]) -> Option<String> {
    let mut reader = Reader::new(raw);
    check_magic(&mut reader).ok()?;
    read_suite_id(&mut reader).ok()
}
