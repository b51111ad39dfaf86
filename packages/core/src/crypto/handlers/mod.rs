//! Crypto handlers: one per suite, all behind a capability trait so the
//! registry and orchestrator treat every scheme uniformly.

pub mod hybrid;
pub mod legacy;

use crate::crypto::keys::KeyMaterial;
use crate::error::Result;

/// Capability interface implemented by every encryption scheme.
///
/// `encrypt` produces an opaque byte blob (the serialized bundle);
/// `decrypt` consumes one. `can_handle` is a cheap header check used by
/// the locator, not a guarantee that decryption will succeed.
pub trait CryptoHandler: Send + Sync {
    fn suite_id(&self) -> &str;

    fn can_handle(&self, raw: &[u8]) -> bool;

    fn encrypt(&self, plaintext: &[u8], keys: &KeyMaterial) -> Result<Vec<u8>>;

    fn decrypt(&self, raw: &[u8], keys: &KeyMaterial) -> Result<Vec<u8>>;
}
