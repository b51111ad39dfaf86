//! Built-in primitive backends registered with the algorithm provider.

pub mod aead;
pub mod kdf;
pub mod ml_kem;
pub mod pbkdf;
pub mod x25519;
