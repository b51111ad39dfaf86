//! ledgerlock-core: hybrid post-quantum encryption for plain-text ledger
//! files at rest.
//!
//! Data is sealed under a named cipher suite combining a classical KEM, a
//! post-quantum KEM, and an AEAD. Suites are configuration, not code:
//! rotating algorithms means editing the catalog and re-encrypting, while
//! old data keeps decrypting through the agility fallback.
//!
//! ```no_run
//! use std::sync::Arc;
//! use ledgerlock_core::config;
//! use ledgerlock_core::crypto::{AlgorithmProvider, HandlerRegistry, KeyManager, Orchestrator};
//!
//! # fn main() -> ledgerlock_core::error::Result<()> {
//! let provider = Arc::new(AlgorithmProvider::with_default_algorithms());
//! let catalog = config::builtin_catalog();
//! let agility = config::builtin_agility_config();
//!
//! let registry = Arc::new(HandlerRegistry::from_catalog(&catalog, Arc::clone(&provider))?);
//! let orchestrator = Orchestrator::new(registry);
//!
//! let manager = KeyManager::new(provider);
//! let salt = KeyManager::generate_salt();
//! let suite = config::find_suite(&catalog, &agility.active_suite_id)?;
//! let keys = manager.derive_keys_from_passphrase("correct horse", &salt, suite)?;
//!
//! let sealed = orchestrator.encrypt_active(&agility, b"assets:cash 10 USD\n", &keys)?;
//! let opened = orchestrator.decrypt_with_agility(&agility, &sealed, &keys)?;
//! assert_eq!(opened, b"assets:cash 10 USD\n");
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod crypto;
pub mod error;

pub use crypto::{
    AlgorithmProvider, CryptoHandler, EncryptedBundle, ExportConfirmation, HandlerRegistry,
    KeyFilePaths, KeyManager, KeyMaterial, Orchestrator,
};
pub use error::{CryptoError, Result};
