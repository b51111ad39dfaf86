//! Cryptographic core: hybrid post-quantum encryption for ledger data at
//! rest, with algorithm agility.
//!
//! Layered bottom-up:
//!
//! - [`provider`]: named algorithm implementations behind capability traits
//! - [`bundle`]: the self-describing encrypted container format
//! - [`keys`]: passphrase-derived and file-loaded key material
//! - [`handlers`]: one encryption scheme per suite
//! - [`registry`]: suite id to handler mapping with lazy construction
//! - [`orchestrator`]: the entry point the host calls

pub mod bundle;
pub mod handlers;
pub mod keys;
pub mod orchestrator;
pub mod primitives;
pub mod provider;
pub mod registry;

pub use bundle::EncryptedBundle;
pub use handlers::CryptoHandler;
pub use keys::{ExportConfirmation, KeyFilePaths, KeyManager, KeyMaterial};
pub use orchestrator::Orchestrator;
pub use provider::AlgorithmProvider;
pub use registry::HandlerRegistry;
