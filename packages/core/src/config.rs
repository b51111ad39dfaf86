//! Suite catalog and agility configuration.
//!
//! All algorithm choices and cost parameters are defined here so nothing is
//! hardcoded across the crypto modules. The host's configuration subsystem
//! hands these structs to the core once at startup; they are immutable
//! afterwards.

use crate::error::{CryptoError, Result};
use serde::{Deserialize, Serialize};

// Имена алгоритмов, под которыми built-in примитивы регистрируются
// в AlgorithmProvider
pub const ALG_X25519: &str = "X25519";
pub const ALG_ML_KEM_768: &str = "ML-KEM-768";
pub const ALG_CHACHA20_POLY1305: &str = "ChaCha20-Poly1305";
pub const ALG_AES_256_GCM: &str = "AES-256-GCM";
pub const ALG_HKDF_SHA256: &str = "HKDF-SHA256";
pub const ALG_ARGON2ID: &str = "Argon2id";
pub const ALG_PBKDF2_SHA256: &str = "PBKDF2-HMAC-SHA256";

/// Built-in suite ids.
pub const SUITE_HYBRID_A: &str = "HYBRID-A";
pub const SUITE_HYBRID_B: &str = "HYBRID-B";
pub const SUITE_LEGACY: &str = "LEGACY-X25519";

/// Cost parameters for the passphrase-stretching function.
///
/// `memory_kib` and `parallelism` apply to Argon2id; PBKDF2 uses only
/// `iterations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PbkdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

/// Whether a suite is the full hybrid scheme or the pre-hybrid
/// classical-only format kept for backward compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuiteFlavor {
    Hybrid,
    LegacyClassical,
}

/// A named, fixed combination of algorithms. Loaded once at startup and
/// never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteDefinition {
    pub id: String,
    pub description: String,
    pub flavor: SuiteFlavor,
    /// Classical KEM / DH algorithm name.
    pub classical_kem: String,
    /// PQC KEM algorithm name. Absent for legacy classical-only suites.
    pub pqc_kem: Option<String>,
    /// Symmetric AEAD cipher name.
    pub aead: String,
    /// KDF combining the hybrid shared secrets into the data key.
    pub hybrid_kdf: String,
    /// Passphrase-stretching function name.
    pub pbkdf: String,
    /// KDF fanning the stretched secret into independent keypair seeds.
    pub passphrase_kdf: String,
    pub pbkdf_params: PbkdfParams,
}

/// Agility settings supplied by the host per operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgilityConfig {
    /// Suite used for all new encryptions.
    pub active_suite_id: String,
    /// Suites tried in order when decrypting data of unknown origin.
    pub decryption_attempt_order: Vec<String>,
}

impl AgilityConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| CryptoError::Config(e.to_string()))
    }
}

/// Parse a suite catalog from JSON (the shape the host's configuration
/// collaborator produces).
pub fn catalog_from_json(raw: &str) -> Result<Vec<SuiteDefinition>> {
    serde_json::from_str(raw).map_err(|e| CryptoError::Config(e.to_string()))
}

/// Look up a suite definition by id.
pub fn find_suite<'a>(catalog: &'a [SuiteDefinition], id: &str) -> Result<&'a SuiteDefinition> {
    catalog
        .iter()
        .find(|s| s.id == id)
        .ok_or_else(|| CryptoError::UnknownSuite(id.to_string()))
}

fn env_u32(name: &str, default: u32) -> u32 {
    match std::env::var(name) {
        Ok(val) => val.parse().unwrap_or(default),
        Err(_) => default,
    }
}

/// Argon2id defaults target roughly 100-500ms on desktop hardware.
/// Overridable from the environment so CI and tests stay fast.
fn default_argon2_params() -> PbkdfParams {
    PbkdfParams {
        memory_kib: env_u32("LEDGERLOCK_ARGON2_MEMORY_KIB", 19_456),
        iterations: env_u32("LEDGERLOCK_ARGON2_ITERATIONS", 2),
        parallelism: 1,
    }
}

/// The built-in suite catalog.
///
/// HYBRID-A is the active default; HYBRID-B differs only in the AEAD so
/// agility is exercised across genuinely distinct ciphers. LEGACY-X25519
/// names the pre-hybrid format and is decrypt-only.
pub fn builtin_catalog() -> Vec<SuiteDefinition> {
    let argon2 = default_argon2_params();
    vec![
        SuiteDefinition {
            id: SUITE_HYBRID_A.to_string(),
            description: "X25519 + ML-KEM-768, ChaCha20-Poly1305".to_string(),
            flavor: SuiteFlavor::Hybrid,
            classical_kem: ALG_X25519.to_string(),
            pqc_kem: Some(ALG_ML_KEM_768.to_string()),
            aead: ALG_CHACHA20_POLY1305.to_string(),
            hybrid_kdf: ALG_HKDF_SHA256.to_string(),
            pbkdf: ALG_ARGON2ID.to_string(),
            passphrase_kdf: ALG_HKDF_SHA256.to_string(),
            pbkdf_params: argon2,
        },
        SuiteDefinition {
            id: SUITE_HYBRID_B.to_string(),
            description: "X25519 + ML-KEM-768, AES-256-GCM".to_string(),
            flavor: SuiteFlavor::Hybrid,
            classical_kem: ALG_X25519.to_string(),
            pqc_kem: Some(ALG_ML_KEM_768.to_string()),
            aead: ALG_AES_256_GCM.to_string(),
            hybrid_kdf: ALG_HKDF_SHA256.to_string(),
            pbkdf: ALG_ARGON2ID.to_string(),
            passphrase_kdf: ALG_HKDF_SHA256.to_string(),
            pbkdf_params: argon2,
        },
        SuiteDefinition {
            id: SUITE_LEGACY.to_string(),
            description: "pre-hybrid X25519-only format (decrypt-only)".to_string(),
            flavor: SuiteFlavor::LegacyClassical,
            classical_kem: ALG_X25519.to_string(),
            pqc_kem: None,
            aead: ALG_CHACHA20_POLY1305.to_string(),
            hybrid_kdf: ALG_HKDF_SHA256.to_string(),
            pbkdf: ALG_PBKDF2_SHA256.to_string(),
            passphrase_kdf: ALG_HKDF_SHA256.to_string(),
            pbkdf_params: PbkdfParams {
                memory_kib: 0,
                iterations: 600_000,
                parallelism: 1,
            },
        },
    ]
}

/// Default agility configuration matching the built-in catalog.
pub fn builtin_agility_config() -> AgilityConfig {
    AgilityConfig {
        active_suite_id: SUITE_HYBRID_A.to_string(),
        decryption_attempt_order: vec![
            SUITE_HYBRID_A.to_string(),
            SUITE_HYBRID_B.to_string(),
            SUITE_LEGACY.to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_suites() {
        let catalog = builtin_catalog();
        assert_eq!(catalog.len(), 3);
        assert!(find_suite(&catalog, SUITE_HYBRID_A).is_ok());
        assert!(find_suite(&catalog, SUITE_HYBRID_B).is_ok());
        assert!(find_suite(&catalog, SUITE_LEGACY).is_ok());
    }

    #[test]
    fn test_unknown_suite_is_error() {
        let catalog = builtin_catalog();
        let err = find_suite(&catalog, "HYBRID-Z").unwrap_err();
        assert!(matches!(err, CryptoError::UnknownSuite(_)));
    }

    #[test]
    fn test_legacy_suite_has_no_pqc_kem() {
        let catalog = builtin_catalog();
        let legacy = find_suite(&catalog, SUITE_LEGACY).unwrap();
        assert!(legacy.pqc_kem.is_none());
        assert_eq!(legacy.flavor, SuiteFlavor::LegacyClassical);
        assert_eq!(legacy.pbkdf, ALG_PBKDF2_SHA256);
    }

    #[test]
    fn test_catalog_json_round_trip() {
        let catalog = builtin_catalog();
        let json = serde_json::to_string(&catalog).unwrap();
        let parsed = catalog_from_json(&json).unwrap();
        assert_eq!(parsed.len(), catalog.len());
        assert_eq!(parsed[0].id, catalog[0].id);
        assert_eq!(parsed[0].pbkdf_params, catalog[0].pbkdf_params);
    }

    #[test]
    fn test_agility_config_from_json() {
        let config = AgilityConfig::from_json(
            r#"{"active_suite_id":"HYBRID-A","decryption_attempt_order":["HYBRID-A","LEGACY-X25519"]}"#,
        )
        .unwrap();
        assert_eq!(config.active_suite_id, "HYBRID-A");
        assert_eq!(config.decryption_attempt_order.len(), 2);
    }
}
