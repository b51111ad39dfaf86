//! Agile encryption orchestrator.
//!
//! The orchestrator is the single entry point the host calls. Encryption
//! always goes through the configured active suite. Decryption first reads
//! the bundle header for a suite hint, then walks the configured attempt
//! order, skipping suites already tried, until one handler produces
//! plaintext or every candidate is exhausted.

use crate::config::AgilityConfig;
use crate::crypto::handlers::CryptoHandler;
use crate::crypto::keys::KeyMaterial;
use crate::crypto::registry::HandlerRegistry;
use crate::error::{CryptoError, Result};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct Orchestrator {
    registry: Arc<HandlerRegistry>,
}

enum AttemptOutcome {
    Success(Vec<u8>),
    /// The suite could not decrypt this blob; keep trying others.
    Recoverable,
    Abort(CryptoError),
}

impl Orchestrator {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    /// Encrypt under the configured active suite.
    pub fn encrypt_active(
        &self,
        config: &AgilityConfig,
        plaintext: &[u8],
        keys: &KeyMaterial,
    ) -> Result<Vec<u8>> {
        let handler = self.registry.get_handler(&config.active_suite_id)?;
        debug!(suite = %config.active_suite_id, "encrypting under active suite");
        handler.encrypt(plaintext, keys)
    }

    /// Decrypt a blob of unknown origin.
    ///
    /// The header hint, when present and registered, is tried first. The
    /// configured attempt order follows; each suite is tried at most once.
    /// Failures that merely mean "not this suite" move on to the next
    /// candidate; environmental failures abort immediately. When every
    /// candidate has failed, the aggregate error lists what was attempted.
    pub fn decrypt_with_agility(
        &self,
        config: &AgilityConfig,
        raw: &[u8],
        keys: &KeyMaterial,
    ) -> Result<Vec<u8>> {
        let hint = self.registry.select_handler_for_bytes(raw);
        if let Some(suite_id) = &hint {
            debug!(suite = %suite_id, "bundle header names a registered suite");
        } else {
            debug!("no usable suite hint, walking the attempt order");
        }

        let mut seen: Vec<&String> = Vec::new();
        let candidates: Vec<String> = hint
            .iter()
            .chain(config.decryption_attempt_order.iter())
            .filter(|id| {
                // Each suite is tried at most once, hint included.
                if seen.contains(id) {
                    false
                } else {
                    seen.push(*id);
                    true
                }
            })
            .cloned()
            .collect();

        let mut tried: Vec<String> = Vec::new();
        for suite_id in candidates {
            let handler = match self.registry.get_handler(&suite_id) {
                Ok(handler) => handler,
                Err(CryptoError::HandlerNotFound(_)) => {
                    // Configured order may name suites this build lacks.
                    debug!(suite = %suite_id, "suite in attempt order is not registered");
                    tried.push(suite_id);
                    continue;
                }
                Err(e) => return Err(e),
            };

            match self.attempt(handler.as_ref(), raw, keys, &suite_id) {
                AttemptOutcome::Success(plaintext) => {
                    debug!(suite = %suite_id, "decryption succeeded");
                    return Ok(plaintext);
                }
                AttemptOutcome::Recoverable => {
                    tried.push(suite_id);
                }
                AttemptOutcome::Abort(e) => return Err(e),
            }
        }

        warn!(
            attempted = tried.len(),
            "decryption exhausted every candidate suite"
        );
        Err(CryptoError::AggregateDecryption { attempted: tried })
    }

    fn attempt(
        &self,
        handler: &dyn CryptoHandler,
        raw: &[u8],
        keys: &KeyMaterial,
        suite_id: &str,
    ) -> AttemptOutcome {
        if !handler.can_handle(raw) {
            debug!(suite = %suite_id, "handler declined by header check");
            return AttemptOutcome::Recoverable;
        }
        match handler.decrypt(raw, keys) {
            Ok(plaintext) => AttemptOutcome::Success(plaintext),
            Err(e) if e.is_recoverable_attempt() => {
                debug!(suite = %suite_id, error = %e, "decryption attempt failed");
                AttemptOutcome::Recoverable
            }
            Err(e) => AttemptOutcome::Abort(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        builtin_agility_config, builtin_catalog, find_suite, PbkdfParams, SuiteDefinition,
        SUITE_HYBRID_A, SUITE_HYBRID_B,
    };
    use crate::crypto::keys::KeyManager;
    use crate::crypto::provider::AlgorithmProvider;

    fn fast_catalog() -> Vec<SuiteDefinition> {
        let mut catalog = builtin_catalog();
        for suite in &mut catalog {
            suite.pbkdf_params = PbkdfParams {
                memory_kib: 8,
                iterations: 1,
                parallelism: 1,
            };
        }
        catalog
    }

    fn setup() -> (Orchestrator, AgilityConfig, KeyMaterial) {
        let provider = Arc::new(AlgorithmProvider::with_default_algorithms());
        let catalog = fast_catalog();
        let registry =
            Arc::new(HandlerRegistry::from_catalog(&catalog, Arc::clone(&provider)).unwrap());
        let keys = KeyManager::new(provider)
            .derive_keys_from_passphrase(
                "orchestrator passphrase",
                &[9u8; 16],
                find_suite(&catalog, SUITE_HYBRID_A).unwrap(),
            )
            .unwrap();
        (Orchestrator::new(registry), builtin_agility_config(), keys)
    }

    #[test]
    fn test_encrypt_active_round_trip() {
        let (orchestrator, config, keys) = setup();
        let blob = orchestrator
            .encrypt_active(&config, b"balance sheet", &keys)
            .unwrap();
        let plaintext = orchestrator
            .decrypt_with_agility(&config, &blob, &keys)
            .unwrap();
        assert_eq!(plaintext, b"balance sheet");
    }

    #[test]
    fn test_hint_beats_attempt_order() {
        // Data encrypted under HYBRID-B decrypts even when the attempt
        // order lists it last, because the header hint is tried first.
        let (orchestrator, mut config, keys) = setup();
        config.active_suite_id = SUITE_HYBRID_B.to_string();
        let blob = orchestrator.encrypt_active(&config, b"x", &keys).unwrap();

        config.decryption_attempt_order =
            vec![SUITE_HYBRID_A.to_string(), SUITE_HYBRID_B.to_string()];
        assert_eq!(
            orchestrator
                .decrypt_with_agility(&config, &blob, &keys)
                .unwrap(),
            b"x"
        );
    }

    #[test]
    fn test_exhaustion_reports_attempted_suites() {
        let (orchestrator, config, keys) = setup();
        let err = orchestrator
            .decrypt_with_agility(&config, &[0u8; 128], &keys)
            .unwrap_err();
        match err {
            CryptoError::AggregateDecryption { attempted } => {
                assert_eq!(attempted, config.decryption_attempt_order);
            }
            other => panic!("expected aggregate error, got {other:?}"),
        }
    }

    #[test]
    fn test_unregistered_suite_in_order_is_skipped() {
        let (orchestrator, mut config, keys) = setup();
        let blob = orchestrator.encrypt_active(&config, b"x", &keys).unwrap();
        config
            .decryption_attempt_order
            .insert(0, "HYBRID-Z".to_string());
        assert_eq!(
            orchestrator
                .decrypt_with_agility(&config, &blob, &keys)
                .unwrap(),
            b"x"
        );
    }

    #[test]
    fn test_unknown_active_suite_fails_encryption() {
        let (orchestrator, mut config, keys) = setup();
        config.active_suite_id = "HYBRID-Z".to_string();
        assert!(matches!(
            orchestrator.encrypt_active(&config, b"x", &keys),
            Err(CryptoError::HandlerNotFound(_))
        ));
    }
}
