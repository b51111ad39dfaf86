//! Suite registry: maps suite ids to crypto handlers.
//!
//! Handlers are registered as factories and constructed on first use, so a
//! catalog with many suites does not pay algorithm setup for suites that
//! never decrypt anything. Construction is memoized in place; repeated
//! lookups return the same handler instance.

use crate::config::{SuiteDefinition, SuiteFlavor};
use crate::crypto::bundle;
use crate::crypto::handlers::hybrid::HybridHandler;
use crate::crypto::handlers::legacy::LegacyHandler;
use crate::crypto::handlers::CryptoHandler;
use crate::crypto::provider::AlgorithmProvider;
use crate::error::{CryptoError, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

type HandlerFactory = Box<dyn Fn() -> Result<Arc<dyn CryptoHandler>> + Send + Sync>;

enum HandlerEntry {
    Factory(HandlerFactory),
    Instance(Arc<dyn CryptoHandler>),
}

pub struct HandlerRegistry {
    entries: RwLock<HashMap<String, HandlerEntry>>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Build a registry from a suite catalog. Every suite's algorithms are
    /// resolved against the provider here so that a misconfigured catalog
    /// fails at startup, then the handler itself is still built lazily.
    pub fn from_catalog(
        catalog: &[SuiteDefinition],
        provider: Arc<AlgorithmProvider>,
    ) -> Result<Self> {
        let registry = Self::new();
        for suite in catalog {
            // Construct once to validate, discard, and register a factory.
            build_handler(suite, &provider)?;

            let suite = suite.clone();
            let provider = Arc::clone(&provider);
            registry.register_factory(
                suite.id.clone(),
                Box::new(move || build_handler(&suite, &provider)),
            );
        }
        Ok(registry)
    }

    pub fn register_factory(&self, suite_id: String, factory: HandlerFactory) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(suite_id, HandlerEntry::Factory(factory));
    }

    pub fn register_instance(&self, handler: Arc<dyn CryptoHandler>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            handler.suite_id().to_string(),
            HandlerEntry::Instance(handler),
        );
    }

    /// Look up the handler for a suite, constructing and memoizing it on
    /// first access.
    pub fn get_handler(&self, suite_id: &str) -> Result<Arc<dyn CryptoHandler>> {
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            match entries.get(suite_id) {
                Some(HandlerEntry::Instance(handler)) => return Ok(Arc::clone(handler)),
                Some(HandlerEntry::Factory(_)) => {}
                None => return Err(CryptoError::HandlerNotFound(suite_id.to_string())),
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        // Another thread may have constructed it between the locks.
        match entries.get(suite_id) {
            Some(HandlerEntry::Instance(handler)) => Ok(Arc::clone(handler)),
            Some(HandlerEntry::Factory(factory)) => {
                let handler = factory()?;
                debug!(suite = suite_id, "constructed crypto handler");
                entries.insert(
                    suite_id.to_string(),
                    HandlerEntry::Instance(Arc::clone(&handler)),
                );
                Ok(handler)
            }
            None => Err(CryptoError::HandlerNotFound(suite_id.to_string())),
        }
    }

    /// Pick the registered suite named in a bundle header, if any.
    ///
    /// `None` means the blob carries no readable header or names a suite
    /// this registry does not know; the caller falls back to trying suites
    /// in its configured order.
    pub fn select_handler_for_bytes(&self, raw: &[u8]) -> Option<String> {
        let suite_id = bundle::peek_suite_id(raw)?;
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        if entries.contains_key(&suite_id) {
            Some(suite_id)
        } else {
            None
        }
    }

    pub fn registered_suites(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<String> = entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn contains(&self, suite_id: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.contains_key(suite_id)
    }

    /// Drop all registrations. Test isolation hook.
    pub fn reset(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }
}

fn build_handler(
    suite: &SuiteDefinition,
    provider: &AlgorithmProvider,
) -> Result<Arc<dyn CryptoHandler>> {
    Ok(match suite.flavor {
        SuiteFlavor::Hybrid => Arc::new(HybridHandler::new(suite, provider)?),
        SuiteFlavor::LegacyClassical => Arc::new(LegacyHandler::new(suite, provider)?),
    })
}
