use thiserror::Error;

/// Kind of primitive requested from the algorithm provider.
///
/// Used in [`CryptoError::AlgorithmUnavailable`] so the message names what
/// category of algorithm was missing without guessing at a substitute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    ClassicalKem,
    PqcKem,
    Aead,
    Kdf,
    Pbkdf,
}

impl std::fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AlgorithmKind::ClassicalKem => "classical KEM",
            AlgorithmKind::PqcKem => "PQC KEM",
            AlgorithmKind::Aead => "AEAD cipher",
            AlgorithmKind::Kdf => "KDF",
            AlgorithmKind::Pbkdf => "PBKDF",
        };
        f.write_str(name)
    }
}

/// Error type for the encryption core.
///
/// Messages never contain passphrases, derived keys, plaintext or key
/// material. Suite ids and sizes are fine.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Requested algorithm is not registered with the provider. Fatal at
    /// suite registration time; never silently substituted.
    #[error("{kind} algorithm not available: {name}")]
    AlgorithmUnavailable { kind: AlgorithmKind, name: String },

    /// Malformed or wrong-length key bytes.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Bundle header does not match the handler's expected format or suite.
    /// Recoverable: the orchestrator moves on to the next handler.
    #[error("format mismatch: {0}")]
    FormatMismatch(String),

    /// AEAD tag verification failed. Indistinguishable from "wrong key" to
    /// avoid oracle leaks; recoverable at the orchestrator level.
    #[error("authentication failed")]
    Authentication,

    /// Every configured suite was tried and none decrypted the input.
    /// Carries attempted suite ids only.
    #[error("decryption failed; attempted suites: {}", attempted.join(", "))]
    AggregateDecryption { attempted: Vec<String> },

    /// Private key export attempted without explicit confirmation.
    #[error("private key export requires explicit confirmation")]
    ExportConfirmation,

    /// No handler registered for the given suite id.
    #[error("no handler registered for suite: {0}")]
    HandlerNotFound(String),

    /// Operation not supported by this handler (e.g. encrypting with a
    /// decrypt-only legacy suite).
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Suite id named by the configuration is not in the catalog.
    #[error("unknown suite id: {0}")]
    UnknownSuite(String),

    /// Malformed container bytes (truncated, trailing data, bad lengths).
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Key derivation (PBKDF or KDF) failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Key file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CryptoError {
    /// Whether a failed decryption attempt with this error may be retried
    /// with another handler. Misconfiguration aborts the attempt loop.
    pub fn is_recoverable_attempt(&self) -> bool {
        matches!(
            self,
            CryptoError::FormatMismatch(_)
                | CryptoError::Authentication
                | CryptoError::InvalidKey(_)
                | CryptoError::Encoding(_)
                | CryptoError::UnsupportedOperation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CryptoError>;
