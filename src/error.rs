//! Error types for the signing protocol.
//!
//! Every fallible operation in this crate returns one of the closed set of
//! error kinds below; collaborator failures are wrapped with the operation
//! context rather than surfaced as bare strings.

/// Result type alias for signing protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds that can occur while preparing or finalizing a signature.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input bytes are not a usable PDF revision
    #[error("Invalid PDF document: {0}")]
    InvalidDocument(String),

    /// The requested placeholder capacity cannot hold a signature
    #[error("Reserved capacity too small: {requested} bytes requested, at least {required} required")]
    ReservationTooSmall {
        /// Minimum binary capacity the placeholder must have
        required: usize,
        /// Capacity the caller asked for
        requested: usize,
    },

    /// The named hash algorithm is not one of SHA-256/384/512
    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The document model collaborator failed to append or serialize
    #[error("Document model error: {0}")]
    DocumentModel(String),

    /// No live session with the given identifier (never created, expired,
    /// or already consumed)
    #[error("Signing session not found: {0}")]
    SessionNotFound(String),

    /// The supplied signature bytes do not decode as CMS `ContentInfo`
    #[error("Invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    /// The decoded signature exceeds the reserved placeholder capacity
    #[error("Signature too large: {actual} bytes, placeholder holds {limit}")]
    SignatureTooLarge {
        /// Reserved binary capacity of the placeholder
        limit: usize,
        /// Size of the signature that was offered
        actual: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
