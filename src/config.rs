//! Configuration for the signing service.

use std::time::Duration;

use crate::geometry::Rect;
use crate::session::DEFAULT_SESSION_TTL;
use crate::signing::types::{
    DigestAlgorithm, PrepareOptions, SignatureFieldSpec, DEFAULT_RESERVED_CAPACITY,
};

/// Signing service configuration.
#[derive(Debug, Clone)]
pub struct SigningConfig {
    /// Binary capacity reserved for each signature.
    pub reserved_capacity: usize,

    /// Digest algorithm for document hashing.
    pub digest_algorithm: DigestAlgorithm,

    /// How long an unconsumed session stays alive.
    pub session_ttl: Duration,

    /// Form field name for appended signature fields.
    pub field_name: String,

    /// Page the signature widget targets (0-indexed).
    pub page_index: usize,

    /// Widget rectangle in user-space coordinates.
    pub field_rect: Rect,

    /// Whether to attach a per-session scratch directory.
    pub use_scratch_dir: bool,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SigningConfig {
    /// Create a configuration with defaults matching the protocol's
    /// recommended values (16 KiB reservation, SHA-256, 15 minute TTL).
    pub fn new() -> Self {
        let field = SignatureFieldSpec::default();
        Self {
            reserved_capacity: DEFAULT_RESERVED_CAPACITY,
            digest_algorithm: DigestAlgorithm::Sha256,
            session_ttl: DEFAULT_SESSION_TTL,
            field_name: field.field_name,
            page_index: field.page_index,
            field_rect: field.rect,
            use_scratch_dir: true,
        }
    }

    /// Set the reserved binary capacity.
    pub fn with_reserved_capacity(mut self, capacity: usize) -> Self {
        self.reserved_capacity = capacity;
        self
    }

    /// Set the digest algorithm.
    pub fn with_digest_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.digest_algorithm = algorithm;
        self
    }

    /// Set the session expiry window.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set the signature field name.
    pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = name.into();
        self
    }

    /// Set the widget page and rectangle.
    pub fn with_field_placement(mut self, page_index: usize, rect: Rect) -> Self {
        self.page_index = page_index;
        self.field_rect = rect;
        self
    }

    /// Disable the per-session scratch directory.
    pub fn without_scratch_dir(mut self) -> Self {
        self.use_scratch_dir = false;
        self
    }

    /// Build the per-request preparation options.
    pub fn prepare_options(&self) -> PrepareOptions {
        PrepareOptions {
            field: SignatureFieldSpec {
                field_name: self.field_name.clone(),
                page_index: self.page_index,
                rect: self.field_rect,
            },
            reserved_capacity: self.reserved_capacity,
            digest_algorithm: self.digest_algorithm,
        }
    }
}
