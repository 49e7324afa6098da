//! High-level signing service facade.
//!
//! Transport-agnostic equivalent of the two caller-facing operations:
//! prepare a PDF for signing (returning a session id and the digest the
//! external signer must sign over) and embed the returned CMS signature.
//! An HTTP layer, queue consumer, or test harness drives this directly.
//!
//! ```ignore
//! use pades_sign::api::SigningService;
//! use pades_sign::config::SigningConfig;
//!
//! let service = SigningService::new(SigningConfig::default());
//!
//! let receipt = service.prepare(&pdf_bytes)?;
//! // ... hand receipt.digest to the external signer ...
//! let signed_pdf = service.embed(&receipt.session_id, &cms_bytes)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::config::SigningConfig;
use crate::error::Result;
use crate::session::SessionStore;
use crate::signing::{embed, hex_lower, prepare};

/// Success payload of a prepare call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareReceipt {
    /// Opaque single-use session identifier
    pub session_id: String,
    /// Hex-encoded document digest for the external signer
    pub digest: String,
    /// Name of the digest algorithm, e.g. `"SHA-256"`
    pub algorithm: String,
}

/// The signing service: a session store plus configuration.
#[derive(Debug, Default)]
pub struct SigningService {
    config: SigningConfig,
    store: SessionStore,
}

impl SigningService {
    /// Create a service from configuration.
    pub fn new(config: SigningConfig) -> Self {
        let store = SessionStore::new(config.session_ttl);
        Self { config, store }
    }

    /// The underlying session store.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// The service configuration.
    pub fn config(&self) -> &SigningConfig {
        &self.config
    }

    /// Prepare a PDF for signing and open a session for it.
    ///
    /// Returns the session identifier together with the hex-encoded digest
    /// of the covered byte ranges.
    pub fn prepare(&self, pdf: &[u8]) -> Result<PrepareReceipt> {
        let options = self.config.prepare_options();
        let prepared = prepare(pdf, &options)?;
        let digest = hex_lower(prepared.digest());
        let algorithm = prepared.algorithm().name().to_string();

        let session_id = if self.config.use_scratch_dir {
            let scratch = tempfile::tempdir()?;
            self.store.create_with_scratch(prepared, scratch)
        } else {
            self.store.create(prepared)
        };

        log::info!("session {} awaiting external signature", session_id);
        Ok(PrepareReceipt {
            session_id,
            digest,
            algorithm,
        })
    }

    /// Embed an externally produced CMS signature and close the session.
    ///
    /// Single-shot: the session is consumed before the blob is validated,
    /// so any failure is terminal and the caller must prepare again.
    pub fn embed(&self, session_id: &str, cms_bytes: &[u8]) -> Result<Vec<u8>> {
        let signed = embed(&self.store, session_id, cms_bytes)?;
        log::info!("session {} finished: {} byte signed document", session_id, signed.len());
        Ok(signed)
    }
}
