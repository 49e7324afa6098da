//! # pades_sign
//!
//! Two-phase detached-signature protocol for PDF documents, the mechanical
//! half of PAdES: a signature placeholder and its covering byte ranges are
//! fixed *before* the cryptographic signature exists, and the externally
//! produced CMS blob is spliced in afterward without disturbing any byte
//! that was already hashed.
//!
//! ## Protocol
//!
//! 1. **Prepare** ([`signing::prepare()`]): append a signature field as an
//!    incremental update, reserve a fixed-capacity `/Contents` hex
//!    placeholder, rewrite the pre-sized `/ByteRange` in place, and hash
//!    the two covered spans.
//! 2. **Sign externally**: the caller sends the digest to an HSM, smart
//!    card, or remote signing service and gets back a CMS `ContentInfo`.
//! 3. **Embed** ([`signing::embed()`]): consume the signing session, validate
//!    the blob, hex-encode and pad it, and overwrite exactly the
//!    placeholder region.
//!
//! The load-bearing invariant: re-hashing the `/ByteRange` spans of the
//! final signed file yields the digest returned at preparation time.
//!
//! ## Quick Start
//!
//! ```ignore
//! use pades_sign::api::SigningService;
//! use pades_sign::config::SigningConfig;
//!
//! let service = SigningService::new(SigningConfig::default());
//! let receipt = service.prepare(&std::fs::read("contract.pdf")?)?;
//!
//! // digest goes to the external signer, CMS bytes come back
//! let cms_bytes = remote_signer.sign(&receipt.digest)?;
//!
//! let signed = service.embed(&receipt.session_id, &cms_bytes)?;
//! std::fs::write("contract_signed.pdf", signed)?;
//! ```
//!
//! ## Out of scope
//!
//! Visual signature appearances, generic PDF object-graph parsing,
//! certificate/trust-chain validation, and signature production itself are
//! collaborator concerns; see [`document::DocumentModel`] for the boundary
//! this crate draws around PDF structure.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Geometry for field placement
pub mod geometry;

// PDF document model collaborator boundary
pub mod document;

// The two-phase signing protocol
pub mod signing;

// In-flight session state
pub mod session;

// High-level service facade
pub mod api;

// Re-exports
pub use api::{PrepareReceipt, SigningService};
pub use config::SigningConfig;
pub use document::{DocumentModel, IncrementalUpdater, SerializedUpdate};
pub use error::{Error, Result};
pub use session::{SessionStore, SigningSession, DEFAULT_SESSION_TTL};
pub use signing::{
    digest_byte_range, embed, prepare, ByteRange, DigestAlgorithm, Placeholder, PrepareOptions,
    PreparedDocument, SignatureFieldSpec, DEFAULT_RESERVED_CAPACITY,
};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
