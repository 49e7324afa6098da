//! The two-phase detached-signature protocol.
//!
//! Phase one ([`prepare()`]) appends a signature field whose `/Contents` is a
//! fixed-capacity hex placeholder, computes the `/ByteRange` covering
//! everything except that placeholder, and hashes the covered spans. Phase
//! two ([`embed()`]) splices an externally produced CMS signature into the
//! placeholder without moving a single hashed byte.
//!
//! The protocol implements the mechanical half of PAdES (ETSI TS 102 778):
//! the cryptographic signature itself is produced elsewhere, e.g. by an HSM
//! or a remote signing service, over the digest returned from preparation.
//!
//! ## Reference
//!
//! - ISO 32000-1:2008 Section 12.8 - Digital Signatures
//! - ETSI TS 102 778 - PAdES

pub mod byterange;
pub mod cms;
pub mod embed;
pub mod prepare;
pub mod types;

pub use byterange::ByteRange;
pub use self::cms::decode_signature;
pub use embed::{embed, embed_into};
pub use prepare::{digest_byte_range, prepare, prepare_with_model};
pub use types::{
    DigestAlgorithm, Placeholder, PrepareOptions, PreparedDocument, SignatureFieldSpec,
    DEFAULT_RESERVED_CAPACITY, MIN_RESERVED_CAPACITY,
};

/// Uppercase hex encoding, as written into the `/Contents` placeholder.
pub(crate) fn hex_upper(bytes: &[u8]) -> String {
    const HEX_CHARS: &[u8] = b"0123456789ABCDEF";
    let mut hex = String::with_capacity(bytes.len() * 2);
    for &byte in bytes {
        hex.push(HEX_CHARS[(byte >> 4) as usize] as char);
        hex.push(HEX_CHARS[(byte & 0x0F) as usize] as char);
    }
    hex
}

/// Lowercase hex encoding, as reported to callers for digests and ids.
pub(crate) fn hex_lower(bytes: &[u8]) -> String {
    const HEX_CHARS: &[u8] = b"0123456789abcdef";
    let mut hex = String::with_capacity(bytes.len() * 2);
    for &byte in bytes {
        hex.push(HEX_CHARS[(byte >> 4) as usize] as char);
        hex.push(HEX_CHARS[(byte & 0x0F) as usize] as char);
    }
    hex
}
