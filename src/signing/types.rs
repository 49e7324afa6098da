//! Core types shared by the reservation and embedding engines.

use std::ops::Range;

use sha2::{Digest, Sha256, Sha384, Sha512};

use super::byterange::ByteRange;
use crate::error::{Error, Result};
use crate::geometry::Rect;

/// Smallest binary capacity a placeholder may reserve.
///
/// A real CMS `SignedData` with even a single bare certificate is far larger
/// than this, and 70 bytes of hex digits (140 characters) always leaves room
/// for the fixed-width `/ByteRange` text whose offsets are computed relative
/// to the placeholder.
pub const MIN_RESERVED_CAPACITY: usize = 70;

/// Default reserved capacity, sized for CMS structures that carry full
/// certificate chains and timestamp tokens.
pub const DEFAULT_RESERVED_CAPACITY: usize = 16384;

/// Digest algorithm used to hash the covered byte ranges.
///
/// Only the SHA-2 family is accepted; anything else is rejected when parsing
/// the algorithm name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    /// SHA-256 (default)
    #[default]
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl DigestAlgorithm {
    /// Parse an algorithm name such as `"sha256"` or `"SHA-384"`.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha384" => Ok(DigestAlgorithm::Sha384),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(Error::UnsupportedAlgorithm(name.to_string())),
        }
    }

    /// Get the name of this algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha384 => "SHA-384",
            DigestAlgorithm::Sha512 => "SHA-512",
        }
    }

    /// Digest output length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    /// Hash a sequence of byte slices, fed to the hasher in order.
    pub fn digest_parts(&self, parts: &[&[u8]]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                for part in parts {
                    hasher.update(part);
                }
                hasher.finalize().to_vec()
            },
            DigestAlgorithm::Sha384 => {
                let mut hasher = Sha384::new();
                for part in parts {
                    hasher.update(part);
                }
                hasher.finalize().to_vec()
            },
            DigestAlgorithm::Sha512 => {
                let mut hasher = Sha512::new();
                for part in parts {
                    hasher.update(part);
                }
                hasher.finalize().to_vec()
            },
        }
    }
}

/// Specification of the signature field appended to the document.
#[derive(Debug, Clone)]
pub struct SignatureFieldSpec {
    /// Form field name of the signature
    pub field_name: String,
    /// Page the widget annotation belongs to (0-indexed).
    ///
    /// Only meaningful to document models that can rewrite page objects.
    /// The built-in [`IncrementalUpdater`](crate::document::IncrementalUpdater)
    /// leaves the widget off-page and ignores this value.
    pub page_index: usize,
    /// Widget rectangle in user-space coordinates
    pub rect: Rect,
}

impl Default for SignatureFieldSpec {
    fn default() -> Self {
        Self {
            field_name: "Signature".to_string(),
            page_index: 0,
            rect: Rect::from_corners(325.0, 25.0, 550.0, 80.0),
        }
    }
}

/// Options for preparing a document for signing.
#[derive(Debug, Clone)]
pub struct PrepareOptions {
    /// Signature field to append
    pub field: SignatureFieldSpec,
    /// Binary capacity reserved for the CMS signature
    pub reserved_capacity: usize,
    /// Digest algorithm the external signer will sign over
    pub digest_algorithm: DigestAlgorithm,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            field: SignatureFieldSpec::default(),
            reserved_capacity: DEFAULT_RESERVED_CAPACITY,
            digest_algorithm: DigestAlgorithm::Sha256,
        }
    }
}

impl PrepareOptions {
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

    /// Set the signature field specification.
    pub fn with_field(mut self, field: SignatureFieldSpec) -> Self {
        self.field = field;
        self
    }
}

/// The reserved `/Contents` region inside a serialized document.
///
/// The span covers the whole hex string literal including the `<` and `>`
/// delimiters; the capacity is fixed at creation and never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    span: Range<usize>,
    hex_digits: usize,
}

impl Placeholder {
    /// Create a placeholder from its located span and hex-digit count.
    ///
    /// The span must be exactly `hex_digits + 2` bytes (hex digits plus the
    /// two angle-bracket delimiters).
    pub fn new(span: Range<usize>, hex_digits: usize) -> Result<Self> {
        if span.len() != hex_digits + 2 {
            return Err(Error::DocumentModel(format!(
                "placeholder span is {} bytes, expected {} hex digits plus delimiters",
                span.len(),
                hex_digits
            )));
        }
        Ok(Self { span, hex_digits })
    }

    /// Full span of the placeholder, delimiters included.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Span of the hex digits, between the delimiters.
    pub fn hex_span(&self) -> Range<usize> {
        self.span.start + 1..self.span.end - 1
    }

    /// Number of reserved hex digits.
    pub fn hex_digits(&self) -> usize {
        self.hex_digits
    }

    /// Binary capacity: the largest signature, in bytes, that fits.
    pub fn binary_capacity(&self) -> usize {
        self.hex_digits / 2
    }
}

/// A serialized document with a pending signature placeholder.
///
/// Produced by [`prepare`](super::prepare::prepare); immutable until
/// embedding, at which point only the placeholder region may change.
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    pub(crate) buffer: Vec<u8>,
    pub(crate) byte_range: ByteRange,
    pub(crate) placeholder: Placeholder,
    pub(crate) algorithm: DigestAlgorithm,
    pub(crate) digest: Vec<u8>,
}

impl PreparedDocument {
    /// The serialized bytes, placeholder still empty.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// The covering byte ranges, as written into `/ByteRange`.
    pub fn byte_range(&self) -> &ByteRange {
        &self.byte_range
    }

    /// The reserved placeholder region.
    pub fn placeholder(&self) -> &Placeholder {
        &self.placeholder
    }

    /// The digest algorithm the external signer must use.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// The document digest over the covered byte ranges.
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }
}
