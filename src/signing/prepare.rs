//! Placeholder reservation and document-digest computation.
//!
//! This is the first half of the two-phase protocol: append a signature
//! field whose `/Contents` is a zeroed, fixed-capacity hex placeholder,
//! rewrite the pre-sized `/ByteRange` entry in place once the final offsets
//! are known, and hash the two covered spans. The resulting digest stays
//! valid for as long as only the placeholder region of the buffer mutates.

use crate::document::{DocumentModel, IncrementalUpdater};
use crate::error::{Error, Result};

use super::byterange::ByteRange;
use super::types::{
    DigestAlgorithm, Placeholder, PrepareOptions, PreparedDocument, MIN_RESERVED_CAPACITY,
};

/// Prepare a PDF revision for a detached signature.
///
/// Loads `pdf` into the built-in incremental updater and delegates to
/// [`prepare_with_model`].
pub fn prepare(pdf: &[u8], options: &PrepareOptions) -> Result<PreparedDocument> {
    let mut model = IncrementalUpdater::new(pdf.to_vec())?;
    prepare_with_model(&mut model, options)
}

/// Prepare a document for signing through an arbitrary document model.
pub fn prepare_with_model<M: DocumentModel>(
    model: &mut M,
    options: &PrepareOptions,
) -> Result<PreparedDocument> {
    if options.reserved_capacity < MIN_RESERVED_CAPACITY {
        return Err(Error::ReservationTooSmall {
            required: MIN_RESERVED_CAPACITY,
            requested: options.reserved_capacity,
        });
    }

    let hex_digits = options.reserved_capacity * 2;
    model.append_signature_field(&options.field, hex_digits)?;
    let update = model.serialize()?;

    let placeholder = Placeholder::new(update.contents_span.clone(), hex_digits)?;
    let mut buffer = update.bytes;

    // The placeholder span is now fixed; every offset below derives from it.
    let byte_range = ByteRange::around_placeholder(buffer.len(), &placeholder);
    byte_range.write_into(&mut buffer, update.byte_range_span)?;
    byte_range.validate(buffer.len(), placeholder.span())?;

    let digest = digest_byte_range(&buffer, &byte_range, options.digest_algorithm)?;
    log::info!(
        "prepared document: {} bytes, {} reserved, {} digest",
        buffer.len(),
        options.reserved_capacity,
        options.digest_algorithm.name()
    );

    Ok(PreparedDocument {
        buffer,
        byte_range,
        placeholder,
        algorithm: options.digest_algorithm,
        digest,
    })
}

/// Hash the two spans covered by `byte_range`, in order.
///
/// Pure function: a verifier holding the final signed file and its embedded
/// `/ByteRange` re-derives exactly the digest returned at preparation time.
pub fn digest_byte_range(
    buffer: &[u8],
    byte_range: &ByteRange,
    algorithm: DigestAlgorithm,
) -> Result<Vec<u8>> {
    let spans = byte_range.spans(buffer)?;
    Ok(algorithm.digest_parts(&spans))
}
