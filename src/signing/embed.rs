//! Embedding the external signature into a prepared document.
//!
//! Second half of the protocol: consume the signing session, validate the
//! CMS blob, hex-encode it, pad to the reserved width, and splice it into
//! the placeholder span. Every byte outside the placeholder is untouched,
//! so the digest computed at preparation time keeps verifying.

use crate::error::{Error, Result};
use crate::session::SessionStore;

use super::cms::decode_signature;
use super::hex_upper;
use super::types::PreparedDocument;

/// Consume `session_id` and embed `signature_blob` into its document.
///
/// The session is consumed before the blob is examined, so any failure in
/// the later steps is terminal for that session and the caller must restart
/// from preparation.
pub fn embed(store: &SessionStore, session_id: &str, signature_blob: &[u8]) -> Result<Vec<u8>> {
    let prepared = store
        .consume(session_id)
        .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
    embed_into(prepared, signature_blob)
}

/// Embed a signature blob into an already-consumed prepared document.
pub fn embed_into(prepared: PreparedDocument, signature_blob: &[u8]) -> Result<Vec<u8>> {
    let der_bytes = decode_signature(signature_blob)?;

    let limit = prepared.placeholder.binary_capacity();
    if der_bytes.len() > limit {
        return Err(Error::SignatureTooLarge {
            limit,
            actual: der_bytes.len(),
        });
    }

    let mut buffer = prepared.buffer;
    let len_before = buffer.len();
    let hex_span = prepared.placeholder.hex_span();

    // Hex-encode and right-pad with zero digits to the full reserved width;
    // padding rather than truncation keeps every other offset in place.
    let hex = hex_upper(&der_bytes);
    let (filled, padding) = buffer[hex_span].split_at_mut(hex.len());
    filled.copy_from_slice(hex.as_bytes());
    padding.fill(b'0');

    debug_assert_eq!(buffer.len(), len_before);
    log::info!(
        "embedded {} byte signature into {} byte placeholder",
        der_bytes.len(),
        limit
    );

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::testutil::minimal_pdf;
    use crate::signing::prepare::{digest_byte_range, prepare};
    use crate::signing::testutil::synthetic_content_info;
    use crate::signing::types::PrepareOptions;

    fn prepared(capacity: usize) -> PreparedDocument {
        let options = PrepareOptions::default().with_reserved_capacity(capacity);
        prepare(&minimal_pdf(), &options).unwrap()
    }

    #[test]
    fn test_embed_preserves_length_and_digest() {
        let doc = prepared(512);
        let expected_digest = doc.digest().to_vec();
        let byte_range = *doc.byte_range();
        let algorithm = doc.algorithm();
        let len_before = doc.buffer().len();

        let blob = synthetic_content_info(300);
        let signed = embed_into(doc, &blob).unwrap();

        assert_eq!(signed.len(), len_before);
        let digest = digest_byte_range(&signed, &byte_range, algorithm).unwrap();
        assert_eq!(digest, expected_digest);
    }

    #[test]
    fn test_embedded_hex_matches_blob() {
        let doc = prepared(512);
        let hex_span = doc.placeholder().hex_span();
        let blob = synthetic_content_info(100);

        let signed = embed_into(doc, &blob).unwrap();
        let hex = &signed[hex_span];
        assert_eq!(&hex[..blob.len() * 2], hex_upper(&blob).as_bytes());
        assert!(hex[blob.len() * 2..].iter().all(|&b| b == b'0'));
    }

    #[test]
    fn test_exact_capacity_fits() {
        let doc = prepared(512);
        let capacity = doc.placeholder().binary_capacity();
        // Synthesize a blob of exactly the reserved size: DER framing for
        // this shape adds 23 bytes around the payload.
        let blob = synthetic_content_info(capacity - 23);
        assert_eq!(blob.len(), capacity);
        assert!(embed_into(doc, &blob).is_ok());
    }

    #[test]
    fn test_one_byte_over_capacity_fails() {
        let doc = prepared(512);
        let capacity = doc.placeholder().binary_capacity();
        let blob = synthetic_content_info(capacity - 22);
        assert_eq!(blob.len(), capacity + 1);

        let err = embed_into(doc, &blob).unwrap_err();
        match err {
            Error::SignatureTooLarge { limit, actual } => {
                assert_eq!(limit, capacity);
                assert_eq!(actual, capacity + 1);
            },
            other => panic!("expected SignatureTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_blob_rejected() {
        let doc = prepared(512);
        let err = embed_into(doc, b"\xde\xad\xbe\xef").unwrap_err();
        assert!(matches!(err, Error::InvalidSignatureFormat(_)));
    }

    #[test]
    fn test_hex_upper() {
        assert_eq!(hex_upper(&[0x00, 0xAB, 0x0F]), "00AB0F");
        assert_eq!(hex_upper(&[]), "");
    }
}
