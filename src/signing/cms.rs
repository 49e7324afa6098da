//! CMS signature envelope decoding.
//!
//! Callers deliver the detached signature either as raw BER/DER bytes or
//! wrapped in PEM-style delimiter lines (`-----BEGIN CMS-----`,
//! `-----BEGIN PKCS7-----`, and their END counterparts). The delimiters are
//! stripped, the base64 body is concatenated ignoring whitespace and CR,
//! and the decoded bytes must parse as a CMS `ContentInfo` before they are
//! allowed anywhere near the placeholder.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use cms::content_info::ContentInfo;
use der::Decode;

use crate::error::{Error, Result};

/// Decode a caller-supplied signature blob into validated DER bytes.
///
/// Returns the exact bytes that will be hex-encoded into the placeholder.
pub fn decode_signature(raw: &[u8]) -> Result<Vec<u8>> {
    let der_bytes = if looks_like_pem(raw) {
        decode_pem_body(raw)?
    } else {
        raw.to_vec()
    };

    ContentInfo::from_der(&der_bytes)
        .map_err(|e| Error::InvalidSignatureFormat(format!("CMS ContentInfo rejected: {}", e)))?;

    Ok(der_bytes)
}

fn looks_like_pem(raw: &[u8]) -> bool {
    raw.iter()
        .position(|b| !b.is_ascii_whitespace())
        .map(|start| raw[start..].starts_with(b"-----"))
        .unwrap_or(false)
}

fn decode_pem_body(raw: &[u8]) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(raw).map_err(|_| {
        Error::InvalidSignatureFormat("PEM-wrapped signature is not valid UTF-8".to_string())
    })?;

    let body: String = text
        .lines()
        .filter(|line| !line.trim_start().starts_with("-----"))
        .flat_map(|line| line.chars())
        .filter(|c| !c.is_whitespace())
        .collect();

    if body.is_empty() {
        return Err(Error::InvalidSignatureFormat(
            "PEM envelope contains no base64 body".to_string(),
        ));
    }

    BASE64
        .decode(body.as_bytes())
        .map_err(|e| Error::InvalidSignatureFormat(format!("base64 body rejected: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::testutil::synthetic_content_info;

    #[test]
    fn test_decode_raw_der() {
        let der_bytes = synthetic_content_info(16);
        let decoded = decode_signature(&der_bytes).unwrap();
        assert_eq!(decoded, der_bytes);
    }

    #[test]
    fn test_decode_pem_wrapped() {
        let der_bytes = synthetic_content_info(16);
        let body = BASE64.encode(&der_bytes);
        let pem = format!("-----BEGIN CMS-----\n{}\n-----END CMS-----\n", body);
        let decoded = decode_signature(pem.as_bytes()).unwrap();
        assert_eq!(decoded, der_bytes);
    }

    #[test]
    fn test_decode_pem_pkcs7_delimiters_with_cr() {
        let der_bytes = synthetic_content_info(48);
        let body = BASE64.encode(&der_bytes);
        // Split the body across lines with CRLF endings and stray spaces.
        let (head, tail) = body.split_at(body.len() / 2);
        let pem = format!(
            "-----BEGIN PKCS7-----\r\n{} \r\n {}\r\n-----END PKCS7-----\r\n",
            head, tail
        );
        let decoded = decode_signature(pem.as_bytes()).unwrap();
        assert_eq!(decoded, der_bytes);
    }

    #[test]
    fn test_reject_garbage_der() {
        let err = decode_signature(&[0xFF, 0x00, 0x12]).unwrap_err();
        assert!(matches!(err, Error::InvalidSignatureFormat(_)));
    }

    #[test]
    fn test_reject_bad_base64_body() {
        let pem = "-----BEGIN CMS-----\n!!!not base64!!!\n-----END CMS-----\n";
        let err = decode_signature(pem.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidSignatureFormat(_)));
    }

    #[test]
    fn test_reject_empty_pem_body() {
        let pem = "-----BEGIN CMS-----\n-----END CMS-----\n";
        let err = decode_signature(pem.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidSignatureFormat(_)));
    }

    #[test]
    fn test_reject_truncated_content_info() {
        let mut der_bytes = synthetic_content_info(16);
        der_bytes.truncate(der_bytes.len() - 4);
        let err = decode_signature(&der_bytes).unwrap_err();
        assert!(matches!(err, Error::InvalidSignatureFormat(_)));
    }
}
