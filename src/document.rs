//! PDF document model collaborator boundary.
//!
//! The reservation engine does not parse PDFs itself; it talks to a
//! [`DocumentModel`] that can append a signature field as an incremental
//! update and serialize the result while reporting exactly where the
//! `/Contents` placeholder and the `/ByteRange` entry landed.
//!
//! [`IncrementalUpdater`] is the built-in implementation. It appends a new
//! revision (signature dictionary, widget annotation, catalog with an
//! `/AcroForm`, classic xref section with a `/Prev` trailer) after the last
//! `%%EOF`, leaving every prior byte untouched. It deliberately stops short
//! of generic object-graph parsing: the previous revision is inspected with
//! a handful of lexical scans, which is enough for documents whose trailer
//! and catalog live in plain (non-compressed) objects.

use std::io::Write;
use std::ops::Range;
use std::time::{SystemTime, UNIX_EPOCH};

use lazy_static::lazy_static;
use regex::bytes::Regex;

use crate::error::{Error, Result};
use crate::signing::byterange::ByteRange;
use crate::signing::types::SignatureFieldSpec;

lazy_static! {
    static ref SIZE_RE: Regex = Regex::new(r"/Size\s+(\d+)").unwrap();
    static ref ROOT_RE: Regex = Regex::new(r"/Root\s+(\d+)\s+(\d+)\s+R").unwrap();
    static ref PAGES_RE: Regex = Regex::new(r"/Pages\s+(\d+)\s+(\d+)\s+R").unwrap();
    static ref STARTXREF_RE: Regex = Regex::new(r"startxref\s+(\d+)").unwrap();
    static ref OBJ_RE: Regex = Regex::new(r"(?m)^(\d+)\s+(\d+)\s+obj\b").unwrap();
}

/// A serialized revision with the located signature spans.
#[derive(Debug, Clone)]
pub struct SerializedUpdate {
    /// The complete document bytes, placeholder still zeroed
    pub bytes: Vec<u8>,
    /// Span of the `/Contents` hex string, angle brackets included
    pub contents_span: Range<usize>,
    /// Span of the fixed-width text between the `/ByteRange` brackets
    pub byte_range_span: Range<usize>,
}

/// Capability the reservation engine requires from a PDF document model.
pub trait DocumentModel {
    /// Append a signature field whose `/Contents` reserves
    /// `placeholder_hex_digits` hex digits and whose `/ByteRange` is
    /// pre-sized for a later in-place rewrite.
    fn append_signature_field(
        &mut self,
        spec: &SignatureFieldSpec,
        placeholder_hex_digits: usize,
    ) -> Result<()>;

    /// Serialize the updated revision and report the placeholder spans.
    ///
    /// Must be stable: calling it twice without an intervening append
    /// yields identical bytes.
    fn serialize(&self) -> Result<SerializedUpdate>;
}

/// Trailer facts scraped from the previous revision.
#[derive(Debug, Clone, Copy)]
struct RevisionInfo {
    size: u32,
    root: (u32, u16),
    prev_startxref: usize,
}

#[derive(Debug, Clone)]
struct PendingField {
    spec: SignatureFieldSpec,
    hex_digits: usize,
    signing_time: String,
}

/// Minimal incremental-update writer for appending one signature field.
#[derive(Debug)]
pub struct IncrementalUpdater {
    original: Vec<u8>,
    revision: RevisionInfo,
    pending: Option<PendingField>,
}

impl IncrementalUpdater {
    /// Load the last revision of `original` for incremental updating.
    pub fn new(original: Vec<u8>) -> Result<Self> {
        if !original.starts_with(b"%PDF-") {
            let head = String::from_utf8_lossy(&original[..original.len().min(8)]).into_owned();
            return Err(Error::InvalidDocument(format!(
                "expected '%PDF-' header, found '{}'",
                head
            )));
        }
        let revision = Self::scan_revision(&original)?;
        Ok(Self {
            original,
            revision,
            pending: None,
        })
    }

    /// Object number the appended signature dictionary will get.
    fn sig_object(&self) -> u32 {
        self.revision.size
    }

    fn scan_revision(data: &[u8]) -> Result<RevisionInfo> {
        let size = last_capture(&SIZE_RE, data)
            .ok_or_else(|| Error::InvalidDocument("trailer has no /Size entry".to_string()))?;
        let root = last_capture_pair(&ROOT_RE, data)
            .ok_or_else(|| Error::InvalidDocument("trailer has no /Root entry".to_string()))?;
        let prev_startxref = last_capture(&STARTXREF_RE, data)
            .ok_or_else(|| Error::InvalidDocument("no startxref marker".to_string()))?;
        Ok(RevisionInfo {
            size: size as u32,
            root: (root.0 as u32, root.1 as u16),
            prev_startxref: prev_startxref as usize,
        })
    }

    /// Locate the `/Pages` reference inside the current catalog object.
    ///
    /// The catalog must be stored as a plain indirect object; catalogs
    /// packed into object streams are out of scope for this updater.
    fn pages_ref(&self) -> Result<(u32, u16)> {
        let (num, gen) = self.revision.root;
        // Match whole object headers at line starts; a bare substring scan
        // for "1 0 obj" would also hit the tail of "11 0 obj".
        let body_start = OBJ_RE
            .captures_iter(&self.original)
            .filter(|caps| {
                parse_decimal(&caps[1]) == Some(u64::from(num))
                    && parse_decimal(&caps[2]) == Some(u64::from(gen))
            })
            .last()
            .and_then(|caps| caps.get(0).map(|m| m.end()))
            .ok_or_else(|| {
                Error::InvalidDocument(format!(
                    "catalog object {} {} R not found as a plain indirect object",
                    num, gen
                ))
            })?;
        let body_end = find_subslice(&self.original[body_start..], b"endobj")
            .map(|rel| body_start + rel)
            .unwrap_or(self.original.len());
        let body = &self.original[body_start..body_end];
        PAGES_RE
            .captures(body)
            .and_then(|caps| {
                let num = parse_decimal(&caps[1])?;
                let gen = parse_decimal(&caps[2])?;
                Some((num as u32, gen as u16))
            })
            .ok_or_else(|| Error::InvalidDocument("catalog has no /Pages entry".to_string()))
    }
}

impl DocumentModel for IncrementalUpdater {
    fn append_signature_field(
        &mut self,
        spec: &SignatureFieldSpec,
        placeholder_hex_digits: usize,
    ) -> Result<()> {
        if self.pending.is_some() {
            return Err(Error::DocumentModel(
                "a signature field is already pending in this update".to_string(),
            ));
        }
        if placeholder_hex_digits == 0 || placeholder_hex_digits % 2 != 0 {
            return Err(Error::DocumentModel(format!(
                "placeholder must reserve an even, non-zero hex digit count, got {}",
                placeholder_hex_digits
            )));
        }
        self.pending = Some(PendingField {
            spec: spec.clone(),
            hex_digits: placeholder_hex_digits,
            signing_time: pdf_date_now(),
        });
        log::debug!(
            "pending signature field '{}' reserving {} hex digits",
            spec.field_name,
            placeholder_hex_digits
        );
        Ok(())
    }

    fn serialize(&self) -> Result<SerializedUpdate> {
        let pending = self.pending.as_ref().ok_or_else(|| {
            Error::DocumentModel("no signature field appended before serialize".to_string())
        })?;
        let pages = self.pages_ref()?;

        let sig_id = self.sig_object();
        let widget_id = sig_id + 1;
        let catalog_id = sig_id + 2;

        let mut out = self.original.clone();
        if out.last() != Some(&b'\n') {
            out.push(b'\n');
        }

        // Signature dictionary. The /ByteRange entry is pre-sized with a
        // zeroed fixed-width rendering so its later rewrite cannot move any
        // byte, and the /Contents span is recorded as it is written.
        let sig_offset = out.len();
        write!(
            out,
            "{} 0 obj\n<< /Type /Sig /Filter /Adobe.PPKLite /SubFilter /ETSI.CAdES.detached /M ({}) /ByteRange [",
            sig_id, pending.signing_time
        )?;
        let byte_range_span = out.len()..out.len() + ByteRange::fixed_width();
        out.extend_from_slice(ByteRange::new([0, 0, 0, 0]).render_fixed_width()?.as_bytes());
        out.extend_from_slice(b"] /Contents ");
        let contents_span = out.len()..out.len() + pending.hex_digits + 2;
        out.push(b'<');
        out.extend(std::iter::repeat(b'0').take(pending.hex_digits));
        out.push(b'>');
        out.extend_from_slice(b" >>\nendobj\n");

        // Widget annotation carrying the field. Not wired into any page's
        // /Annots array, and the spec's page_index is ignored here: there is
        // no visual appearance to show and the page object may live in an
        // object stream this updater cannot rewrite.
        let widget_offset = out.len();
        let [llx, lly, urx, ury] = pending.spec.rect.corners();
        write!(
            out,
            "{} 0 obj\n<< /Type /Annot /Subtype /Widget /FT /Sig /T ({}) /Rect [{} {} {} {}] /F 132 /V {} 0 R >>\nendobj\n",
            widget_id,
            escape_pdf_string(&pending.spec.field_name),
            llx, lly, urx, ury,
            sig_id
        )?;

        // Replacement catalog pointing at the same page tree, now with an
        // /AcroForm holding the signature field.
        let catalog_offset = out.len();
        write!(
            out,
            "{} 0 obj\n<< /Type /Catalog /Pages {} {} R /AcroForm << /Fields [{} 0 R] /SigFlags 3 >> >>\nendobj\n",
            catalog_id, pages.0, pages.1, widget_id
        )?;

        // Cross-reference section for the three new objects.
        let xref_offset = out.len();
        writeln!(out, "xref")?;
        writeln!(out, "0 1")?;
        writeln!(out, "0000000000 65535 f ")?;
        writeln!(out, "{} 3", sig_id)?;
        for offset in [sig_offset, widget_offset, catalog_offset] {
            writeln!(out, "{:010} 00000 n ", offset)?;
        }
        writeln!(out, "trailer")?;
        writeln!(
            out,
            "<< /Size {} /Root {} 0 R /Prev {} >>",
            catalog_id + 1,
            catalog_id,
            self.revision.prev_startxref
        )?;
        writeln!(out, "startxref")?;
        writeln!(out, "{}", xref_offset)?;
        writeln!(out, "%%EOF")?;

        Ok(SerializedUpdate {
            bytes: out,
            contents_span,
            byte_range_span,
        })
    }
}

fn last_capture(re: &Regex, data: &[u8]) -> Option<u64> {
    re.captures_iter(data)
        .last()
        .and_then(|caps| parse_decimal(&caps[1]))
}

fn last_capture_pair(re: &Regex, data: &[u8]) -> Option<(u64, u64)> {
    re.captures_iter(data).last().and_then(|caps| {
        let first = parse_decimal(&caps[1])?;
        let second = parse_decimal(&caps[2])?;
        Some((first, second))
    })
}

fn parse_decimal(digits: &[u8]) -> Option<u64> {
    std::str::from_utf8(digits).ok()?.parse().ok()
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Escape special characters in a PDF literal string.
fn escape_pdf_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '(' => result.push_str("\\("),
            ')' => result.push_str("\\)"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            _ => result.push(c),
        }
    }
    result
}

/// Current UTC time as a PDF date string, `D:YYYYMMDDHHmmSSZ`.
fn pdf_date_now() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let (days, rem) = (secs / 86400, secs % 86400);

    // Civil-from-days conversion, proleptic Gregorian.
    let z = days as i64 + 719_468;
    let era = z / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);

    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}Z",
        year,
        month,
        day,
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}


#[cfg(test)]
mod tests {
    use super::testutil::minimal_pdf;
    use super::*;

    #[test]
    fn test_rejects_non_pdf() {
        let err = IncrementalUpdater::new(b"NotAPDF".to_vec()).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
    }

    #[test]
    fn test_rejects_missing_trailer() {
        let err = IncrementalUpdater::new(b"%PDF-1.4\nhello".to_vec()).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
    }

    #[test]
    fn test_scan_revision_facts() {
        let updater = IncrementalUpdater::new(minimal_pdf()).unwrap();
        assert_eq!(updater.revision.size, 4);
        assert_eq!(updater.revision.root, (1, 0));
        assert_eq!(updater.pages_ref().unwrap(), (2, 0));
    }

    #[test]
    fn test_pages_ref_skips_suffix_header_matches() {
        // Object 11's header ends with the bytes "1 0 obj"; the catalog
        // lookup must not mistake it for object 1.
        let mut out = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n");
        out.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
        out.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [11 0 R] /Count 1 >>\nendobj\n");
        out.extend_from_slice(
            b"11 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>\nendobj\n",
        );
        out.extend_from_slice(b"trailer\n<< /Size 12 /Root 1 0 R >>\nstartxref\n9\n%%EOF\n");

        let updater = IncrementalUpdater::new(out).unwrap();
        assert_eq!(updater.pages_ref().unwrap(), (2, 0));
    }

    #[test]
    fn test_serialize_with_many_pages() {
        // Enough pages that double-digit object numbers follow the catalog.
        let mut out = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n");
        out.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
        let kids: Vec<String> = (3..13).map(|n| format!("{} 0 R", n)).collect();
        out.extend_from_slice(
            format!(
                "2 0 obj\n<< /Type /Pages /Kids [{}] /Count 10 >>\nendobj\n",
                kids.join(" ")
            )
            .as_bytes(),
        );
        for n in 3..13 {
            out.extend_from_slice(
                format!(
                    "{} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>\nendobj\n",
                    n
                )
                .as_bytes(),
            );
        }
        out.extend_from_slice(b"trailer\n<< /Size 13 /Root 1 0 R >>\nstartxref\n9\n%%EOF\n");

        let mut updater = IncrementalUpdater::new(out).unwrap();
        updater
            .append_signature_field(&SignatureFieldSpec::default(), 64)
            .unwrap();
        let update = updater.serialize().unwrap();
        assert_eq!(&update.bytes[update.contents_span.clone()][..1], b"<");
    }

    #[test]
    fn test_serialize_requires_pending_field() {
        let updater = IncrementalUpdater::new(minimal_pdf()).unwrap();
        assert!(matches!(updater.serialize(), Err(Error::DocumentModel(_))));
    }

    #[test]
    fn test_serialize_preserves_prior_bytes() {
        let original = minimal_pdf();
        let mut updater = IncrementalUpdater::new(original.clone()).unwrap();
        updater
            .append_signature_field(&SignatureFieldSpec::default(), 64)
            .unwrap();
        let update = updater.serialize().unwrap();
        assert_eq!(&update.bytes[..original.len()], &original[..]);
        assert!(update.bytes.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn test_serialize_locates_placeholder() {
        let mut updater = IncrementalUpdater::new(minimal_pdf()).unwrap();
        updater
            .append_signature_field(&SignatureFieldSpec::default(), 64)
            .unwrap();
        let update = updater.serialize().unwrap();

        let contents = &update.bytes[update.contents_span.clone()];
        assert_eq!(contents.len(), 66);
        assert_eq!(contents[0], b'<');
        assert_eq!(contents[65], b'>');
        assert!(contents[1..65].iter().all(|&b| b == b'0'));

        let byte_range = &update.bytes[update.byte_range_span.clone()];
        assert_eq!(byte_range.len(), ByteRange::fixed_width());
        assert!(byte_range.iter().all(|&b| b == b'0' || b == b' '));
    }

    #[test]
    fn test_serialize_is_stable() {
        let mut updater = IncrementalUpdater::new(minimal_pdf()).unwrap();
        updater
            .append_signature_field(&SignatureFieldSpec::default(), 64)
            .unwrap();
        let first = updater.serialize().unwrap();
        let second = updater.serialize().unwrap();
        assert_eq!(first.bytes, second.bytes);
        assert_eq!(first.contents_span, second.contents_span);
    }

    #[test]
    fn test_second_append_rejected() {
        let mut updater = IncrementalUpdater::new(minimal_pdf()).unwrap();
        let spec = SignatureFieldSpec::default();
        updater.append_signature_field(&spec, 64).unwrap();
        assert!(updater.append_signature_field(&spec, 64).is_err());
    }

    #[test]
    fn test_escape_pdf_string() {
        assert_eq!(escape_pdf_string("Signature"), "Signature");
        assert_eq!(escape_pdf_string("Sig (1)"), "Sig \\(1\\)");
        assert_eq!(escape_pdf_string("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_pdf_date_shape() {
        let date = pdf_date_now();
        assert!(date.starts_with("D:20"));
        assert!(date.ends_with('Z'));
        assert_eq!(date.len(), 17);
    }
}
