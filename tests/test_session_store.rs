//! Session store behavior under concurrent access and expiry.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pades_sign::{prepare, PrepareOptions, PreparedDocument, SessionStore};

fn fixture_pdf() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let catalog_offset = out.len();
    out.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
    let pages_offset = out.len();
    out.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");
    let page_offset = out.len();
    out.extend_from_slice(b"3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>\nendobj\n");
    let xref_offset = out.len();
    out.extend_from_slice(b"xref\n0 4\n0000000000 65535 f \n");
    for offset in [catalog_offset, pages_offset, page_offset] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer\n<< /Size 4 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n%%EOF\n", xref_offset).as_bytes());
    out
}

fn prepared_document() -> PreparedDocument {
    let options = PrepareOptions::default().with_reserved_capacity(128);
    prepare(&fixture_pdf(), &options).expect("fixture prepares")
}

#[test]
fn test_concurrent_consume_succeeds_exactly_once() {
    let store = Arc::new(SessionStore::default());
    let id = store.create(prepared_document());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            let id = id.clone();
            thread::spawn(move || store.consume(&id).is_some())
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|handle| handle.join().expect("consumer thread panicked"))
        .filter(|&won| won)
        .count();

    assert_eq!(successes, 1, "exactly one concurrent consume may win");
    assert!(store.is_empty());
}

#[test]
fn test_concurrent_create_yields_distinct_ids() {
    let store = Arc::new(SessionStore::default());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.create(prepared_document()))
        })
        .collect();

    let mut ids: Vec<String> = handles
        .into_iter()
        .map(|handle| handle.join().expect("creator thread panicked"))
        .collect();
    ids.sort();
    ids.dedup();

    assert_eq!(ids.len(), 8, "session ids must be unique");
    assert_eq!(store.len(), 8);
}

#[test]
fn test_get_then_consume() {
    let store = SessionStore::default();
    let id = store.create(prepared_document());

    let peeked = store.get(&id).expect("get does not consume");
    let consumed = store.consume(&id).expect("consume after get");
    assert_eq!(peeked.digest(), consumed.digest());
    assert!(store.get(&id).is_none());
}

#[test]
fn test_short_ttl_expires_before_consume() {
    let store = SessionStore::new(Duration::from_millis(10));
    let id = store.create(prepared_document());

    thread::sleep(Duration::from_millis(50));
    assert!(store.consume(&id).is_none(), "expired session must not be consumable");
}

#[test]
fn test_explicit_expiry_sweep() {
    let store = SessionStore::default();
    store.create(prepared_document());
    store.create(prepared_document());
    let fresh = store.create(prepared_document());

    // Nothing is older than an hour yet.
    assert_eq!(store.expire_older_than(Duration::from_secs(3600)), 0);
    assert_eq!(store.len(), 3);

    // Everything is older than zero.
    assert_eq!(store.expire_older_than(Duration::ZERO), 3);
    assert!(store.get(&fresh).is_none());
}
