//! Process-wide store of in-flight signing sessions.
//!
//! A session is created when a document is prepared and holds the prepared
//! buffer until the external signer comes back with the CMS blob. Sessions
//! are single-use: consuming one removes it atomically, so no two embed
//! calls can both succeed against the same identifier. Abandoned sessions
//! are swept opportunistically on every store access so an unfinished
//! prepare request cannot leak its buffer indefinitely.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use rand::rngs::OsRng;
use rand::RngCore;
use tempfile::TempDir;

use crate::signing::hex_lower;
use crate::signing::types::PreparedDocument;

/// Default session expiry window.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(15 * 60);

/// Random bytes in a session identifier (128 bits, hex-encoded to 32 chars).
const SESSION_ID_BYTES: usize = 16;

/// A prepared document awaiting its signature.
///
/// Owned exclusively by the store until consumed. The optional scratch
/// directory is removed when the session is consumed, expired, or dropped.
#[derive(Debug)]
pub struct SigningSession {
    prepared: PreparedDocument,
    created_at: Instant,
    scratch: Option<TempDir>,
}

impl SigningSession {
    fn new(prepared: PreparedDocument, scratch: Option<TempDir>) -> Self {
        Self {
            prepared,
            created_at: Instant::now(),
            scratch,
        }
    }

    /// Age of this session.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Path of the per-session scratch directory, if one was attached.
    pub fn scratch_path(&self) -> Option<&Path> {
        self.scratch.as_ref().map(|dir| dir.path())
    }
}

/// Concurrent map from opaque session identifiers to prepared documents.
#[derive(Debug)]
pub struct SessionStore {
    inner: Mutex<HashMap<String, SigningSession>>,
    ttl: Duration,
}

impl SessionStore {
    /// Create a store with the given expiry window.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// The configured expiry window.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store a prepared document and return its fresh session identifier.
    pub fn create(&self, prepared: PreparedDocument) -> String {
        self.insert(SigningSession::new(prepared, None))
    }

    /// Store a prepared document along with a scoped scratch directory.
    ///
    /// The directory is deleted when the session ends, however it ends.
    pub fn create_with_scratch(&self, prepared: PreparedDocument, scratch: TempDir) -> String {
        self.insert(SigningSession::new(prepared, Some(scratch)))
    }

    fn insert(&self, session: SigningSession) -> String {
        let id = new_session_id();
        let mut sessions = self.lock();
        Self::sweep(&mut sessions, self.ttl);
        sessions.insert(id.clone(), session);
        log::debug!("created signing session {} ({} live)", id, sessions.len());
        id
    }

    /// Read access to a session's prepared document; does not consume.
    pub fn get(&self, session_id: &str) -> Option<PreparedDocument> {
        let mut sessions = self.lock();
        Self::sweep(&mut sessions, self.ttl);
        sessions
            .get(session_id)
            .map(|session| session.prepared.clone())
    }

    /// Atomically remove and return a session's prepared document.
    ///
    /// At most one caller can succeed per identifier; the session's scratch
    /// directory is released here.
    pub fn consume(&self, session_id: &str) -> Option<PreparedDocument> {
        let mut sessions = self.lock();
        Self::sweep(&mut sessions, self.ttl);
        sessions.remove(session_id).map(|session| {
            log::debug!("consumed signing session {}", session_id);
            session.prepared
        })
    }

    /// Remove every session older than `max_age`; returns how many.
    pub fn expire_older_than(&self, max_age: Duration) -> usize {
        let mut sessions = self.lock();
        Self::sweep(&mut sessions, max_age)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store holds no live sessions.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SigningSession>> {
        // A panic while holding the lock leaves only droppable state behind,
        // so recover the map rather than poisoning every later request.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sweep(sessions: &mut HashMap<String, SigningSession>, max_age: Duration) -> usize {
        let before = sessions.len();
        sessions.retain(|id, session| {
            let live = session.age() < max_age;
            if !live {
                log::info!("expiring signing session {} after {:?}", id, session.age());
            }
            live
        });
        before - sessions.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

/// Generate a cryptographically random, unguessable session identifier.
fn new_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex_lower(&bytes)
}
