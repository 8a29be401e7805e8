//! serialized diagnosis key cache.
//!
//! the read path never touches the repository: all GET traffic is answered
//! from a single contiguous buffer of pre-encoded diagnosis keys. the
//! refresh task replaces the buffer wholesale; readers take cheap
//! reference-counted snapshots that stay valid for the whole response even
//! when a replace happens underneath them.

use std::sync::RwLock;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use diagserve_types::{TemporaryExposureKey, wire};

/// a consistent (blob, last-modified) pair handed to one reader.
///
/// cloning is a reference-count bump on the underlying buffer; slicing via
/// [`Snapshot::after`] shares the same allocation.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    blob: Bytes,
    last_modified: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// the full serialized keyset.
    pub fn blob(&self) -> Bytes {
        self.blob.clone()
    }

    /// timestamp of the repository snapshot this blob was built from.
    /// `None` when the store was empty.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    /// byte length of the full keyset.
    pub fn len(&self) -> usize {
        self.blob.len()
    }

    /// whether the keyset is empty.
    pub fn is_empty(&self) -> bool {
        self.blob.is_empty()
    }

    /// the tail of the blob strictly after the record whose key bytes equal
    /// `cursor`.
    ///
    /// the zero cursor returns the whole blob; an absent cursor, or one
    /// matching the last record, returns an empty buffer. records are
    /// scanned in fixed 21-byte strides, comparing the leading 16 key
    /// bytes, without allocating.
    pub fn after(&self, cursor: &TemporaryExposureKey) -> Bytes {
        if cursor.is_zero() {
            return self.blob.clone();
        }

        let cursor = cursor.as_bytes().as_slice();
        for (i, record) in self.blob.chunks_exact(wire::DIAGNOSIS_KEY_SIZE).enumerate() {
            if &record[..TemporaryExposureKey::LEN] == cursor {
                return self.blob.slice((i + 1) * wire::DIAGNOSIS_KEY_SIZE..);
            }
        }

        Bytes::new()
    }
}

/// in-memory cache holding the current snapshot.
///
/// many concurrent readers, one writer at a time. a reader observes either
/// the pre- or the post-replace snapshot in full, never a mixture: the
/// critical section only swaps the two fields, and the buffers themselves
/// are immutable once published.
#[derive(Debug, Default)]
pub struct KeyCache {
    snapshot: RwLock<Snapshot>,
}

impl KeyCache {
    /// create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// atomically swap in a freshly serialized keyset.
    pub fn replace(&self, blob: Bytes, last_modified: Option<DateTime<Utc>>) {
        let mut guard = self.snapshot.write().expect("cache lock poisoned");
        *guard = Snapshot {
            blob,
            last_modified,
        };
    }

    /// take a snapshot handle for one response.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.read().expect("cache lock poisoned").clone()
    }
}
