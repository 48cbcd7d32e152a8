//! Shared engine state guarded by the single exclusion permit.

use causerie_shared::{now_millis, Message};
use causerie_store::{BlobCache, Database};

use crate::cache::ImageCache;

/// Everything the synchronized paths read or mutate.
///
/// The message database and both cache tiers live inside the same mutex as
/// the log, which turns "only touched while holding the permit" from a
/// convention into a property of the type system.  Tick bodies lock once at
/// the top and hand fields of `&mut Shared` down to helpers; nothing below
/// a tick ever locks again (the permit is not reentrant).
pub(crate) struct Shared {
    /// Append-only, insertion-ordered mirror of the remote history.  Order
    /// equals ascending server-assigned id order.
    pub(crate) log: Vec<Message>,
    /// Durable message log.
    pub(crate) db: Database,
    /// Disk tier: original encoded blobs, unbounded.
    pub(crate) blobs: BlobCache,
    /// Memory tier: decoded, display-scaled thumbnails, LRU-bounded.
    pub(crate) thumbs: ImageCache,
    /// Highest image id minted so far; see [`Shared::next_image_id`].
    pub(crate) last_image_id: i64,
}

impl Shared {
    pub(crate) fn new(db: Database, blobs: BlobCache, thumbs: ImageCache) -> Self {
        Self {
            log: Vec::new(),
            db,
            blobs,
            thumbs,
            last_image_id: 0,
        }
    }

    /// Server id of the newest message in the log, 0 when empty.
    pub(crate) fn last_known_id(&self) -> i64 {
        self.log.last().and_then(|m| m.id).unwrap_or(0)
    }

    /// Mint a locally unique image id: the current millisecond timestamp,
    /// bumped when two mints land in the same millisecond so blob file
    /// names never collide.
    pub(crate) fn next_image_id(&mut self) -> i64 {
        let id = now_millis().max(self.last_image_id + 1);
        self.last_image_id = id;
        id
    }
}
