//! # causerie-store
//!
//! Durable local state for the Causerie engine, backed by SQLite and a flat
//! blob directory.  Three stores live here:
//!
//! - the append-only message log (`messages` table, keyed by server id),
//! - the outbox of transport-failed sends (`failed_uploads` table),
//! - the on-disk image blob cache (one PNG per locally minted image id).
//!
//! The message [`Database`] is a synchronous handle meant to be owned by the
//! engine's exclusion permit; the [`Outbox`] deliberately owns a separate
//! connection so outbound sends never need that permit.

pub mod blobs;
pub mod database;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod outbox;

mod error;

pub use blobs::BlobCache;
pub use database::Database;
pub use error::StoreError;
pub use models::*;
pub use outbox::Outbox;
