//! The retry loop: replays transport-failed sends from the durable outbox.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::engine::EngineInner;
use crate::outbound;

/// Run the retry loop until shutdown.
pub(crate) async fn run(inner: Arc<EngineInner>, mut shutdown: watch::Receiver<bool>) {
    let interval = inner.config.poll_interval;
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tokio::time::sleep(interval) => {}
        }
        tick(&inner).await;
    }
    debug!("retry loop stopped");
}

/// Drain the outbox in storage order, replaying each record through the
/// outbound pipeline and deleting it once the attempt has been dispatched,
/// regardless of the replay's outcome.  A replay that fails at the
/// transport level re-enters the pipeline's failure handling and files a
/// fresh record, so delivery is at-least-once.
pub(crate) async fn tick(inner: &EngineInner) {
    let pending = match inner.outbox.all() {
        Ok(pending) => pending,
        Err(e) => {
            warn!(error = %e, "cannot read outbox");
            return;
        }
    };
    if pending.is_empty() {
        return;
    }

    debug!(count = pending.len(), "replaying failed sends");
    for record in pending {
        match (&record.text, &record.image_path) {
            (_, Some(path)) => {
                outbound::send_image(inner, Path::new(path), &record.from, &record.to).await;
            }
            (Some(text), None) => {
                outbound::send_text(inner, text, &record.from, &record.to).await;
            }
            (None, None) => {
                warn!(local_id = record.local_id, "discarding malformed outbox row");
            }
        }

        if let Err(e) = inner.outbox.delete(record.local_id) {
            warn!(local_id = record.local_id, error = %e, "failed to delete outbox row");
        }
    }
}
