//! The sync loop: periodic polling of the remote endpoint.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use causerie_store::MessageRecord;

use crate::engine::EngineInner;
use crate::events::ChatEvent;
use crate::hydrate;

/// Run the sync loop until shutdown.  Ticks every `poll_interval`, and
/// immediately when the outbound pipeline signals a dispatched send.
pub(crate) async fn run(inner: Arc<EngineInner>, mut shutdown: watch::Receiver<bool>) {
    let interval = inner.config.poll_interval;
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = inner.sync_wakeup.notified() => {}
            _ = tokio::time::sleep(interval) => {}
        }
        tick(&inner).await;
    }
    debug!("sync loop stopped");
}

/// One poll: fetch everything newer than the last known id, persist and
/// append in server order, then report.
///
/// Failures are isolated per message, never per batch: a message that
/// cannot be persisted is dropped and logged; a message whose eager image
/// fetch fails is appended with an empty decoded slot for the hydration
/// loop to finish later.  A poll that fails at the transport level is a
/// no-op tick.
pub(crate) async fn tick(inner: &EngineInner) {
    let mut guard = inner.shared.lock().await;
    let shared = &mut *guard;

    let since_id = shared.last_known_id();
    let (batch, status) = match inner.transport.fetch_new_messages(since_id).await {
        Ok(fetched) => (fetched.messages, Some(fetched.status)),
        Err(e) => {
            debug!(error = %e, "poll failed, retrying next tick");
            (Vec::new(), None)
        }
    };

    let initial_size = shared.log.len();
    for mut message in batch {
        let image_id = message.is_image().then(|| shared.next_image_id());

        let record = match MessageRecord::from_message(&message, image_id) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "dropping message the server did not number");
                continue;
            }
        };
        if let Err(e) = shared.db.insert_message(&record) {
            warn!(id = record.id, error = %e, "dropping message that failed to persist");
            continue;
        }

        if let Some(image_id) = image_id {
            // Eager hydration; on failure the slot stays empty and the
            // hydration loop picks it up on a later tick.
            if let Err(e) = hydrate::resolve(
                &*inner.transport,
                &shared.blobs,
                &mut shared.thumbs,
                &mut message,
                image_id,
            )
            .await
            {
                debug!(image_id, error = %e, "eager image fetch failed");
            }
        }

        shared.log.push(message);
    }
    let updated_size = shared.log.len();
    drop(guard);

    if updated_size > initial_size {
        inner.events.emit(ChatEvent::NewMessages {
            initial_size,
            updated_size,
        });
    }
    if status.is_some_and(|s| s >= 500) {
        inner.events.emit(ChatEvent::ServerError);
    }
}
