//! The hydration loop: resolves image payloads the sync loop left empty.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, trace};

use causerie_net::ChatTransport;
use causerie_shared::{media, Message, MessagePayload};
use causerie_store::BlobCache;

use crate::cache::ImageCache;
use crate::engine::EngineInner;
use crate::events::ChatEvent;
use crate::error::EngineError;

/// Run the hydration loop until shutdown.  Ticks on a slightly longer
/// interval than the sync loop so the two do not contend every cycle.
pub(crate) async fn run(inner: Arc<EngineInner>, mut shutdown: watch::Receiver<bool>) {
    let interval = inner.config.poll_interval + inner.config.hydration_offset;
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tokio::time::sleep(interval) => {}
        }
        tick(&inner).await;
    }
    debug!("hydration loop stopped");
}

/// One in-order scan over the log.  Per-message failures are swallowed and
/// the unresolved slot is retried on a later tick; the scan never stops
/// early and never reorders the log.
pub(crate) async fn tick(inner: &EngineInner) {
    let mut guard = inner.shared.lock().await;
    let shared = &mut *guard;

    for index in 0..shared.log.len() {
        let message = &mut shared.log[index];
        if !message.payload.needs_hydration() {
            continue;
        }
        let Some(id) = message.id else { continue };

        let image_id = match shared.db.get_image_id(id) {
            Ok(Some(image_id)) => image_id,
            Ok(None) => {
                trace!(id, "image message stored without a blob id");
                continue;
            }
            Err(e) => {
                debug!(id, error = %e, "image id lookup failed");
                continue;
            }
        };

        match resolve(
            &*inner.transport,
            &shared.blobs,
            &mut shared.thumbs,
            message,
            image_id,
        )
        .await
        {
            Ok(()) => inner.events.emit(ChatEvent::NewImage { index }),
            Err(e) => debug!(id, image_id, error = %e, "hydration failed, will retry"),
        }
    }
}

/// Resolve one image payload: memory tier first, then the disk blob, then
/// a network download (which also backfills the blob).  Attaches the
/// display-scaled image to the payload and the memory cache.
///
/// Callers already hold the permit and pass the relevant `Shared` fields
/// down; this function must never try to lock it again.
pub(crate) async fn resolve(
    transport: &dyn ChatTransport,
    blobs: &BlobCache,
    thumbs: &mut ImageCache,
    message: &mut Message,
    image_id: i64,
) -> Result<(), EngineError> {
    let MessagePayload::Image { link, decoded } = &mut message.payload else {
        return Ok(());
    };

    if let Some(thumb) = thumbs.get(image_id) {
        *decoded = Some(thumb);
        return Ok(());
    }

    let bytes = match blobs.read(image_id).await? {
        Some(bytes) => bytes,
        None => {
            let fetched = transport.download_image(link).await?;
            blobs.write(image_id, &fetched).await?;
            fetched.to_vec()
        }
    };

    let thumb = Arc::new(media::fit_to_envelope(&media::decode(&bytes)?));
    thumbs.insert(image_id, thumb.clone());
    *decoded = Some(thumb);
    Ok(())
}
