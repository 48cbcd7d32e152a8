//! Engine lifecycle: cold-start load, background-loop coordination, and the
//! public API surface.

use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use tokio::sync::{broadcast, watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use causerie_net::{ChatTransport, HttpChatClient};
use causerie_shared::{media, Message};
use causerie_store::{BlobCache, Database, Outbox};

use crate::cache::ImageCache;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::events::{ChatEvent, EventBus};
use crate::state::Shared;
use crate::{hydrate, outbound, retry, sync};

/// The chat synchronization engine.
///
/// Owns the shared message log, both cache tiers, the durable stores and
/// the three background loops (sync, hydration, retry).  All loops are
/// cancelled together by [`shutdown`](Self::shutdown), which waits for
/// in-flight ticks to unwind before returning.
pub struct ChatEngine {
    inner: Arc<EngineInner>,
    tasks: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

/// State shared between the engine handle and its background tasks.
pub(crate) struct EngineInner {
    pub(crate) config: EngineConfig,
    /// The exclusion permit.  Every path that reads or mutates the log,
    /// the message database or a cache tier locks this mutex, and holds it
    /// across the network and file awaits of its tick.
    pub(crate) shared: Mutex<Shared>,
    /// Durable outbox; owns its own connection and is deliberately not
    /// covered by the permit.
    pub(crate) outbox: Outbox,
    pub(crate) transport: Arc<dyn ChatTransport>,
    pub(crate) events: EventBus,
    /// Out-of-band wakeup for the sync loop, signalled by the outbound
    /// pipeline after every dispatched send.
    pub(crate) sync_wakeup: Notify,
}

/// Open the stores and assemble the shared engine state.
pub(crate) fn build_inner(
    config: EngineConfig,
    transport: Arc<dyn ChatTransport>,
) -> Result<Arc<EngineInner>, EngineError> {
    let db_path = config.db_path()?;
    let db = Database::open_at(&db_path)?;
    let outbox = Outbox::open_at(&db_path)?;
    let blobs = BlobCache::open(config.resolve_blob_dir()?)?;
    let thumbs = ImageCache::new(config.memory_cache_bytes);

    Ok(Arc::new(EngineInner {
        config,
        shared: Mutex::new(Shared::new(db, blobs, thumbs)),
        outbox,
        transport,
        events: EventBus::new(),
        sync_wakeup: Notify::new(),
    }))
}

impl ChatEngine {
    /// Build an engine talking to the configured HTTP endpoint.
    pub fn new(config: EngineConfig) -> anyhow::Result<Self> {
        let transport: Arc<dyn ChatTransport> = Arc::new(HttpChatClient::new(
            config.server_url.clone(),
            config.http_timeout,
        )?);
        Self::with_transport(config, transport)
    }

    /// Build an engine over an arbitrary transport.  Tests drive the engine
    /// through a scripted one.
    pub fn with_transport(
        config: EngineConfig,
        transport: Arc<dyn ChatTransport>,
    ) -> anyhow::Result<Self> {
        let inner = build_inner(config, transport)?;
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            inner,
            tasks: Vec::new(),
            shutdown_tx,
        })
    }

    /// Populate the log from the store, emit
    /// [`ChatEvent::MessagesLoaded`], then start the three background
    /// loops.  The loops only begin ticking once the stored history is in
    /// memory.
    pub async fn start(&mut self) -> anyhow::Result<()> {
        {
            let mut shared = self.inner.shared.lock().await;
            let records = shared.db.get_all_messages()?;
            for record in records {
                match record.into_message() {
                    Ok(message) => shared.log.push(message),
                    Err(e) => warn!(error = %e, "skipping unreadable message row"),
                }
            }
            info!(count = shared.log.len(), "message log loaded");
        }
        self.inner.events.emit(ChatEvent::MessagesLoaded);

        let shutdown = self.shutdown_tx.subscribe();
        self.tasks
            .push(tokio::spawn(sync::run(self.inner.clone(), shutdown.clone())));
        self.tasks.push(tokio::spawn(hydrate::run(
            self.inner.clone(),
            shutdown.clone(),
        )));
        self.tasks
            .push(tokio::spawn(retry::run(self.inner.clone(), shutdown)));

        Ok(())
    }

    /// Stream of engine events.  Fire-and-forget: a subscriber that lags
    /// misses events, there is no replay.
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.inner.events.subscribe()
    }

    /// Send a text message to the configured channel.
    pub async fn send_text(&self, text: &str) {
        let config = &self.inner.config;
        outbound::send_text(&self.inner, text, &config.username, &config.channel).await;
    }

    /// Send the image file at `source` to the configured channel.
    pub async fn send_image(&self, source: &Path) {
        let config = &self.inner.config;
        outbound::send_image(&self.inner, source, &config.username, &config.channel).await;
    }

    /// Run one sync poll immediately, outside the regular interval.
    pub async fn sync_now(&self) {
        sync::tick(&self.inner).await;
    }

    /// Snapshot of the current log.  Cheap to take: decoded images are
    /// shared, not copied.
    pub async fn messages(&self) -> Vec<Message> {
        self.inner.shared.lock().await.log.clone()
    }

    /// Full-resolution image for the log entry at `index`, decoded from
    /// the disk blob tier.
    pub async fn full_image(&self, index: usize) -> Option<DynamicImage> {
        let shared = self.inner.shared.lock().await;
        let id = shared.log.get(index)?.id?;
        let image_id = shared.db.get_image_id(id).ok().flatten()?;
        let bytes = shared.blobs.read(image_id).await.ok().flatten()?;
        media::decode(&bytes).ok()
    }

    /// Signal every loop to stop and wait for in-flight ticks to unwind.
    pub async fn shutdown(&mut self) {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!(error = %e, "background task ended abnormally");
            }
        }
        info!("engine stopped");
    }
}
