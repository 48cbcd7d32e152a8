//! The outbound pipeline: best-effort delivery with durable failure
//! capture.
//!
//! Only transport-level failures are queued for retry.  A server that
//! answered, even with an error status, made its decision; the status is
//! mapped to a user-visible event and the message is not re-sent.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::{debug, warn};
use uuid::Uuid;

use causerie_shared::{media, Message};
use causerie_store::FailedUpload;

use crate::engine::EngineInner;
use crate::error::EngineError;
use crate::events::ChatEvent;

/// Which send path a status came from; the two map a few statuses to
/// different user-visible reasons.
#[derive(Clone, Copy)]
enum SendKind {
    Text,
    Image,
}

/// Send a text message.  Empty text is rejected up front with a
/// user-visible error and no network traffic.
pub(crate) async fn send_text(inner: &EngineInner, text: &str, from: &str, to: &str) {
    if text.is_empty() {
        inner.events.emit(ChatEvent::GenericError {
            reason: "message can't be empty".to_string(),
        });
        return;
    }

    let message = Message::text(from, to, text);
    let json = match serde_json::to_string(&message) {
        Ok(json) => json,
        Err(e) => {
            // Serialization faults are transport-class: capture for retry.
            warn!(error = %e, "failed to serialize outbound message");
            enqueue(inner, FailedUpload::text(from, to, text));
            return;
        }
    };

    match inner.transport.send_text(&json).await {
        Ok(status) => {
            report_status(inner, status, SendKind::Text);
            inner.sync_wakeup.notify_one();
        }
        Err(e) => {
            debug!(error = %e, "text send failed at transport level, queueing");
            enqueue(inner, FailedUpload::text(from, to, text));
        }
    }
}

/// Send the image file at `source`.
///
/// The source is decoded up front: a missing or undecodable file is a user
/// error, reported immediately and never queued, since retrying could not
/// help.
/// The encoded upload goes through a temp file that is removed on every
/// exit path.
pub(crate) async fn send_image(inner: &EngineInner, source: &Path, from: &str, to: &str) {
    let image = match media::decode_file(source) {
        Ok(image) => image,
        Err(e) => {
            inner.events.emit(ChatEvent::SendFailed {
                reason: format!("cannot read image: {e}"),
            });
            return;
        }
    };

    let temp_dir = match inner.config.resolve_blob_dir() {
        Ok(dir) => dir,
        Err(e) => {
            inner.events.emit(ChatEvent::SendFailed {
                reason: format!("cannot resolve temp directory: {e}"),
            });
            return;
        }
    };
    let temp = match TempUpload::create(&temp_dir, &image) {
        Ok(temp) => temp,
        Err(e) => {
            inner.events.emit(ChatEvent::SendFailed {
                reason: format!("cannot create temp file: {e}"),
            });
            return;
        }
    };

    match inner.transport.send_image(temp.path()).await {
        Ok(status) => {
            report_status(inner, status, SendKind::Image);
            inner.sync_wakeup.notify_one();
        }
        Err(e) => {
            debug!(error = %e, "image send failed at transport level, queueing");
            // Queue the original source reference, not the temp file: the
            // temp file is gone by the time the retry loop runs.
            enqueue(
                inner,
                FailedUpload::image(from, to, source.to_string_lossy()),
            );
        }
    }
    // `temp` dropped here: the file is removed on success and failure alike.
}

/// Map a non-2xx status onto the user-visible event taxonomy.
fn report_status(inner: &EngineInner, status: u16, kind: SendKind) {
    match (status, kind) {
        (200..=299, _) => {}
        (500..=599, _) => inner.events.emit(ChatEvent::ServerError),
        (404, _) => inner.events.emit(ChatEvent::NotFound {
            reason: "user not found".to_string(),
        }),
        (409, SendKind::Image) => inner.events.emit(ChatEvent::Conflict {
            reason: "image already exists".to_string(),
        }),
        (413, SendKind::Text) => inner.events.emit(ChatEvent::PayloadTooLarge {
            reason: "message is too big".to_string(),
        }),
        (413, SendKind::Image) => inner.events.emit(ChatEvent::PayloadTooLarge {
            reason: "image is too big".to_string(),
        }),
        (other, _) => inner.events.emit(ChatEvent::SendFailed {
            reason: format!("unknown error, http status {other}"),
        }),
    }
}

/// Persist a failed send for the retry loop.  If even that fails, the send
/// is lost and the user hears about it.
fn enqueue(inner: &EngineInner, record: FailedUpload) {
    if let Err(e) = inner.outbox.insert(&record) {
        warn!(error = %e, "failed to queue outbound message for retry");
        inner.events.emit(ChatEvent::SendFailed {
            reason: "message could not be queued for retry".to_string(),
        });
    }
}

/// Encoded upload written to a uniquely named temp file; removed on drop so
/// every exit path cleans up.
struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    fn create(dir: &Path, image: &DynamicImage) -> Result<Self, EngineError> {
        let path = dir.join(format!("{}.upload.png", Uuid::new_v4()));
        let bytes = media::encode_png(image)?;
        std::fs::write(&path, bytes)?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            debug!(path = %self.path.display(), error = %e, "temp upload not removed");
        }
    }
}

#[cfg(test)]
mod tests {
    use causerie_shared::{media, Message};
    use image::DynamicImage;

    use crate::testutil::{test_inner, Call, ScriptedTransport};

    use super::*;

    #[tokio::test]
    async fn empty_text_never_reaches_the_wire() {
        let dir = tempfile::tempdir().unwrap();
        let transport = ScriptedTransport::new();
        let inner = test_inner(dir.path(), transport.clone());
        let mut events = inner.events.subscribe();

        send_text(&inner, "", "tea-0", "1@channel").await;

        assert!(matches!(
            events.try_recv().unwrap(),
            ChatEvent::GenericError { .. }
        ));
        assert!(transport.calls().is_empty());
        assert!(inner.outbox.all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_queues_exactly_one_text_record() {
        let dir = tempfile::tempdir().unwrap();
        let transport = ScriptedTransport::new();
        transport.push_text(Err(ScriptedTransport::transport_error()));
        let inner = test_inner(dir.path(), transport);

        send_text(&inner, "hello", "tea-0", "1@channel").await;

        let queued = inner.outbox.all().unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].text.as_deref(), Some("hello"));
        assert_eq!(queued[0].image_path, None);
        assert_eq!(queued[0].from, "tea-0");
        assert_eq!(queued[0].to, "1@channel");
    }

    #[tokio::test]
    async fn sent_json_matches_the_wire_format() {
        let dir = tempfile::tempdir().unwrap();
        let transport = ScriptedTransport::new();
        let inner = test_inner(dir.path(), transport.clone());

        send_text(&inner, "hello", "tea-0", "1@channel").await;

        let calls = transport.calls();
        let Call::SendText(json) = &calls[0] else {
            panic!("expected a text send, got {calls:?}");
        };
        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.id, None);
        assert_eq!(message.payload.as_text(), Some("hello"));
        assert!(json.contains("\"Text\""));
    }

    #[tokio::test]
    async fn rejection_statuses_map_to_events_without_queueing() {
        let dir = tempfile::tempdir().unwrap();
        let transport = ScriptedTransport::new();
        transport.push_text(Ok(503));
        transport.push_text(Ok(404));
        transport.push_text(Ok(413));
        transport.push_text(Ok(418));
        let inner = test_inner(dir.path(), transport);
        let mut events = inner.events.subscribe();

        send_text(&inner, "a", "u", "c").await;
        send_text(&inner, "b", "u", "c").await;
        send_text(&inner, "c", "u", "c").await;
        send_text(&inner, "d", "u", "c").await;

        assert!(matches!(events.try_recv().unwrap(), ChatEvent::ServerError));
        assert!(matches!(
            events.try_recv().unwrap(),
            ChatEvent::NotFound { .. }
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            ChatEvent::PayloadTooLarge { .. }
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            ChatEvent::SendFailed { .. }
        ));
        assert!(inner.outbox.all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreadable_image_source_fails_without_retry_record() {
        let dir = tempfile::tempdir().unwrap();
        let transport = ScriptedTransport::new();
        let inner = test_inner(dir.path(), transport.clone());
        let mut events = inner.events.subscribe();

        send_image(&inner, Path::new("/nonexistent/photo.png"), "u", "c").await;

        assert!(matches!(
            events.try_recv().unwrap(),
            ChatEvent::SendFailed { .. }
        ));
        assert!(transport.calls().is_empty());
        assert!(inner.outbox.all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn image_transport_failure_queues_the_original_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.png");
        let png = media::encode_png(&DynamicImage::new_rgba8(4, 4)).unwrap();
        std::fs::write(&source, png).unwrap();

        let transport = ScriptedTransport::new();
        transport.push_image(Err(ScriptedTransport::transport_error()));
        let inner = test_inner(dir.path(), transport);

        send_image(&inner, &source, "tea-0", "1@channel").await;

        let queued = inner.outbox.all().unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].text, None);
        assert_eq!(
            queued[0].image_path.as_deref(),
            Some(source.to_string_lossy().as_ref())
        );
    }

    #[tokio::test]
    async fn temp_upload_is_removed_on_every_exit_path() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.png");
        let png = media::encode_png(&DynamicImage::new_rgba8(4, 4)).unwrap();
        std::fs::write(&source, png).unwrap();

        let transport = ScriptedTransport::new();
        transport.push_image(Ok(200));
        transport.push_image(Err(ScriptedTransport::transport_error()));
        let inner = test_inner(dir.path(), transport.clone());

        send_image(&inner, &source, "u", "c").await;
        send_image(&inner, &source, "u", "c").await;

        // The transport saw a real file both times...
        let upload_paths: Vec<_> = transport
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SendImage { path, existed } => Some((path, existed)),
                _ => None,
            })
            .collect();
        assert_eq!(upload_paths.len(), 2);
        assert!(upload_paths.iter().all(|(_, existed)| *existed));

        // ...and none of the temp files survived the calls.
        for (path, _) in upload_paths {
            assert!(!path.exists());
        }
    }

    #[tokio::test]
    async fn image_conflict_status_maps_to_conflict_event() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.png");
        let png = media::encode_png(&DynamicImage::new_rgba8(2, 2)).unwrap();
        std::fs::write(&source, png).unwrap();

        let transport = ScriptedTransport::new();
        transport.push_image(Ok(409));
        let inner = test_inner(dir.path(), transport);
        let mut events = inner.events.subscribe();

        send_image(&inner, &source, "u", "c").await;

        assert!(matches!(
            events.try_recv().unwrap(),
            ChatEvent::Conflict { .. }
        ));
    }
}
