//! Test support: a scripted [`ChatTransport`] and engine-state builders.

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use image::DynamicImage;

use causerie_net::{ChatTransport, FetchedMessages, NetError};
use causerie_shared::{media, Message, MessagePayload};

use crate::config::EngineConfig;
use crate::engine::{build_inner, EngineInner};

/// One observed transport call, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Fetch(i64),
    SendText(String),
    SendImage { path: PathBuf, existed: bool },
    Download(String),
}

/// A [`ChatTransport`] that replays scripted results and records every
/// call.  When a script queue runs dry the call succeeds: empty poll,
/// status 200, or a small valid PNG.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    fetches: Mutex<VecDeque<Result<FetchedMessages, NetError>>>,
    texts: Mutex<VecDeque<Result<u16, NetError>>>,
    images: Mutex<VecDeque<Result<u16, NetError>>>,
    downloads: Mutex<VecDeque<Result<Bytes, NetError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn transport_error() -> NetError {
        NetError::Io(std::io::Error::new(
            ErrorKind::ConnectionRefused,
            "scripted transport failure",
        ))
    }

    pub(crate) fn push_fetch(&self, result: Result<FetchedMessages, NetError>) {
        self.fetches.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_text(&self, result: Result<u16, NetError>) {
        self.texts.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_image(&self, result: Result<u16, NetError>) {
        self.images.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_download(&self, result: Result<Bytes, NetError>) {
        self.downloads.lock().unwrap().push_back(result);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn fetch_new_messages(&self, since_id: i64) -> Result<FetchedMessages, NetError> {
        self.record(Call::Fetch(since_id));
        self.fetches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(FetchedMessages {
                    messages: Vec::new(),
                    status: 200,
                })
            })
    }

    async fn send_text(&self, json: &str) -> Result<u16, NetError> {
        self.record(Call::SendText(json.to_string()));
        self.texts.lock().unwrap().pop_front().unwrap_or(Ok(200))
    }

    async fn send_image(&self, file: &Path) -> Result<u16, NetError> {
        self.record(Call::SendImage {
            path: file.to_path_buf(),
            existed: file.exists(),
        });
        self.images.lock().unwrap().pop_front().unwrap_or(Ok(200))
    }

    async fn download_image(&self, link: &str) -> Result<Bytes, NetError> {
        self.record(Call::Download(link.to_string()));
        self.downloads
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Bytes::from(tiny_png())))
    }
}

/// A small valid PNG for scripted downloads.
pub(crate) fn tiny_png() -> Vec<u8> {
    media::encode_png(&DynamicImage::new_rgba8(8, 8)).expect("encoding a fresh image cannot fail")
}

/// An inbound text message as the server would deliver it.
pub(crate) fn inbound_text(id: i64, text: &str) -> Message {
    Message {
        id: Some(id),
        from: "peer".to_string(),
        to: "1@channel".to_string(),
        payload: MessagePayload::Text {
            text: text.to_string(),
        },
        sent_at: "1700000000000".to_string(),
    }
}

/// An inbound image message with an unresolved decoded slot.
pub(crate) fn inbound_image(id: i64, link: &str) -> Message {
    Message {
        id: Some(id),
        from: "peer".to_string(),
        to: "1@channel".to_string(),
        payload: MessagePayload::Image {
            link: link.to_string(),
            decoded: None,
        },
        sent_at: "1700000000000".to_string(),
    }
}

/// Engine internals rooted in a temp directory, with fast intervals.
pub(crate) fn test_inner(dir: &Path, transport: Arc<dyn ChatTransport>) -> Arc<EngineInner> {
    let config = EngineConfig {
        username: "tea-0".to_string(),
        poll_interval: Duration::from_millis(25),
        hydration_offset: Duration::from_millis(10),
        data_dir: Some(dir.to_path_buf()),
        blob_dir: Some(dir.join("blobs")),
        ..EngineConfig::default()
    };
    build_inner(config, transport).expect("test engine state should build")
}
