//! The chat server's HTTP API, as the engine sees it.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use causerie_shared::Message;

use crate::error::{NetError, Result};

/// Messages fetched from the endpoint together with the HTTP status the
/// server answered with.
#[derive(Debug, Default)]
pub struct FetchedMessages {
    /// New messages, oldest first, in server-assigned id order.
    pub messages: Vec<Message>,
    /// HTTP status of the poll.  `>= 500` means the server is in trouble
    /// even when the message list is usable.
    pub status: u16,
}

/// The wire operations the engine needs from the chat endpoint.
///
/// Object-safe so tests can drive the engine with a scripted transport.
/// Every method may fail with a transport error distinct from any HTTP
/// status; callers must treat the two differently.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Fetch every message with an id greater than `since_id`.
    async fn fetch_new_messages(&self, since_id: i64) -> Result<FetchedMessages>;

    /// Submit a JSON-serialized text message; returns the HTTP status.
    async fn send_text(&self, json: &str) -> Result<u16>;

    /// Upload an encoded image file; returns the HTTP status.
    async fn send_image(&self, file: &Path) -> Result<u16>;

    /// Download the full-size image behind `link`.
    async fn download_image(&self, link: &str) -> Result<Bytes>;
}

/// reqwest-backed [`ChatTransport`] talking to the chat server.
pub struct HttpChatClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpChatClient {
    /// Build a client for the server at `base_url` (scheme + host + port).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("causerie/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl ChatTransport for HttpChatClient {
    async fn fetch_new_messages(&self, since_id: i64) -> Result<FetchedMessages> {
        let resp = self
            .http
            .get(self.url("messages"))
            .query(&[("after", since_id)])
            .send()
            .await?;

        let status = resp.status().as_u16();
        let messages = if resp.status().is_success() {
            resp.json::<Vec<Message>>().await?
        } else {
            Vec::new()
        };

        debug!(since_id, status, count = messages.len(), "polled messages");
        Ok(FetchedMessages { messages, status })
    }

    async fn send_text(&self, json: &str) -> Result<u16> {
        let resp = self
            .http
            .post(self.url("messages"))
            .header(CONTENT_TYPE, "application/json; charset=UTF-8")
            .body(json.to_owned())
            .send()
            .await?;

        Ok(resp.status().as_u16())
    }

    async fn send_image(&self, file: &Path) -> Result<u16> {
        let bytes = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.png".to_string());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/png")?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let resp = self
            .http
            .post(self.url("img"))
            .multipart(form)
            .send()
            .await?;

        Ok(resp.status().as_u16())
    }

    async fn download_image(&self, link: &str) -> Result<Bytes> {
        let resp = self.http.get(self.url(&format!("img/{link}"))).send().await?;

        if !resp.status().is_success() {
            return Err(NetError::Status(resp.status().as_u16()));
        }

        Ok(resp.bytes().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = HttpChatClient::new("http://localhost:8008/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("messages"), "http://localhost:8008/messages");
        assert_eq!(client.url("img/abc.png"), "http://localhost:8008/img/abc.png");
    }
}
