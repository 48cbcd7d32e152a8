use std::sync::Arc;

use chrono::Utc;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// A single chat message as exchanged with the remote endpoint.
///
/// `id` is assigned by the server. A message the user has typed but not yet
/// delivered has `id == None`; such a message lives only inside the outbound
/// pipeline and never enters the shared log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub from: String,
    pub to: String,
    #[serde(rename = "data")]
    pub payload: MessagePayload,
    /// Millisecond wall-clock timestamp, kept as the string the endpoint
    /// uses on the wire.
    #[serde(rename = "time")]
    pub sent_at: String,
}

impl Message {
    /// Build an outbound text message with no server id yet.
    pub fn text(from: impl Into<String>, to: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: None,
            from: from.into(),
            to: to.into(),
            payload: MessagePayload::Text { text: text.into() },
            sent_at: now_millis().to_string(),
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self.payload, MessagePayload::Image { .. })
    }
}

/// Wire payload union. Exactly one variant exists by construction.
///
/// The externally tagged serde encoding reproduces the endpoint's JSON shape:
/// `{"Text":{"text":"hi"}}` / `{"Image":{"link":"abc.png"}}`. Aliases accept
/// the lowercase spellings older server builds emit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MessagePayload {
    #[serde(alias = "text")]
    Text { text: String },
    #[serde(alias = "image")]
    Image {
        link: String,
        /// Decoded, display-scaled copy. Never serialized; filled in place
        /// by the hydration loop and shared with the memory cache.
        #[serde(skip)]
        decoded: Option<Arc<DynamicImage>>,
    },
}

impl MessagePayload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Image { .. } => None,
        }
    }

    pub fn image_link(&self) -> Option<&str> {
        match self {
            Self::Text { .. } => None,
            Self::Image { link, .. } => Some(link),
        }
    }

    /// True for an image payload whose decoded slot is still empty.
    pub fn needs_hydration(&self) -> bool {
        matches!(self, Self::Image { decoded: None, .. })
    }
}

/// Millisecond wall-clock timestamp, the format the endpoint uses for
/// `time` stamps and that the engine uses to mint local image ids.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
