//! Row structs persisted in the local SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to a host application over IPC.

use serde::{Deserialize, Serialize};

use causerie_shared::{Message, MessagePayload};

use crate::error::{Result, StoreError};

// ---------------------------------------------------------------------------
// MessageRecord
// ---------------------------------------------------------------------------

/// Durable mirror of a server-assigned chat message.
///
/// `text` and `link` are mutually exclusive, matching the two-variant wire
/// payload.  Rows are append-only and keyed by the server id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageRecord {
    /// Server-assigned message id.
    pub id: i64,
    /// Locally minted identifier naming the cached image blob, images only.
    pub image_id: Option<i64>,
    pub from: String,
    pub to: String,
    pub text: Option<String>,
    pub link: Option<String>,
    /// Millisecond timestamp string, as received on the wire.
    pub time: String,
}

impl MessageRecord {
    /// Build the durable form of a server-assigned message.
    ///
    /// Fails with [`StoreError::MissingServerId`] for a message the server
    /// has not numbered yet; such messages must not reach the log.
    pub fn from_message(message: &Message, image_id: Option<i64>) -> Result<Self> {
        let id = message.id.ok_or(StoreError::MissingServerId)?;
        let (text, link) = match &message.payload {
            MessagePayload::Text { text } => (Some(text.clone()), None),
            MessagePayload::Image { link, .. } => (None, Some(link.clone())),
        };
        Ok(Self {
            id,
            image_id,
            from: message.from.clone(),
            to: message.to.clone(),
            text,
            link,
            time: message.sent_at.clone(),
        })
    }

    /// Rebuild the in-memory message, with an unresolved image slot.
    pub fn into_message(self) -> Result<Message> {
        let payload = match (self.text, self.link) {
            (Some(text), None) => MessagePayload::Text { text },
            (None, Some(link)) => MessagePayload::Image {
                link,
                decoded: None,
            },
            _ => return Err(StoreError::CorruptRecord(self.id)),
        };
        Ok(Message {
            id: Some(self.id),
            from: self.from,
            to: self.to,
            payload,
            sent_at: self.time,
        })
    }
}

// ---------------------------------------------------------------------------
// FailedUpload
// ---------------------------------------------------------------------------

/// An outbound send that failed at the transport level, awaiting retry.
///
/// Exactly one of `text` / `image_path` is set, mirroring which send path
/// failed.  `image_path` is the original source reference, not a temp file,
/// so the send can be rebuilt from scratch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailedUpload {
    /// Auto-increment row id; ignored on insert.
    pub local_id: i64,
    pub from: String,
    pub to: String,
    pub text: Option<String>,
    pub image_path: Option<String>,
}

impl FailedUpload {
    pub fn text(from: impl Into<String>, to: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            local_id: 0,
            from: from.into(),
            to: to.into(),
            text: Some(text.into()),
            image_path: None,
        }
    }

    pub fn image(from: impl Into<String>, to: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            local_id: 0,
            from: from.into(),
            to: to.into(),
            text: None,
            image_path: Some(path.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_record_round_trip() {
        let mut message = Message::text("tea-0", "1@channel", "hello");
        message.id = Some(42);

        let record = MessageRecord::from_message(&message, None).unwrap();
        assert_eq!(record.text.as_deref(), Some("hello"));
        assert_eq!(record.link, None);

        let back = record.into_message().unwrap();
        assert_eq!(back.id, Some(42));
        assert_eq!(back.payload.as_text(), Some("hello"));
        assert_eq!(back.payload.image_link(), None);
    }

    #[test]
    fn image_record_round_trip() {
        let message = Message {
            id: Some(7),
            from: "a".into(),
            to: "b".into(),
            payload: MessagePayload::Image {
                link: "pic.png".into(),
                decoded: None,
            },
            sent_at: "0".into(),
        };

        let record = MessageRecord::from_message(&message, Some(99)).unwrap();
        assert_eq!(record.image_id, Some(99));
        assert_eq!(record.link.as_deref(), Some("pic.png"));
        assert_eq!(record.text, None);

        let back = record.into_message().unwrap();
        assert_eq!(back.payload.image_link(), Some("pic.png"));
        assert!(back.payload.needs_hydration());
    }

    #[test]
    fn unassigned_message_is_rejected() {
        let message = Message::text("a", "b", "hi");
        assert!(matches!(
            MessageRecord::from_message(&message, None),
            Err(StoreError::MissingServerId)
        ));
    }

    #[test]
    fn corrupt_row_is_rejected() {
        let record = MessageRecord {
            id: 1,
            image_id: None,
            from: "a".into(),
            to: "b".into(),
            text: None,
            link: None,
            time: "0".into(),
        };
        assert!(matches!(
            record.into_message(),
            Err(StoreError::CorruptRecord(1))
        ));
    }
}
