//! # causerie-shared
//!
//! Domain types shared by every Causerie crate: the chat message model with
//! its two-variant wire payload, image decode/scale helpers, and the protocol
//! constants both the engine and the transport layer agree on.

pub mod constants;
pub mod media;
pub mod types;

mod error;

pub use error::MediaError;
pub use types::{now_millis, Message, MessagePayload};
