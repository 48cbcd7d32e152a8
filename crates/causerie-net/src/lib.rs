//! HTTP transport layer for the Causerie chat endpoint.
//!
//! The engine only ever talks to the server through the [`ChatTransport`]
//! trait; [`HttpChatClient`] is the reqwest-backed implementation.  The
//! split keeps transport failures (connection refused, timeout, a body that
//! does not parse) strictly separate from HTTP statuses the server answered
//! with: the former are `Err(NetError)`, the latter are plain data.

pub mod client;

mod error;

pub use client::{ChatTransport, FetchedMessages, HttpChatClient};
pub use error::NetError;
