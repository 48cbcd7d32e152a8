//! # causerie-client
//!
//! The Causerie chat synchronization engine.  Keeps an ordered in-memory
//! message log in sync with the remote endpoint, hydrates image payloads
//! through a two-tier cache, and guarantees eventual delivery of outbound
//! messages via a durable retry outbox.
//!
//! Hosts construct a [`ChatEngine`], [`start`](ChatEngine::start) it, then
//! interact through [`send_text`](ChatEngine::send_text) /
//! [`send_image`](ChatEngine::send_image), read the log with
//! [`messages`](ChatEngine::messages), and observe change notifications via
//! [`subscribe`](ChatEngine::subscribe).  The presentation layer stays
//! entirely outside this crate.

pub mod cache;
pub mod config;
pub mod engine;
pub mod events;

mod error;
mod hydrate;
mod outbound;
mod retry;
mod state;
mod sync;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::EngineConfig;
pub use engine::ChatEngine;
pub use error::EngineError;
pub use events::{ChatEvent, EventBus};

use tracing_subscriber::{fmt, EnvFilter};

/// Install the default tracing subscriber for host applications that do not
/// bring their own.  Honors `RUST_LOG` when set.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("causerie_client=debug,causerie_net=debug,causerie_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
