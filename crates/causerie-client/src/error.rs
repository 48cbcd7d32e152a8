use thiserror::Error;

/// Engine-internal error, unifying the collaborator error types.
///
/// Never escapes a loop tick or a pipeline call: every failure is converted
/// into an event, a queued retry record or a logged skip at the narrowest
/// useful scope.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Store error: {0}")]
    Store(#[from] causerie_store::StoreError),

    #[error("Transport error: {0}")]
    Net(#[from] causerie_net::NetError),

    #[error("Media error: {0}")]
    Media(#[from] causerie_shared::MediaError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
