use thiserror::Error;

/// Errors from decoding, scaling or encoding images.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
