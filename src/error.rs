use std::path::PathBuf;

/// Failures the pipelines distinguish. Everything else travels as
/// `anyhow::Error` with context attached.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("phrase file {path} has {found} phrases, at least {required} are required")]
    NotEnoughPhrases {
        path: PathBuf,
        found: usize,
        required: usize,
    },

    #[error("every speech provider failed: {0}")]
    SpeechExhausted(String),

    #[error("ffmpeg failed: {0}")]
    Ffmpeg(String),

    #[error("invalid media dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
