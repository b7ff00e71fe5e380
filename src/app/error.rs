use thiserror::Error;

#[derive(Error, Debug)]
pub enum LecternError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid URL format")]
    MalformedUrl,

    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("Content extraction error: {0}")]
    Extraction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Chapter not found: {0}")]
    ChapterNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LecternError>;
