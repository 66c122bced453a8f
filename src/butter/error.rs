#[derive(thiserror::Error, Debug)]
pub enum ButterError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Deserialize error: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

pub type ButterResult<T> = Result<T, ButterError>;
