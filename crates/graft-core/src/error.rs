use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraftError {
    #[error("script error: {0}")]
    Script(String),

    #[error("execution error: {0}")]
    Execution(String),

    #[error("widget error: {0}")]
    Widget(String),

    #[error("messaging error: {0}")]
    Messaging(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type GraftResult<T> = Result<T, GraftError>;
