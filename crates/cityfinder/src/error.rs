use thiserror::Error;

#[derive(Error, Debug)]
pub enum CityFinderError {
    #[error("Query error: {0}")]
    Query(#[from] crate::service::QueryError),
    #[error("Data processing error: {0}")]
    DataProcessing(#[from] cityfinder_data_processing::DataError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CityFinderError>;
