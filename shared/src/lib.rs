// shared/src/lib.rs

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("cache store: {0}")]
    Store(String),
    #[error("upstream responded with {status}: {message}")]
    UpstreamStatus { status: u16, message: String },
    #[error("upstream request timed out after {0} ms")]
    UpstreamTimeout(u64),
    #[error("upstream unavailable: {0}")]
    Upstream(String),
    #[error("config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod config;
