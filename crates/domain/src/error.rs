/// Shared error type used across all Stratum crates.
///
/// Ordinary storage misses are never errors — they travel as `Option::None`
/// through the handler chain.  This type covers genuine failures: I/O against
/// the durable table, malformed serialized data, bad configuration, and
/// encryption setup problems.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config: {0}")]
    Config(String),

    #[error("crypto: {0}")]
    Crypto(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
