/// Central error type for the analyzer.
#[derive(Debug, thiserror::Error)]
pub enum BbsError {
    #[error("config error: {message}")]
    Config { message: String },

    #[error("API error ({status}) from {endpoint}")]
    Api { status: u16, endpoint: String },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("decode error: {message}")]
    Decode { message: String },

    #[error("no projects were found to look up repositories for")]
    NoProjects,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
