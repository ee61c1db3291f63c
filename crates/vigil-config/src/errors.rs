#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config file: {message}")]
    ParseError { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("IO error reading config: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}
