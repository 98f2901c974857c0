use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration directory not found")]
    ConfigDirNotFound,

    #[error(
        "configuration file not found. Looked in:\n\
        - the AZPOOL_CONFIG_PATH environment variable\n\
        - the current directory: azconfig.json\n\
        - ./.azpool/azconfig.json\n\
        - ~/.config/azpool/azconfig.json"
    )]
    ConfigFileNotFound,

    #[error("configuration field `{0}` must not be empty")]
    MissingField(&'static str),

    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
