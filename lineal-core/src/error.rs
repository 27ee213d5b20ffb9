use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinealError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PARSE_EVENT: malformed change event: {0}")]
    ParseEvent(String),

    #[error("CONSUME_EVENT: could not apply change event: {0}")]
    ConsumeEvent(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IPC error: {0}")]
    Ipc(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl LinealError {
    /// True when the error means the addressed element does not exist,
    /// as opposed to an internal failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LinealError::NotFound(_))
    }
}
