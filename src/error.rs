use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    /// A required input is missing or the config file is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("error parsing event: {0}")]
    EventParse(String),

    /// The latest release tag is not `vMAJOR.MINOR.PATCH`.
    #[error("malformed release tag `{tag}`: {reason}")]
    MalformedTag { tag: String, reason: String },

    #[error("error calling {operation}")]
    RemoteCall {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl BotError {
    pub fn remote(operation: &'static str, source: anyhow::Error) -> Self {
        BotError::RemoteCall { operation, source }
    }
}
