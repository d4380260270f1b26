use crate::model::ModelKey;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("no codec registered for model '{0}'")]
    CodecNotFound(ModelKey),

    #[error("codec mismatch: registered '{expected}', message carries '{found}'")]
    CodecMismatch { expected: String, found: String },

    #[error("codec error: {0}")]
    Codec(String),

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("topic '{topic}' has no subscriber and no queue capacity")]
    NoSubscriber { topic: String },

    #[error("topic '{topic}' queue is full ({capacity} messages)")]
    QueueFull { topic: String, capacity: usize },

    #[error("publish completed but no wire message was delivered")]
    NothingPublished,

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Add context to the error.
    ///
    /// Context is prepended to message-carrying variants; structured
    /// variants are returned unchanged.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            TransportError::Codec(msg) => TransportError::Codec(format!("{ctx}: {msg}")),
            TransportError::Config(msg) => TransportError::Config(format!("{ctx}: {msg}")),
            other => other,
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        TransportError::Codec(e.to_string())
    }
}
