#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    #[error("fixture ({context}): {detail}")]
    Fixture { context: &'static str, detail: String },

    #[error("package #{index}: {source}")]
    Package {
        index: usize,
        #[source]
        source: Box<InspectError>,
    },

    #[error("transport: {0}")]
    Transport(#[from] transport_api::TransportError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl InspectError {
    /// Tag the error with the index of the fixture entry that caused it.
    pub fn at(self, index: usize) -> Self {
        InspectError::Package { index, source: Box::new(self) }
    }
}
