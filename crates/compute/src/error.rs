#[derive(Debug, Clone, thiserror::Error)]
pub enum ComputeError {
    #[error("Cannot read source {input}: {detail}")]
    Source { input: String, detail: String },

    #[error("Cannot parse source {input}: {detail}")]
    Parse { input: String, detail: String },

    #[error("Unsupported source: {0}")]
    Unsupported(String),
}
