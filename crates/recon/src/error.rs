use std::fmt;
use std::time::Duration;

use plancheck_core::CanonicalField;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (threshold out of range, unknown alias target, etc.).
    ConfigValidation(String),
    /// No header candidate and no fallback row in a table.
    SchemaDetection { table: String, rows: usize, cols: usize },
    /// A mandatory canonical field is absent after normalization.
    RequiredFieldMissing {
        table: String,
        required: Vec<CanonicalField>,
        found: Vec<String>,
    },
    /// The embedding capability failed; fatal for the whole run.
    Embedding(EmbeddingError),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::SchemaDetection { table, rows, cols } => write!(
                f,
                "{table}: no header row found ({rows} rows x {cols} columns, all candidate rows empty)"
            ),
            Self::RequiredFieldMissing { table, required, found } => {
                let required: Vec<&str> = required.iter().map(|r| r.as_str()).collect();
                write!(
                    f,
                    "{table}: missing required column(s) [{}]; found [{}]",
                    required.join(", "),
                    found.join(", ")
                )
            }
            Self::Embedding(err) => write!(f, "embedding failed: {err}"),
        }
    }
}

impl std::error::Error for ReconError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Embedding(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EmbeddingError> for ReconError {
    fn from(err: EmbeddingError) -> Self {
        Self::Embedding(err)
    }
}

/// Failure of the embedding capability.
#[derive(Debug)]
pub enum EmbeddingError {
    /// Provider did not answer within the configured bound.
    Timeout { after: Duration },
    /// Network / connection failure.
    Transport(String),
    /// Provider answered with a non-success status.
    Http { status: u16, body: String },
    /// Provider answered with something that is not an embedding batch.
    Malformed(String),
    /// Provider returned a different number of vectors than texts sent.
    CountMismatch { expected: usize, got: usize },
    /// Vectors of inconsistent length within one run.
    DimensionMismatch { expected: usize, got: usize },
    /// Provider could not be constructed (missing key, bad endpoint).
    Setup(String),
}

impl fmt::Display for EmbeddingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { after } => write!(f, "timed out after {}s", after.as_secs_f32()),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Http { status, body } => write!(f, "HTTP {status}: {body}"),
            Self::Malformed(msg) => write!(f, "malformed response: {msg}"),
            Self::CountMismatch { expected, got } => {
                write!(f, "expected {expected} vectors, got {got}")
            }
            Self::DimensionMismatch { expected, got } => {
                write!(f, "vector length {got} differs from {expected}")
            }
            Self::Setup(msg) => write!(f, "setup error: {msg}"),
        }
    }
}

impl std::error::Error for EmbeddingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_field_message_lists_found_columns() {
        let err = ReconError::RequiredFieldMissing {
            table: "submitted OEI".into(),
            required: vec![CanonicalField::NameText],
            found: vec!["code".into(), "indicator".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("[name_text]"));
        assert!(msg.contains("found [code, indicator]"));
    }

    #[test]
    fn embedding_error_wraps() {
        let err: ReconError = EmbeddingError::Timeout { after: Duration::from_secs(30) }.into();
        assert!(err.to_string().contains("timed out after 30s"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
