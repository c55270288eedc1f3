use std::path::PathBuf;

/// Failures of the parse -> propagate -> layout pipeline.
///
/// Every variant is fail-fast: the pipeline stops at the first one it hits.
#[derive(Debug, thiserror::Error)]
pub enum VisualizerError {
    #[error("malformed model: {reason}")]
    MalformedInput { reason: String },

    #[error("malformed layer #{index} ({kind}): {reason}")]
    MalformedLayer {
        index: usize,
        kind: String,
        reason: String,
    },

    #[error("cannot lay out model: {reason}")]
    DegenerateLayout { reason: String },
}

impl VisualizerError {
    pub fn input(reason: impl Into<String>) -> Self {
        VisualizerError::MalformedInput {
            reason: reason.into(),
        }
    }

    pub fn layer(index: usize, kind: &str, reason: impl Into<String>) -> Self {
        VisualizerError::MalformedLayer {
            index,
            kind: kind.to_string(),
            reason: reason.into(),
        }
    }

    pub fn degenerate(reason: impl Into<String>) -> Self {
        VisualizerError::DegenerateLayout {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for VisualizerError {
    fn from(err: serde_json::Error) -> Self {
        VisualizerError::input(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse JSON {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read {var}: {source}")]
    Env {
        var: &'static str,
        #[source]
        source: std::env::VarError,
    },
    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("tracing has already been initialised")]
    AlreadyInitialised,
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}
