use thiserror::Error;

pub type DashResult<T> = Result<T, DashError>;

#[derive(Debug, Error)]
pub enum DashError {
    #[error("model must be a fitted {expected} result, got {found}")]
    InvalidModel { expected: String, found: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid value for input `{key}`: {reason}")]
    InvalidInput { key: String, reason: String },

    #[error("unknown input `{0}`")]
    UnknownInput(String),

    #[error("unknown output `{0}`")]
    UnknownOutput(String),

    #[error("output `{output}` read undeclared dependency `{dependency}`")]
    UndeclaredDependency { output: String, dependency: String },

    #[error("reactive graph contains a cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("output `{0}` is declared more than once")]
    DuplicateOutput(String),

    #[error("output `{output}` depends on unknown `{dependency}`")]
    UnknownDependency { output: String, dependency: String },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("render failed: {0}")]
    Render(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("session is stopped")]
    SessionStopped,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DashError {
    pub(crate) fn invalid_input(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors caused by a mode that needs data the model lacks.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
