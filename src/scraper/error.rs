use thiserror::Error;

/// Failure while turning a page fragment into packages.
///
/// Scoped to the smallest unit that failed: a whole section when the
/// fragment or its shared fields are missing, a single variant otherwise.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("missing fragment at `{path}`")]
    MissingFragment { path: String },

    #[error("malformed price tag {raw:?}: {reason}")]
    MalformedPrice { raw: String, reason: String },

    #[error("unexpected layout: expected {expected}, got {raw:?}")]
    UnexpectedLayout { expected: String, raw: String },

    #[error("no price found for {title:?}")]
    MissingPrice { title: String },

    #[error("package title is empty")]
    EmptyTitle,

    #[error("invalid query `{query}`: {reason}")]
    InvalidQuery { query: String, reason: String },
}

impl ExtractError {
    pub fn missing(path: impl Into<String>) -> Self {
        Self::MissingFragment { path: path.into() }
    }

    pub fn layout(expected: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::UnexpectedLayout {
            expected: expected.into(),
            raw: raw.into(),
        }
    }
}

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;
