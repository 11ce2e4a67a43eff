use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractError>;

/// Errors raised while compiling a template or extracting a document.
///
/// Compile-time variants describe a broken template and must abort engine
/// construction. The remaining variants abort a single document walk.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid object path '{path}'")]
    InvalidPath { path: String },

    #[error("invalid segment '{segment}': {reason}")]
    InvalidSegment { segment: String, reason: String },

    #[error("template leaf '{leaf}' failed to compile: {source}")]
    Compile {
        leaf: String,
        #[source]
        source: Box<ExtractError>,
    },

    #[error("template is not valid YAML: {0}")]
    Template(String),

    #[error("cannot convert '{value}' to {expected} for '{path}'")]
    ValueConversion {
        path: String,
        value: String,
        expected: &'static str,
    },

    #[error("condition value '{value}' is not a boolean")]
    Condition { value: String },

    #[error("too many values parsed {values:?}")]
    TooManySegments { values: Vec<String> },

    #[error("unsupported shape at '{key}': {found} value against {expected} template node")]
    UnsupportedShape {
        key: String,
        found: &'static str,
        expected: &'static str,
    },

    #[error("document is not a mapping: {0}")]
    InvalidDocument(String),
}

impl ExtractError {
    pub(crate) fn invalid_path(path: impl Into<String>) -> Self {
        ExtractError::InvalidPath { path: path.into() }
    }

    pub(crate) fn invalid_segment(segment: impl Into<String>, reason: impl Into<String>) -> Self {
        ExtractError::InvalidSegment {
            segment: segment.into(),
            reason: reason.into(),
        }
    }

    /// True for template authoring errors, false for per-document errors.
    pub fn is_compile_time(&self) -> bool {
        matches!(
            self,
            ExtractError::InvalidPath { .. }
                | ExtractError::InvalidSegment { .. }
                | ExtractError::Compile { .. }
                | ExtractError::Template(_)
        )
    }
}
