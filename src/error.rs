/// Result type alias for the synthesis engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the synthesis engine
///
/// Every variant aborts the whole synthesis run: the engine never yields a
/// partial client document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A route offers none of the seven supported HTTP methods
    UnsupportedMethod { route: String, methods: Vec<String> },
    /// A type expression names a model that the route table does not declare
    UnknownModel(String),
    /// A bare model name matches several declared models
    AmbiguousModel { name: String, candidates: Vec<String> },
    /// A type expression could not be parsed or uses an unsupported form
    InvalidType { expr: String, message: String },
    /// A route declares a request body that is not a model
    InvalidBody { route: String, message: String },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::UnsupportedMethod { route, methods } => write!(
                f,
                "Method not found in {:?} for route '{}'. Expected one of {:?}.",
                methods,
                route,
                crate::extractor::METHOD_PRIORITY
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
            ),
            Error::UnknownModel(name) => write!(f, "Unknown model: {}", name),
            Error::AmbiguousModel { name, candidates } => write!(
                f,
                "Model name '{}' is ambiguous, candidates: {}",
                name,
                candidates.join(", ")
            ),
            Error::InvalidType { expr, message } => {
                write!(f, "Invalid type expression '{}': {}", expr, message)
            }
            Error::InvalidBody { route, message } => {
                write!(f, "Invalid request body for route '{}': {}", route, message)
            }
        }
    }
}

impl std::error::Error for Error {}
