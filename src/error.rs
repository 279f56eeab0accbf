use std::path::PathBuf;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library
///
/// The first four variants are configuration errors: they are deterministic for a given
/// input and are raised once, immediately, to the caller of the generation call.
#[derive(Debug)]
pub enum Error {
    /// The requested document name is not one of the configured documents
    UnknownDocument { name: String, available: Vec<String> },
    /// Two distinct types were assigned the same schema id
    SchemaIdConflict {
        schema_id: String,
        existing: String,
        conflicting: String,
    },
    /// More than one action is bound to the same path and HTTP method
    ConflictingActions {
        method: String,
        path: String,
        actions: Vec<String>,
    },
    /// An action has no HTTP method binding
    AmbiguousHttpMethod { action: String },
    /// A user-supplied filter failed
    Filter(String),
    IoError(std::io::Error),
    ParseError { file: PathBuf, message: String },
    Config(String),
    SerializationError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::UnknownDocument { name, available } => write!(
                f,
                "Unknown Swagger document - \"{}\". Known documents: [{}]",
                name,
                available.join(", ")
            ),
            Error::SchemaIdConflict {
                schema_id,
                existing,
                conflicting,
            } => write!(
                f,
                "Conflicting schemaIds: Identical schemaIds \"{}\" detected for types {} and {}. \
                 See the schema_id_selector option (e.g. fully-qualified type names) for a workaround",
                schema_id, existing, conflicting
            ),
            Error::ConflictingActions {
                method,
                path,
                actions,
            } => write!(
                f,
                "Conflicting method/path combination \"{} {}\" for actions - {}. \
                 Actions require a unique method/path combination for OpenAPI 3.0. \
                 Use a conflicting_actions_resolver as a workaround",
                method,
                path,
                actions.join(",")
            ),
            Error::AmbiguousHttpMethod { action } => write!(
                f,
                "Ambiguous HTTP method for action - {}. \
                 Actions require an explicit HTTP method binding for OpenAPI 3.0",
                action
            ),
            Error::Filter(msg) => write!(f, "Filter failed: {}", msg),
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::ParseError { file, message } => {
                write!(f, "Parse error in {}: {}", file.display(), message)
            }
            Error::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML: {}", err))
    }
}
