//! Error types for the provisioning engine

use thiserror::Error;

/// Errors that can occur while mapping, reconciling, or dispatching resources
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration document could not be read or parsed. Fatal: the run
    /// aborts before any command is issued.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),

    /// A resource item is missing a field its type's mapping rule requires.
    /// Fatal to that single item only.
    #[error("{resource_type} item is missing required field `{field}`")]
    MissingField {
        resource_type: String,
        field: String,
    },

    /// The external `tw` process could not be started or exited abnormally.
    #[error("`{command}` failed: {message}")]
    Process { command: String, message: String },

    /// An existence check matched more than one remote resource, so the
    /// deletion target cannot be resolved safely.
    #[error("ambiguous lookup for {resource_type} `{name}`: {candidates} candidates match")]
    LookupAmbiguity {
        resource_type: String,
        name: String,
        candidates: usize,
    },

    /// A listing response could not be decoded as JSON.
    #[error("invalid JSON in listing response: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (temp params file creation, config reads)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_resource_and_cause() {
        let err = Error::MissingField {
            resource_type: "datasets".to_string(),
            field: "description".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "datasets item is missing required field `description`"
        );

        let err = Error::LookupAmbiguity {
            resource_type: "workspaces".to_string(),
            name: "acme/research".to_string(),
            candidates: 2,
        };
        assert!(err.to_string().contains("2 candidates"));
    }

    #[test]
    fn io_and_json_errors_convert_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(Error::from(io), Error::Io(_)));

        let json = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(Error::from(json), Error::Json(_)));
    }
}
