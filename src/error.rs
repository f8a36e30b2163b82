use thiserror::Error;

// Error types for the Qflow integration layer
#[derive(Error, Debug)]
pub enum QflowError {
    #[error("Template not found: {key}")]
    TemplateNotFound { key: String },

    #[error("Template {key} could not be loaded: {reason}")]
    TemplateLoad { key: String, reason: String },

    #[error("Template {template} references missing parameter: {name}")]
    MissingParameter { template: String, name: String },

    #[error("Transport error calling {address}: {reason}")]
    Transport { address: String, reason: String },

    #[error("Remote fault from {address}: {code} - {message}")]
    RemoteFault {
        address: String,
        code: String,
        message: String,
        body: String,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid path expression: {0}")]
    InvalidPathExpression(String),

    #[error("No unit known for service {0}")]
    UnknownService(String),

    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),

    #[error("Invalid date-time {value:?}: {source}")]
    InvalidDateTime {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, QflowError>;
