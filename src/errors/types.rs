//! # Error Types
//!
//! The error taxonomy for stratus operations using `thiserror`.

/// Custom result type for stratus operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the stratus harness
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// HTTP transport errors
    #[error("Transport error: {context}")]
    Transport {
        #[source]
        source: reqwest::Error,
        context: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },

    /// Permission boundary violated (401/403 from the target service)
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Referenced resource or endpoint absent (404 from the target service)
    #[error("Resource not found: {resource_type} '{id}'")]
    NotFound { resource_type: String, id: String },

    /// Request rejected by the target service (400)
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Any other non-success HTTP response
    #[error("HTTP error: {message} (status: {status})")]
    Http { status: u16, message: String },

    /// Creation call returned a success code other than the asserted one
    #[error("Unexpected status: expected {expected}, got {actual}: {body}")]
    UnexpectedStatus {
        expected: u16,
        actual: u16,
        body: String,
    },

    /// A resource has not yet reached the awaited status. Swallowed while
    /// polling; becomes the propagated error once the wait times out.
    #[error("{resource_type} '{id}' is in status '{current}', waiting for '{expected}'")]
    State {
        resource_type: String,
        id: String,
        current: String,
        expected: String,
    },

    /// Timeout errors
    #[error("Operation timed out: {operation} after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a transport error with request context
    pub fn transport<S: Into<String>>(source: reqwest::Error, context: S) -> Self {
        Self::Transport { source, context: context.into() }
    }

    /// Create an unauthorized error
    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    /// Create a not found error
    pub fn not_found<R: Into<String>, I: Into<String>>(resource_type: R, id: I) -> Self {
        Self::NotFound { resource_type: resource_type.into(), id: id.into() }
    }

    /// Create a bad request error
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Create a generic HTTP error
    pub fn http<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Http { status, message: message.into() }
    }

    /// Create an unexpected status error
    pub fn unexpected_status<S: Into<String>>(expected: u16, actual: u16, body: S) -> Self {
        Self::UnexpectedStatus { expected, actual, body: body.into() }
    }

    /// Create a state error for a resource that has not reached the awaited status
    pub fn state<R, I, C, E>(resource_type: R, id: I, current: C, expected: E) -> Self
    where
        R: Into<String>,
        I: Into<String>,
        C: Into<String>,
        E: Into<String>,
    {
        Self::State {
            resource_type: resource_type.into(),
            id: id.into(),
            current: current.into(),
            expected: expected.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, duration_ms: u64) -> Self {
        Self::Timeout { operation: operation.into(), duration_ms }
    }

    /// True for errors signalling an absent resource or endpoint
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// True for permission boundary violations
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized { .. })
    }

    /// Attach the concrete resource type and id to a generic `NotFound`
    /// produced by the transport layer. Other variants pass through.
    pub fn locate<R: Into<String>, I: Into<String>>(self, resource_type: R, id: I) -> Self {
        match self {
            Error::NotFound { .. } => Error::not_found(resource_type, id),
            other => other,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization { source: error, context: "JSON serialization failed".to_string() }
    }
}

impl From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::config(format!("Validation failed: {}", message))
    }
}

impl From<url::ParseError> for Error {
    fn from(error: url::ParseError) -> Self {
        Self::config_with_source("Invalid endpoint URL", Box::new(error))
    }
}
