//! Error handling for the labkit crate.

/// A specialized `Result` type for labkit operations.
pub type Result<T> = std::result::Result<T, LabError>;

/// Longest remote message kept for display.
pub const MAX_REMOTE_MESSAGE_LEN: usize = 100;

/// Upstream status field used by generative APIs to signal quota exhaustion.
pub const RESOURCE_EXHAUSTED: &str = "RESOURCE_EXHAUSTED";

/// The main error type for labkit operations.
#[derive(Debug, thiserror::Error)]
pub enum LabError {
    /// Rate limit or quota exhaustion; retryable
    #[error("Upstream capacity exhausted: {0}")]
    TransientCapacity(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials were rejected by the upstream service
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Input failed validation before any remote call
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Any other remote failure (status, transport, undecodable payload)
    #[error("Remote failure: {0}")]
    Remote(String),

    /// The retry executor ran out of attempts on transient failures
    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Web server error
    #[error("Web server error: {0}")]
    WebServer(String),

    /// Sensor read failed
    #[error("Sensor error: {0}")]
    Sensor(String),
}

/// Coarse classification callers branch on instead of matching messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TransientCapacity,
    NotFound,
    Unauthorized,
    MalformedInput,
    OtherRemoteFailure,
    RetriesExhausted,
    Local,
}

impl LabError {
    /// Create a new transient capacity error
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::TransientCapacity(msg.into())
    }

    /// Create a new not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new unauthorized error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a new validation error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Create a new remote failure, truncating the message for display
    pub fn remote(msg: impl AsRef<str>) -> Self {
        Self::Remote(truncate_message(msg.as_ref(), MAX_REMOTE_MESSAGE_LEN))
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }

    /// Create a new sensor error
    pub fn sensor_error(msg: impl Into<String>) -> Self {
        Self::Sensor(msg.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TransientCapacity(_) => ErrorKind::TransientCapacity,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::MalformedInput(_) => ErrorKind::MalformedInput,
            Self::Remote(_) => ErrorKind::OtherRemoteFailure,
            Self::RetriesExhausted { .. } => ErrorKind::RetriesExhausted,
            Self::Io(_) | Self::Json(_) | Self::Config(_) | Self::WebServer(_) | Self::Sensor(_) => {
                ErrorKind::Local
            }
        }
    }

    /// Whether the retry executor may try again after this error.
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::TransientCapacity
    }
}

impl From<reqwest::Error> for LabError {
    fn from(err: reqwest::Error) -> Self {
        if err.status().map(|s| s.as_u16()) == Some(429) {
            return LabError::transient(err.to_string());
        }
        if err.is_timeout() {
            return LabError::remote(format!("request timed out: {}", err));
        }
        LabError::remote(err.to_string())
    }
}

/// Whether an upstream failure signals rate limiting or quota exhaustion.
///
/// HTTP 429, a `RESOURCE_EXHAUSTED` status field, and the textual markers
/// "quota" / "rate limit" (case-insensitive) are equivalent signals.
pub fn is_capacity_signal(status: Option<u16>, status_field: Option<&str>, message: &str) -> bool {
    if status == Some(429) {
        return true;
    }
    if status_field.is_some_and(|field| field.eq_ignore_ascii_case(RESOURCE_EXHAUSTED)) {
        return true;
    }
    let lowered = message.to_lowercase();
    lowered.contains("quota") || lowered.contains("rate limit")
}

/// Truncate `msg` to at most `max` characters, on a char boundary.
pub fn truncate_message(msg: &str, max: usize) -> String {
    match msg.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &msg[..idx]),
        None => msg.to_string(),
    }
}
