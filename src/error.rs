//! Error types for request execution
//!
//! Every failure the request layer produces, whatever its origin, is a [`RequestError`]
//! carrying a non-empty, human-readable message. The [`ErrorKind`] lets callers tell a
//! timeout apart from an HTTP error response without string matching.
use std::fmt;

/// Result of one logical request: the decoded value or a normalized error.
pub type Outcome<T> = Result<T, RequestError>;

/// Where a failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The round trip never completed (DNS, connection refused, reset).
    Transport,
    /// The server answered with a status outside 200–299.
    Status,
    /// A successful response whose body could not be decoded as the expected JSON.
    Decode,
    /// The request could not be built (body serialization, invalid header).
    Encode,
    /// The attempt did not settle before its deadline.
    Timeout,
}

impl ErrorKind {
    fn fallback_message(self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport failure",
            ErrorKind::Status => "request failed",
            ErrorKind::Decode => "response body could not be decoded",
            ErrorKind::Encode => "request could not be encoded",
            ErrorKind::Timeout => "request timed out",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Status => "status",
            ErrorKind::Decode => "decode",
            ErrorKind::Encode => "encode",
            ErrorKind::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

/// Uniform error value produced by every failure path.
///
/// Invariants: `message` is never empty, and `status` is `Some` exactly when the error
/// came from a non-success HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RequestError {
    kind: ErrorKind,
    message: String,
    status: Option<u16>,
}

impl RequestError {
    fn new(kind: ErrorKind, message: impl Into<String>, status: Option<u16>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            kind.fallback_message().to_string()
        } else {
            message
        };
        Self { kind, message, status }
    }

    /// Failure of the round trip itself.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message, None)
    }

    /// Non-success HTTP response with the given status code.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Status, message, Some(status))
    }

    /// Successful response whose body was not the expected JSON.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message, None)
    }

    /// Request that could not be built.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Encode, message, None)
    }

    /// Attempt that exceeded its deadline.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message, None)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status of the response this error was normalized from, if any.
    pub fn status_code(&self) -> Option<u16> {
        self.status
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    pub fn is_transport(&self) -> bool {
        self.kind == ErrorKind::Transport
    }

    pub fn is_status(&self) -> bool {
        self.kind == ErrorKind::Status
    }

    pub fn is_decode(&self) -> bool {
        self.kind == ErrorKind::Decode
    }

    /// 4xx response.
    pub fn is_client_error(&self) -> bool {
        matches!(self.status, Some(code) if (400..500).contains(&code))
    }

    /// 5xx response.
    pub fn is_server_error(&self) -> bool {
        matches!(self.status, Some(code) if (500..600).contains(&code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_message() {
        let err = RequestError::status(404, "not found");
        assert_eq!(err.to_string(), "not found");
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.kind(), ErrorKind::Status);
    }

    #[test]
    fn empty_message_is_replaced() {
        for err in [
            RequestError::transport(""),
            RequestError::status(500, "   "),
            RequestError::decode(String::new()),
            RequestError::encode(""),
            RequestError::timeout(""),
        ] {
            assert!(!err.message().is_empty(), "{:?} has empty message", err.kind());
        }
    }

    #[test]
    fn only_status_errors_carry_a_status() {
        assert_eq!(RequestError::transport("refused").status_code(), None);
        assert_eq!(RequestError::timeout("late").status_code(), None);
        assert_eq!(RequestError::decode("bad json").status_code(), None);
    }

    #[test]
    fn predicates_cover_kinds() {
        assert!(RequestError::timeout("late").is_timeout());
        assert!(RequestError::transport("dns").is_transport());
        assert!(RequestError::decode("eof").is_decode());
        let unauthorized = RequestError::status(401, "unauthorized");
        assert!(unauthorized.is_status());
        assert!(unauthorized.is_client_error());
        assert!(!unauthorized.is_server_error());
        assert!(RequestError::status(503, "unavailable").is_server_error());
        assert!(!RequestError::timeout("late").is_client_error());
    }

    #[test]
    fn kind_display_names() {
        assert_eq!(ErrorKind::Timeout.to_string(), "timeout");
        assert_eq!(ErrorKind::Status.to_string(), "status");
    }
}
