//! Error types for the CloudFront client
//!
//! Failures are grouped the way they surface to callers: transport failures
//! (connection, framing), protocol failures (responses the dispatcher cannot
//! make sense of), API errors reported by the service itself, validation
//! failures caught before any network call, and distribution state errors
//! that block a delete.

use thiserror::Error;

/// Error types that can occur when talking to the CloudFront control plane
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred during network operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to connect to the CloudFront endpoint
    #[error("Connection failed to {host}:{port}")]
    ConnectionFailed {
        /// The hostname that failed to connect
        host: String,
        /// The port number that failed to connect
        port: u16,
    },

    /// Connection establishment timed out
    #[error("Connection timed out after {timeout_secs}s to {host}:{port}")]
    ConnectionTimeout {
        /// The hostname that timed out
        host: String,
        /// The port number that timed out
        port: u16,
        /// The timeout duration in seconds
        timeout_secs: u64,
    },

    /// TLS setup or handshake failed
    #[error("TLS error: {0}")]
    Tls(String),

    /// Failed to write the request to the server
    #[error("Error writing request to server")]
    SendFailed,

    /// The server stopped responding mid-transfer
    #[error("Timed out reading response from server")]
    ReceiveTimeout,

    /// No three-digit status code found in the response status line
    #[error("No status code in response")]
    MissingStatusCode,

    /// A chunked body carried a size line that is not hexadecimal
    #[error("Invalid chunk size {0:?}, unable to read chunked body")]
    InvalidChunkSize(String),

    /// The connection closed before the framed body was complete
    #[error("Truncated response body: expected {expected} bytes, received {received}")]
    TruncatedBody {
        /// Bytes the framing promised
        expected: u64,
        /// Bytes actually received
        received: u64,
    },

    /// The response body exceeded the safety limit
    #[error("Response body exceeds {limit} byte limit")]
    ResponseTooLarge {
        /// The configured body size limit
        limit: u64,
    },

    /// No XML element could be extracted from a non-empty response body
    #[error("XML document not found in response body")]
    XmlNotFound,

    /// The response body is not well-formed XML
    #[error("XML parse error: {0}")]
    Xml(String),

    /// The response document root is not one the dispatcher recognizes
    #[error("Invalid response document from server: unexpected root element <{0}>")]
    UnexpectedDocument(String),

    /// The server answered with a valid document of the wrong kind
    #[error("Unexpected response: expected {expected}, got {got}")]
    UnexpectedResponse {
        /// Outcome kind the operation requires
        expected: &'static str,
        /// Outcome kind the server produced
        got: &'static str,
    },

    /// The server reported a distribution status outside the known lifecycle
    #[error("Unknown distribution status {0:?}")]
    UnknownStatus(String),

    /// Error reported by the service in an `ErrorResponse` document
    #[error("{code}: {message}")]
    Api {
        /// Service error code
        code: String,
        /// Human-readable message from the service
        message: String,
        /// HTTP status code of the response
        status: u16,
    },

    /// A distribution config was submitted without its required origin
    #[error("DistributionConfig requires 'Origin'")]
    MissingOrigin,

    /// A mutating operation needs a cached ETag and the distribution has none
    #[error("Distribution has no ETag; fetch it before updating or deleting")]
    MissingEtag,

    /// Delete attempted while the distribution is still enabled
    #[error("The distribution must first be disabled before it can be deleted")]
    DistributionEnabled,

    /// Delete attempted while the server still reports the distribution in progress
    #[error("The distribution cannot be deleted because it is still listed as being \"in progress\"")]
    DistributionInProgress,
}

/// Result type alias using the CloudFront client error type
pub type Result<T> = std::result::Result<T, Error>;
