//! Raw HTTP/1.1 transport over TLS
//!
//! The control plane speaks plain HTTP/1.1, one request per connection. This
//! module frames the request bytes, performs the exchange over a rustls
//! stream, and reassembles the response: status line, headers, and a body
//! that may be chunk-encoded, length-delimited, or terminated by connection
//! close. There is no connection pooling; every call opens a fresh
//! connection and sends `Connection: close`.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, instrument, trace};

/// Safety limit on decoded response bodies
pub const MAX_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared TLS client configuration; loading platform roots is not cheap
static TLS_CONFIG: OnceLock<Arc<rustls::ClientConfig>> = OnceLock::new();

/// A fully reassembled HTTP response
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: u16,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl RawResponse {
    pub(crate) fn new(status: u16, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Three-digit HTTP status code
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Look up a header value; names are matched case-insensitively
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The decoded response body
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Blocking-style HTTP/1.1 transport: one request, one response, one connection
#[derive(Debug, Clone)]
pub struct HttpTransport {
    host: String,
    port: u16,
    use_tls: bool,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl HttpTransport {
    /// Create a transport for the given host on the standard HTTPS port
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: crate::types::CLOUDFRONT_PORT,
            use_tls: true,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Override the port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Skip TLS and speak plain HTTP, for local test endpoints
    #[must_use]
    pub fn with_plaintext(mut self) -> Self {
        self.use_tls = false;
        self
    }

    /// Override the connection-establishment timeout
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Override the response read deadline
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// The host this transport connects to
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Send one framed request and read back the full response
    ///
    /// `headers` are written verbatim after the `Host` header; when a body is
    /// present, `Content-Length` (byte length) and
    /// `Content-Type: application/xml` are added.
    #[instrument(skip(self, body, headers))]
    pub async fn send(
        &self,
        method: &str,
        path: &str,
        body: Option<&[u8]>,
        headers: &[(String, String)],
    ) -> Result<RawResponse> {
        let request = build_request(method, path, &self.host, body, headers);

        let address = format!("{}:{}", self.host, self.port);
        debug!("Connecting to {address}");

        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&address))
            .await
            .map_err(|_| Error::ConnectionTimeout {
                host: self.host.clone(),
                port: self.port,
                timeout_secs: self.connect_timeout.as_secs(),
            })?
            .map_err(|_| Error::ConnectionFailed {
                host: self.host.clone(),
                port: self.port,
            })?;

        if self.use_tls {
            let connector = TlsConnector::from(tls_config()?);
            let server_name = rustls::pki_types::ServerName::try_from(self.host.clone())
                .map_err(|e| Error::Tls(e.to_string()))?;
            let stream = connector
                .connect(server_name, stream)
                .await
                .map_err(|e| Error::Tls(e.to_string()))?;
            self.exchange(stream, &request).await
        } else {
            self.exchange(stream, &request).await
        }
    }

    async fn exchange<S>(&self, mut stream: S, request: &[u8]) -> Result<RawResponse>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        stream
            .write_all(request)
            .await
            .map_err(|_| Error::SendFailed)?;
        stream.flush().await.map_err(|_| Error::SendFailed)?;

        let mut reader = BufReader::new(stream);
        let response = tokio::time::timeout(self.read_timeout, read_response(&mut reader))
            .await
            .map_err(|_| Error::ReceiveTimeout)??;

        let status = response.status();
        let len = response.body().len();
        debug!("Received status {status}, {len} body bytes");
        Ok(response)
    }
}

/// Build (once) and share the rustls client configuration
fn tls_config() -> Result<Arc<rustls::ClientConfig>> {
    if let Some(config) = TLS_CONFIG.get() {
        return Ok(Arc::clone(config));
    }

    let loaded = rustls_native_certs::load_native_certs();
    let mut roots = rustls::RootCertStore::empty();
    for cert in loaded.certs {
        // Skip certificates the platform store holds but rustls rejects
        let _ = roots.add(cert);
    }
    if roots.is_empty() {
        let detail = loaded
            .errors
            .first()
            .map_or_else(String::new, |e| format!(": {e}"));
        return Err(Error::Tls(format!("no usable platform trust roots{detail}")));
    }

    let config = Arc::new(
        rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth(),
    );
    Ok(Arc::clone(TLS_CONFIG.get_or_init(|| config)))
}

/// Frame a request into the bytes written to the wire
fn build_request(
    method: &str,
    path: &str,
    host: &str,
    body: Option<&[u8]>,
    headers: &[(String, String)],
) -> Vec<u8> {
    let mut request = format!("{method} {path} HTTP/1.1\r\nHost: {host}\r\n");

    for (name, value) in headers {
        request.push_str(name.trim());
        request.push_str(": ");
        request.push_str(value.trim());
        request.push_str("\r\n");
    }

    if let Some(body) = body {
        // Byte length, not character length
        request.push_str(&format!("Content-Length: {}\r\n", body.len()));
        request.push_str("Content-Type: application/xml\r\n");
    }

    request.push_str("Connection: close\r\n\r\n");

    let mut bytes = request.into_bytes();
    if let Some(body) = body {
        bytes.extend_from_slice(body);
    }
    bytes
}

/// Read status line, headers, and framed body from a buffered stream
async fn read_response<R>(reader: &mut R) -> Result<RawResponse>
where
    R: AsyncBufRead + Unpin,
{
    let status_line = read_line(reader).await?.ok_or(Error::MissingStatusCode)?;
    trace!("Status line: {status_line}");
    let status = extract_status_code(&status_line).ok_or(Error::MissingStatusCode)?;

    let mut headers = HashMap::new();
    while let Some(line) = read_line(reader).await? {
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let body = if headers
        .get("transfer-encoding")
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked"))
    {
        read_chunked_body(reader).await?
    } else if let Some(value) = headers.get("content-length") {
        let length: u64 = value.parse().map_err(|_| {
            Error::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid Content-Length {value:?}"),
            ))
        })?;
        read_exact_body(reader, length).await?
    } else {
        read_body_to_end(reader).await?
    };

    Ok(RawResponse::new(status, headers, body))
}

/// Read one CRLF-terminated line; `None` at end of stream
async fn read_line<R>(reader: &mut R) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Some(line))
}

/// Find the first run of exactly three ASCII digits in the status line
fn extract_status_code(line: &str) -> Option<u16> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i - start == 3 {
                return line[start..i].parse().ok();
            }
        } else {
            i += 1;
        }
    }
    None
}

/// Decode a chunked transfer-encoded body
///
/// Chunks are pulled from the buffered reader one at a time: a hex size
/// line, exactly that many payload bytes, and the trailing CRLF. A zero-size
/// chunk terminates the body; any remaining trailer lines are drained. A
/// non-hexadecimal size line is a fatal framing error, and a connection
/// closing mid-chunk is a truncation, never an empty success.
async fn read_chunked_body<R>(reader: &mut R) -> Result<Vec<u8>>
where
    R: AsyncBufRead + Unpin,
{
    let mut body = Vec::new();

    loop {
        let Some(line) = read_line(reader).await? else {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before final chunk",
            )));
        };

        // Chunk extensions (";name=value") are allowed but ignored
        let size_field = line.split(';').next().unwrap_or("").trim();
        if size_field.is_empty() || !size_field.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidChunkSize(line));
        }
        let size = u64::from_str_radix(size_field, 16)
            .map_err(|_| Error::InvalidChunkSize(size_field.to_string()))?;

        if size == 0 {
            // Drain optional trailers up to the blank line
            while let Some(trailer) = read_line(reader).await? {
                if trailer.is_empty() {
                    break;
                }
            }
            return Ok(body);
        }

        // Compare without summing; a hostile size line can be near u64::MAX
        if size > MAX_RESPONSE_SIZE.saturating_sub(body.len() as u64) {
            return Err(Error::ResponseTooLarge {
                limit: MAX_RESPONSE_SIZE,
            });
        }

        let received = read_into(reader, &mut body, size).await?;
        if received < size {
            return Err(Error::TruncatedBody {
                expected: size,
                received,
            });
        }

        // Consume the CRLF terminating the chunk payload
        if read_line(reader).await?.is_none() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before final chunk",
            )));
        }
    }
}

/// Read a `Content-Length`-delimited body
async fn read_exact_body<R>(reader: &mut R, length: u64) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    if length > MAX_RESPONSE_SIZE {
        return Err(Error::ResponseTooLarge {
            limit: MAX_RESPONSE_SIZE,
        });
    }

    let mut body = Vec::new();
    let received = read_into(reader, &mut body, length).await?;
    if received < length {
        return Err(Error::TruncatedBody {
            expected: length,
            received,
        });
    }
    Ok(body)
}

/// Read until the server closes the connection
async fn read_body_to_end<R>(reader: &mut R) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut body = Vec::new();
    reader
        .take(MAX_RESPONSE_SIZE + 1)
        .read_to_end(&mut body)
        .await?;
    if body.len() as u64 > MAX_RESPONSE_SIZE {
        return Err(Error::ResponseTooLarge {
            limit: MAX_RESPONSE_SIZE,
        });
    }
    Ok(body)
}

/// Append up to `length` bytes from the reader, returning how many arrived
async fn read_into<R>(reader: &mut R, body: &mut Vec<u8>, length: u64) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut received = 0u64;
    let mut buffer = [0u8; 8192];

    while received < length {
        let want = usize::try_from((length - received).min(buffer.len() as u64))
            .unwrap_or(buffer.len());
        let n = reader.read(&mut buffer[..want]).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buffer[..n]);
        received += n as u64;
    }
    Ok(received)
}
