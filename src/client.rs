use bytes::Bytes;
use futures::Stream;
use futures::stream::{self, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::types::{
    ChatRequest, GenerateChunk, GenerateRequest, ModelListResponse, VersionResponse,
};

const DEFAULT_HOST: &str = "http://localhost:11434/";
const HOST_ENV_VAR: &str = "OLLAMA_HOST";

/// Client for a local Ollama server.
#[derive(Clone)]
pub struct Ollama {
    client: ReqwestClient,
    base_url: Url,
    timeout: Option<Duration>,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl fmt::Debug for Ollama {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ollama")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl Ollama {
    /// Create a new Ollama client.
    ///
    /// The host can be provided directly or read from the OLLAMA_HOST
    /// environment variable; it defaults to `http://localhost:11434/`.
    pub fn new(host: Option<String>) -> Result<Self> {
        Self::with_options(host, None)
    }

    /// Create a new client with custom settings.
    ///
    /// No timeout is applied unless one is given.
    pub fn with_options(host: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let host = match host {
            Some(host) => host,
            None => env::var(HOST_ENV_VAR).unwrap_or_else(|_| DEFAULT_HOST.to_string()),
        };
        let base_url = parse_host(&host)?;

        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that observes every chat request and response.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The server's base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers
    }

    /// Convert a transport-level reqwest error into our Error type.
    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                self.timeout.map(|t| t.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Send a request, recording request metrics and mapping transport errors.
    ///
    /// The status is not inspected.
    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = request.send().await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        result.map_err(|e| {
            CLIENT_REQUEST_ERRORS.click();
            self.map_send_error(e)
        })
    }

    /// Pass through successful responses; convert the rest to errors.
    async fn check_status(response: Response) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            CLIENT_REQUEST_ERRORS.click();
            Err(Self::process_error_response(response).await)
        }
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();
        match response.bytes().await {
            Ok(body) => error_from_body(status_code, &body),
            Err(e) => Error::http_client(
                format!("Failed to read error response: {}", e),
                Some(Box::new(e)),
            ),
        }
    }

    /// Send a chat request and read the complete response body.
    ///
    /// The body is a sequence of newline-delimited JSON chunks; decoding is
    /// left to the caller.  A non-success status is an error whose message is
    /// the server's diagnostic.
    pub async fn chat(&self, request: &ChatRequest) -> Result<Bytes> {
        let url = self.endpoint("api/chat")?;
        if let Some(logger) = &self.logger {
            logger.log_chat_request(request);
        }

        let response = self
            .execute(
                self.client
                    .post(url)
                    .headers(self.default_headers())
                    .json(request),
            )
            .await?;

        let status_code = response.status().as_u16();
        let success = response.status().is_success();
        let body = response.bytes().await.map_err(|e| {
            CLIENT_REQUEST_ERRORS.click();
            Error::streaming(
                format!("Failed to read response body: {}", e),
                Some(Box::new(e)),
            )
        })?;

        if let Some(logger) = &self.logger {
            logger.log_chat_response(status_code, &body);
        }

        if !success {
            CLIENT_REQUEST_ERRORS.click();
            return Err(error_from_body(status_code, &body));
        }
        Ok(body)
    }

    /// List the models available on the server.
    pub async fn list_models(&self) -> Result<ModelListResponse> {
        let url = self.endpoint("api/tags")?;
        let response = self.execute(self.client.get(url)).await?;
        let response = Self::check_status(response).await?;

        response.json::<ModelListResponse>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    /// Fetch the server's version.
    pub async fn version(&self) -> Result<VersionResponse> {
        let url = self.endpoint("api/version")?;
        let response = self.execute(self.client.get(url)).await?;
        let response = Self::check_status(response).await?;

        response.json::<VersionResponse>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    /// Generate a completion and stream it.
    ///
    /// Returns a stream of GenerateChunk objects that can be processed
    /// incrementally, one per line of the response body.
    pub async fn generate(
        &self,
        request: GenerateRequest,
    ) -> Result<impl Stream<Item = Result<GenerateChunk>>> {
        let url = self.endpoint("api/generate")?;
        let response = self
            .execute(
                self.client
                    .post(url)
                    .headers(self.default_headers())
                    .json(&request),
            )
            .await?;
        let response = Self::check_status(response).await?;

        Ok(process_ndjson(response.bytes_stream()))
    }
}

/// Turn a user-supplied host into a base URL.
///
/// `127.0.0.1:11434` becomes `http://127.0.0.1:11434/`; a trailing slash is
/// always present so that endpoint paths join beneath it.
fn parse_host(host: &str) -> Result<Url> {
    let host = host.trim();
    if host.is_empty() {
        return Err(Error::validation(
            "host must not be empty",
            Some("host".to_string()),
        ));
    }
    let mut normalized = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{host}")
    };
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Ok(Url::parse(&normalized)?)
}

/// Map a non-success status and its body to our Error type.
fn error_from_body(status_code: u16, body: &[u8]) -> Error {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error: Option<String>,
    }

    let raw = String::from_utf8_lossy(body).trim().to_string();
    let message = serde_json::from_slice::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error)
        .unwrap_or(raw);

    match status_code {
        400 => Error::bad_request(message),
        404 => Error::not_found(message, None, None),
        408 => Error::timeout(message, None),
        500 => Error::internal_server(message),
        502..=504 => Error::service_unavailable(message),
        _ => Error::api(status_code, message),
    }
}

/// Process a stream of bytes into a stream of newline-delimited JSON values.
fn process_ndjson<T, S>(byte_stream: S) -> impl Stream<Item = Result<T>>
where
    T: DeserializeOwned,
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin,
{
    // Convert reqwest errors to our error type
    let stream = byte_stream.map(|result| {
        result.map_err(|e| {
            Error::streaming(format!("Error in HTTP stream: {}", e), Some(Box::new(e)))
        })
    });

    // Raw bytes until a newline arrives; a character may span two chunks.
    let buffer: Vec<u8> = Vec::new();

    stream::unfold(
        (stream, buffer, false),
        move |(mut stream, mut buffer, finished)| async move {
            if finished {
                return None;
            }
            loop {
                if let Some(line) = extract_line(&mut buffer) {
                    if is_blank(&line) {
                        continue;
                    }
                    return Some((parse_line(&line), (stream, buffer, false)));
                }

                match stream.next().await {
                    Some(Ok(bytes)) => buffer.extend_from_slice(&bytes),
                    Some(Err(e)) => {
                        return Some((Err(e), (stream, buffer, true)));
                    }
                    None => {
                        // End of stream; the last line may lack its newline.
                        if is_blank(&buffer) {
                            return None;
                        }
                        let line = std::mem::take(&mut buffer);
                        return Some((parse_line(&line), (stream, buffer, true)));
                    }
                }
            }
        },
    )
}

/// Remove and return the first complete line (without its newline).
fn extract_line(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let newline = buffer.iter().position(|b| *b == b'\n')?;
    let mut line: Vec<u8> = buffer.drain(..=newline).collect();
    line.pop();
    Some(line)
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

fn parse_line<T: DeserializeOwned>(line: &[u8]) -> Result<T> {
    serde_json::from_slice(line).map_err(|e| {
        Error::serialization(
            format!("Failed to parse stream line: {}", e),
            Some(Box::new(e)),
        )
    })
}
