//! Minimal HTTP/1.1 wire handling
//!
//! Reads one request at a time off a buffered stream (request line,
//! headers, `Content-Length` body) and serializes responses with
//! permissive CORS headers. Chunked transfer encoding is not supported;
//! sequential requests on one connection are.

use std::collections::HashMap;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::uploads::MAX_FILE_BYTES;

/// Ceiling for JSON and urlencoded bodies.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Multipart bodies carry the attachment plus field overhead.
pub const MAX_MULTIPART_BODY_BYTES: usize = MAX_FILE_BYTES + 64 * 1024;

/// A parsed HTTP request
#[derive(Debug)]
pub struct Request {
    pub method: String,
    /// Path without the query string, verbatim.
    pub path: String,
    pub query: HashMap<String, String>,
    /// Header names lowercased.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|v| v.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(|v| v.as_str())
    }
}

/// Read one request from the stream.
///
/// Returns `Ok(None)` when the client closed the connection between
/// requests; protocol violations mid-request are errors.
pub async fn read_request<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Option<Request>> {
    let mut line = String::new();

    // tolerate blank lines before the request line
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        if !line.trim().is_empty() {
            break;
        }
    }

    let mut parts = line.split_whitespace();
    let (method, target, version) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(m), Some(t), Some(v), None) => (m.to_string(), t.to_string(), v),
        _ => {
            return Err(Error::Protocol(format!(
                "malformed request line: {}",
                line.trim()
            )))
        }
    };
    if !version.starts_with("HTTP/") {
        return Err(Error::Protocol(format!("unsupported version: {}", version)));
    }

    let (path, raw_query) = match target.split_once('?') {
        Some((p, q)) => (p.to_string(), q.to_string()),
        None => (target, String::new()),
    };
    let query: HashMap<String, String> = url::form_urlencoded::parse(raw_query.as_bytes())
        .into_owned()
        .collect();

    let mut headers = HashMap::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Err(Error::Protocol("unexpected end of headers".to_string()));
        }
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            break;
        }
        let (name, value) = trimmed
            .split_once(':')
            .ok_or_else(|| Error::Protocol(format!("malformed header: {}", trimmed)))?;
        headers.insert(name.to_ascii_lowercase(), value.trim().to_string());
    }

    let content_length = match headers.get("content-length") {
        Some(v) => v
            .parse::<usize>()
            .map_err(|_| Error::Protocol(format!("invalid content-length: {}", v)))?,
        None => 0,
    };

    let is_multipart = headers
        .get("content-type")
        .map(|ct| ct.starts_with("multipart/form-data"))
        .unwrap_or(false);
    let limit = if is_multipart {
        MAX_MULTIPART_BODY_BYTES
    } else {
        MAX_BODY_BYTES
    };
    if content_length > limit {
        return Err(Error::Validation(
            "El cuerpo de la petición es demasiado grande".to_string(),
        ));
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await?;

    Ok(Some(Request {
        method,
        path,
        query,
        headers,
        body,
    }))
}

/// An HTTP response ready for serialization
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl Response {
    /// JSON response from any serializable value.
    pub fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> Result<Response> {
        Ok(Response {
            status,
            content_type: "application/json".to_string(),
            body: serde_json::to_vec(value)?,
        })
    }

    /// The `{"error": ...}` body every failed request gets.
    pub fn from_error(err: &Error) -> Response {
        let body = serde_json::json!({ "error": err.to_string() });
        Response {
            status: err.status(),
            content_type: "application/json".to_string(),
            body: body.to_string().into_bytes(),
        }
    }

    /// Empty reply for OPTIONS preflights.
    pub fn no_content() -> Response {
        Response {
            status: 204,
            content_type: "text/plain".to_string(),
            body: Vec::new(),
        }
    }

    pub fn bytes(status: u16, content_type: &str, body: Vec<u8>) -> Response {
        Response {
            status,
            content_type: content_type.to_string(),
            body,
        }
    }

    /// Serialize onto the stream: status line, headers (CORS included),
    /// blank line, body.
    pub async fn write_to<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> Result<()> {
        let head = format!(
            "HTTP/1.1 {} {}\r\n\
             Content-Type: {}\r\n\
             Content-Length: {}\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
             Access-Control-Allow-Headers: Content-Type\r\n\
             \r\n",
            self.status,
            reason(self.status),
            self.content_type,
            self.body.len()
        );
        writer.write_all(head.as_bytes()).await?;
        writer.write_all(&self.body).await?;
        writer.flush().await?;
        Ok(())
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "",
    }
}
