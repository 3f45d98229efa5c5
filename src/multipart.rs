//! `multipart/form-data` body parsing
//!
//! Pure byte slicing over an already-read body; enough of RFC 7578 for
//! browser-generated uploads (one boundary, CRLF line endings, a
//! `Content-Disposition` per part).

use crate::error::{Error, Result};

/// One part of a multipart body
#[derive(Debug)]
pub struct Part {
    pub name: String,
    /// Present on file parts, absent on plain fields.
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Part {
    /// Field value as text, lossy on invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// Extract the boundary parameter from a Content-Type header value.
pub fn boundary(content_type: &str) -> Option<String> {
    let mut parts = content_type.split(';');
    if !parts.next()?.trim().eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }
    for param in parts {
        if let Some((name, value)) = param.trim().split_once('=') {
            if name.trim().eq_ignore_ascii_case("boundary") {
                return Some(value.trim().trim_matches('"').to_string());
            }
        }
    }
    None
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Parse a multipart body into its parts.
pub fn parse(body: &[u8], boundary: &str) -> Result<Vec<Part>> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let mut parts = Vec::new();

    let first = find(body, &delimiter)
        .ok_or_else(|| Error::Protocol("multipart body missing boundary".to_string()))?;
    let mut rest = &body[first + delimiter.len()..];

    loop {
        if rest.starts_with(b"--") {
            break; // closing delimiter
        }
        rest = rest.strip_prefix(b"\r\n").unwrap_or(rest);

        let end = find(rest, &delimiter)
            .ok_or_else(|| Error::Protocol("unterminated multipart part".to_string()))?;
        let mut segment = &rest[..end];
        rest = &rest[end + delimiter.len()..];

        // the CRLF before the delimiter belongs to the delimiter
        if segment.ends_with(b"\r\n") {
            segment = &segment[..segment.len() - 2];
        }

        let split = find(segment, b"\r\n\r\n")
            .ok_or_else(|| Error::Protocol("multipart part missing header block".to_string()))?;
        let header_block = std::str::from_utf8(&segment[..split])
            .map_err(|_| Error::Protocol("multipart part headers are not UTF-8".to_string()))?;
        let data = segment[split + 4..].to_vec();

        if let Some(part) = parse_part(header_block, data) {
            parts.push(part);
        }
    }

    Ok(parts)
}

fn parse_part(header_block: &str, data: Vec<u8>) -> Option<Part> {
    let mut name = None;
    let mut filename = None;
    let mut content_type = None;

    for line in header_block.lines() {
        let (header, value) = match line.split_once(':') {
            Some(pair) => pair,
            None => continue,
        };
        match header.trim().to_ascii_lowercase().as_str() {
            "content-disposition" => {
                for param in value.split(';').skip(1) {
                    if let Some((key, raw)) = param.trim().split_once('=') {
                        let raw = raw.trim().trim_matches('"').to_string();
                        match key.trim() {
                            "name" => name = Some(raw),
                            "filename" => filename = Some(raw),
                            _ => {}
                        }
                    }
                }
            }
            "content-type" => content_type = Some(value.trim().to_string()),
            _ => {}
        }
    }

    // parts without a field name are dropped, not fatal
    name.map(|name| Part {
        name,
        filename,
        content_type,
        data,
    })
}
