use http::header::{CONTENT_LENGTH, HeaderName, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderValue};

use crate::RequestError;

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub reason: String,
    pub http_version: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Response {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Parses a complete HTTP/1.x response read until the peer closed the stream.
    pub fn parse(bytes: &[u8]) -> Result<Self, RequestError> {
        let split = find(bytes, b"\r\n\r\n")
            .ok_or_else(|| RequestError::InvalidResponse("missing header terminator".to_string()))?;
        let head = String::from_utf8_lossy(&bytes[..split]);
        let raw_body = &bytes[split + 4..];

        let mut lines = head.split("\r\n");
        let status_line = lines
            .next()
            .filter(|line| line.starts_with("HTTP/"))
            .ok_or_else(|| RequestError::InvalidResponse("missing status line".to_string()))?;
        let mut status_parts = status_line.splitn(3, ' ');
        let http_version = status_parts.next().unwrap_or_default().to_string();
        let status = status_parts
            .next()
            .and_then(|code| code.parse::<u16>().ok())
            .ok_or_else(|| RequestError::InvalidResponse(format!("bad status line: {status_line}")))?;
        let reason = status_parts.next().unwrap_or_default().trim().to_string();

        let mut headers = HeaderMap::new();
        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                let name = HeaderName::from_bytes(name.trim().as_bytes())
                    .map_err(|_| RequestError::InvalidResponse(format!("invalid header: {line}")))?;
                let value = HeaderValue::from_str(value.trim())
                    .map_err(|_| RequestError::InvalidResponse(format!("invalid header: {line}")))?;
                headers.append(name, value);
            }
        }

        let chunked = headers
            .get(TRANSFER_ENCODING)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.to_ascii_lowercase().contains("chunked"));
        let body = if chunked {
            decode_chunked(raw_body)?
        } else {
            let declared = headers
                .get(CONTENT_LENGTH)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<usize>().ok());
            match declared {
                Some(length) if length < raw_body.len() => raw_body[..length].to_vec(),
                _ => raw_body.to_vec(),
            }
        };

        Ok(Self {
            status,
            reason,
            http_version,
            headers,
            body,
        })
    }
}

fn decode_chunked(mut input: &[u8]) -> Result<Vec<u8>, RequestError> {
    let mut output = Vec::new();
    loop {
        let line_end = find(input, b"\r\n")
            .ok_or_else(|| RequestError::InvalidResponse("truncated chunk size".to_string()))?;
        let size_line = String::from_utf8_lossy(&input[..line_end]);
        let size_text = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_text, 16)
            .map_err(|_| RequestError::InvalidResponse(format!("bad chunk size: {size_text}")))?;
        input = &input[line_end + 2..];
        if size == 0 {
            return Ok(output);
        }
        if input.len() < size {
            return Err(RequestError::InvalidResponse("truncated chunk".to_string()));
        }
        output.extend_from_slice(&input[..size]);
        input = input.get(size + 2..).unwrap_or_default();
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
