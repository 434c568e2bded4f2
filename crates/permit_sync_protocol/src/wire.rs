//! HTTP wire primitives for the remote permit collection.
//!
//! These types describe requests and responses independently of any HTTP
//! library so that both the client transport and the reference server can
//! share them.

use serde::Serialize;
use std::fmt;

/// Path of the permit collection, relative to the server base URL.
pub const PERMITS_PATH: &str = "/permits/";

/// Content type sent with every request.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read.
    Get,
    /// Create.
    Post,
    /// Replace.
    Put,
    /// Remove.
    Delete,
    /// Reachability probe.
    Head,
}

impl Method {
    /// Returns the method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Request method.
    pub method: Method,
    /// Absolute URL or path.
    pub url: String,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Request body, if any.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a request without a body, carrying the JSON content type.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: vec![("Content-Type".to_string(), CONTENT_TYPE_JSON.to_string())],
            body: None,
        }
    }

    /// Attaches a JSON body.
    pub fn with_json<T: Serialize>(mut self, value: &T) -> serde_json::Result<Self> {
        self.body = Some(serde_json::to_vec(value)?);
        Ok(self)
    }

    /// Attaches a raw body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Returns the value of the first header with the given name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the body length in bytes.
    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Vec::len)
    }
}

/// An HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response body (may be empty).
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response with an empty body.
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }

    /// Creates a response with a JSON body.
    pub fn json<T: Serialize>(status: u16, value: &T) -> serde_json::Result<Self> {
        Ok(Self {
            status,
            body: serde_json::to_vec(value)?,
        })
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Percent-encodes an identifier for use as a single URL path segment.
///
/// Everything outside the RFC 3986 unreserved set is escaped, so `/`, `?`
/// and `#` inside an identifier cannot change which resource is addressed.
pub fn encode_path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(char::from(byte));
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

/// Reverses [`encode_path_segment`]. Returns `None` on a malformed escape or
/// a result that is not UTF-8.
pub fn decode_path_segment(segment: &str) -> Option<String> {
    let bytes = segment.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = std::str::from_utf8(bytes.get(i + 1..i + 3)?).ok()?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_to_json_content_type() {
        let request = HttpRequest::new(Method::Get, "http://localhost/permits/");
        assert_eq!(request.header("content-type"), Some(CONTENT_TYPE_JSON));
        assert_eq!(request.body_len(), 0);
    }

    #[test]
    fn success_statuses() {
        assert!(HttpResponse::empty(200).is_success());
        assert!(HttpResponse::empty(201).is_success());
        assert!(HttpResponse::empty(204).is_success());
        assert!(!HttpResponse::empty(304).is_success());
        assert!(!HttpResponse::empty(404).is_success());
        assert!(!HttpResponse::empty(500).is_success());
    }

    #[test]
    fn json_body() {
        let request = HttpRequest::new(Method::Post, "/permits/")
            .with_json(&serde_json::json!({"id": "1"}))
            .unwrap();
        assert_eq!(request.body.as_deref(), Some(br#"{"id":"1"}"#.as_slice()));
    }

    #[test]
    fn path_segment_escapes_reserved_characters() {
        assert_eq!(encode_path_segment("a1-b_2.c~"), "a1-b_2.c~");
        assert_eq!(encode_path_segment("a/b?c#d"), "a%2Fb%3Fc%23d");
        assert_eq!(encode_path_segment("caf\u{e9} 1"), "caf%C3%A9%201");
        assert_eq!(decode_path_segment("a%2Fb%3Fc%23d").as_deref(), Some("a/b?c#d"));
        assert_eq!(decode_path_segment("caf%C3%A9%201").as_deref(), Some("caf\u{e9} 1"));
    }

    #[test]
    fn malformed_escape_rejected() {
        assert_eq!(decode_path_segment("50%"), None);
        assert_eq!(decode_path_segment("%zz"), None);
        assert_eq!(decode_path_segment("%FF"), None);
    }
}
