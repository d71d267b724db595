use std::collections::BTreeMap;

/// Response headers, keyed by lowercase header name
pub type Headers = BTreeMap<String, String>;

/// A response snapshot as served to a client or held in a content store
///
/// Opaque responses come from no-cors fetches of cross-origin resources. Their
/// body is kept so it can be replayed to the page, but the agent must not inspect
/// it: the status is reported as 0 and no headers are exposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: Headers,
    body: Vec<u8>,
    opaque: bool,
}

impl Response {
    /// Creates an empty response with the given status
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Vec::new(),
            opaque: false,
        }
    }

    /// Creates an opaque response around a body the agent cannot read
    pub fn opaque(body: Vec<u8>) -> Self {
        Self {
            status: 0,
            headers: Headers::new(),
            body,
            opaque: true,
        }
    }

    /// Rebuilds a response from its stored parts
    pub fn from_parts(status: u16, headers: Headers, body: Vec<u8>, opaque: bool) -> Self {
        Self {
            status,
            headers,
            body,
            opaque,
        }
    }

    /// Adds a header, lowercasing the name
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    /// Returns true for 2xx statuses
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true for 3xx statuses
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// Returns true if this response may be written to a content store
    ///
    /// Only successful responses and opaque responses qualify; error pages and
    /// redirects never replace a stored copy.
    pub fn is_cacheable(&self) -> bool {
        self.ok() || self.opaque
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Returns true if the content type declares HTML
    pub fn is_html(&self) -> bool {
        self.content_type()
            .map(|ct| ct.to_ascii_lowercase().contains("text/html"))
            .unwrap_or(false)
    }

    /// Returns the body as text, or None for opaque responses
    pub fn text(&self) -> Option<String> {
        if self.opaque {
            return None;
        }
        Some(String::from_utf8_lossy(&self.body).into_owned())
    }
}
