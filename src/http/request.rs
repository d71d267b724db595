use reqwest::Method;
use url::Url;

/// Whether a request is a full-page navigation or a subresource load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMode {
    /// A top-level document load (address bar, link click, reload)
    Navigate,
    /// Anything a page loads on its own: images, scripts, stylesheets, fetches
    Subresource,
}

/// What the requester intends to do with the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Destination {
    Document,
    Image,
    Script,
    Style,
    Font,
    #[default]
    Other,
}

impl Destination {
    /// Parses a destination hint as a host would report it
    ///
    /// Unknown or empty hints map to `Other`.
    pub fn from_hint(hint: &str) -> Self {
        match hint.trim().to_ascii_lowercase().as_str() {
            "document" | "iframe" | "frame" => Self::Document,
            "image" => Self::Image,
            "script" | "worker" | "sharedworker" => Self::Script,
            "style" => Self::Style,
            "font" => Self::Font,
            _ => Self::Other,
        }
    }
}

/// An intercepted request, captured once and never modified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    url: Url,
    method: Method,
    mode: RequestMode,
    destination: Destination,
}

impl Request {
    /// Creates a request descriptor
    pub fn new(url: Url, method: Method, mode: RequestMode, destination: Destination) -> Self {
        Self {
            url,
            method,
            mode,
            destination,
        }
    }

    /// A GET navigation for a document
    pub fn navigate(url: Url) -> Self {
        Self::new(url, Method::GET, RequestMode::Navigate, Destination::Document)
    }

    /// A GET subresource load with the given destination
    pub fn subresource(url: Url, destination: Destination) -> Self {
        Self::new(url, Method::GET, RequestMode::Subresource, destination)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    /// Returns true for full-page loads
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}
