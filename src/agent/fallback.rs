//! Synthesized responses for requests nothing else can answer

use crate::http::Response;

/// Placeholder shown in place of images that are neither cached nor reachable
pub const PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="300">
<rect width="100%" height="100%" fill="#111"/>
<text x="50%" y="50%" fill="#999" font-size="20" text-anchor="middle" dominant-baseline="middle">offline</text>
</svg>"##;

/// Inline SVG placeholder image
pub fn placeholder_image() -> Response {
    Response::new(200)
        .with_header("content-type", "image/svg+xml")
        .with_body(PLACEHOLDER_SVG)
}

/// Plain-text 503
pub fn service_unavailable(body: &str) -> Response {
    Response::new(503)
        .with_header("content-type", "text/plain; charset=utf-8")
        .with_body(body)
}
