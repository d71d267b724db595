use crate::UrlError;
use url::Url;

/// Returns true if two URLs share scheme, host and port
///
/// Default ports are taken into account, so `https://example.com` and
/// `https://example.com:443` are the same origin.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use tidepool::url::is_same_origin;
///
/// let site = Url::parse("https://games.example.com/").unwrap();
/// let page = Url::parse("https://games.example.com/snake.html").unwrap();
/// let cdn = Url::parse("https://cdn.example.com/snake.js").unwrap();
/// assert!(is_same_origin(&site, &page));
/// assert!(!is_same_origin(&site, &cdn));
/// ```
pub fn is_same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// Resolves a site-relative path (or absolute URL) against the agent's origin
///
/// Shell paths, fallback pages and precache entries are written as paths such as
/// `/offline.html`; this turns them into absolute URLs that can be fetched and
/// used as store keys.
pub fn resolve_against(origin: &Url, path: &str) -> Result<Url, UrlError> {
    let resolved = origin
        .join(path.trim())
        .map_err(|e| UrlError::Parse(format!("{}: {}", path, e)))?;

    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return Err(UrlError::InvalidScheme(resolved.scheme().to_string()));
    }

    Ok(resolved)
}
