use crate::UrlError;
use url::Url;

/// Parses a URL string and accepts it only if it is absolute http(s)
///
/// # Examples
///
/// ```
/// use tidepool::url::parse_http_url;
///
/// assert!(parse_http_url("https://example.com/page").is_ok());
/// assert!(parse_http_url("mailto:someone@example.com").is_err());
/// ```
pub fn parse_http_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(UrlError::CannotBeBase(url_str.to_string()));
    }

    Ok(url)
}

/// Computes the content-store key for a URL
///
/// The key is the absolute URL with its fragment removed. Everything else
/// (query string, trailing slash, case of the path) is significant, because two
/// URLs that differ there can be served different bytes by the origin.
///
/// # Examples
///
/// ```
/// use tidepool::url::store_key;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/games/?id=4#top").unwrap();
/// assert_eq!(store_key(&url), "https://example.com/games/?id=4");
/// ```
pub fn store_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_fragment(None);
    key.to_string()
}
