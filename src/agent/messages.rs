//! Control and status messages exchanged with client pages
//!
//! Messages are JSON objects discriminated by a `type` field, e.g.
//! `{"type":"PRECACHE_URLS","urls":["/a.png"]}`.

use serde::{Deserialize, Serialize};

/// Client → agent messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Fetch (no-cors) and store each URL, best-effort
    PrecacheUrls { urls: Vec<String> },
    /// Report the current store's keys to every client
    GetCacheStatus,
}

impl ControlMessage {
    /// Parses a message from its JSON form
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Agent → client messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusMessage {
    CacheStatus { count: usize, urls: Vec<String> },
    SwReady { message: String },
}

impl StatusMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_precache() {
        let msg = ControlMessage::from_json(r#"{"type":"PRECACHE_URLS","urls":["/a","/b"]}"#)
            .unwrap();
        assert_eq!(
            msg,
            ControlMessage::PrecacheUrls {
                urls: vec!["/a".to_string(), "/b".to_string()]
            }
        );
    }

    #[test]
    fn test_parse_get_cache_status() {
        let msg = ControlMessage::from_json(r#"{"type":"GET_CACHE_STATUS"}"#).unwrap();
        assert_eq!(msg, ControlMessage::GetCacheStatus);
    }

    #[test]
    fn test_reject_malformed() {
        assert!(ControlMessage::from_json(r#"{"type":"PRECACHE_URLS"}"#).is_err());
        assert!(ControlMessage::from_json(r#"{"type":"PRECACHE_URLS","urls":"x"}"#).is_err());
        assert!(ControlMessage::from_json(r#"{"type":"SELF_DESTRUCT"}"#).is_err());
        assert!(ControlMessage::from_json("null").is_err());
    }

    #[test]
    fn test_status_json() {
        let status = StatusMessage::CacheStatus {
            count: 1,
            urls: vec!["https://example.com/".to_string()],
        };
        assert_eq!(
            status.to_json().unwrap(),
            r#"{"type":"CACHE_STATUS","count":1,"urls":["https://example.com/"]}"#
        );

        let ready = StatusMessage::SwReady {
            message: "active".to_string(),
        };
        assert_eq!(
            ready.to_json().unwrap(),
            r#"{"type":"SW_READY","message":"active"}"#
        );
    }
}
