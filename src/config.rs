use std::collections::HashMap;

use anyhow::{bail, Result};

/// Everything a request task needs to know. Built once before dispatch and
/// shared read-only between all tasks.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub url: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub requests: usize,
    pub concurrency: usize,
}

impl RequestConfig {
    pub fn new(url: impl Into<String>) -> Self {
        RequestConfig {
            url: url.into(),
            method: "GET".to_string(),
            headers: HashMap::new(),
            body: String::new(),
            requests: 100,
            concurrency: 10,
        }
    }

    /// Only a missing target or a zero concurrency is fatal. A target that
    /// cannot be turned into a request fails each request on its own.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            bail!("target URL is required");
        }
        if self.concurrency == 0 {
            bail!("concurrency must be at least 1");
        }
        Ok(())
    }
}

/// Parses `Key:Value,Key:Value`. Pairs without a `:` are dropped.
pub fn parse_headers(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| pair.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headers_drops_malformed_pairs() {
        let headers = parse_headers("Authorization:Bearer x,Bad");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("Authorization").map(String::as_str), Some("Bearer x"));
    }

    #[test]
    fn test_parse_headers_trims_and_keeps_colons_in_value() {
        let headers = parse_headers(" Accept : text/html , X-Origin:http://a:8080");
        assert_eq!(headers.get("Accept").map(String::as_str), Some("text/html"));
        assert_eq!(headers.get("X-Origin").map(String::as_str), Some("http://a:8080"));
    }

    #[test]
    fn test_parse_headers_empty_input() {
        assert!(parse_headers("").is_empty());
    }

    #[test]
    fn test_parse_headers_last_duplicate_wins() {
        let headers = parse_headers("X-Id:1,X-Id:2");
        assert_eq!(headers.get("X-Id").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_validate_rejects_missing_url() {
        let config = RequestConfig::new("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_leaves_unparsable_url_to_requests() {
        let config = RequestConfig::new("http://bad host/");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = RequestConfig::new("http://localhost:8080/");
        config.concurrency = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn test_validate_accepts_defaults() {
        let config = RequestConfig::new("http://localhost:8080/");
        assert!(config.validate().is_ok());
        assert_eq!(config.requests, 100);
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.method, "GET");
    }
}
