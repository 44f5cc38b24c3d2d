use std::collections::HashMap;
use std::fmt;

use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("Invalid endpoint URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Endpoint URL must use http or https: {url}")]
    UnsupportedScheme { url: String },
    #[error("Endpoint URL has no host: {url}")]
    MissingHost { url: String },
    #[error("Invalid header {name:?} for {url}")]
    InvalidHeader { url: String, name: String },
}

/// One monitored target, as loaded from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

impl EndpointDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            name: None,
            url: url.into(),
            method: default_method(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// The method actually used on the wire. Never fails: unknown methods map to GET.
    pub fn http_method(&self) -> HttpMethod {
        HttpMethod::parse(&self.method)
    }

    /// Label for log fields: the configured name, or the URL.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }

    pub fn parsed_url(&self) -> Result<Url, EndpointError> {
        let parsed = Url::parse(&self.url).map_err(|e| EndpointError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(EndpointError::UnsupportedScheme {
                url: self.url.clone(),
            });
        }
        Ok(parsed)
    }

    pub fn domain_key(&self) -> Result<DomainKey, EndpointError> {
        let parsed = self.parsed_url()?;
        DomainKey::from_url(&parsed).ok_or_else(|| EndpointError::MissingHost {
            url: self.url.clone(),
        })
    }

    pub fn validate(&self) -> Result<(), EndpointError> {
        self.domain_key()?;
        for (name, value) in &self.headers {
            let valid = HeaderName::from_bytes(name.as_bytes()).is_ok()
                && HeaderValue::from_str(value).is_ok();
            if !valid {
                return Err(EndpointError::InvalidHeader {
                    url: self.url.clone(),
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Methods the prober knows how to issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
}

impl HttpMethod {
    /// Case-insensitive lookup; anything unrecognised falls back to GET.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            "PATCH" => Self::Patch,
            _ => Self::Get,
        }
    }

    pub fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
            Self::Head => reqwest::Method::HEAD,
            Self::Options => reqwest::Method::OPTIONS,
            Self::Patch => reqwest::Method::PATCH,
        }
    }

    pub fn sends_body(self) -> bool {
        self != Self::Get
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_reqwest().as_str())
    }
}

/// Network location of an endpoint: host, plus `:port` when the URL names a non-default port.
///
/// Endpoints on the same host and port share one key regardless of path or query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainKey(String);

impl DomainKey {
    pub fn from_url(url: &Url) -> Option<Self> {
        let host = url.host_str().filter(|h| !h.is_empty())?;
        let key = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        Some(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!(HttpMethod::parse("post"), HttpMethod::Post);
        assert_eq!(HttpMethod::parse("Patch"), HttpMethod::Patch);
        assert_eq!(HttpMethod::parse("HEAD"), HttpMethod::Head);
        assert_eq!(HttpMethod::parse("options"), HttpMethod::Options);
        assert_eq!(HttpMethod::parse("delete"), HttpMethod::Delete);
        assert_eq!(HttpMethod::parse("put"), HttpMethod::Put);
    }

    #[test]
    fn unknown_method_falls_back_to_get() {
        assert_eq!(HttpMethod::parse("FOO"), HttpMethod::Get);
        assert_eq!(HttpMethod::parse(""), HttpMethod::Get);
        let ep = EndpointDescriptor::new("https://example.com/").with_method("TRACE");
        assert_eq!(ep.http_method(), HttpMethod::Get);
    }

    #[test]
    fn only_get_omits_body() {
        assert!(!HttpMethod::Get.sends_body());
        assert!(HttpMethod::Post.sends_body());
        assert!(HttpMethod::Delete.sends_body());
    }

    #[test]
    fn domain_key_ignores_path_and_query() {
        let a = EndpointDescriptor::new("https://fetch.com/careers");
        let b = EndpointDescriptor::new("https://fetch.com/some/post/endpoint?x=1");
        assert_eq!(a.domain_key().unwrap(), b.domain_key().unwrap());
        assert_eq!(a.domain_key().unwrap().as_str(), "fetch.com");
    }

    #[test]
    fn domain_key_keeps_explicit_port() {
        let ep = EndpointDescriptor::new("http://127.0.0.1:8080/health");
        assert_eq!(ep.domain_key().unwrap().as_str(), "127.0.0.1:8080");

        let other = EndpointDescriptor::new("http://127.0.0.1:9090/health");
        assert_ne!(ep.domain_key().unwrap(), other.domain_key().unwrap());
    }

    #[test]
    fn domain_key_brackets_ipv6() {
        let ep = EndpointDescriptor::new("http://[::1]:3000/");
        assert_eq!(ep.domain_key().unwrap().as_str(), "[::1]:3000");
    }

    #[test]
    fn validate_rejects_relative_url() {
        let err = EndpointDescriptor::new("/just/a/path").validate().unwrap_err();
        assert!(matches!(err, EndpointError::InvalidUrl { .. }), "{err}");
    }

    #[test]
    fn validate_rejects_non_http_scheme() {
        let err = EndpointDescriptor::new("ftp://example.com/file")
            .validate()
            .unwrap_err();
        assert!(matches!(err, EndpointError::UnsupportedScheme { .. }), "{err}");
    }

    #[test]
    fn validate_rejects_bad_header() {
        let err = EndpointDescriptor::new("https://example.com/")
            .with_header("bad header", "v")
            .validate()
            .unwrap_err();
        assert!(matches!(err, EndpointError::InvalidHeader { .. }), "{err}");
    }

    #[test]
    fn label_prefers_name() {
        let ep = EndpointDescriptor::new("https://example.com/").with_name("index");
        assert_eq!(ep.label(), "index");
        assert_eq!(
            EndpointDescriptor::new("https://example.com/").label(),
            "https://example.com/"
        );
    }
}
