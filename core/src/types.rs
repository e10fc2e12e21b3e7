//! Declared request targets and the spec that holds them.
//!
//! # Design
//! A `Spec` is built once (usually from JSON) and then only read, apart from
//! an optional base-URL rewrite before a run. Ids are checked for uniqueness
//! at construction, so resolution by id is unambiguous.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::{Position, Url};

use crate::builder::normalize_route;
use crate::error::{Error, Result};
use crate::http::HttpMethod;

/// SigV4 settings for one target. An empty `profile` means environment
/// credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsSignConfig {
    pub region: String,
    #[serde(default)]
    pub profile: String,
}

/// A named, pre-declared request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestTarget {
    pub id: String,
    pub method: HttpMethod,
    /// Route in any of the forms accepted by `normalize_route`.
    pub url: String,
    /// Header pairs in declaration order; repeated names add values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
    /// JSON body, sent with POST only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsSignConfig>,
}

impl RequestTarget {
    pub fn new(id: &str, method: HttpMethod, url: &str) -> Self {
        Self {
            id: id.to_string(),
            method,
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
            aws: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_aws(mut self, region: &str, profile: &str) -> Self {
        self.aws = Some(AwsSignConfig {
            region: region.to_string(),
            profile: profile.to_string(),
        });
        self
    }

    /// Point the target at another host, keeping its path and query.
    ///
    /// `base` is normalized like a route; any path it carries becomes a
    /// prefix, so `https://api.example.com/prod` + `/users` gives
    /// `https://api.example.com/prod/users`.
    pub fn set_base_url(&mut self, base: &str) -> Result<()> {
        let base_url = parse_normalized(base)?;
        let current = parse_normalized(&self.url)?;

        let prefix = base_url[..Position::AfterPath].trim_end_matches('/');
        self.url = format!("{prefix}{}", &current[Position::BeforePath..]);
        Ok(())
    }
}

fn parse_normalized(route: &str) -> Result<Url> {
    let normalized = normalize_route(route)?;
    Url::parse(&normalized).map_err(|e| Error::InvalidRoute {
        route: route.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Deserialize)]
struct RawSpec {
    requests: Vec<RequestTarget>,
}

/// Ordered set of targets with unique ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spec {
    requests: Vec<RequestTarget>,
}

impl Spec {
    /// Fails with `DuplicateTarget` on the first repeated id.
    pub fn new(requests: Vec<RequestTarget>) -> Result<Self> {
        let mut seen = HashSet::new();
        for target in &requests {
            if !seen.insert(target.id.as_str()) {
                return Err(Error::DuplicateTarget(target.id.clone()));
            }
        }
        Ok(Self { requests })
    }

    /// Parse `{"requests": [...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawSpec = serde_json::from_str(json)?;
        Self::new(raw.requests)
    }

    pub fn targets(&self) -> &[RequestTarget] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Look a target up by id. The first declared match wins.
    pub fn resolve(&self, id: &str) -> Result<&RequestTarget> {
        self.requests
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::UnknownTarget(id.to_string()))
    }

    /// Rewrite the base URL of every target, stopping at the first failure.
    pub fn set_base_url(&mut self, base: &str) -> Result<()> {
        for target in &mut self.requests {
            target.set_base_url(base)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec() -> Spec {
        Spec::new(vec![
            RequestTarget::new("a", HttpMethod::Get, "/a"),
            RequestTarget::new("b", HttpMethod::Post, ":8080/b").with_body(json!({"x": 1})),
            RequestTarget::new("c", HttpMethod::Delete, "https://example.com/c?force=true"),
        ])
        .unwrap()
    }

    #[test]
    fn resolve_finds_declared_target() {
        let spec = spec();
        assert_eq!(spec.resolve("b").unwrap().method, HttpMethod::Post);
        assert_eq!(spec.resolve("c").unwrap().url, "https://example.com/c?force=true");
    }

    #[test]
    fn resolve_unknown_id_fails() {
        let err = spec().resolve("x").unwrap_err();
        assert_eq!(err, Error::UnknownTarget("x".to_string()));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Spec::new(vec![
            RequestTarget::new("a", HttpMethod::Get, "/1"),
            RequestTarget::new("a", HttpMethod::Get, "/2"),
        ])
        .unwrap_err();
        assert_eq!(err, Error::DuplicateTarget("a".to_string()));
    }

    #[test]
    fn spec_parses_from_json() {
        let spec = Spec::from_json(
            r#"{
                "requests": [
                    {"id": "list", "method": "GET", "url": "/users", "headers": [["Accept", "application/json"]]},
                    {"id": "create", "method": "POST", "url": ":3000/users", "body": {"name": "ada"},
                     "aws": {"region": "eu-west-1"}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(spec.len(), 2);
        let list = &spec.targets()[0];
        assert_eq!(list.headers, vec![("Accept".to_string(), "application/json".to_string())]);
        assert!(list.aws.is_none());
        let create = spec.resolve("create").unwrap();
        assert_eq!(create.body, Some(json!({"name": "ada"})));
        assert_eq!(
            create.aws,
            Some(AwsSignConfig {
                region: "eu-west-1".to_string(),
                profile: String::new()
            })
        );
    }

    #[test]
    fn spec_json_rejects_unknown_method_and_duplicates() {
        let err = Spec::from_json(r#"{"requests": [{"id": "a", "method": "PATCH", "url": "/"}]}"#).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));

        let err = Spec::from_json(
            r#"{"requests": [{"id": "a", "method": "GET", "url": "/"}, {"id": "a", "method": "GET", "url": "/"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateTarget(_)));
    }

    #[test]
    fn base_url_replaces_host_and_keeps_path() {
        let mut target = RequestTarget::new("a", HttpMethod::Get, "/users/1?full=yes");
        target.set_base_url("https://api.example.com").unwrap();
        assert_eq!(target.url, "https://api.example.com/users/1?full=yes");
    }

    #[test]
    fn base_url_path_becomes_prefix() {
        let mut target = RequestTarget::new("a", HttpMethod::Get, "http://old.example.com:9000/users");
        target.set_base_url("https://api.example.com/prod/").unwrap();
        assert_eq!(target.url, "https://api.example.com/prod/users");
    }

    #[test]
    fn base_url_accepts_port_shorthand() {
        let mut target = RequestTarget::new("a", HttpMethod::Get, "https://example.com/health");
        target.set_base_url(":4000").unwrap();
        assert_eq!(target.url, "http://localhost:4000/health");
    }

    #[test]
    fn spec_base_url_stops_at_first_error() {
        let mut spec = spec();
        let err = spec.set_base_url(":bad").unwrap_err();
        assert!(matches!(err, Error::InvalidRoute { .. }));
        assert_eq!(spec.targets()[0].url, "/a", "targets are untouched when the base is invalid");
    }
}
