//! Route normalization and request construction.
//!
//! Routes can be written as
//! - `http[s]://host[:port]/path`, used as is,
//! - `:port/path`, meaning `http://localhost:port/path`,
//! - `/path` (or `path`), meaning `http://localhost:80/path`.
//!
//! The normalized string is kept verbatim rather than re-serialized through
//! `Url`, so `http://localhost:80/path` keeps its explicit port.

use tracing::debug;
use ureq::http::{HeaderName, HeaderValue};
use url::Url;

use crate::error::{Error, Result};
use crate::http::{HeaderSet, HttpMethod, HttpRequest};

/// Turn a route into an absolute URL.
pub fn normalize_route(route: &str) -> Result<String> {
    let candidate = if route.starts_with("http://") || route.starts_with("https://") {
        route.to_string()
    } else if route.starts_with(':') {
        format!("http://localhost{route}")
    } else if route.starts_with('/') {
        format!("http://localhost:80{route}")
    } else {
        format!("http://localhost:80/{route}")
    };

    Url::parse(&candidate).map_err(|e| Error::InvalidRoute {
        route: route.to_string(),
        reason: e.to_string(),
    })?;
    Ok(candidate)
}

/// Build a request without performing any I/O.
///
/// `json` is used as the body verbatim when non-empty; it is not validated.
/// When `headers` is given it replaces the default header set outright; the
/// two are never merged.
pub fn build_request(
    method: HttpMethod,
    route: &str,
    json: Option<&[u8]>,
    headers: Option<HeaderSet>,
) -> Result<HttpRequest> {
    let url = normalize_route(route)?;
    let headers = headers.unwrap_or_else(default_headers);
    validate_headers(&headers)?;

    let body = json.filter(|b| !b.is_empty()).map(<[u8]>::to_vec);
    debug!(%method, %url, headers = headers.len(), body_len = body.as_ref().map_or(0, Vec::len), "built request");

    Ok(HttpRequest {
        method,
        url,
        headers,
        body,
    })
}

fn default_headers() -> HeaderSet {
    HeaderSet::new()
}

fn validate_headers(headers: &HeaderSet) -> Result<()> {
    for (name, value) in headers.iter() {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::InvalidHeader(format!("bad header name {name:?}")))?;
        HeaderValue::from_str(value)
            .map_err(|_| Error::InvalidHeader(format!("bad value for header {name:?}")))?;
    }
    Ok(())
}
