//! AWS Signature Version 4 request signing.
//!
//! The signature is computed over the request method, path, query, headers
//! and the exact body bytes handed in, then written back into the request
//! headers (`Host`, `X-Amz-Date`, optional `X-Amz-Security-Token`,
//! `Authorization`). The body itself is never touched.
//!
//! Algorithm: <https://docs.aws.amazon.com/general/latest/gr/sigv4_signing.html>

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;

use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::http::HttpRequest;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Service name used for API Gateway endpoints.
pub const SERVICE: &str = "execute-api";

/// Headers left out of the signature; proxies and clients rewrite them.
const UNSIGNED_HEADERS: [&str; 3] = ["authorization", "user-agent", "x-amzn-trace-id"];

/// Everything except RFC 3986 unreserved characters.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');
const PATH_ENCODE_SET: &AsciiSet = &QUERY_ENCODE_SET.remove(b'/');

/// Sign `req` for API Gateway in `region`.
///
/// Credentials come from the named `profile`, or from the environment when
/// `profile` is empty. Fails with `MissingRegion` before anything else is
/// looked at when `region` is empty.
pub fn sign_request(req: &mut HttpRequest, body: &[u8], region: &str, profile: &str) -> Result<()> {
    if region.is_empty() {
        return Err(Error::MissingRegion);
    }
    let credentials = Credentials::resolve(profile)?;
    SigV4Signer::new(credentials, region, SERVICE).sign(req, body, Utc::now())
}

/// SigV4 signer bound to one credential, region and service.
#[derive(Debug, Clone)]
pub struct SigV4Signer {
    credentials: Credentials,
    region: String,
    service: String,
}

impl SigV4Signer {
    pub fn new(credentials: Credentials, region: &str, service: &str) -> Self {
        Self {
            credentials,
            region: region.to_string(),
            service: service.to_string(),
        }
    }

    /// Sign `req` in place as of `timestamp`.
    pub fn sign(&self, req: &mut HttpRequest, body: &[u8], timestamp: DateTime<Utc>) -> Result<()> {
        if self.region.is_empty() {
            return Err(Error::MissingRegion);
        }
        let url = Url::parse(&req.url).map_err(|e| Error::InvalidRoute {
            route: req.url.clone(),
            reason: e.to_string(),
        })?;

        let date_stamp = timestamp.format("%Y%m%d").to_string();
        let amz_date = timestamp.format("%Y%m%dT%H%M%SZ").to_string();

        req.headers.remove("authorization");
        if !req.headers.contains("host") {
            req.headers.set("Host", host_header(&url));
        }
        req.headers.set("X-Amz-Date", amz_date.clone());
        if let Some(token) = &self.credentials.session_token {
            req.headers.set("X-Amz-Security-Token", token.clone());
        }

        let (canonical_headers, signed_headers) = canonical_headers(req);
        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            req.method.as_str(),
            canonical_uri(&url),
            canonical_query(&url),
            canonical_headers,
            signed_headers,
            sha256_hex(body)
        );

        let credential_scope = format!("{date_stamp}/{}/{}/aws4_request", self.region, self.service);
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{credential_scope}\n{}",
            sha256_hex(canonical_request.as_bytes())
        );

        let signing_key = self.derive_signing_key(&date_stamp);
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        req.headers.set(
            "Authorization",
            format!(
                "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}",
                self.credentials.access_key_id
            ),
        );
        debug!(method = %req.method, url = %req.url, region = %self.region, service = %self.service, signed_headers = %signed_headers, "signed request");
        Ok(())
    }

    /// kSigning = HMAC(HMAC(HMAC(HMAC("AWS4" + secret, date), region), service), "aws4_request")
    fn derive_signing_key(&self, date_stamp: &str) -> Vec<u8> {
        let k_secret = format!("AWS4{}", self.credentials.secret_access_key);
        let k_date = hmac_sha256(k_secret.as_bytes(), date_stamp.as_bytes());
        let k_region = hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = hmac_sha256(&k_region, self.service.as_bytes());
        hmac_sha256(&k_service, b"aws4_request")
    }
}

/// `host[:port]`, with the scheme's default port left out.
fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// Returns `(canonical headers block, signed header names)`.
fn canonical_headers(req: &HttpRequest) -> (String, String) {
    let mut entries: Vec<(String, String)> = req
        .headers
        .groups()
        .map(|(name, values)| (name.to_ascii_lowercase(), values))
        .filter(|(name, _)| !UNSIGNED_HEADERS.contains(&name.as_str()))
        .map(|(name, values)| {
            let joined = values.iter().map(|v| collapse_whitespace(v)).collect::<Vec<_>>().join(",");
            (name, joined)
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let block = entries.iter().map(|(k, v)| format!("{k}:{v}\n")).collect::<String>();
    let names = entries.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>().join(";");
    (block, names)
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn canonical_uri(url: &Url) -> String {
    let path = url.path();
    if path.is_empty() {
        return "/".to_string();
    }
    utf8_percent_encode(path, PATH_ENCODE_SET).to_string()
}

fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (uri_encode(&k), uri_encode(&v)))
        .collect();
    pairs.sort();
    pairs.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&")
}

fn uri_encode(input: &str) -> String {
    utf8_percent_encode(input, QUERY_ENCODE_SET).to_string()
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
