//! AWS credential resolution.
//!
//! Two sources, both read-only: the process environment, or a named profile
//! in the shared credentials file (`AWS_SHARED_CREDENTIALS_FILE`, falling
//! back to `~/.aws/credentials`).

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Static AWS credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    pub fn new(access_key_id: &str, secret_access_key: &str, session_token: Option<&str>) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
            session_token: session_token.map(str::to_string),
        }
    }

    /// Named profile when `profile` is non-empty, environment otherwise.
    pub fn resolve(profile: &str) -> Result<Self> {
        if profile.is_empty() {
            Self::from_env()
        } else {
            Self::from_profile(profile)
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through `lookup`, which maps a variable name to its
    /// value. Both the current and the legacy variable names are accepted.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let access_key_id = non_empty("AWS_ACCESS_KEY_ID")
            .or_else(|| non_empty("AWS_ACCESS_KEY"))
            .ok_or_else(|| Error::Credential("AWS_ACCESS_KEY_ID not found in environment".to_string()))?;
        let secret_access_key = non_empty("AWS_SECRET_ACCESS_KEY")
            .or_else(|| non_empty("AWS_SECRET_KEY"))
            .ok_or_else(|| Error::Credential("AWS_SECRET_ACCESS_KEY not found in environment".to_string()))?;

        debug!(source = "environment", "resolved AWS credentials");
        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token: non_empty("AWS_SESSION_TOKEN"),
        })
    }

    pub fn from_profile(profile: &str) -> Result<Self> {
        let path = shared_credentials_path()?;
        Self::from_profile_file(&path, profile)
    }

    pub fn from_profile_file(path: &Path, profile: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Credential(format!("failed to read {}: {e}", path.display())))?;
        let creds = parse_profile(&contents, profile)?;
        debug!(source = "profile", profile, path = %path.display(), "resolved AWS credentials");
        Ok(creds)
    }
}

/// Location of the shared credentials file.
pub fn shared_credentials_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os("AWS_SHARED_CREDENTIALS_FILE").filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    dirs::home_dir()
        .map(|home| home.join(".aws").join("credentials"))
        .ok_or_else(|| Error::Credential("cannot locate home directory".to_string()))
}

/// Pull one profile section out of an INI-style credentials file.
///
/// Supported subset: `[name]` or `[profile name]` section headers, `key = value`
/// lines, full-line comments starting with `#` or `;`, and inline comments
/// introduced by whitespace followed by `#` or `;`. Keys are case-insensitive;
/// anything else (continuation lines, nested sub-sections) is ignored.
fn parse_profile(contents: &str, profile: &str) -> Result<Credentials> {
    let mut in_section = false;
    let mut found = false;
    let mut access_key_id = None;
    let mut secret_access_key = None;
    let mut session_token = None;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim();
            let name = name.strip_prefix("profile ").map_or(name, str::trim);
            in_section = name == profile;
            found |= in_section;
            continue;
        }
        if !in_section {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = strip_inline_comment(value).trim().to_string();
        match key.trim().to_ascii_lowercase().as_str() {
            "aws_access_key_id" => access_key_id = Some(value),
            "aws_secret_access_key" => secret_access_key = Some(value),
            "aws_session_token" => session_token = Some(value),
            _ => {}
        }
    }

    if !found {
        return Err(Error::Credential(format!("profile {profile:?} not found")));
    }
    match (access_key_id, secret_access_key) {
        (Some(access_key_id), Some(secret_access_key)) if !access_key_id.is_empty() && !secret_access_key.is_empty() => {
            Ok(Credentials {
                access_key_id,
                secret_access_key,
                session_token: session_token.filter(|t| !t.is_empty()),
            })
        }
        _ => Err(Error::Credential(format!("profile {profile:?} is missing keys"))),
    }
}

fn strip_inline_comment(value: &str) -> &str {
    let cut = value
        .char_indices()
        .zip(value.chars().skip(1))
        .find(|((_, c), next)| c.is_whitespace() && (*next == '#' || *next == ';'))
        .map(|((idx, _), _)| idx);
    match cut {
        Some(idx) => &value[..idx],
        None => value,
    }
}
