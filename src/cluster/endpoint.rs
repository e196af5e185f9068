//! Endpoint list parsing.
//!
//! # Responsibilities
//! - Split the comma-separated endpoint list
//! - Validate each entry as a URL
//! - Apply the first entry's scheme to entries written without one
//!
//! # Design Decisions
//! - Fail fast: the first bad entry aborts the whole list
//! - Only the first entry's scheme is restricted to http/https
//! - Duplicates are kept as separate members

use std::fmt;
use url::Url;

use crate::cluster::error::ParseError;

const SUPPORTED_SCHEMES: [&str; 2] = ["http", "https"];

/// A normalized cluster endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Normalized address without a trailing slash, e.g. `http://h2:9090`.
    address: String,
    /// Address with any userinfo removed, safe for logs and metric labels.
    label: String,
    url: Url,
}

impl Endpoint {
    fn from_url(url: Url) -> Self {
        let address = trim_address(&url);

        let mut redacted = url.clone();
        // only fails for URLs without a host, which are rejected earlier
        let _ = redacted.set_username("");
        let _ = redacted.set_password(None);
        let label = trim_address(&redacted);

        Self {
            address,
            label,
            url,
        }
    }

    /// The normalized address handed out to callers.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Address without credentials.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Liveness URL for this endpoint: `<address>/<path>`.
    pub fn probe_url(&self, path: &str) -> String {
        format!("{}/{}", self.address, path.trim_start_matches('/'))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

fn trim_address(url: &Url) -> String {
    url.as_str().trim_end_matches('/').to_string()
}

/// Parse a comma-separated endpoint list into normalized endpoints.
pub fn parse_endpoints(raw: &str) -> Result<Vec<Endpoint>, ParseError> {
    let tokens: Vec<&str> = raw.split(',').map(str::trim).collect();
    if tokens.iter().any(|token| token.is_empty()) {
        return Err(ParseError::BlankEndpoint);
    }

    // split always yields at least one token
    let default_scheme = default_scheme(tokens[0])?;

    tokens
        .into_iter()
        .map(|token| parse_endpoint(token, &default_scheme))
        .collect()
}

/// The scheme of the first entry, which every scheme-less entry inherits.
fn default_scheme(token: &str) -> Result<String, ParseError> {
    let scheme = match Url::parse(token) {
        Ok(url) => url.scheme().to_string(),
        Err(url::ParseError::RelativeUrlWithoutBase) => String::new(),
        Err(reason) => return Err(invalid(token, reason)),
    };

    if SUPPORTED_SCHEMES.contains(&scheme.as_str()) {
        Ok(scheme)
    } else {
        Err(ParseError::UnsupportedScheme {
            endpoint: token.to_string(),
            scheme,
        })
    }
}

fn parse_endpoint(token: &str, default_scheme: &str) -> Result<Endpoint, ParseError> {
    let url = match Url::parse(token) {
        Ok(url) if !url.cannot_be_a_base() => url,
        // "h2:9090" parses as scheme "h2" with an opaque path, "10.0.0.2" as relative
        Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => {
            // only bad user input (port, IPv6 literal) fails here, so report it, never panic
            Url::parse(&format!("{}://{}", default_scheme, token))
                .map_err(|reason| invalid(token, reason))?
        }
        Err(reason) => return Err(invalid(token, reason)),
    };

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ParseError::MissingHost {
            endpoint: token.to_string(),
        });
    }

    Ok(Endpoint::from_url(url))
}

fn invalid(token: &str, reason: url::ParseError) -> ParseError {
    ParseError::InvalidEndpoint {
        endpoint: token.to_string(),
        reason,
    }
}
