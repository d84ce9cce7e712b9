//! Region and account scoping of dispatched requests.
//!
//! # Responsibilities
//! - Parse the SigV4 credential scope of the `Authorization` header
//! - Derive the request region (credential scope, then host, then default)
//! - Synthesize a service URL from a signing name and region
//!
//! # Design Decisions
//! - Unparseable headers are ignored, never rejected; the emulator does not
//!   verify signatures

use axum::http::{header, HeaderMap};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::DispatchSettings;

static HOST_REGION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.([a-z]{2}(?:-gov|-iso[a-z]?)?-[a-z]+-[0-9]+)\.amazonaws\.com(?:\.cn)?(?::[0-9]+)?$")
        .expect("host region pattern is valid")
});

/// Signing names whose endpoint prefix differs from the name itself.
const SIGNING_NAME_ENDPOINTS: &[(&str, &str)] = &[
    ("ses", "email"),
    ("aoss", "es"),
    ("execute-api", "apigateway"),
];

/// `Credential=<key>/<date>/<region>/<service>/aws4_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialScope {
    pub access_key: String,
    pub date: String,
    pub region: String,
    pub service: String,
}

impl CredentialScope {
    /// Parse the credential scope from an `Authorization` header value.
    pub fn from_authorization(value: &str) -> Option<Self> {
        let start = value.find("Credential=")? + "Credential=".len();
        let credential = value[start..]
            .split(|c: char| c == ',' || c.is_whitespace())
            .next()?;

        let mut parts = credential.split('/');
        let access_key = parts.next()?.to_string();
        let date = parts.next()?.to_string();
        let region = parts.next()?.to_string();
        let service = parts.next()?.to_string();
        if parts.next()? != "aws4_request" || region.is_empty() || service.is_empty() {
            return None;
        }

        Some(Self {
            access_key,
            date,
            region,
            service,
        })
    }

    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::from_authorization)
    }
}

/// Region named in a regional service host, if any.
pub fn region_from_host(host: &str) -> Option<&str> {
    HOST_REGION
        .captures(host)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Endpoint prefix for a SigV4 signing name.
pub fn endpoint_prefix(signing_name: &str) -> &str {
    SIGNING_NAME_ENDPOINTS
        .iter()
        .find(|(name, _)| *name == signing_name)
        .map(|(_, prefix)| *prefix)
        .unwrap_or(signing_name)
}

/// Regional service URL for a signing name, e.g.
/// `https://batch.cn-northwest-1.amazonaws.com.cn`.
pub fn service_url(signing_name: &str, region: &str) -> String {
    let suffix = if region.starts_with("cn-") { ".cn" } else { "" };
    format!(
        "https://{}.{}.amazonaws.com{}",
        endpoint_prefix(signing_name),
        region,
        suffix
    )
}

/// Where a request lives: region, account, and signing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestScope {
    pub region: String,
    pub account_id: String,
    pub signing_service: Option<String>,
}

impl RequestScope {
    pub fn from_headers(headers: &HeaderMap, settings: &DispatchSettings) -> Self {
        let credential = CredentialScope::from_headers(headers);
        let host = headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_ascii_lowercase);

        let region = credential
            .as_ref()
            .map(|c| c.region.clone())
            .or_else(|| host.as_deref().and_then(region_from_host).map(str::to_string))
            .unwrap_or_else(|| settings.default_region.clone());

        Self {
            region,
            account_id: settings.default_account_id.clone(),
            signing_service: credential.map(|c| c.service),
        }
    }
}
