//! URL canonicalization and provider-domain detection.
//!
//! Every index lookup and every fetch-dedup decision goes through
//! [`normalize`]: raw URL variants (casing, `www.` prefix, trailing slash,
//! fragments) collapse to one normalized key, which is also what stable
//! chapter IDs are derived from.

use serde::{Deserialize, Serialize};
use url::Url;

/// A provider domain the reader knows how to import from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteInfo {
    pub domain: String,
    pub example: String,
}

/// Checks a string parses as an absolute http(s) URL with a host.
pub fn is_valid_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some()
        }
        Err(_) => false,
    }
}

/// Canonicalize a URL into a lookup key: lowercased host + path, `www.`
/// stripped, trailing slash and fragment dropped. Returns `None` on
/// malformed input.
pub fn normalize(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let path = parsed.path().trim_end_matches('/').to_ascii_lowercase();
    Some(format!("{host}{path}"))
}

#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    sites: Vec<SiteInfo>,
}

impl UrlNormalizer {
    pub fn new(sites: Vec<SiteInfo>) -> Self {
        Self { sites }
    }

    pub fn sites(&self) -> &[SiteInfo] {
        &self.sites
    }

    /// True iff the URL's hostname belongs to a configured provider domain
    /// (exact match or subdomain). Used for error messaging and fast-fail,
    /// not content retrieval.
    pub fn is_supported(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);

        self.sites.iter().any(|site| {
            let domain = site.domain.to_ascii_lowercase();
            host == domain || host.ends_with(&format!(".{domain}"))
        })
    }

    /// Human-readable list of supported domains for error messages.
    pub fn supported_domains(&self) -> String {
        self.sites
            .iter()
            .map(|s| s.domain.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
