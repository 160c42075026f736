//! Layer URL validation
//!
//! Pure string/URL checks run before any query is issued. No network
//! access happens here. A URL is accepted only if it is https on the
//! default port, names a public host, points at a MapServer/FeatureServer
//! layer, and (when an allow-list is configured) its host is listed.

use super::{ValidationError, ValidationResult};
use regex_lite::Regex;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;
use url::{Host, Url};

static LAYER_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:/[^/]+)*/(?:MapServer|FeatureServer)/\d+(?:/query)?/?$")
        .expect("layer path pattern is valid")
});

const QUERY_SUFFIX: &str = "/query";

/// A validated spatial-layer URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerUrl {
    url: Url,
}

impl LayerUrl {
    pub fn as_url(&self) -> &Url {
        &self.url
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// The layer endpoint without a trailing `/query` or slash.
    pub fn base(&self) -> String {
        let mut base = self.url.clone();
        base.set_query(None);
        base.set_fragment(None);
        let path = base.path().trim_end_matches('/');
        let cut = path.len().saturating_sub(QUERY_SUFFIX.len());
        let path = match path.get(cut..) {
            Some(tail) if tail.eq_ignore_ascii_case(QUERY_SUFFIX) => &path[..cut],
            _ => path,
        }
        .to_string();
        base.set_path(&path);
        base.to_string()
    }
}

/// Boolean form: is `url` a safe, allowed layer URL?
pub fn validate(url: &str, allowed_hosts: &[String]) -> bool {
    check_layer_url(url, allowed_hosts).is_ok()
}

/// Validate a layer URL, reporting why it was rejected.
pub fn check_layer_url(url: &str, allowed_hosts: &[String]) -> ValidationResult<LayerUrl> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| ValidationError::InvalidUrl(format!("{}: {}", url, e)))?;

    if parsed.scheme() != "https" {
        return Err(ValidationError::InvalidUrl(format!(
            "scheme must be https, got '{}'",
            parsed.scheme()
        )));
    }

    // Url::port() is None when the port equals the scheme default.
    if let Some(port) = parsed.port() {
        if port != 443 {
            return Err(ValidationError::InvalidUrl(format!("port {} not allowed", port)));
        }
    }

    let host = parsed
        .host()
        .ok_or_else(|| ValidationError::InvalidUrl("missing host".to_string()))?;
    if is_internal_host(&host) {
        return Err(ValidationError::HostNotAllowed(host.to_string()));
    }

    if !LAYER_PATH.is_match(parsed.path()) {
        return Err(ValidationError::InvalidUrl(format!(
            "path '{}' is not a MapServer/FeatureServer layer",
            parsed.path()
        )));
    }

    let host_name = host.to_string().to_ascii_lowercase();
    if !host_is_allowed(&host_name, allowed_hosts) {
        return Err(ValidationError::HostNotAllowed(host_name));
    }

    Ok(LayerUrl { url: parsed })
}

/// Empty allow-lists permit every (public) host.
fn host_is_allowed(host: &str, allowed_hosts: &[String]) -> bool {
    let entries: Vec<String> = allowed_hosts
        .iter()
        .map(|h| {
            h.trim()
                .trim_start_matches("*.")
                .trim_start_matches('.')
                .to_ascii_lowercase()
        })
        .filter(|h| !h.is_empty())
        .collect();

    if entries.is_empty() {
        return true;
    }

    entries
        .iter()
        .any(|entry| host == entry || host.ends_with(&format!(".{}", entry)))
}

fn is_internal_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Host::Ipv4(ip) => is_internal_v4(ip),
        Host::Ipv6(ip) => is_internal_v6(ip),
    }
}

fn is_internal_v4(ip: &Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}

fn is_internal_v6(ip: &Ipv6Addr) -> bool {
    if ip.is_loopback() || ip.is_unspecified() {
        return true;
    }
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_internal_v4(&v4);
    }
    let first = ip.segments()[0];
    // fc00::/7 unique local, fe80::/10 link local
    (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
}
