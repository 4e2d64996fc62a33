//! Locality classification
//!
//! Decides whether a target URL points at a host that must never be reached
//! through a proxy: loopback addresses, `.local` names and internal service
//! names such as the database container.

use std::collections::HashSet;
use std::net::IpAddr;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

/// Hostnames that are always local
const LOOPBACK_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "::1"];

/// `host:port` literals that are local regardless of port
static LOOPBACK_AUTHORITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(localhost|127\.0\.0\.1):\d+$").expect("valid loopback authority regex")
});

/// Classifies target URLs as local (bypass proxy) or remote
#[derive(Debug, Clone, Default)]
pub struct LocalityClassifier {
    internal_hosts: HashSet<String>,
}

impl LocalityClassifier {
    /// Create a classifier that also treats the given service names as local
    pub fn new<I, S>(internal_hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            internal_hosts: internal_hosts.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the target must bypass any proxy.
    ///
    /// Accepts full URLs as well as bare `host` / `host:port` strings.
    /// Anything that cannot be parsed is treated as remote.
    pub fn is_local(&self, target: &str) -> bool {
        let Some((host, port)) = host_and_port(target) else {
            return false;
        };

        if LOOPBACK_HOSTS.contains(&host.as_str()) {
            return true;
        }

        if host.ends_with(".local") {
            return true;
        }

        if self.internal_hosts.contains(&host) {
            return true;
        }

        match port {
            Some(port) => LOOPBACK_AUTHORITY.is_match(&format!("{}:{}", host, port)),
            None => false,
        }
    }
}

/// Extract the hostname (without IPv6 brackets) and explicit port
fn host_and_port(target: &str) -> Option<(String, Option<u16>)> {
    let target = target.trim();
    if target.is_empty() {
        return None;
    }

    if let Ok(ip) = target.parse::<IpAddr>() {
        return Some((ip.to_string(), None));
    }

    let url = if target.contains("://") {
        Url::parse(target).ok()?
    } else {
        Url::parse(&format!("http://{}", target)).ok()?
    };

    let host = url
        .host_str()?
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_string();

    if host.is_empty() {
        return None;
    }

    Some((host, url.port()))
}
