//! Per-request connection routing
//!
//! Combines locality classification with the resolved proxy transport. The
//! decision is made for every request since it depends on the target host.

use std::fmt;

use serde::Serialize;

use super::locality::LocalityClassifier;
use super::transport::Transport;

/// How a request reaches upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    Direct,
    Proxy,
}

impl RouteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteMode::Direct => "direct",
            RouteMode::Proxy => "proxy",
        }
    }
}

impl fmt::Display for RouteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing decision for a single request
#[derive(Debug, Clone, Copy)]
pub struct ConnectionPlan<'a> {
    pub mode: RouteMode,
    /// Proxy transport, present only for [`RouteMode::Proxy`]
    pub transport: Option<&'a Transport>,
}

impl<'a> ConnectionPlan<'a> {
    fn direct() -> Self {
        Self {
            mode: RouteMode::Direct,
            transport: None,
        }
    }
}

/// Chooses direct or proxied connections per target URL
#[derive(Debug, Clone)]
pub struct ConnectionRouter {
    locality: LocalityClassifier,
    proxy: Option<Transport>,
}

impl ConnectionRouter {
    pub fn new(locality: LocalityClassifier, proxy: Option<Transport>) -> Self {
        Self { locality, proxy }
    }

    /// Whether a proxy transport was resolved at all
    pub fn has_proxy(&self) -> bool {
        self.proxy.is_some()
    }

    /// Plan the connection for `url`
    pub fn plan(&self, url: &str) -> ConnectionPlan<'_> {
        if self.locality.is_local(url) {
            return ConnectionPlan::direct();
        }

        match &self.proxy {
            Some(transport) => ConnectionPlan {
                mode: RouteMode::Proxy,
                transport: Some(transport),
            },
            None => ConnectionPlan::direct(),
        }
    }
}
