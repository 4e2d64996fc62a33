//! Transport resolution
//!
//! Turns proxy settings into reusable HTTP clients. Every client is built with
//! `no_proxy()` so process-wide proxy variables never leak into routing; the
//! only proxies in play are the ones configured here.

use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy, Url};
use tracing::{debug, info};

/// Proxy settings owned by one relay instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    pub enabled: bool,
    pub http_proxy: Option<Url>,
    pub https_proxy: Option<Url>,
}

impl ProxyConfig {
    /// Proxy used for the primary transport: HTTPS proxy first, then HTTP.
    ///
    /// `None` whenever the proxy is disabled.
    pub fn selected_proxy(&self) -> Option<&Url> {
        if !self.enabled {
            return None;
        }
        self.https_proxy.as_ref().or(self.http_proxy.as_ref())
    }

    /// Whether proxying is enabled and at least one proxy URL is set
    pub fn is_configured(&self) -> bool {
        self.selected_proxy().is_some()
    }

    /// Raw per-scheme mapping, or `None` when no proxy applies
    pub fn scheme_proxies(&self) -> Option<SchemeProxies> {
        if !self.is_configured() {
            return None;
        }
        Some(SchemeProxies {
            http: self.http_proxy.clone(),
            https: self.https_proxy.clone(),
        })
    }
}

/// `{scheme -> proxy}` wiring for clients that cannot share the primary transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeProxies {
    http: Option<Url>,
    https: Option<Url>,
}

impl SchemeProxies {
    /// Proxy for `https://` targets, falling back to the HTTP proxy
    pub fn for_https(&self) -> Option<&Url> {
        self.https.as_ref().or(self.http.as_ref())
    }

    /// Proxy for `http://` targets, falling back to the HTTPS proxy
    pub fn for_http(&self) -> Option<&Url> {
        self.http.as_ref().or(self.https.as_ref())
    }

    /// Proxy that a request to `target` would go through
    pub fn for_target(&self, target: &Url) -> Option<&Url> {
        match target.scheme() {
            "https" => self.for_https(),
            _ => self.for_http(),
        }
    }

    /// Install the per-scheme proxies on a client builder
    pub fn apply(&self, builder: ClientBuilder) -> reqwest::Result<ClientBuilder> {
        let mut builder = builder.no_proxy();
        if let Some(url) = self.for_http() {
            builder = builder.proxy(Proxy::http(url.clone())?);
        }
        if let Some(url) = self.for_https() {
            builder = builder.proxy(Proxy::https(url.clone())?);
        }
        Ok(builder.danger_accept_invalid_certs(true))
    }
}

/// Connect and read timeouts for unary and streaming calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub read: Duration,
    pub stream_read: Duration,
}

impl Timeouts {
    /// Connect and unary read both use `timeout`; streaming reads get twice that.
    pub fn from_timeout(timeout: Duration) -> Self {
        Self {
            connect: timeout,
            read: timeout,
            stream_read: timeout * 2,
        }
    }
}

/// A pair of pooled clients (unary and streaming) sharing one route
#[derive(Debug, Clone)]
pub struct Transport {
    proxy_url: Option<Url>,
    unary: Client,
    stream: Client,
}

impl Transport {
    /// Transport that never goes through a proxy
    pub fn direct(timeouts: &Timeouts) -> reqwest::Result<Self> {
        Ok(Self {
            proxy_url: None,
            unary: build_client(None, timeouts.connect, timeouts.read)?,
            stream: build_client(None, timeouts.connect, timeouts.stream_read)?,
        })
    }

    /// Transport bound to a single proxy, certificate verification disabled
    pub fn via_proxy(proxy_url: &Url, timeouts: &Timeouts) -> reqwest::Result<Self> {
        Ok(Self {
            proxy_url: Some(proxy_url.clone()),
            unary: build_client(Some(proxy_url), timeouts.connect, timeouts.read)?,
            stream: build_client(Some(proxy_url), timeouts.connect, timeouts.stream_read)?,
        })
    }

    /// Proxy this transport is bound to, if any
    pub fn proxy_url(&self) -> Option<&Url> {
        self.proxy_url.as_ref()
    }

    pub fn unary_client(&self) -> &Client {
        &self.unary
    }

    pub fn stream_client(&self) -> &Client {
        &self.stream
    }
}

/// Output of transport resolution
#[derive(Debug, Clone, Default)]
pub struct ResolvedTransport {
    /// Proxy-capable transport, `None` for direct-only operation
    pub primary: Option<Transport>,
    /// Per-scheme mapping kept for secondary clients
    pub schemes: Option<SchemeProxies>,
}

/// Build the proxy transport (if any) for the given settings
pub fn resolve(proxy: &ProxyConfig, timeouts: &Timeouts) -> reqwest::Result<ResolvedTransport> {
    let Some(proxy_url) = proxy.selected_proxy() else {
        debug!(enabled = proxy.enabled, "No proxy transport configured");
        return Ok(ResolvedTransport::default());
    };

    info!(
        proxy_url = %proxy_url,
        http_proxy = ?proxy.http_proxy.as_ref().map(Url::as_str),
        https_proxy = ?proxy.https_proxy.as_ref().map(Url::as_str),
        "Proxy transport enabled"
    );

    Ok(ResolvedTransport {
        primary: Some(Transport::via_proxy(proxy_url, timeouts)?),
        schemes: proxy.scheme_proxies(),
    })
}

fn build_client(proxy: Option<&Url>, connect: Duration, read: Duration) -> reqwest::Result<Client> {
    let mut builder = Client::builder()
        .no_proxy()
        .connect_timeout(connect)
        .read_timeout(read);

    if let Some(url) = proxy {
        builder = builder
            .proxy(Proxy::all(url.clone())?)
            .danger_accept_invalid_certs(true);
    }

    builder.build()
}
