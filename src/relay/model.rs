//! Model name normalization and upstream endpoint construction

/// Routing suffixes understood by the request layer, in the order they are checked
const ROUTING_SUFFIXES: [&str; 2] = ["-search", "-image"];

/// Strip routing suffixes from a caller-supplied model name.
///
/// `-search` is checked before `-image`. Stripping repeats until no routing
/// suffix remains, so the result is always a fixed point.
pub fn normalize_model(model: &str) -> &str {
    let mut name = model;
    while let Some(stripped) = ROUTING_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
    {
        name = stripped;
    }
    name
}

/// Upstream endpoint for one relay call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayEndpoint {
    base_url: String,
    model: String,
    api_key: String,
}

impl RelayEndpoint {
    /// Build an endpoint; `model` is normalized here.
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: normalize_model(model).to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Normalized model name sent upstream
    pub fn model(&self) -> &str {
        &self.model
    }

    /// `{base}/models/{model}:generateContent?key={key}`
    pub fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    /// `{base}/models/{model}:streamGenerateContent?alt=sse&key={key}`
    pub fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, self.model, self.api_key
        )
    }
}
