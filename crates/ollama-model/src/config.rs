use std::env;
use std::path::PathBuf;

/// Default address of a local Ollama server.
pub const DEFAULT_HOST: &str = "http://localhost:11434";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Builder for [`OllamaConfig`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OllamaConfigBuilder {
    host: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    ca_bundle: Option<PathBuf>,
}

impl OllamaConfigBuilder {
    /// Creates an empty builder, every field falls back to its default.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder seeded from the environment.
    ///
    /// - `OLLAMA_HOST`, then `OLLAMA_HOST_URL`: server address.
    /// - `OLLAMA_MODEL`: model name.
    /// - `REQUESTS_CA_BUNDLE`: PEM file with extra trusted roots, for
    ///   hosts behind a TLS-intercepting proxy.
    pub fn from_env() -> Self {
        let host = env_non_empty("OLLAMA_HOST")
            .or_else(|| env_non_empty("OLLAMA_HOST_URL"));
        Self {
            host,
            model: env_non_empty("OLLAMA_MODEL"),
            temperature: None,
            ca_bundle: env_non_empty("REQUESTS_CA_BUNDLE").map(PathBuf::from),
        }
    }

    /// Sets the server address, like `http://localhost:11434`.
    #[inline]
    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the model to use.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    #[inline]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets a PEM bundle whose certificates are trusted in addition to
    /// the system roots.
    #[inline]
    pub fn with_ca_bundle<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.ca_bundle = Some(path.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> OllamaConfig {
        let host = self.host.unwrap_or_else(|| DEFAULT_HOST.to_owned());
        OllamaConfig {
            host: normalize_host(&host),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            temperature: self.temperature,
            ca_bundle: self.ca_bundle,
        }
    }
}

/// Configuration for [`OllamaProvider`](crate::OllamaProvider).
#[derive(Clone, Debug, PartialEq)]
pub struct OllamaConfig {
    pub(crate) host: String,
    pub(crate) model: String,
    pub(crate) temperature: Option<f32>,
    pub(crate) ca_bundle: Option<PathBuf>,
}

impl OllamaConfig {
    /// The server address, without a trailing slash.
    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The model name.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[inline]
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// `OLLAMA_HOST` is commonly set to a bare `host:port` for the server
// itself, so a missing scheme is filled in here.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_owned()
    } else {
        format!("http://{host}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OllamaConfigBuilder::new().build();
        assert_eq!(config.host(), "http://localhost:11434");
        assert_eq!(config.model(), "llama3.2");
        assert_eq!(config.temperature, None);
        assert_eq!(
            config.endpoint("/api/chat"),
            "http://localhost:11434/api/chat"
        );
    }

    #[test]
    fn test_host_normalization() {
        let config = OllamaConfigBuilder::new()
            .with_host("ollama.internal:11434/")
            .with_model("mistral")
            .with_temperature(0.7)
            .build();
        assert_eq!(config.host(), "http://ollama.internal:11434");
        assert_eq!(config.model(), "mistral");
        assert_eq!(config.temperature, Some(0.7));

        let config = OllamaConfigBuilder::new()
            .with_host("https://gpu-box/")
            .build();
        assert_eq!(config.host(), "https://gpu-box");
    }
}
