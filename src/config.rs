//! TOML configuration and engine registration.
//!
//! ```toml
//! [search]
//! timeout_seconds = 5
//! max_connections = 10
//!
//! [image_proxy]
//! secret = "change me"
//! path = "/image_proxy"
//!
//! [[engines]]
//! name = "alexandria"
//! kind = "json"
//! supported_languages = ["en"]
//! query_extensions = ["site"]
//! url = "https://api.alexandria.org"
//! params = { a = "1", c = "a" }
//! result_path = "$.results[*]"
//! title_path = "$.title"
//! url_path = "$.url"
//! text_path = "$.snippet"
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::path::PathBuf;

use metasearch_core::engines::{
    BackendRegistry, DelegatedAdapter, FieldPath, JsonAdapter, JsonAdapterConfig, RequestTemplate,
    SelectorAdapter, SelectorAdapterConfig,
};
use metasearch_core::{
    Adapter, Engine, EngineInfo, EngineRegistry, ImageProxy, QueryExtensions, SearchConfig,
    SearchError, SearchMode, Searcher,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Image proxy link signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageProxyConfig {
    /// Signing secret. Signing is unavailable while unset.
    pub secret: Option<String>,
    /// Path of the proxy endpoint in generated links.
    pub path: String,
}

impl Default for ImageProxyConfig {
    fn default() -> Self {
        Self {
            secret: None,
            path: "/image_proxy".to_string(),
        }
    }
}

/// Kind-specific part of an engine entry, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AdapterConfig {
    /// HTML scraping with CSS selectors.
    Selector(SelectorAdapterConfig),
    /// JSON API with JSONPath queries.
    Json(JsonAdapterConfig),
    /// Definition looked up in the backend registry.
    Delegated(DelegatedConfig),
}

/// Settings of a delegated engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegatedConfig {
    /// Registry name of the definition; the engine name when unset.
    pub backend: Option<String>,
}

/// One `[[engines]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Name, mode, weight, languages, capabilities and method.
    #[serde(flatten)]
    pub info: EngineInfo,
    /// Adapter family and its settings.
    #[serde(flatten)]
    pub adapter: AdapterConfig,
}

impl EngineConfig {
    /// Construct the engine.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an invalid entry or a delegated
    /// backend the registry does not know.
    pub fn build(&self, backends: &dyn BackendRegistry) -> std::result::Result<Engine, SearchError> {
        let adapter = match &self.adapter {
            AdapterConfig::Selector(config) => Adapter::Selector(SelectorAdapter::new(config.clone())?),
            AdapterConfig::Json(config) => Adapter::Json(JsonAdapter::new(config.clone())?),
            AdapterConfig::Delegated(config) => {
                let backend = config.backend.as_deref().unwrap_or(&self.info.name);
                Adapter::Delegated(DelegatedAdapter::load(backends, backend)?)
            }
        };
        Engine::new(self.info.clone(), adapter)
    }

    /// The built-in English web engine backed by the Alexandria API.
    pub fn alexandria() -> Self {
        Self {
            info: EngineInfo {
                name: "alexandria".to_string(),
                mode: SearchMode::Web,
                supported_languages: BTreeSet::from(["en".to_string()]),
                query_extensions: QueryExtensions::SITE,
                ..Default::default()
            },
            adapter: AdapterConfig::Json(JsonAdapterConfig {
                request: RequestTemplate {
                    url: "https://api.alexandria.org".to_string(),
                    params: BTreeMap::from([
                        ("a".to_string(), "1".to_string()),
                        ("c".to_string(), "a".to_string()),
                    ]),
                    ..Default::default()
                },
                result_path: FieldPath::new("$.results[*]"),
                title_path: FieldPath::new("$.title"),
                url_path: FieldPath::new("$.url"),
                text_path: Some(FieldPath::new("$.snippet")),
                image_path: None,
            }),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Dispatch and ranking settings.
    pub search: SearchConfig,
    /// Image proxy signing.
    pub image_proxy: ImageProxyConfig,
    /// Engines in registration order.
    pub engines: Vec<EngineConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            image_proxy: ImageProxyConfig::default(),
            engines: vec![EngineConfig::alexandria()],
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ConfigFile`] for malformed TOML or unknown kinds.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Returns the default config file path: `~/.config/metasearch/config.toml`.
    pub fn default_config_path() -> PathBuf {
        config_path_from(std::env::var_os("XDG_CONFIG_HOME"), std::env::var_os("HOME"))
    }

    /// Register every configured engine, in file order.
    ///
    /// # Errors
    ///
    /// Any invalid entry or duplicate name aborts startup with
    /// [`AppError::Search`].
    pub fn build_registry(&self, backends: &dyn BackendRegistry) -> Result<EngineRegistry> {
        let mut builder = EngineRegistry::builder();
        for entry in &self.engines {
            let engine = entry.build(backends).inspect_err(|e| {
                tracing::error!(engine = %entry.info.name, error = %e, "invalid engine definition");
            })?;
            builder.register(engine)?;
        }
        let registry = builder.build();
        tracing::info!(engines = registry.len(), "engines registered");
        Ok(registry)
    }

    /// Validate the search settings and build a ready searcher.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::build_registry`], plus invalid search settings.
    pub fn searcher(&self, backends: &dyn BackendRegistry) -> Result<Searcher> {
        self.search.validate()?;
        let registry = self.build_registry(backends)?;
        Ok(Searcher::new(registry, &self.search)?)
    }

    /// The link signer.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] when no secret is configured.
    pub fn image_proxy(&self) -> Result<ImageProxy> {
        let secret = self
            .image_proxy
            .secret
            .as_deref()
            .ok_or_else(|| AppError::Config("image_proxy.secret is not set".into()))?;
        Ok(ImageProxy::new(secret, &self.image_proxy.path)?)
    }
}

fn config_path_from(xdg_config_home: Option<OsString>, home: Option<OsString>) -> PathBuf {
    if let Some(config) = xdg_config_home.filter(|p| !p.is_empty()) {
        PathBuf::from(config).join("metasearch").join("config.toml")
    } else if let Some(home) = home {
        PathBuf::from(home)
            .join(".config")
            .join("metasearch")
            .join("config.toml")
    } else {
        PathBuf::from("/tmp/metasearch-config/config.toml")
    }
}
