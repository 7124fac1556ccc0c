use crate::commands;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use url::Url;

/// Endpoint used when no configuration file is found.
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  /// Resource shown on startup (defaults to the first configured resource)
  pub default_resource: Option<String>,
  /// Custom title for header (defaults to the API domain if not set)
  pub title: Option<String>,
  #[serde(default = "default_resources")]
  pub resources: Vec<ResourceConfig>,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  pub base_url: String,
  /// Per-request transport timeout
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

fn default_timeout_secs() -> u64 {
  30
}

/// A remote collection the UI can browse.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceConfig {
  pub name: String,
  /// Path below the base URL (defaults to `name`)
  pub path: Option<String>,
  /// Singular display label, e.g. "Post"
  pub label: Option<String>,
  #[serde(default)]
  pub fields: FieldMap,
}

impl ResourceConfig {
  pub fn new(name: &str) -> Self {
    Self {
      name: name.to_string(),
      path: None,
      label: None,
      fields: FieldMap::default(),
    }
  }

  pub fn path(&self) -> &str {
    self
      .path
      .as_deref()
      .unwrap_or(&self.name)
      .trim_matches('/')
  }

  pub fn label(&self) -> String {
    match &self.label {
      Some(label) => label.clone(),
      None => singular_label(&self.name),
    }
  }
}

/// JSON property names that hold a record's title and body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldMap {
  #[serde(default = "default_title_field")]
  pub title: String,
  #[serde(default = "default_body_field")]
  pub body: String,
}

impl Default for FieldMap {
  fn default() -> Self {
    Self {
      title: default_title_field(),
      body: default_body_field(),
    }
  }
}

fn default_title_field() -> String {
  "title".to_string()
}

fn default_body_field() -> String {
  "body".to_string()
}

fn default_resources() -> Vec<ResourceConfig> {
  vec![ResourceConfig::new("posts")]
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
  /// Filter directive used when RESTDECK_LOG is unset (default: info)
  pub level: Option<String>,
  /// Directory for restdeck.log (default: $XDG_DATA_HOME/restdeck)
  pub dir: Option<PathBuf>,
}

/// Naive singular form of a resource name: "posts" -> "Post".
fn singular_label(name: &str) -> String {
  let singular = name.strip_suffix('s').filter(|s| !s.is_empty()).unwrap_or(name);
  let mut chars = singular.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api: ApiConfig::default(),
      default_resource: None,
      title: None,
      resources: default_resources(),
      log: LogConfig::default(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./restdeck.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/restdeck/config.yaml
  /// 4. Built-in defaults
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  /// Apply command line overrides, then validate the result.
  ///
  /// Validation waits until here so a flag can repair a bad file value.
  pub fn with_overrides(
    mut self,
    resource: Option<String>,
    base_url: Option<String>,
  ) -> Result<Self> {
    if let Some(resource) = resource {
      self.default_resource = Some(resource);
    }
    if let Some(base_url) = base_url {
      self.api.base_url = base_url;
    }
    self.validate()?;
    Ok(self)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("restdeck.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("restdeck").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
  }

  /// Check cross-field constraints serde cannot express.
  pub fn validate(&self) -> Result<()> {
    self.base_url()?;

    if self.resources.is_empty() {
      return Err(eyre!("At least one resource must be configured"));
    }

    let mut seen = BTreeSet::new();
    for resource in &self.resources {
      if resource.name.trim().is_empty() {
        return Err(eyre!("Resource names must not be empty"));
      }
      if !seen.insert(resource.name.as_str()) {
        return Err(eyre!("Duplicate resource name: {}", resource.name));
      }
      if commands::is_reserved(&resource.name) {
        return Err(eyre!(
          "Resource name '{}' clashes with a built-in command",
          resource.name
        ));
      }
    }

    if let Some(name) = &self.default_resource {
      if self.resource(name).is_none() {
        return Err(eyre!("Default resource '{}' is not configured", name));
      }
    }

    Ok(())
  }

  /// Parsed API base URL.
  pub fn base_url(&self) -> Result<Url> {
    Url::parse(&self.api.base_url)
      .map_err(|e| eyre!("Invalid API base URL {}: {}", self.api.base_url, e))
  }

  pub fn resource(&self, name: &str) -> Option<&ResourceConfig> {
    self.resources.iter().find(|r| r.name == name)
  }

  /// The resource to open on startup.
  pub fn initial_resource(&self) -> Option<&ResourceConfig> {
    self
      .default_resource
      .as_deref()
      .and_then(|name| self.resource(name))
      .or_else(|| self.resources.first())
  }

  /// Optional bearer token for the API, from RESTDECK_API_TOKEN.
  pub fn api_token() -> Option<String> {
    std::env::var("RESTDECK_API_TOKEN")
      .ok()
      .filter(|t| !t.is_empty())
  }
}
