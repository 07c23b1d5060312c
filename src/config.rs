use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";

/// Which of the two agents to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Gemini 2.0 Flash with the four knowledge stubs.
    #[default]
    Classic,
    /// Gemini 2.5 Flash grounded with Google Search.
    Plus,
}

impl Variant {
    pub fn agent_name(self) -> &'static str {
        match self {
            Self::Classic => "FIFA_World_Cup_Expert",
            Self::Plus => "FIFA_World_Cup_Expert_Plus",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Classic => {
                "Experto en Copa Mundial de la FIFA con conocimientos actualizados y datos curiosos"
            }
            Self::Plus => {
                "Experto avanzado en Copa Mundial de la FIFA con herramientas especializadas: \
                 estadísticas de jugadores, rendimiento de países, datos curiosos, noticias \
                 actuales y búsqueda web"
            }
        }
    }

    pub fn version(self) -> &'static str {
        match self {
            Self::Classic => "1.0.0",
            Self::Plus => "2.1.0",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::Classic => "gemini-2.0-flash",
            Self::Plus => "gemini-2.5-flash",
        }
    }

    pub fn default_max_output_tokens(self) -> u32 {
        match self {
            Self::Classic => 1000,
            Self::Plus => 1500,
        }
    }

    pub fn uses_web_search(self) -> bool {
        matches!(self, Self::Plus)
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub variant: Variant,
    /// Function-call round trips allowed before a turn gives up.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,
    /// Question/answer exchanges kept as conversation context.
    #[serde(default = "default_max_history_exchanges")]
    pub max_history_exchanges: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            max_tool_rounds: default_max_tool_rounds(),
            max_history_exchanges: default_max_history_exchanges(),
        }
    }
}

/// Model parameters. `name` and `max_output_tokens` fall back to the variant's defaults.
#[derive(Debug, Deserialize)]
pub struct ModelConfig {
    pub name: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
    #[serde(default = "default_location")]
    pub location: String,
    pub base_url: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: None,
            temperature: default_temperature(),
            max_output_tokens: None,
            location: default_location(),
            base_url: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_sources: default_max_sources(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            user_agent: default_user_agent(),
        }
    }
}

// Defaults
fn default_max_tool_rounds() -> u32 {
    5
}
fn default_max_history_exchanges() -> usize {
    10
}
fn default_temperature() -> f32 {
    0.7
}
fn default_location() -> String {
    "us-central1".into()
}
fn default_max_sources() -> usize {
    5
}
fn default_timeout_secs() -> u64 {
    180
}
fn default_max_retries() -> u32 {
    3
}
fn default_user_agent() -> String {
    concat!("fifa-agent/", env!("CARGO_PKG_VERSION")).into()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config {}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| Error::config(format!("Failed to parse config: {e}")))
    }

    /// Load `path` if it exists; a missing file means all defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn variant(&self) -> Variant {
        self.agent.variant
    }

    pub fn model_name(&self) -> &str {
        self.model
            .name
            .as_deref()
            .unwrap_or_else(|| self.variant().default_model())
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.model
            .max_output_tokens
            .unwrap_or_else(|| self.variant().default_max_output_tokens())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(Error::config(format!(
                "model.temperature must be between 0 and 2, got {}",
                self.model.temperature
            )));
        }
        if self.max_output_tokens() == 0 {
            return Err(Error::config("model.max_output_tokens must be positive"));
        }
        if self.agent.max_tool_rounds == 0 {
            return Err(Error::config("agent.max_tool_rounds must be positive"));
        }
        Ok(())
    }
}

/// How requests authenticate: a Gemini API key, or a Google Cloud project (Vertex AI).
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    ApiKey(String),
    Project { project_id: String },
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        Self::resolve(
            std::env::var(API_KEY_ENV).ok(),
            std::env::var(PROJECT_ENV).ok(),
        )
    }

    /// The API key wins when both are present. Empty values count as unset.
    pub fn resolve(api_key: Option<String>, project_id: Option<String>) -> Result<Self> {
        let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        if let Some(key) = non_empty(api_key) {
            return Ok(Self::ApiKey(key));
        }
        if let Some(project_id) = non_empty(project_id) {
            return Ok(Self::Project { project_id });
        }
        Err(Error::config(format!(
            "no Gemini credentials: set {API_KEY_ENV} or {PROJECT_ENV}"
        )))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Self::Project { project_id } => f
                .debug_struct("Project")
                .field("project_id", project_id)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let toml = r#"
[agent]
variant = "plus"
max_tool_rounds = 3
max_history_exchanges = 4

[model]
name = "gemini-2.5-pro"
temperature = 0.2
max_output_tokens = 2048
location = "europe-west4"

[search]
max_sources = 2

[http]
timeout_secs = 30
max_retries = 1
user_agent = "FIFA-Agent-ADK/2.0"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.variant(), Variant::Plus);
        assert_eq!(config.agent.max_tool_rounds, 3);
        assert_eq!(config.agent.max_history_exchanges, 4);
        assert_eq!(config.model_name(), "gemini-2.5-pro");
        assert_eq!(config.max_output_tokens(), 2048);
        assert_eq!(config.model.location, "europe-west4");
        assert_eq!(config.search.max_sources, 2);
        assert_eq!(config.http.user_agent, "FIFA-Agent-ADK/2.0");
    }

    #[test]
    fn empty_config_uses_classic_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.variant(), Variant::Classic);
        assert_eq!(config.model_name(), "gemini-2.0-flash");
        assert_eq!(config.max_output_tokens(), 1000);
        assert!((config.model.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.model.location, "us-central1");
        assert_eq!(config.agent.max_tool_rounds, 5);
        assert_eq!(config.search.max_sources, 5);
        assert_eq!(config.http.timeout_secs, 180);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn plus_variant_changes_model_defaults() {
        let config: Config = toml::from_str("[agent]\nvariant = \"plus\"\n").unwrap();
        assert_eq!(config.model_name(), "gemini-2.5-flash");
        assert_eq!(config.max_output_tokens(), 1500);
    }

    #[test]
    fn missing_file_means_defaults() {
        let config = Config::load_or_default(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(config.variant(), Variant::Classic);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut config = Config::default();
        config.model.temperature = 3.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.model.max_output_tokens = Some(0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.agent.max_tool_rounds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn api_key_takes_precedence_over_project() {
        let creds = Credentials::resolve(Some("k-123".into()), Some("my-project".into())).unwrap();
        assert_eq!(creds, Credentials::ApiKey("k-123".into()));
    }

    #[test]
    fn empty_api_key_falls_back_to_project() {
        let creds = Credentials::resolve(Some("  ".into()), Some("my-project".into())).unwrap();
        assert_eq!(
            creds,
            Credentials::Project {
                project_id: "my-project".into()
            }
        );
    }

    #[test]
    fn no_credentials_is_a_config_error() {
        let err = Credentials::resolve(None, Some(String::new())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let creds = Credentials::ApiKey("secret-key".into());
        assert!(!format!("{creds:?}").contains("secret-key"));
    }
}
