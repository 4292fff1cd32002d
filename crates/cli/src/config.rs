//! Configuration loading and management

use anyhow::{Context, Result};
use guardrail_chat_adapters::llm::{GatewayConfig, ollama::OLLAMA_BASE_URL, openai_compat::GROQ_BASE_URL};
use guardrail_chat_domain::FilterConfiguration;
use guardrail_chat_domain::usecases::{ChatConfig, RenderConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub filters: FiltersConfig,

    #[serde(default)]
    pub rails: RailsConfig,

    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Where interactions are recorded: jsonl, tracing, none
    #[serde(default = "default_interaction_log")]
    pub interaction_log: String,

    #[serde(default = "default_interaction_log_path")]
    pub interaction_log_path: PathBuf,

    /// Maximum turns kept in memory (0 = unbounded)
    #[serde(default)]
    pub history_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiltersConfig {
    #[serde(default = "default_topic_keywords")]
    pub topic_keywords: Vec<String>,

    #[serde(default = "default_toxic_keywords")]
    pub toxic_keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RailsConfig {
    /// System instructions sent with every generation request
    #[serde(default = "default_instructions")]
    pub instructions: String,

    /// Upper bound on one generation call (0 = no bound)
    #[serde(default = "default_gateway_timeout")]
    pub gateway_timeout_secs: u64,

    #[serde(default = "default_true")]
    pub enforce_citations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_llm_retries")]
    pub retries: u32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default)]
    pub openai_compat: OpenAiCompatConfig,

    #[serde(default)]
    pub anthropic: AnthropicConfig,

    #[serde(default)]
    pub ollama: OllamaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiCompatConfig {
    #[serde(default = "default_groq_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_groq_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    #[serde(default = "default_anthropic_api_key_env")]
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,
}

// Default value functions
fn default_log_level() -> String {
    "warn".to_string()
}

fn default_interaction_log() -> String {
    "jsonl".to_string()
}

fn default_interaction_log_path() -> PathBuf {
    PathBuf::from("./guardrail_logs.jsonl")
}

fn default_topic_keywords() -> Vec<String> {
    [
        "president",
        "political party",
        "politics",
        "election",
        "hack into",
        "illegal drugs",
    ]
    .map(String::from)
    .to_vec()
}

fn default_toxic_keywords() -> Vec<String> {
    ["stupid", "useless", "hate", "idiot"].map(String::from).to_vec()
}

fn default_instructions() -> String {
    guardrail_chat_adapters::llm::DEFAULT_INSTRUCTIONS.to_string()
}

fn default_gateway_timeout() -> u64 {
    180
}

fn default_true() -> bool {
    true
}

fn default_provider() -> String {
    "openai_compat".to_string()
}

fn default_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_timeout() -> u64 {
    45
}

fn default_llm_retries() -> u32 {
    2
}

fn default_max_output_tokens() -> u32 {
    600
}

fn default_groq_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_groq_base_url() -> String {
    GROQ_BASE_URL.to_string()
}

fn default_anthropic_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_ollama_base_url() -> String {
    OLLAMA_BASE_URL.to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            interaction_log: default_interaction_log(),
            interaction_log_path: default_interaction_log_path(),
            history_limit: 0,
        }
    }
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            topic_keywords: default_topic_keywords(),
            toxic_keywords: default_toxic_keywords(),
        }
    }
}

impl Default for RailsConfig {
    fn default() -> Self {
        Self {
            instructions: default_instructions(),
            gateway_timeout_secs: default_gateway_timeout(),
            enforce_citations: default_true(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout(),
            retries: default_llm_retries(),
            max_output_tokens: default_max_output_tokens(),
            openai_compat: OpenAiCompatConfig::default(),
            anthropic: AnthropicConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl Default for OpenAiCompatConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_groq_api_key_env(),
            base_url: default_groq_base_url(),
        }
    }
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_anthropic_api_key_env(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("GUARDRAIL_CHAT")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("filters.topic_keywords")
                .with_list_parse_key("filters.toxic_keywords")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Keyword snapshot for the input filter
    pub fn filter_configuration(&self) -> Result<FilterConfiguration> {
        FilterConfiguration::new(
            self.filters.topic_keywords.clone(),
            self.filters.toxic_keywords.clone(),
        )
        .context("Invalid [filters] configuration")
    }

    /// Pipeline configuration derived from the loaded settings
    pub fn chat_config(&self) -> Result<ChatConfig> {
        Ok(ChatConfig {
            filters: self.filter_configuration()?,
            render_config: RenderConfig {
                enforce_citations: self.rails.enforce_citations,
                ..Default::default()
            },
            gateway_timeout: non_zero(self.rails.gateway_timeout_secs).map(Duration::from_secs),
            history_limit: non_zero(self.general.history_limit),
        })
    }

    /// Settings shared by every gateway adapter
    pub fn gateway_config(&self) -> GatewayConfig {
        let instructions = self.rails.instructions.trim();
        GatewayConfig {
            model: self.llm.model.clone(),
            temperature: self.llm.temperature,
            max_output_tokens: self.llm.max_output_tokens,
            timeout_secs: self.llm.timeout_secs,
            retries: self.llm.retries,
            instructions: if instructions.is_empty() {
                None
            } else {
                Some(instructions.to_string())
            },
        }
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# guardrail-chat configuration

[general]
# Console diagnostics; interactions go to the interaction log
log_level = "warn"
# jsonl, tracing, none
interaction_log = "jsonl"
interaction_log_path = "./guardrail_logs.jsonl"
# 0 keeps every turn of the session in memory
history_limit = 0

[filters]
# Case-insensitive substring matches; topic keywords are checked first
topic_keywords = ["president", "political party", "politics", "election", "hack into", "illegal drugs"]
toxic_keywords = ["stupid", "useless", "hate", "idiot"]

[rails]
instructions = "You are a helpful, factual assistant. Decline requests about politics or illegal activities, never produce hateful or harmful content, keep answers concise, and cite sources for external facts."
# Bound on one whole gateway call, adapter retries included. Keep it above
# (llm.retries + 1) * llm.timeout_secs plus backoff, or retries get cut short.
# 0 waits indefinitely
gateway_timeout_secs = 180
enforce_citations = true

[llm]
provider = "openai_compat"  # openai_compat, anthropic, ollama, stub
model = "llama-3.1-8b-instant"
temperature = 0.2
timeout_secs = 45
retries = 2
max_output_tokens = 600

[llm.openai_compat]
api_key_env = "GROQ_API_KEY"
base_url = "https://api.groq.com/openai/v1"

[llm.anthropic]
api_key_env = "ANTHROPIC_API_KEY"

[llm.ollama]
base_url = "http://localhost:11434"
"#
        .to_string()
    }
}

fn non_zero<T: Default + PartialEq>(value: T) -> Option<T> {
    if value == T::default() { None } else { Some(value) }
}
