//! Chat command - one message through the guardrails

use anyhow::{Context, Result, bail};
use guardrail_chat_adapters::interaction_log::{JsonlInteractionLog, TracingInteractionLog};
use guardrail_chat_adapters::llm::{
    AnthropicGateway, OllamaGateway, OpenAiCompatGateway, StubGateway,
};
use guardrail_chat_domain::usecases::{ChatPipeline, classify};
use guardrail_chat_domain::{
    GatewayError, GenerationGateway, GuardrailType, InteractionLog, LogError, SafetyVerdict,
    SystemClock, Turn,
};
use secrecy::SecretString;
use serde::Serialize;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use crate::args::ChatArgs;
use crate::config::AppConfig;

/// Pipeline wired to runtime-selected adapters
pub(crate) type Pipeline = ChatPipeline<dyn GenerationGateway, dyn InteractionLog, SystemClock>;

#[derive(Debug, Serialize)]
struct ChatOutput<'a> {
    input: &'a str,
    verdict: SafetyVerdict,
    guardrail_type: Option<GuardrailType>,
    response: String,
}

pub async fn execute(args: ChatArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let text = get_input_text(&args)?;
    let input = text.as_str();

    let mut pipeline = build_pipeline(&config).await?;
    let verdict = classify(input, pipeline.filters());

    tracing::debug!(verdict = %verdict, input_chars = input.chars().count(), "Input classified");

    let response = pipeline.process_turn(input).await;

    if args.json {
        let output = ChatOutput {
            input,
            verdict,
            guardrail_type: verdict.guardrail_type(),
            response,
        };
        let json = serde_json::to_string_pretty(&output).context("Failed to serialize output")?;
        println!("{}", json);
    } else {
        println!("{}", response);
    }

    Ok(())
}

/// Build a pipeline from configuration, failing on missing credentials
pub(crate) async fn build_pipeline(config: &AppConfig) -> Result<Pipeline> {
    let chat_config = config.chat_config()?;
    let gateway = build_gateway(config)?;
    let interaction_log = build_interaction_log(config).await?;

    tracing::info!(
        provider = gateway.provider(),
        model = %config.llm.model,
        topic_keywords = chat_config.filters.topic_keywords().len(),
        toxic_keywords = chat_config.filters.toxic_keywords().len(),
        "Guardrails initialized"
    );

    Ok(ChatPipeline::new(
        gateway,
        interaction_log,
        Arc::new(SystemClock),
        chat_config,
    ))
}

pub(crate) fn build_gateway(config: &AppConfig) -> Result<Arc<dyn GenerationGateway>> {
    let gateway_config = config.gateway_config();

    let gateway: Arc<dyn GenerationGateway> = match config.llm.provider.as_str() {
        "openai_compat" => {
            let api_key = load_api_key(&config.llm.openai_compat.api_key_env, "openai_compat")?;
            Arc::new(
                OpenAiCompatGateway::new(
                    api_key,
                    config.llm.openai_compat.base_url.clone(),
                    gateway_config,
                )
                .map_err(gateway_setup_error)?,
            )
        }
        "anthropic" => {
            let api_key = load_api_key(&config.llm.anthropic.api_key_env, "anthropic")?;
            Arc::new(AnthropicGateway::new(api_key, gateway_config).map_err(gateway_setup_error)?)
        }
        "ollama" => {
            let base_url = config.llm.ollama.base_url.trim();
            let gateway = if base_url.is_empty() {
                OllamaGateway::new(gateway_config)
            } else {
                OllamaGateway::with_base_url(base_url.to_string(), gateway_config)
            };
            Arc::new(gateway.map_err(gateway_setup_error)?)
        }
        "stub" => Arc::new(StubGateway::echo()),
        other => bail!("Unknown LLM provider: {}", other),
    };

    Ok(gateway)
}

fn gateway_setup_error(error: GatewayError) -> anyhow::Error {
    anyhow::Error::new(error).context("Failed to configure LLM provider")
}

pub(crate) async fn build_interaction_log(config: &AppConfig) -> Result<Arc<dyn InteractionLog>> {
    match config.general.interaction_log.as_str() {
        "jsonl" => {
            let path = &config.general.interaction_log_path;
            let log = JsonlInteractionLog::new(path.clone())
                .await
                .with_context(|| format!("Failed to open interaction log: {}", path.display()))?;
            Ok(Arc::new(log))
        }
        "tracing" => Ok(Arc::new(TracingInteractionLog)),
        "none" => Ok(Arc::new(DiscardInteractionLog)),
        other => bail!("Unknown interaction log: {}", other),
    }
}

/// Interaction log that keeps nothing
struct DiscardInteractionLog;

#[async_trait::async_trait]
impl InteractionLog for DiscardInteractionLog {
    async fn record(&self, _turn: &Turn) -> Result<(), LogError> {
        Ok(())
    }
}

pub(crate) fn load_api_key(env_var: &str, provider: &str) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No API key env var configured for provider {}", provider);
    }

    let key = std::env::var(env_var).with_context(|| {
        format!(
            "Missing API key env var {} for provider {}",
            env_var, provider
        )
    })?;

    if key.trim().is_empty() {
        bail!(
            "API key env var {} is empty for provider {}",
            env_var,
            provider
        );
    }

    Ok(SecretString::new(key.into()))
}

fn get_input_text(args: &ChatArgs) -> Result<String> {
    if let Some(ref text) = args.text {
        return Ok(text.clone());
    }

    let text = match args.file {
        Some(ref path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?,
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read from stdin")?;
            text
        }
    };

    Ok(strip_line_ending(text))
}

/// Drop the final newline a file or pipe adds; other whitespace counts toward the length
fn strip_line_ending(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardrail_chat_adapters::interaction_log::InMemoryInteractionLog;
    use tempfile::TempDir;

    #[test]
    fn test_build_gateway_stub() {
        let mut config = AppConfig::default();
        config.llm.provider = "stub".to_string();

        let gateway = build_gateway(&config).unwrap();
        assert_eq!(gateway.provider(), "stub");
    }

    #[test]
    fn test_build_gateway_unknown_provider() {
        let mut config = AppConfig::default();
        config.llm.provider = "carrier-pigeon".to_string();

        let err = build_gateway(&config).err().unwrap();
        assert!(err.to_string().contains("carrier-pigeon"));
    }

    #[test]
    fn test_build_gateway_missing_key_is_error() {
        let mut config = AppConfig::default();
        config.llm.openai_compat.api_key_env = "GUARDRAIL_CHAT_TEST_UNSET_KEY".to_string();

        let err = build_gateway(&config).err().unwrap();
        assert!(err.to_string().contains("GUARDRAIL_CHAT_TEST_UNSET_KEY"));
    }

    #[test]
    fn test_text_argument_kept_verbatim() {
        let padded = format!("{}     ", "a".repeat(999));
        let args = ChatArgs {
            text: Some(padded.clone()),
            file: None,
            json: false,
        };

        assert_eq!(get_input_text(&args).unwrap(), padded);
    }

    #[test]
    fn test_file_input_drops_only_final_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("message.txt");
        std::fs::write(&path, "  hello  \r\n").unwrap();
        let args = ChatArgs {
            text: None,
            file: Some(path),
            json: false,
        };

        assert_eq!(get_input_text(&args).unwrap(), "  hello  ");
    }

    #[tokio::test]
    async fn test_trailing_spaces_count_toward_length() {
        let mut config = AppConfig::default();
        config.llm.provider = "stub".to_string();
        config.general.interaction_log = "none".to_string();
        let mut pipeline = build_pipeline(&config).await.unwrap();

        let padded = format!("{}     ", "a".repeat(999));
        let reply = pipeline.process_turn(&padded).await;

        assert_eq!(reply, guardrail_chat_domain::usecases::chat::TOO_LONG_REPLY);
    }

    #[test]
    fn test_load_api_key_blank_env_name() {
        assert!(load_api_key("  ", "anthropic").is_err());
    }

    #[tokio::test]
    async fn test_stub_pipeline_writes_jsonl() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.llm.provider = "stub".to_string();
        config.general.interaction_log_path = dir.path().join("logs/turns.jsonl");

        let mut pipeline = build_pipeline(&config).await.unwrap();
        let reply = pipeline.process_turn("What is machine learning?").await;

        assert!(reply.starts_with("Stub reply to: What is machine learning?"));
        let logged = std::fs::read_to_string(&config.general.interaction_log_path).unwrap();
        assert_eq!(logged.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_turn_recorded_but_not_kept() {
        let log = Arc::new(InMemoryInteractionLog::default());
        let mut pipeline = ChatPipeline::new(
            Arc::new(StubGateway::echo()),
            log.clone(),
            Arc::new(SystemClock),
            AppConfig::default().chat_config().unwrap(),
        );

        let reply = pipeline.process_turn("Which political party is better?").await;

        assert_eq!(reply, guardrail_chat_domain::usecases::chat::RESTRICTED_TOPIC_REPLY);
        assert!(pipeline.history().is_empty());
        let turns = log.turns().unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].bot_response, "Input rejected - restricted topic");
        assert_eq!(turns[0].guardrail_type, Some(GuardrailType::TopicRestriction));
    }

    #[tokio::test]
    async fn test_unknown_interaction_log() {
        let mut config = AppConfig::default();
        config.general.interaction_log = "carbon-paper".to_string();

        assert!(build_interaction_log(&config).await.is_err());
    }
}
