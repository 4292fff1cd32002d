//! Doctor command - validate configuration and show status

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::args::DoctorArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    filters: CheckResult,
    llm: CheckResult,
    interaction_log: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        filters: CheckResult::error("Not checked"),
        llm: CheckResult::error("Not checked"),
        interaction_log: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    match AppConfig::load(config_path.as_deref()) {
        Ok(config) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            report.filters = check_filters(&config);
            report.llm = check_llm(&config);
            report.interaction_log = check_interaction_log(&config);
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
        }
    }

    let checks = [
        &report.config,
        &report.filters,
        &report.llm,
        &report.interaction_log,
    ];

    report.overall = if checks.iter().any(|c| c.is_error()) {
        "error".to_string()
    } else if checks.iter().all(|c| c.is_ok()) {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

fn check_filters(config: &AppConfig) -> CheckResult {
    let filters = match config.filter_configuration() {
        Ok(filters) => filters,
        Err(e) => return CheckResult::error(format!("{:#}", e)),
    };

    let topic = filters.topic_keywords().len();
    let toxic = filters.toxic_keywords().len();
    let details = serde_json::json!({ "topic_keywords": topic, "toxic_keywords": toxic });

    if topic == 0 && toxic == 0 {
        CheckResult::warn("No keywords configured; only length checks apply").with_details(details)
    } else {
        CheckResult::ok(format!("{} topic, {} toxic keywords", topic, toxic)).with_details(details)
    }
}

fn check_llm(config: &AppConfig) -> CheckResult {
    let provider = &config.llm.provider;
    let model = &config.llm.model;

    // Check if API key env var is set (without revealing the value)
    let api_key_env = match provider.as_str() {
        "openai_compat" => {
            if config.llm.openai_compat.base_url.trim().is_empty() {
                return CheckResult::error("OpenAI-compatible base_url is empty");
            }
            &config.llm.openai_compat.api_key_env
        }
        "anthropic" => &config.llm.anthropic.api_key_env,
        "ollama" => {
            return CheckResult::ok(format!(
                "Provider: ollama, Model: {}, base_url: {}",
                model, config.llm.ollama.base_url
            ));
        }
        "stub" => return CheckResult::warn("Provider: stub (offline, canned replies)"),
        other => return CheckResult::error(format!("Unknown provider: {}", other)),
    };

    if api_key_env.trim().is_empty() {
        return CheckResult::error(format!("No API key env var configured for {}", provider));
    }

    match std::env::var(api_key_env) {
        Ok(val) if !val.trim().is_empty() => CheckResult::ok(format!(
            "Provider: {}, Model: {}, API key: {} (set)",
            provider, model, api_key_env
        )),
        _ => CheckResult::error(format!(
            "Provider: {}, Model: {}, API key: {} (not set)",
            provider, model, api_key_env
        )),
    }
}

fn check_interaction_log(config: &AppConfig) -> CheckResult {
    match config.general.interaction_log.as_str() {
        "jsonl" => check_log_path(&config.general.interaction_log_path),
        "tracing" => CheckResult::ok("Interactions go to the tracing output"),
        "none" => CheckResult::warn("Interaction logging disabled"),
        other => CheckResult::error(format!("Unknown interaction log: {}", other)),
    }
}

fn check_log_path(path: &Path) -> CheckResult {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    if path.is_dir() {
        CheckResult::error(format!("Interaction log path is a directory: {}", path.display()))
    } else if path.exists() || parent.is_dir() {
        CheckResult::ok(format!("Interactions appended to {}", path.display()))
    } else {
        CheckResult::warn(format!(
            "Directory {} will be created on first run",
            parent.display()
        ))
    }
}

fn print_report(report: &DoctorReport) {
    println!("guardrail-chat Doctor Report");
    println!("============================");
    println!();

    print_check("Config", &report.config);
    print_check("Filters", &report.filters);
    print_check("LLM Provider", &report.llm);
    print_check("Interaction Log", &report.interaction_log);

    println!();
    println!(
        "{} Overall: {}",
        status_symbol(&report.overall),
        report.overall.to_uppercase()
    );

    if report.overall == "ok" {
        println!();
        println!("Ready to chat! Try: guardrail-chat run");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    println!("{} {}: {}", status_symbol(&result.status), name, result.message);
}

fn status_symbol(status: &str) -> &'static str {
    match status {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    }
}
