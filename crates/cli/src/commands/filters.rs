//! Filters command - inspect keyword filters without calling the model

use anyhow::{Context, Result};
use guardrail_chat_domain::usecases::chat::refusal_message;
use guardrail_chat_domain::usecases::{classify, matched_keyword};
use guardrail_chat_domain::{FilterConfiguration, SafetyVerdict};
use serde::Serialize;
use std::path::PathBuf;

use crate::args::{FiltersArgs, FiltersCommands};
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct CheckOutput<'a> {
    verdict: SafetyVerdict,
    matched_keyword: Option<&'a str>,
    refusal: Option<&'static str>,
}

pub async fn execute(args: FiltersArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let filters = config.filter_configuration()?;

    match args.command {
        FiltersCommands::List { json } => list_filters(&filters, json),
        FiltersCommands::Check { text, json } => check_text(&filters, &text, json),
    }
}

fn list_filters(filters: &FilterConfiguration, json: bool) -> Result<()> {
    if json {
        let json = serde_json::to_string_pretty(filters).context("Failed to serialize filters")?;
        println!("{}", json);
        return Ok(());
    }

    println!("Topic keywords ({}):", filters.topic_keywords().len());
    for keyword in filters.topic_keywords() {
        println!("  - {}", keyword);
    }
    println!();
    println!("Toxic keywords ({}):", filters.toxic_keywords().len());
    for keyword in filters.toxic_keywords() {
        println!("  - {}", keyword);
    }

    Ok(())
}

fn check_text(filters: &FilterConfiguration, text: &str, json: bool) -> Result<()> {
    let output = check(filters, text);

    if json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialize output")?;
        println!("{}", json);
        return Ok(());
    }

    println!("Verdict: {}", output.verdict);
    if let Some(keyword) = output.matched_keyword {
        println!("Matched keyword: {}", keyword);
    }
    if let Some(refusal) = output.refusal {
        println!("Reply: {}", refusal);
    }

    Ok(())
}

fn check<'a>(filters: &'a FilterConfiguration, text: &str) -> CheckOutput<'a> {
    let verdict = classify(text, filters);
    let matched_keyword = match verdict {
        SafetyVerdict::RestrictedTopic | SafetyVerdict::PotentiallyToxic => {
            matched_keyword(text, filters)
        }
        _ => None,
    };

    CheckOutput {
        verdict,
        matched_keyword,
        refusal: refusal_message(verdict),
    }
}
