use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input};

use super::{Config, ConfigError, OpenAiConfig};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 Folio Chat Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Provider Configuration").bold().yellow());
    eprintln!("Configure the embedding and chat-completion provider.");
    eprintln!("Leave the API key empty to run in keyword-fallback mode.");
    eprintln!();

    configure_provider(&mut config.openai)?;

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());

        let config_path = Config::config_file_path().context("Failed to get config file path")?;
        eprintln!(
            "Configuration saved to: {}",
            style(config_path.display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Provider Settings:").bold().yellow());
    let key_display = if config.provider_configured() {
        "configured"
    } else {
        "not set (fallback mode)"
    };
    eprintln!("  API Key: {}", style(key_display).cyan());
    eprintln!("  API Base: {}", style(&config.openai.api_base).cyan());
    eprintln!(
        "  Embedding Model: {}",
        style(&config.openai.embedding_model).cyan()
    );
    eprintln!("  Chat Model: {}", style(&config.openai.chat_model).cyan());

    eprintln!();
    eprintln!("{}", style("Retrieval Settings:").bold().yellow());
    eprintln!(
        "  Context Limit: {}",
        style(config.retrieval.context_limit).cyan()
    );
    eprintln!(
        "  Similarity Threshold: {}",
        style(config.retrieval.similarity_threshold).cyan()
    );

    let config_path = Config::config_file_path().context("Failed to get config file path")?;
    eprintln!();
    eprintln!("Config file: {}", style(config_path.display()).dim());

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    Config::load().map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config::default())
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_provider(openai: &mut OpenAiConfig) -> Result<()> {
    let api_key: String = Input::new()
        .with_prompt("API key (empty for fallback mode)")
        .default(openai.api_key.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;

    openai.api_key = if api_key.trim().is_empty() {
        None
    } else {
        Some(api_key)
    };

    let api_base: String = Input::new()
        .with_prompt("API base URL")
        .default(openai.api_base.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = OpenAiConfig {
                api_base: input.clone(),
                ..OpenAiConfig::default()
            };
            temp_config.validate()
        })
        .interact_text()?;
    openai.api_base = api_base;

    let embedding_model: String = Input::new()
        .with_prompt("Embedding model")
        .default(openai.embedding_model.clone())
        .interact_text()?;
    openai.embedding_model = embedding_model;

    let chat_model: String = Input::new()
        .with_prompt("Chat model")
        .default(openai.chat_model.clone())
        .interact_text()?;
    openai.chat_model = chat_model;

    Ok(())
}
