use std::io::{self, Write};

use clap::{Args, Subcommand};

use crate::config::{
    DEFAULT_BIND_ADDRESS, DEFAULT_DAILY_LIMIT, DEFAULT_GEMINI_MODEL, DEFAULT_SERVER_URL,
    StoredConfig, config_file_path,
};
use crate::error::{AppError, AppResult};

const NOT_SET: &str = "<not set>";

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the stored configuration (secrets masked).
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_init() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;

    println!("Configuring TicketZero.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!("Secrets are stored in the local config file; protect your filesystem accordingly.");
    println!("GEMINI_API_KEY and friends in the environment override these values.");
    println!();

    apply_prompt("Gemini API key", &mut cfg.gemini_api_key, true)?;
    apply_prompt(
        &format!("Gemini model (default {DEFAULT_GEMINI_MODEL})"),
        &mut cfg.gemini_model,
        false,
    )?;
    apply_prompt(
        &format!("Server bind address (default {DEFAULT_BIND_ADDRESS})"),
        &mut cfg.bind_address,
        false,
    )?;
    apply_prompt(
        &format!("Server URL used by the client (default {DEFAULT_SERVER_URL})"),
        &mut cfg.server_url,
        false,
    )?;
    apply_prompt(
        &format!("Daily credit limit (default {DEFAULT_DAILY_LIMIT})"),
        &mut cfg.daily_limit,
        false,
    )?;

    if let Some(limit) = cfg.daily_limit.as_deref() {
        if limit.parse::<u32>().is_err() {
            return Err(AppError::Configuration(format!(
                "daily limit must be a whole number, got '{limit}'"
            )));
        }
    }

    cfg.save()?;

    let path = config_file_path()?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show() -> AppResult<()> {
    let cfg = StoredConfig::load()?;
    let path = config_file_path()?;

    println!("Configuration file: {}", path.display());
    println!("Gemini API key: {}", mask_secret(cfg.gemini_api_key.as_deref()));
    println!("Gemini model: {}", display_value(cfg.gemini_model.as_deref()));
    println!("Bind address: {}", display_value(cfg.bind_address.as_deref()));
    println!("Server URL: {}", display_value(cfg.server_url.as_deref()));
    println!("Daily limit: {}", display_value(cfg.daily_limit.as_deref()));

    Ok(())
}

fn apply_prompt(field: &str, target: &mut Option<String>, secret: bool) -> AppResult<()> {
    match prompt(field, target.as_deref(), secret)? {
        PromptAction::Keep => {}
        PromptAction::Clear => *target = None,
        PromptAction::Set(value) => *target = Some(value),
    }
    Ok(())
}

fn prompt(field: &str, current: Option<&str>, secret: bool) -> AppResult<PromptAction> {
    let mut stdout = io::stdout();

    match (current, secret) {
        (Some(_), true) => write!(stdout, "{field} [****] (Enter to keep, '-' to clear): ")?,
        (Some(value), false) => {
            write!(stdout, "{field} [{value}] (Enter to keep, '-' to clear): ")?
        }
        (None, _) => write!(stdout, "{field} (Enter to skip): ")?,
    }
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let trimmed = input.trim();

    if trimmed.is_empty() {
        Ok(PromptAction::Keep)
    } else if trimmed == "-" {
        Ok(PromptAction::Clear)
    } else {
        Ok(PromptAction::Set(trimmed.to_string()))
    }
}

fn display_value(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(NOT_SET)
}

fn mask_secret(value: Option<&str>) -> String {
    let Some(secret) = value.filter(|v| !v.is_empty()) else {
        return NOT_SET.to_string();
    };
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 6 {
        return "***".to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 3..].iter().collect();
    format!("{head}***{tail}")
}

enum PromptAction {
    Keep,
    Clear,
    Set(String),
}
