//! Config command - show the effective client configuration

use super::Context;
use crate::output;
use anyhow::Result;
use owo_colors::OwoColorize;

/// `config show`
pub fn show(ctx: &Context) -> Result<()> {
    let config = ctx.client_config()?;

    if ctx.json() {
        return output::json(&config);
    }

    output::header("⚙  Client Configuration");
    println!("  API URL:      {}", config.base_url);
    println!("  Forum URL:    {}", config.forum_url);
    println!("  Environment:  {:?}", config.environment);
    println!("  Timeout:      {}s", config.timeout.as_secs());
    println!(
        "  Attempts:     {} (first retry after {}ms)",
        config.retry.config.max_attempts(),
        config.retry.config.backoff.base_delay(1).as_millis()
    );
    println!("  Fallback:     {:?}", config.fallback);
    println!(
        "  Token:        {}",
        if config.token.is_some() {
            "✓ set".green().to_string()
        } else {
            "✗ none".dimmed().to_string()
        }
    );
    if let Some(path) = &ctx.config_path {
        println!("  File:         {}", path.display());
    }
    println!();
    Ok(())
}
