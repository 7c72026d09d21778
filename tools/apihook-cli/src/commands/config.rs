//! Configuration management commands.

use std::path::Path;

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CliConfig};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init {
            base_url,
            json,
            force,
        } => init_config(&base_url, json, force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "none (defaults)"),
    }

    let config = &ctx.config;

    ctx.output.info("");
    ctx.output.info("[store]");
    ctx.output
        .kv("base_url", config.store.base_url.as_deref().unwrap_or("unset"));
    ctx.output.kv(
        "token",
        if config.store.token.is_some() { "set" } else { "unset" },
    );

    ctx.output.info("");
    ctx.output.info("[executor]");
    ctx.output.kv(
        "timeout_ms",
        &config
            .executor
            .timeout_ms
            .map_or_else(|| "none".to_string(), |ms| ms.to_string()),
    );
    if let Some(ref agent) = config.executor.user_agent {
        ctx.output.kv("user_agent", agent);
    }
    for (name, value) in &config.executor.default_headers {
        ctx.output.list_item(&format!("{}: {}", name, value));
    }

    ctx.output.info("");
    ctx.output.info("[hook]");
    ctx.output
        .kv("debouncing_limit_ms", &config.hook.debouncing_limit_ms.to_string());
    ctx.output.kv("show_loader", &config.hook.show_loader.to_string());
    ctx.output.kv(
        "authentication_required",
        &config.hook.authentication_required.to_string(),
    );
    for (name, value) in &config.hook.headers {
        ctx.output.list_item(&format!("{}: {}", name, value));
    }

    Ok(())
}

fn init_config(base_url: &str, json: bool, force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx
        .cwd
        .join(if json { "apihook.json" } else { "apihook.toml" });

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    write_default(&config_path, base_url)?;
    ctx.output
        .success(&format!("Created: {}", config_path.display()));

    Ok(())
}

fn write_default(path: &Path, base_url: &str) -> Result<()> {
    let content = generate_default_config(base_url);
    if path.extension().is_some_and(|ext| ext == "json") {
        let config: CliConfig = toml::from_str(&content)?;
        config.save(path)
    } else {
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let Some(path) = ctx.config_path.as_ref() else {
        bail!("No config file found. Run `apihook config init` to create one.");
    };
    ctx.output.kv("file", &path.display().to_string());

    let (errors, warnings) = ctx.config.check();

    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}
