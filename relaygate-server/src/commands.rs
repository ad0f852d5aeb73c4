use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use rand::Rng;
use relaygate_core::modules::config as core_config;
use relaygate_types::models::GatewayConfig;

const ADMIN_KEY_LEN: usize = 32;

pub fn generate_admin_key() -> String {
    let key: String = rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(ADMIN_KEY_LEN)
        .map(char::from)
        .collect();
    format!("rgk-{}", key)
}

pub fn handle_generate_key(config_path: &Path, save: bool) -> Result<()> {
    let admin_key = generate_admin_key();

    if save {
        core_config::update_config(config_path, |config| {
            config.admin_key.clone_from(&admin_key);
        })?;
        println!(
            "{} New admin key generated and saved to {}: {}",
            "✓".green(),
            config_path.display(),
            admin_key
        );
    } else {
        println!("{} New admin key generated: {}", "✓".green(), admin_key);
        println!("  Set it with {} or --save", "RELAYGATE_ADMIN_KEY".cyan());
    }
    Ok(())
}

/// Print the effective settings; fails on an invalid file or a missing admin key.
pub fn handle_check_config(config: &GatewayConfig, json: bool) -> Result<()> {
    core_config::validate_config(config)?;

    if json {
        let mut shown = config.clone();
        shown.admin_key = mask_key(&config.admin_key);
        println!("{}", serde_json::to_string_pretty(&shown)?);
    } else {
        println!("{}", "Gateway Configuration:".cyan().bold());
        println!("  Listen: {}:{}", config.host, config.port);
        println!("  Admin Key: {}", mask_key(&config.admin_key));
        println!("  Static Dir: {}", config.static_dir);
        println!("  Max Configs: {}", config.max_configs);
        println!("  Max Tokens/Config: {}", config.max_tokens_per_config);
        println!("  Allow Private IP: {}", config.allow_private_ip);
        println!("  Proxy Whitelist: {}", config.proxy_whitelist.len());
        println!("  Require Access Token: {}", config.require_access_token);
        println!("  Default Timeout: {}s", config.default_timeout_secs);
        match &config.data_file {
            Some(path) => println!("  Data File: {}", path.display()),
            None => println!("  Data File: {}", "(in-memory)".dimmed()),
        }
    }

    ensure_admin_key(config)?;
    println!("{} Configuration is valid", "✓".green());
    Ok(())
}

pub fn ensure_admin_key(config: &GatewayConfig) -> Result<()> {
    if config.admin_key.trim().is_empty() {
        anyhow::bail!(
            "admin_key is not set; run `relaygate gen-key --save` or set RELAYGATE_ADMIN_KEY"
        );
    }
    Ok(())
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
