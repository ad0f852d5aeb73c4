use clap::{Parser, Subcommand};
use relaygate_types::models::GatewayConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "relaygate",
    about = "RelayGate - Multi-tenant reverse proxy gateway",
    version = env!("CARGO_PKG_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, env = "RELAYGATE_CONFIG", help = "Path to the settings file")]
    pub config: Option<PathBuf>,

    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[command(flatten)]
    pub serve: ServeArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the gateway (default if no command specified)")]
    Serve,

    #[command(about = "Generate a random admin key")]
    GenKey {
        #[arg(long, help = "Also write the key into the settings file")]
        save: bool,
    },

    #[command(about = "Validate the settings file and print the effective values")]
    CheckConfig {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },
}

/// Flags that override the settings file for one run. Global, so they work
/// with or without the `serve` subcommand.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct ServeArgs {
    #[arg(short, long, global = true, env = "RELAYGATE_PORT")]
    pub port: Option<u16>,

    #[arg(long, global = true, env = "RELAYGATE_HOST")]
    pub host: Option<String>,

    #[arg(long, global = true, env = "RELAYGATE_ADMIN_KEY", hide_env_values = true)]
    pub admin_key: Option<String>,

    #[arg(long, global = true, env = "RELAYGATE_STATIC_DIR")]
    pub static_dir: Option<String>,

    #[arg(long, global = true, env = "RELAYGATE_DATA_FILE", help = "Snapshot file for tenant configs")]
    pub data_file: Option<PathBuf>,

    #[arg(long, global = true, env = "RELAYGATE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "Permit upstream proxies and destinations on private networks")]
    pub allow_private_ip: bool,

    #[arg(long, global = true, help = "Every forward must present a valid access token")]
    pub require_access_token: bool,
}

impl ServeArgs {
    /// Layer the flags over settings loaded from file.
    pub fn apply(&self, config: &mut GatewayConfig) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(host) = &self.host {
            config.host.clone_from(host);
        }
        if let Some(key) = &self.admin_key {
            config.admin_key = key.trim().to_string();
        }
        if let Some(dir) = &self.static_dir {
            config.static_dir.clone_from(dir);
        }
        if self.data_file.is_some() {
            config.data_file.clone_from(&self.data_file);
        }
        if self.log_dir.is_some() {
            config.log_dir.clone_from(&self.log_dir);
        }
        // flags can only switch these on
        config.allow_private_ip |= self.allow_private_ip;
        config.require_access_token |= self.require_access_token;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_serve_overrides_parse() {
        let cli = Cli::try_parse_from([
            "relaygate",
            "serve",
            "--port",
            "9090",
            "--admin-key",
            "k",
            "--allow-private-ip",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve)));
        let args = cli.serve;
        assert_eq!(args.port, Some(9090));
        assert_eq!(args.admin_key.as_deref(), Some("k"));
        assert!(args.allow_private_ip);
        assert!(!args.require_access_token);
    }

    #[test]
    fn test_apply_keeps_unset_fields() {
        let mut config = GatewayConfig { port: 8081, allow_private_ip: true, ..Default::default() };
        let args = ServeArgs { admin_key: Some(" key ".to_string()), ..Default::default() };
        args.apply(&mut config);
        assert_eq!(config.port, 8081);
        assert_eq!(config.admin_key, "key");
        assert!(config.allow_private_ip);
        assert!(config.data_file.is_none());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_overrides_without_subcommand() {
        let cli = Cli::try_parse_from(["relaygate", "-p", "7070"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.serve.port, Some(7070));
    }
}
