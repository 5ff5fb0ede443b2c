use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Parser};
use log::error;
use rmcp::{ServiceExt, transport::stdio};
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use vikunja_mcp::credentials::{
    AgentPolicy, AgentSettings, CredentialChain, DEFAULT_AGENT_ADDR, DEFAULT_AGENT_TIMEOUT_SECS,
    DEFAULT_ARC_CLIENT, DEFAULT_ARC_ENVIRONMENT,
};
use vikunja_mcp::http::VikunjaClient;
use vikunja_mcp::runtime::{RealRuntime, Runtime};
use vikunja_mcp::server::VikunjaServer;
use vikunja_mcp::tools::describe_api_error;

/// vikunja-mcp - Vikunja task management for MCP clients
///
/// Serves the Vikunja API as MCP tools over stdio.
///
/// Credentials are read from the OpenBao agent first, then from
/// ~/.config/vikunja-mcp/config.json, then from VIKUNJA_URL and VIKUNJA_TOKEN.
///
/// Examples:
///   vikunja-mcp            # Serve MCP over stdio
///   vikunja-mcp check      # Verify credentials against the API
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// OpenBao agent address
    #[arg(long, env = "OPENBAO_AGENT_ADDR", default_value = DEFAULT_AGENT_ADDR, global = true)]
    agent_addr: String,

    /// Seconds to wait for the OpenBao agent
    #[arg(long, env = "OPENBAO_AGENT_TIMEOUT", default_value_t = DEFAULT_AGENT_TIMEOUT_SECS, global = true)]
    agent_timeout: f64,

    /// Client segment of the secret path
    #[arg(long, env = "ARC_CLIENT", default_value = DEFAULT_ARC_CLIENT, global = true)]
    arc_client: String,

    /// Environment segment of the secret path
    #[arg(long, env = "ARC_ENVIRONMENT", default_value = DEFAULT_ARC_ENVIRONMENT, global = true)]
    arc_environment: String,

    /// Identifier segment of the secret path (defaults to your git email or user name)
    #[arg(long, env = "VIKUNJA_MCP_IDENTIFIER", global = true)]
    agent_identifier: Option<String>,

    /// Refuse config file and environment credentials unless --dev-mode is set
    #[arg(
        long,
        env = "VIKUNJA_MCP_REQUIRE_AGENT",
        action = ArgAction::Set,
        value_parser = parse_flag,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        default_value_t = false,
        global = true
    )]
    require_agent: bool,

    /// Allow fallbacks even when the agent is required (local development only)
    #[arg(
        long,
        env = "OPENBAO_DEV_MODE",
        action = ArgAction::Set,
        value_parser = parse_flag,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        default_value_t = false,
        global = true
    )]
    dev_mode: bool,
}

/// `1`, `true` and `yes` (any case) enable a flag. Any other value disables it.
fn parse_flag(value: &str) -> Result<bool, Infallible> {
    Ok(matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    ))
}

#[derive(clap::Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Serve MCP over stdio (default)
    Serve,

    /// Resolve credentials and verify them against the Vikunja API
    Check,
}

impl Cli {
    fn agent_settings(&self) -> Result<AgentSettings> {
        let timeout = Duration::try_from_secs_f64(self.agent_timeout)
            .with_context(|| format!("Invalid agent timeout: {}", self.agent_timeout))?;
        Ok(AgentSettings {
            addr: self.agent_addr.clone(),
            timeout,
            arc_client: self.arc_client.clone(),
            arc_environment: self.arc_environment.clone(),
            identifier: self.agent_identifier.clone(),
        })
    }

    fn agent_policy(&self) -> AgentPolicy {
        AgentPolicy {
            require_agent: self.require_agent,
            dev_mode: self.dev_mode,
        }
    }
}

async fn serve(client: Arc<VikunjaClient>) -> Result<()> {
    eprintln!("Vikunja credentials from {}", client.source());
    eprintln!("Vikunja API: {}", client.api_base());

    let service = VikunjaServer::new(client)
        .serve(stdio())
        .await
        .inspect_err(|e| error!("serving error: {:?}", e))?;

    service.waiting().await?;
    Ok(())
}

async fn check(client: &VikunjaClient) -> Result<()> {
    let user = client.get("user").await.map_err(|e| {
        let message = describe_api_error(&e);
        anyhow!("{}", message.trim_start_matches("Error: "))
    })?;
    let username = user
        .get("username")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    println!("Credentials: {}", client.source());
    println!("API: {}", client.api_base());
    println!("Authenticated as: {}", username);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();
    let cli = Cli::parse();
    let runtime: Arc<dyn Runtime> = Arc::new(RealRuntime);

    let chain = CredentialChain::standard(runtime.clone(), cli.agent_settings()?, cli.agent_policy())?;
    let client = Arc::new(VikunjaClient::connect(runtime, &chain).await?);

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(client.clone()).await,
        Commands::Check => check(&client).await,
    };
    client.close();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_defaults_to_serve() {
        let cli = Cli::try_parse_from(["vikunja-mcp"]).unwrap();
        assert_eq!(cli.command, None);

        let cli = Cli::try_parse_from(["vikunja-mcp", "check"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Check));
    }

    #[test]
    fn test_cli_agent_options() {
        let cli = Cli::try_parse_from([
            "vikunja-mcp",
            "check",
            "--agent-addr",
            "http://bao.internal:8200",
            "--agent-timeout",
            "2.5",
            "--arc-client",
            "acme",
            "--arc-environment",
            "staging",
            "--agent-identifier",
            "sam",
        ])
        .unwrap();

        let settings = cli.agent_settings().unwrap();
        assert_eq!(settings.addr, "http://bao.internal:8200");
        assert_eq!(settings.timeout, Duration::from_millis(2500));
        assert_eq!(settings.arc_client, "acme");
        assert_eq!(settings.arc_environment, "staging");
        assert_eq!(settings.identifier.as_deref(), Some("sam"));
    }

    #[test]
    fn test_cli_policy_flags() {
        let cli = Cli::try_parse_from(["vikunja-mcp", "--require-agent", "check"]).unwrap();
        assert!(cli.require_agent);
        assert_eq!(cli.command, Some(Commands::Check));

        let cli =
            Cli::try_parse_from(["vikunja-mcp", "check", "--require-agent", "--dev-mode=yes"]).unwrap();
        assert_eq!(
            cli.agent_policy(),
            AgentPolicy {
                require_agent: true,
                dev_mode: true
            }
        );

        let cli = Cli::try_parse_from(["vikunja-mcp", "--dev-mode=off"]).unwrap();
        assert!(!cli.dev_mode);
    }

    #[test]
    fn test_parse_flag_is_lenient() {
        for on in ["1", "true", "TRUE", "yes", "Yes"] {
            assert_eq!(parse_flag(on), Ok(true), "{on}");
        }
        for off in ["0", "false", "no", "off", "2", "enabled", ""] {
            assert_eq!(parse_flag(off), Ok(false), "{off}");
        }
    }

    #[test]
    fn test_cli_unrecognized_flag_value_is_false() {
        let cli = Cli::try_parse_from(["vikunja-mcp", "check", "--dev-mode=2"]).unwrap();
        assert!(!cli.dev_mode);

        let cli = Cli::try_parse_from(["vikunja-mcp", "--require-agent=maybe"]).unwrap();
        assert!(!cli.require_agent);
    }

    #[test]
    fn test_cli_rejects_negative_timeout() {
        let cli = Cli::try_parse_from(["vikunja-mcp", "--agent-timeout=-1"]).unwrap();
        assert!(cli.agent_settings().is_err());
    }

    #[test]
    fn test_cli_unknown_subcommand_fails() {
        assert!(Cli::try_parse_from(["vikunja-mcp", "install"]).is_err());
    }
}
