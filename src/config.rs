use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use crate::allow_list::AllowList;

pub const DEFAULT_ALLOW_LIST: &[&str] = &[
    "localhost:3000",
    "readysetllc.com",
    "ready-sets-projects.vercel.app",
    "supabase.co",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate a single destination against the allow-list and exit
    Check { destination: String },
}

#[derive(Debug, Parser)]
#[command(
    name = "redirect-guard",
    version,
    about = "Validates redirect destinations against an allow-list of hosts"
)]
pub struct Config {
    #[arg(short, long, env = "REDIRECT_GUARD_PORT", default_value_t = 3000)]
    pub port: u16,

    #[arg(short, long, env = "REDIRECT_GUARD_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    #[arg(
        long,
        env = "REDIRECT_GUARD_ALLOWLIST",
        value_delimiter = ',',
        default_values_t = DEFAULT_ALLOW_LIST.iter().map(|h| h.to_string())
    )]
    pub allow_list: Vec<String>,

    #[arg(long, env = "REDIRECT_GUARD_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Config {
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// Normalizes the configured entries. Call after logging is up so the
    /// resulting list shows in the startup logs.
    pub fn load_allow_list(&self) -> anyhow::Result<AllowList> {
        build_allow_list(self.allow_list.clone())
    }
}

fn build_allow_list(entries: Vec<String>) -> anyhow::Result<AllowList> {
    let allow_list = AllowList::new(entries).context("allow-list misconfigured")?;

    if allow_list.is_empty() {
        warn!("Allow-list is empty, every redirect will be rejected");
    } else {
        info!(hosts = ?allow_list.hosts(), "Allow-list loaded");
    }

    Ok(allow_list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["redirect-guard"]).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.address(), "0.0.0.0:3000");
        assert_eq!(config.allow_list, DEFAULT_ALLOW_LIST);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.command.is_none());
    }

    #[test]
    fn allow_list_is_comma_separated() {
        let config = Config::try_parse_from([
            "redirect-guard",
            "--allow-list",
            "example.com,localhost:8080",
            "--log-format",
            "json",
            "check",
            "https://example.com/",
        ])
        .unwrap();

        assert_eq!(config.allow_list, ["example.com", "localhost:8080"]);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(matches!(
            config.command,
            Some(Command::Check { ref destination }) if destination == "https://example.com/"
        ));
    }

    #[test]
    fn invalid_entries_fail_the_load() {
        assert!(build_allow_list(vec!["localhost:nope".to_string()]).is_err());
        assert!(build_allow_list(vec![]).unwrap().is_empty());
    }
}
