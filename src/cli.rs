use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::metadata::{PKG_DESCRIPTION, PKG_NAME, PKG_VERSION};

#[derive(Parser, Debug, Clone)]
#[command(name = PKG_NAME)]
#[command(version = PKG_VERSION)]
#[command(about = PKG_DESCRIPTION, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the bot
    Start(CommandArguments),
    /// Show the resolved configuration (secrets redacted)
    Status(CommandArguments),
    /// Print the JSON Schema of the interaction wire format
    Schema,
    /// Print version information
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct CommandArguments {
    /// Bot token used for outbound messages
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Application (client) id; addresses interaction follow-ups
    #[arg(long, env = "DISCORD_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Name of the channel that receives the daily reminder
    #[arg(long, env = "DAILY_REMINDER_CHANNEL", default_value = "daily-coding")]
    pub reminder_channel: String,

    /// HTTP port for /health and /interactions
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// HTTP bind host
    #[arg(long, env = "BOT_HTTP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Directory holding one JSON file per store
    #[arg(long, env = "BOT_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Enable the HTTP transport
    #[arg(long, env = "BOT_ENABLE_HTTP", default_value_t = true, action = ArgAction::Set)]
    pub enable_http: bool,

    /// Enable the newline-delimited JSON stdio transport
    #[arg(long, env = "BOT_ENABLE_STDIO", default_value_t = false, action = ArgAction::Set)]
    pub enable_stdio: bool,
}

impl CommandArguments {
    pub fn default_settings() -> Self {
        Self {
            token: None,
            client_id: None,
            reminder_channel: "daily-coding".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            data_dir: PathBuf::from("./data"),
            enable_http: true,
            enable_stdio: false,
        }
    }

    pub fn http_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse::<SocketAddr>()
            .map_err(|e| format!("Invalid BOT_HTTP_HOST '{}': {e}", self.host))
    }

    /// Token and client id, both present and non-empty.
    pub fn credentials(&self) -> Result<(&str, &str), String> {
        let token = non_empty(self.token.as_deref())
            .ok_or_else(|| "DISCORD_TOKEN is required! Please set it in your environment variables.".to_string())?;
        let client_id = non_empty(self.client_id.as_deref()).ok_or_else(|| {
            "DISCORD_CLIENT_ID is required! Please set it in your environment variables.".to_string()
        })?;
        Ok((token, client_id))
    }

    /// Validate CLI/environment-derived arguments.
    pub fn validate(&self) -> Result<(), String> {
        self.credentials()?;
        if !self.enable_http && !self.enable_stdio {
            return Err("Enable at least one transport (http or stdio)".to_string());
        }
        if self.enable_http {
            self.http_addr()?;
        }
        if self.reminder_channel.trim().is_empty() {
            return Err("DAILY_REMINDER_CHANNEL cannot be empty".to_string());
        }
        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Masks all but the last four characters.
pub fn redact(secret: Option<&str>) -> String {
    let Some(secret) = non_empty(secret) else {
        return "<unset>".to_string();
    };
    let len = secret.chars().count();
    if len <= 4 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(len - 4).collect();
    format!("****{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> CommandArguments {
        CommandArguments {
            token: Some("abc.def.ghij".into()),
            client_id: Some("1234".into()),
            ..CommandArguments::default_settings()
        }
    }

    #[test]
    fn missing_credentials_abort_startup() {
        let mut args = configured();
        args.token = Some("  ".into());
        assert!(args.validate().unwrap_err().starts_with("DISCORD_TOKEN is required"));

        let mut args = configured();
        args.client_id = None;
        assert!(args.validate().unwrap_err().starts_with("DISCORD_CLIENT_ID is required"));

        assert!(configured().validate().is_ok());
    }

    #[test]
    fn at_least_one_transport() {
        let mut args = configured();
        args.enable_http = false;
        assert!(args.validate().is_err());
        args.enable_stdio = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn bad_host_is_rejected() {
        let mut args = configured();
        args.host = "not a host".into();
        assert!(args.validate().is_err());
        assert_eq!(configured().http_addr().unwrap().port(), 3000);
    }

    #[test]
    fn secrets_are_redacted() {
        assert_eq!(redact(None), "<unset>");
        assert_eq!(redact(Some("abc")), "****");
        assert_eq!(redact(Some("abc.def.ghij")), "****ghij");
    }

    #[test]
    fn flags_parse_with_explicit_bool_values() {
        let cli = Cli::try_parse_from([
            "codecircle-bot",
            "start",
            "--token",
            "t",
            "--client-id",
            "c",
            "--enable-http",
            "false",
            "--enable-stdio",
            "true",
        ])
        .unwrap();
        match cli.command {
            Command::Start(args) => {
                assert!(!args.enable_http);
                assert!(args.enable_stdio);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
