use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codecircle_bot::{
    cli::{Cli, Command, CommandArguments, redact},
    command::Interaction,
    error::ServiceResult,
    metadata::{PKG_DESCRIPTION, PKG_NAME, PKG_VERSION},
    reply::Reply,
    server,
};

#[tokio::main]
async fn main() -> ServiceResult<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Could not load .env: {e}");
        }
    }

    // stdout carries the stdio transport, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match Cli::parse().command {
        Command::Start(args) => {
            tracing::info!("Starting {PKG_NAME} v{PKG_VERSION}");
            server::start_server(args).await
        }
        Command::Status(args) => {
            print_status(&args);
            Ok(())
        }
        Command::Schema => {
            let schema = serde_json::json!({
                "interaction": schemars::schema_for!(Interaction),
                "reply": schemars::schema_for!(Reply),
            });
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
        Command::Version => {
            println!("{PKG_NAME} {PKG_VERSION}");
            println!("{PKG_DESCRIPTION}");
            Ok(())
        }
    }
}

fn print_status(args: &CommandArguments) {
    let flag = |on: bool| if on { "enabled".green() } else { "disabled".dimmed() };

    println!("{}", format!("{PKG_NAME} v{PKG_VERSION}").bold());
    println!("  token:            {}", redact(args.token.as_deref()));
    println!("  client id:        {}", redact(args.client_id.as_deref()));
    println!("  reminder channel: #{}", args.reminder_channel);
    println!("  data dir:         {}", args.data_dir.display());
    println!("  http:             {} ({}:{})", flag(args.enable_http), args.host, args.port);
    println!("  stdio:            {}", flag(args.enable_stdio));

    match args.validate() {
        Ok(()) => println!("{}", "configuration ok".green()),
        Err(e) => println!("{} {e}", "configuration error:".red().bold()),
    }
}
