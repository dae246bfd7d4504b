use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{Map, Value, json};
use subg_client::config::{ClientConfig, ConfigError, NetworkMonitorMode};
use subg_client::context::{AppContext, ContextError};
use subg_client::network::NetworkMonitor;
use subg_client::notify::{ChannelNotifier, Notice};
use tokio::sync::mpsc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Context(#[from] ContextError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("expected a JSON object for --data")]
    NotAnObject,
    #[error("not signed in")]
    NotSignedIn,
    #[error("{0} failed")]
    Failed(&'static str),
}

#[derive(Parser, Debug)]
#[command(name = "subg", about = "SUBG QUIZ session and connectivity client")]
struct Cli {
    /// Overrides `SUBG_API_BASE_URL`.
    #[arg(long)]
    api_base_url: Option<String>,

    /// Overrides `SUBG_STORAGE_PATH`.
    #[arg(long)]
    storage_path: Option<PathBuf>,

    /// Use the always-online connectivity fallback.
    #[arg(long, default_value_t = false)]
    offline_fallback: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with an email or username.
    Login {
        identifier: String,
        #[arg(long, env = "SUBG_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in with a Google identity payload.
    GoogleLogin {
        #[arg(long)]
        data: String,
    },
    Register {
        #[arg(long)]
        data: String,
    },
    Logout,
    /// Rehydrate and verify the stored session.
    Status,
    /// Re-fetch the signed-in user's profile.
    Refresh,
    ResetPassword {
        token: String,
        #[arg(long, env = "SUBG_NEW_PASSWORD", hide_env_values = true)]
        new_password: String,
    },
    /// Merge fields into the stored user.
    UpdateUser {
        #[arg(long)]
        data: String,
    },
    Network {
        /// Keep printing state changes until interrupted.
        #[arg(long, default_value_t = false)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api_base_url {
        config.api_base_url = url.trim_end_matches('/').to_owned();
    }
    if let Some(path) = cli.storage_path {
        config.storage_path = path;
    }
    if cli.offline_fallback {
        config.network.mode = NetworkMonitorMode::Fallback;
    }

    let (notifier, notices) = ChannelNotifier::new();
    let printer = tokio::spawn(print_notices(notices));
    let context = AppContext::from_config(&config, std::sync::Arc::new(notifier)).await?;

    let outcome = run(&context, cli.command).await;

    context.shutdown();
    drop(context);
    if let Err(err) = printer.await {
        warn!(error = %err, "notice printer stopped");
    }
    outcome
}

async fn run(context: &AppContext, command: Command) -> Result<(), CliError> {
    let session = context.session()?;
    match command {
        Command::Login { identifier, password } => {
            warn_if_offline(context.network()?);
            succeed(session.login(&identifier, &password).await, "login")
        }
        Command::GoogleLogin { data } => {
            warn_if_offline(context.network()?);
            let payload = serde_json::from_str::<Value>(&data)?;
            succeed(session.google_login(&payload).await, "google login")
        }
        Command::Register { data } => {
            warn_if_offline(context.network()?);
            let payload = serde_json::from_str::<Value>(&data)?;
            succeed(session.register(&payload).await, "registration")
        }
        Command::Logout => {
            session.logout().await;
            println!("signed out");
            Ok(())
        }
        Command::Status => {
            session.check_auth_status().await;
            let snapshot = session.snapshot();
            print_json(&json!({
                "isAuthenticated": snapshot.is_authenticated,
                "user": snapshot.user,
            }))
        }
        Command::Refresh => {
            session.check_auth_status().await;
            if !session.is_authenticated() {
                return Err(CliError::NotSignedIn);
            }
            session.refresh_user().await;
            print_json(&json!(session.user()))
        }
        Command::ResetPassword { token, new_password } => {
            warn_if_offline(context.network()?);
            succeed(session.reset_password(&token, &new_password).await, "password reset")
        }
        Command::UpdateUser { data } => {
            let Value::Object(partial) = serde_json::from_str::<Value>(&data)? else {
                return Err(CliError::NotAnObject);
            };
            session.check_auth_status().await;
            update_user(context, partial).await
        }
        Command::Network { watch } => run_network(context.network()?, watch).await,
    }
}

async fn update_user(context: &AppContext, partial: Map<String, Value>) -> Result<(), CliError> {
    let session = context.session()?;
    succeed(session.update_user(partial).await, "user update")?;
    print_json(&json!(session.user()))
}

async fn run_network(network: &NetworkMonitor, watch: bool) -> Result<(), CliError> {
    print_json(&serde_json::to_value(network.get_network_info())?)?;
    if !watch {
        return Ok(());
    }

    let mut changes = network.subscribe();
    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let info = network.get_network_info();
                print_json(&serde_json::to_value(info)?)?;
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

fn warn_if_offline(network: &NetworkMonitor) {
    if !network.is_network_available() {
        warn!("network unavailable; request will likely fail");
    }
}

fn succeed(ok: bool, what: &'static str) -> Result<(), CliError> {
    if ok { Ok(()) } else { Err(CliError::Failed(what)) }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

async fn print_notices(mut notices: mpsc::UnboundedReceiver<Notice>) {
    while let Some(notice) = notices.recv().await {
        println!("[{}] {}: {}", notice.level, notice.title, notice.message);
    }
}
