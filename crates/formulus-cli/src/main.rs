use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use formulus_auth::models::parse_expiry;
use formulus_auth::paths::{data_dir, SESSION_FILE};
use formulus_auth::{
    ApiConfig, FileStore, HttpAuthApi, KeyValueStore, KeyringStore, SessionManager,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

type Manager = SessionManager<HttpAuthApi, Box<dyn KeyValueStore>>;

#[derive(Parser, Debug)]
#[command(name = "formulus-cli")]
#[command(author, version, about = "Formulus session control for the Synkronus API", long_about = None)]
struct Cli {
    /// Synkronus API base URL
    #[arg(long, env = "SYNKRONUS_API_URL", default_value = "http://localhost:8080/api")]
    api_url: String,

    /// Where the session record is kept
    #[arg(long, value_enum, default_value_t = StoreKind::File)]
    store: StoreKind,

    /// Directory holding session.json (file store only)
    #[arg(long, env = "FORMULUS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// HTTP request timeout
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    File,
    Keyring,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and store the session
    Login {
        #[arg(long)]
        username: String,
        /// Prompted for when omitted
        #[arg(long, env = "FORMULUS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Show the stored identity (display only; not verified)
    Whoami,

    /// Print the stored bearer token
    Token,

    /// Exchange the refresh token for a new token
    Refresh,

    /// Remove the stored session
    Logout,

    /// Summarise the stored session
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let manager = build_manager(&cli)?;
    match cli.command {
        Commands::Login { username, password } => {
            let password = match password {
                Some(p) => Zeroizing::new(p),
                None => prompt_password()?,
            };
            let user = manager.login(&username, &password).await?;
            println!("Logged in as {} ({})", user.username, user.role);
        }
        Commands::Whoami => match manager.get_user_info().await {
            Some(user) => println!("{}", serde_json::to_string(&user)?),
            None => println!("not logged in"),
        },
        Commands::Token => {
            let token = manager
                .get_api_auth_token()
                .await
                .ok_or_else(|| anyhow!("no token stored; run login first"))?;
            println!("{token}");
        }
        Commands::Refresh => {
            manager.refresh_token().await?;
            println!("Token refreshed");
        }
        Commands::Logout => {
            manager.logout().await;
            println!("Logged out");
        }
        Commands::Status => print_status(&manager).await,
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn build_manager(cli: &Cli) -> Result<Manager> {
    let mut config = ApiConfig::new(&cli.api_url);
    config.timeout = Duration::from_secs(cli.timeout_secs);
    let api = HttpAuthApi::new(&config)?;
    let store: Box<dyn KeyValueStore> = match cli.store {
        StoreKind::File => {
            let dir = match &cli.data_dir {
                Some(dir) => dir.clone(),
                None => data_dir().ok_or_else(|| anyhow!("cannot determine data directory"))?,
            };
            Box::new(FileStore::open(dir.join(SESSION_FILE))?)
        }
        StoreKind::Keyring => Box::new(KeyringStore::default()),
    };
    Ok(SessionManager::new(api, store))
}

fn prompt_password() -> Result<Zeroizing<String>> {
    let pw = rpassword::prompt_password("Password: ")?;
    Ok(Zeroizing::new(pw))
}

async fn print_status(manager: &Manager) {
    let Some(user) = manager.get_user_info().await else {
        println!("not logged in");
        return;
    };
    println!("user:    {}", user.username);
    println!("role:    {}", user.role);
    match manager.get_token_expires_at().await {
        Some(raw) => match parse_expiry(&raw) {
            Some(at) if at <= Utc::now() => println!("expires: {} (expired)", at.to_rfc3339()),
            Some(at) => println!("expires: {}", at.to_rfc3339()),
            None => println!("expires: {raw}"),
        },
        None => println!("expires: unknown"),
    }
}
