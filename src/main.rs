use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use feedwire::api::{Gateway, HttpGateway};
use feedwire::app::{App, AppEvent};
use feedwire::config::Config;
use feedwire::preferences::PreferenceManager;
use feedwire::storage::{Database, DatabaseError};
use feedwire::ui;
use feedwire::util::validate_server_url;

/// Get the config directory path (~/.config/feedwire/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("feedwire"))
}

#[derive(Parser, Debug)]
#[command(
    name = "feedwire",
    about = "Keyboard-driven terminal client for a self-hosted feed server"
)]
struct Args {
    /// Server base URL (overrides server_url from the config file)
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Config file path (default: ~/.config/feedwire/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Basic-auth user (password from FEEDWIRE_PASSWORD or the config file)
    #[arg(long)]
    username: Option<String>,

    /// Upload an OPML subscription file to the server and exit
    #[arg(long, value_name = "FILE")]
    import_opml: Option<PathBuf>,

    /// End the server session and exit
    #[arg(long)]
    logout: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    // The terminal belongs to the UI, so logs go to a file.
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(config_dir.join("feedwire.log"))
        .context("Failed to open log file")?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    // User-only access: the directory holds credentials and the preference store
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(&config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(server) = args.server {
        config.server_url = server;
    }
    if let Some(username) = args.username {
        config.username = Some(username);
    }

    let server_url = validate_server_url(&config.server_url)
        .with_context(|| format!("Invalid server URL '{}'", config.server_url))?;
    let gateway = HttpGateway::new(
        server_url.as_str(),
        config.username.clone(),
        config.resolved_password(),
    )
    .context("Failed to create HTTP client")?;
    let gateway: Arc<dyn Gateway> = Arc::new(gateway);

    if let Some(path) = &args.import_opml {
        return import_opml(gateway.as_ref(), path).await;
    }

    if args.logout {
        gateway.logout().await.context("Failed to log out")?;
        println!("Logged out of {}", server_url);
        return Ok(());
    }

    let db_path = config_dir.join("prefs.db");
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let prefs = match Database::open(db_path_str).await {
        Ok(db) => PreferenceManager::load(&config, db)
            .await
            .context("Failed to read preferences")?,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of feedwire appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            // The reader still works; view choices just won't outlive this run.
            tracing::warn!(error = %e, "Preference store unavailable, using config defaults");
            eprintln!("Warning: {}. Preferences will not be saved.", e);
            PreferenceManager::from_config(&config)
        }
    };

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);
    let mut app = App::new(gateway, prefs, &config, event_tx);

    for warning in app.keybindings.apply_overrides(&config.keybindings) {
        tracing::warn!(warning = %warning, "Ignoring keybinding override");
        eprintln!("Warning: {}", warning);
    }

    ui::run(&mut app, event_rx).await?;

    println!("Goodbye!");
    Ok(())
}

/// Upload a subscription file, then report what the server now holds.
async fn import_opml(gateway: &dyn Gateway, path: &std::path::Path) -> Result<()> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve import file: {}", path.display()))?;
    let metadata = std::fs::metadata(&canonical)?;
    if !metadata.is_file() {
        anyhow::bail!("Import path must be a regular file");
    }

    gateway
        .upload_opml(&canonical)
        .await
        .with_context(|| format!("Failed to upload {}", canonical.display()))?;

    let (folders, feeds) = futures::try_join!(gateway.list_folders(), gateway.list_feeds())
        .context("Upload succeeded but the subscription list could not be read")?;
    println!(
        "Imported {}: server now has {} feeds in {} folders",
        canonical.display(),
        feeds.len(),
        folders.len()
    );
    Ok(())
}
