//! lockbox: device-bound secret vault CLI
//!
//! Commands:
//!   encrypt [TEXT]          - seal TEXT (prompted without echo if omitted), print base64
//!   decrypt <BASE64>        - open a sealed blob and print the plaintext
//!   hash <TEXT>             - SHA-256 identifier of TEXT (not for passwords)
//!   reset-key --yes         - destroy the device key and generate a new one
//!   status                  - show backend and key state
//!   item exists|delete NAME - check for or remove a keychain item
//!   config show             - display the active configuration

use anyhow::{Context, Result};
use base64::Engine;
use clap::{Parser, Subcommand};
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lockbox_core::config::{self, BackendKind, KeychainConfig, LockboxConfig, LogFormat};
use lockbox_core::ENCRYPTION_KEY_NAME;
use lockbox_crypto::{hash, KeyStatus, Vault};
use lockbox_keychain::{KeyringStore, MemoryStore, SecretStore};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "lockbox",
    version,
    about = "Device-bound secret vault",
    long_about = "lockbox: seal and open sensitive values with a key that never leaves this device's keychain"
)]
struct Cli {
    /// Path to config.toml (default: $XDG_CONFIG_HOME/lockbox/config.toml)
    #[arg(long, short = 'c', env = "LOCKBOX_CONFIG")]
    config: Option<PathBuf>,

    /// Log level override (RUST_LOG still wins)
    #[arg(long, env = "LOCKBOX_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seal a value with the device key and print it as base64
    Encrypt {
        /// Plaintext to seal; prompted for (without echo) when omitted
        text: Option<String>,
    },

    /// Open a base64 sealed blob and print the plaintext
    Decrypt {
        /// Output of `lockbox encrypt`
        blob: String,
    },

    /// Print the SHA-256 identifier of a value
    ///
    /// Deterministic and unsalted: suitable for deduplication keys,
    /// never for passwords.
    Hash { text: String },

    /// Destroy the device key and generate a new one
    ///
    /// Every blob sealed under the old key becomes permanently unreadable.
    #[command(name = "reset-key")]
    ResetKey {
        /// Confirm the destructive reset
        #[arg(long)]
        yes: bool,
    },

    /// Show backend and key state
    Status,

    /// Keychain item management
    Item {
        #[command(subcommand)]
        action: ItemAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ItemAction {
    /// Exit 0 if the item exists, 1 otherwise
    Exists { name: String },
    /// Remove an item (no-op if absent)
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let config = load_config(&config_path)?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log.level);
    init_logging(level, config.log.format);

    let store = open_store(&config.keychain);
    let vault = Vault::new(Arc::clone(&store));

    match cli.command {
        Commands::Encrypt { text } => cmd_encrypt(&vault, text),
        Commands::Decrypt { blob } => cmd_decrypt(&vault, &blob),
        Commands::Hash { text } => {
            println!("{}", hash(text.as_bytes()));
            Ok(())
        }
        Commands::ResetKey { yes } => cmd_reset_key(&vault, yes),
        Commands::Status => cmd_status(&vault, &config.keychain),
        Commands::Item { action } => cmd_item(&*store, action),
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &config_path),
    }
}

// ── Config + logging ──────────────────────────────────────────────────────────

fn load_config(path: &Path) -> Result<LockboxConfig> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config: {}", path.display()))
    } else {
        Ok(LockboxConfig::default())
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout is reserved for command output
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn open_store(config: &KeychainConfig) -> Arc<dyn SecretStore> {
    match config.backend {
        BackendKind::Keyring => {
            let store = KeyringStore::new(config.service.clone());
            if !store.is_available() {
                tracing::warn!(service = %config.service, "platform keychain unavailable");
            }
            Arc::new(store)
        }
        BackendKind::Memory => {
            tracing::warn!("memory backend: the key and all items are discarded on exit");
            Arc::new(MemoryStore::new())
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_encrypt(vault: &Vault, text: Option<String>) -> Result<()> {
    let plaintext = match text {
        Some(t) => SecretString::from(t),
        None => SecretString::from(
            rpassword::prompt_password("plaintext: ").context("reading plaintext")?,
        ),
    };

    let blob = vault
        .encrypt_string(plaintext.expose_secret())
        .context("encrypting")?;
    println!("{}", base64::engine::general_purpose::STANDARD.encode(blob));
    Ok(())
}

fn cmd_decrypt(vault: &Vault, blob_b64: &str) -> Result<()> {
    let blob = base64::engine::general_purpose::STANDARD
        .decode(blob_b64.trim())
        .context("sealed blob is not valid base64")?;

    let plaintext = vault.decrypt_string(&blob).context("decrypting")?;
    println!("{}", plaintext.as_str());
    Ok(())
}

fn cmd_reset_key(vault: &Vault, confirmed: bool) -> Result<()> {
    if !confirmed {
        anyhow::bail!(
            "reset-key destroys the device key; every value sealed with it becomes unreadable.\n\
             Re-run with --yes to proceed."
        );
    }
    vault.reset_key().context("resetting encryption key")?;
    println!("encryption key reset");
    Ok(())
}

fn cmd_status(vault: &Vault, config: &KeychainConfig) -> Result<()> {
    let backend = match config.backend {
        BackendKind::Keyring => "keyring",
        BackendKind::Memory => "memory",
    };
    let key_state = match vault.status() {
        KeyStatus::Uninitialized => "not loaded",
        KeyStatus::Ready => "loaded",
    };
    let stored = vault.key_manager().store().exists(ENCRYPTION_KEY_NAME);
    let policy = vault.key_manager().store().policy();

    println!("backend:        {backend}");
    println!("service:        {}", config.service);
    println!("stored key:     {}", if stored { "present" } else { "absent" });
    println!("key in memory:  {key_state}");
    println!("accessibility:  {:?}", policy.accessibility);
    println!("synchronizable: {}", policy.synchronizable);
    Ok(())
}

fn cmd_item(store: &dyn SecretStore, action: ItemAction) -> Result<()> {
    match action {
        ItemAction::Exists { name } => {
            let found = store.exists(&name);
            println!("{}", if found { "present" } else { "absent" });
            if !found {
                std::process::exit(1);
            }
            Ok(())
        }
        ItemAction::Delete { name } => {
            if name == ENCRYPTION_KEY_NAME {
                anyhow::bail!("'{ENCRYPTION_KEY_NAME}' is managed by the vault; use `lockbox reset-key`");
            }
            store
                .delete(&name)
                .with_context(|| format!("deleting item '{name}'"))?;
            println!("deleted {name}");
            Ok(())
        }
    }
}

fn cmd_config_show(config: &LockboxConfig, path: &Path) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("serializing config")?;
    println!("# {}", path.display());
    print!("{rendered}");
    Ok(())
}
