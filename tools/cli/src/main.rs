//! Hideaway CLI - Command line interface for the encrypted file vault.
//!
//! Files added to the vault are encrypted under a key derived from the
//! master password and indexed in an encrypted manifest.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use zeroize::Zeroizing;

use hideaway_common::{Error, SensitiveBytes};
use hideaway_storage::LocalFs;
use hideaway_vault::{AddFileRequest, FileVaultService, VaultLayout, VaultManager, VaultSession};

/// Word the user must type before a reset goes ahead.
const RESET_CONFIRMATION: &str = "confirm";

#[derive(Parser)]
#[command(name = "hideaway")]
#[command(about = "Hideaway - Encrypted file vault")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Vault directory (default: <config dir>/.hideaway).
    #[arg(long, global = true)]
    vault_dir: Option<PathBuf>,

    /// Directory for restored files whose original directory is gone.
    #[arg(long, global = true)]
    fallback_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new vault with a master password.
    Init,

    /// Encrypt a file into the vault.
    Add {
        /// File to add.
        file: PathBuf,

        /// Display name (default: the file's own name).
        #[arg(short, long)]
        name: Option<String>,

        /// Delete the original after it has been stored.
        #[arg(short, long)]
        delete: bool,
    },

    /// List stored files.
    List,

    /// Show vault statistics.
    Stats,

    /// Restore a file from the vault.
    Get {
        /// Record ID.
        id: String,
    },

    /// Remove a file from the vault.
    Remove {
        /// Record ID.
        id: String,
    },

    /// Delete the vault and everything stored in it.
    Reset {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let manager = build_manager(cli.vault_dir, cli.fallback_dir)?;

    match cli.command {
        Commands::Init => cmd_init(&manager),
        Commands::Add { file, name, delete } => cmd_add(&manager, &file, name, delete),
        Commands::List => cmd_list(&manager),
        Commands::Stats => cmd_stats(&manager),
        Commands::Get { id } => cmd_get(&manager, &id),
        Commands::Remove { id } => cmd_remove(&manager, &id),
        Commands::Reset { yes } => cmd_reset(&manager, yes),
    }
}

/// Resolve the layout, applying any directory overrides.
fn build_manager(vault_dir: Option<PathBuf>, fallback_dir: Option<PathBuf>) -> Result<VaultManager> {
    let layout = match (vault_dir, fallback_dir) {
        (Some(root), Some(fallback)) => VaultLayout::at(root, fallback),
        (root, fallback) => {
            let default = VaultLayout::resolve().context("Failed to locate vault directory")?;
            VaultLayout::at(
                root.unwrap_or_else(|| default.root().to_path_buf()),
                fallback.unwrap_or_else(|| default.fallback_dir().to_path_buf()),
            )
        }
    };

    Ok(VaultManager::new(Arc::new(LocalFs::new()), layout))
}

/// Prompt for password securely.
fn prompt_password(prompt: &str) -> Result<SensitiveBytes> {
    let password =
        Zeroizing::new(rpassword::prompt_password(prompt).context("Failed to read password")?);
    Ok(SensitiveBytes::from(password.as_bytes()))
}

/// Prompt for the password and open a session.
fn open_session(manager: &VaultManager) -> Result<VaultSession> {
    let password = prompt_password("Enter password: ")?;
    manager.open(password).map_err(|e| match e {
        Error::NotInitialized => {
            anyhow::anyhow!("No vault found. Run `hideaway init` first")
        }
        Error::InvalidPassword => anyhow::anyhow!("Wrong password"),
        other => anyhow::Error::new(other).context("Failed to open vault"),
    })
}

/// Wrap a vault error, naming both causes of an authentication failure.
fn describe(e: Error, action: &str) -> anyhow::Error {
    if e.is_auth_failure() {
        anyhow::anyhow!("{}: wrong password or corrupted vault data", action)
    } else {
        anyhow::Error::new(e).context(action.to_string())
    }
}

/// Create a new vault.
fn cmd_init(manager: &VaultManager) -> Result<()> {
    if manager.is_initialized()? {
        anyhow::bail!(
            "Vault already initialized at {}",
            manager.layout().root().display()
        );
    }

    info!("Creating new vault");

    let password = prompt_password("Enter password: ")?;
    let confirm = prompt_password("Confirm password: ")?;

    if password.as_bytes() != confirm.as_bytes() {
        anyhow::bail!("Passwords do not match");
    }

    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    manager
        .initialize(&password)
        .context("Failed to create vault")?;

    println!("Vault created successfully!");
    println!("  Location: {}", manager.layout().root().display());

    Ok(())
}

/// Add a file to the vault.
fn cmd_add(manager: &VaultManager, file: &Path, name: Option<String>, delete: bool) -> Result<()> {
    let session = open_session(manager)?;
    let service = FileVaultService::new(&session)?;

    let mut request = AddFileRequest::new(file).delete_original(delete);
    if let Some(name) = name {
        request = request.with_name(name);
    }

    let record = match service.add_file(&request) {
        Ok(record) => record,
        Err(Error::OriginalNotDeleted { id, reason }) => {
            warn!("Original could not be deleted: {}", reason);
            println!("Added: {}", file.display());
            println!("  ID: {}", id);
            println!("  Original kept: {}", file.display());
            return Ok(());
        }
        Err(e) => return Err(describe(e, "Failed to add file")),
    };

    println!("Added: {}", record.original_name);
    println!("  ID: {}", record.id);
    println!("  Size: {} bytes", record.size);
    if delete {
        println!("  Original deleted: {}", file.display());
    }

    Ok(())
}

/// List stored files.
fn cmd_list(manager: &VaultManager) -> Result<()> {
    let session = open_session(manager)?;
    let service = FileVaultService::new(&session)?;

    let files = service
        .list_files()
        .map_err(|e| describe(e, "Failed to read manifest"))?;

    if files.is_empty() {
        println!("(vault is empty)");
        return Ok(());
    }

    println!(
        "{:<36}  {:<16}  {:>10}  {:<24}  NAME",
        "ID", "ADDED", "SIZE", "TYPE"
    );
    for file in files {
        println!(
            "{:<36}  {:<16}  {:>10}  {:<24}  {}",
            file.id,
            file.date_added.format("%Y-%m-%d %H:%M"),
            file.size,
            file.mime_type,
            file.original_name
        );
    }

    Ok(())
}

/// Show vault statistics.
fn cmd_stats(manager: &VaultManager) -> Result<()> {
    let session = open_session(manager)?;
    let service = FileVaultService::new(&session)?;

    let stats = service
        .stats()
        .map_err(|e| describe(e, "Failed to read manifest"))?;

    println!("Vault Statistics:");
    println!("  Location: {}", manager.layout().root().display());
    println!("  Files: {}", stats.file_count);
    println!("  Total size: {} bytes", stats.total_size);
    if !stats.by_mime.is_empty() {
        println!("  By type:");
        for (mime, count) in &stats.by_mime {
            println!("    {}: {}", mime, count);
        }
    }

    Ok(())
}

/// Restore a file from the vault.
fn cmd_get(manager: &VaultManager, id: &str) -> Result<()> {
    let session = open_session(manager)?;
    let service = FileVaultService::new(&session)?;

    let destination = service
        .retrieve_file(id)
        .map_err(|e| describe(e, "Failed to retrieve file"))?;

    println!("Restored to: {}", destination.display());

    Ok(())
}

/// Remove a file from the vault.
fn cmd_remove(manager: &VaultManager, id: &str) -> Result<()> {
    let session = open_session(manager)?;
    let service = FileVaultService::new(&session)?;

    let record = service
        .remove_file(id)
        .map_err(|e| describe(e, "Failed to remove file"))?;

    println!("Removed: {} ({})", record.original_name, record.id);

    Ok(())
}

/// Delete the vault.
fn cmd_reset(manager: &VaultManager, yes: bool) -> Result<()> {
    if !yes {
        print!(
            "This permanently deletes every file in {}. Type '{}' to continue: ",
            manager.layout().root().display(),
            RESET_CONFIRMATION
        );
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .context("Failed to read confirmation")?;

        if answer.trim() != RESET_CONFIRMATION {
            println!("Reset cancelled.");
            return Ok(());
        }
    }

    info!("Resetting vault");
    manager.reset().context("Failed to reset vault")?;

    println!("Vault reset.");

    Ok(())
}
