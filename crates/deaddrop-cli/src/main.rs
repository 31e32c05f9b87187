//! deaddrop — leave an encrypted message only the right passphrase opens.
//!
//! Host binary: wires the SQLite mailbox to the message and user services
//! and exposes them as subcommands. The passphrase is read interactively,
//! never echoed, never logged, never stored.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dd_proto::message::Message;
use dd_service::{MessageService, UserService};
use dd_store::Store;

#[derive(Parser)]
#[command(name = "deaddrop")]
#[command(about = "One-shot encrypted message drop", long_about = None)]
struct Cli {
    /// Database path (defaults to the platform data directory).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the demo user directory
    Seed,

    /// Register a new user
    Register {
        /// @-prefixed username
        username: String,
    },

    /// List the users you can write to
    Users {
        /// Acting user
        #[arg(long = "as")]
        as_user: String,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Seal and store a message (prompts for the shared passphrase)
    Send {
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        /// Message body; read from stdin when omitted
        #[arg(long)]
        body: Option<String>,
    },

    /// List unread messages, grouped by sender
    Inbox {
        /// Acting user
        #[arg(long = "as")]
        as_user: String,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Reveal a message once (prompts for the shared passphrase)
    Read {
        /// Message id, as shown by `inbox`
        id: String,

        /// Acting user
        #[arg(long = "as")]
        as_user: String,
    },
}

const DEMO_USERS: &[&str] = &["@lucas", "@igor", "@pedro", "@daniel", "@jeh"];

fn default_db_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("app", "Deaddrop", "deaddrop")
        .ok_or_else(|| anyhow!("could not resolve a data directory"))?;
    let dir = dirs.data_dir();
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(dir.join("deaddrop.db"))
}

fn read_body_from_stdin() -> Result<String> {
    let mut body = String::new();
    std::io::stdin()
        .read_to_string(&mut body)
        .context("reading message body from stdin")?;
    Ok(body.trim_end_matches('\n').to_string())
}

fn print_messages(sender: &str, messages: &[Message]) {
    println!("from {sender}:");
    for message in messages {
        println!(
            "  {}  {}",
            message.id,
            message.sent_at.format("%Y-%m-%d %H:%M UTC")
        );
    }
}

async fn require_user(users: &UserService<Store>, username: &str) -> Result<()> {
    if !users.authenticate(username).await? {
        bail!("unknown user {username} (usernames are @-prefixed; see `deaddrop seed`)");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let db_path = match cli.db {
        Some(path) => path,
        None => default_db_path()?,
    };
    let store = Store::open(&db_path)
        .await
        .with_context(|| format!("opening mailbox at {}", db_path.display()))?;
    tracing::debug!(target: "deaddrop", event = "mailbox_opened", db = %db_path.display());

    let messages = MessageService::new(store.clone());
    let users = UserService::new(store);

    match cli.command {
        Commands::Seed => {
            for username in DEMO_USERS {
                if users.register(username).await? {
                    println!("created {username}");
                } else {
                    println!("{username} already exists");
                }
            }
        }

        Commands::Register { username } => {
            if users.register(&username).await? {
                println!("created {username}");
            } else {
                bail!("{username} already exists");
            }
        }

        Commands::Users { as_user, json } => {
            require_user(&users, &as_user).await?;
            let available = users.available_users(&as_user).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&available)?);
            } else {
                for user in available {
                    println!(
                        "{}\t(since {})",
                        user.username,
                        user.created_at.format("%Y-%m-%d")
                    );
                }
            }
        }

        Commands::Send { from, to, body } => {
            require_user(&users, &from).await?;
            let body = match body {
                Some(body) => body,
                None => read_body_from_stdin()?,
            };
            let passphrase = rpassword::prompt_password("Shared passphrase: ")?;
            let id = messages.send(&from, &to, &body, &passphrase).await?;
            println!("sent {id}");
        }

        Commands::Inbox { as_user, json } => {
            require_user(&users, &as_user).await?;
            let unread = messages.unread_count(&as_user).await?;
            let grouped = messages.inbox_grouped(&as_user).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&grouped)?);
            } else {
                println!("{unread} unread message(s)");
                for (sender, batch) in &grouped {
                    print_messages(sender, batch);
                }
            }
        }

        Commands::Read { id, as_user } => {
            require_user(&users, &as_user).await?;
            let passphrase = rpassword::prompt_password("Shared passphrase: ")?;
            let plaintext = messages.read(&id, &passphrase, &as_user).await?;
            println!("{plaintext}");
        }
    }

    Ok(())
}
