mod commands;

use anyhow::Context;
use bookclub_app::books::{BookStatus, ALL_CATEGORIES};
use clap::{Parser, Subcommand};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "bookclub")]
#[command(author, version, about = "Startise Bookclub catalog client", long_about = None)]
pub struct Cli {
    /// Book service base URL (overrides `service.base_url`)
    #[arg(long, env = "BOOKCLUB_BASE_URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Browse the public catalog
    Books {
        /// Match against title or author, ignoring case
        #[arg(short, long, default_value = "")]
        search: String,
        /// Exact category, or "all"
        #[arg(short, long, default_value = ALL_CATEGORIES)]
        category: String,
        /// List the categories present instead of books
        #[arg(long)]
        categories: bool,
    },

    /// Log in as admin and store the session token
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "BOOKCLUB_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session token
    Logout,

    /// Show whether an admin session is stored
    Status,

    /// Manage books (requires login)
    #[command(subcommand)]
    Admin(AdminCommand),

    /// Run the in-memory stub book service
    ServeStub,
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// List books, searching title, author or ISBN
    List {
        #[arg(short, long, default_value = "")]
        search: String,
    },

    /// Add a new book
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        isbn: String,
        #[arg(long)]
        category: String,
        #[arg(long, default_value = "available")]
        status: BookStatus,
    },

    /// Edit a book; omitted fields keep their current value
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        isbn: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        status: Option<BookStatus>,
    },

    /// Delete a book permanently
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = bookclub_kernel::Settings::load()
        .with_context(|| "failed to load bookclub settings")?;
    if let Some(base_url) = cli.base_url {
        settings.service.base_url = base_url;
    }

    bookclub_telemetry::init(&settings.telemetry)?;

    tracing::debug!(
        env = ?settings.environment,
        service = %settings.service.base_url,
        "bookclub starting"
    );

    commands::run(cli.command, settings).await
}
