//! Handlers behind each `bookclub` subcommand.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use bookclub_app::admin::AdminWorkflow;
use bookclub_app::books::{
    Book, BookDraft, BookId, BookService, Catalog, CategoryFilter, HttpBookService, LoadState,
};
use bookclub_app::session::{AdminSession, FileSessionStore};
use bookclub_app::Error;
use bookclub_kernel::Settings;

use crate::{AdminCommand, Command};

const DELETE_PROMPT: &str = "Are you sure you want to delete this book?";

pub async fn run(command: Command, settings: Settings) -> Result<()> {
    let service: Arc<dyn BookService> =
        Arc::new(HttpBookService::from_settings(&settings.service));
    let store = Arc::new(FileSessionStore::from_settings(&settings.session));
    let session = AdminSession::new(service.clone(), store);

    match command {
        Command::Books {
            search,
            category,
            categories,
        } => browse(service.as_ref(), &search, &category, categories).await,
        Command::Login { username, password } => {
            session
                .login(&username, &password)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("Logged in as {username}");
            Ok(())
        }
        Command::Logout => {
            session.logout()?;
            println!("Logged out");
            Ok(())
        }
        Command::Status => {
            let state = if session.is_authenticated() {
                "logged in"
            } else {
                "not logged in"
            };
            println!("{state} ({})", settings.service.base_url);
            Ok(())
        }
        Command::Admin(admin) => {
            let context = session.require_admin().map_err(gate_error)?;
            let workflow = AdminWorkflow::new(service, context);
            run_admin(admin, workflow).await
        }
        Command::ServeStub => bookclub_http::start_server(&settings.stub).await,
    }
}

async fn browse(
    service: &dyn BookService,
    search: &str,
    category: &str,
    categories: bool,
) -> Result<()> {
    let mut catalog = Catalog::new();
    if let LoadState::Failed(message) = catalog.refresh(service, None).await {
        bail!("could not load books: {message}");
    }

    if categories {
        for category in catalog.categories() {
            println!("{category}");
        }
        return Ok(());
    }

    print_books(&catalog.filter(search, &CategoryFilter::from(category)));
    Ok(())
}

async fn run_admin(command: AdminCommand, mut workflow: AdminWorkflow) -> Result<()> {
    match command {
        AdminCommand::List { search } => {
            if let LoadState::Failed(message) = workflow.refresh().await {
                bail!("could not load books: {message}");
            }
            print_books(&workflow.catalog().search(&search));
        }
        AdminCommand::Add {
            title,
            author,
            isbn,
            category,
            status,
        } => {
            let draft = BookDraft::new(title, author, isbn, category).with_status(status);
            let book = workflow.create_book(&draft).await.map_err(admin_error)?;
            println!("Added \"{}\" ({})", book.title, book.id);
        }
        AdminCommand::Edit {
            id,
            title,
            author,
            isbn,
            category,
            status,
        } => {
            let id = BookId::from(id);
            if let LoadState::Failed(message) = workflow.refresh().await {
                bail!("could not load books: {message}");
            }
            let current = workflow
                .catalog()
                .get(&id)
                .ok_or_else(|| anyhow!("Book not found: {id}"))?;

            let mut draft = BookDraft::from(current);
            if let Some(title) = title {
                draft.title = title;
            }
            if let Some(author) = author {
                draft.author = author;
            }
            if let Some(isbn) = isbn {
                draft.isbn = isbn;
            }
            if let Some(category) = category {
                draft.category = category;
            }
            if let Some(status) = status {
                draft.status = status;
            }

            let book = workflow.update_book(&id, &draft).await.map_err(admin_error)?;
            println!("Updated \"{}\" ({})", book.title, book.id);
        }
        AdminCommand::Delete { id, yes } => {
            let confirmed = yes
                || confirm(
                    DELETE_PROMPT,
                    &mut std::io::stdin().lock(),
                    &mut std::io::stdout(),
                )?;
            if !confirmed {
                println!("Cancelled");
                return Ok(());
            }
            let id = BookId::from(id);
            workflow.delete_book(&id).await.map_err(admin_error)?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}

/// Without a stored token the only way forward is the login command; other
/// failures (an unreadable token file) pass through as they are.
fn gate_error(error: Error) -> anyhow::Error {
    if error.is_auth() {
        anyhow!("login required; run `bookclub login` first")
    } else {
        anyhow::Error::new(error)
    }
}

fn admin_error(error: Error) -> anyhow::Error {
    if error.is_auth() {
        anyhow!("{} (run `bookclub login` again)", error.user_message())
    } else {
        anyhow!(error)
    }
}

/// Ask a yes/no question; anything but `y`/`yes` means no.
fn confirm(
    prompt: &str,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> std::io::Result<bool> {
    write!(output, "{prompt} [y/N] ")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_books(books: &[&Book]) {
    if books.is_empty() {
        println!("No books found");
        return;
    }

    for book in books {
        println!("{}", book_line(book));
    }
}

fn book_line(book: &Book) -> String {
    let added = book
        .created_at
        .map(|at| format!("  added {}", at.date()))
        .unwrap_or_default();
    let borrowable = if book.is_borrowable() {
        "  borrowable"
    } else {
        ""
    };
    format!(
        "{}  {} by {}  [{}]  isbn {}  {}{}{}",
        book.id, book.title, book.author, book.category, book.isbn, book.status, borrowable, added
    )
}
