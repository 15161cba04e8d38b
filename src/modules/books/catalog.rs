//! In-memory mirror of the book collection and the filters applied to it.

use super::models::{Book, BookId};
use super::BookService;
use crate::modules::session::SessionToken;

/// Category selector value meaning "no category restriction".
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => wanted == category,
        }
    }
}

impl From<&str> for CategoryFilter {
    fn from(value: &str) -> Self {
        if value == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(value.to_string())
        }
    }
}

/// Books whose title or author contains `term` (ignoring case) and whose
/// category passes `category`, in their original order.
pub fn filter_books<'a>(books: &'a [Book], term: &str, category: &CategoryFilter) -> Vec<&'a Book> {
    let needle = term.to_lowercase();
    books
        .iter()
        .filter(|book| category.matches(&book.category))
        .filter(|book| {
            book.title.to_lowercase().contains(&needle)
                || book.author.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Admin search: title or author ignoring case, or the ISBN as typed.
pub fn search_books<'a>(books: &'a [Book], term: &str) -> Vec<&'a Book> {
    let needle = term.to_lowercase();
    books
        .iter()
        .filter(|book| {
            book.title.to_lowercase().contains(&needle)
                || book.author.to_lowercase().contains(&needle)
                || book.isbn.contains(term)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Loading,
    Ready,
    Failed(String),
}

/// Client-side copy of the service's book list.
///
/// Always replaced wholesale; a failed refresh keeps the previous list.
#[derive(Debug, Default)]
pub struct Catalog {
    books: Vec<Book>,
    state: LoadState,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn get(&self, id: &BookId) -> Option<&Book> {
        self.books.iter().find(|book| &book.id == id)
    }

    /// Refetch the full list. Failures are logged and recorded in
    /// [`LoadState::Failed`]; the cached books are left untouched.
    pub async fn refresh(
        &mut self,
        service: &dyn BookService,
        token: Option<&SessionToken>,
    ) -> &LoadState {
        match service.list_books(token).await {
            Ok(books) => {
                tracing::debug!(count = books.len(), "catalog refreshed");
                self.books = books;
                self.state = LoadState::Ready;
            }
            Err(e) => {
                tracing::error!(error = %e, "error fetching books");
                self.state = LoadState::Failed(e.user_message());
            }
        }
        &self.state
    }

    pub fn filter(&self, term: &str, category: &CategoryFilter) -> Vec<&Book> {
        filter_books(&self.books, term, category)
    }

    pub fn search(&self, term: &str) -> Vec<&Book> {
        search_books(&self.books, term)
    }

    /// Distinct categories in first-seen order, for the category selector.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for book in &self.books {
            let category = book.category.as_str();
            if !category.is_empty() && !seen.contains(&category) {
                seen.push(category);
            }
        }
        seen
    }
}
