pub mod catalog;
pub mod models;
pub mod remote;

use async_trait::async_trait;

use crate::error::Result;
use crate::modules::session::{Credentials, SessionToken};

pub use catalog::{filter_books, search_books, Catalog, CategoryFilter, LoadState, ALL_CATEGORIES};
pub use models::{Book, BookDraft, BookId, BookStatus};
pub use remote::HttpBookService;

/// Operations offered by the remote book service.
///
/// Listing works with or without a token; every mutation needs one.
#[async_trait]
pub trait BookService: Send + Sync {
    /// Exchange credentials for a bearer token.
    async fn login(&self, credentials: &Credentials) -> Result<SessionToken>;

    /// Fetch the whole collection in server order.
    async fn list_books(&self, token: Option<&SessionToken>) -> Result<Vec<Book>>;

    async fn create_book(&self, token: &SessionToken, draft: &BookDraft) -> Result<Book>;

    async fn update_book(&self, token: &SessionToken, id: &BookId, draft: &BookDraft)
        -> Result<Book>;

    /// Irreversible; the service keeps no undo.
    async fn delete_book(&self, token: &SessionToken, id: &BookId) -> Result<()>;
}
