//! Admin CRUD workflow.
//!
//! Every successful mutation is followed by a full catalog refetch instead
//! of patching the local list, so what the admin sees is always the
//! service's own view, including changes made by other admins. The price is
//! one extra round trip per action.

use std::sync::Arc;

use crate::error::Result;
use crate::modules::books::{Book, BookDraft, BookId, BookService, Catalog, LoadState};
use crate::modules::session::SessionContext;

pub struct AdminWorkflow {
    service: Arc<dyn BookService>,
    session: SessionContext,
    catalog: Catalog,
}

impl AdminWorkflow {
    pub fn new(service: Arc<dyn BookService>, session: SessionContext) -> Self {
        Self {
            service,
            session,
            catalog: Catalog::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Fetch the full collection with the admin token attached.
    pub async fn list_books(&self) -> Result<Vec<Book>> {
        self.service.list_books(Some(self.session.token())).await
    }

    /// Reload the catalog; failures keep the last-known list.
    pub async fn refresh(&mut self) -> &LoadState {
        self.catalog
            .refresh(self.service.as_ref(), Some(self.session.token()))
            .await
    }

    pub async fn create_book(&mut self, draft: &BookDraft) -> Result<Book> {
        draft.validate()?;

        let book = self
            .service
            .create_book(self.session.token(), draft)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "error saving book"))?;

        tracing::info!(id = %book.id, title = %book.title, "book created");
        self.refresh().await;
        Ok(book)
    }

    pub async fn update_book(&mut self, id: &BookId, draft: &BookDraft) -> Result<Book> {
        draft.validate()?;

        let book = self
            .service
            .update_book(self.session.token(), id, draft)
            .await
            .inspect_err(|e| tracing::error!(error = %e, %id, "error saving book"))?;

        tracing::info!(%id, title = %book.title, "book updated");
        self.refresh().await;
        Ok(book)
    }

    /// Permanently remove a book. Callers must have confirmed with the user
    /// first; nothing on the service side can undo this.
    pub async fn delete_book(&mut self, id: &BookId) -> Result<()> {
        self.service
            .delete_book(self.session.token(), id)
            .await
            .inspect_err(|e| tracing::error!(error = %e, %id, "error deleting book"))?;

        tracing::info!(%id, "book deleted");
        self.refresh().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::modules::books::BookStatus;
    use crate::modules::session::{Credentials, SessionToken};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory stand-in for the book service that counts list calls.
    #[derive(Default)]
    struct Shelf {
        books: Mutex<Vec<Book>>,
        next_id: AtomicUsize,
        lists: AtomicUsize,
        reject_saves: bool,
    }

    impl Shelf {
        fn check(token: &SessionToken) -> Result<()> {
            if token.as_str() == "valid" {
                Ok(())
            } else {
                Err(Error::auth("Token is not valid"))
            }
        }
    }

    #[async_trait]
    impl BookService for Shelf {
        async fn login(&self, _credentials: &Credentials) -> Result<SessionToken> {
            Ok(SessionToken::new("valid"))
        }

        async fn list_books(&self, _token: Option<&SessionToken>) -> Result<Vec<Book>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            Ok(self.books.lock().unwrap().clone())
        }

        async fn create_book(&self, token: &SessionToken, draft: &BookDraft) -> Result<Book> {
            Self::check(token)?;
            if self.reject_saves {
                return Err(Error::save("ISBN already exists"));
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let book = Book {
                id: BookId::new(id.to_string()),
                title: draft.title.clone(),
                author: draft.author.clone(),
                isbn: draft.isbn.clone(),
                category: draft.category.clone(),
                status: draft.status,
                created_at: None,
            };
            self.books.lock().unwrap().push(book.clone());
            Ok(book)
        }

        async fn update_book(
            &self,
            token: &SessionToken,
            id: &BookId,
            draft: &BookDraft,
        ) -> Result<Book> {
            Self::check(token)?;
            let mut books = self.books.lock().unwrap();
            let book = books
                .iter_mut()
                .find(|b| &b.id == id)
                .ok_or_else(|| Error::save("Book not found"))?;
            book.title = draft.title.clone();
            book.author = draft.author.clone();
            book.isbn = draft.isbn.clone();
            book.category = draft.category.clone();
            book.status = draft.status;
            Ok(book.clone())
        }

        async fn delete_book(&self, token: &SessionToken, id: &BookId) -> Result<()> {
            Self::check(token)?;
            let mut books = self.books.lock().unwrap();
            let before = books.len();
            books.retain(|b| &b.id != id);
            if books.len() == before {
                return Err(Error::delete("Book not found"));
            }
            Ok(())
        }
    }

    fn workflow(shelf: Arc<Shelf>, token: &str) -> AdminWorkflow {
        AdminWorkflow::new(shelf, SessionContext::new(SessionToken::new(token)))
    }

    fn dune() -> BookDraft {
        BookDraft::new("Dune", "Herbert", "123", "Science")
    }

    #[tokio::test]
    async fn create_refreshes_catalog_once() {
        let shelf = Arc::new(Shelf::default());
        let mut admin = workflow(shelf.clone(), "valid");

        let created = admin.create_book(&dune()).await.unwrap();
        assert_eq!(created.status, BookStatus::Available);
        assert_eq!(shelf.lists.load(Ordering::SeqCst), 1);

        let titles: Vec<_> = admin.catalog().books().iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["Dune"]);
        assert_eq!(admin.catalog().state(), &LoadState::Ready);
    }

    #[tokio::test]
    async fn update_and_delete_are_reflected_after_refresh() {
        let shelf = Arc::new(Shelf::default());
        let mut admin = workflow(shelf.clone(), "valid");

        let created = admin.create_book(&dune()).await.unwrap();
        admin
            .update_book(&created.id, &dune().with_status(BookStatus::Borrowed))
            .await
            .unwrap();
        let listed = admin.catalog().get(&created.id).unwrap();
        assert_eq!(listed.status, BookStatus::Borrowed);
        assert_eq!(admin.catalog().books().len(), 1);

        admin.delete_book(&created.id).await.unwrap();
        assert!(admin.catalog().get(&created.id).is_none());
        assert!(admin.list_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_service() {
        let shelf = Arc::new(Shelf::default());
        let mut admin = workflow(shelf.clone(), "valid");

        let err = admin
            .create_book(&BookDraft::new("", "Herbert", "123", "Science"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "title is required");
        assert!(shelf.books.lock().unwrap().is_empty());
        assert_eq!(shelf.lists.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejected_mutation_leaves_catalog_alone() {
        let shelf = Arc::new(Shelf {
            reject_saves: true,
            ..Default::default()
        });
        let mut admin = workflow(shelf.clone(), "valid");
        admin.refresh().await;

        let err = admin.create_book(&dune()).await.unwrap_err();
        assert!(matches!(err, Error::Save { .. }));
        assert_eq!(shelf.lists.load(Ordering::SeqCst), 1);
        assert!(admin.catalog().books().is_empty());
    }

    #[tokio::test]
    async fn stale_token_surfaces_auth_error() {
        let shelf = Arc::new(Shelf::default());
        let mut admin = workflow(shelf, "revoked");

        let err = admin.create_book(&dune()).await.unwrap_err();
        assert!(err.is_auth());

        let err = admin.delete_book(&BookId::from("1")).await.unwrap_err();
        assert!(err.is_auth());
    }
}
