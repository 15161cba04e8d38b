//! In-memory state behind the stub book service.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;

const STATUSES: [&str; 3] = ["available", "borrowed", "maintenance"];

/// A book as stored and served by the stub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredBook {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub status: String,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Request body for create and update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookInput {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

/// Fields that passed validation.
struct ValidBook {
    title: String,
    author: String,
    isbn: String,
    category: String,
    status: String,
}

impl BookInput {
    fn validate(self) -> Result<ValidBook, AppError> {
        let mut details = Vec::new();
        let mut take = |field: &str, value: Option<String>| match value {
            Some(v) if !v.trim().is_empty() => v,
            _ => {
                details.push(json!({"field": field, "error": "required"}));
                String::new()
            }
        };

        let title = take("title", self.title);
        let author = take("author", self.author);
        let isbn = take("isbn", self.isbn);
        let category = take("category", self.category);

        let status = self.status.unwrap_or_else(|| STATUSES[0].to_string());
        if !STATUSES.contains(&status.as_str()) {
            details.push(json!({"field": "status", "error": "invalid"}));
        }

        if details.is_empty() {
            Ok(ValidBook {
                title,
                author,
                isbn,
                category,
                status,
            })
        } else {
            Err(AppError::validation(
                details,
                "Please provide title, author, isbn, category and a valid status",
            ))
        }
    }
}

/// Books plus issued tokens, shared by all handlers.
pub struct StubState {
    books: RwLock<Vec<StoredBook>>,
    tokens: RwLock<HashSet<String>>,
    admin_username: String,
    admin_password: String,
}

impl StubState {
    pub fn new(admin_username: impl Into<String>, admin_password: impl Into<String>) -> Self {
        Self {
            books: RwLock::new(Vec::new()),
            tokens: RwLock::new(HashSet::new()),
            admin_username: admin_username.into(),
            admin_password: admin_password.into(),
        }
    }

    /// Start with a handful of books so a fresh stub has something to show.
    pub fn with_sample_catalog(self) -> Self {
        let samples = [
            ("Dune", "Frank Herbert", "9780441013593", "Science Fiction", "available"),
            ("Emma", "Jane Austen", "9780141439587", "Fiction", "borrowed"),
            ("Sapiens", "Yuval Noah Harari", "9780062316097", "History", "available"),
            ("Clean Code", "Robert C. Martin", "9780132350884", "Technology", "maintenance"),
        ];
        let books = samples
            .into_iter()
            .map(|(title, author, isbn, category, status)| StoredBook {
                id: Uuid::now_v7().simple().to_string(),
                title: title.to_string(),
                author: author.to_string(),
                isbn: isbn.to_string(),
                category: category.to_string(),
                status: status.to_string(),
                created_at: OffsetDateTime::now_utc(),
            })
            .collect();
        Self {
            books: RwLock::new(books),
            ..self
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<String, AppError> {
        if username != self.admin_username || password != self.admin_password {
            return Err(AppError::unauthorized("Invalid credentials"));
        }
        let token = Uuid::now_v7().simple().to_string();
        self.tokens.write().await.insert(token.clone());
        Ok(token)
    }

    /// Check an `Authorization: Bearer ...` header value.
    pub async fn authorize(&self, header: Option<&str>) -> Result<(), AppError> {
        let token = header
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::unauthorized("No token, authorization denied"))?;

        if self.tokens.read().await.contains(token) {
            Ok(())
        } else {
            Err(AppError::unauthorized("Token is not valid"))
        }
    }

    pub async fn list(&self) -> Vec<StoredBook> {
        self.books.read().await.clone()
    }

    pub async fn create(&self, input: BookInput) -> Result<StoredBook, AppError> {
        let valid = input.validate()?;
        let mut books = self.books.write().await;
        if books.iter().any(|b| b.isbn == valid.isbn) {
            return Err(AppError::conflict("ISBN already exists"));
        }

        let book = StoredBook {
            id: Uuid::now_v7().simple().to_string(),
            title: valid.title,
            author: valid.author,
            isbn: valid.isbn,
            category: valid.category,
            status: valid.status,
            created_at: OffsetDateTime::now_utc(),
        };
        books.push(book.clone());
        Ok(book)
    }

    pub async fn update(&self, id: &str, input: BookInput) -> Result<StoredBook, AppError> {
        let valid = input.validate()?;
        let mut books = self.books.write().await;
        if books.iter().any(|b| b.isbn == valid.isbn && b.id != id) {
            return Err(AppError::conflict("ISBN already exists"));
        }

        let book = books
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::not_found("Book not found"))?;
        book.title = valid.title;
        book.author = valid.author;
        book.isbn = valid.isbn;
        book.category = valid.category;
        book.status = valid.status;
        Ok(book.clone())
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let mut books = self.books.write().await;
        let before = books.len();
        books.retain(|b| b.id != id);
        if books.len() == before {
            return Err(AppError::not_found("Book not found"));
        }
        Ok(())
    }
}
