use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::Error;

/// Server-assigned book identifier. Never changes once issued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BookId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Circulation state of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    #[default]
    Available,
    Borrowed,
    Maintenance,
}

impl BookStatus {
    pub const ALL: [BookStatus; 3] = [
        BookStatus::Available,
        BookStatus::Borrowed,
        BookStatus::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::Borrowed => "borrowed",
            BookStatus::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        BookStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| {
                format!(
                    "unknown status '{}'; expected available/borrowed/maintenance",
                    value
                )
            })
    }
}

/// A book record as served by the book service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "_id", alias = "id")]
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: BookStatus,
    #[serde(
        rename = "createdAt",
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
}

impl Book {
    /// Only available books can be handed out.
    pub fn is_borrowable(&self) -> bool {
        self.status == BookStatus::Available
    }
}

/// Fields an admin submits when creating or editing a book.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    #[serde(default)]
    pub status: BookStatus,
}

impl BookDraft {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            category: category.into(),
            status: BookStatus::default(),
        }
    }

    pub fn with_status(mut self, status: BookStatus) -> Self {
        self.status = status;
        self
    }

    /// Check that every required text field has content.
    pub fn validate(&self) -> Result<(), Error> {
        let required = [
            ("title", &self.title),
            ("author", &self.author),
            ("isbn", &self.isbn),
            ("category", &self.category),
        ];

        match required
            .iter()
            .find(|(_, value)| value.trim().is_empty())
        {
            Some((field, _)) => Err(Error::save(format!("{field} is required"))),
            None => Ok(()),
        }
    }
}

/// Prefill an edit form from the record being edited.
impl From<&Book> for BookDraft {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            category: book.category.clone(),
            status: book.status,
        }
    }
}
