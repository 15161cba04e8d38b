//! HTTP client for the remote book service.

use async_trait::async_trait;
use bookclub_kernel::settings::ServiceSettings;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::Deserialize;

use super::models::{Book, BookDraft, BookId};
use super::BookService;
use crate::error::{Error, Result, INVALID_CREDENTIALS, LOGIN_UNREACHABLE};
use crate::modules::session::{Credentials, SessionToken};

/// Which call a failure belongs to; decides the error kind for non-auth
/// rejections.
#[derive(Debug, Clone, Copy)]
enum Operation {
    List,
    Save,
    Delete,
}

impl Operation {
    fn error(self, message: String) -> Error {
        match self {
            Operation::List => Error::fetch(message),
            Operation::Save => Error::save(message),
            Operation::Delete => Error::delete(message),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    success: bool,
    token: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Vec<Book>,
    message: Option<String>,
}

/// Create/update replies come either wrapped in the usual envelope or as
/// the bare record.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordResponse {
    Envelope {
        success: bool,
        data: Option<Book>,
        message: Option<String>,
    },
    Bare(Book),
}

#[derive(Debug, Default, Deserialize)]
struct Ack {
    success: Option<bool>,
    message: Option<String>,
}

/// `BookService` backed by the REST endpoints under `{base_url}/api`.
///
/// No client-side timeout or retry is configured; the transport defaults
/// apply.
#[derive(Debug, Clone)]
pub struct HttpBookService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBookService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn from_settings(settings: &ServiceSettings) -> Self {
        Self::new(settings.base_url.as_str())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// `{base_url}/api/books/{id}` with the id escaped as a single path
    /// segment.
    fn book_url(&self, id: &BookId) -> Result<Url> {
        let mut url = Url::parse(&self.url("/books"))
            .map_err(|e| Error::network(format!("invalid book service address: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| Error::network("book service address cannot hold a path"))?
            .push(id.as_str());
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<(StatusCode, Vec<u8>)> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::network(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::network(e.to_string()))?;
        Ok((status, body.to_vec()))
    }
}

/// Turn a non-success reply into the error kind for `op`, preferring the
/// service's own message.
fn rejection(op: Operation, status: StatusCode, body: &[u8]) -> Error {
    let message = serde_json::from_slice::<Ack>(body)
        .ok()
        .and_then(|ack| ack.message)
        .unwrap_or_else(|| format!("book service responded with {}", status));

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Error::auth(message)
    } else {
        op.error(message)
    }
}

fn decode_record(op: Operation, body: &[u8]) -> Result<Book> {
    let reply: RecordResponse = serde_json::from_slice(body)
        .map_err(|e| op.error(format!("unexpected response from book service: {e}")))?;

    match reply {
        RecordResponse::Bare(book) => Ok(book),
        RecordResponse::Envelope {
            success: true,
            data: Some(book),
            ..
        } => Ok(book),
        RecordResponse::Envelope {
            success: true,
            data: None,
            ..
        } => Err(op.error("book service returned no record".to_string())),
        RecordResponse::Envelope { message, .. } => Err(op.error(
            message.unwrap_or_else(|| "book service reported failure".to_string()),
        )),
    }
}

#[async_trait]
impl BookService for HttpBookService {
    async fn login(&self, credentials: &Credentials) -> Result<SessionToken> {
        tracing::debug!(username = %credentials.username, "sending login request");

        let request = self.client.post(self.url("/auth/login")).json(credentials);
        let (status, body) = self.send(request).await?;

        // The login endpoint reports failure in the body, whatever the status.
        match serde_json::from_slice::<LoginResponse>(&body) {
            Ok(LoginResponse {
                success: true,
                token: Some(token),
                ..
            }) if !token.is_empty() => Ok(SessionToken::new(token)),
            Ok(reply) => Err(Error::auth(
                reply
                    .message
                    .unwrap_or_else(|| INVALID_CREDENTIALS.to_string()),
            )),
            Err(e) => {
                tracing::debug!(status = %status, error = %e, "unreadable login reply");
                Err(Error::auth(LOGIN_UNREACHABLE))
            }
        }
    }

    async fn list_books(&self, token: Option<&SessionToken>) -> Result<Vec<Book>> {
        let mut request = self.client.get(self.url("/books"));
        if let Some(token) = token {
            request = request.header(reqwest::header::AUTHORIZATION, token.bearer());
        }

        let (status, body) = self.send(request).await?;
        if !status.is_success() {
            return Err(rejection(Operation::List, status, &body));
        }

        let reply: ListResponse = serde_json::from_slice(&body)
            .map_err(|e| Error::fetch(format!("unexpected response from book service: {e}")))?;
        if !reply.success {
            return Err(Error::fetch(
                reply
                    .message
                    .unwrap_or_else(|| "book service reported failure".to_string()),
            ));
        }

        tracing::debug!(count = reply.data.len(), "fetched book list");
        Ok(reply.data)
    }

    async fn create_book(&self, token: &SessionToken, draft: &BookDraft) -> Result<Book> {
        let request = self
            .client
            .post(self.url("/books"))
            .header(reqwest::header::AUTHORIZATION, token.bearer())
            .json(draft);

        let (status, body) = self.send(request).await?;
        if !status.is_success() {
            return Err(rejection(Operation::Save, status, &body));
        }
        decode_record(Operation::Save, &body)
    }

    async fn update_book(
        &self,
        token: &SessionToken,
        id: &BookId,
        draft: &BookDraft,
    ) -> Result<Book> {
        let request = self
            .client
            .put(self.book_url(id)?)
            .header(reqwest::header::AUTHORIZATION, token.bearer())
            .json(draft);

        let (status, body) = self.send(request).await?;
        if !status.is_success() {
            return Err(rejection(Operation::Save, status, &body));
        }
        decode_record(Operation::Save, &body)
    }

    async fn delete_book(&self, token: &SessionToken, id: &BookId) -> Result<()> {
        let request = self
            .client
            .delete(self.book_url(id)?)
            .header(reqwest::header::AUTHORIZATION, token.bearer());

        let (status, body) = self.send(request).await?;
        if !status.is_success() {
            return Err(rejection(Operation::Delete, status, &body));
        }

        // An empty body is a plain acknowledgement.
        let ack: Ack = serde_json::from_slice(&body).unwrap_or_default();
        if ack.success == Some(false) {
            return Err(Error::delete(
                ack.message
                    .unwrap_or_else(|| "book service reported failure".to_string()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn forbidden_maps_to_auth_for_every_operation() {
        let payload = body(json!({"success": false, "message": "Token expired"}));
        for op in [Operation::List, Operation::Save, Operation::Delete] {
            let err = rejection(op, StatusCode::FORBIDDEN, &payload);
            assert!(err.is_auth());
            assert_eq!(err.user_message(), "Token expired");
        }
    }

    #[test]
    fn other_rejections_keep_operation_kind() {
        let err = rejection(Operation::Save, StatusCode::UNPROCESSABLE_ENTITY, b"");
        assert!(matches!(err, Error::Save { .. }));
        assert_eq!(
            err.user_message(),
            "book service responded with 422 Unprocessable Entity"
        );

        let err = rejection(
            Operation::Delete,
            StatusCode::NOT_FOUND,
            &body(json!({"message": "Book not found"})),
        );
        assert!(matches!(err, Error::Delete { .. }));
        assert_eq!(err.user_message(), "Book not found");
    }

    #[test]
    fn record_reply_accepts_envelope_and_bare_forms() {
        let record = json!({
            "_id": "1",
            "title": "Dune",
            "author": "Herbert",
            "isbn": "123",
            "category": "Science"
        });

        let wrapped = decode_record(
            Operation::Save,
            &body(json!({"success": true, "data": record.clone()})),
        )
        .unwrap();
        let bare = decode_record(Operation::Save, &body(record)).unwrap();
        assert_eq!(wrapped, bare);
        assert_eq!(bare.title, "Dune");
    }

    #[test]
    fn envelope_failure_surfaces_message() {
        let err = decode_record(
            Operation::Save,
            &body(json!({"success": false, "message": "ISBN already exists"})),
        )
        .unwrap_err();
        assert_eq!(err.user_message(), "ISBN already exists");
    }

    #[test]
    fn book_ids_stay_within_one_path_segment() {
        let service = HttpBookService::new("http://localhost:5000");
        let url = service.book_url(&BookId::from("65a1?x=1/../all")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/books/65a1%3Fx=1%2F..%2Fall"
        );
        assert!(url.query().is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let service = HttpBookService::new("http://localhost:5000/");
        assert_eq!(service.url("/books"), "http://localhost:5000/api/books");
    }
}
