//! Documents service
//!
//! Business rules for uploaded documents and their highlights. Every call
//! takes the id of the authenticated caller and only ever touches that
//! caller's documents.

use crate::config::{MAX_TITLE_LENGTH, MAX_UPLOAD_BYTES, TEXT_UPLOAD_EXTENSIONS, TEXT_UPLOAD_MIME_TYPES};
use crate::database::{Document, DocumentChanges, Highlight, NewDocument, Repository, WritingMode};
use crate::error::{AppError, Result};

/// Service for managing documents
#[derive(Clone)]
pub struct DocumentService {
    repo: Repository,
}

impl DocumentService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create a document from an uploaded text file
    pub async fn upload(
        &self,
        owner_id: &str,
        filename: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<Document> {
        tracing::info!(
            "Uploading document: {} for user: {} (size: {} bytes)",
            filename,
            owner_id,
            data.len()
        );

        if data.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::PayloadTooLarge {
                limit: MAX_UPLOAD_BYTES,
            });
        }

        if !is_text_upload(filename, content_type) {
            return Err(AppError::UnsupportedType(format!(
                "{} ({})",
                filename,
                content_type.unwrap_or("unknown type")
            )));
        }

        let content = decode_text(data)
            .ok_or_else(|| AppError::UnsupportedType(format!("{} is not UTF-8 text", filename)))?;

        let title = title_from_filename(filename)?;

        let document = self
            .repo
            .create_document(owner_id, NewDocument { title, content })
            .await?;

        tracing::info!("Document uploaded: {}", document.id);

        Ok(document)
    }

    /// List the caller's documents, most recently updated first
    pub async fn list(&self, owner_id: &str) -> Result<Vec<Document>> {
        let documents = self.repo.list_documents(owner_id).await?;
        tracing::debug!("Found {} documents for user: {}", documents.len(), owner_id);
        Ok(documents)
    }

    /// Get one of the caller's documents
    pub async fn get(&self, owner_id: &str, id: &str) -> Result<Document> {
        self.repo.get_document(owner_id, id).await
    }

    /// Merge the provided fields into a document
    pub async fn replace(
        &self,
        owner_id: &str,
        id: &str,
        mut changes: DocumentChanges,
    ) -> Result<Document> {
        tracing::debug!("Updating document: {}", id);

        if let Some(title) = changes.title.take() {
            changes.title = Some(require_title(&title)?);
        }

        let document = self.repo.update_document(owner_id, id, changes).await?;

        tracing::debug!("Document updated: {}", document.id);

        Ok(document)
    }

    /// Replace the whole highlight collection, and the writing mode if given
    pub async fn update_highlights(
        &self,
        owner_id: &str,
        id: &str,
        highlights: Vec<Highlight>,
        writing_mode: Option<WritingMode>,
    ) -> Result<Document> {
        tracing::debug!(
            "Saving {} highlights for document: {}",
            highlights.len(),
            id
        );

        let changes = DocumentChanges {
            highlights: Some(highlights),
            writing_mode,
            ..Default::default()
        };

        let document = self.repo.update_document(owner_id, id, changes).await?;

        tracing::debug!("Highlights saved for document: {}", document.id);

        Ok(document)
    }

    /// Rename a document
    pub async fn update_title(
        &self,
        owner_id: &str,
        id: &str,
        title: Option<&str>,
    ) -> Result<Document> {
        let title = require_title(title.unwrap_or_default())?;

        let changes = DocumentChanges {
            title: Some(title),
            ..Default::default()
        };

        self.repo.update_document(owner_id, id, changes).await
    }

    /// Replace a document's text.
    ///
    /// Existing highlights are kept as they are, even if their offsets or
    /// cached text no longer match the new content.
    pub async fn update_content(
        &self,
        owner_id: &str,
        id: &str,
        content: Option<String>,
    ) -> Result<Document> {
        let content =
            content.ok_or_else(|| AppError::Validation("Content is required".to_string()))?;

        let changes = DocumentChanges {
            content: Some(content),
            ..Default::default()
        };

        self.repo.update_document(owner_id, id, changes).await
    }

    /// Permanently delete a document, returning its id
    pub async fn remove(&self, owner_id: &str, id: &str) -> Result<String> {
        tracing::info!("Deleting document: {}", id);

        self.repo.delete_document(owner_id, id).await?;

        tracing::info!("Document deleted: {}", id);

        Ok(id.to_string())
    }
}

fn require_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    Ok(title.to_string())
}

/// Accept text/plain or text/markdown, or a `.md`/`.txt` file name
fn is_text_upload(filename: &str, content_type: Option<&str>) -> bool {
    let mime_ok = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|essence| {
            TEXT_UPLOAD_MIME_TYPES
                .iter()
                .any(|allowed| essence.trim().eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false);

    let lower = filename.to_lowercase();
    mime_ok || TEXT_UPLOAD_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Decode UTF-8, dropping a leading byte order mark
fn decode_text(data: &[u8]) -> Option<String> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    String::from_utf8(data.to_vec()).ok()
}

/// Title for an uploaded file: the last path component of its name.
///
/// Names longer than `MAX_TITLE_LENGTH` characters are rejected rather than
/// shortened.
fn title_from_filename(filename: &str) -> Result<String> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .replace('\0', "");

    if name.trim().is_empty() {
        return Err(AppError::Validation("A file name is required".to_string()));
    }
    if name.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::Validation(format!(
            "File name is longer than {} characters",
            MAX_TITLE_LENGTH
        )));
    }

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{initialize_database, Repository};
    use chrono::Utc;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_service() -> (DocumentService, Repository) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();

        let repo = Repository::new(pool);
        (DocumentService::new(repo.clone()), repo)
    }

    async fn create_user(repo: &Repository, name: &str) -> String {
        repo.create_user(name, &format!("{name}@example.com"), "hash")
            .await
            .unwrap()
            .id
    }

    fn highlight(start: usize, end: usize, color: &str) -> Highlight {
        Highlight {
            start_index: start,
            end_index: end,
            color: color.to_string(),
            text: String::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upload_creates_empty_document() {
        let (service, repo) = create_test_service().await;
        let owner = create_user(&repo, "alice").await;

        let doc = service
            .upload(&owner, "hello.txt", Some("text/plain"), b"hello text")
            .await
            .unwrap();

        assert_eq!(doc.title, "hello.txt");
        assert_eq!(doc.content, "hello text");
        assert_eq!(doc.owner_id, owner);
        assert_eq!(doc.writing_mode, WritingMode::Horizontal);
        assert!(doc.highlights.is_empty());
    }

    #[tokio::test]
    async fn test_upload_type_checks() {
        let (service, repo) = create_test_service().await;
        let owner = create_user(&repo, "alice").await;

        // Extension alone is enough
        assert!(service
            .upload(&owner, "README.MD", Some("application/octet-stream"), b"# hi")
            .await
            .is_ok());
        // Mime type alone is enough
        assert!(service
            .upload(&owner, "notes", Some("text/plain; charset=utf-8"), b"hi")
            .await
            .is_ok());

        let result = service
            .upload(&owner, "photo.png", Some("image/png"), b"\x89PNG")
            .await;
        assert!(matches!(result, Err(AppError::UnsupportedType(_))));

        let result = service
            .upload(&owner, "broken.txt", Some("text/plain"), b"\xff\xfe\xfd")
            .await;
        assert!(matches!(result, Err(AppError::UnsupportedType(_))));
    }

    #[tokio::test]
    async fn test_upload_size_limit() {
        let (service, repo) = create_test_service().await;
        let owner = create_user(&repo, "alice").await;

        let at_limit = vec![b'a'; MAX_UPLOAD_BYTES];
        assert!(service
            .upload(&owner, "big.txt", Some("text/plain"), &at_limit)
            .await
            .is_ok());

        let over_limit = vec![b'a'; MAX_UPLOAD_BYTES + 1];
        let result = service
            .upload(&owner, "bigger.txt", Some("text/plain"), &over_limit)
            .await;
        assert!(matches!(result, Err(AppError::PayloadTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_upload_strips_bom() {
        let (service, repo) = create_test_service().await;
        let owner = create_user(&repo, "alice").await;

        let doc = service
            .upload(&owner, "bom.txt", None, b"\xEF\xBB\xBFtext")
            .await
            .unwrap();
        assert_eq!(doc.content, "text");
    }

    #[tokio::test]
    async fn test_update_highlights_replaces_whole_collection() {
        let (service, repo) = create_test_service().await;
        let owner = create_user(&repo, "alice").await;
        let doc = service
            .upload(&owner, "a.txt", None, b"hello world")
            .await
            .unwrap();

        service
            .update_highlights(
                &owner,
                &doc.id,
                vec![highlight(0, 5, "yellow"), highlight(6, 11, "blue")],
                Some(WritingMode::Vertical),
            )
            .await
            .unwrap();

        let latest = vec![highlight(6, 11, "pink")];
        service
            .update_highlights(&owner, &doc.id, latest.clone(), None)
            .await
            .unwrap();

        let fetched = service.get(&owner, &doc.id).await.unwrap();
        assert_eq!(fetched.highlights, latest);
        // Omitted writing mode keeps the stored one
        assert_eq!(fetched.writing_mode, WritingMode::Vertical);
    }

    #[tokio::test]
    async fn test_whitespace_title_rejected_and_unchanged() {
        let (service, repo) = create_test_service().await;
        let owner = create_user(&repo, "alice").await;
        let doc = service
            .upload(&owner, "keep.txt", None, b"x")
            .await
            .unwrap();

        let result = service.update_title(&owner, &doc.id, Some("   \t ")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = service.update_title(&owner, &doc.id, None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let fetched = service.get(&owner, &doc.id).await.unwrap();
        assert_eq!(fetched.title, "keep.txt");

        let renamed = service
            .update_title(&owner, &doc.id, Some("  Renamed  "))
            .await
            .unwrap();
        assert_eq!(renamed.title, "Renamed");
    }

    #[tokio::test]
    async fn test_update_content() {
        let (service, repo) = create_test_service().await;
        let owner = create_user(&repo, "alice").await;
        let doc = service
            .upload(&owner, "a.txt", None, b"hello")
            .await
            .unwrap();

        let result = service.update_content(&owner, &doc.id, None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let emptied = service
            .update_content(&owner, &doc.id, Some(String::new()))
            .await
            .unwrap();
        assert_eq!(emptied.content, "");
    }

    #[tokio::test]
    async fn test_replace_validates_title() {
        let (service, repo) = create_test_service().await;
        let owner = create_user(&repo, "alice").await;
        let doc = service
            .upload(&owner, "a.txt", None, b"hello")
            .await
            .unwrap();

        let result = service
            .replace(
                &owner,
                &doc.id,
                DocumentChanges {
                    title: Some(" ".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let updated = service
            .replace(
                &owner,
                &doc.id,
                DocumentChanges {
                    title: Some(" Greeting ".to_string()),
                    content: Some("hello there".to_string()),
                    highlights: Some(vec![highlight(6, 11, "green")]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Greeting");
        assert_eq!(updated.content, "hello there");
        assert_eq!(updated.highlights.len(), 1);
    }

    #[tokio::test]
    async fn test_other_users_get_not_found() {
        let (service, repo) = create_test_service().await;
        let alice = create_user(&repo, "alice").await;
        let bob = create_user(&repo, "bob").await;
        let doc = service
            .upload(&alice, "private.txt", None, b"mine")
            .await
            .unwrap();

        assert!(matches!(
            service.get(&bob, &doc.id).await,
            Err(AppError::DocumentNotFound(_))
        ));
        assert!(matches!(
            service.update_highlights(&bob, &doc.id, vec![], None).await,
            Err(AppError::DocumentNotFound(_))
        ));
        assert!(matches!(
            service.remove(&bob, &doc.id).await,
            Err(AppError::DocumentNotFound(_))
        ));

        assert_eq!(service.remove(&alice, &doc.id).await.unwrap(), doc.id);
    }

    #[test]
    fn test_title_from_filename() {
        assert_eq!(title_from_filename("normal.txt").unwrap(), "normal.txt");
        assert_eq!(title_from_filename("a/b.txt").unwrap(), "b.txt");
        assert_eq!(title_from_filename("../../../etc/passwd").unwrap(), "passwd");
        assert_eq!(title_from_filename("C:\\notes\\draft.md").unwrap(), "draft.md");
        assert_eq!(title_from_filename("na\0me.txt").unwrap(), "name.txt");

        let longest = format!("{}.txt", "a".repeat(MAX_TITLE_LENGTH - 4));
        assert_eq!(title_from_filename(&longest).unwrap(), longest);

        let too_long = format!("{}.txt", "a".repeat(MAX_TITLE_LENGTH));
        for rejected in ["", "   ", "notes/", too_long.as_str()] {
            assert!(matches!(
                title_from_filename(rejected),
                Err(AppError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_upload_keeps_full_file_name() {
        let (service, repo) = create_test_service().await;
        let owner = create_user(&repo, "alice").await;

        let doc = service
            .upload(&owner, "chapter 1 (draft).md", None, b"text")
            .await
            .unwrap();
        assert_eq!(doc.title, "chapter 1 (draft).md");

        let too_long = format!("{}.txt", "n".repeat(MAX_TITLE_LENGTH));
        let result = service.upload(&owner, &too_long, None, b"text").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
