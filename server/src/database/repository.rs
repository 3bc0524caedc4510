//! Repository layer for database operations
//!
//! Every document query carries both the document id and the owner id in
//! its WHERE clause, so a document owned by someone else behaves exactly
//! like a missing one.

use super::models::*;
use crate::error::{AppError, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ===== Users =====

    /// Create a new user
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Username or email is already in use".to_string())
            }
            other => AppError::Database(other),
        })?;

        tracing::debug!("Created user: {}", id);
        Ok(user)
    }

    /// Whether any user already holds this username or email
    pub async fn user_exists(&self, username: &str, email: &str) -> Result<bool> {
        let found: Option<String> =
            sqlx::query_scalar("SELECT id FROM users WHERE username = ? OR email = ? LIMIT 1")
                .bind(username)
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        Ok(found.is_some())
    }

    /// Find a user by email
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    // ===== Documents =====

    /// Create a new document with no highlights
    pub async fn create_document(&self, owner_id: &str, req: NewDocument) -> Result<Document> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            INSERT INTO documents (id, owner_id, title, content, writing_mode, highlights_json, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, '[]', ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(owner_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(WritingMode::default().as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created document: {} for owner: {}", id, owner_id);
        row.try_into()
    }

    /// Get a document by ID, scoped to its owner
    pub async fn get_document(&self, owner_id: &str, id: &str) -> Result<Document> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT * FROM documents WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::DocumentNotFound(id.to_string()))?;

        row.try_into()
    }

    /// List an owner's documents, most recently updated first
    pub async fn list_documents(&self, owner_id: &str) -> Result<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT * FROM documents
            WHERE owner_id = ?
            ORDER BY updated_at DESC, created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Document::try_from).collect()
    }

    /// Apply `changes` to a document and bump `updated_at`.
    ///
    /// The update is one owner-scoped statement. When the change set carries
    /// highlights, they are checked against the content being stored and the
    /// write is rolled back if any falls outside it.
    pub async fn update_document(
        &self,
        owner_id: &str,
        id: &str,
        changes: DocumentChanges,
    ) -> Result<Document> {
        let now = Utc::now();

        // Build dynamic update query
        let mut query = "UPDATE documents SET updated_at = ?".to_string();
        let mut params: Vec<String> = Vec::new();

        if let Some(title) = changes.title {
            query.push_str(", title = ?");
            params.push(title);
        }

        if let Some(content) = changes.content {
            query.push_str(", content = ?");
            params.push(content);
        }

        if let Some(mode) = changes.writing_mode {
            query.push_str(", writing_mode = ?");
            params.push(mode.as_str().to_string());
        }

        let replaces_highlights = changes.highlights.is_some();
        if let Some(highlights) = &changes.highlights {
            query.push_str(", highlights_json = ?");
            params.push(serde_json::to_string(highlights)?);
        }

        query.push_str(" WHERE id = ? AND owner_id = ? RETURNING *");

        let mut tx = self.pool.begin().await?;

        let mut q = sqlx::query_as::<_, DocumentRow>(&query).bind(now);
        for param in &params {
            q = q.bind(param);
        }

        let row = q
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::DocumentNotFound(id.to_string()))?;

        let document = Document::try_from(row)?;

        if replaces_highlights {
            // Dropping the transaction without commit rolls the write back
            document.check_highlight_bounds()?;
        }

        tx.commit().await?;

        tracing::debug!("Updated document: {}", id);
        Ok(document)
    }

    /// Permanently delete a document
    pub async fn delete_document(&self, owner_id: &str, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM documents WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::DocumentNotFound(id.to_string()));
        }

        tracing::debug!("Deleted document: {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::initialize_database;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_repo() -> Repository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();

        Repository::new(pool)
    }

    async fn create_owner(repo: &Repository, name: &str) -> User {
        repo.create_user(name, &format!("{name}@example.com"), "hash")
            .await
            .unwrap()
    }

    fn new_doc(title: &str, content: &str) -> NewDocument {
        NewDocument {
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    fn highlight(start: usize, end: usize, text: &str) -> Highlight {
        Highlight {
            start_index: start,
            end_index: end,
            color: "yellow".to_string(),
            text: text.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let repo = create_test_repo().await;

        let user = create_owner(&repo, "alice").await;
        assert_eq!(user.username, "alice");

        let found = repo
            .find_user_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);

        assert!(repo.user_exists("alice", "other@example.com").await.unwrap());
        assert!(repo.user_exists("other", "alice@example.com").await.unwrap());
        assert!(!repo.user_exists("bob", "bob@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_user_is_conflict() {
        let repo = create_test_repo().await;
        create_owner(&repo, "alice").await;

        let result = repo
            .create_user("alice2", "alice@example.com", "hash")
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_and_get_document() {
        let repo = create_test_repo().await;
        let owner = create_owner(&repo, "alice").await;

        let doc = repo
            .create_document(&owner.id, new_doc("notes.txt", "hello world"))
            .await
            .unwrap();
        assert_eq!(doc.title, "notes.txt");
        assert_eq!(doc.writing_mode, WritingMode::Horizontal);
        assert!(doc.highlights.is_empty());

        let fetched = repo.get_document(&owner.id, &doc.id).await.unwrap();
        assert_eq!(fetched, doc);
    }

    #[tokio::test]
    async fn test_documents_are_owner_scoped() {
        let repo = create_test_repo().await;
        let alice = create_owner(&repo, "alice").await;
        let bob = create_owner(&repo, "bob").await;

        let doc = repo
            .create_document(&alice.id, new_doc("secret.md", "# mine"))
            .await
            .unwrap();

        assert!(matches!(
            repo.get_document(&bob.id, &doc.id).await,
            Err(AppError::DocumentNotFound(_))
        ));
        assert!(matches!(
            repo.update_document(
                &bob.id,
                &doc.id,
                DocumentChanges {
                    title: Some("stolen".to_string()),
                    ..Default::default()
                }
            )
            .await,
            Err(AppError::DocumentNotFound(_))
        ));
        assert!(matches!(
            repo.delete_document(&bob.id, &doc.id).await,
            Err(AppError::DocumentNotFound(_))
        ));
        assert!(repo.list_documents(&bob.id).await.unwrap().is_empty());

        let untouched = repo.get_document(&alice.id, &doc.id).await.unwrap();
        assert_eq!(untouched.title, "secret.md");
    }

    #[tokio::test]
    async fn test_list_orders_by_most_recent_update() {
        let repo = create_test_repo().await;
        let owner = create_owner(&repo, "alice").await;

        let first = repo
            .create_document(&owner.id, new_doc("first.txt", "1"))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = repo
            .create_document(&owner.id, new_doc("second.txt", "2"))
            .await
            .unwrap();

        let docs = repo.list_documents(&owner.id).await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        repo.update_document(
            &owner.id,
            &first.id,
            DocumentChanges {
                content: Some("1 edited".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let docs = repo.list_documents(&owner.id).await.unwrap();
        assert_eq!(docs[0].id, first.id);
    }

    #[tokio::test]
    async fn test_update_merges_only_given_fields() {
        let repo = create_test_repo().await;
        let owner = create_owner(&repo, "alice").await;
        let doc = repo
            .create_document(&owner.id, new_doc("a.txt", "hello world"))
            .await
            .unwrap();

        let updated = repo
            .update_document(
                &owner.id,
                &doc.id,
                DocumentChanges {
                    writing_mode: Some(WritingMode::Vertical),
                    highlights: Some(vec![highlight(0, 5, "hello")]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "a.txt");
        assert_eq!(updated.content, "hello world");
        assert_eq!(updated.writing_mode, WritingMode::Vertical);
        assert_eq!(updated.highlights.len(), 1);
        assert!(updated.updated_at >= doc.updated_at);
        assert_eq!(updated.created_at, doc.created_at);
    }

    #[tokio::test]
    async fn test_out_of_bounds_highlights_roll_back() {
        let repo = create_test_repo().await;
        let owner = create_owner(&repo, "alice").await;
        let doc = repo
            .create_document(&owner.id, new_doc("a.txt", "short"))
            .await
            .unwrap();

        let result = repo
            .update_document(
                &owner.id,
                &doc.id,
                DocumentChanges {
                    writing_mode: Some(WritingMode::Vertical),
                    highlights: Some(vec![highlight(0, 50, "short")]),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let stored = repo.get_document(&owner.id, &doc.id).await.unwrap();
        assert_eq!(stored, doc);
    }

    #[tokio::test]
    async fn test_content_edit_keeps_stale_highlights() {
        let repo = create_test_repo().await;
        let owner = create_owner(&repo, "alice").await;
        let doc = repo
            .create_document(&owner.id, new_doc("a.txt", "hello world"))
            .await
            .unwrap();

        repo.update_document(
            &owner.id,
            &doc.id,
            DocumentChanges {
                highlights: Some(vec![highlight(6, 11, "world")]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let updated = repo
            .update_document(
                &owner.id,
                &doc.id,
                DocumentChanges {
                    content: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.content, "");
        assert_eq!(updated.highlights.len(), 1);
        assert_eq!(updated.highlights[0].start_index, 6);
        assert_eq!(updated.highlights[0].end_index, 11);
        assert_eq!(updated.highlights[0].text, "world");
    }

    #[tokio::test]
    async fn test_delete_document() {
        let repo = create_test_repo().await;
        let owner = create_owner(&repo, "alice").await;
        let doc = repo
            .create_document(&owner.id, new_doc("a.txt", "bye"))
            .await
            .unwrap();

        repo.delete_document(&owner.id, &doc.id).await.unwrap();

        assert!(matches!(
            repo.get_document(&owner.id, &doc.id).await,
            Err(AppError::DocumentNotFound(_))
        ));
        assert!(matches!(
            repo.delete_document(&owner.id, &doc.id).await,
            Err(AppError::DocumentNotFound(_))
        ));
    }
}
