//! Database models
//!
//! Rust structs representing stored users and documents. Documents are
//! serialized to clients with camelCase keys; highlights live inside their
//! document as a JSON array column.

use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// A registered account
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string, never sent to clients
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Client-safe projection of [`User`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
}

/// Text layout a document is displayed with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritingMode {
    #[default]
    Horizontal,
    Vertical,
}

impl WritingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WritingMode::Horizontal => "horizontal",
            WritingMode::Vertical => "vertical",
        }
    }
}

impl fmt::Display for WritingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WritingMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "horizontal" => Ok(WritingMode::Horizontal),
            "vertical" => Ok(WritingMode::Vertical),
            other => Err(AppError::Validation(format!(
                "Unknown writing mode: {other}"
            ))),
        }
    }
}

/// A colored span over a document's text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    /// Offset of the first highlighted character
    pub start_index: usize,
    /// Offset one past the last highlighted character
    pub end_index: usize,
    pub color: String,
    /// Highlighted text as it read when the span was made. Not kept in sync
    /// with later content edits.
    #[serde(default)]
    pub text: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Highlight {
    /// Check `start_index <= end_index <= content_len` (lengths in chars).
    pub fn check_bounds(&self, content_len: usize) -> Result<()> {
        if self.start_index > self.end_index {
            return Err(AppError::Validation(format!(
                "Highlight start {} is after its end {}",
                self.start_index, self.end_index
            )));
        }
        if self.end_index > content_len {
            return Err(AppError::Validation(format!(
                "Highlight end {} is past the end of the content ({} characters)",
                self.end_index, content_len
            )));
        }
        Ok(())
    }
}

/// An uploaded text document with its highlights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    #[serde(rename = "userId")]
    pub owner_id: String,
    pub title: String,
    pub content: String,
    pub writing_mode: WritingMode,
    pub highlights: Vec<Highlight>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Validate every highlight against the current content.
    pub fn check_highlight_bounds(&self) -> Result<()> {
        let content_len = self.content.chars().count();
        self.highlights
            .iter()
            .try_for_each(|highlight| highlight.check_bounds(content_len))
    }
}

/// Row shape of the `documents` table
#[derive(Debug, FromRow)]
pub struct DocumentRow {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub content: String,
    pub writing_mode: String,
    pub highlights_json: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = AppError;

    fn try_from(row: DocumentRow) -> Result<Self> {
        Ok(Document {
            writing_mode: row.writing_mode.parse()?,
            highlights: serde_json::from_str(&row.highlights_json)?,
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Create document request
#[derive(Debug)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
}

/// Partial document update; `None` fields are left as stored.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub writing_mode: Option<WritingMode>,
    pub highlights: Option<Vec<Highlight>>,
}
