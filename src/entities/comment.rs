//! Comment entity - user-submitted text attached to one content item.
//!
//! Comments are gated by `approved` before the public can see them. Admin
//! readers get the full [`Comment`]; public readers get [`PublicComment`],
//! which drops the contact field and the approval state.

use chrono::{DateTime, Utc};
use sea_orm::{DeriveIden, FromQueryResult};
use serde::{Deserialize, Serialize};

/// Comment row, as seen by admins
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier
    pub id: i64,
    /// Owning content item; never changes
    pub parent_id: i64,
    /// Comment body, never empty
    pub text: String,
    /// Optional free-text contact, settable only at creation
    pub contact: Option<String>,
    /// Public visibility gate
    pub approved: bool,
    /// When the comment was submitted
    pub created_at: DateTime<Utc>,
}

/// Reduced comment view for public readers
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct PublicComment {
    /// Unique identifier
    pub id: i64,
    /// Comment body
    pub text: String,
    /// When the comment was submitted
    pub created_at: DateTime<Utc>,
}

/// A comment in whichever shape the caller is allowed to see
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommentView {
    /// All fields (admin)
    Full(Comment),
    /// `id`, `text`, `created_at` only (public)
    Public(PublicComment),
}

impl CommentView {
    /// Identifier of the underlying comment.
    #[must_use]
    pub const fn id(&self) -> i64 {
        match self {
            Self::Full(c) => c.id,
            Self::Public(c) => c.id,
        }
    }

    /// Text of the underlying comment.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Full(c) => &c.text,
            Self::Public(c) => &c.text,
        }
    }
}

/// Columns shared by every comment table
#[derive(Copy, Clone, Debug, DeriveIden)]
pub enum CommentColumn {
    /// Primary key
    Id,
    /// Foreign key to the content table
    ParentId,
    /// Comment body
    Text,
    /// Optional contact
    Contact,
    /// Approval flag
    Approved,
    /// Creation timestamp
    CreatedAt,
}
