//! Content item entity - one published or draft unit of content.
//!
//! Every content kind (articles, e-newspapers, video news, business posts)
//! stores its items in its own table with the same column set, so a single
//! row model serves all of them. The table name comes from
//! [`ContentKind`](crate::core::kind::ContentKind).

use chrono::{DateTime, Utc};
use sea_orm::{DeriveIden, FromQueryResult};
use serde::{Deserialize, Serialize};

/// Content item row
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct ContentItem {
    /// Unique identifier, assigned at creation
    pub id: i64,
    /// Headline
    pub title: String,
    /// Body text or description
    pub body: String,
    /// Blocks every mutation until explicitly unarchived
    pub archived: bool,
    /// Publish-readiness flag
    pub completed: bool,
    /// When the item becomes eligible for automatic archival (business posts only)
    pub expiration: Option<DateTime<Utc>>,
    /// When the item was created
    pub created_at: DateTime<Utc>,
    /// When the item was last modified
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    /// Whether anonymous readers may see this item.
    #[must_use]
    pub const fn is_publicly_visible(&self) -> bool {
        !self.archived && self.completed
    }
}

/// Columns shared by every content table
#[derive(Copy, Clone, Debug, DeriveIden)]
pub enum ContentColumn {
    /// Primary key
    Id,
    /// Headline
    Title,
    /// Body text
    Body,
    /// Archived flag
    Archived,
    /// Completed flag
    Completed,
    /// Optional expiration timestamp
    Expiration,
    /// Creation timestamp
    CreatedAt,
    /// Last modification timestamp
    UpdatedAt,
}

impl ContentColumn {
    /// Columns selected when loading a [`ContentItem`].
    pub const ALL: [Self; 8] = [
        Self::Id,
        Self::Title,
        Self::Body,
        Self::Archived,
        Self::Completed,
        Self::Expiration,
        Self::CreatedAt,
        Self::UpdatedAt,
    ];
}
