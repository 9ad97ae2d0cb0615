//! Media entity - files (photos, video, PDF pages) attached to a content item.
//! The upload itself is handled elsewhere; only the stored location is kept here.

use chrono::{DateTime, Utc};
use sea_orm::{DeriveIden, FromQueryResult};
use serde::{Deserialize, Serialize};

/// Media row
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct Media {
    /// Unique identifier
    pub id: i64,
    /// Owning content item
    pub parent_id: i64,
    /// Where the stored file can be fetched from
    pub url: String,
    /// When the media was attached
    pub created_at: DateTime<Utc>,
}

/// Columns shared by every media table
#[derive(Copy, Clone, Debug, DeriveIden)]
pub enum MediaColumn {
    /// Primary key
    Id,
    /// Foreign key to the content table
    ParentId,
    /// Stored location
    Url,
    /// Creation timestamp
    CreatedAt,
}
